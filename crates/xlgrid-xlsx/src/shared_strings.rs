//! The shared strings part (`xl/sharedStrings.xml`)
//!
//! Items already in the file are kept as they are (rich text runs and
//! phonetic hints included) unless their text changed; new strings are
//! appended as plain `<si><t>` items.

use xlgrid_core::cell::rich_text;
use xlgrid_core::worksheet::SPREADSHEET_NS;
use xlgrid_core::{NodeId, SharedStringTable, XmlDocument};

use crate::error::XlsxResult;
use crate::reader::decode_excel_escapes;
use crate::writer::encode_excel_escapes;

/// File name of the part, relative to the workbook directory
pub const SHARED_STRINGS_FILE: &str = "sharedStrings.xml";

/// The `<sst>` part and the text of each item as last read or written
#[derive(Debug, Clone)]
pub struct SharedStringsPart {
    xml: XmlDocument,
    saved: Vec<String>,
}

impl SharedStringsPart {
    /// Empty part
    pub fn new() -> Self {
        let mut xml = XmlDocument::new("sst");
        let root = xml.root();
        xml.set_attribute(root, "xmlns", SPREADSHEET_NS);
        xml.set_attribute(root, "count", "0");
        xml.set_attribute(root, "uniqueCount", "0");
        Self {
            xml,
            saved: Vec::new(),
        }
    }

    /// Parse the part into the table its cells index
    pub fn parse(data: &[u8]) -> XlsxResult<(Self, SharedStringTable)> {
        let xml = XmlDocument::parse(data)?;
        let saved: Vec<String> = xml
            .children_named(xml.root(), "si")
            .map(|si| decode_excel_escapes(&rich_text(&xml, si)).into_owned())
            .collect();
        log::debug!("loaded {} shared strings", saved.len());

        let table = SharedStringTable::from_strings(saved.iter().cloned());
        Ok((Self { xml, saved }, table))
    }

    /// Bring the items in line with `table` and serialize
    ///
    /// `count` is the number of cells referencing the table.
    pub fn to_xml(&mut self, table: &SharedStringTable, count: usize) -> XlsxResult<Vec<u8>> {
        let root = self.xml.root();
        let items: Vec<NodeId> = self.xml.children_named(root, "si").collect();

        for (index, text) in table.iter().enumerate() {
            match items.get(index) {
                Some(&si) => {
                    if self.saved.get(index).map(String::as_str) != Some(text) {
                        self.xml.clear_children(si);
                        self.append_text(si, text);
                    }
                }
                None => {
                    let si = self.xml.append_child(root, "si");
                    self.append_text(si, text);
                }
            }
        }

        self.xml.set_attribute(root, "count", &count.to_string());
        self.xml
            .set_attribute(root, "uniqueCount", &table.len().to_string());
        self.saved = table.iter().map(str::to_string).collect();
        Ok(self.xml.to_xml()?)
    }

    fn append_text(&mut self, si: NodeId, text: &str) {
        let t = self.xml.append_child(si, "t");
        if text.trim() != text {
            self.xml.set_attribute(t, "xml:space", "preserve");
        }
        self.xml.set_text(t, &encode_excel_escapes(text));
    }
}

impl Default for SharedStringsPart {
    fn default() -> Self {
        Self::new()
    }
}
