//! Column types
//!
//! Column properties live in `<cols>`, as `<col min=".." max="..">` spans
//! sorted by `min`. A column view always gets a `<col>` covering exactly its
//! own column; a wider span is split around it first.

use crate::error::{Error, Result};
use crate::worksheet::Worksheet;
use crate::xml::{NodeId, XmlDocument};
use crate::MAX_COLS;

/// Column width used when a `<col>` has no `width` attribute
pub const DEFAULT_COLUMN_WIDTH: f64 = 9.140625;

/// A column of a worksheet
#[derive(Debug)]
pub struct Column<'a> {
    sheet: &'a mut Worksheet,
    node: NodeId,
    number: u16,
}

impl<'a> Column<'a> {
    pub(crate) fn resolve(sheet: &'a mut Worksheet, number: u16) -> Result<Self> {
        if number == 0 || number > MAX_COLS {
            return Err(Error::ColumnOutOfBounds(number as u32, MAX_COLS));
        }
        let (node, created) = column_node(sheet.xml_mut(), number)?;
        if created {
            sheet.mark_modified();
        }
        Ok(Self {
            sheet,
            node,
            number,
        })
    }

    /// 1-based column number
    pub fn number(&self) -> u16 {
        self.number
    }

    /// Column width in characters
    pub fn width(&self) -> f64 {
        self.sheet
            .xml()
            .attribute(self.node, "width")
            .and_then(|w| w.parse().ok())
            .unwrap_or(DEFAULT_COLUMN_WIDTH)
    }

    /// Set a custom column width in characters
    pub fn set_width(&mut self, width: f64) {
        let xml = self.sheet.xml_mut();
        xml.set_attribute(self.node, "width", &width.to_string());
        xml.set_attribute(self.node, "customWidth", "1");
        self.sheet.mark_modified();
    }

    /// Check if the column is hidden
    pub fn is_hidden(&self) -> bool {
        matches!(
            self.sheet.xml().attribute(self.node, "hidden"),
            Some("1" | "true")
        )
    }

    /// Hide or show the column
    pub fn set_hidden(&mut self, hidden: bool) {
        let xml = self.sheet.xml_mut();
        if hidden {
            xml.set_attribute(self.node, "hidden", "1");
        } else {
            xml.remove_attribute(self.node, "hidden");
        }
        self.sheet.mark_modified();
    }
}

/// `<col>` node covering only `number`; the flag tells whether the tree changed
fn column_node(xml: &mut XmlDocument, number: u16) -> Result<(NodeId, bool)> {
    let root = xml.root();
    let cols = match xml.child(root, "cols") {
        Some(cols) => cols,
        None => {
            let sheet_data = xml
                .child(root, "sheetData")
                .ok_or_else(|| Error::internal("worksheet without sheetData"))?;
            xml.insert_before(sheet_data, "cols")
        }
    };

    let mut next = xml.first_child(cols);
    while let Some(col) = next {
        let (min, max) = span(xml, col)?;
        if number < min {
            let node = xml.insert_before(col, "col");
            init_column(xml, node, number);
            return Ok((node, true));
        }
        if number <= max {
            if min == max {
                return Ok((col, false));
            }
            split_span(xml, col, min, max, number);
            return Ok((col, true));
        }
        next = xml.next_sibling(col);
    }

    let node = xml.append_child(cols, "col");
    init_column(xml, node, number);
    Ok((node, true))
}

fn span(xml: &XmlDocument, col: NodeId) -> Result<(u16, u16)> {
    let bound = |name: &str| -> Result<u16> {
        let text = xml
            .attribute(col, name)
            .ok_or_else(|| Error::MalformedXml(format!("<col> without {}", name)))?;
        text.trim()
            .parse()
            .map_err(|_| Error::MalformedXml(format!("invalid <col> {} '{}'", name, text)))
    };
    Ok((bound("min")?, bound("max")?))
}

fn init_column(xml: &mut XmlDocument, node: NodeId, number: u16) {
    let number = number.to_string();
    xml.set_attribute(node, "min", &number);
    xml.set_attribute(node, "max", &number);
    xml.set_attribute(node, "width", &DEFAULT_COLUMN_WIDTH.to_string());
}

/// Shrink `col` to `number` and move the rest of its span into copies
fn split_span(xml: &mut XmlDocument, col: NodeId, min: u16, max: u16, number: u16) {
    let attributes: Vec<(String, String)> = xml
        .attributes(col)
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    if min < number {
        let before = xml.insert_before(col, "col");
        copy_attributes(xml, before, &attributes);
        xml.set_attribute(before, "max", &(number - 1).to_string());
    }
    if number < max {
        let after = xml.insert_after(col, "col");
        copy_attributes(xml, after, &attributes);
        xml.set_attribute(after, "min", &(number + 1).to_string());
    }
    let number = number.to_string();
    xml.set_attribute(col, "min", &number);
    xml.set_attribute(col, "max", &number);
}

fn copy_attributes(xml: &mut XmlDocument, node: NodeId, attributes: &[(String, String)]) {
    for (key, value) in attributes {
        xml.set_attribute(node, key, value);
    }
}
