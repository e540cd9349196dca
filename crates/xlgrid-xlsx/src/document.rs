//! An XLSX document: the package plus the parts this crate edits
//!
//! Worksheets, the shared string table, the workbook part, relationships,
//! content types and core properties are parsed on load. Every other part
//! stays in the [`Package`] as raw bytes and is written back unchanged.

use std::io::{Read, Seek, Write};
use std::path::Path;

use chrono::Utc;
use xlgrid_core::{SharedStrings, Worksheet, XmlDocument, MAX_SHEET_NAME_LEN};

use crate::content_types::{content_type, ContentTypes, CONTENT_TYPES_PATH};
use crate::error::{XlsxError, XlsxResult};
use crate::package::Package;
use crate::properties::{DocumentProperties, CORE_PROPERTIES_PATH};
use crate::reader::XlsxReader;
use crate::relationships::{
    rel_type, rels_path_for, relative_target, resolve_target, Relationships,
};
use crate::shared_strings::{SharedStringsPart, SHARED_STRINGS_FILE};
use crate::template;
use crate::workbook::{same_name, SheetVisibility, WorkbookPart};
use crate::writer::XlsxWriter;

/// Characters Excel does not allow in sheet names
const INVALID_NAME_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// A worksheet and where it lives in the package
#[derive(Debug)]
struct SheetPart {
    path: String,
    r_id: String,
    sheet: Worksheet,
}

/// An XLSX workbook opened for reading and editing
#[derive(Debug)]
pub struct Document {
    package: Package,
    content_types: ContentTypes,
    root_rels: Relationships,
    workbook_path: String,
    workbook: WorkbookPart,
    workbook_rels: Relationships,
    properties_path: String,
    properties: DocumentProperties,
    strings_path: String,
    strings_part: SharedStringsPart,
    strings: SharedStrings,
    sheets: Vec<SheetPart>,
}

impl Document {
    /// Create a blank workbook with one empty sheet named "Sheet1"
    pub fn new() -> XlsxResult<Self> {
        Self::from_package(template::blank_package())
    }

    /// Open a document from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> XlsxResult<Self> {
        XlsxReader::read_file(path)
    }

    /// Read a document from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Self> {
        XlsxReader::read(reader)
    }

    /// Save to a file path
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> XlsxResult<()> {
        XlsxWriter::write_file(self, path)
    }

    /// Write to a writer
    pub fn write<W: Write + Seek>(&mut self, writer: W) -> XlsxResult<()> {
        XlsxWriter::write(self, writer)
    }

    /// Load the document parts of a package
    pub fn from_package(mut package: Package) -> XlsxResult<Self> {
        let content_types = match package.entry(CONTENT_TYPES_PATH) {
            Some(data) => ContentTypes::parse(data)?,
            None => return Err(XlsxError::MissingPart(CONTENT_TYPES_PATH.into())),
        };
        let root_rels_path = rels_path_for("");
        let root_rels = match package.entry(&root_rels_path) {
            Some(data) => Relationships::parse(data)?,
            None => return Err(XlsxError::MissingPart(root_rels_path)),
        };

        let workbook_path = root_rels
            .by_type(rel_type::OFFICE_DOCUMENT)
            .map(|rel| resolve_target("", &rel.target))
            .ok_or_else(|| XlsxError::InvalidFormat("no officeDocument relationship".into()))?;
        let workbook = match package.entry(&workbook_path) {
            Some(data) => WorkbookPart::parse(data)?,
            None => return Err(XlsxError::MissingPart(workbook_path)),
        };
        let workbook_rels = match package.entry(&rels_path_for(&workbook_path)) {
            Some(data) => Relationships::parse(data)?,
            None => Relationships::new(),
        };

        let mut document = Self {
            content_types,
            root_rels,
            workbook,
            workbook_rels,
            properties_path: String::new(),
            properties: DocumentProperties::new(),
            strings_path: String::new(),
            strings_part: SharedStringsPart::new(),
            strings: SharedStrings::new(),
            sheets: Vec::new(),
            workbook_path,
            package: Package::new(),
        };
        document.load_shared_strings(&package)?;
        document.load_properties(&package)?;
        document.load_sheets(&package)?;
        package.set_entry(CONTENT_TYPES_PATH, document.content_types.to_xml()?);
        document.package = package;

        log::debug!(
            "loaded workbook {} with {} worksheets",
            document.workbook_path,
            document.sheets.len()
        );
        Ok(document)
    }

    fn load_shared_strings(&mut self, package: &Package) -> XlsxResult<()> {
        if let Some(rel) = self.workbook_rels.by_type(rel_type::SHARED_STRINGS) {
            let path = resolve_target(&self.workbook_path, &rel.target);
            if let Some(data) = package.entry(&path) {
                let (part, table) = SharedStringsPart::parse(data)?;
                self.strings_part = part;
                self.strings = SharedStrings::from_table(table);
                self.strings_path = path;
                return Ok(());
            }
            log::warn!("shared strings part {} is missing, creating it", path);
            self.workbook_rels.remove(&rel.id);
        }

        let path = sibling_path(&self.workbook_path, SHARED_STRINGS_FILE);
        let target = relative_target(&self.workbook_path, &path);
        self.workbook_rels.add(rel_type::SHARED_STRINGS, &target);
        self.content_types
            .add_override(&path, content_type::SHARED_STRINGS);
        self.strings_path = path;
        Ok(())
    }

    fn load_properties(&mut self, package: &Package) -> XlsxResult<()> {
        if let Some(rel) = self.root_rels.by_type(rel_type::CORE_PROPERTIES) {
            let path = resolve_target("", &rel.target);
            if let Some(data) = package.entry(&path) {
                self.properties = DocumentProperties::parse(data)?;
                self.properties_path = path;
                return Ok(());
            }
            self.root_rels.remove(&rel.id);
        }

        self.root_rels
            .add(rel_type::CORE_PROPERTIES, CORE_PROPERTIES_PATH);
        self.content_types
            .add_override(CORE_PROPERTIES_PATH, content_type::CORE_PROPERTIES);
        self.properties_path = CORE_PROPERTIES_PATH.to_string();
        Ok(())
    }

    fn load_sheets(&mut self, package: &Package) -> XlsxResult<()> {
        for entry in self.workbook.sheets() {
            let rel = self.workbook_rels.by_id(&entry.r_id).ok_or_else(|| {
                XlsxError::InvalidFormat(format!(
                    "sheet '{}' has no relationship '{}'",
                    entry.name, entry.r_id
                ))
            })?;
            if rel.rel_type != rel_type::WORKSHEET {
                log::debug!("skipping sheet '{}' of type {}", entry.name, rel.rel_type);
                continue;
            }

            let path = resolve_target(&self.workbook_path, &rel.target);
            let data = package
                .entry(&path)
                .ok_or_else(|| XlsxError::MissingPart(path.clone()))?;
            let sheet = Worksheet::from_xml(entry.name.as_str(), data, self.strings.clone())?;
            self.sheets.push(SheetPart {
                path,
                r_id: entry.r_id,
                sheet,
            });
        }
        Ok(())
    }

    /// Serialize edited parts into the package
    ///
    /// Worksheets are only re-serialized when modified; their `<dimension>`
    /// is updated first. The shared strings part is rewritten when the table
    /// changed or the part is new.
    pub(crate) fn sync_package(&mut self) -> XlsxResult<()> {
        for part in &mut self.sheets {
            if part.sheet.is_modified() {
                part.sheet.update_dimension();
                log::trace!("serializing {}", part.path);
                self.package.set_entry(part.path.as_str(), part.sheet.to_xml()?);
                part.sheet.mark_saved();
            }
        }

        if self.strings.table().is_modified() || !self.package.has_entry(&self.strings_path) {
            let count = self.string_cell_count();
            let data = self.strings_part.to_xml(&self.strings.table(), count)?;
            self.package.set_entry(self.strings_path.as_str(), data);
            self.strings.mark_saved();
        }

        self.properties.stamp_modified(Utc::now());
        self.package
            .set_entry(self.properties_path.as_str(), self.properties.to_xml()?);
        self.properties.mark_saved();

        self.package
            .set_entry(self.workbook_path.as_str(), self.workbook.to_xml()?);
        self.package.set_entry(
            rels_path_for(&self.workbook_path),
            self.workbook_rels.to_xml()?,
        );
        self.package
            .set_entry(rels_path_for(""), self.root_rels.to_xml()?);
        self.package
            .set_entry(CONTENT_TYPES_PATH, self.content_types.to_xml()?);
        Ok(())
    }

    /// Number of cells referencing the shared string table
    fn string_cell_count(&self) -> usize {
        self.sheets
            .iter()
            .map(|part| {
                let xml = part.sheet.xml();
                match xml.child(xml.root(), "sheetData") {
                    Some(data) => xml
                        .descendants(data)
                        .filter(|&node| xml.name(node) == "c" && xml.attribute(node, "t") == Some("s"))
                        .count(),
                    None => 0,
                }
            })
            .sum()
    }

    /// The underlying package
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Worksheet names in tab order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|part| part.sheet.name()).collect()
    }

    /// Number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Check if a worksheet with this name exists (case-insensitive)
    pub fn sheet_exists(&self, name: &str) -> bool {
        self.index_of_sheet(name).is_some()
    }

    /// Position of a worksheet (case-insensitive)
    pub fn index_of_sheet(&self, name: &str) -> Option<usize> {
        self.sheets
            .iter()
            .position(|part| same_name(part.sheet.name(), name))
    }

    /// Get a worksheet by name
    pub fn worksheet(&self, name: &str) -> XlsxResult<&Worksheet> {
        let index = self.require(name)?;
        Ok(&self.sheets[index].sheet)
    }

    /// Get a mutable worksheet by name
    pub fn worksheet_mut(&mut self, name: &str) -> XlsxResult<&mut Worksheet> {
        let index = self.require(name)?;
        Ok(&mut self.sheets[index].sheet)
    }

    /// Get a worksheet by position
    pub fn worksheet_at(&self, index: usize) -> XlsxResult<&Worksheet> {
        self.sheets
            .get(index)
            .map(|part| &part.sheet)
            .ok_or_else(|| XlsxError::SheetNotFound(format!("#{}", index)))
    }

    /// Get a mutable worksheet by position
    pub fn worksheet_at_mut(&mut self, index: usize) -> XlsxResult<&mut Worksheet> {
        self.sheets
            .get_mut(index)
            .map(|part| &mut part.sheet)
            .ok_or_else(|| XlsxError::SheetNotFound(format!("#{}", index)))
    }

    /// Iterate over the worksheets in tab order
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.sheets.iter().map(|part| &part.sheet)
    }

    /// Append an empty worksheet
    pub fn add_worksheet(&mut self, name: &str) -> XlsxResult<&mut Worksheet> {
        self.check_new_name(name, None)?;
        let sheet = Worksheet::new(name, self.strings.clone());
        self.insert_sheet(sheet)
    }

    /// Append a copy of an existing worksheet under a new name
    ///
    /// Elements pointing at relationships of the source (drawings, comments,
    /// hyperlinks and the like) are not carried over.
    pub fn clone_sheet(&mut self, existing: &str, new: &str) -> XlsxResult<&mut Worksheet> {
        let index = self.require(existing)?;
        self.check_new_name(new, None)?;

        let mut xml = XmlDocument::parse(&self.sheets[index].sheet.to_xml()?)?;
        let linked: Vec<_> = xml
            .descendants(xml.root())
            .filter(|&node| xml.attribute(node, "r:id").is_some())
            .collect();
        for node in linked {
            xml.detach(node);
        }
        let selected: Vec<_> = xml
            .descendants(xml.root())
            .filter(|&node| xml.name(node) == "sheetView")
            .collect();
        for view in selected {
            xml.remove_attribute(view, "tabSelected");
        }

        let sheet = Worksheet::from_xml(new, &xml.to_xml()?, self.strings.clone())?;
        self.insert_sheet(sheet)
    }

    /// Register a sheet in the workbook and write its part right away
    fn insert_sheet(&mut self, mut sheet: Worksheet) -> XlsxResult<&mut Worksheet> {
        let path = self.free_sheet_path();
        let target = relative_target(&self.workbook_path, &path);
        let r_id = self.workbook_rels.add(rel_type::WORKSHEET, &target);
        self.content_types
            .add_override(&path, content_type::WORKSHEET);
        let sheet_id = self.workbook.add_sheet(sheet.name(), &r_id);
        sheet.update_dimension();
        self.package.set_entry(path.as_str(), sheet.to_xml()?);
        sheet.mark_saved();
        log::debug!("added sheet '{}' (id {}) at {}", sheet.name(), sheet_id, path);

        self.sheets.push(SheetPart { path, r_id, sheet });
        let index = self.sheets.len() - 1;
        Ok(&mut self.sheets[index].sheet)
    }

    fn free_sheet_path(&self) -> String {
        let mut n = 1;
        loop {
            let path = sibling_path(&self.workbook_path, &format!("worksheets/sheet{}.xml", n));
            let taken = self.package.has_entry(&path)
                || self.sheets.iter().any(|part| part.path == path);
            if !taken {
                return path;
            }
            n += 1;
        }
    }

    /// Delete a worksheet together with its part and relationships
    ///
    /// The last sheet, and the last visible sheet, cannot be deleted.
    pub fn delete_sheet(&mut self, name: &str) -> XlsxResult<()> {
        let index = self.require(name)?;
        let entries = self.workbook.sheets();
        if entries.len() <= 1 {
            return Err(XlsxError::LastSheet);
        }
        let visible = entries
            .iter()
            .filter(|entry| entry.visibility == SheetVisibility::Visible)
            .count();
        let position = self.workbook.position(name).unwrap_or(0);
        if entries[position].visibility == SheetVisibility::Visible && visible <= 1 {
            return Err(XlsxError::LastVisibleSheet(entries[position].name.clone()));
        }

        self.workbook.remove_sheet(name)?;
        let part = self.sheets.remove(index);
        self.workbook_rels.remove(&part.r_id);
        self.package.remove_entry(&part.path);
        self.package.remove_entry(&rels_path_for(&part.path));
        self.content_types.remove_override(&part.path);
        log::debug!("deleted sheet '{}' ({})", part.sheet.name(), part.path);
        Ok(())
    }

    /// Rename a worksheet
    pub fn rename_sheet(&mut self, old: &str, new: &str) -> XlsxResult<()> {
        let index = self.require(old)?;
        self.check_new_name(new, Some(index))?;
        self.workbook.rename_sheet(old, new)?;
        self.sheets[index].sheet.set_name(new);
        Ok(())
    }

    /// Visibility of a worksheet
    pub fn sheet_visibility(&self, name: &str) -> XlsxResult<SheetVisibility> {
        self.require(name)?;
        self.workbook
            .sheets()
            .into_iter()
            .find(|entry| same_name(&entry.name, name))
            .map(|entry| entry.visibility)
            .ok_or_else(|| XlsxError::SheetNotFound(name.to_string()))
    }

    /// Show or hide a worksheet; at least one sheet stays visible
    pub fn set_sheet_visibility(
        &mut self,
        name: &str,
        visibility: SheetVisibility,
    ) -> XlsxResult<()> {
        self.require(name)?;
        if visibility != SheetVisibility::Visible {
            let entries = self.workbook.sheets();
            let others_visible = entries
                .iter()
                .any(|entry| !same_name(&entry.name, name) && entry.visibility == SheetVisibility::Visible);
            if !others_visible {
                return Err(XlsxError::LastVisibleSheet(name.to_string()));
            }
        }
        self.workbook.set_visibility(name, visibility)
    }

    /// Index of the selected tab
    pub fn active_sheet(&self) -> usize {
        self.workbook.active_tab()
    }

    /// Core document properties
    pub fn properties(&self) -> &DocumentProperties {
        &self.properties
    }

    /// Mutable core document properties
    pub fn properties_mut(&mut self) -> &mut DocumentProperties {
        &mut self.properties
    }

    /// The shared string table of the workbook
    pub fn shared_strings(&self) -> &SharedStrings {
        &self.strings
    }

    fn require(&self, name: &str) -> XlsxResult<usize> {
        self.index_of_sheet(name)
            .ok_or_else(|| XlsxError::SheetNotFound(name.to_string()))
    }

    /// Validate a sheet name; `renaming` is the index of a sheet the name may
    /// already belong to
    fn check_new_name(&self, name: &str, renaming: Option<usize>) -> XlsxResult<()> {
        validate_sheet_name(name)?;
        let clash = self
            .workbook
            .sheets()
            .iter()
            .any(|entry| same_name(&entry.name, name))
            && match renaming {
                Some(index) => self.index_of_sheet(name) != Some(index),
                None => true,
            };
        if clash {
            return Err(XlsxError::DuplicateSheetName(name.to_string()));
        }
        Ok(())
    }
}

/// Check a sheet name against Excel's rules
pub fn validate_sheet_name(name: &str) -> XlsxResult<()> {
    let invalid = |reason| {
        Err(XlsxError::InvalidSheetName {
            name: name.to_string(),
            reason,
        })
    };
    if name.is_empty() {
        return invalid("name is empty");
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return invalid("name is longer than 31 characters");
    }
    if name.contains(INVALID_NAME_CHARS) {
        return invalid("name contains one of [ ] : * ? / \\");
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return invalid("name starts or ends with an apostrophe");
    }
    Ok(())
}

/// `file` in the directory of `part`
fn sibling_path(part: &str, file: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, _)) => format!("{}/{}", dir, file),
        None => file.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blank_document() {
        let doc = Document::new().unwrap();
        assert_eq!(doc.sheet_names(), ["Sheet1"]);
        assert_eq!(doc.active_sheet(), 0);
        assert!(doc.shared_strings().is_empty());
        assert_eq!(
            doc.properties().property(crate::Property::Creator),
            Some("xlgrid")
        );
    }

    #[test]
    fn test_sheet_name_rules() {
        assert!(validate_sheet_name("Data 2024").is_ok());
        for name in ["", "a/b", "[x]", "what?", "'quoted'", &"x".repeat(32)] {
            assert!(
                matches!(
                    validate_sheet_name(name),
                    Err(XlsxError::InvalidSheetName { .. })
                ),
                "{:?}",
                name
            );
        }
        assert!(validate_sheet_name(&"é".repeat(31)).is_ok());
    }

    #[test]
    fn test_add_rename_and_duplicates() {
        let mut doc = Document::new().unwrap();
        doc.add_worksheet("Data").unwrap();
        assert_eq!(doc.sheet_names(), ["Sheet1", "Data"]);
        assert!(doc.package().has_entry("xl/worksheets/sheet2.xml"));

        assert!(matches!(
            doc.add_worksheet("data"),
            Err(XlsxError::DuplicateSheetName(_))
        ));
        assert!(matches!(
            doc.rename_sheet("Sheet1", "DATA"),
            Err(XlsxError::DuplicateSheetName(_))
        ));

        // changing only the case of a sheet's own name is allowed
        doc.rename_sheet("data", "DATA").unwrap();
        assert_eq!(doc.sheet_names(), ["Sheet1", "DATA"]);
        assert!(doc.sheet_exists("data"));
        assert_eq!(doc.index_of_sheet("Data"), Some(1));
    }

    #[test]
    fn test_delete_rules() {
        let mut doc = Document::new().unwrap();
        assert!(matches!(doc.delete_sheet("Sheet1"), Err(XlsxError::LastSheet)));

        doc.add_worksheet("Hidden").unwrap();
        doc.set_sheet_visibility("Hidden", SheetVisibility::Hidden)
            .unwrap();
        assert!(matches!(
            doc.delete_sheet("Sheet1"),
            Err(XlsxError::LastVisibleSheet(_))
        ));
        assert!(matches!(
            doc.set_sheet_visibility("Sheet1", SheetVisibility::VeryHidden),
            Err(XlsxError::LastVisibleSheet(_))
        ));

        doc.delete_sheet("Hidden").unwrap();
        assert_eq!(doc.sheet_names(), ["Sheet1"]);
        assert!(!doc.package().has_entry("xl/worksheets/sheet2.xml"));
        assert!(matches!(
            doc.delete_sheet("Hidden"),
            Err(XlsxError::SheetNotFound(_))
        ));
    }

    #[test]
    fn test_clone_sheet_copies_cells() {
        let mut doc = Document::new().unwrap();
        doc.worksheet_mut("Sheet1")
            .unwrap()
            .set_cell_value("B2", "copied")
            .unwrap();
        doc.clone_sheet("Sheet1", "Copy").unwrap();

        let copy = doc.worksheet("Copy").unwrap();
        assert_eq!(
            copy.get_value("B2").unwrap(),
            xlgrid_core::CellValue::from("copied")
        );
        assert_eq!(doc.shared_strings().len(), 1);
        assert_eq!(doc.sheet_names(), ["Sheet1", "Copy"]);
        assert!(doc.package().has_entry("xl/worksheets/sheet2.xml"));
    }
}
