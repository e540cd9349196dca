//! Cell-related types

pub(crate) mod codec;
mod reference;
mod value;

pub use codec::rich_text;
pub use reference::{CellRange, CellReference, ReferenceCache, References};
pub use value::{CellValue, FromCellValue, ValueType, NUM_ERROR};

use crate::error::Result;
use crate::worksheet::Worksheet;
use crate::xml::NodeId;
use chrono::NaiveDateTime;
use std::hash::{Hash, Hasher};

/// Stable handle to a cell node of a worksheet
///
/// Handles stay valid while rows and cells are inserted around them. Two
/// handles are equal when they name the same node.
#[derive(Debug, Clone, Copy)]
pub struct CellHandle {
    node: NodeId,
    reference: CellReference,
}

impl CellHandle {
    pub(crate) fn new(node: NodeId, reference: CellReference) -> Self {
        Self { node, reference }
    }

    /// The `<c>` node
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Position of the cell
    pub fn reference(&self) -> CellReference {
        self.reference
    }
}

impl PartialEq for CellHandle {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Eq for CellHandle {}

impl Hash for CellHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.hash(state);
    }
}

/// A cell of a worksheet, borrowed for reading and writing
///
/// The reference is fixed for the lifetime of the cell; writing a value only
/// changes what is stored at that position.
#[derive(Debug)]
pub struct Cell<'a> {
    sheet: &'a mut Worksheet,
    handle: CellHandle,
}

impl<'a> Cell<'a> {
    pub(crate) fn new(sheet: &'a mut Worksheet, handle: CellHandle) -> Self {
        Self { sheet, handle }
    }

    /// Position of the cell
    pub fn reference(&self) -> CellReference {
        self.handle.reference
    }

    /// Handle to come back to this cell later
    pub fn handle(&self) -> CellHandle {
        self.handle
    }

    /// Current value
    pub fn value(&self) -> Result<CellValue> {
        self.sheet.handle_value(self.handle)
    }

    /// Type of the current value, without decoding it
    pub fn value_type(&self) -> ValueType {
        codec::value_type(self.sheet.xml(), self.handle.node)
    }

    /// Typed read of the current value
    pub fn get<T: FromCellValue>(&self) -> Result<T> {
        self.value()?.get()
    }

    /// Current value as display text
    pub fn as_string(&self) -> Result<String> {
        Ok(self.value()?.as_string())
    }

    /// Store a value
    ///
    /// Strings go through the shared string table; NaN and infinities are
    /// stored as the "#NUM!" error.
    pub fn set_value<V: Into<CellValue>>(&mut self, value: V) {
        let (xml, strings) = self.sheet.xml_and_strings();
        codec::write_value(xml, self.handle.node, &value.into(), strings);
        self.sheet.mark_modified();
    }

    /// Current value read as a serial date/time
    pub fn datetime(&self) -> Result<NaiveDateTime> {
        self.value()?.as_datetime()
    }

    /// Store a date/time as its serial number
    ///
    /// The cell keeps no number format, so spreadsheet applications show the
    /// plain serial until a date style is applied.
    pub fn set_datetime(&mut self, moment: NaiveDateTime) -> Result<()> {
        self.set_value(CellValue::from_datetime(moment)?);
        Ok(())
    }

    /// Store an error code such as "#N/A"
    pub fn set_error(&mut self, code: &str) {
        self.set_value(CellValue::error(code));
    }

    /// Remove the value (type marker and payload); the formula stays
    pub fn clear(&mut self) {
        codec::clear_value(self.sheet.xml_mut(), self.handle.node);
        self.sheet.mark_modified();
    }

    /// Whether the cell has a formula
    pub fn has_formula(&self) -> bool {
        self.sheet.xml().child(self.handle.node, "f").is_some()
    }

    /// Formula text, stored verbatim
    pub fn formula(&self) -> Option<String> {
        let xml = self.sheet.xml();
        xml.child(self.handle.node, "f")
            .map(|f| xml.text(f).unwrap_or_default().to_string())
    }

    /// Store a formula; it is kept as text and never evaluated
    pub fn set_formula(&mut self, formula: &str) {
        let node = self.handle.node;
        let xml = self.sheet.xml_mut();
        let f = match xml.child(node, "f") {
            Some(f) => f,
            None => match xml.child(node, "v") {
                Some(v) => xml.insert_before(v, "f"),
                None => xml.append_child(node, "f"),
            },
        };
        xml.set_text(f, formula);
        self.sheet.mark_modified();
    }

    /// Remove the formula
    pub fn clear_formula(&mut self) {
        if self.sheet.xml_mut().remove_child(self.handle.node, "f") {
            self.sheet.mark_modified();
        }
    }

    /// Copy the values of `source` into the region starting at this cell
    ///
    /// The destination has the extents of `source` (after transposition). A
    /// destination running past the sheet limits fails with an address error
    /// before anything is written.
    pub fn assign_range(&mut self, source: &CellRange) -> Result<()> {
        let destination = self.destination_for(source)?;
        self.sheet.assign_range(&destination, source)
    }

    /// Same as [`assign_range`](Self::assign_range) with a source in another sheet
    pub fn assign_range_from(&mut self, source_sheet: &Worksheet, source: &CellRange) -> Result<()> {
        let destination = self.destination_for(source)?;
        self.sheet
            .assign_range_from(&destination, source_sheet, source)
    }

    fn destination_for(&self, source: &CellRange) -> Result<CellRange> {
        let top_left = self.reference();
        let bottom_right =
            top_left.offset(source.num_rows() - 1, (source.num_columns() - 1) as u16)?;
        CellRange::new(top_left, bottom_right)
    }
}
