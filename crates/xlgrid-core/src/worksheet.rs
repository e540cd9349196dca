//! Worksheet type
//!
//! A worksheet owns the parsed XML of its part. Rows and cells are the
//! `<row>` and `<c>` elements under `<sheetData>`; most positions of a sheet
//! have no element at all until they are touched.
//!
//! Design decisions:
//! - Rows are kept in ascending `r` order, cells in ascending column order.
//!   Every lookup relies on that to decide where to search and where to insert.
//! - Lookups that may create nodes take `&mut self`. Read-only lookups
//!   (`get_value`, `find_cell`, `values`) never change the tree.
//! - Address conversions on the hot path go through the sheet's own
//!   [`ReferenceCache`].

use crate::cell::codec;
use crate::cell::{Cell, CellHandle, CellRange, CellReference, CellValue, ReferenceCache};
use crate::column::Column;
use crate::error::{Error, Result};
use crate::iter::{CellIter, RangeValues};
use crate::range::Range;
use crate::row::Row;
use crate::shared_strings::SharedStrings;
use crate::xml::{NodeId, XmlDocument};
use crate::MAX_ROWS;

/// Main spreadsheet namespace
pub const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
/// Office relationships namespace
pub const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Elements that follow `<sheetData>` in a worksheet
const AFTER_SHEET_DATA: &[&str] = &[
    "sheetCalcPr",
    "sheetProtection",
    "protectedRanges",
    "scenarios",
    "autoFilter",
    "sortState",
    "dataConsolidate",
    "customSheetViews",
    "mergeCells",
    "phoneticPr",
    "conditionalFormatting",
    "dataValidations",
    "hyperlinks",
    "printOptions",
    "pageMargins",
    "pageSetup",
    "headerFooter",
    "rowBreaks",
    "colBreaks",
    "customProperties",
    "cellWatches",
    "ignoredErrors",
    "smartTags",
    "drawing",
    "legacyDrawing",
    "legacyDrawingHF",
    "picture",
    "oleObjects",
    "controls",
    "webPublishItems",
    "tableParts",
    "extLst",
];

/// Where a row or cell sits relative to the existing children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Found(NodeId),
    InsertAfter(NodeId),
    InsertBefore(NodeId),
    Append,
}

/// A worksheet backed by its XML tree
#[derive(Debug, Clone)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    xml: XmlDocument,
    sheet_data: NodeId,
    strings: SharedStrings,
    cache: ReferenceCache,
    modified: bool,
}

impl Worksheet {
    /// Create an empty worksheet using the given shared string table
    pub fn new<S: Into<String>>(name: S, strings: SharedStrings) -> Self {
        let mut xml = XmlDocument::new("worksheet");
        let root = xml.root();
        xml.set_attribute(root, "xmlns", SPREADSHEET_NS);
        xml.set_attribute(root, "xmlns:r", RELATIONSHIPS_NS);

        let dimension = xml.append_child(root, "dimension");
        xml.set_attribute(dimension, "ref", "A1");
        let views = xml.append_child(root, "sheetViews");
        let view = xml.append_child(views, "sheetView");
        xml.set_attribute(view, "workbookViewId", "0");
        let format = xml.append_child(root, "sheetFormatPr");
        xml.set_attribute(format, "defaultRowHeight", "15");
        let sheet_data = xml.append_child(root, "sheetData");
        let margins = xml.append_child(root, "pageMargins");
        for (key, value) in [
            ("left", "0.7"),
            ("right", "0.7"),
            ("top", "0.75"),
            ("bottom", "0.75"),
            ("header", "0.3"),
            ("footer", "0.3"),
        ] {
            xml.set_attribute(margins, key, value);
        }

        Self {
            name: name.into(),
            xml,
            sheet_data,
            strings,
            cache: ReferenceCache::new(),
            modified: true,
        }
    }

    /// Load a worksheet from the XML of its part
    ///
    /// Rows and cells without an `r` attribute get one, numbered after their
    /// predecessor.
    pub fn from_xml<S: Into<String>>(name: S, xml: &[u8], strings: SharedStrings) -> Result<Self> {
        let mut xml = XmlDocument::parse(xml)?;
        let root = xml.root();
        if xml.name(root) != "worksheet" {
            return Err(Error::MalformedXml(format!(
                "expected <worksheet>, found <{}>",
                xml.name(root)
            )));
        }

        let sheet_data = match xml.child(root, "sheetData") {
            Some(node) => node,
            None => {
                let before = xml
                    .children(root)
                    .find(|&child| AFTER_SHEET_DATA.contains(&xml.name(child)));
                match before {
                    Some(before) => xml.insert_before(before, "sheetData"),
                    None => xml.append_child(root, "sheetData"),
                }
            }
        };

        let mut sheet = Self {
            name: name.into(),
            xml,
            sheet_data,
            strings,
            cache: ReferenceCache::new(),
            modified: false,
        };
        sheet.number_rows_and_cells()?;
        Ok(sheet)
    }

    fn number_rows_and_cells(&mut self) -> Result<()> {
        let rows: Vec<NodeId> = self.xml.children(self.sheet_data).collect();
        let mut previous_row = 0u32;

        for row in rows {
            let number = match self.xml.attribute(row, "r") {
                Some(r) => parse_row_number(r)?,
                None => {
                    let number = previous_row
                        .checked_add(1)
                        .filter(|&n| n <= MAX_ROWS)
                        .ok_or(Error::RowOutOfBounds(previous_row.saturating_add(1), MAX_ROWS))?;
                    self.xml.set_attribute(row, "r", self.cache.row_text(number));
                    number
                }
            };
            previous_row = number;

            let cells: Vec<NodeId> = self.xml.children(row).collect();
            let mut previous_column = 0u16;
            for cell in cells {
                let column = match self.xml.attribute(cell, "r") {
                    Some(r) => self.cache.column_of(r)?,
                    None => {
                        let reference = CellReference::new(number, previous_column + 1)?;
                        let address = self.cache.address(reference);
                        self.xml.set_attribute(cell, "r", &address);
                        reference.column()
                    }
                };
                previous_column = column;
            }
        }
        Ok(())
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// The sheet's XML tree
    pub fn xml(&self) -> &XmlDocument {
        &self.xml
    }

    /// Serialize the sheet's XML
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        self.xml.to_xml()
    }

    /// The shared string table this sheet writes to
    pub fn shared_strings(&self) -> &SharedStrings {
        &self.strings
    }

    /// Whether the sheet changed since it was loaded or last saved
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Reset the modified flag
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    pub(crate) fn mark_modified(&mut self) {
        self.modified = true;
    }

    pub(crate) fn xml_mut(&mut self) -> &mut XmlDocument {
        &mut self.xml
    }

    pub(crate) fn sheet_data(&self) -> NodeId {
        self.sheet_data
    }

    pub(crate) fn xml_and_strings(&mut self) -> (&mut XmlDocument, &SharedStrings) {
        (&mut self.xml, &self.strings)
    }

    // === Cell Access ===

    /// Get a cell by address string (e.g., "A1"), creating its node if needed
    pub fn cell(&mut self, address: &str) -> Result<Cell<'_>> {
        let reference = self.cache.parse(address)?;
        self.cell_by_ref(reference)
    }

    /// Get a cell by 1-based row and column, creating its node if needed
    pub fn cell_at(&mut self, row: u32, column: u16) -> Result<Cell<'_>> {
        self.cell_by_ref(CellReference::new(row, column)?)
    }

    /// Get a cell by reference, creating its node if needed
    pub fn cell_by_ref(&mut self, reference: CellReference) -> Result<Cell<'_>> {
        let handle = self.handle(reference)?;
        Ok(Cell::new(self, handle))
    }

    /// Access a cell through a handle obtained earlier
    ///
    /// Fails with an internal error when the handle does not name a cell
    /// node of this worksheet.
    pub fn cell_from_handle(&mut self, handle: CellHandle) -> Result<Cell<'_>> {
        self.check_handle(handle)?;
        Ok(Cell::new(self, handle))
    }

    /// Make sure a handle names a `<c>` node of this sheet at its reference
    pub fn check_handle(&self, handle: CellHandle) -> Result<()> {
        let node = handle.node();
        let valid = self.xml.contains(node)
            && self.xml.name(node) == "c"
            && self
                .xml
                .attribute(node, "r")
                .and_then(|r| CellReference::parse(r).ok())
                == Some(handle.reference());
        if valid {
            Ok(())
        } else {
            Err(Error::internal(format!(
                "handle for {} does not belong to sheet '{}'",
                handle.reference(),
                self.name
            )))
        }
    }

    /// Resolve or create the node of a cell
    pub fn handle(&mut self, reference: CellReference) -> Result<CellHandle> {
        let row = self.row_node(reference.row())?;
        let node = self.cell_node(row, reference)?;
        Ok(CellHandle::new(node, reference))
    }

    /// Handle of an existing cell, without creating anything
    pub fn find_cell(&self, reference: CellReference) -> Result<Option<CellHandle>> {
        let Some(row) = self.find_row_node(reference.row())? else {
            return Ok(None);
        };
        let slot = locate_cell(&self.xml, row, reference.column(), column_of_address)?;
        Ok(match slot {
            Slot::Found(node) => Some(CellHandle::new(node, reference)),
            _ => None,
        })
    }

    /// Handle for an existing `<c>` node, reference taken from its `r`
    pub fn handle_for_node(&self, node: NodeId) -> Result<CellHandle> {
        let address = self
            .xml
            .attribute(node, "r")
            .ok_or_else(|| Error::MalformedXml("cell without an r attribute".into()))?;
        Ok(CellHandle::new(node, CellReference::parse(address)?))
    }

    /// Handles of every existing cell node, in document order
    pub fn cell_handles(&self) -> impl Iterator<Item = Result<CellHandle>> + '_ {
        self.xml
            .children(self.sheet_data)
            .flat_map(move |row| self.xml.children_named(row, "c"))
            .map(move |cell| self.handle_for_node(cell))
    }

    /// Value of a cell by address; absent cells read as empty
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        self.value_of(CellReference::parse(address)?)
    }

    /// Value of a cell by 1-based row and column; absent cells read as empty
    pub fn get_value_at(&self, row: u32, column: u16) -> Result<CellValue> {
        self.value_of(CellReference::new(row, column)?)
    }

    /// Value of a cell by reference, without creating anything
    pub fn value_of(&self, reference: CellReference) -> Result<CellValue> {
        match self.find_cell(reference)? {
            Some(handle) => self.handle_value(handle),
            None => Ok(CellValue::Empty),
        }
    }

    /// Value behind a handle
    pub fn handle_value(&self, handle: CellHandle) -> Result<CellValue> {
        self.check_handle(handle)?;
        codec::read_value(&self.xml, handle.node(), &self.strings)
    }

    /// Set a cell value by address string
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        self.cell(address)?.set_value(value);
        Ok(())
    }

    /// Set a cell value by 1-based row and column
    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        column: u16,
        value: V,
    ) -> Result<()> {
        self.cell_at(row, column)?.set_value(value);
        Ok(())
    }

    /// Set a cell formula by address string
    pub fn set_cell_formula(&mut self, address: &str, formula: &str) -> Result<()> {
        self.cell(address)?.set_formula(formula);
        Ok(())
    }

    /// Clear a cell's value (the node stays)
    pub fn clear_cell(&mut self, address: &str) -> Result<()> {
        let reference = CellReference::parse(address)?;
        if let Some(handle) = self.find_cell(reference)? {
            self.cell_from_handle(handle)?.clear();
        }
        Ok(())
    }

    // === Rows, columns and ranges ===

    /// Row view, creating the row node if needed
    pub fn row(&mut self, row: u32) -> Result<Row<'_>> {
        if row == 0 || row > MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS));
        }
        let node = self.row_node(row)?;
        Ok(Row::new(self, node, row))
    }

    /// Column view, creating the `<col>` node if needed
    pub fn column(&mut self, column: u16) -> Result<Column<'_>> {
        Column::resolve(self, column)
    }

    /// Range view from A1-style notation ("A1:C3")
    pub fn range(&mut self, notation: &str) -> Result<Range<'_>> {
        let range = CellRange::parse(notation)?;
        Ok(Range::new(self, range))
    }

    /// Range view over an existing [`CellRange`]
    pub fn range_of(&mut self, range: CellRange) -> Range<'_> {
        Range::new(self, range)
    }

    /// Walk a range in row-major order, creating missing nodes on the way
    pub fn iter_range(&mut self, range: &CellRange) -> Result<CellIter<'_>> {
        CellIter::new(self, range)
    }

    /// Read-only walk over a range; creates nothing
    pub fn values(&self, range: &CellRange) -> RangeValues<'_> {
        RangeValues::new(self, range)
    }

    /// Copy the values of `source` onto `destination` in this sheet
    ///
    /// Both must have the same (rows, columns) after transposition. Positions
    /// with no value in the source clear the destination cell.
    pub fn assign_range(&mut self, destination: &CellRange, source: &CellRange) -> Result<()> {
        check_shape(destination, source)?;
        let values = self.snapshot(source)?;
        self.write_snapshot(destination, values)
    }

    /// Copy the values of `source` in another sheet onto `destination`
    pub fn assign_range_from(
        &mut self,
        destination: &CellRange,
        source_sheet: &Worksheet,
        source: &CellRange,
    ) -> Result<()> {
        check_shape(destination, source)?;
        let values = source_sheet.snapshot(source)?;
        self.write_snapshot(destination, values)
    }

    fn snapshot(&self, source: &CellRange) -> Result<Vec<CellValue>> {
        let mut values = Vec::with_capacity(source.cell_count() as usize);
        for row in 1..=source.num_rows() {
            for column in 1..=source.num_columns() {
                values.push(self.value_of(source.resolve(row, column)?)?);
            }
        }
        Ok(values)
    }

    fn write_snapshot(&mut self, destination: &CellRange, values: Vec<CellValue>) -> Result<()> {
        let columns = destination.num_columns();
        for (index, value) in values.into_iter().enumerate() {
            let index = index as u32;
            let reference = destination.resolve(index / columns + 1, index % columns + 1)?;
            self.cell_by_ref(reference)?.set_value(value);
        }
        Ok(())
    }

    // === Dimensions ===

    /// Row number of the last row node (0 for an empty sheet)
    pub fn row_count(&self) -> u32 {
        self.xml
            .last_child(self.sheet_data)
            .and_then(|row| self.xml.attribute(row, "r"))
            .and_then(|r| r.parse().ok())
            .unwrap_or(0)
    }

    /// Highest column used by any row (0 for an empty sheet)
    pub fn column_count(&self) -> u16 {
        self.xml
            .children(self.sheet_data)
            .filter_map(|row| self.last_column_of(row))
            .max()
            .unwrap_or(0)
    }

    pub(crate) fn last_column_of(&self, row: NodeId) -> Option<u16> {
        self.xml
            .last_child(row)
            .and_then(|cell| self.xml.attribute(cell, "r"))
            .and_then(|r| column_of_address(r).ok())
    }

    /// Bottom-right corner of the used area
    pub fn last_cell(&self) -> Option<CellReference> {
        CellReference::new(self.row_count(), self.column_count()).ok()
    }

    /// The used area, from A1 to [`last_cell`](Self::last_cell)
    pub fn used_range(&self) -> Option<CellRange> {
        let last = self.last_cell()?;
        let first = CellReference::new(1, 1).ok()?;
        CellRange::new(first, last).ok()
    }

    /// The `<dimension ref>` as stored, which may be stale until saved
    pub fn dimension(&self) -> Option<&str> {
        let root = self.xml.root();
        self.xml
            .child(root, "dimension")
            .and_then(|node| self.xml.attribute(node, "ref"))
    }

    /// Write the used area into the `<dimension>` element
    pub fn update_dimension(&mut self) {
        let notation = self
            .used_range()
            .map_or_else(|| "A1".to_string(), |range| range.to_a1_string());

        let root = self.xml.root();
        let dimension = match self.xml.child(root, "dimension") {
            Some(node) => node,
            None => match self.xml.child(root, "sheetPr") {
                Some(pr) => self.xml.insert_after(pr, "dimension"),
                None => self.xml.prepend_child(root, "dimension"),
            },
        };
        if self.xml.attribute(dimension, "ref") != Some(notation.as_str()) {
            self.xml.set_attribute(dimension, "ref", &notation);
            self.modified = true;
        }
    }

    // === Merged cells ===

    /// Merged regions in document order
    pub fn merged_regions(&self) -> Result<Vec<CellRange>> {
        let Some(merges) = self.xml.child(self.xml.root(), "mergeCells") else {
            return Ok(Vec::new());
        };
        self.xml
            .children_named(merges, "mergeCell")
            .map(|node| {
                let notation = self.xml.attribute(node, "ref").ok_or_else(|| {
                    Error::MalformedXml("mergeCell without a ref attribute".into())
                })?;
                CellRange::parse(notation)
            })
            .collect()
    }

    /// The merged region covering a cell, if any
    pub fn merged_region_at(&self, reference: CellReference) -> Result<Option<CellRange>> {
        Ok(self
            .merged_regions()?
            .into_iter()
            .find(|region| region.contains(&reference)))
    }

    /// Merge a region of at least two cells
    ///
    /// The region must not overlap an existing merge. Values of the covered
    /// cells are kept; [`merge_cells_clearing`](Self::merge_cells_clearing)
    /// drops them.
    pub fn merge_cells(&mut self, range: &CellRange) -> Result<()> {
        if range.cell_count() < 2 {
            return Err(Error::InvalidRange(format!(
                "a merged region needs at least two cells, got {}",
                range
            )));
        }
        if let Some(existing) = self
            .merged_regions()?
            .into_iter()
            .find(|existing| existing.overlaps(range))
        {
            return Err(Error::MergedCellConflict(format!(
                "{} overlaps merged region {}",
                range, existing
            )));
        }

        let merges = self.merge_cells_node();
        let node = self.xml.append_child(merges, "mergeCell");
        self.xml.set_attribute(node, "ref", &range.to_a1_string());
        self.update_merge_count(merges);
        self.modified = true;
        Ok(())
    }

    /// Merge a region and clear the value of every cell but the top-left one
    pub fn merge_cells_clearing(&mut self, range: &CellRange) -> Result<()> {
        self.merge_cells(range)?;
        let top_left = range.top_left();
        for reference in range.references().filter(|&reference| reference != top_left) {
            if let Some(handle) = self.find_cell(reference)? {
                self.cell_from_handle(handle)?.clear();
            }
        }
        Ok(())
    }

    /// Remove the merged region with exactly these corners
    ///
    /// Returns `false` when there is no such region. The `<mergeCells>`
    /// element goes away with its last region.
    pub fn unmerge_cells(&mut self, range: &CellRange) -> bool {
        let Some(merges) = self.xml.child(self.xml.root(), "mergeCells") else {
            return false;
        };
        let found = self.xml.children_named(merges, "mergeCell").find(|&node| {
            self.xml
                .attribute(node, "ref")
                .and_then(|notation| CellRange::parse(notation).ok())
                .map_or(false, |region| {
                    region.top_left() == range.top_left()
                        && region.bottom_right() == range.bottom_right()
                })
        });
        let Some(node) = found else {
            return false;
        };

        self.xml.detach(node);
        if self.xml.child(merges, "mergeCell").is_none() {
            self.xml.detach(merges);
        } else {
            self.update_merge_count(merges);
        }
        self.modified = true;
        true
    }

    /// Existing `<mergeCells>`, or a new one at its schema position
    fn merge_cells_node(&mut self) -> NodeId {
        let root = self.xml.root();
        if let Some(node) = self.xml.child(root, "mergeCells") {
            return node;
        }
        let following = AFTER_SHEET_DATA
            .iter()
            .position(|&name| name == "mergeCells")
            .map_or(AFTER_SHEET_DATA, |index| &AFTER_SHEET_DATA[index + 1..]);
        let before = self
            .xml
            .children(root)
            .find(|&child| following.contains(&self.xml.name(child)));
        match before {
            Some(before) => self.xml.insert_before(before, "mergeCells"),
            None => self.xml.append_child(root, "mergeCells"),
        }
    }

    fn update_merge_count(&mut self, merges: NodeId) {
        let count = self.xml.children_named(merges, "mergeCell").count();
        self.xml.set_attribute(merges, "count", &count.to_string());
    }

    // === Node location ===

    /// Existing row node, without creating anything
    pub(crate) fn find_row_node(&self, row: u32) -> Result<Option<NodeId>> {
        Ok(match locate_row(&self.xml, self.sheet_data, row)? {
            Slot::Found(node) => Some(node),
            _ => None,
        })
    }

    /// Row node for `row`, inserted in order if missing
    pub(crate) fn row_node(&mut self, row: u32) -> Result<NodeId> {
        let slot = locate_row(&self.xml, self.sheet_data, row)?;
        if let Slot::Found(node) = slot {
            return Ok(node);
        }
        let node = insert_at(&mut self.xml, self.sheet_data, slot, "row");
        self.xml.set_attribute(node, "r", self.cache.row_text(row));
        self.modified = true;
        Ok(node)
    }

    /// Cell node for `reference` inside `row`, inserted in order if missing
    pub(crate) fn cell_node(&mut self, row: NodeId, reference: CellReference) -> Result<NodeId> {
        let cache = &mut self.cache;
        let slot = locate_cell(&self.xml, row, reference.column(), |address| {
            cache.column_of(address)
        })?;
        if let Slot::Found(node) = slot {
            return Ok(node);
        }
        let node = insert_at(&mut self.xml, row, slot, "c");
        self.set_address(node, reference);
        Ok(node)
    }

    /// New `<c>` right after `after`, for a caller that knows the order holds
    pub(crate) fn insert_cell_after(&mut self, after: NodeId, reference: CellReference) -> NodeId {
        let node = self.xml.insert_after(after, "c");
        self.set_address(node, reference);
        node
    }

    /// New `<row>` right after `after`, for a caller that knows the order holds
    pub(crate) fn insert_row_after(&mut self, after: NodeId, row: u32) -> NodeId {
        let node = self.xml.insert_after(after, "row");
        self.xml.set_attribute(node, "r", self.cache.row_text(row));
        self.modified = true;
        node
    }

    fn set_address(&mut self, node: NodeId, reference: CellReference) {
        let address = self.cache.address(reference);
        self.xml.set_attribute(node, "r", &address);
        self.modified = true;
    }

    /// Row number of a row node
    pub(crate) fn row_number_of(&self, row: NodeId) -> Result<u32> {
        row_number(&self.xml, row)
    }

    /// Column of a cell node, through the cache
    pub(crate) fn column_of_node(&mut self, cell: NodeId) -> Result<u16> {
        let address = self
            .xml
            .attribute(cell, "r")
            .ok_or_else(|| Error::MalformedXml("cell without an r attribute".into()))?;
        self.cache.column_of(address)
    }
}

fn check_shape(destination: &CellRange, source: &CellRange) -> Result<()> {
    let expected = (destination.num_rows(), destination.num_columns());
    let actual = (source.num_rows(), source.num_columns());
    if expected != actual {
        return Err(Error::ShapeMismatch { expected, actual });
    }
    Ok(())
}

fn parse_row_number(text: &str) -> Result<u32> {
    let number: u32 = text
        .trim()
        .parse()
        .map_err(|_| Error::MalformedXml(format!("invalid row number '{}'", text)))?;
    if number == 0 || number > MAX_ROWS {
        return Err(Error::RowOutOfBounds(number, MAX_ROWS));
    }
    Ok(number)
}

fn row_number(xml: &XmlDocument, row: NodeId) -> Result<u32> {
    let r = xml
        .attribute(row, "r")
        .ok_or_else(|| Error::MalformedXml("row without an r attribute".into()))?;
    parse_row_number(r)
}

pub(crate) fn column_of_address(address: &str) -> Result<u16> {
    let letters = address
        .find(|c: char| !c.is_ascii_alphabetic())
        .map_or(address, |end| &address[..end]);
    CellReference::letters_to_column(letters)
}

fn insert_at(xml: &mut XmlDocument, parent: NodeId, slot: Slot, name: &str) -> NodeId {
    match slot {
        Slot::Found(node) => node,
        Slot::InsertAfter(node) => xml.insert_after(node, name),
        Slot::InsertBefore(node) => xml.insert_before(node, name),
        Slot::Append => xml.append_child(parent, name),
    }
}

/// Find the slot of `row` among the rows of `sheet_data`
///
/// Rows after the last one append. Otherwise the scan starts from whichever
/// end is closer to the requested row number.
fn locate_row(xml: &XmlDocument, sheet_data: NodeId, row: u32) -> Result<Slot> {
    let Some(last) = xml.last_child(sheet_data) else {
        return Ok(Slot::Append);
    };
    let last_row = row_number(xml, last)?;
    if last_row < row {
        return Ok(Slot::Append);
    }
    if last_row == row {
        return Ok(Slot::Found(last));
    }

    if last_row - row < row {
        let mut node = last;
        loop {
            let current = row_number(xml, node)?;
            if current == row {
                return Ok(Slot::Found(node));
            }
            if current < row {
                return Ok(Slot::InsertAfter(node));
            }
            match xml.prev_sibling(node) {
                Some(prev) => node = prev,
                None => return Ok(Slot::InsertBefore(node)),
            }
        }
    }

    let mut next = xml.first_child(sheet_data);
    while let Some(node) = next {
        let current = row_number(xml, node)?;
        if current == row {
            return Ok(Slot::Found(node));
        }
        if current > row {
            return Ok(Slot::InsertBefore(node));
        }
        next = xml.next_sibling(node);
    }
    Ok(Slot::Append)
}

/// Find the slot of `column` among the cells of `row`
fn locate_cell<F>(xml: &XmlDocument, row: NodeId, column: u16, mut column_of: F) -> Result<Slot>
where
    F: FnMut(&str) -> Result<u16>,
{
    let mut column_at = |node: NodeId| -> Result<u16> {
        let address = xml
            .attribute(node, "r")
            .ok_or_else(|| Error::MalformedXml("cell without an r attribute".into()))?;
        column_of(address)
    };

    let Some(last) = xml.last_child(row) else {
        return Ok(Slot::Append);
    };
    let last_column = column_at(last)?;
    if last_column < column {
        return Ok(Slot::Append);
    }
    if last_column == column {
        return Ok(Slot::Found(last));
    }

    if last_column - column < column {
        let mut node = last;
        loop {
            let current = column_at(node)?;
            if current == column {
                return Ok(Slot::Found(node));
            }
            if current < column {
                return Ok(Slot::InsertAfter(node));
            }
            match xml.prev_sibling(node) {
                Some(prev) => node = prev,
                None => return Ok(Slot::InsertBefore(node)),
            }
        }
    }

    let mut next = xml.first_child(row);
    while let Some(node) = next {
        let current = column_at(node)?;
        if current == column {
            return Ok(Slot::Found(node));
        }
        if current > column {
            return Ok(Slot::InsertBefore(node));
        }
        next = xml.next_sibling(node);
    }
    Ok(Slot::Append)
}
