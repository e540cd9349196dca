//! Traversal of cell ranges
//!
//! Two ways to walk a rectangle:
//!
//! - [`CellCursor`] / [`CellIter`] visit every position in row-major order
//!   and make sure a `<row>` and `<c>` node exists for each one. Walking an
//!   empty region therefore fills it with empty nodes.
//! - [`RangeValues`] reads the same positions without touching the tree;
//!   missing cells read as [`CellValue::Empty`].

use crate::cell::{Cell, CellHandle, CellRange, CellReference, CellValue, References};
use crate::error::{Error, Result};
use crate::worksheet::{column_of_address, Worksheet};
use crate::xml::NodeId;
use std::cmp::Ordering;
use std::iter::FusedIterator;

/// Position of a walk over a range
///
/// A cursor is either on a cell node inside the range or at the end. It does
/// not borrow the worksheet; every step takes the sheet explicitly.
#[derive(Debug, Clone, Copy)]
pub struct CellCursor {
    range: CellRange,
    current: Option<CellHandle>,
}

impl CellCursor {
    /// Cursor on the top-left cell of `range`, creating its node if needed
    pub fn begin(sheet: &mut Worksheet, range: &CellRange) -> Result<Self> {
        let handle = sheet.handle(range.top_left())?;
        Ok(Self {
            range: *range,
            current: Some(handle),
        })
    }

    /// Past-the-end cursor of `range`
    pub fn end(range: &CellRange) -> Self {
        Self {
            range: *range,
            current: None,
        }
    }

    /// The cell under the cursor, `None` at the end
    pub fn current(&self) -> Option<CellHandle> {
        self.current
    }

    /// Whether the cursor is past the bottom-right cell
    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    /// Move to the next position in row-major order
    ///
    /// The next row or cell node is reused when it already holds the next
    /// position and inserted otherwise. After the bottom-right cell the
    /// cursor moves to the end. Advancing the end cursor is an error.
    pub fn advance(&mut self, sheet: &mut Worksheet) -> Result<()> {
        let Some(current) = self.current else {
            return Err(Error::internal("cannot advance past the end of a range"));
        };
        sheet.check_handle(current)?;
        let reference = current.reference();
        let top_left = self.range.top_left();
        let bottom_right = self.range.bottom_right();

        if !self.range.contains(&reference) {
            return Err(Error::internal(format!(
                "cursor at {} is outside of {}",
                reference, self.range
            )));
        }

        if reference.column() < bottom_right.column() {
            let next = CellReference::new(reference.row(), reference.column() + 1)?;
            let node = next_cell_node(sheet, current.node(), next)?;
            self.current = Some(CellHandle::new(node, next));
        } else if reference.row() < bottom_right.row() {
            let next = CellReference::new(reference.row() + 1, top_left.column())?;
            let row = sheet
                .xml()
                .parent(current.node())
                .ok_or_else(|| Error::internal(format!("cell {} has no row", reference)))?;
            let row = next_row_node(sheet, row, next.row())?;
            let node = sheet.cell_node(row, next)?;
            self.current = Some(CellHandle::new(node, next));
        } else {
            self.current = None;
        }
        Ok(())
    }

    /// Number of steps from this cursor to `other`
    ///
    /// Counts by advancing a copy, so it costs one step per cell and may
    /// create nodes on the way. Fails if `other` is not ahead of this cursor.
    pub fn distance(&self, sheet: &mut Worksheet, other: &CellCursor) -> Result<u64> {
        let mut cursor = *self;
        let mut steps = 0;
        while cursor != *other {
            if cursor.is_end() {
                return Err(Error::internal("target cursor is not reachable"));
            }
            cursor.advance(sheet)?;
            steps += 1;
        }
        Ok(steps)
    }
}

impl PartialEq for CellCursor {
    fn eq(&self, other: &Self) -> bool {
        match (self.current, other.current) {
            (None, None) => true,
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CellCursor {}

/// Cell node following `current` in its row, for position `next`
fn next_cell_node(sheet: &mut Worksheet, current: NodeId, next: CellReference) -> Result<NodeId> {
    let Some(sibling) = sheet.xml().next_sibling(current) else {
        return Ok(sheet.insert_cell_after(current, next));
    };
    match sheet.column_of_node(sibling)?.cmp(&next.column()) {
        Ordering::Equal => Ok(sibling),
        Ordering::Greater => Ok(sheet.insert_cell_after(current, next)),
        Ordering::Less => Err(Error::internal(format!(
            "cells out of order before {}",
            next
        ))),
    }
}

/// Row node following `current`, for row number `next`
fn next_row_node(sheet: &mut Worksheet, current: NodeId, next: u32) -> Result<NodeId> {
    let Some(sibling) = sheet.xml().next_sibling(current) else {
        return Ok(sheet.insert_row_after(current, next));
    };
    match sheet.row_number_of(sibling)?.cmp(&next) {
        Ordering::Equal => Ok(sibling),
        Ordering::Greater => Ok(sheet.insert_row_after(current, next)),
        Ordering::Less => Err(Error::internal(format!("rows out of order before {}", next))),
    }
}

/// Iterator over the cells of a range, creating missing nodes
///
/// Yields handles in row-major order of the physical layout. Use
/// [`cell`](Self::cell) to read or write the cell behind a handle while the
/// walk is in progress. An error ends the walk.
#[derive(Debug)]
pub struct CellIter<'a> {
    sheet: &'a mut Worksheet,
    cursor: CellCursor,
    started: bool,
    remaining: u64,
}

impl<'a> CellIter<'a> {
    pub(crate) fn new(sheet: &'a mut Worksheet, range: &CellRange) -> Result<Self> {
        let cursor = CellCursor::begin(sheet, range)?;
        Ok(Self {
            sheet,
            cursor,
            started: false,
            remaining: range.cell_count(),
        })
    }

    /// Access the cell behind a handle yielded by this iterator
    pub fn cell(&mut self, handle: CellHandle) -> Result<Cell<'_>> {
        self.sheet.cell_from_handle(handle)
    }

    /// Value behind a handle
    pub fn value(&self, handle: CellHandle) -> Result<CellValue> {
        self.sheet.handle_value(handle)
    }

    /// The worksheet being walked
    pub fn sheet(&self) -> &Worksheet {
        self.sheet
    }
}

impl Iterator for CellIter<'_> {
    type Item = Result<CellHandle>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.is_end() {
            return None;
        }
        if self.started {
            if let Err(err) = self.cursor.advance(self.sheet) {
                self.cursor.current = None;
                self.remaining = 0;
                return Some(Err(err));
            }
        }
        self.started = true;

        let handle = self.cursor.current()?;
        self.remaining = self.remaining.saturating_sub(1);
        Some(Ok(handle))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (0, Some(remaining))
    }
}

impl FusedIterator for CellIter<'_> {}

/// Read-only walk over the values of a range
///
/// Yields `(reference, value)` for every position in row-major order of the
/// physical layout. Rows and cells are scanned forward once, so a full walk
/// costs one pass over the nodes it covers.
#[derive(Debug)]
pub struct RangeValues<'a> {
    sheet: &'a Worksheet,
    references: References,
    /// First row node not yet passed
    next_row: Option<NodeId>,
    /// Row number the cell scan belongs to
    row_number: u32,
    /// First cell node of the current row not yet passed
    next_cell: Option<NodeId>,
    failed: bool,
}

impl<'a> RangeValues<'a> {
    pub(crate) fn new(sheet: &'a Worksheet, range: &CellRange) -> Self {
        Self {
            sheet,
            references: range.references(),
            next_row: sheet.xml().first_child(sheet.sheet_data()),
            row_number: 0,
            next_cell: None,
            failed: false,
        }
    }

    fn enter_row(&mut self, number: u32) -> Result<()> {
        let xml = self.sheet.xml();
        self.row_number = number;
        self.next_cell = None;

        while let Some(row) = self.next_row {
            let current = self.sheet.row_number_of(row)?;
            if current > number {
                break;
            }
            self.next_row = xml.next_sibling(row);
            if current == number {
                self.next_cell = xml.first_child(row);
                break;
            }
        }
        Ok(())
    }

    fn value_at(&mut self, reference: CellReference) -> Result<CellValue> {
        if reference.row() != self.row_number {
            self.enter_row(reference.row())?;
        }

        let xml = self.sheet.xml();
        while let Some(node) = self.next_cell {
            let address = xml
                .attribute(node, "r")
                .ok_or_else(|| Error::MalformedXml("cell without an r attribute".into()))?;
            let column = column_of_address(address)?;
            if column > reference.column() {
                break;
            }
            self.next_cell = xml.next_sibling(node);
            if column == reference.column() {
                return self.sheet.handle_value(CellHandle::new(node, reference));
            }
        }
        Ok(CellValue::Empty)
    }
}

impl Iterator for RangeValues<'_> {
    type Item = Result<(CellReference, CellValue)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let reference = self.references.next()?;
        match self.value_at(reference) {
            Ok(value) => Some(Ok((reference, value))),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            let (_, upper) = self.references.size_hint();
            (0, upper)
        }
    }
}

impl FusedIterator for RangeValues<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared_strings::SharedStrings;
    use pretty_assertions::assert_eq;

    fn empty_sheet() -> Worksheet {
        Worksheet::new("Sheet1", SharedStrings::new())
    }

    fn row_layout(sheet: &Worksheet) -> Vec<Vec<String>> {
        let xml = sheet.xml();
        xml.children(sheet.sheet_data())
            .map(|row| {
                xml.children(row)
                    .map(|c| xml.attribute(c, "r").unwrap().to_string())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_walk_fills_empty_region() {
        let mut sheet = empty_sheet();
        let range = CellRange::parse("A1:C3").unwrap();
        let visited: Vec<String> = sheet
            .iter_range(&range)
            .unwrap()
            .map(|h| h.unwrap().reference().to_address())
            .collect();

        assert_eq!(visited, ["A1", "B1", "C1", "A2", "B2", "C2", "A3", "B3", "C3"]);
        assert_eq!(
            row_layout(&sheet),
            [["A1", "B1", "C1"], ["A2", "B2", "C2"], ["A3", "B3", "C3"]]
        );
    }

    #[test]
    fn test_walk_reuses_and_interleaves_existing_nodes() {
        let mut sheet = Worksheet::from_xml(
            "Sheet1",
            br#"<worksheet><sheetData><row r="2"><c r="C2"><v>7</v></c><c r="E2"/></row><row r="4"><c r="A4"/></row></sheetData></worksheet>"#,
            SharedStrings::new(),
        )
        .unwrap();
        let existing = sheet.find_cell(CellReference::parse("C2").unwrap()).unwrap().unwrap();

        let range = CellRange::parse("B1:C3").unwrap();
        let handles: Vec<CellHandle> = sheet
            .iter_range(&range)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(handles.len(), 6);
        assert_eq!(handles[3], existing);
        assert_eq!(sheet.handle_value(handles[3]).unwrap(), CellValue::Integer(7));
        assert_eq!(
            row_layout(&sheet),
            vec![
                vec!["B1", "C1"],
                vec!["B2", "C2", "E2"],
                vec!["B3", "C3"],
                vec!["A4"],
            ]
        );
    }

    #[test]
    fn test_write_through_iterator() {
        let mut sheet = empty_sheet();
        let range = CellRange::parse("A1:B2").unwrap();
        let mut iter = sheet.iter_range(&range).unwrap();
        let mut n = 0;
        while let Some(handle) = iter.next() {
            n += 1;
            iter.cell(handle.unwrap()).unwrap().set_value(n);
        }
        assert_eq!(sheet.get_value("B2").unwrap(), CellValue::Integer(4));
        assert!(sheet.is_modified());
    }

    #[test]
    fn test_cursor_equality_and_distance() {
        let mut sheet = empty_sheet();
        let range = CellRange::parse("A1:B2").unwrap();
        let begin = CellCursor::begin(&mut sheet, &range).unwrap();
        let end = CellCursor::end(&range);

        assert_eq!(end, CellCursor::end(&CellRange::parse("C3").unwrap()));
        assert_ne!(begin, end);
        assert_eq!(begin.distance(&mut sheet, &end).unwrap(), 4);
        assert_eq!(begin.distance(&mut sheet, &begin).unwrap(), 0);
        assert!(end.distance(&mut sheet, &begin).is_err());

        let mut cursor = begin;
        for _ in 0..4 {
            cursor.advance(&mut sheet).unwrap();
        }
        assert!(cursor.is_end());
        assert!(matches!(cursor.advance(&mut sheet), Err(Error::Internal(_))));
    }

    #[test]
    fn test_values_scan_creates_nothing() {
        let mut sheet = empty_sheet();
        sheet.set_cell_value("B2", "x").unwrap();
        sheet.set_cell_value("A3", 1.5).unwrap();
        let nodes = sheet.xml().capacity_used();

        let range = CellRange::parse("A2:B3").unwrap();
        let values: Vec<(String, CellValue)> = sheet
            .values(&range)
            .map(|item| {
                let (reference, value) = item.unwrap();
                (reference.to_address(), value)
            })
            .collect();

        assert_eq!(
            values,
            [
                ("A2".to_string(), CellValue::Empty),
                ("B2".to_string(), CellValue::from("x")),
                ("A3".to_string(), CellValue::Float(1.5)),
                ("B3".to_string(), CellValue::Empty),
            ]
        );
        assert_eq!(sheet.xml().capacity_used(), nodes);
    }
}
