//! Range type for cell range operations

use crate::cell::{Cell, CellRange, CellValue};
use crate::error::Result;
use crate::iter::{CellCursor, CellIter, RangeValues};
use crate::worksheet::Worksheet;

/// A rectangle of cells in a worksheet
///
/// Positions passed to [`cell`](Self::cell) are 1-based and relative to the
/// range. When the range is transposed, rows and columns swap roles.
#[derive(Debug)]
pub struct Range<'a> {
    sheet: &'a mut Worksheet,
    range: CellRange,
}

impl<'a> Range<'a> {
    pub(crate) fn new(sheet: &'a mut Worksheet, range: CellRange) -> Self {
        Self { sheet, range }
    }

    /// Get the cell range
    pub fn range(&self) -> CellRange {
        self.range
    }

    /// Number of rows (after transposition)
    pub fn num_rows(&self) -> u32 {
        self.range.num_rows()
    }

    /// Number of columns (after transposition)
    pub fn num_columns(&self) -> u32 {
        self.range.num_columns()
    }

    /// Set or clear the transpose flag
    pub fn set_transposed(&mut self, transposed: bool) {
        self.range.set_transposed(transposed);
    }

    /// Cell at a position relative to the range, creating its node if needed
    pub fn cell(&mut self, row: u32, column: u32) -> Result<Cell<'_>> {
        let reference = self.range.resolve(row, column)?;
        self.sheet.cell_by_ref(reference)
    }

    /// Walk every cell, creating missing nodes
    pub fn iter(&mut self) -> Result<CellIter<'_>> {
        CellIter::new(self.sheet, &self.range)
    }

    /// Cursor on the first cell
    pub fn begin(&mut self) -> Result<CellCursor> {
        CellCursor::begin(self.sheet, &self.range)
    }

    /// Past-the-end cursor
    pub fn end(&self) -> CellCursor {
        CellCursor::end(&self.range)
    }

    /// Step a cursor of this range
    pub fn advance(&mut self, cursor: &mut CellCursor) -> Result<()> {
        cursor.advance(self.sheet)
    }

    /// Steps from `from` to `to`; see [`CellCursor::distance`]
    pub fn distance(&mut self, from: &CellCursor, to: &CellCursor) -> Result<u64> {
        from.distance(self.sheet, to)
    }

    /// Read the values without creating nodes
    pub fn values(&self) -> RangeValues<'_> {
        RangeValues::new(self.sheet, &self.range)
    }

    /// Copy the values of `source` (same sheet) into this range
    pub fn assign(&mut self, source: &CellRange) -> Result<()> {
        self.sheet.assign_range(&self.range, source)
    }

    /// Copy the values of `source` in another sheet into this range
    pub fn assign_from(&mut self, source_sheet: &Worksheet, source: &CellRange) -> Result<()> {
        self.sheet.assign_range_from(&self.range, source_sheet, source)
    }

    /// Set every cell to the same value
    pub fn fill<V: Into<CellValue>>(&mut self, value: V) -> Result<()> {
        let value = value.into();
        let mut iter = CellIter::new(self.sheet, &self.range)?;
        while let Some(handle) = iter.next() {
            iter.cell(handle?)?.set_value(value.clone());
        }
        Ok(())
    }

    /// Clear the values of the cells that exist; missing cells stay missing
    pub fn clear(&mut self) -> Result<()> {
        for reference in self.range.references() {
            if let Some(handle) = self.sheet.find_cell(reference)? {
                self.sheet.cell_from_handle(handle)?.clear();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellReference;
    use crate::error::Error;
    use crate::shared_strings::SharedStrings;
    use pretty_assertions::assert_eq;

    fn numbered_source(sheet: &mut Worksheet) -> CellRange {
        // A1:C2 = 1 2 3 / 4 5 6
        let source = CellRange::parse("A1:C2").unwrap();
        let mut n = 0;
        let mut range = sheet.range_of(source);
        let mut iter = range.iter().unwrap();
        while let Some(handle) = iter.next() {
            n += 1;
            iter.cell(handle.unwrap()).unwrap().set_value(n);
        }
        source
    }

    #[test]
    fn test_cell_is_relative_and_bounded() {
        let mut sheet = Worksheet::new("Sheet1", SharedStrings::new());
        let mut range = sheet.range("B2:D3").unwrap();
        assert_eq!((range.num_rows(), range.num_columns()), (2, 3));

        range.cell(2, 3).unwrap().set_value("corner");
        assert_eq!(
            range.cell(2, 3).unwrap().reference(),
            CellReference::parse("D3").unwrap()
        );
        assert!(matches!(range.cell(3, 1), Err(Error::OutsideRange { .. })));
        assert!(matches!(range.cell(0, 1), Err(Error::OutsideRange { .. })));

        range.set_transposed(true);
        assert_eq!((range.num_rows(), range.num_columns()), (3, 2));
        assert_eq!(range.cell(3, 2).unwrap().value().unwrap(), CellValue::from("corner"));
    }

    #[test]
    fn test_assign_requires_same_shape() {
        let mut sheet = Worksheet::new("Sheet1", SharedStrings::new());
        let source = numbered_source(&mut sheet);

        let mut destination = sheet.range("E1:F3").unwrap();
        let err = destination.assign(&source).unwrap_err();
        assert!(matches!(
            err,
            Error::ShapeMismatch {
                expected: (3, 2),
                actual: (2, 3)
            }
        ));
    }

    #[test]
    fn test_assign_into_transposed_destination() {
        let mut sheet = Worksheet::new("Sheet1", SharedStrings::new());
        let source = numbered_source(&mut sheet);

        let mut destination = sheet.range("E1:F3").unwrap();
        destination.set_transposed(true);
        destination.assign(&source).unwrap();

        // physical (c, r) of the destination holds source (r, c)
        let physical = CellRange::parse("E1:F3").unwrap();
        for row in 1..=2 {
            for column in 1..=3 {
                let expected = sheet.value_of(source.resolve(row, column).unwrap()).unwrap();
                let actual = sheet.value_of(physical.resolve(column, row).unwrap()).unwrap();
                assert_eq!(actual, expected, "source ({row}, {column})");
            }
        }
    }

    #[test]
    fn test_assign_clears_where_source_is_missing() {
        let mut sheet = Worksheet::new("Sheet1", SharedStrings::new());
        sheet.set_cell_value("A1", 1).unwrap();
        sheet.set_cell_value("D1", "old").unwrap();
        sheet.set_cell_value("E1", "old").unwrap();

        sheet
            .range("D1:E1")
            .unwrap()
            .assign(&CellRange::parse("A1:B1").unwrap())
            .unwrap();
        assert_eq!(sheet.get_value("D1").unwrap(), CellValue::Integer(1));
        assert_eq!(sheet.get_value("E1").unwrap(), CellValue::Empty);
    }

    #[test]
    fn test_fill_and_clear() {
        let mut sheet = Worksheet::new("Sheet1", SharedStrings::new());
        sheet.range("A1:B2").unwrap().fill(true).unwrap();
        assert_eq!(sheet.get_value("B2").unwrap(), CellValue::Boolean(true));

        let mut range = sheet.range("A1:C3").unwrap();
        range.clear().unwrap();
        let values: Vec<CellValue> = range.values().map(|v| v.unwrap().1).collect();
        assert_eq!(values, vec![CellValue::Empty; 9]);
        // clearing does not materialize C1..C3
        assert_eq!(sheet.find_cell(CellReference::parse("C3").unwrap()).unwrap(), None);
    }

    #[test]
    fn test_cursor_walk() {
        let mut sheet = Worksheet::new("Sheet1", SharedStrings::new());
        let mut range = sheet.range("A1:A3").unwrap();
        let mut cursor = range.begin().unwrap();
        let end = range.end();
        assert_eq!(range.distance(&cursor, &end).unwrap(), 3);

        let mut rows = Vec::new();
        while cursor != end {
            rows.push(cursor.current().unwrap().reference().row());
            range.advance(&mut cursor).unwrap();
        }
        assert_eq!(rows, [1, 2, 3]);
    }
}
