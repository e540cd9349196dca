//! Cell references, ranges and the address codec
//!
//! A [`CellReference`] is a 1-based (row, column) pair that is always within
//! the sheet limits. Every constructor rejects out-of-range input with an
//! address error; nothing is clamped.

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use ahash::AHashMap;
use std::fmt;
use std::str::FromStr;

/// A cell reference (e.g., "B7")
///
/// Ordering is by row first, then by column, which is the row-major order
/// used when walking a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct CellReference {
    // field order matters for the derived Ord
    row: u32,
    column: u16,
}

impl CellReference {
    /// Create a reference from a 1-based row and column
    ///
    /// # Examples
    /// ```
    /// use xlgrid_core::CellReference;
    ///
    /// let r = CellReference::new(1, 27).unwrap();
    /// assert_eq!(r.to_address(), "AA1");
    /// assert!(CellReference::new(0, 1).is_err());
    /// ```
    pub fn new(row: u32, column: u16) -> Result<Self> {
        if row == 0 || row > MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS));
        }
        if column == 0 || column > MAX_COLS {
            return Err(Error::ColumnOutOfBounds(column as u32, MAX_COLS));
        }
        Ok(Self { row, column })
    }

    /// Parse an A1-style address ("A1", "XFD1048576")
    ///
    /// The address must be 1 to 3 letters followed by 1 to 7 digits and
    /// nothing else. Lowercase letters are accepted.
    pub fn parse(address: &str) -> Result<Self> {
        let (letters, digits) = split_address(address)?;
        let column = Self::letters_to_column(letters)?;
        let row = parse_row(address, digits)?;
        Self::new(row, column)
    }

    /// 1-based row number
    #[inline]
    pub fn row(&self) -> u32 {
        self.row
    }

    /// 1-based column number
    #[inline]
    pub fn column(&self) -> u16 {
        self.column
    }

    /// Column part of the address ("AA" for column 27)
    pub fn column_letters(&self) -> String {
        Self::column_to_letters(self.column)
    }

    /// Format as an A1-style address
    pub fn to_address(&self) -> String {
        let mut address = Self::column_to_letters(self.column);
        address.push_str(&self.row.to_string());
        address
    }

    /// Convert a 1-based column number to letters (1 = A, 26 = Z, 27 = AA)
    ///
    /// Returns an empty string for column 0.
    pub fn column_to_letters(column: u16) -> String {
        let mut letters = [0u8; 3];
        let mut len = 0;
        let mut n = column as u32;

        // no zero digit: shift down by one before each division
        while n > 0 && len < letters.len() {
            n -= 1;
            letters[len] = (n % 26) as u8 + b'A';
            len += 1;
            n /= 26;
        }

        letters[..len].iter().rev().map(|&b| b as char).collect()
    }

    /// Convert column letters to a 1-based column number (A = 1, AA = 27)
    pub fn letters_to_column(letters: &str) -> Result<u16> {
        if letters.is_empty() || letters.len() > 3 {
            return Err(Error::InvalidAddress(format!(
                "expected 1 to 3 column letters, got '{}'",
                letters
            )));
        }

        let mut column: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::InvalidAddress(format!(
                    "invalid column letter '{}'",
                    c
                )));
            }
            column = column * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        }

        if column > MAX_COLS as u32 {
            return Err(Error::ColumnOutOfBounds(column, MAX_COLS));
        }

        Ok(column as u16)
    }

    /// Reference shifted by the given number of rows and columns
    pub fn offset(&self, rows: u32, columns: u16) -> Result<Self> {
        let row = self
            .row
            .checked_add(rows)
            .ok_or(Error::RowOutOfBounds(u32::MAX, MAX_ROWS))?;
        let column = self
            .column
            .checked_add(columns)
            .ok_or(Error::ColumnOutOfBounds(u32::from(u16::MAX), MAX_COLS))?;
        Self::new(row, column)
    }
}

impl fmt::Display for CellReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::column_to_letters(self.column), self.row)
    }
}

impl FromStr for CellReference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for CellReference {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CellReference {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<CellReference> for String {
    fn from(reference: CellReference) -> Self {
        reference.to_address()
    }
}

/// Split an address into its letter run and digit run
fn split_address(address: &str) -> Result<(&str, &str)> {
    let bytes = address.as_bytes();
    let letters = bytes.iter().take_while(|b| b.is_ascii_alphabetic()).count();
    let digits = bytes[letters..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();

    if !(1..=3).contains(&letters) || !(1..=7).contains(&digits) || letters + digits != bytes.len()
    {
        return Err(Error::InvalidAddress(format!("'{}'", address)));
    }

    Ok(address.split_at(letters))
}

fn parse_row(address: &str, digits: &str) -> Result<u32> {
    digits
        .parse()
        .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{}'", address)))
}

/// Memoized address conversions
///
/// Column numbers, column letters and row strings are converted on every
/// cell access while walking a sheet. The cache is append-only and is owned
/// by whoever needs it (each worksheet carries its own), so there is no
/// process-wide state.
#[derive(Debug, Default, Clone)]
pub struct ReferenceCache {
    letters: AHashMap<u16, Box<str>>,
    columns: AHashMap<Box<str>, u16>,
    rows: AHashMap<u32, Box<str>>,
}

impl ReferenceCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Letters for a 1-based column
    pub fn column_letters(&mut self, column: u16) -> &str {
        self.letters
            .entry(column)
            .or_insert_with(|| CellReference::column_to_letters(column).into_boxed_str())
    }

    /// 1-based column for a letter run
    pub fn column_number(&mut self, letters: &str) -> Result<u16> {
        if let Some(&column) = self.columns.get(letters) {
            return Ok(column);
        }
        let column = CellReference::letters_to_column(letters)?;
        self.columns.insert(letters.into(), column);
        Ok(column)
    }

    /// Decimal text of a row number
    pub fn row_text(&mut self, row: u32) -> &str {
        self.rows
            .entry(row)
            .or_insert_with(|| row.to_string().into_boxed_str())
    }

    /// Cached equivalent of [`CellReference::to_address`]
    pub fn address(&mut self, reference: CellReference) -> String {
        let mut address = self.column_letters(reference.column()).to_string();
        address.push_str(self.row_text(reference.row()));
        address
    }

    /// Cached equivalent of [`CellReference::parse`]
    pub fn parse(&mut self, address: &str) -> Result<CellReference> {
        let (letters, digits) = split_address(address)?;
        let column = self.column_number(letters)?;
        let row = parse_row(address, digits)?;
        CellReference::new(row, column)
    }

    /// Column of an address, without validating the row part
    ///
    /// Used when scanning cell nodes whose `r` attribute only needs ordering.
    pub fn column_of(&mut self, address: &str) -> Result<u16> {
        let letters = address
            .find(|c: char| !c.is_ascii_alphabetic())
            .map_or(address, |end| &address[..end]);
        self.column_number(letters)
    }

    /// Number of memoized entries
    pub fn len(&self) -> usize {
        self.letters.len() + self.columns.len() + self.rows.len()
    }

    /// Whether nothing has been memoized yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A rectangular range of cells (e.g., "A1:C3")
///
/// The range can be flagged as transposed, which swaps the reported extents
/// and the meaning of relative (row, column) positions. The physical corners
/// never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RangeParts")
)]
pub struct CellRange {
    top_left: CellReference,
    bottom_right: CellReference,
    transposed: bool,
}

/// Deserialized fields of a [`CellRange`], validated through [`CellRange::new`]
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RangeParts {
    top_left: CellReference,
    bottom_right: CellReference,
    #[serde(default)]
    transposed: bool,
}

#[cfg(feature = "serde")]
impl TryFrom<RangeParts> for CellRange {
    type Error = Error;

    fn try_from(parts: RangeParts) -> Result<Self> {
        let range = Self::new(parts.top_left, parts.bottom_right)?;
        Ok(if parts.transposed {
            range.transposed()
        } else {
            range
        })
    }
}

impl CellRange {
    /// Create a range from its corners
    ///
    /// The bottom-right corner must not be above or left of the top-left one.
    pub fn new(top_left: CellReference, bottom_right: CellReference) -> Result<Self> {
        if bottom_right.row < top_left.row || bottom_right.column < top_left.column {
            return Err(Error::InvalidRange(format!(
                "{} is not below and right of {}",
                bottom_right, top_left
            )));
        }
        Ok(Self {
            top_left,
            bottom_right,
            transposed: false,
        })
    }

    /// Create a single-cell range
    pub fn single(reference: CellReference) -> Self {
        Self {
            top_left: reference,
            bottom_right: reference,
            transposed: false,
        }
    }

    /// Parse "A1:C3" or a single address
    pub fn parse(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((start, end)) => Self::new(CellReference::parse(start)?, CellReference::parse(end)?),
            None => Ok(Self::single(CellReference::parse(s)?)),
        }
    }

    /// Top-left corner
    pub fn top_left(&self) -> CellReference {
        self.top_left
    }

    /// Bottom-right corner
    pub fn bottom_right(&self) -> CellReference {
        self.bottom_right
    }

    /// Same range with the transpose flag set
    pub fn transposed(mut self) -> Self {
        self.transposed = true;
        self
    }

    /// Set or clear the transpose flag
    pub fn set_transposed(&mut self, transposed: bool) {
        self.transposed = transposed;
    }

    /// Whether the range is transposed
    pub fn is_transposed(&self) -> bool {
        self.transposed
    }

    /// Number of rows, after transposition
    pub fn num_rows(&self) -> u32 {
        if self.transposed {
            self.physical_columns()
        } else {
            self.physical_rows()
        }
    }

    /// Number of columns, after transposition
    pub fn num_columns(&self) -> u32 {
        if self.transposed {
            self.physical_rows()
        } else {
            self.physical_columns()
        }
    }

    pub(crate) fn physical_rows(&self) -> u32 {
        self.bottom_right.row - self.top_left.row + 1
    }

    pub(crate) fn physical_columns(&self) -> u32 {
        (self.bottom_right.column - self.top_left.column + 1) as u32
    }

    /// Total number of cells
    pub fn cell_count(&self) -> u64 {
        self.physical_rows() as u64 * self.physical_columns() as u64
    }

    /// Whether a reference lies inside the range
    pub fn contains(&self, reference: &CellReference) -> bool {
        reference.row >= self.top_left.row
            && reference.row <= self.bottom_right.row
            && reference.column >= self.top_left.column
            && reference.column <= self.bottom_right.column
    }

    /// Whether the two ranges share at least one cell
    pub fn overlaps(&self, other: &CellRange) -> bool {
        self.top_left.row <= other.bottom_right.row
            && other.top_left.row <= self.bottom_right.row
            && self.top_left.column <= other.bottom_right.column
            && other.top_left.column <= self.bottom_right.column
    }

    /// Absolute reference of a 1-based position relative to the range
    ///
    /// The position is checked against [`num_rows`](Self::num_rows) and
    /// [`num_columns`](Self::num_columns) and swapped when transposed.
    pub fn resolve(&self, row: u32, column: u32) -> Result<CellReference> {
        if row == 0 || column == 0 || row > self.num_rows() || column > self.num_columns() {
            return Err(Error::OutsideRange {
                row,
                column,
                rows: self.num_rows(),
                columns: self.num_columns(),
            });
        }

        let (row, column) = if self.transposed {
            (column, row)
        } else {
            (row, column)
        };

        CellReference::new(
            self.top_left.row + row - 1,
            self.top_left.column + (column - 1) as u16,
        )
    }

    /// Iterate over every reference in row-major order (physical layout)
    pub fn references(&self) -> References {
        References {
            range: *self,
            next: Some(self.top_left),
            remaining: self.cell_count(),
        }
    }

    /// Format as "A1:C3" (or "A1" for a single cell)
    pub fn to_a1_string(&self) -> String {
        if self.top_left == self.bottom_right {
            self.top_left.to_address()
        } else {
            format!("{}:{}", self.top_left, self.bottom_right)
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Iterator over the references of a [`CellRange`]
#[derive(Debug, Clone)]
pub struct References {
    range: CellRange,
    next: Option<CellReference>,
    remaining: u64,
}

impl Iterator for References {
    type Item = CellReference;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let br = self.range.bottom_right;

        self.next = if current.column < br.column {
            Some(CellReference {
                row: current.row,
                column: current.column + 1,
            })
        } else if current.row < br.row {
            Some(CellReference {
                row: current.row + 1,
                column: self.range.top_left.column,
            })
        } else {
            None
        };
        self.remaining -= 1;

        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for References {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn r(row: u32, column: u16) -> CellReference {
        CellReference::new(row, column).unwrap()
    }

    #[test]
    fn test_column_to_letters() {
        assert_eq!(CellReference::column_to_letters(1), "A");
        assert_eq!(CellReference::column_to_letters(26), "Z");
        assert_eq!(CellReference::column_to_letters(27), "AA");
        assert_eq!(CellReference::column_to_letters(52), "AZ");
        assert_eq!(CellReference::column_to_letters(53), "BA");
        assert_eq!(CellReference::column_to_letters(702), "ZZ");
        assert_eq!(CellReference::column_to_letters(703), "AAA");
        assert_eq!(CellReference::column_to_letters(16384), "XFD");
    }

    #[test]
    fn test_letters_to_column() {
        assert_eq!(CellReference::letters_to_column("A").unwrap(), 1);
        assert_eq!(CellReference::letters_to_column("Z").unwrap(), 26);
        assert_eq!(CellReference::letters_to_column("AZ").unwrap(), 52);
        assert_eq!(CellReference::letters_to_column("BA").unwrap(), 53);
        assert_eq!(CellReference::letters_to_column("AAA").unwrap(), 703);
        assert_eq!(CellReference::letters_to_column("XFD").unwrap(), 16384);
        assert_eq!(CellReference::letters_to_column("xfd").unwrap(), 16384);
        assert!(CellReference::letters_to_column("XFE").is_err());
        assert!(CellReference::letters_to_column("AAAA").is_err());
    }

    #[test]
    fn test_known_addresses() {
        assert_eq!(CellReference::parse("A1").unwrap(), r(1, 1));
        assert_eq!(CellReference::parse("AA1").unwrap(), r(1, 27));
        assert_eq!(CellReference::parse("XFD1").unwrap(), r(1, 16384));
        assert_eq!(CellReference::parse("A1048576").unwrap(), r(1_048_576, 1));
        assert_eq!(r(1, 27).to_address(), "AA1");
        assert_eq!(r(1_048_576, 16384).to_string(), "XFD1048576");
    }

    #[test]
    fn test_invalid_addresses_are_rejected() {
        for bad in ["", "A", "1", "A0", "XFE1", "A1048577", "AAAA1", "A12345678", "1A", "A1B", "$A$1", " A1"] {
            let err = CellReference::parse(bad).unwrap_err();
            assert!(err.is_address_error(), "{bad}: {err}");
        }
        assert!(CellReference::new(0, 1).is_err());
        assert!(CellReference::new(1, 0).is_err());
        assert!(CellReference::new(1_048_577, 1).is_err());
        assert!(CellReference::new(1, 16385).is_err());
    }

    #[test]
    fn test_ordering_is_row_major() {
        assert!(r(1, 5) < r(2, 1));
        assert!(r(2, 1) < r(2, 2));
        assert_eq!(r(3, 3).max(r(3, 2)), r(3, 3));
    }

    #[test]
    fn test_offset() {
        assert_eq!(r(1, 1).offset(2, 3).unwrap(), r(3, 4));
        assert!(r(1_048_576, 1).offset(1, 0).is_err());
        assert!(r(1, 16384).offset(0, 1).is_err());
    }

    #[test]
    fn test_cache_matches_stateless_codec() {
        let mut cache = ReferenceCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.column_letters(703), "AAA");
        assert_eq!(cache.column_number("AAA").unwrap(), 703);
        assert_eq!(cache.row_text(42), "42");
        assert_eq!(cache.address(r(42, 28)), "AB42");
        assert_eq!(cache.parse("AB42").unwrap(), r(42, 28));
        assert_eq!(cache.column_of("AB42").unwrap(), 28);
        assert!(cache.parse("XFE1").is_err());

        let before = cache.len();
        cache.address(r(42, 28));
        assert_eq!(cache.len(), before);
    }

    #[test]
    fn test_range_parse_and_extents() {
        let range = CellRange::parse("B2:D3").unwrap();
        assert_eq!(range.top_left(), r(2, 2));
        assert_eq!(range.bottom_right(), r(3, 4));
        assert_eq!((range.num_rows(), range.num_columns()), (2, 3));

        let transposed = range.transposed();
        assert_eq!((transposed.num_rows(), transposed.num_columns()), (3, 2));
        assert_eq!(transposed.to_string(), "B2:D3");

        assert_eq!(CellRange::parse("C3").unwrap().cell_count(), 1);
        assert!(CellRange::parse("C3:A1").is_err());
    }

    #[test]
    fn test_range_resolve() {
        let range = CellRange::parse("B2:D3").unwrap();
        assert_eq!(range.resolve(1, 1).unwrap(), r(2, 2));
        assert_eq!(range.resolve(2, 3).unwrap(), r(3, 4));
        assert!(matches!(range.resolve(3, 1), Err(Error::OutsideRange { .. })));
        assert!(range.resolve(0, 1).is_err());

        let transposed = range.transposed();
        // (row 3, column 2) of the transposed view is physical (2, 3)
        assert_eq!(transposed.resolve(3, 2).unwrap(), r(3, 4));
        assert!(transposed.resolve(2, 3).is_err());
    }

    #[test]
    fn test_range_overlaps() {
        let range = CellRange::parse("B2:D4").unwrap();
        assert!(range.overlaps(&CellRange::parse("D4:E5").unwrap()));
        assert!(range.overlaps(&CellRange::parse("A1:F6").unwrap()));
        assert!(range.overlaps(&CellRange::parse("C3").unwrap()));
        assert!(!range.overlaps(&CellRange::parse("E2:F4").unwrap()));
        assert!(!range.overlaps(&CellRange::parse("A5:D5").unwrap()));
    }

    #[test]
    fn test_range_references_row_major() {
        let range = CellRange::parse("A1:B2").unwrap();
        let refs: Vec<String> = range.references().map(|r| r.to_address()).collect();
        assert_eq!(refs, ["A1", "B1", "A2", "B2"]);
        assert_eq!(range.references().len(), 4);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_range_deserialization_checks_corners() {
        let range: CellRange = serde_json::from_str(
            r#"{"top_left":"B2","bottom_right":"D3","transposed":true}"#,
        )
        .unwrap();
        assert_eq!(range, CellRange::parse("B2:D3").unwrap().transposed());

        let inverted = serde_json::from_str::<CellRange>(
            r#"{"top_left":"D3","bottom_right":"B2","transposed":false}"#,
        );
        assert!(inverted.is_err());

        let text = serde_json::to_string(&range).unwrap();
        assert_eq!(serde_json::from_str::<CellRange>(&text).unwrap(), range);
    }

    proptest! {
        #[test]
        fn prop_address_round_trip(row in 1u32..=MAX_ROWS, column in 1u16..=MAX_COLS) {
            let reference = CellReference::new(row, column).unwrap();
            let address = reference.to_address();
            prop_assert_eq!(CellReference::parse(&address).unwrap(), reference);

            let mut cache = ReferenceCache::new();
            prop_assert_eq!(cache.address(reference), address.clone());
            prop_assert_eq!(cache.parse(&address).unwrap(), reference);
        }
    }
}
