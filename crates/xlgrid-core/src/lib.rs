//! # xlgrid-core
//!
//! Cell addressing, cell values and sparse grid traversal for worksheets
//! stored as SpreadsheetML.
//!
//! This crate provides the types the rest of xlgrid is built on:
//! - [`CellReference`] and [`CellRange`] - A1-style addressing
//! - [`CellValue`] - Typed cell values (numbers, strings, booleans, errors)
//! - [`SharedStrings`] - The workbook-wide string table
//! - [`Worksheet`] - A sheet backed by its XML tree, with [`Cell`], [`Row`],
//!   [`Column`] and [`Range`] views
//! - [`XmlDocument`] - The arena XML tree worksheets live in
//!
//! Cells without a value usually have no node in the XML at all. Looking a
//! cell up through `&mut Worksheet` creates its row and cell nodes in sorted
//! position; read-only lookups through `&Worksheet` never do.
//!
//! ## Example
//!
//! ```rust
//! use xlgrid_core::{CellRange, CellValue, SharedStrings, Worksheet};
//!
//! let mut sheet = Worksheet::new("Sheet1", SharedStrings::new());
//!
//! // Using string addresses
//! sheet.set_cell_value("A1", "Hello").unwrap();
//! sheet.set_cell_value("B1", 42).unwrap();
//!
//! // Or using 1-based row/column numbers
//! sheet.set_cell_value_at(2, 1, 3.5).unwrap();
//!
//! assert_eq!(sheet.get_value("B1").unwrap(), CellValue::Integer(42));
//!
//! // Walking a range creates the missing cells
//! let range = CellRange::parse("A1:C2").unwrap();
//! assert_eq!(sheet.iter_range(&range).unwrap().count(), 6);
//! ```

pub mod cell;
pub mod column;
pub mod datetime;
pub mod error;
pub mod iter;
pub mod range;
pub mod row;
pub mod shared_strings;
pub mod worksheet;
pub mod xml;

// Re-exports for convenience
pub use cell::{
    Cell, CellHandle, CellRange, CellReference, CellValue, FromCellValue, ReferenceCache,
    ValueType,
};
pub use column::Column;
pub use error::{Error, Result};
pub use iter::{CellCursor, CellIter, RangeValues};
pub use range::Range;
pub use row::Row;
pub use shared_strings::{SharedStringTable, SharedStrings};
pub use worksheet::Worksheet;
pub use xml::{NodeId, XmlDocument};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
