//! # xlgrid
//!
//! Read, edit and write XLSX worksheets directly through their XML.
//!
//! A worksheet stays the XML tree it was loaded from. Cells, rows, columns
//! and ranges are views onto that tree: reading never adds nodes, writing
//! creates exactly the row and cell nodes it needs, in sorted position, and
//! every part of the file this library does not edit is saved unchanged.
//!
//! ## Example
//!
//! ```rust
//! use xlgrid::prelude::*;
//!
//! let mut doc = Document::new().unwrap();
//! let sheet = doc.worksheet_mut("Sheet1").unwrap();
//!
//! sheet.set_cell_value("A1", "Item").unwrap();
//! sheet.set_cell_value("B1", 42).unwrap();
//! sheet.set_cell_formula("C1", "B1*2").unwrap();
//!
//! // Fill a block, creating the cells on the way
//! sheet.range("A2:C3").unwrap().fill(0).unwrap();
//! assert_eq!(sheet.last_cell().unwrap().to_address(), "C3");
//!
//! // doc.save("output.xlsx").unwrap();
//! ```

pub mod prelude;

use std::path::Path;

// Re-export core types
pub use xlgrid_core::datetime;
pub use xlgrid_core::{
    Cell, CellCursor, CellHandle, CellIter, CellRange, CellReference, CellValue, Column, Error,
    FromCellValue, Range, RangeValues, ReferenceCache, Result, Row, SharedStringTable,
    SharedStrings, ValueType, Worksheet, MAX_COLS, MAX_ROWS, MAX_SHEET_NAME_LEN,
};

// Re-export I/O types
#[cfg(feature = "csv")]
pub use xlgrid_csv::{CsvError, CsvWriteOptions, CsvWriter, LineTerminator};
pub use xlgrid_xlsx::{
    Document, DocumentProperties, Property, SheetVisibility, XlsxError, XlsxReader, XlsxResult,
    XlsxWriter,
};

/// Errors of the file-level helpers
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error(transparent)]
    Core(#[from] Error),

    #[error(transparent)]
    Xlsx(#[from] XlsxError),

    #[cfg(feature = "csv")]
    #[error(transparent)]
    Csv(#[from] CsvError),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

/// Extension trait for Document to save by file extension
pub trait DocumentExt {
    /// Save as `.xlsx`/`.xlsm`, or export the first worksheet as `.csv`
    fn save_as<P: AsRef<Path>>(&mut self, path: P) -> std::result::Result<(), FileError>;
}

impl DocumentExt for Document {
    fn save_as<P: AsRef<Path>>(&mut self, path: P) -> std::result::Result<(), FileError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("xlsx") | Some("xlsm") => Ok(self.save(path)?),
            #[cfg(feature = "csv")]
            Some("csv") => {
                let sheet = self.worksheet_at(0)?;
                Ok(CsvWriter::write_file(
                    sheet,
                    path,
                    &CsvWriteOptions::default(),
                )?)
            }
            _ => Err(FileError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Open an `.xlsx`/`.xlsm` file
pub fn open<P: AsRef<Path>>(path: P) -> std::result::Result<Document, FileError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("xlsx") | Some("xlsm") => Ok(Document::open(path)?),
        _ => Err(FileError::UnsupportedFormat(path.display().to_string())),
    }
}
