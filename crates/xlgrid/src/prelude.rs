//! Prelude module - common imports for xlgrid users
//!
//! ```rust
//! use xlgrid::prelude::*;
//! ```

pub use crate::{
    // Cell types
    Cell,
    CellRange,
    CellReference,
    CellValue,
    // Views
    Column,
    // Main types
    Document,
    // Extension traits
    DocumentExt,
    // Error types
    Error,
    FileError,
    Property,
    Range,
    Result,
    Row,
    SheetVisibility,
    ValueType,
    Worksheet,
    XlsxError,
    // I/O types
    XlsxReader,
    XlsxWriter,
};

#[cfg(feature = "csv")]
pub use crate::{CsvWriteOptions, CsvWriter};
