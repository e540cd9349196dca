//! # xlgrid-csv
//!
//! CSV export for xlgrid worksheets.

mod error;
mod options;
mod writer;

pub use error::{CsvError, CsvResult};
pub use options::{CsvWriteOptions, LineTerminator};
pub use writer::CsvWriter;
