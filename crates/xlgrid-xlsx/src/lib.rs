//! # xlgrid-xlsx
//!
//! XLSX (Office Open XML) package reading, editing and writing for xlgrid.
//!
//! A [`Document`] keeps the whole ZIP package in memory. Worksheets and the
//! few parts needed to manage them are parsed; everything else (styles,
//! themes, drawings, calcChain) is written back byte for byte.
//!
//! ```no_run
//! use xlgrid_xlsx::Document;
//!
//! let mut doc = Document::open("report.xlsx")?;
//! doc.worksheet_mut("Sheet1")?.set_cell_value("A1", "Total")?;
//! doc.save("report.xlsx")?;
//! # Ok::<(), xlgrid_xlsx::XlsxError>(())
//! ```

pub mod content_types;
pub mod document;
pub mod error;
pub mod package;
pub mod properties;
pub mod reader;
pub mod relationships;
pub mod shared_strings;
pub mod workbook;
pub mod writer;

mod template;

pub use content_types::ContentTypes;
pub use document::{validate_sheet_name, Document};
pub use error::{XlsxError, XlsxResult};
pub use package::Package;
pub use properties::{DocumentProperties, Property};
pub use reader::XlsxReader;
pub use relationships::{Relationship, Relationships};
pub use workbook::{SheetEntry, SheetVisibility};
pub use writer::XlsxWriter;
