//! XLSX error types

use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors that can occur while reading, editing or writing an XLSX document
#[derive(Debug, Error)]
pub enum XlsxError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Invalid file format
    #[error("Invalid XLSX format: {0}")]
    InvalidFormat(String),

    /// Missing required part
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// No worksheet with that name or index
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// A sheet with that name already exists
    #[error("Duplicate sheet name: {0}")]
    DuplicateSheetName(String),

    /// Name Excel would not accept
    #[error("Invalid sheet name '{name}': {reason}")]
    InvalidSheetName { name: String, reason: &'static str },

    /// The workbook must keep at least one sheet
    #[error("Cannot delete the only sheet of a workbook")]
    LastSheet,

    /// The workbook must keep at least one visible sheet
    #[error("Cannot hide or delete the last visible sheet '{0}'")]
    LastVisibleSheet(String),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] xlgrid_core::Error),
}
