//! Error types for xlgrid-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in xlgrid-core
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed cell address
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Invalid cell range (bad notation or inverted corners)
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),

    /// Row number out of bounds (1-based)
    #[error("Row {0} out of bounds (valid: 1..={1})")]
    RowOutOfBounds(u32, u32),

    /// Column number out of bounds (1-based)
    #[error("Column {0} out of bounds (valid: 1..={1})")]
    ColumnOutOfBounds(u32, u16),

    /// Invalid value type for operation
    #[error("Invalid value type: expected {expected}, got {actual}")]
    InvalidValueType {
        expected: &'static str,
        actual: &'static str,
    },

    /// Range assignment between regions of different shape
    #[error(
        "Range shape mismatch: destination is {}x{}, source is {}x{}",
        .expected.0, .expected.1, .actual.0, .actual.1
    )]
    ShapeMismatch {
        /// (rows, columns) of the destination
        expected: (u32, u32),
        /// (rows, columns) of the source
        actual: (u32, u32),
    },

    /// Relative cell position outside of a range
    #[error("Position ({row}, {column}) is outside of a {rows}x{columns} range")]
    OutsideRange {
        row: u32,
        column: u32,
        rows: u32,
        columns: u32,
    },

    /// Date/time outside of what an Excel serial number can hold
    #[error("Invalid date/time: {0}")]
    InvalidDateTime(String),

    /// Merged region overlapping an existing one
    #[error("Merged cell conflict: {0}")]
    MergedCellConflict(String),

    /// Shared string index out of range
    #[error("Shared string index {0} out of range (count: {1})")]
    SharedStringIndex(u32, usize),

    /// XML reader/writer error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Structurally invalid XML
    #[error("Malformed XML: {0}")]
    MalformedXml(String),

    /// Invariant violation inside the library
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an internal error with a message
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }

    /// Whether this error came from an invalid cell address or reference
    pub fn is_address_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidAddress(_) | Error::RowOutOfBounds(..) | Error::ColumnOutOfBounds(..)
        )
    }
}
