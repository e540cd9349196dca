//! CSV options

use xlgrid_core::CellRange;

/// Options for writing CSV files
#[derive(Debug, Clone)]
pub struct CsvWriteOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// Quote character (default: double quote)
    pub quote: u8,
    /// Line terminator
    pub line_terminator: LineTerminator,
    /// Cells to export; `None` exports A1 through the last used cell
    pub range: Option<CellRange>,
}

impl Default for CsvWriteOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            line_terminator: LineTerminator::CRLF,
            range: None,
        }
    }
}

/// Line terminator type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTerminator {
    /// Unix-style (LF)
    LF,
    /// Windows-style (CRLF)
    CRLF,
    /// Mac classic (CR)
    CR,
}
