//! XLSX writer

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use crate::document::Document;
use crate::error::XlsxResult;
use crate::reader::escaped_char;

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a document to a file path
    pub fn write_file<P: AsRef<Path>>(document: &mut Document, path: P) -> XlsxResult<()> {
        let path = path.as_ref();
        log::debug!("saving {}", path.display());
        let file = File::create(path)?;
        Self::write(document, file)
    }

    /// Write a document to a writer
    ///
    /// Edited parts are serialized back into the package first; everything
    /// else is copied as it was read.
    pub fn write<W: Write + Seek>(document: &mut Document, writer: W) -> XlsxResult<()> {
        document.sync_package()?;
        document.package().write(writer)
    }
}

/// Escape text for a shared string item
///
/// Control characters other than tab, newline and carriage return become
/// `_xHHHH_`; an underscore that would otherwise start a valid escape is
/// written as `_x005F_`.
pub(crate) fn encode_excel_escapes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        match c {
            '\t' | '\n' | '\r' => result.push(c),
            c if c.is_control() && (c as u32) < 0x20 => {
                result.push_str(&format!("_x{:04X}_", c as u32));
            }
            '_' if escaped_char(&text[i..]).is_some() => result.push_str("_x005F_"),
            c => result.push(c),
        }
    }
    result
}
