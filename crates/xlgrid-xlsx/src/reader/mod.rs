//! XLSX reader

use std::borrow::Cow;
use std::io::{Read, Seek};
use std::path::Path;

use crate::document::Document;
use crate::error::XlsxResult;
use crate::package::Package;

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a document from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Document> {
        let path = path.as_ref();
        log::debug!("opening {}", path.display());
        Document::from_package(Package::open(path)?)
    }

    /// Read a document from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Document> {
        Document::from_package(Package::read(reader)?)
    }
}

/// Decode Excel's `_xHHHH_` escapes
///
/// Excel stores characters XML cannot carry (control characters, mostly) as
/// `_x` followed by four hex digits and `_`. A literal `_x0041_` in the text
/// is itself escaped as `_x005F_x0041_`. Sequences that do not decode to a
/// valid `char` are kept verbatim.
pub(crate) fn decode_excel_escapes(text: &str) -> Cow<'_, str> {
    if !text.contains("_x") {
        return Cow::Borrowed(text);
    }

    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("_x") {
        result.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        match escaped_char(candidate) {
            Some(c) => {
                result.push(c);
                rest = &candidate[7..];
            }
            None => {
                result.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    result.push_str(rest);
    Cow::Owned(result)
}

/// The character encoded by an `_xHHHH_` sequence at the start of `s`
pub(crate) fn escaped_char(s: &str) -> Option<char> {
    let bytes = s.as_bytes();
    if bytes.len() < 7 || !s.starts_with("_x") || bytes[6] != b'_' {
        return None;
    }
    let hex = s.get(2..6)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Write};

    #[test]
    fn test_decode_excel_escapes() {
        assert_eq!(decode_excel_escapes("plain"), "plain");
        assert_eq!(decode_excel_escapes("a_x000D_b"), "a\rb");
        assert_eq!(decode_excel_escapes("_x0041__x0042_"), "AB");
        assert_eq!(decode_excel_escapes("_x005F_x0041_"), "_x0041_");
        assert!(matches!(decode_excel_escapes("no escape"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_invalid_escapes_are_kept() {
        assert_eq!(decode_excel_escapes("_x12_"), "_x12_");
        assert_eq!(decode_excel_escapes("_xZZZZ_"), "_xZZZZ_");
        assert_eq!(decode_excel_escapes("_x0041"), "_x0041");
        assert_eq!(decode_excel_escapes("_xD800_"), "_xD800_");
        assert_eq!(decode_excel_escapes("tail_x"), "tail_x");
    }

    #[test]
    fn test_read_empty_input_fails() {
        let result = XlsxReader::read(Cursor::new(Vec::new()));
        assert!(result.is_err());
    }

    /// Package without shared strings or core properties
    fn minimal_xlsx() -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = zip::write::SimpleFileOptions::default();

            zip.start_file("[Content_Types].xml", options).unwrap();
            zip.write_all(br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/></Types>"#).unwrap();

            zip.start_file("_rels/.rels", options).unwrap();
            zip.write_all(br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#).unwrap();

            zip.start_file("xl/workbook.xml", options).unwrap();
            zip.write_all(br#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#).unwrap();

            zip.start_file("xl/_rels/workbook.xml.rels", options)
                .unwrap();
            zip.write_all(br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#).unwrap();

            zip.start_file("xl/worksheets/sheet1.xml", options).unwrap();
            zip.write_all(br#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>inline</t></is></c></row></sheetData></worksheet>"#).unwrap();

            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn test_read_minimal_xlsx() {
        let doc = XlsxReader::read(Cursor::new(minimal_xlsx())).unwrap();
        assert_eq!(doc.sheet_count(), 1);
        assert_eq!(doc.worksheet_at(0).unwrap().name(), "Sheet1");
        assert_eq!(
            doc.worksheet("Sheet1").unwrap().get_value("A1").unwrap(),
            xlgrid_core::CellValue::from("inline")
        );
    }

    #[test]
    fn test_missing_parts_are_created_on_save() {
        let mut doc = XlsxReader::read(Cursor::new(minimal_xlsx())).unwrap();
        doc.worksheet_mut("Sheet1")
            .unwrap()
            .set_cell_value("B1", "shared")
            .unwrap();

        let mut out = Vec::new();
        doc.write(Cursor::new(&mut out)).unwrap();

        let package = Package::read(Cursor::new(&out)).unwrap();
        let sst = package.entry_text("xl/sharedStrings.xml").unwrap().unwrap();
        assert!(sst.contains(r#"count="1" uniqueCount="1""#));
        assert!(package.has_entry("docProps/core.xml"));

        let types = package.entry_text("[Content_Types].xml").unwrap().unwrap();
        assert!(types.contains(r#"PartName="/xl/sharedStrings.xml""#));
        assert!(types.contains(r#"PartName="/docProps/core.xml""#));

        let reread = XlsxReader::read(Cursor::new(out)).unwrap();
        let sheet = reread.worksheet("Sheet1").unwrap();
        assert_eq!(sheet.get_value("B1").unwrap(), xlgrid_core::CellValue::from("shared"));
        assert_eq!(sheet.get_value("A1").unwrap(), xlgrid_core::CellValue::from("inline"));
    }
}
