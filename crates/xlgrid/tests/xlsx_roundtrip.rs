//! End-to-end tests for XLSX roundtrip (create -> save -> read -> verify)

use pretty_assertions::assert_eq;
use std::io::Cursor;
use xlgrid::prelude::*;

fn roundtrip(doc: &mut Document) -> Document {
    let mut buf = Vec::new();
    XlsxWriter::write(doc, Cursor::new(&mut buf)).unwrap();
    XlsxReader::read(Cursor::new(&buf)).unwrap()
}

/// Test basic roundtrip with numeric values
#[test]
fn test_roundtrip_numbers() {
    let mut doc = Document::new().unwrap();
    let sheet = doc.worksheet_mut("Sheet1").unwrap();

    sheet.set_cell_value("A1", 42).unwrap();
    sheet.set_cell_value("B1", 3.14159).unwrap();
    sheet.set_cell_value("C1", -100.5).unwrap();
    sheet.set_cell_value("A2", 0.0).unwrap();
    sheet.set_cell_value("B2", 1e10).unwrap();

    let doc2 = roundtrip(&mut doc);
    let sheet2 = doc2.worksheet_at(0).unwrap();

    assert_eq!(sheet2.get_value("A1").unwrap(), CellValue::Integer(42));
    assert_eq!(sheet2.get_value("B1").unwrap().as_float(), Some(3.14159));
    assert_eq!(sheet2.get_value("C1").unwrap().as_float(), Some(-100.5));
    assert_eq!(sheet2.get_value("A2").unwrap(), CellValue::Float(0.0));
    assert_eq!(sheet2.get_value("B2").unwrap(), CellValue::Float(1e10));
}

/// Test basic roundtrip with string values
#[test]
fn test_roundtrip_strings() {
    let mut doc = Document::new().unwrap();
    let sheet = doc.worksheet_mut("Sheet1").unwrap();

    sheet.set_cell_value("A1", "Hello, World!").unwrap();
    sheet.set_cell_value("B1", "").unwrap();
    sheet.set_cell_value("C1", "Special: <>&\"'").unwrap();
    sheet.set_cell_value("A2", "Multi\nLine").unwrap();
    sheet.set_cell_value("B2", "Unicode: \u{1F600}").unwrap();
    sheet.set_cell_value("C2", "  padded  ").unwrap();
    sheet.set_cell_value("D2", "bell\u{7}").unwrap();

    let doc2 = roundtrip(&mut doc);
    let sheet2 = doc2.worksheet_at(0).unwrap();

    for (address, text) in [
        ("A1", "Hello, World!"),
        ("B1", ""),
        ("C1", "Special: <>&\"'"),
        ("A2", "Multi\nLine"),
        ("B2", "Unicode: \u{1F600}"),
        ("C2", "  padded  "),
        ("D2", "bell\u{7}"),
    ] {
        assert_eq!(
            sheet2.get_value(address).unwrap().as_str(),
            Some(text),
            "{}",
            address
        );
    }
}

/// Booleans, errors and formulas keep their types
#[test]
fn test_roundtrip_booleans_errors_formulas() {
    let mut doc = Document::new().unwrap();
    let sheet = doc.worksheet_mut("Sheet1").unwrap();

    sheet.set_cell_value("A1", true).unwrap();
    sheet.set_cell_value("B1", false).unwrap();
    sheet.cell("C1").unwrap().set_error("#N/A");
    sheet.set_cell_value("D1", 2).unwrap();
    sheet.set_cell_formula("D1", "1+1").unwrap();

    let doc2 = roundtrip(&mut doc);
    let sheet2 = doc2.worksheet_at(0).unwrap();

    assert_eq!(sheet2.get_value("A1").unwrap(), CellValue::Boolean(true));
    assert_eq!(sheet2.get_value("B1").unwrap(), CellValue::Boolean(false));
    assert_eq!(sheet2.get_value("C1").unwrap(), CellValue::error("#N/A"));
    assert_eq!(sheet2.get_value("D1").unwrap(), CellValue::Integer(2));
}

/// Row heights, column widths and hidden flags survive a save
#[test]
fn test_roundtrip_rows_and_columns() {
    let mut doc = Document::new().unwrap();
    {
        let sheet = doc.worksheet_mut("Sheet1").unwrap();
        sheet.row(3).unwrap().set_height(30.0);
        sheet.row(4).unwrap().set_hidden(true);
        sheet.column(2).unwrap().set_width(20.5);
        sheet.column(5).unwrap().set_hidden(true);
    }

    let mut doc2 = roundtrip(&mut doc);
    let sheet2 = doc2.worksheet_mut("Sheet1").unwrap();
    assert_eq!(sheet2.row(3).unwrap().height(), 30.0);
    assert!(sheet2.row(4).unwrap().is_hidden());
    assert!(!sheet2.row(3).unwrap().is_hidden());
    assert_eq!(sheet2.column(2).unwrap().width(), 20.5);
    assert!(sheet2.column(5).unwrap().is_hidden());
}

/// Save through the extension trait, by file extension
#[test]
fn test_save_as_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let mut doc = Document::new().unwrap();
    doc.worksheet_mut("Sheet1")
        .unwrap()
        .row(1)
        .unwrap()
        .set_values(["a", "b"])
        .unwrap();

    let xlsx = dir.path().join("out.xlsx");
    doc.save_as(&xlsx).unwrap();
    let reopened = xlgrid::open(&xlsx).unwrap();
    assert_eq!(reopened.sheet_names(), ["Sheet1"]);

    let csv = dir.path().join("out.csv");
    doc.save_as(&csv).unwrap();
    assert_eq!(std::fs::read_to_string(&csv).unwrap(), "a,b\r\n");

    assert!(matches!(
        doc.save_as(dir.path().join("out.ods")),
        Err(FileError::UnsupportedFormat(_))
    ));
}
