//! CSV writer

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::CsvResult;
use crate::options::{CsvWriteOptions, LineTerminator};
use xlgrid_core::Worksheet;

/// CSV file writer
pub struct CsvWriter;

impl CsvWriter {
    /// Write a worksheet to a CSV file
    pub fn write_file<P: AsRef<Path>>(
        worksheet: &Worksheet,
        path: P,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let file = File::create(path)?;
        Self::write(worksheet, file, options)
    }

    /// Write a worksheet to a writer
    ///
    /// Each cell is written as its display string; missing cells are empty
    /// fields. Nothing is written for an empty sheet without an explicit range.
    pub fn write<W: Write>(
        worksheet: &Worksheet,
        writer: W,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let terminator = match options.line_terminator {
            LineTerminator::LF => csv::Terminator::Any(b'\n'),
            LineTerminator::CRLF => csv::Terminator::CRLF,
            LineTerminator::CR => csv::Terminator::Any(b'\r'),
        };

        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .terminator(terminator)
            .flexible(false)
            .from_writer(writer);

        if let Some(range) = options.range.or_else(|| worksheet.used_range()) {
            let width = range.num_columns() as usize;
            let mut record = Vec::with_capacity(width);

            for item in worksheet.values(&range) {
                let (_, value) = item?;
                record.push(value.as_string());
                if record.len() == width {
                    csv_writer.write_record(&record)?;
                    record.clear();
                }
            }
        }

        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use xlgrid_core::{CellRange, SharedStrings};

    fn to_csv(sheet: &Worksheet, options: &CsvWriteOptions) -> String {
        let mut out = Vec::new();
        CsvWriter::write(sheet, &mut out, options).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_write_used_range() {
        let mut sheet = Worksheet::new("Sheet1", SharedStrings::new());
        sheet.set_cell_value("A1", "name").unwrap();
        sheet.set_cell_value("B1", "says \"hi\", twice").unwrap();
        sheet.set_cell_value("A2", 1.5).unwrap();
        sheet.set_cell_value("C3", true).unwrap();

        let options = CsvWriteOptions {
            line_terminator: LineTerminator::LF,
            ..Default::default()
        };
        assert_eq!(
            to_csv(&sheet, &options),
            "name,\"says \"\"hi\"\", twice\",\n1.5,,\n,,TRUE\n"
        );
    }

    #[test]
    fn test_explicit_range_and_delimiter() {
        let mut sheet = Worksheet::new("Sheet1", SharedStrings::new());
        sheet.range("A1:C2").unwrap().fill(7).unwrap();

        let options = CsvWriteOptions {
            delimiter: b';',
            range: Some(CellRange::parse("B2:D2").unwrap()),
            ..Default::default()
        };
        assert_eq!(to_csv(&sheet, &options), "7;7;\r\n");
    }

    #[test]
    fn test_empty_sheet_writes_nothing() {
        let sheet = Worksheet::new("Sheet1", SharedStrings::new());
        assert_eq!(to_csv(&sheet, &CsvWriteOptions::default()), "");
    }

    #[test]
    fn test_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut sheet = Worksheet::new("Sheet1", SharedStrings::new());
        sheet.set_cell_value("A1", "x").unwrap();
        sheet.set_cell_value("B1", 2).unwrap();

        CsvWriter::write_file(&sheet, &path, &CsvWriteOptions::default()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x,2\r\n");
    }
}
