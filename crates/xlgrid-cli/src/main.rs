//! xlgrid CLI - inspect, edit and export XLSX files

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use xlgrid::prelude::*;

#[derive(Parser)]
#[command(name = "xlgrid")]
#[command(author, version, about = "Inspect, edit and export XLSX worksheets")]
struct Cli {
    /// Log what is read and written (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a worksheet to CSV and output to stdout or file
    #[command(alias = "csv")]
    ToCsv {
        /// Input XLSX file
        input: PathBuf,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Sheet name (default: first sheet)
        #[arg(short, long)]
        sheet: Option<String>,

        /// Field delimiter (default: comma)
        #[arg(short, long, default_value = ",")]
        delimiter: char,

        /// Cells to export, e.g. "B2:D10" (default: A1 to the last used cell)
        #[arg(short, long)]
        range: Option<String>,
    },

    /// Show document properties and sheet dimensions
    Info {
        /// Input XLSX file
        input: PathBuf,
    },

    /// List all sheets in a workbook
    Sheets {
        /// Input XLSX file
        input: PathBuf,
    },

    /// Print the type and value of one cell
    Get {
        /// Input XLSX file
        input: PathBuf,

        /// Cell address, e.g. "B3"
        address: String,

        /// Sheet name (default: first sheet)
        #[arg(short, long)]
        sheet: Option<String>,
    },

    /// Write one cell and save
    Set {
        /// Input XLSX file
        input: PathBuf,

        /// Cell address, e.g. "B3"
        address: String,

        /// New value; numbers, TRUE/FALSE and error codes are recognized
        value: String,

        /// Sheet name (default: first sheet)
        #[arg(short, long)]
        sheet: Option<String>,

        /// Output file (default: overwrite the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Store the value as text without type detection
        #[arg(long)]
        string: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::ToCsv {
            input,
            output,
            sheet,
            delimiter,
            range,
        } => to_csv(&input, output.as_deref(), sheet.as_deref(), delimiter, range.as_deref()),
        Commands::Info { input } => show_info(&input),
        Commands::Sheets { input } => list_sheets(&input),
        Commands::Get {
            input,
            address,
            sheet,
        } => get_cell(&input, &address, sheet.as_deref()),
        Commands::Set {
            input,
            address,
            value,
            sheet,
            output,
            string,
        } => set_cell(
            &input,
            &address,
            &value,
            sheet.as_deref(),
            output.as_deref(),
            string,
        ),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open(input: &Path) -> Result<Document> {
    Document::open(input).with_context(|| format!("Failed to open '{}'", input.display()))
}

/// Name of the requested sheet, or of the first one
fn sheet_name(doc: &Document, sheet: Option<&str>) -> Result<String> {
    match sheet {
        Some(name) => {
            if !doc.sheet_exists(name) {
                bail!("Sheet '{}' not found", name);
            }
            Ok(name.to_string())
        }
        None => doc
            .sheet_names()
            .first()
            .map(|name| name.to_string())
            .context("Workbook has no worksheets"),
    }
}

fn to_csv(
    input: &Path,
    output: Option<&Path>,
    sheet: Option<&str>,
    delimiter: char,
    range: Option<&str>,
) -> Result<()> {
    let doc = open(input)?;
    let name = sheet_name(&doc, sheet)?;
    let worksheet = doc.worksheet(&name)?;

    if !delimiter.is_ascii() {
        bail!("Delimiter must be a single ASCII character");
    }
    let range = range
        .map(CellRange::parse)
        .transpose()
        .context("Invalid range")?;
    if range.is_none() && worksheet.last_cell().is_none() {
        eprintln!("Warning: Sheet appears to be empty");
        return Ok(());
    }

    let options = CsvWriteOptions {
        delimiter: delimiter as u8,
        range,
        ..Default::default()
    };

    if let Some(output_path) = output {
        CsvWriter::write_file(worksheet, output_path, &options)
            .with_context(|| format!("Failed to write '{}'", output_path.display()))?;
        eprintln!("Wrote sheet '{}' to '{}'", name, output_path.display());
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        CsvWriter::write(worksheet, &mut handle, &options).context("Failed to write to stdout")?;
        handle.flush().context("Failed to write to stdout")?;
    }

    Ok(())
}

fn show_info(input: &Path) -> Result<()> {
    let doc = open(input)?;

    println!("File: {}", input.display());
    for (property, value) in doc.properties().iter() {
        println!("{}: {}", property.label(), value);
    }
    println!("Sheets: {}", doc.sheet_count());

    for (i, sheet) in doc.worksheets().enumerate() {
        println!();
        println!("  Sheet {}: \"{}\"", i, sheet.name());
        match sheet.used_range() {
            Some(range) => println!(
                "    Used range: {} ({} rows x {} columns)",
                range.to_a1_string(),
                sheet.row_count(),
                sheet.column_count()
            ),
            None => println!("    Used range: empty"),
        }
    }

    Ok(())
}

fn list_sheets(input: &Path) -> Result<()> {
    let doc = open(input)?;

    for (i, name) in doc.sheet_names().iter().enumerate() {
        let visibility = doc.sheet_visibility(name)?;
        println!("{}\t{}\t{}", i, name, visibility);
    }

    Ok(())
}

fn get_cell(input: &Path, address: &str, sheet: Option<&str>) -> Result<()> {
    let doc = open(input)?;
    let name = sheet_name(&doc, sheet)?;
    let value = doc
        .worksheet(&name)?
        .get_value(address)
        .with_context(|| format!("Failed to read '{}'", address))?;

    println!("{}\t{}", value.type_name(), value);
    Ok(())
}

fn set_cell(
    input: &Path,
    address: &str,
    value: &str,
    sheet: Option<&str>,
    output: Option<&Path>,
    string: bool,
) -> Result<()> {
    let mut doc = open(input)?;
    let name = sheet_name(&doc, sheet)?;
    let value = if string {
        CellValue::from(value)
    } else {
        parse_value(value)
    };

    doc.worksheet_mut(&name)?
        .set_cell_value(address, value)
        .with_context(|| format!("Failed to write '{}'", address))?;

    let output = output.unwrap_or(input);
    doc.save(output)
        .with_context(|| format!("Failed to write '{}'", output.display()))?;
    Ok(())
}

/// Infer the type of a command-line value
fn parse_value(text: &str) -> CellValue {
    if text.is_empty() {
        return CellValue::Empty;
    }
    if text.eq_ignore_ascii_case("true") {
        return CellValue::Boolean(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return CellValue::Boolean(false);
    }
    if let Ok(i) = text.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = text.parse::<f64>() {
        if f.is_finite() {
            return CellValue::Float(f);
        }
    }
    if is_error_code(text) {
        return CellValue::error(text);
    }
    CellValue::from(text)
}

fn is_error_code(text: &str) -> bool {
    matches!(
        text,
        "#NULL!" | "#DIV/0!" | "#VALUE!" | "#REF!" | "#NAME?" | "#NUM!" | "#N/A" | "#GETTING_DATA"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value(""), CellValue::Empty);
        assert_eq!(parse_value("TRUE"), CellValue::Boolean(true));
        assert_eq!(parse_value("false"), CellValue::Boolean(false));
        assert_eq!(parse_value("-17"), CellValue::Integer(-17));
        assert_eq!(parse_value("2.5"), CellValue::Float(2.5));
        assert_eq!(parse_value("#N/A"), CellValue::error("#N/A"));
        assert_eq!(parse_value("inf"), CellValue::from("inf"));
        assert_eq!(parse_value("hello"), CellValue::from("hello"));
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["xlgrid", "csv", "in.xlsx", "-d", ";", "-r", "A1:B2"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::ToCsv { delimiter: ';', .. }
        ));

        let cli = Cli::try_parse_from(["xlgrid", "set", "in.xlsx", "B2", "007", "--string"])
            .unwrap();
        match cli.command {
            Commands::Set { value, string, .. } => {
                assert_eq!(value, "007");
                assert!(string);
            }
            _ => panic!("expected set"),
        }
    }
}
