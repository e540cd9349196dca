//! Example: Create an xlsx file, then edit it in place

use xlgrid::prelude::*;

fn main() -> std::result::Result<(), FileError> {
    let mut doc = Document::new()?;
    doc.properties_mut().set_property(Property::Title, "Inventory");

    let sheet = doc.worksheet_mut("Sheet1")?;

    // Add header row
    sheet.row(1)?.set_values(["Name", "Value", "Double"])?;

    // Add data rows
    sheet.set_cell_value("A2", "Item 1")?;
    sheet.set_cell_value("B2", 100)?;
    sheet.set_cell_formula("C2", "B2*2")?;

    sheet.set_cell_value("A3", "Item 2")?;
    sheet.set_cell_value("B3", 200)?;
    sheet.set_cell_formula("C3", "B3*2")?;

    // Add total row
    sheet.set_cell_value("A4", "Total")?;
    sheet.set_cell_formula("B4", "SUM(B2:B3)")?;
    sheet.set_cell_formula("C4", "SUM(C2:C3)")?;
    sheet.column(1)?.set_width(14.0);

    let path = std::env::temp_dir().join("xlgrid-example.xlsx");
    doc.save_as(&path)?;
    println!("Created {}", path.display());

    // Reopen and copy the table next to itself
    let mut doc = xlgrid::open(&path)?;
    let sheet = doc.worksheet_mut("Sheet1")?;
    sheet
        .cell("E1")?
        .assign_range(&CellRange::parse("A1:C4")?)?;
    println!("Used range is now {:?}", sheet.used_range().map(|r| r.to_a1_string()));
    doc.save_as(&path)?;

    Ok(())
}
