//! Row types

use crate::cell::{Cell, CellRange, CellReference, CellValue};
use crate::error::{Error, Result};
use crate::worksheet::Worksheet;
use crate::xml::NodeId;
use crate::MAX_COLS;

/// Row height used when a row has no `ht` attribute
pub const DEFAULT_ROW_HEIGHT: f64 = 15.0;

/// A `<row>` of a worksheet
#[derive(Debug)]
pub struct Row<'a> {
    sheet: &'a mut Worksheet,
    node: NodeId,
    number: u32,
}

impl<'a> Row<'a> {
    pub(crate) fn new(sheet: &'a mut Worksheet, node: NodeId, number: u32) -> Self {
        Self {
            sheet,
            node,
            number,
        }
    }

    /// 1-based row number
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Row height in points
    pub fn height(&self) -> f64 {
        self.sheet
            .xml()
            .attribute(self.node, "ht")
            .and_then(|ht| ht.parse().ok())
            .unwrap_or(DEFAULT_ROW_HEIGHT)
    }

    /// Set a custom row height in points
    pub fn set_height(&mut self, height: f64) {
        let xml = self.sheet.xml_mut();
        xml.set_attribute(self.node, "ht", &height.to_string());
        xml.set_attribute(self.node, "customHeight", "1");
        self.sheet.mark_modified();
    }

    /// Check if the row is hidden
    pub fn is_hidden(&self) -> bool {
        matches!(
            self.sheet.xml().attribute(self.node, "hidden"),
            Some("1" | "true")
        )
    }

    /// Hide or show the row
    pub fn set_hidden(&mut self, hidden: bool) {
        let xml = self.sheet.xml_mut();
        if hidden {
            xml.set_attribute(self.node, "hidden", "1");
        } else {
            xml.remove_attribute(self.node, "hidden");
        }
        self.sheet.mark_modified();
    }

    /// Column of the last cell node in the row (0 if the row has none)
    pub fn cell_count(&self) -> u16 {
        self.sheet.last_column_of(self.node).unwrap_or(0)
    }

    /// Values from column A up to the last cell; gaps read as empty
    pub fn values(&self) -> Result<Vec<CellValue>> {
        let count = self.cell_count();
        if count == 0 {
            return Ok(Vec::new());
        }
        let range = CellRange::new(
            CellReference::new(self.number, 1)?,
            CellReference::new(self.number, count)?,
        )?;
        self.sheet
            .values(&range)
            .map(|item| item.map(|(_, value)| value))
            .collect()
    }

    /// Write values into consecutive cells starting at column A
    pub fn set_values<I, V>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        for (index, value) in values.into_iter().enumerate() {
            let column = u16::try_from(index + 1)
                .map_err(|_| Error::ColumnOutOfBounds(u32::MAX, MAX_COLS))?;
            self.sheet.cell_at(self.number, column)?.set_value(value);
        }
        Ok(())
    }

    /// Cell of this row, creating its node if needed
    pub fn cell(&mut self, column: u16) -> Result<Cell<'_>> {
        self.sheet.cell_at(self.number, column)
    }
}
