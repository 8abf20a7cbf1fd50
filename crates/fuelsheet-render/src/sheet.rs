//! In-memory sheet model
//!
//! A [`SheetBuilder`] accumulates cells, merge regions and column widths for
//! one worksheet. Nothing touches the xlsx writer until the workbook is
//! serialized, so a layout pass that fails leaves no partial sheet behind.

use std::collections::BTreeMap;

use fuelsheet_core::LayoutError;
use rust_xlsxwriter::{Formula, Worksheet, XlsxError};

use crate::address::{CellAddress, CellRange};
use crate::formula::SumFormula;
use crate::style::{FormatCache, Style};

/// Content of a single cell
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Blank,
    Text(String),
    Number(f64),
    /// Sum formula with its evaluated result
    Formula {
        formula: SumFormula,
        result: f64,
    },
}

impl CellValue {
    /// Numeric contribution to a sum; text and blanks count as zero
    pub fn numeric(&self) -> f64 {
        match self {
            CellValue::Number(value) => *value,
            CellValue::Formula { result, .. } => *result,
            CellValue::Blank | CellValue::Text(_) => 0.0,
        }
    }

    /// Displayed text, as a reader that shows cached values would see it
    pub fn display(&self) -> String {
        match self {
            CellValue::Blank => String::new(),
            CellValue::Text(text) => text.clone(),
            CellValue::Number(value) => value.to_string(),
            CellValue::Formula { result, .. } => result.to_string(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        CellValue::Text(text.to_string())
    }
}

impl From<String> for CellValue {
    fn from(text: String) -> Self {
        CellValue::Text(text)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// A written cell
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: Style,
}

/// Mutable (column, row) position owned by one layout pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutCursor {
    pub col: u16,
    pub row: u32,
}

impl LayoutCursor {
    pub fn new(col: u16, row: u32) -> Self {
        Self { col, row }
    }

    /// Move to the first column of the next row
    pub fn next_row(&mut self) {
        self.col = 1;
        self.row += 1;
    }

    pub fn advance(&mut self, cols: u16) {
        self.col += cols;
    }
}

/// One logical worksheet under construction
#[derive(Clone, Debug, Default)]
pub struct SheetBuilder {
    name: String,
    cells: BTreeMap<CellAddress, Cell>,
    merges: Vec<CellRange>,
    column_widths: BTreeMap<u16, f64>,
}

impl SheetBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// True until the first cell, merge or width is recorded
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.merges.is_empty() && self.column_widths.is_empty()
    }

    /// Write a value; a later write to the same cell replaces it
    pub fn write_value(
        &mut self,
        col: u16,
        row: u32,
        value: impl Into<CellValue>,
        style: Style,
    ) -> Result<(), LayoutError> {
        let address = CellAddress::new(col, row)?;
        self.cells.insert(
            address,
            Cell {
                value: value.into(),
                style,
            },
        );
        Ok(())
    }

    /// Write a sum formula over cells already present in this sheet.
    ///
    /// Returns the evaluated result, which is also stored with the formula.
    pub fn write_formula(
        &mut self,
        col: u16,
        row: u32,
        formula: SumFormula,
        style: Style,
    ) -> Result<f64, LayoutError> {
        let address = CellAddress::new(col, row)?;
        let mut result = 0.0;
        for referenced in formula.referenced_cells() {
            let Some(cell) = self.cells.get(&referenced) else {
                return Err(LayoutError::ForwardReference {
                    formula: format!("={formula}"),
                    cell: referenced.to_string(),
                });
            };
            result += cell.value.numeric();
        }
        self.cells.insert(
            address,
            Cell {
                value: CellValue::Formula { formula, result },
                style,
            },
        );
        Ok(result)
    }

    /// Record a merged block; overlaps are not checked here
    pub fn merge_region(
        &mut self,
        col1: u16,
        row1: u32,
        col2: u16,
        row2: u32,
    ) -> Result<(), LayoutError> {
        self.merges.push(CellRange::new(col1, row1, col2, row2)?);
        Ok(())
    }

    /// Set the width of every column in `col_start..=col_end`
    pub fn set_column_width(
        &mut self,
        col_start: u16,
        col_end: u16,
        width: f64,
    ) -> Result<(), LayoutError> {
        CellAddress::new(col_start, 1)?;
        CellAddress::new(col_end, 1)?;
        for col in col_start..=col_end {
            self.column_widths.insert(col, width);
        }
        Ok(())
    }

    pub fn cell(&self, col: u16, row: u32) -> Option<&Cell> {
        CellAddress::new(col, row)
            .ok()
            .and_then(|address| self.cells.get(&address))
    }

    pub fn cells(&self) -> impl Iterator<Item = (CellAddress, &Cell)> {
        self.cells.iter().map(|(address, cell)| (*address, cell))
    }

    /// Displayed values of one row, from column A to its last written cell
    pub fn row_values(&self, row: u32) -> Vec<String> {
        let written: Vec<(CellAddress, &Cell)> = self
            .cells()
            .filter(|(address, _)| address.row() == row)
            .collect();
        let Some(last) = written.iter().map(|(address, _)| address.col()).max() else {
            return Vec::new();
        };
        (1..=last)
            .map(|col| {
                self.cell(col, row)
                    .map(|cell| cell.value.display())
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Highest row holding a cell, 0 for an empty sheet
    pub fn last_row(&self) -> u32 {
        self.cells
            .keys()
            .map(|address| address.row())
            .max()
            .unwrap_or(0)
    }

    pub fn merges(&self) -> &[CellRange] {
        &self.merges
    }

    pub fn column_widths(&self) -> &BTreeMap<u16, f64> {
        &self.column_widths
    }

    /// Copy the accumulated content onto a writer worksheet
    pub(crate) fn write_to(&self, worksheet: &mut Worksheet) -> Result<(), XlsxError> {
        worksheet.set_name(&self.name)?;
        let mut formats = FormatCache::new();

        for (&col, &width) in &self.column_widths {
            worksheet.set_column_width(col - 1, width)?;
        }

        // Merging writes a string into the top-left cell; anything else stored
        // there is written again below with the same format.
        for merge in self.merges.iter().filter(|merge| !merge.is_single_cell()) {
            let (first_row, first_col) = merge.first().zero_based();
            let (last_row, last_col) = merge.last().zero_based();
            let (text, style) = match self.cells.get(&merge.first()) {
                Some(Cell {
                    value: CellValue::Text(text),
                    style,
                }) => (text.as_str(), *style),
                Some(cell) => ("", cell.style),
                None => ("", Style::PLAIN),
            };
            worksheet.merge_range(
                first_row,
                first_col,
                last_row,
                last_col,
                text,
                formats.get(style),
            )?;
        }

        for (address, cell) in &self.cells {
            let (row, col) = address.zero_based();
            let format = formats.get(cell.style);
            match &cell.value {
                CellValue::Blank => {
                    worksheet.write_blank(row, col, format)?;
                }
                CellValue::Text(text) => {
                    worksheet.write_string_with_format(row, col, text, format)?;
                }
                CellValue::Number(value) => {
                    worksheet.write_number_with_format(row, col, *value, format)?;
                }
                CellValue::Formula { formula, result } => {
                    let formula =
                        Formula::new(format!("={formula}")).set_result(result.to_string());
                    worksheet.write_formula_with_format(row, col, formula, format)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::NumberFormat;
    use pretty_assertions::assert_eq;

    fn addr(col: u16, row: u32) -> CellAddress {
        CellAddress::new(col, row).unwrap()
    }

    #[test]
    fn last_write_wins() {
        let mut sheet = SheetBuilder::new("Test");
        sheet.write_value(1, 1, "first", Style::PLAIN).unwrap();
        sheet.write_value(1, 1, 42.0, Style::BOLD).unwrap();
        let cell = sheet.cell(1, 1).unwrap();
        assert_eq!(cell.value, CellValue::Number(42.0));
        assert_eq!(cell.style, Style::BOLD);
    }

    #[test]
    fn formula_result_is_evaluated_from_referenced_cells() {
        let mut sheet = SheetBuilder::new("Test");
        sheet.write_value(2, 3, 10.0, Style::PLAIN).unwrap();
        sheet.write_value(3, 3, 20.0, Style::PLAIN).unwrap();
        sheet.write_value(4, 3, "label", Style::PLAIN).unwrap();
        let row_sum = SumFormula::over_cells([addr(2, 3), addr(3, 3), addr(4, 3)]);
        let total = sheet.write_formula(5, 3, row_sum, Style::BOLD).unwrap();
        assert_eq!(total, 30.0);
    }

    #[test]
    fn formula_cells_contribute_their_result() {
        let mut sheet = SheetBuilder::new("Test");
        sheet.write_value(1, 1, 1.5, Style::PLAIN).unwrap();
        sheet.write_value(1, 2, 2.5, Style::PLAIN).unwrap();
        let column = SumFormula::over_range(CellRange::new(1, 1, 1, 2).unwrap());
        sheet.write_formula(1, 3, column, Style::PLAIN).unwrap();
        let grand = SumFormula::over_cells([addr(1, 3), addr(1, 1)]);
        let grand = sheet.write_formula(2, 3, grand, Style::PLAIN).unwrap();
        assert_eq!(grand, 5.5);
    }

    #[test]
    fn formula_over_unwritten_cell_is_rejected() {
        let mut sheet = SheetBuilder::new("Test");
        sheet.write_value(2, 3, 10.0, Style::PLAIN).unwrap();
        let column = SumFormula::over_range(CellRange::new(2, 3, 2, 4).unwrap());
        let err = sheet.write_formula(2, 5, column, Style::PLAIN).unwrap_err();
        assert_eq!(
            err,
            LayoutError::ForwardReference {
                formula: "=SUM(B3:B4)".into(),
                cell: "B4".into(),
            }
        );
        assert!(sheet.cell(2, 5).is_none());
    }

    #[test]
    fn out_of_range_writes_fail() {
        let mut sheet = SheetBuilder::new("Test");
        assert!(sheet.write_value(27, 1, "x", Style::PLAIN).is_err());
        assert!(sheet.merge_region(1, 1, 27, 1).is_err());
        assert!(sheet.set_column_width(25, 27, 10.0).is_err());
        assert!(sheet.is_empty());
    }

    #[test]
    fn row_values_fill_gaps() {
        let mut sheet = SheetBuilder::new("Test");
        sheet.write_value(1, 2, "Date", Style::TITLE).unwrap();
        let integer = Style::number(NumberFormat::Integer);
        sheet.write_value(3, 2, 7.0, integer).unwrap();
        sheet
            .write_value(4, 2, CellValue::Blank, Style::PLAIN)
            .unwrap();
        assert_eq!(sheet.row_values(2), vec!["Date", "", "7", ""]);
        assert!(sheet.row_values(9).is_empty());
        assert_eq!(sheet.last_row(), 2);
    }

    #[test]
    fn column_widths_cover_inclusive_span() {
        let mut sheet = SheetBuilder::new("Test");
        sheet.set_column_width(2, 4, 10.0).unwrap();
        sheet.set_column_width(4, 4, 14.0).unwrap();
        let widths: Vec<(u16, f64)> = sheet
            .column_widths()
            .iter()
            .map(|(col, width)| (*col, *width))
            .collect();
        assert_eq!(widths, vec![(2, 10.0), (3, 10.0), (4, 14.0)]);
    }

    #[test]
    fn cursor_moves() {
        let mut cursor = LayoutCursor::new(1, 3);
        cursor.advance(2);
        assert_eq!(cursor, LayoutCursor::new(3, 3));
        cursor.next_row();
        assert_eq!(cursor, LayoutCursor::new(1, 4));
    }
}
