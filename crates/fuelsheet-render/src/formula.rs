//! Derived-cell formulas
//!
//! Layouts only ever need sums: a row total over scattered value cells, or a
//! column total over a contiguous block. [`SumFormula`] builds the formula
//! text from typed addresses instead of string concatenation in layout code.

use std::fmt;

use crate::address::{CellAddress, CellRange};

/// Operand of a sum
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellRef {
    Cell(CellAddress),
    Range(CellRange),
}

impl CellRef {
    /// Addresses covered by this operand
    pub fn cells(&self) -> Vec<CellAddress> {
        match self {
            CellRef::Cell(address) => vec![*address],
            CellRef::Range(range) => range.cells().collect(),
        }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellRef::Cell(address) => write!(f, "{address}"),
            CellRef::Range(range) => write!(f, "{range}"),
        }
    }
}

/// `SUM(...)` over cells and ranges
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SumFormula {
    operands: Vec<CellRef>,
}

impl SumFormula {
    /// Sum over one contiguous block
    pub fn over_range(range: CellRange) -> Self {
        Self {
            operands: vec![CellRef::Range(range)],
        }
    }

    /// Sum over individual cells
    pub fn over_cells<I: IntoIterator<Item = CellAddress>>(cells: I) -> Self {
        Self {
            operands: cells.into_iter().map(CellRef::Cell).collect(),
        }
    }

    pub fn operands(&self) -> &[CellRef] {
        &self.operands
    }

    /// Every address the formula reads
    pub fn referenced_cells(&self) -> Vec<CellAddress> {
        self.operands.iter().flat_map(CellRef::cells).collect()
    }

    /// Formula text without the leading `=`
    pub fn expression(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SumFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operands.is_empty() {
            // SUM() with no arguments is rejected by spreadsheet applications
            return f.write_str("SUM(0)");
        }
        let operands: Vec<String> = self.operands.iter().map(ToString::to_string).collect();
        write!(f, "SUM({})", operands.join(","))
    }
}
