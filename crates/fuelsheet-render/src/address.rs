//! Cell address codec
//!
//! Layout code works in 1-based `(column, row)` pairs; sheets are addressed
//! with letter+digit references (`B3`) and rectangular ranges (`A1:D1`).
//! Columns are limited to the single letters `A`..`Z`.

use std::fmt;

use fuelsheet_core::LayoutError;

/// Highest addressable column (`Z`)
pub const MAX_COLUMN: u16 = 26;

/// Highest addressable row in the xlsx format
pub const MAX_ROW: u32 = 1_048_576;

/// 1-based cell position
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellAddress {
    col: u16,
    row: u32,
}

impl CellAddress {
    pub fn new(col: u16, row: u32) -> Result<Self, LayoutError> {
        if col == 0 || col > MAX_COLUMN || row == 0 || row > MAX_ROW {
            return Err(LayoutError::OutOfRangeAddress {
                col: u32::from(col),
                row,
            });
        }
        Ok(Self { col, row })
    }

    pub fn col(self) -> u16 {
        self.col
    }

    pub fn row(self) -> u32 {
        self.row
    }

    pub fn column_letter(self) -> char {
        (b'A' + (self.col - 1) as u8) as char
    }

    /// 0-based `(row, col)` as used by the xlsx writer
    pub(crate) fn zero_based(self) -> (u32, u16) {
        (self.row - 1, self.col - 1)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column_letter(), self.row)
    }
}

/// Rectangular block between two corners, inclusive
///
/// Corners are stored top-left first, whichever order they were given in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellRange {
    first: CellAddress,
    last: CellAddress,
}

impl CellRange {
    pub fn new(col1: u16, row1: u32, col2: u16, row2: u32) -> Result<Self, LayoutError> {
        CellAddress::new(col1, row1)?;
        CellAddress::new(col2, row2)?;
        let (c1, c2) = min_max(col1, col2);
        let (r1, r2) = min_max(row1, row2);
        Ok(Self {
            first: CellAddress { col: c1, row: r1 },
            last: CellAddress { col: c2, row: r2 },
        })
    }

    pub fn first(&self) -> CellAddress {
        self.first
    }

    pub fn last(&self) -> CellAddress {
        self.last
    }

    pub fn is_single_cell(&self) -> bool {
        self.first == self.last
    }

    /// Every address in the block, row by row
    pub fn cells(&self) -> impl Iterator<Item = CellAddress> {
        let (first, last) = (self.first, self.last);
        (first.row..=last.row)
            .flat_map(move |row| (first.col..=last.col).map(move |col| CellAddress { col, row }))
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.first, self.last)
    }
}

fn min_max<T: Ord + Copy>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Column letter for a 1-based column index
pub fn column_letter(col: u16) -> Result<char, LayoutError> {
    CellAddress::new(col, 1).map(CellAddress::column_letter)
}

/// Letter+digit reference, e.g. `address(2, 3) == "B3"`
pub fn address(col: u16, row: u32) -> Result<String, LayoutError> {
    CellAddress::new(col, row).map(|a| a.to_string())
}

/// Range reference, e.g. `range(1, 1, 2, 2) == "A1:B2"`
pub fn range(col1: u16, row1: u32, col2: u16, row2: u32) -> Result<String, LayoutError> {
    CellRange::new(col1, row1, col2, row2).map(|r| r.to_string())
}

/// Parse a reference such as `B3` back into a [`CellAddress`]
pub fn parse_address(reference: &str) -> Result<CellAddress, LayoutError> {
    let invalid = || LayoutError::InvalidAddress(reference.to_string());

    let mut chars = reference.chars();
    let letter = chars
        .next()
        .filter(char::is_ascii_uppercase)
        .ok_or_else(invalid)?;
    let digits = chars.as_str();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let row: u32 = digits.parse().map_err(|_| invalid())?;
    let col = u16::from(letter as u8 - b'A') + 1;
    CellAddress::new(col, row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_letter_addresses() {
        assert_eq!(address(1, 1).unwrap(), "A1");
        assert_eq!(address(26, 1).unwrap(), "Z1");
        assert_eq!(address(2, 37).unwrap(), "B37");
    }

    #[test]
    fn ranges() {
        assert_eq!(range(1, 1, 2, 2).unwrap(), "A1:B2");
        assert_eq!(range(1, 1, 6, 1).unwrap(), "A1:F1");
    }

    #[test]
    fn out_of_range_columns_and_rows() {
        assert_eq!(
            address(27, 1),
            Err(LayoutError::OutOfRangeAddress { col: 27, row: 1 })
        );
        assert_eq!(
            address(0, 1),
            Err(LayoutError::OutOfRangeAddress { col: 0, row: 1 })
        );
        assert!(address(1, 0).is_err());
        assert!(address(1, MAX_ROW + 1).is_err());
        assert!(range(1, 1, 27, 2).is_err());
        assert!(column_letter(30).is_err());
    }

    #[test]
    fn column_letters() {
        assert_eq!(column_letter(1).unwrap(), 'A');
        assert_eq!(column_letter(4).unwrap(), 'D');
        assert_eq!(column_letter(26).unwrap(), 'Z');
    }

    #[test]
    fn parse_round_trips() {
        for (col, row) in [(1, 1), (2, 3), (26, 1_048_576)] {
            let text = address(col, row).unwrap();
            let parsed = parse_address(&text).unwrap();
            assert_eq!((parsed.col(), parsed.row()), (col, row));
        }
    }

    #[test]
    fn parse_rejects_malformed_references() {
        for bad in ["", "A", "3B", "a1", "AA1", "B0", "B-1", "Z1048577"] {
            assert!(parse_address(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn range_cells_cover_block_row_major() {
        let block = CellRange::new(2, 3, 3, 4).unwrap();
        let cells: Vec<String> = block.cells().map(|c| c.to_string()).collect();
        assert_eq!(cells, vec!["B3", "C3", "B4", "C4"]);
    }

    #[test]
    fn reversed_corners_are_normalised() {
        let block = CellRange::new(3, 4, 2, 3).unwrap();
        assert_eq!(block, CellRange::new(2, 3, 3, 4).unwrap());
        assert_eq!(block.to_string(), "B3:C4");
        assert_eq!(block.first().to_string(), "B3");
        assert_eq!(block.cells().count(), 4);
        assert_eq!(range(3, 1, 1, 1).unwrap(), "A1:C1");
    }
}
