//! Worksheet type

use std::collections::BTreeMap;

use crate::address::{CellAddress, CellRange};
use crate::error::{Error, Result};
use crate::value::CellValue;

/// A single worksheet with sparse cell storage.
///
/// Cells are keyed by `(row, col)` so iteration is row-major, which is the
/// order the table and CSV exporters want.
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    name: String,
    cells: BTreeMap<(u32, u16), CellValue>,
}

impl Worksheet {
    /// Create an empty worksheet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    /// The sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Get a cell value by position; missing cells are `Empty`
    pub fn value_at(&self, row: u32, col: u16) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cells.get(&(row, col)).unwrap_or(&EMPTY)
    }

    /// Get a cell value by address
    pub fn get(&self, addr: &CellAddress) -> &CellValue {
        self.value_at(addr.row, addr.col)
    }

    /// Set a cell value by position. Writing `Empty` clears the cell.
    pub fn set_at(&mut self, row: u32, col: u16, value: CellValue) {
        if value.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value);
        }
    }

    /// Set a cell value by address
    pub fn set(&mut self, addr: &CellAddress, value: CellValue) {
        self.set_at(addr.row, addr.col, value);
    }

    /// Set a cell value from an A1 string
    pub fn set_cell(&mut self, cell: &str, value: impl Into<CellValue>) -> Result<()> {
        let addr = CellAddress::parse(cell)?;
        self.set(&addr, value.into());
        Ok(())
    }

    /// Write a block of values anchored at the range's top-left corner.
    ///
    /// Rows may be ragged, but no row may be wider than the range and there
    /// may not be more rows than the range has. Nothing is written when the
    /// shape check fails.
    pub fn write_block(&mut self, range: &CellRange, rows: &[Vec<CellValue>]) -> Result<()> {
        let widest = rows.iter().map(Vec::len).max().unwrap_or(0);
        if rows.len() > range.row_count() as usize || widest > range.col_count() as usize {
            return Err(Error::ShapeMismatch {
                rows: rows.len(),
                cols: widest,
                range: range.to_a1_string(),
            });
        }

        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let addr = range.start.offset(r as u32, c as u16)?;
                self.set(&addr, value.clone());
            }
        }
        Ok(())
    }

    /// The smallest range containing every non-empty cell
    pub fn used_range(&self) -> Option<CellRange> {
        let mut cells = self.cells.keys();
        let &(row, col) = cells.next()?;
        let first = CellRange::single(CellAddress::new(row, col));
        Some(cells.fold(first, |range, &(row, col)| {
            range.expand_to(CellAddress::new(row, col))
        }))
    }

    /// Values of the used range, row by row, with empty cells filled in
    pub fn used_rows(&self) -> Vec<Vec<CellValue>> {
        let Some(range) = self.used_range() else {
            return Vec::new();
        };
        (range.start.row..=range.end.row)
            .map(|row| {
                (range.start.col..=range.end.col)
                    .map(|col| self.value_at(row, col).clone())
                    .collect()
            })
            .collect()
    }
}
