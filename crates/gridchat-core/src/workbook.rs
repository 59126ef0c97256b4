//! Workbook type - a named collection of worksheets

use crate::error::{Error, Result};
use crate::worksheet::Worksheet;

/// A workbook (spreadsheet document)
#[derive(Debug, Clone)]
pub struct Workbook {
    name: String,
    worksheets: Vec<Worksheet>,
    active_sheet: usize,
}

impl Workbook {
    /// Create a workbook with a single empty "Sheet1"
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            worksheets: vec![Worksheet::new("Sheet1")],
            active_sheet: 0,
        }
    }

    /// Create a workbook from existing sheets; the first sheet is active
    pub fn with_sheets(name: impl Into<String>, worksheets: Vec<Worksheet>) -> Result<Self> {
        let mut wb = Self {
            name: name.into(),
            worksheets: Vec::with_capacity(worksheets.len()),
            active_sheet: 0,
        };
        for ws in worksheets {
            wb.add_worksheet(ws)?;
        }
        Ok(wb)
    }

    /// The workbook name (usually the file name)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Iterate over the worksheets in order
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Add a worksheet. Names are unique, compared case-insensitively.
    pub fn add_worksheet(&mut self, worksheet: Worksheet) -> Result<usize> {
        if self.sheet_index(worksheet.name()).is_some() {
            return Err(Error::DuplicateSheetName(worksheet.name().to_string()));
        }
        self.worksheets.push(worksheet);
        Ok(self.worksheets.len() - 1)
    }

    /// Index of a worksheet by name (case-insensitive)
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.worksheets
            .iter()
            .position(|ws| ws.name().eq_ignore_ascii_case(name))
    }

    /// Get a worksheet by name
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.sheet_index(name).map(|i| &self.worksheets[i])
    }

    /// Get a mutable worksheet by name
    pub fn worksheet_by_name_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.sheet_index(name).map(move |i| &mut self.worksheets[i])
    }

    /// The active worksheet, if the workbook has any sheets
    pub fn active_worksheet(&self) -> Option<&Worksheet> {
        self.worksheets.get(self.active_sheet)
    }

    /// The active worksheet, mutably
    pub fn active_worksheet_mut(&mut self) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(self.active_sheet)
    }
}
