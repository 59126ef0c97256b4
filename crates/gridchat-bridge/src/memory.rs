//! In-memory spreadsheet host backed by gridchat-core workbooks.

use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use gridchat_core::{Workbook, Worksheet};
use gridchat_protocol::{OperationResult, SheetTarget};
use serde_json::Value;

use crate::dispatch;
use crate::error::{BridgeError, HostError};
use crate::host::{SheetSnapshot, SpreadsheetHost};

#[derive(Debug)]
struct OpenWorkbook {
    workbook: Workbook,
    /// CSV file the single sheet was loaded from, if any.
    source: Option<PathBuf>,
}

#[derive(Debug, Default)]
struct State {
    workbooks: Vec<OpenWorkbook>,
    active: Option<usize>,
}

/// Holds open workbooks in memory. The most recently opened workbook is the
/// active one, the way a desktop spreadsheet focuses a newly opened file.
#[derive(Debug, Default)]
pub struct MemoryHost {
    state: RwLock<State>,
    save_on_write: bool,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write CSV-backed sheets back to their file after each write batch.
    pub fn with_save_on_write(mut self, enabled: bool) -> Self {
        self.save_on_write = enabled;
        self
    }

    /// Open a workbook and make it active.
    pub fn open(&self, workbook: Workbook) {
        self.push(OpenWorkbook {
            workbook,
            source: None,
        });
    }

    /// Load a CSV file as a single-sheet workbook named after the file.
    pub fn open_csv(&self, path: impl AsRef<Path>) -> Result<String, BridgeError> {
        let path = path.as_ref();
        let worksheet = gridchat_core::csv::read_file(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("Book1")
            .to_string();
        let workbook = Workbook::with_sheets(name.clone(), vec![worksheet])?;
        tracing::info!(workbook = %name, path = %path.display(), "opened CSV workbook");
        self.push(OpenWorkbook {
            workbook,
            source: Some(path.to_path_buf()),
        });
        Ok(name)
    }

    /// Focus an open workbook by name.
    pub fn activate(&self, name: &str) -> Result<(), HostError> {
        let mut state = self.write();
        let index = find(&state, name).ok_or_else(|| HostError::WorkbookNotFound(name.into()))?;
        state.active = Some(index);
        Ok(())
    }

    /// Names of the open workbooks, in opening order.
    pub fn workbook_names(&self) -> Vec<String> {
        self.read()
            .workbooks
            .iter()
            .map(|wb| wb.workbook.name().to_string())
            .collect()
    }

    fn push(&self, open: OpenWorkbook) {
        let mut state = self.write();
        state.workbooks.push(open);
        state.active = Some(state.workbooks.len() - 1);
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn find(state: &State, name: &str) -> Option<usize> {
    state
        .workbooks
        .iter()
        .position(|wb| wb.workbook.name().eq_ignore_ascii_case(name))
}

fn resolve_workbook(state: &State, name: Option<&str>) -> Result<usize, HostError> {
    match name {
        Some(name) => find(state, name).ok_or_else(|| HostError::WorkbookNotFound(name.into())),
        None => state.active.ok_or(HostError::NoActiveWorkbook),
    }
}

fn resolve_sheet<'a>(
    workbook: &'a mut Workbook,
    sheet: Option<&str>,
) -> Result<&'a mut Worksheet, HostError> {
    match sheet {
        Some(sheet) => {
            let book = workbook.name().to_string();
            workbook
                .worksheet_by_name_mut(sheet)
                .ok_or_else(|| HostError::SheetNotFound {
                    sheet: sheet.to_string(),
                    workbook: book,
                })
        }
        None => workbook
            .active_worksheet_mut()
            .ok_or(HostError::NoActiveSheet),
    }
}

impl SpreadsheetHost for MemoryHost {
    fn active_workbook(&self) -> Result<String, HostError> {
        let state = self.read();
        let index = state.active.ok_or(HostError::NoActiveWorkbook)?;
        Ok(state.workbooks[index].workbook.name().to_string())
    }

    fn snapshot(&self, target: &SheetTarget) -> Result<SheetSnapshot, HostError> {
        let state = self.read();
        let index = resolve_workbook(&state, target.workbook.as_deref())?;
        let workbook = &state.workbooks[index].workbook;
        let worksheet = match target.sheet.as_deref() {
            Some(sheet) => {
                workbook
                    .worksheet_by_name(sheet)
                    .ok_or_else(|| HostError::SheetNotFound {
                        sheet: sheet.to_string(),
                        workbook: workbook.name().to_string(),
                    })?
            }
            None => workbook.active_worksheet().ok_or(HostError::NoActiveSheet)?,
        };
        Ok(SheetSnapshot {
            workbook: workbook.name().to_string(),
            worksheet: worksheet.clone(),
        })
    }

    fn apply(
        &self,
        target: &SheetTarget,
        operations: &[Value],
    ) -> Result<Vec<OperationResult>, HostError> {
        let mut state = self.write();
        let index = resolve_workbook(&state, target.workbook.as_deref())?;
        let open = &mut state.workbooks[index];
        let worksheet = resolve_sheet(&mut open.workbook, target.sheet.as_deref())?;

        let results = dispatch::apply_all(worksheet, operations);

        if self.save_on_write && results.iter().any(|r| r.success) {
            if let Some(path) = &open.source {
                // The write itself succeeded; a failed save is only logged.
                if let Err(e) = gridchat_core::csv::write_file(worksheet, path) {
                    tracing::warn!(path = %path.display(), "failed to save sheet: {e}");
                } else {
                    tracing::debug!(path = %path.display(), "saved sheet");
                }
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridchat_core::CellValue;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn book(name: &str, sheets: &[&str]) -> Workbook {
        Workbook::with_sheets(
            name,
            sheets.iter().map(|s| Worksheet::new(*s)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_no_workbook() {
        let host = MemoryHost::new();
        assert_eq!(host.active_workbook(), Err(HostError::NoActiveWorkbook));
        assert!(matches!(
            host.snapshot(&SheetTarget::default()),
            Err(HostError::NoActiveWorkbook)
        ));
    }

    #[test]
    fn test_last_opened_is_active() {
        let host = MemoryHost::new();
        host.open(book("First.xlsx", &["Sheet1"]));
        host.open(book("Second.xlsx", &["Sheet1"]));
        assert_eq!(host.active_workbook().unwrap(), "Second.xlsx");

        host.activate("first.xlsx").unwrap();
        assert_eq!(host.active_workbook().unwrap(), "First.xlsx");
        assert_eq!(host.workbook_names(), vec!["First.xlsx", "Second.xlsx"]);
    }

    #[test]
    fn test_apply_to_targeted_sheet() {
        let host = MemoryHost::new();
        host.open(book("Budget.xlsx", &["Summary", "Data"]));

        let target = SheetTarget::new(Some("Budget.xlsx".into()), Some("Data".into()));
        let results = host
            .apply(
                &target,
                &[json!({"type": "write_cell", "cell": "A1", "value": 7})],
            )
            .unwrap();
        assert!(results[0].success);

        let snap = host.snapshot(&target).unwrap();
        assert_eq!(snap.worksheet.value_at(0, 0), &CellValue::Number(7.0));
        let active = host.snapshot(&SheetTarget::default()).unwrap();
        assert_eq!(active.worksheet.name(), "Summary");
        assert_eq!(active.worksheet.cell_count(), 0);
    }

    #[test]
    fn test_unknown_targets_reject_batch() {
        let host = MemoryHost::new();
        host.open(book("Budget.xlsx", &["Summary"]));

        let err = host
            .apply(&SheetTarget::new(Some("Other.xlsx".into()), None), &[])
            .unwrap_err();
        assert_eq!(err, HostError::WorkbookNotFound("Other.xlsx".into()));

        let err = host
            .apply(&SheetTarget::new(None, Some("Missing".into())), &[])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Sheet 'Missing' not found in workbook 'Budget.xlsx'"
        );
    }

    #[test]
    fn test_save_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        std::fs::write(&path, "Region,Total\nNorth,10\n").unwrap();

        let host = MemoryHost::new().with_save_on_write(true);
        assert_eq!(host.open_csv(&path).unwrap(), "sales.csv");
        host.apply(
            &SheetTarget::default(),
            &[json!({"type": "write_cell", "cell": "B2", "value": 12})],
        )
        .unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert_eq!(saved, "Region,Total\nNorth,12\n");
    }
}
