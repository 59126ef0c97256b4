//! The seam between the HTTP layer and whatever owns the spreadsheets.

use gridchat_core::Worksheet;
use gridchat_protocol::{OperationResult, SheetTarget};
use serde_json::Value;

use crate::error::HostError;

/// A resolved sheet copied out of the host.
#[derive(Debug, Clone)]
pub struct SheetSnapshot {
    pub workbook: String,
    pub worksheet: Worksheet,
}

/// A spreadsheet application the bridge can drive.
///
/// Methods are synchronous; the server calls them from a blocking task, so an
/// implementation may talk to a slow automation API directly.
pub trait SpreadsheetHost: Send + Sync + 'static {
    /// Name of the active workbook, or why there is none.
    fn active_workbook(&self) -> Result<String, HostError>;

    /// Copy out the targeted sheet (`None` fields mean "active").
    fn snapshot(&self, target: &SheetTarget) -> Result<SheetSnapshot, HostError>;

    /// Apply raw operations to the targeted sheet in order.
    ///
    /// Target resolution failures reject the whole batch. Once the sheet is
    /// resolved every operation gets exactly one result and a failing
    /// operation never stops the ones after it.
    fn apply(
        &self,
        target: &SheetTarget,
        operations: &[Value],
    ) -> Result<Vec<OperationResult>, HostError>;
}
