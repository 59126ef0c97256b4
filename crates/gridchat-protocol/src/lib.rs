//! Shared wire types for communication between the gridchat client and the
//! local bridge backend.
//!
//! The protocol is plain JSON over HTTP:
//! - `GET /health` returns a [`HealthReport`]
//! - `GET /api/excel-data` (query: [`DataQuery`]) returns [`SheetData`]
//! - `POST /api/write-excel` takes a [`WriteRequest`] and returns a
//!   [`WriteResponse`]
//!
//! Any non-2xx response carries an [`ErrorBody`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Port the bridge listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 3001;

pub const HEALTH_PATH: &str = "/health";
pub const EXCEL_DATA_PATH: &str = "/api/excel-data";
pub const WRITE_EXCEL_PATH: &str = "/api/write-excel";

/// Bridge health as reported by `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workbook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Anything other than "healthy" is treated as unhealthy.
    #[serde(other)]
    Unhealthy,
}

impl HealthReport {
    pub fn healthy(workbook: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            workbook: Some(workbook.into()),
            error: None,
        }
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            workbook: None,
            error: Some(error.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Optional workbook/sheet targeting. `None` means "the active one".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workbook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
}

impl SheetTarget {
    pub fn new(workbook: Option<String>, sheet: Option<String>) -> Self {
        Self { workbook, sheet }
    }

    /// Fill unset fields from `fallback`. Fields already set here win.
    pub fn or(self, fallback: &SheetTarget) -> Self {
        Self {
            workbook: self.workbook.or_else(|| fallback.workbook.clone()),
            sheet: self.sheet.or_else(|| fallback.sheet.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.workbook.is_none() && self.sheet.is_none()
    }
}

/// Query string of `GET /api/excel-data`.
///
/// Kept flat (no `#[serde(flatten)]`) so that URL-encoded booleans decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workbook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_cell_mapping: Option<bool>,
}

impl DataQuery {
    pub fn for_target(target: &SheetTarget) -> Self {
        Self {
            workbook: target.workbook.clone(),
            sheet: target.sheet.clone(),
            include_cell_mapping: None,
        }
    }

    /// The targeting part of the query; blank names count as unset.
    pub fn target(&self) -> SheetTarget {
        let non_blank = |s: &Option<String>| s.clone().filter(|s| !s.trim().is_empty());
        SheetTarget::new(non_blank(&self.workbook), non_blank(&self.sheet))
    }

    /// Query parameters as name/value pairs, skipping unset fields.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(workbook) = &self.workbook {
            pairs.push(("workbook", workbook.clone()));
        }
        if let Some(sheet) = &self.sheet {
            pairs.push(("sheet", sheet.clone()));
        }
        if let Some(include) = self.include_cell_mapping {
            pairs.push(("include_cell_mapping", include.to_string()));
        }
        pairs
    }
}

/// Snapshot of a worksheet returned by `GET /api/excel-data`.
///
/// The first row of the used range is the header; `data` holds one object
/// per remaining row keyed by header, in column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetData {
    pub workbook: String,
    pub sheet: String,
    /// `[rows, columns]` of the record table (header excluded)
    pub shape: [usize; 2],
    pub data: Vec<Map<String, Value>>,
    /// Cell address -> value for every data cell; only sent for small sheets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_mapping: Option<Map<String, Value>>,
}

/// A single write instruction.
///
/// Batches travel as raw JSON so that the bridge can report a per-operation
/// error for entries it cannot decode instead of rejecting the whole batch;
/// see [`WriteOperation::decode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WriteOperation {
    WriteCell { cell: String, value: Value },
    WriteRange { range: String, values: Vec<Vec<Value>> },
    InsertFormula { cell: String, formula: String },
}

/// Why a raw operation could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    MissingCell,
    MissingRangeOrValues,
    MissingFormula,
    UnknownType(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::MissingCell => {
                f.write_str("Cell address required for write_cell operation")
            }
            DecodeError::MissingRangeOrValues => {
                f.write_str("Range and values required for write_range operation")
            }
            DecodeError::MissingFormula => {
                f.write_str("Cell and formula required for insert_formula operation")
            }
            DecodeError::UnknownType(t) => write!(f, "Unknown operation type: {t}"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl WriteOperation {
    /// Decode one raw operation object, field by field.
    pub fn decode(raw: &Value) -> Result<Self, DecodeError> {
        let str_field = |name: &str| {
            raw.get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        };

        let op_type = match raw.get("type") {
            Some(Value::String(s)) => s.as_str(),
            Some(other) => return Err(DecodeError::UnknownType(other.to_string())),
            None => return Err(DecodeError::UnknownType("None".to_string())),
        };

        match op_type {
            "write_cell" => {
                let cell = str_field("cell").ok_or(DecodeError::MissingCell)?;
                let value = raw.get("value").cloned().unwrap_or(Value::Null);
                Ok(WriteOperation::WriteCell { cell, value })
            }
            "write_range" => {
                let range = str_field("range").ok_or(DecodeError::MissingRangeOrValues)?;
                let values = match raw.get("values") {
                    Some(Value::Array(rows)) if !rows.is_empty() => rows
                        .iter()
                        .map(|row| match row {
                            Value::Array(cells) => cells.clone(),
                            scalar => vec![scalar.clone()],
                        })
                        .collect(),
                    _ => return Err(DecodeError::MissingRangeOrValues),
                };
                Ok(WriteOperation::WriteRange { range, values })
            }
            "insert_formula" => {
                let cell = str_field("cell").ok_or(DecodeError::MissingFormula)?;
                let formula = str_field("formula").ok_or(DecodeError::MissingFormula)?;
                Ok(WriteOperation::InsertFormula { cell, formula })
            }
            other => Err(DecodeError::UnknownType(other.to_string())),
        }
    }

    /// The address this operation targets.
    pub fn address(&self) -> &str {
        match self {
            WriteOperation::WriteCell { cell, .. } | WriteOperation::InsertFormula { cell, .. } => {
                cell
            }
            WriteOperation::WriteRange { range, .. } => range,
        }
    }
}

/// Body of `POST /api/write-excel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteRequest {
    pub operations: Vec<Value>,
    #[serde(flatten)]
    pub target: SheetTarget,
}

/// Outcome of one operation, positionally aligned with the request.
///
/// On the wire `success` is either a bool or a human readable message
/// (`{"success": "Written '5' to cell A1"}`); both decode to `success = true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawOperationResult")]
pub struct OperationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Deserialize)]
struct RawOperationResult {
    #[serde(default)]
    success: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl From<RawOperationResult> for OperationResult {
    fn from(raw: RawOperationResult) -> Self {
        let (success, message) = match raw.success {
            Some(Value::Bool(b)) => (b, raw.message),
            Some(Value::String(msg)) => (true, raw.message.or(Some(msg))),
            _ => (false, raw.message),
        };
        Self {
            success,
            message,
            error: raw.error,
        }
    }
}

/// Body of a successful `POST /api/write-excel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResponse {
    pub results: Vec<OperationResult>,
}

/// Body of any non-2xx bridge response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_decode_operations() {
        let op = WriteOperation::decode(&json!({"type": "write_cell", "cell": "A1", "value": 5}))
            .unwrap();
        assert_eq!(
            op,
            WriteOperation::WriteCell {
                cell: "A1".into(),
                value: json!(5)
            }
        );

        let op = WriteOperation::decode(
            &json!({"type": "write_range", "range": "A1:B2", "values": [[1, 2], [3, 4]]}),
        )
        .unwrap();
        assert_eq!(op.address(), "A1:B2");

        let op = WriteOperation::decode(
            &json!({"type": "insert_formula", "cell": "C1", "formula": "=A1+B1"}),
        )
        .unwrap();
        assert!(matches!(op, WriteOperation::InsertFormula { .. }));
    }

    #[test]
    fn test_decode_errors_match_bridge_messages() {
        let err = WriteOperation::decode(&json!({"type": "write_cell", "value": 1})).unwrap_err();
        assert_eq!(err.to_string(), "Cell address required for write_cell operation");

        let err = WriteOperation::decode(&json!({"type": "write_range", "range": "A1"}))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Range and values required for write_range operation"
        );

        let err = WriteOperation::decode(&json!({"type": "delete_sheet"})).unwrap_err();
        assert_eq!(err.to_string(), "Unknown operation type: delete_sheet");

        let err = WriteOperation::decode(&json!({"cell": "A1"})).unwrap_err();
        assert_eq!(err.to_string(), "Unknown operation type: None");
    }

    #[test]
    fn test_operation_result_accepts_message_success() {
        let results: WriteResponse = serde_json::from_value(json!({
            "results": [
                {"success": "Written '5' to cell A1"},
                {"error": "Failed to write to cell ZZZZ1: bad address"},
                {"success": true},
            ]
        }))
        .unwrap();

        assert_eq!(
            results.results,
            vec![
                OperationResult::ok("Written '5' to cell A1"),
                OperationResult::failed("Failed to write to cell ZZZZ1: bad address"),
                OperationResult {
                    success: true,
                    message: None,
                    error: None
                },
            ]
        );
    }

    #[test]
    fn test_health_report_unknown_status_is_unhealthy() {
        let report: HealthReport =
            serde_json::from_value(json!({"status": "starting"})).unwrap();
        assert!(!report.is_healthy());

        let report: HealthReport =
            serde_json::from_value(json!({"status": "healthy", "workbook": "Book1.xlsx"}))
                .unwrap();
        assert_eq!(report, HealthReport::healthy("Book1.xlsx"));
    }

    #[test]
    fn test_write_request_flattens_target() {
        let req = WriteRequest {
            operations: vec![json!({"type": "write_cell", "cell": "A1", "value": 1})],
            target: SheetTarget::new(Some("Book1.xlsx".into()), None),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "operations": [{"type": "write_cell", "cell": "A1", "value": 1}],
                "workbook": "Book1.xlsx"
            })
        );
    }

    #[test]
    fn test_target_precedence() {
        let explicit = SheetTarget::new(None, Some("Data".into()));
        let payload = SheetTarget::new(Some("Book1.xlsx".into()), Some("Sheet1".into()));
        assert_eq!(
            explicit.or(&payload),
            SheetTarget::new(Some("Book1.xlsx".into()), Some("Data".into()))
        );
    }
}
