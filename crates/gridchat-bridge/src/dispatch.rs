//! Applies decoded write operations to a worksheet.

use gridchat_core::{CellAddress, CellRange, CellValue, Worksheet};
use gridchat_protocol::{OperationResult, WriteOperation};
use serde_json::Value;

/// Apply every raw operation in order, one result per operation.
pub fn apply_all(worksheet: &mut Worksheet, operations: &[Value]) -> Vec<OperationResult> {
    operations
        .iter()
        .map(|raw| apply_one(worksheet, raw))
        .collect()
}

/// Decode and apply a single raw operation.
pub fn apply_one(worksheet: &mut Worksheet, raw: &Value) -> OperationResult {
    let op = match WriteOperation::decode(raw) {
        Ok(op) => op,
        Err(e) => return OperationResult::failed(e.to_string()),
    };

    match &op {
        WriteOperation::WriteCell { cell, value } => match write_cell(worksheet, cell, value) {
            Ok(written) => OperationResult::ok(format!("Written '{written}' to cell {cell}")),
            Err(e) => OperationResult::failed(format!("Failed to write to cell {cell}: {e}")),
        },
        WriteOperation::WriteRange { range, values } => {
            match write_range(worksheet, range, values) {
                Ok(()) => OperationResult::ok(format!("Written data to range {range}")),
                Err(e) => {
                    OperationResult::failed(format!("Failed to write to range {range}: {e}"))
                }
            }
        }
        WriteOperation::InsertFormula { cell, formula } => {
            match insert_formula(worksheet, cell, formula) {
                Ok(text) => {
                    OperationResult::ok(format!("Inserted formula '{text}' into cell {cell}"))
                }
                Err(e) => OperationResult::failed(format!(
                    "Failed to insert formula into cell {cell}: {e}"
                )),
            }
        }
    }
}

fn write_cell(
    worksheet: &mut Worksheet,
    cell: &str,
    value: &Value,
) -> gridchat_core::Result<CellValue> {
    let addr = CellAddress::parse(cell)?;
    let value = CellValue::from_json(value)?;
    worksheet.set(&addr, value.clone());
    Ok(value)
}

fn write_range(
    worksheet: &mut Worksheet,
    range: &str,
    values: &[Vec<Value>],
) -> gridchat_core::Result<()> {
    let mut range = CellRange::parse(range)?;
    let rows = values
        .iter()
        .map(|row| row.iter().map(CellValue::from_json).collect())
        .collect::<gridchat_core::Result<Vec<Vec<CellValue>>>>()?;

    // A single-cell range is an anchor: the block grows from it.
    if range.start == range.end {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        range = CellRange::anchored(range.start, rows.len(), width)?;
    }

    worksheet.write_block(&range, &rows)
}

fn insert_formula(
    worksheet: &mut Worksheet,
    cell: &str,
    formula: &str,
) -> gridchat_core::Result<String> {
    let addr = CellAddress::parse(cell)?;
    let value = CellValue::formula(formula);
    let text = value.to_string();
    worksheet.set(&addr, value);
    Ok(text)
}
