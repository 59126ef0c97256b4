//! Prompt text: the system prompt and the spreadsheet context block.

use gridchat_protocol::SheetData;
use serde_json::{json, Value};

const BASE_PROMPT: &str = "You are a spreadsheet assistant working inside Microsoft Excel. \
Answer questions about the user's data clearly and concisely. When spreadsheet data is \
provided it reflects the current contents of the sheet; refer to cells by their A1 address.";

const WRITE_PROMPT: &str = r#"You may also change the spreadsheet. To do so, include exactly one JSON object in your reply, inside a ```json code block, in this format:

```json
{
  "operations": [
    {"type": "write_cell", "cell": "A1", "value": "Total"},
    {"type": "write_range", "range": "A2:B3", "values": [["North", 120], ["South", 95.5]]},
    {"type": "insert_formula", "cell": "B4", "formula": "=SUM(B2:B3)"}
  ]
}
```

Rules:
- "write_cell" sets one cell to a number, string, boolean or null.
- "write_range" writes rows of values; a single-cell range is the top-left corner of the block.
- "insert_formula" stores a formula; the leading "=" is optional.
- Operations are applied in order and each one succeeds or fails on its own.
- Only include the JSON block when the user asks you to change the sheet."#;

/// The built-in system prompt, with write instructions when writes are on.
pub fn system_prompt(write_mode: bool) -> String {
    if write_mode {
        format!("{BASE_PROMPT}\n\n{WRITE_PROMPT}")
    } else {
        BASE_PROMPT.to_string()
    }
}

/// Render sheet data for the prompt, keeping at most `row_limit` records.
pub fn render_context(data: &SheetData, row_limit: usize) -> String {
    let [rows, cols] = data.shape;
    let shown = rows.min(row_limit).min(data.data.len());
    let records: Vec<Value> = data.data[..shown]
        .iter()
        .map(|r| Value::Object(r.clone()))
        .collect();

    let mut payload = json!({
        "workbook": data.workbook,
        "sheet": data.sheet,
        "shape": [rows, cols],
        "data": records,
    });
    if shown == rows {
        if let Some(mapping) = &data.cell_mapping {
            payload["cell_mapping"] = Value::Object(mapping.clone());
        }
    }

    let mut out = format!(
        "Current spreadsheet data (workbook '{}', sheet '{}', {rows} rows x {cols} columns",
        data.workbook, data.sheet
    );
    if shown < rows {
        out.push_str(&format!(", first {shown} rows shown"));
    }
    out.push_str("):\n```json\n");
    out.push_str(&serde_json::to_string_pretty(&payload).unwrap_or_default());
    out.push_str("\n```");
    out
}

/// The user turn as sent to the model: the question, then the context.
pub fn with_context(question: &str, context: Option<&str>) -> String {
    match context {
        Some(context) => format!("{question}\n\n{context}"),
        None => question.to_string(),
    }
}
