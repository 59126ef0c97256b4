//! Finds the write-operation payload embedded in an assistant reply.
//!
//! Models answer in prose and may or may not wrap the JSON in a code fence,
//! so the reply is scanned with a fixed list of strategies, most specific
//! first. The first strategy that yields an object with an `operations`
//! array wins; a reply where none does simply has no operations.

use gridchat_protocol::SheetTarget;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").expect("valid regex"));

static OPERATIONS_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)\{.*"operations".*\}"#).expect("valid regex"));

/// Operations the assistant asked for, in the order it listed them.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationBatch {
    /// Raw operation objects; the bridge validates each one.
    pub operations: Vec<Value>,
    /// Workbook/sheet named in the payload, if any.
    pub target: SheetTarget,
}

impl OperationBatch {
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// A ```json fenced block holding an object.
    FencedBlock,
    /// From the first `{` to the last `}` around an `"operations"` key.
    ObjectLiteral,
    /// The first line that starts with `{` and mentions `operations`.
    SingleLine,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::FencedBlock,
        Strategy::ObjectLiteral,
        Strategy::SingleLine,
    ];

    /// The text this strategy would try to parse, if it finds any.
    pub fn candidate(self, text: &str) -> Option<&str> {
        match self {
            Strategy::FencedBlock => FENCED_JSON
                .captures(text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str()),
            Strategy::ObjectLiteral => OPERATIONS_OBJECT.find(text).map(|m| m.as_str()),
            Strategy::SingleLine => text.lines().map(str::trim).find(|line| {
                line.starts_with('{') && line.contains("operations")
            }),
        }
    }
}

/// Extract at most one operation batch from `text`.
pub fn extract(text: &str) -> Option<OperationBatch> {
    for strategy in Strategy::ALL {
        let Some(candidate) = strategy.candidate(text) else {
            continue;
        };
        match parse_batch(candidate) {
            Ok(batch) => {
                tracing::debug!(?strategy, operations = batch.len(), "found write operations");
                return Some(batch);
            }
            Err(reason) => {
                tracing::debug!(?strategy, "candidate rejected: {reason}");
            }
        }
    }
    None
}

fn parse_batch(candidate: &str) -> Result<OperationBatch, String> {
    let value: Value = serde_json::from_str(candidate).map_err(|e| e.to_string())?;
    let operations = match value.get("operations") {
        Some(Value::Array(ops)) => ops.clone(),
        Some(_) => return Err("`operations` is not an array".into()),
        None => return Err("no `operations` key".into()),
    };
    let field = |name: &str| {
        value
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };
    Ok(OperationBatch {
        operations,
        target: SheetTarget::new(field("workbook"), field("sheet")),
    })
}
