//! Cell value types

use std::fmt;

use serde_json::Value as JsonValue;

use crate::error::{Error, Result};

/// Represents the value stored in a cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Empty cell (no value)
    #[default]
    Empty,

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Numeric value
    Number(f64),

    /// Text value
    Text(String),

    /// Formula text (e.g., "=SUM(A1:A10)"), stored unevaluated
    Formula(String),
}

impl CellValue {
    /// Create a formula value, adding the leading `=` if missing
    pub fn formula<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        let text = text.trim();
        if text.starts_with('=') {
            CellValue::Formula(text.to_string())
        } else {
            CellValue::Formula(format!("={text}"))
        }
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Convert a JSON scalar into a cell value.
    ///
    /// `null` clears the cell. Arrays and objects have no cell representation.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        match value {
            JsonValue::Null => Ok(CellValue::Empty),
            JsonValue::Bool(b) => Ok(CellValue::Boolean(*b)),
            JsonValue::Number(n) => n
                .as_f64()
                .map(CellValue::Number)
                .ok_or_else(|| Error::UnsupportedValue(n.to_string())),
            JsonValue::String(s) => Ok(CellValue::Text(s.clone())),
            other => Err(Error::UnsupportedValue(other.to_string())),
        }
    }

    /// Convert to a JSON scalar. Whole numbers are emitted as integers and
    /// formulas as their text.
    pub fn to_json(&self) -> JsonValue {
        match self {
            CellValue::Empty => JsonValue::Null,
            CellValue::Boolean(b) => JsonValue::Bool(*b),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    JsonValue::from(*n as i64)
                } else {
                    JsonValue::from(*n)
                }
            }
            CellValue::Text(s) | CellValue::Formula(s) => JsonValue::String(s.clone()),
        }
    }

    /// Guess the type of a raw text field (used by CSV import)
    pub fn detect(field: &str) -> Self {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "true" => return CellValue::Boolean(true),
            "false" => return CellValue::Boolean(false),
            _ => {}
        }

        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return CellValue::Number(n);
            }
        }

        if trimmed.starts_with('=') && trimmed.len() > 1 {
            return CellValue::Formula(trimmed.to_string());
        }

        CellValue::Text(field.to_string())
    }

    /// Short name of the value's type
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::Boolean(_) => "boolean",
            CellValue::Number(_) => "number",
            CellValue::Text(_) => "text",
            CellValue::Formula(_) => "formula",
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            CellValue::Text(s) | CellValue::Formula(s) => f.write_str(s),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}
