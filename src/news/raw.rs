//! Loosely-typed text fields from external payloads.
//!
//! Feeds and APIs deliver the same logical field as a string, a list of
//! strings, a number, `null`, or not at all. [`RawText`] captures all of those
//! and [`coerce`] turns any of them into one trimmed string.

use serde::Deserialize;

/// A text field as found in an external payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawText {
    /// A single string.
    Text(String),
    /// A list of values, joined with spaces when coerced.
    List(Vec<RawText>),
    /// Any other JSON value (numbers and booleans keep their text form).
    Other(serde_json::Value),
}

impl RawText {
    /// Coerce to a trimmed string.
    pub fn coerce(&self) -> String {
        match self {
            RawText::Text(s) => s.trim().to_string(),
            RawText::List(items) => items
                .iter()
                .map(RawText::coerce)
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
            RawText::Other(serde_json::Value::Number(n)) => n.to_string(),
            RawText::Other(serde_json::Value::Bool(b)) => b.to_string(),
            RawText::Other(_) => String::new(),
        }
    }
}

impl From<&str> for RawText {
    fn from(s: &str) -> Self {
        RawText::Text(s.to_string())
    }
}

impl From<String> for RawText {
    fn from(s: String) -> Self {
        RawText::Text(s)
    }
}

/// Coerce an optional field; absent becomes the empty string.
pub fn coerce(value: Option<&RawText>) -> String {
    value.map(RawText::coerce).unwrap_or_default()
}

/// Coerce the first field that is non-empty after trimming.
pub fn coerce_first(candidates: &[Option<&RawText>]) -> String {
    candidates
        .iter()
        .map(|value| coerce(*value))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}
