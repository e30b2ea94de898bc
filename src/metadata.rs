use serde::Serialize;
use serde_json::Value;

/// Operator-entered metadata after best-effort coercion
///
/// Serializes untagged, so the service receives either the parsed JSON value
/// or the original text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Metadata {
    Structured(Value),
    Raw(String),
}

impl Metadata {
    /// Parse `raw` as JSON, falling back to the text itself. Never fails.
    pub fn normalize(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Metadata::Structured(value),
            Err(_) => Metadata::Raw(raw.to_string()),
        }
    }

    /// Batch rows treat missing or empty metadata as an empty object
    pub fn normalize_batch_field(raw: Option<&str>) -> Self {
        match raw {
            Some(text) if !text.is_empty() => Self::normalize(text),
            _ => Metadata::Structured(Value::Object(serde_json::Map::new())),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Metadata::Structured(_))
    }
}
