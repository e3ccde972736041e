//! Loosely-typed inputs and their permissive decoding
//!
//! Inputs reach the orchestrator either as plain strings (runner inputs) or as
//! arbitrary JSON (deployment payload overrides). Everything is funneled through
//! [`RawInput`] and decoded exactly once into the canonical typed form.

use serde_json::Value as JsonValue;

use crate::error::Result;

/// Values written to the generated values file when none are supplied
pub const EMPTY_VALUES: &str = "{}";

/// An input value before decoding
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    /// Plain string, possibly JSON-encoded
    Text(String),
    /// Native structure from the deployment payload
    Structured(JsonValue),
}

impl RawInput {
    /// Wrap a JSON value, keeping strings as text so they decode like runner inputs
    pub fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::String(s) => RawInput::Text(s),
            other => RawInput::Structured(other),
        }
    }

    /// Whether the value counts as supplied (non-empty, non-null, non-false, non-zero)
    pub fn is_present(&self) -> bool {
        match self {
            RawInput::Text(s) => !s.is_empty(),
            RawInput::Structured(v) => is_truthy(v),
        }
    }

    /// Decode as a plain string
    ///
    /// Scalars keep their natural rendering (`1.2`, `true`); objects and arrays
    /// are re-encoded as compact JSON.
    pub fn into_text(self) -> String {
        match self {
            RawInput::Text(s) => s,
            RawInput::Structured(JsonValue::String(s)) => s,
            RawInput::Structured(v) => v.to_string(),
        }
    }

    /// Decode as a boolean switch
    ///
    /// `false`, `0`, `no`, `off` and the empty string disable; anything else enables.
    pub fn into_flag(self) -> bool {
        match self {
            RawInput::Text(s) => !matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "" | "false" | "0" | "no" | "off"
            ),
            RawInput::Structured(JsonValue::String(s)) => RawInput::Text(s).into_flag(),
            RawInput::Structured(v) => is_truthy(&v),
        }
    }

    /// Decode as JSON, keeping unparseable text as an opaque string
    pub fn into_json(self) -> JsonValue {
        match self {
            RawInput::Text(s) => serde_json::from_str(&s).unwrap_or(JsonValue::String(s)),
            RawInput::Structured(v) => v,
        }
    }

    /// Decode as an ordered list of file paths
    ///
    /// A JSON array is filtered to its truthy entries. Text that is not JSON at
    /// all is taken as a single path. Any other JSON shape yields no files.
    pub fn into_file_list(self) -> Vec<String> {
        let value = match self {
            RawInput::Text(s) => match serde_json::from_str::<JsonValue>(&s) {
                Ok(v) => v,
                Err(_) => return if s.is_empty() { Vec::new() } else { vec![s] },
            },
            RawInput::Structured(v) => v,
        };

        match value {
            JsonValue::Array(items) => items
                .into_iter()
                .filter(is_truthy)
                .map(|item| RawInput::from_json(item).into_text())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Decode into the text of the generated values file
    ///
    /// Structured values are serialized as YAML; text is written verbatim.
    pub fn into_values_document(self) -> Result<String> {
        match self {
            RawInput::Text(s) if s.is_empty() => Ok(EMPTY_VALUES.to_string()),
            RawInput::Text(s) => Ok(s),
            RawInput::Structured(v) if !is_truthy(&v) => Ok(EMPTY_VALUES.to_string()),
            RawInput::Structured(v) => Ok(serde_yaml::to_string(&v)?),
        }
    }
}

impl From<&str> for RawInput {
    fn from(s: &str) -> Self {
        RawInput::Text(s.to_string())
    }
}

impl From<String> for RawInput {
    fn from(s: String) -> Self {
        RawInput::Text(s)
    }
}

/// JavaScript-style truthiness, which is what deployment payloads are written against
pub fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}
