use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Values that can be stored in a record field or passed as positional statement parameters.
///
/// ```rust
/// use websql_middleware::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// Text/string value
    Text(String),
    /// NULL value (also used for parameters the caller did not supply)
    Null,
    /// Binary data
    Blob(Vec<u8>),
    /// JSON value
    JSON(JsonValue),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Render the value as JSON, the shape records take when exported or replayed.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            RowValues::Int(i) => JsonValue::from(*i),
            RowValues::Float(f) => JsonValue::from(*f),
            RowValues::Bool(b) => JsonValue::Bool(*b),
            RowValues::Timestamp(ts) => {
                JsonValue::String(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string())
            }
            RowValues::Text(s) => JsonValue::String(s.clone()),
            RowValues::Null => JsonValue::Null,
            RowValues::Blob(bytes) => {
                JsonValue::Array(bytes.iter().map(|b| JsonValue::from(*b)).collect())
            }
            RowValues::JSON(value) => value.clone(),
        }
    }
}

impl From<JsonValue> for RowValues {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => RowValues::Null,
            JsonValue::Bool(b) => RowValues::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => RowValues::Int(i),
                None => RowValues::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => RowValues::Text(s),
            other => RowValues::JSON(other),
        }
    }
}

/// Which record-store collection a statement is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionMode {
    /// Every statement targets the single implicit `store` collection, whatever table it names.
    Fixed,
    /// Each statement targets the collection named by its `FROM`/`INTO`/`UPDATE` clause.
    #[default]
    PerStatement,
}

/// Name of the implicit collection used in [`CollectionMode::Fixed`].
pub const FIXED_COLLECTION: &str = "store";
