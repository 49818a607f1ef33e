use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::store::{KEY_PATH, RecordKey};
use crate::types::RowValues;

/// Field/value mapping parsed out of a statement.
pub type FieldMap = BTreeMap<String, RowValues>;

/// A stored record: an untyped field/value mapping whose `id` field is its key.
///
/// Records returned by a SELECT carry the `id` assigned by the store alongside the
/// fields written by INSERT/UPDATE statements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: FieldMap,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a field by name
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&RowValues> {
        self.fields.get(field)
    }

    /// Set a field, returning the previous value if there was one.
    pub fn set(&mut self, field: impl Into<String>, value: RowValues) -> Option<RowValues> {
        self.fields.insert(field.into(), value)
    }

    /// Key of this record, if its `id` field holds an integer.
    #[must_use]
    pub fn id(&self) -> Option<RecordKey> {
        self.fields.get(KEY_PATH).and_then(RowValues::as_int).copied()
    }

    /// Assign every field in `updates` onto this record; fields not named are kept.
    pub fn merge(&mut self, updates: &FieldMap) {
        for (field, value) in updates {
            self.fields.insert(field.clone(), value.clone());
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.fields
                .iter()
                .map(|(field, value)| (field.clone(), value.to_json()))
                .collect(),
        )
    }
}

impl From<FieldMap> for Record {
    fn from(fields: FieldMap) -> Self {
        Self { fields }
    }
}

impl<K: Into<String>> FromIterator<(K, RowValues)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, RowValues)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
