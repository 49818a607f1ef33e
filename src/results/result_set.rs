use std::sync::Arc;

use serde_json::{Value as JsonValue, json};

use super::record::Record;
use crate::store::RecordKey;

/// Indexable row list handed to SELECT callbacks.
///
/// Rows are shared, so cloning a `RowList` (or the result set holding it) is cheap.
#[derive(Debug, Clone, Default)]
pub struct RowList {
    rows: Arc<Vec<Record>>,
}

impl RowList {
    #[must_use]
    pub fn new(rows: Vec<Record>) -> Self {
        Self {
            rows: Arc::new(rows),
        }
    }

    /// Number of rows
    #[must_use]
    pub fn length(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get the row at `index`, in storage iteration order.
    #[must_use]
    pub fn item(&self, index: usize) -> Option<&Record> {
        self.rows.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a RowList {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// The response passed to a statement's success callback.
///
/// INSERT fills `insert_id`, UPDATE and DELETE fill `rows_affected`, SELECT fills `rows`.
/// The row list is always present and empty for everything except SELECT.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// Key assigned by the store to an inserted record
    pub insert_id: Option<RecordKey>,
    /// Rows reported as changed (not authoritative: always 1 for UPDATE/DELETE)
    pub rows_affected: Option<usize>,
    /// Rows returned by a SELECT
    pub rows: RowList,
}

impl ResultSet {
    #[must_use]
    pub fn inserted(key: RecordKey) -> Self {
        Self {
            insert_id: Some(key),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn affected(rows_affected: usize) -> Self {
        Self {
            rows_affected: Some(rows_affected),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_rows(rows: Vec<Record>) -> Self {
        Self {
            rows: RowList::new(rows),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        json!({
            "insertId": self.insert_id,
            "rowsAffected": self.rows_affected,
            "rows": self.rows.iter().map(Record::to_json).collect::<Vec<_>>(),
        })
    }
}
