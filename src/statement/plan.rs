use crate::error::WebSqlError;
use crate::results::FieldMap;
use crate::store::RecordKey;
use crate::types::{CollectionMode, FIXED_COLLECTION, RowValues};

use super::classify::{StatementKind, classify};
use super::extract::{extract_delete_key, extract_insert, extract_update, resolve_table};

/// A classified statement with its collection and payload resolved, ready to run.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementPlan {
    Insert {
        collection: String,
        values: FieldMap,
    },
    Select {
        collection: String,
    },
    Update {
        collection: String,
        key: RecordKey,
        updates: FieldMap,
    },
    Delete {
        collection: String,
        key: RecordKey,
    },
}

impl StatementPlan {
    #[must_use]
    pub fn kind(&self) -> StatementKind {
        match self {
            StatementPlan::Insert { .. } => StatementKind::Insert,
            StatementPlan::Select { .. } => StatementKind::Select,
            StatementPlan::Update { .. } => StatementKind::Update,
            StatementPlan::Delete { .. } => StatementKind::Delete,
        }
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        match self {
            StatementPlan::Insert { collection, .. }
            | StatementPlan::Select { collection }
            | StatementPlan::Update { collection, .. }
            | StatementPlan::Delete { collection, .. } => collection,
        }
    }
}

/// Classify `sql`, resolve its collection under `mode`, and extract its payload from `params`.
///
/// # Errors
/// Returns `InvalidCommand` for unrecognized statements, `MissingTable` when per-statement
/// mode cannot find a collection name, `MissingId` when an UPDATE/DELETE key is absent or
/// NULL, and `ParameterError` when the key is not an integer.
pub fn plan(
    sql: &str,
    params: &[RowValues],
    mode: CollectionMode,
) -> Result<StatementPlan, WebSqlError> {
    let kind = classify(sql);
    if kind == StatementKind::Unrecognized {
        return Err(WebSqlError::InvalidCommand(sql.trim().to_string()));
    }

    let collection = match mode {
        CollectionMode::Fixed => FIXED_COLLECTION.to_string(),
        CollectionMode::PerStatement => {
            resolve_table(sql).ok_or_else(|| WebSqlError::MissingTable(sql.trim().to_string()))?
        }
    };

    let plan = match kind {
        StatementKind::Insert => StatementPlan::Insert {
            collection,
            values: extract_insert(sql, params),
        },
        StatementKind::Select => StatementPlan::Select { collection },
        StatementKind::Update => {
            let clause = extract_update(sql, params);
            StatementPlan::Update {
                collection,
                key: record_key(clause.id, kind)?,
                updates: clause.updates,
            }
        }
        StatementKind::Delete => StatementPlan::Delete {
            collection,
            key: record_key(extract_delete_key(sql, params), kind)?,
        },
        StatementKind::Unrecognized => {
            return Err(WebSqlError::InvalidCommand(sql.trim().to_string()));
        }
    };
    Ok(plan)
}

/// Convert a key parameter into a record key.
///
/// Integers, integral floats and integer text are accepted.
///
/// # Errors
/// `MissingId` when the key is absent or NULL, `ParameterError` for any other value.
pub fn record_key(value: Option<RowValues>, kind: StatementKind) -> Result<RecordKey, WebSqlError> {
    match value {
        None | Some(RowValues::Null) => Err(WebSqlError::MissingId { kind }),
        Some(RowValues::Int(key)) => Ok(key),
        #[allow(clippy::cast_possible_truncation)]
        Some(RowValues::Float(f)) if f.fract() == 0.0 && f.is_finite() => Ok(f as RecordKey),
        Some(RowValues::Text(text)) => text.trim().parse::<RecordKey>().map_err(|_| {
            WebSqlError::ParameterError(format!("{kind} key {text:?} is not an integer"))
        }),
        Some(other) => Err(WebSqlError::ParameterError(format!(
            "{kind} key {other:?} is not an integer"
        ))),
    }
}
