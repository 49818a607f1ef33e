//! Maps one planned statement onto record-store requests.
//!
//! Every call settles exactly once: `Ok` with the result set the legacy API promises, or
//! `Err` carrying the storage error as its source. `rows_affected` is reported as 1 for
//! UPDATE and DELETE whether or not the key existed.

use crate::error::WebSqlError;
use crate::results::{Record, ResultSet};
use crate::statement::StatementPlan;
use crate::store::{KEY_PATH, StorageError, StorageTransaction};
use crate::types::RowValues;

/// Run `plan` against `tx`.
///
/// # Errors
/// Returns `WebSqlError::Storage` with the engine's error when any request fails. For UPDATE
/// that can be either the read or the write-back.
pub async fn execute_plan(
    tx: &dyn StorageTransaction,
    plan: StatementPlan,
) -> Result<ResultSet, WebSqlError> {
    let kind = plan.kind();
    let storage = |source: StorageError| WebSqlError::storage(kind, source);

    match plan {
        StatementPlan::Insert { collection, values } => {
            let key = tx.add(&collection, Record::from(values)).await.map_err(storage)?;
            Ok(ResultSet::inserted(key))
        }
        StatementPlan::Select { collection } => {
            let rows = tx.get_all(&collection).await.map_err(storage)?;
            Ok(ResultSet::with_rows(rows))
        }
        StatementPlan::Update {
            collection,
            key,
            updates,
        } => {
            // A missing record still gets written: the merge starts from an empty record
            // carrying the requested key.
            let mut record = tx
                .get(&collection, key)
                .await
                .map_err(storage)?
                .unwrap_or_else(|| [(KEY_PATH, RowValues::Int(key))].into_iter().collect());
            record.merge(&updates);
            tx.put(&collection, record).await.map_err(storage)?;
            Ok(ResultSet::affected(1))
        }
        StatementPlan::Delete { collection, key } => {
            tx.delete(&collection, key).await.map_err(storage)?;
            Ok(ResultSet::affected(1))
        }
    }
}
