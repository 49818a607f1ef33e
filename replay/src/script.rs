use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use websql_middleware::prelude::*;

/// A replay script: one database and the transactions to run against it, in order.
#[derive(Debug, Deserialize)]
pub(crate) struct Script {
    pub(crate) database: String,
    #[serde(default)]
    pub(crate) version: String,
    #[serde(default)]
    pub(crate) transactions: Vec<ScriptTransaction>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScriptTransaction {
    pub(crate) statements: Vec<ScriptStatement>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ScriptStatement {
    pub(crate) sql: String,
    #[serde(default)]
    pub(crate) params: Vec<JsonValue>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatementReport {
    pub(crate) sql: String,
    pub(crate) outcome: JsonValue,
}

#[derive(Debug, Serialize)]
pub(crate) struct TransactionReport {
    pub(crate) index: usize,
    pub(crate) committed: bool,
    pub(crate) error: Option<String>,
    pub(crate) statements: Vec<StatementReport>,
}

pub(crate) fn load(path: &Path) -> io::Result<Script> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

/// Run every transaction of `script` on `db`, one after the other.
pub(crate) async fn replay(db: &DatabaseHandle, script: &Script) -> Vec<TransactionReport> {
    let mut reports = Vec::with_capacity(script.transactions.len());
    for (index, transaction) in script.transactions.iter().enumerate() {
        reports.push(replay_transaction(db, index, transaction).await);
    }
    reports
}

async fn replay_transaction(
    db: &DatabaseHandle,
    index: usize,
    transaction: &ScriptTransaction,
) -> TransactionReport {
    let outcomes: Arc<Mutex<Vec<StatementReport>>> = Arc::default();
    let statements = transaction.statements.clone();
    let sink = Arc::clone(&outcomes);

    let result = db
        .run_transaction(
            move |tx| {
                for statement in statements {
                    let params: Vec<RowValues> =
                        statement.params.into_iter().map(RowValues::from).collect();
                    tx.execute_sql(&statement.sql, &params, report_to(&sink, &statement.sql));
                }
            },
            TransactionCallbacks::new(),
        )
        .await;

    match &result {
        Ok(()) => tracing::info!(transaction = index, "committed"),
        Err(err) => tracing::warn!(transaction = index, error = %err, "transaction failed"),
    }

    let statements = std::mem::take(&mut *outcomes.lock().unwrap_or_else(PoisonError::into_inner));
    TransactionReport {
        index,
        committed: result.is_ok(),
        error: result.err().map(|err| err.to_string()),
        statements,
    }
}

fn report_to(sink: &Arc<Mutex<Vec<StatementReport>>>, sql: &str) -> StatementCallbacks {
    let on_success = (Arc::clone(sink), sql.to_string());
    let on_error = (Arc::clone(sink), sql.to_string());
    StatementCallbacks::new()
        .on_success(move |_tx, result| {
            let (sink, sql) = on_success;
            record(&sink, sql, result.to_json());
        })
        .on_error(move |_tx, err| {
            let (sink, sql) = on_error;
            tracing::warn!(sql = %sql, error = %err, "statement failed");
            record(&sink, sql, serde_json::json!({ "error": err.to_string() }));
        })
}

fn record(sink: &Mutex<Vec<StatementReport>>, sql: String, outcome: JsonValue) {
    let mut reports = sink.lock().unwrap_or_else(PoisonError::into_inner);
    reports.push(StatementReport { sql, outcome });
}
