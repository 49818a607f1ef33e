#![allow(dead_code)]

use std::sync::Arc;

use tokio::sync::mpsc;
use websql_middleware::prelude::*;

pub type Outcome = Result<ResultSet, WebSqlError>;

pub fn memory_engine() -> (MemoryEngine, Arc<dyn StorageEngine>) {
    let memory = MemoryEngine::new().unwrap();
    let shared: Arc<dyn StorageEngine> = Arc::new(memory.clone());
    (memory, shared)
}

pub async fn open(name: &str, mode: CollectionMode) -> (MemoryEngine, DatabaseHandle) {
    let (memory, engine) = memory_engine();
    let db = DatabaseHandle::builder(name)
        .version("1")
        .collection_mode(mode)
        .open(engine);
    db.ready().await.unwrap();
    (memory, db)
}

/// Callbacks that forward the statement's outcome into `sender`.
pub fn forward(sender: &mpsc::UnboundedSender<Outcome>) -> StatementCallbacks {
    let ok = sender.clone();
    let err = sender.clone();
    StatementCallbacks::new()
        .on_success(move |_tx, result| {
            let _ = ok.send(Ok(result.clone()));
        })
        .on_error(move |_tx, error| {
            let _ = err.send(Err(error.clone()));
        })
}

/// Run one statement in its own transaction and return its outcome.
pub async fn exec(db: &DatabaseHandle, sql: &str, params: Vec<RowValues>) -> Outcome {
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let sql = sql.to_string();
    db.run_transaction(
        move |tx| tx.execute_sql(&sql, &params, forward(&sender)),
        TransactionCallbacks::new(),
    )
    .await
    .unwrap();
    receiver.try_recv().unwrap()
}

pub async fn select_all(db: &DatabaseHandle, table: &str) -> RowList {
    exec(db, &format!("SELECT * FROM {table}"), Vec::new())
        .await
        .unwrap()
        .rows
}

pub fn text(value: &str) -> RowValues {
    RowValues::Text(value.to_string())
}
