//! In-memory record-store engine.
//!
//! All databases live on a dedicated worker thread that processes commands in arrival
//! order, so requests from concurrent transactions are serialised the way a browser
//! engine serialises them per collection. Requests apply immediately; there is no
//! rollback of earlier requests when a later one fails.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::results::Record;
use crate::store::{
    RecordKey, StorageConnection, StorageEngine, StorageError, StorageTransaction,
    TransactionMode, UpgradeCallback,
};

mod channel;
mod dispatcher;
mod worker;

use channel::Command;
use worker::MemoryWorker;

/// Request kinds, used to target injected faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Add,
    GetAll,
    Get,
    Put,
    Delete,
}

impl RequestKind {
    #[must_use]
    pub fn is_write(self) -> bool {
        matches!(self, RequestKind::Add | RequestKind::Put | RequestKind::Delete)
    }
}

/// A one-shot failure: the next matching operation fails with `UnknownError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    Open,
    Request(RequestKind),
    Commit,
}

/// Cloneable handle to an in-memory engine; clones share the same databases.
#[derive(Clone)]
pub struct MemoryEngine {
    worker: Arc<MemoryWorker>,
}

impl std::fmt::Debug for MemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEngine").finish_non_exhaustive()
    }
}

impl MemoryEngine {
    /// Start an empty engine.
    ///
    /// # Errors
    /// Returns `StorageError` if the engine thread cannot be spawned.
    pub fn new() -> Result<Self, StorageError> {
        Ok(Self {
            worker: Arc::new(MemoryWorker::spawn()?),
        })
    }

    /// Make the next operation matching `fault` fail.
    ///
    /// # Errors
    /// Returns `StorageError` if the engine thread has stopped.
    pub fn inject_fault(&self, fault: Fault) -> Result<(), StorageError> {
        self.worker.send_command(Command::InjectFault { fault })
    }

    /// Snapshot a database as `{ name, version, collections: { name: [records] } }`.
    ///
    /// # Errors
    /// Returns `StorageError` if the engine thread has stopped.
    pub async fn export_json(&self, name: &str) -> Result<Option<JsonValue>, StorageError> {
        let name = name.to_string();
        self.worker
            .request(
                |respond_to| Command::Export { name, respond_to },
                "memory engine dropped while exporting",
            )
            .await
    }
}

#[async_trait]
impl StorageEngine for MemoryEngine {
    async fn open(
        &self,
        name: &str,
        version: Option<u32>,
        on_upgrade: UpgradeCallback,
    ) -> Result<Arc<dyn StorageConnection>, StorageError> {
        let db_name = name.to_string();
        let opened = self
            .worker
            .request(
                |respond_to| Command::Open {
                    name: db_name,
                    version,
                    on_upgrade,
                    respond_to,
                },
                "memory engine dropped while opening database",
            )
            .await?;
        Ok(Arc::new(MemoryConnection {
            worker: Arc::clone(&self.worker),
            conn_id: opened.conn_id,
            name: name.to_string(),
            version: opened.version,
            collections: opened.collections,
            closed: AtomicBool::new(false),
        }))
    }
}

pub struct MemoryConnection {
    worker: Arc<MemoryWorker>,
    conn_id: u64,
    name: String,
    version: u32,
    collections: Vec<String>,
    closed: AtomicBool,
}

#[async_trait]
impl StorageConnection for MemoryConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn collection_names(&self) -> Vec<String> {
        self.collections.clone()
    }

    async fn transaction(
        &self,
        scope: &[String],
        mode: TransactionMode,
    ) -> Result<Arc<dyn StorageTransaction>, StorageError> {
        let conn_id = self.conn_id;
        let scope = scope.to_vec();
        let tx_id = self
            .worker
            .request(
                |respond_to| Command::Begin {
                    conn_id,
                    scope,
                    mode,
                    respond_to,
                },
                "memory engine dropped while starting transaction",
            )
            .await?;
        Ok(Arc::new(MemoryTransaction {
            worker: Arc::clone(&self.worker),
            tx_id,
            finished: AtomicBool::new(false),
        }))
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.worker.notify(Command::Close {
                conn_id: self.conn_id,
            });
        }
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.close();
    }
}

pub struct MemoryTransaction {
    worker: Arc<MemoryWorker>,
    tx_id: u64,
    finished: AtomicBool,
}

#[async_trait]
impl StorageTransaction for MemoryTransaction {
    async fn add(&self, collection: &str, record: Record) -> Result<RecordKey, StorageError> {
        let (tx_id, collection) = (self.tx_id, collection.to_string());
        self.worker
            .request(
                |respond_to| Command::Add {
                    tx_id,
                    collection,
                    record,
                    respond_to,
                },
                "memory engine dropped while adding record",
            )
            .await
    }

    async fn get_all(&self, collection: &str) -> Result<Vec<Record>, StorageError> {
        let (tx_id, collection) = (self.tx_id, collection.to_string());
        self.worker
            .request(
                |respond_to| Command::GetAll {
                    tx_id,
                    collection,
                    respond_to,
                },
                "memory engine dropped while reading records",
            )
            .await
    }

    async fn get(&self, collection: &str, key: RecordKey) -> Result<Option<Record>, StorageError> {
        let (tx_id, collection) = (self.tx_id, collection.to_string());
        self.worker
            .request(
                |respond_to| Command::Get {
                    tx_id,
                    collection,
                    key,
                    respond_to,
                },
                "memory engine dropped while reading record",
            )
            .await
    }

    async fn put(&self, collection: &str, record: Record) -> Result<RecordKey, StorageError> {
        let (tx_id, collection) = (self.tx_id, collection.to_string());
        self.worker
            .request(
                |respond_to| Command::Put {
                    tx_id,
                    collection,
                    record,
                    respond_to,
                },
                "memory engine dropped while writing record",
            )
            .await
    }

    async fn delete(&self, collection: &str, key: RecordKey) -> Result<(), StorageError> {
        let (tx_id, collection) = (self.tx_id, collection.to_string());
        self.worker
            .request(
                |respond_to| Command::Delete {
                    tx_id,
                    collection,
                    key,
                    respond_to,
                },
                "memory engine dropped while deleting record",
            )
            .await
    }

    async fn commit(&self) -> Result<(), StorageError> {
        self.finished.store(true, Ordering::SeqCst);
        let tx_id = self.tx_id;
        self.worker
            .request(
                |respond_to| Command::Commit { tx_id, respond_to },
                "memory engine dropped while committing",
            )
            .await
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if !self.finished.load(Ordering::SeqCst) {
            self.worker.notify(Command::Abort { tx_id: self.tx_id });
        }
    }
}
