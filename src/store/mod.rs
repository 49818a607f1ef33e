//! The async record-store engine the adapter runs on.
//!
//! The traits model an IndexedDB-style engine: databases opened by name and integer
//! version with an upgrade hook, collections keyed by an auto-incrementing `id`, and
//! transactions whose requests each settle exactly once. [`MemoryEngine`] is the
//! bundled implementation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::results::Record;

mod error;
pub mod memory;

pub use error::{StorageError, StorageErrorKind};
pub use memory::{Fault, MemoryEngine, RequestKind};

/// Primary key of a record; always stored in the record's `id` field.
pub type RecordKey = i64;

/// Field name every collection uses as its key path.
pub const KEY_PATH: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    ReadOnly,
    ReadWrite,
}

/// Schema changes allowed while a database is being upgraded.
pub trait SchemaUpgrade {
    fn old_version(&self) -> u32;

    fn new_version(&self) -> u32;

    fn contains_collection(&self, name: &str) -> bool;

    /// Create a collection keyed by an auto-incrementing `id`.
    ///
    /// # Errors
    /// Returns a `ConstraintError` if the collection already exists.
    fn create_collection(&mut self, name: &str) -> Result<(), StorageError>;
}

/// Runs when an open raises the stored version (or creates the database).
pub type UpgradeCallback =
    Box<dyn FnOnce(&mut dyn SchemaUpgrade) -> Result<(), StorageError> + Send>;

#[async_trait]
pub trait StorageEngine: Send + Sync + 'static {
    /// Open `name`, upgrading it first when `version` is newer than the stored one.
    ///
    /// `None` opens at whatever version is stored; a database that does not exist yet is
    /// created at version 1.
    ///
    /// # Errors
    /// Returns `StorageError` if the requested version is older than the stored one, the
    /// upgrade callback fails, or the engine is unavailable.
    async fn open(
        &self,
        name: &str,
        version: Option<u32>,
        on_upgrade: UpgradeCallback,
    ) -> Result<Arc<dyn StorageConnection>, StorageError>;
}

#[async_trait]
pub trait StorageConnection: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> u32;

    /// Collections that existed when this connection was opened.
    fn collection_names(&self) -> Vec<String>;

    /// # Errors
    /// Returns `StorageError` if `scope` is empty or names a missing collection.
    async fn transaction(
        &self,
        scope: &[String],
        mode: TransactionMode,
    ) -> Result<Arc<dyn StorageTransaction>, StorageError>;

    fn close(&self);
}

/// One engine transaction. Each request resolves exactly once.
#[async_trait]
pub trait StorageTransaction: Send + Sync {
    async fn add(&self, collection: &str, record: Record) -> Result<RecordKey, StorageError>;

    async fn get_all(&self, collection: &str) -> Result<Vec<Record>, StorageError>;

    async fn get(&self, collection: &str, key: RecordKey) -> Result<Option<Record>, StorageError>;

    async fn put(&self, collection: &str, record: Record) -> Result<RecordKey, StorageError>;

    async fn delete(&self, collection: &str, key: RecordKey) -> Result<(), StorageError>;

    /// Complete the transaction once every request has settled.
    async fn commit(&self) -> Result<(), StorageError>;
}
