use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::error::WebSqlError;
use crate::store::{
    SchemaUpgrade, StorageConnection, StorageEngine, StorageError, StorageTransaction,
    TransactionMode, UpgradeCallback,
};
use crate::transaction::{SqlTransaction, TransactionCallbacks, driver};
use crate::types::{CollectionMode, FIXED_COLLECTION};

use super::config::{DatabaseOptions, DatabaseOptionsBuilder, parse_version};
use super::state::{HandleEvent, HandleState, StateCell};

struct HandleInner {
    options: DatabaseOptions,
    engine: Arc<dyn StorageEngine>,
    state: StateCell,
    /// Serialises opening storage transactions with the re-opens that create collections.
    schema_lock: Mutex<()>,
    runtime: Option<Handle>,
    next_tx_id: AtomicU64,
}

/// A legacy database handle over one logical database of the record-store engine.
///
/// Cloning is cheap; clones share the connection and its readiness state.
#[derive(Clone)]
pub struct DatabaseHandle {
    inner: Arc<HandleInner>,
}

impl std::fmt::Debug for DatabaseHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseHandle")
            .field("name", &self.inner.options.name)
            .field("mode", &self.inner.options.collection_mode)
            .field("state", &self.inner.state.snapshot())
            .finish_non_exhaustive()
    }
}

impl DatabaseHandle {
    #[must_use]
    pub fn builder(name: impl Into<String>) -> DatabaseOptionsBuilder {
        DatabaseOptionsBuilder::new(name)
    }

    /// Start opening `options.name` on `engine` and return at once.
    ///
    /// Initialization runs on the current Tokio runtime. Without one the handle is created in
    /// the `Errored` state and every transaction reports a `ConfigError`.
    #[must_use]
    pub fn open(engine: Arc<dyn StorageEngine>, options: DatabaseOptions) -> Self {
        let runtime = Handle::try_current().ok();
        let handle = Self {
            inner: Arc::new(HandleInner {
                options,
                engine,
                state: StateCell::new(),
                schema_lock: Mutex::new(()),
                runtime,
                next_tx_id: AtomicU64::new(1),
            }),
        };

        match &handle.inner.runtime {
            Some(runtime) => {
                let inner = Arc::clone(&handle.inner);
                runtime.spawn(async move { inner.initialize().await });
            }
            None => {
                let err = WebSqlError::ConfigError(
                    "opening a database requires a Tokio runtime".to_string(),
                );
                error!(database = %handle.inner.options.name, error = %err, "database initialization failed");
                handle.inner.state.fire(HandleEvent::Failed(err));
            }
        }
        handle
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.options.name
    }

    #[must_use]
    pub fn options(&self) -> &DatabaseOptions {
        &self.inner.options
    }

    #[must_use]
    pub fn collection_mode(&self) -> CollectionMode {
        self.inner.options.collection_mode
    }

    /// Snapshot of the handle's lifecycle state.
    #[must_use]
    pub fn state(&self) -> HandleState {
        self.inner.state.snapshot()
    }

    /// Wait for initialization to finish.
    ///
    /// # Errors
    /// Returns the initialization error when the handle ended up `Errored`.
    pub async fn ready(&self) -> Result<(), WebSqlError> {
        self.connection().await.map(|_| ())
    }

    /// Run `setup` in a new transaction and return immediately.
    ///
    /// The setup callback, statement callbacks and exactly one of the transaction callbacks
    /// run later on the handle's runtime.
    pub fn transaction(
        &self,
        setup: impl FnOnce(&SqlTransaction) + Send + 'static,
        callbacks: TransactionCallbacks,
    ) {
        let Some(runtime) = self.inner.runtime.clone() else {
            // No runtime to drive anything; only the error callback can be honoured.
            callbacks.fail(&WebSqlError::ConfigError(
                "opening a database requires a Tokio runtime".to_string(),
            ));
            return;
        };
        let handle = self.clone();
        runtime.spawn(async move {
            let _ = handle.run_transaction(setup, callbacks).await;
        });
    }

    /// Awaitable form of [`DatabaseHandle::transaction`]; resolves after the transaction's
    /// success or error callback has run.
    ///
    /// # Errors
    /// Returns the error handed to the transaction error callback: the initialization error,
    /// or a `TransactionError` when the storage transaction could not be opened or committed.
    pub async fn run_transaction(
        &self,
        setup: impl FnOnce(&SqlTransaction) + Send + 'static,
        callbacks: TransactionCallbacks,
    ) -> Result<(), WebSqlError> {
        driver::run(self, Box::new(setup), callbacks).await
    }

    pub(crate) fn next_transaction_id(&self) -> u64 {
        self.inner.next_tx_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn connection(&self) -> Result<Arc<dyn StorageConnection>, WebSqlError> {
        match self.inner.state.settled().await {
            HandleState::Ready(conn) => Ok(conn),
            HandleState::Errored(err) => Err(err),
            state => Err(WebSqlError::ConfigError(format!(
                "database handle settled in unexpected state {state:?}"
            ))),
        }
    }

    /// Open a read-write storage transaction covering `needed`, creating missing collections
    /// first.
    pub(crate) async fn begin_storage_transaction(
        &self,
        needed: &BTreeSet<String>,
    ) -> Result<Arc<dyn StorageTransaction>, WebSqlError> {
        let _guard = self.inner.schema_lock.lock().await;
        let mut conn = self.connection().await?;

        let mode = self.collection_mode();
        let needed: BTreeSet<String> = match mode {
            CollectionMode::Fixed => BTreeSet::from([FIXED_COLLECTION.to_string()]),
            CollectionMode::PerStatement => needed.clone(),
        };
        let existing: BTreeSet<String> = conn.collection_names().into_iter().collect();
        let missing: Vec<String> = needed.difference(&existing).cloned().collect();
        if !missing.is_empty() {
            conn = self.add_collections(conn, missing).await?;
        }

        let scope = match mode {
            CollectionMode::Fixed => vec![FIXED_COLLECTION.to_string()],
            CollectionMode::PerStatement => conn.collection_names(),
        };
        conn.transaction(&scope, TransactionMode::ReadWrite)
            .await
            .map_err(WebSqlError::TransactionError)
    }

    /// Re-open the database one version higher and create `missing` in that upgrade.
    async fn add_collections(
        &self,
        conn: Arc<dyn StorageConnection>,
        missing: Vec<String>,
    ) -> Result<Arc<dyn StorageConnection>, WebSqlError> {
        let Some(next_version) = conn.version().checked_add(1) else {
            return Err(WebSqlError::ConfigError(format!(
                "database {} cannot be upgraded past version {}",
                self.name(),
                conn.version()
            )));
        };
        info!(
            database = %self.name(),
            version = next_version,
            collections = ?missing,
            "creating collections"
        );

        conn.close();
        drop(conn);
        self.inner.state.fire(HandleEvent::Reopening);

        match self.inner.open_connection(Some(next_version), missing).await {
            Ok(conn) => {
                self.inner.state.fire(HandleEvent::Opened(Arc::clone(&conn)));
                Ok(conn)
            }
            Err(source) => {
                warn!(database = %self.name(), error = %source, "collection upgrade failed");
                // Fall back to the stored version so later transactions still work.
                match self.inner.open_connection(None, Vec::new()).await {
                    Ok(conn) => self.inner.state.fire(HandleEvent::Opened(conn)),
                    Err(reopen) => {
                        error!(database = %self.name(), error = %reopen, "database re-open failed");
                        self.inner
                            .state
                            .fire(HandleEvent::Failed(WebSqlError::Init(reopen)));
                    }
                }
                Err(WebSqlError::TransactionError(source))
            }
        }
    }
}

impl HandleInner {
    async fn initialize(&self) {
        let outcome = match parse_version(&self.options.version) {
            Ok(version) => {
                let create = match self.options.collection_mode {
                    CollectionMode::Fixed => vec![FIXED_COLLECTION.to_string()],
                    CollectionMode::PerStatement => self.options.collections.clone(),
                };
                self.open_connection(version, create)
                    .await
                    .map_err(WebSqlError::Init)
            }
            Err(err) => Err(err),
        };

        match outcome {
            Ok(conn) => {
                info!(
                    database = %self.options.name,
                    version = conn.version(),
                    "database ready"
                );
                self.state.fire(HandleEvent::Opened(conn));
            }
            Err(err) => {
                error!(database = %self.options.name, error = %err, "database initialization failed");
                self.state.fire(HandleEvent::Failed(err));
            }
        }
    }

    async fn open_connection(
        &self,
        version: Option<u32>,
        create: Vec<String>,
    ) -> Result<Arc<dyn StorageConnection>, StorageError> {
        let state = self.state.clone();
        let on_upgrade: UpgradeCallback = Box::new(move |upgrade: &mut dyn SchemaUpgrade| {
            state.fire(HandleEvent::UpgradeNeeded {
                old_version: upgrade.old_version(),
                new_version: upgrade.new_version(),
            });
            for name in &create {
                if !upgrade.contains_collection(name) {
                    upgrade.create_collection(name)?;
                }
            }
            Ok(())
        });
        self.engine
            .open(&self.options.name, version, on_upgrade)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Fault, MemoryEngine, StorageErrorKind};

    fn engine() -> (MemoryEngine, Arc<dyn StorageEngine>) {
        let memory = MemoryEngine::new().unwrap();
        let shared: Arc<dyn StorageEngine> = Arc::new(memory.clone());
        (memory, shared)
    }

    #[tokio::test]
    async fn fixed_mode_creates_store_on_first_open() {
        let (memory, engine) = engine();
        let handle = DatabaseHandle::builder("fixed")
            .version("1")
            .collection_mode(CollectionMode::Fixed)
            .open(engine);
        handle.ready().await.unwrap();

        let HandleState::Ready(conn) = handle.state() else {
            panic!("handle not ready: {:?}", handle.state());
        };
        assert_eq!(conn.version(), 1);
        assert_eq!(conn.collection_names(), vec![FIXED_COLLECTION.to_string()]);
        assert!(memory.export_json("fixed").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn non_numeric_version_errors_the_handle() {
        let (_memory, engine) = engine();
        let handle = DatabaseHandle::builder("bad").version("latest").open(engine);
        let err = handle.ready().await.unwrap_err();
        assert!(matches!(err, WebSqlError::ConfigError(_)));
        assert!(matches!(handle.state(), HandleState::Errored(_)));
    }

    #[tokio::test]
    async fn open_fault_is_an_init_error() {
        let (memory, engine) = engine();
        memory.inject_fault(Fault::Open).unwrap();
        let handle = DatabaseHandle::builder("faulty").open(engine);
        let err = handle.ready().await.unwrap_err();
        assert_eq!(
            err.storage_cause().map(|e| e.kind),
            Some(StorageErrorKind::Unknown)
        );
    }

    #[tokio::test]
    async fn missing_collections_are_created_one_version_up() {
        let (_memory, engine) = engine();
        let handle = DatabaseHandle::builder("lazy").version("1").open(engine);
        handle.ready().await.unwrap();

        let needed = BTreeSet::from(["notes".to_string()]);
        let tx = handle.begin_storage_transaction(&needed).await.unwrap();
        tx.commit().await.unwrap();

        let HandleState::Ready(conn) = handle.state() else {
            panic!("handle not ready: {:?}", handle.state());
        };
        assert_eq!(conn.version(), 2);
        assert_eq!(conn.collection_names(), vec!["notes".to_string()]);
    }

    #[test]
    fn without_runtime_the_handle_is_errored() {
        let (_memory, engine) = engine();
        let handle = DatabaseHandle::builder("offline").open(engine);
        assert!(matches!(
            handle.state(),
            HandleState::Errored(WebSqlError::ConfigError(_))
        ));
    }
}
