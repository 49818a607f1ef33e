//! Installing the legacy `openDatabase`-style factory into an explicit registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::database::{DatabaseHandle, DatabaseOptions};
use crate::store::StorageEngine;
use crate::types::CollectionMode;

/// Legacy factory signature: `(name, version, display_name, estimated_size)`.
pub type OpenDatabaseFactory = Arc<dyn Fn(&str, &str, &str, u64) -> DatabaseHandle + Send + Sync>;

/// The environment the legacy factory is installed into.
#[derive(Clone, Default)]
pub struct Registry {
    open_database: Option<OpenDatabaseFactory>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("open_database", &self.open_database.is_some())
            .finish()
    }
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn has_open_database(&self) -> bool {
        self.open_database.is_some()
    }

    /// Replace the factory slot unconditionally.
    pub fn set_open_database(&mut self, factory: OpenDatabaseFactory) {
        self.open_database = Some(factory);
    }

    /// Call the installed factory, if any.
    #[must_use]
    pub fn open_database(
        &self,
        name: &str,
        version: &str,
        display_name: &str,
        estimated_size: u64,
    ) -> Option<DatabaseHandle> {
        self.open_database
            .as_ref()
            .map(|factory| factory(name, version, display_name, estimated_size))
    }
}

/// Install a factory backed by `engine` unless `registry` already has one.
///
/// Returns whether a factory was installed. Handles are memoized per database name for as
/// long as the installed factory lives, so later calls ignore their version and labels.
pub fn install(registry: &mut Registry, engine: Arc<dyn StorageEngine>) -> bool {
    install_with_mode(registry, engine, CollectionMode::default())
}

/// [`install`] with an explicit collection mode for every handle the factory opens.
pub fn install_with_mode(
    registry: &mut Registry,
    engine: Arc<dyn StorageEngine>,
    mode: CollectionMode,
) -> bool {
    if registry.has_open_database() {
        tracing::debug!("open_database already present; leaving it in place");
        return false;
    }

    let handles: Mutex<HashMap<String, DatabaseHandle>> = Mutex::new(HashMap::new());
    let factory: OpenDatabaseFactory = Arc::new(
        move |name: &str, version: &str, display_name: &str, estimated_size: u64| {
            let mut handles = match handles.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            handles
                .entry(name.to_string())
                .or_insert_with(|| {
                    let mut options = DatabaseOptions::new(name)
                        .with_version(version)
                        .with_collection_mode(mode);
                    options.display_name = display_name.to_string();
                    options.estimated_size = estimated_size;
                    DatabaseHandle::open(Arc::clone(&engine), options)
                })
                .clone()
        },
    );
    registry.set_open_database(factory);
    tracing::info!(mode = ?mode, "installed open_database");
    true
}
