use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::mpsc::Receiver;

use serde_json::{Value as JsonValue, json};

use crate::results::Record;
use crate::store::{
    KEY_PATH, RecordKey, SchemaUpgrade, StorageError, StorageErrorKind, TransactionMode,
    UpgradeCallback,
};
use crate::types::RowValues;

use super::channel::{Command, OpenedDatabase};
use super::{Fault, RequestKind};

#[derive(Debug)]
struct Collection {
    records: BTreeMap<RecordKey, Record>,
    next_key: RecordKey,
}

impl Default for Collection {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            next_key: 1,
        }
    }
}

impl Collection {
    fn bump_generator(&mut self, key: RecordKey) {
        if key >= self.next_key {
            self.next_key = key.saturating_add(1);
        }
    }

    fn generate_key(&mut self) -> RecordKey {
        let key = self.next_key;
        self.next_key = self.next_key.saturating_add(1);
        key
    }

    /// Key for a record being written: its explicit `id`, or a generated one stamped into it.
    fn key_for(&mut self, record: &mut Record) -> Result<(RecordKey, bool), StorageError> {
        match record.get(KEY_PATH) {
            None => {
                let key = self.generate_key();
                record.set(KEY_PATH, RowValues::Int(key));
                Ok((key, false))
            }
            Some(RowValues::Int(key)) => Ok((*key, true)),
            Some(other) => Err(StorageError::new(
                StorageErrorKind::Data,
                format!("key path `{KEY_PATH}` holds a non-integer value {other:?}"),
            )),
        }
    }
}

#[derive(Debug, Default)]
struct DatabaseState {
    version: u32,
    collections: BTreeMap<String, Collection>,
}

#[derive(Debug)]
struct ActiveTx {
    database: String,
    scope: Vec<String>,
    mode: TransactionMode,
}

struct Upgrade<'a> {
    old_version: u32,
    new_version: u32,
    existing: BTreeSet<String>,
    created: &'a mut Vec<String>,
}

impl SchemaUpgrade for Upgrade<'_> {
    fn old_version(&self) -> u32 {
        self.old_version
    }

    fn new_version(&self) -> u32 {
        self.new_version
    }

    fn contains_collection(&self, name: &str) -> bool {
        self.existing.contains(name) || self.created.iter().any(|c| c == name)
    }

    fn create_collection(&mut self, name: &str) -> Result<(), StorageError> {
        if self.contains_collection(name) {
            return Err(StorageError::new(
                StorageErrorKind::Constraint,
                format!("collection `{name}` already exists"),
            ));
        }
        self.created.push(name.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct EngineState {
    databases: HashMap<String, DatabaseState>,
    connections: HashMap<u64, String>,
    transactions: HashMap<u64, ActiveTx>,
    faults: Vec<Fault>,
    next_conn_id: u64,
    next_tx_id: u64,
}

pub(super) fn run_memory_worker(receiver: &Receiver<Command>) {
    let mut state = EngineState::default();

    while let Ok(command) = receiver.recv() {
        match command {
            Command::Shutdown => break,
            Command::Open {
                name,
                version,
                on_upgrade,
                respond_to,
            } => {
                let _ = respond_to.send(state.open(&name, version, on_upgrade));
            }
            Command::Close { conn_id } => {
                state.connections.remove(&conn_id);
            }
            Command::Begin {
                conn_id,
                scope,
                mode,
                respond_to,
            } => {
                let _ = respond_to.send(state.begin(conn_id, scope, mode));
            }
            Command::Add {
                tx_id,
                collection,
                record,
                respond_to,
            } => {
                let _ = respond_to.send(state.add(tx_id, &collection, record));
            }
            Command::GetAll {
                tx_id,
                collection,
                respond_to,
            } => {
                let _ = respond_to.send(state.get_all(tx_id, &collection));
            }
            Command::Get {
                tx_id,
                collection,
                key,
                respond_to,
            } => {
                let _ = respond_to.send(state.get(tx_id, &collection, key));
            }
            Command::Put {
                tx_id,
                collection,
                record,
                respond_to,
            } => {
                let _ = respond_to.send(state.put(tx_id, &collection, record));
            }
            Command::Delete {
                tx_id,
                collection,
                key,
                respond_to,
            } => {
                let _ = respond_to.send(state.delete(tx_id, &collection, key));
            }
            Command::Commit { tx_id, respond_to } => {
                let _ = respond_to.send(state.commit(tx_id));
            }
            Command::Abort { tx_id } => {
                state.transactions.remove(&tx_id);
            }
            Command::InjectFault { fault } => state.faults.push(fault),
            Command::Export { name, respond_to } => {
                let _ = respond_to.send(Ok(state.export(&name)));
            }
        }
    }
}

impl EngineState {
    fn take_fault(&mut self, fault: Fault) -> Result<(), StorageError> {
        match self.faults.iter().position(|f| *f == fault) {
            Some(pos) => {
                self.faults.remove(pos);
                Err(StorageError::new(
                    StorageErrorKind::Unknown,
                    format!("injected fault: {fault:?}"),
                ))
            }
            None => Ok(()),
        }
    }

    fn open(
        &mut self,
        name: &str,
        version: Option<u32>,
        on_upgrade: UpgradeCallback,
    ) -> Result<OpenedDatabase, StorageError> {
        self.take_fault(Fault::Open)?;
        if version == Some(0) {
            return Err(StorageError::new(
                StorageErrorKind::Data,
                "version must be a positive integer",
            ));
        }

        let existing = self.databases.get(name);
        let current = existing.map_or(0, |db| db.version);
        let target = version.unwrap_or(current.max(1));
        if target < current {
            return Err(StorageError::new(
                StorageErrorKind::Version,
                format!(
                    "requested version ({target}) is less than the existing version ({current})"
                ),
            ));
        }

        if target > current {
            let existing_names: BTreeSet<String> = existing
                .map(|db| db.collections.keys().cloned().collect())
                .unwrap_or_default();
            let mut created = Vec::new();
            let mut upgrade = Upgrade {
                old_version: current,
                new_version: target,
                existing: existing_names,
                created: &mut created,
            };
            on_upgrade(&mut upgrade).map_err(|err| {
                StorageError::new(
                    StorageErrorKind::Abort,
                    format!("version change to {target} aborted: {err}"),
                )
            })?;

            let db = self.databases.entry(name.to_string()).or_default();
            db.version = target;
            for collection in created {
                db.collections.entry(collection).or_default();
            }
        }

        let conn_id = self.next_conn_id;
        self.next_conn_id = self.next_conn_id.saturating_add(1);
        self.connections.insert(conn_id, name.to_string());

        let db = self.databases.entry(name.to_string()).or_default();
        Ok(OpenedDatabase {
            conn_id,
            version: db.version,
            collections: db.collections.keys().cloned().collect(),
        })
    }

    fn begin(
        &mut self,
        conn_id: u64,
        scope: Vec<String>,
        mode: TransactionMode,
    ) -> Result<u64, StorageError> {
        let Some(database) = self.connections.get(&conn_id).cloned() else {
            return Err(StorageError::new(
                StorageErrorKind::InvalidState,
                "the database connection is closing",
            ));
        };
        if scope.is_empty() {
            return Err(StorageError::new(
                StorageErrorKind::InvalidAccess,
                "transaction scope must name at least one collection",
            ));
        }
        let db = self.databases.get(&database);
        if let Some(missing) = scope
            .iter()
            .find(|name| !db.is_some_and(|db| db.collections.contains_key(*name)))
        {
            return Err(not_found(missing));
        }

        let tx_id = self.next_tx_id;
        self.next_tx_id = self.next_tx_id.saturating_add(1);
        self.transactions.insert(
            tx_id,
            ActiveTx {
                database,
                scope,
                mode,
            },
        );
        Ok(tx_id)
    }

    /// Validate a request against its transaction and resolve the target collection.
    fn collection_for(
        &mut self,
        tx_id: u64,
        collection: &str,
        request: RequestKind,
    ) -> Result<&mut Collection, StorageError> {
        let tx = self.transactions.get(&tx_id).ok_or_else(|| {
            StorageError::new(
                StorageErrorKind::TransactionInactive,
                "the transaction has finished",
            )
        })?;
        if !tx.scope.iter().any(|name| name == collection) {
            return Err(not_found(collection));
        }
        if request.is_write() && tx.mode == TransactionMode::ReadOnly {
            return Err(StorageError::new(
                StorageErrorKind::ReadOnly,
                "the transaction is read-only",
            ));
        }
        let database = tx.database.clone();
        self.take_fault(Fault::Request(request))?;

        self.databases
            .get_mut(&database)
            .and_then(|db| db.collections.get_mut(collection))
            .ok_or_else(|| not_found(collection))
    }

    fn add(&mut self, tx_id: u64, collection: &str, mut record: Record) -> Result<RecordKey, StorageError> {
        let store = self.collection_for(tx_id, collection, RequestKind::Add)?;
        let (key, explicit) = store.key_for(&mut record)?;
        if explicit {
            if store.records.contains_key(&key) {
                return Err(StorageError::new(
                    StorageErrorKind::Constraint,
                    format!("key {key} already exists in `{collection}`"),
                ));
            }
            store.bump_generator(key);
        }
        store.records.insert(key, record);
        Ok(key)
    }

    fn put(&mut self, tx_id: u64, collection: &str, mut record: Record) -> Result<RecordKey, StorageError> {
        let store = self.collection_for(tx_id, collection, RequestKind::Put)?;
        let (key, explicit) = store.key_for(&mut record)?;
        if explicit {
            store.bump_generator(key);
        }
        store.records.insert(key, record);
        Ok(key)
    }

    fn get_all(&mut self, tx_id: u64, collection: &str) -> Result<Vec<Record>, StorageError> {
        let store = self.collection_for(tx_id, collection, RequestKind::GetAll)?;
        Ok(store.records.values().cloned().collect())
    }

    fn get(&mut self, tx_id: u64, collection: &str, key: RecordKey) -> Result<Option<Record>, StorageError> {
        let store = self.collection_for(tx_id, collection, RequestKind::Get)?;
        Ok(store.records.get(&key).cloned())
    }

    fn delete(&mut self, tx_id: u64, collection: &str, key: RecordKey) -> Result<(), StorageError> {
        let store = self.collection_for(tx_id, collection, RequestKind::Delete)?;
        store.records.remove(&key);
        Ok(())
    }

    fn commit(&mut self, tx_id: u64) -> Result<(), StorageError> {
        if self.transactions.remove(&tx_id).is_none() {
            return Err(StorageError::new(
                StorageErrorKind::InvalidState,
                "the transaction has already finished",
            ));
        }
        self.take_fault(Fault::Commit)
    }

    fn export(&self, name: &str) -> Option<JsonValue> {
        let db = self.databases.get(name)?;
        let collections: serde_json::Map<String, JsonValue> = db
            .collections
            .iter()
            .map(|(collection, store)| {
                let records = store.records.values().map(Record::to_json).collect();
                (collection.clone(), JsonValue::Array(records))
            })
            .collect();
        Some(json!({
            "name": name,
            "version": db.version,
            "collections": collections,
        }))
    }
}

fn not_found(collection: &str) -> StorageError {
    StorageError::new(
        StorageErrorKind::NotFound,
        format!("collection `{collection}` was not found"),
    )
}
