use serde_json::Value as JsonValue;
use tokio::sync::oneshot;

use crate::results::Record;
use crate::store::{RecordKey, StorageError, TransactionMode, UpgradeCallback};

use super::Fault;

pub(super) type Reply<T> = oneshot::Sender<Result<T, StorageError>>;

/// What the worker hands back for a successful open.
#[derive(Debug)]
pub(super) struct OpenedDatabase {
    pub(super) conn_id: u64,
    pub(super) version: u32,
    pub(super) collections: Vec<String>,
}

pub(super) enum Command {
    Open {
        name: String,
        version: Option<u32>,
        on_upgrade: UpgradeCallback,
        respond_to: Reply<OpenedDatabase>,
    },
    Close {
        conn_id: u64,
    },
    Begin {
        conn_id: u64,
        scope: Vec<String>,
        mode: TransactionMode,
        respond_to: Reply<u64>,
    },
    Add {
        tx_id: u64,
        collection: String,
        record: Record,
        respond_to: Reply<RecordKey>,
    },
    GetAll {
        tx_id: u64,
        collection: String,
        respond_to: Reply<Vec<Record>>,
    },
    Get {
        tx_id: u64,
        collection: String,
        key: RecordKey,
        respond_to: Reply<Option<Record>>,
    },
    Put {
        tx_id: u64,
        collection: String,
        record: Record,
        respond_to: Reply<RecordKey>,
    },
    Delete {
        tx_id: u64,
        collection: String,
        key: RecordKey,
        respond_to: Reply<()>,
    },
    Commit {
        tx_id: u64,
        respond_to: Reply<()>,
    },
    Abort {
        tx_id: u64,
    },
    InjectFault {
        fault: Fault,
    },
    Export {
        name: String,
        respond_to: Reply<Option<JsonValue>>,
    },
    Shutdown,
}
