//! The `transaction(...)` / `execute_sql(...)` contract on top of one engine transaction.

use tokio::sync::mpsc;

use crate::error::WebSqlError;
use crate::statement::{StatementPlan, plan};
use crate::types::{CollectionMode, RowValues};

mod callbacks;
pub(crate) mod driver;
mod state;

pub use callbacks::{StatementCallbacks, TransactionCallbacks};
pub use state::{TransactionEvent, TransactionState};

/// A statement queued by `execute_sql`, waiting for the driver to run it.
pub(crate) struct QueuedStatement {
    pub(crate) planned: Result<StatementPlan, WebSqlError>,
    pub(crate) callbacks: StatementCallbacks,
}

/// Handle passed to the setup callback and to every statement callback.
///
/// Statements are fire-and-forget: `execute_sql` plans the statement, queues it and
/// returns. Its outcome reaches the statement callbacks once the engine settles the
/// request, always before the transaction's own success or error callback runs.
#[derive(Clone, Debug)]
pub struct SqlTransaction {
    id: u64,
    mode: CollectionMode,
    sender: mpsc::UnboundedSender<QueuedStatement>,
}

impl SqlTransaction {
    pub(crate) fn new(
        id: u64,
        mode: CollectionMode,
        sender: mpsc::UnboundedSender<QueuedStatement>,
    ) -> Self {
        Self { id, mode, sender }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Queue `sql` with positional `params`.
    ///
    /// Malformed statements are reported through `callbacks` like storage failures are. On a
    /// transaction that already finished, the error callback runs immediately with
    /// `WebSqlError::TransactionClosed`.
    pub fn execute_sql(&self, sql: &str, params: &[RowValues], callbacks: StatementCallbacks) {
        let queued = QueuedStatement {
            planned: plan(sql, params, self.mode),
            callbacks,
        };
        if let Err(mpsc::error::SendError(queued)) = self.sender.send(queued) {
            tracing::debug!(tx = self.id, sql, "statement issued after transaction finished");
            queued
                .callbacks
                .settle(self, Err(WebSqlError::TransactionClosed));
        }
    }
}

impl std::fmt::Debug for QueuedStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedStatement")
            .field("planned", &self.planned)
            .finish_non_exhaustive()
    }
}
