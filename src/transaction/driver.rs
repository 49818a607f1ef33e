use std::collections::BTreeSet;
use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::FuturesUnordered;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::adapter::execute_plan;
use crate::database::DatabaseHandle;
use crate::error::WebSqlError;
use crate::store::StorageTransaction;

use super::{
    QueuedStatement, SqlTransaction, TransactionCallbacks, TransactionEvent, TransactionState,
};

pub(crate) type SetupFn = Box<dyn FnOnce(&SqlTransaction) + Send>;

/// Tracks the state machine and logs every transition.
struct Tracker {
    tx_id: u64,
    state: TransactionState,
}

impl Tracker {
    fn fire(&mut self, event: TransactionEvent) {
        let state = std::mem::replace(&mut self.state, TransactionState::Pending);
        self.state = state.apply(event);
        debug!(tx = self.tx_id, state = ?self.state, "transaction state");
    }

    fn fail(&mut self, err: WebSqlError, callbacks: TransactionCallbacks) -> Result<(), WebSqlError> {
        warn!(tx = self.tx_id, error = %err, "transaction failed");
        self.fire(TransactionEvent::Errored(err.clone()));
        callbacks.fail(&err);
        Err(err)
    }
}

/// Drive one `transaction(...)` call from Pending to Committed or Failed.
///
/// Statements run cooperatively inside this task. Statements issued from a statement
/// callback are picked up as soon as that callback returns, and the engine transaction is
/// committed only when nothing is in flight and the queue is empty, so every statement
/// callback runs before the transaction callbacks.
pub(crate) async fn run(
    database: &DatabaseHandle,
    setup: SetupFn,
    callbacks: TransactionCallbacks,
) -> Result<(), WebSqlError> {
    let mut tracker = Tracker {
        tx_id: database.next_transaction_id(),
        state: TransactionState::Pending,
    };

    if let Err(err) = database.ready().await {
        return tracker.fail(err, callbacks);
    }

    let (sender, mut receiver) = mpsc::unbounded_channel();
    let sql_tx = SqlTransaction::new(tracker.tx_id, database.collection_mode(), sender);
    setup(&sql_tx);
    tracker.fire(TransactionEvent::SetupReturned);

    // Statements that failed to plan settle before any storage work; their callbacks may
    // queue more statements.
    let mut pending = Vec::new();
    let mut queued_now = drain(&mut receiver);
    while !queued_now.is_empty() {
        for queued in queued_now {
            if queued.planned.is_ok() {
                pending.push(queued);
                continue;
            }
            let QueuedStatement { planned, callbacks } = queued;
            if let Err(err) = planned {
                warn!(tx = tracker.tx_id, error = %err, "statement rejected");
                callbacks.settle(&sql_tx, Err(err));
            }
        }
        queued_now = drain(&mut receiver);
    }

    if pending.is_empty() {
        receiver.close();
        tracker.fire(TransactionEvent::Completed);
        callbacks.complete();
        return Ok(());
    }

    let needed: BTreeSet<String> = pending
        .iter()
        .filter_map(|queued| queued.planned.as_ref().ok())
        .map(|plan| plan.collection().to_string())
        .collect();
    // The scope is fixed from here on. A collection first named inside a statement callback
    // and not yet stored fails with NotFoundError.

    let storage = match database.begin_storage_transaction(&needed).await {
        Ok(storage) => storage,
        Err(err) => {
            receiver.close();
            for queued in pending.into_iter().chain(drain(&mut receiver)) {
                queued.callbacks.settle(&sql_tx, Err(err.clone()));
            }
            return tracker.fail(err, callbacks);
        }
    };

    let mut in_flight: FuturesUnordered<BoxFuture<'static, ()>> = FuturesUnordered::new();
    for queued in pending {
        tracker.fire(TransactionEvent::StatementIssued);
        in_flight.push(run_statement(Arc::clone(&storage), sql_tx.clone(), queued));
    }

    loop {
        while let Ok(queued) = receiver.try_recv() {
            tracker.fire(TransactionEvent::StatementIssued);
            in_flight.push(run_statement(Arc::clone(&storage), sql_tx.clone(), queued));
        }
        if in_flight.next().await.is_none() {
            break;
        }
        tracker.fire(TransactionEvent::StatementSettled);
    }

    // Statements sent from outside any callback after this point are too late.
    receiver.close();
    for queued in drain(&mut receiver) {
        queued
            .callbacks
            .settle(&sql_tx, Err(WebSqlError::TransactionClosed));
    }

    match storage.commit().await {
        Ok(()) => {
            tracker.fire(TransactionEvent::Completed);
            callbacks.complete();
            Ok(())
        }
        Err(source) => tracker.fail(WebSqlError::TransactionError(source), callbacks),
    }
}

fn drain(receiver: &mut mpsc::UnboundedReceiver<QueuedStatement>) -> Vec<QueuedStatement> {
    let mut late = Vec::new();
    while let Ok(queued) = receiver.try_recv() {
        late.push(queued);
    }
    late
}

fn run_statement(
    storage: Arc<dyn StorageTransaction>,
    sql_tx: SqlTransaction,
    queued: QueuedStatement,
) -> BoxFuture<'static, ()> {
    async move {
        let QueuedStatement { planned, callbacks } = queued;
        let outcome = match planned {
            Ok(plan) => execute_plan(storage.as_ref(), plan).await,
            Err(err) => Err(err),
        };
        if let Err(err) = &outcome {
            warn!(tx = sql_tx.id(), error = %err, "statement failed");
        }
        callbacks.settle(&sql_tx, outcome);
    }
    .boxed()
}
