use std::sync::Arc;

use tokio::sync::watch;

use crate::error::WebSqlError;
use crate::store::StorageConnection;

/// Lifecycle of a database handle's engine connection.
#[derive(Clone)]
pub enum HandleState {
    Opening,
    Upgrading { old_version: u32, new_version: u32 },
    Ready(Arc<dyn StorageConnection>),
    /// Terminal: every later transaction fails with this error.
    Errored(WebSqlError),
}

/// Completion events raised by the engine while opening or upgrading.
#[derive(Clone)]
pub enum HandleEvent {
    UpgradeNeeded { old_version: u32, new_version: u32 },
    Opened(Arc<dyn StorageConnection>),
    Failed(WebSqlError),
    /// The connection was closed to create collections at a higher version.
    Reopening,
}

impl HandleState {
    #[must_use]
    pub fn apply(self, event: HandleEvent) -> Self {
        match (self, event) {
            (errored @ HandleState::Errored(_), _) => errored,
            (_, HandleEvent::Failed(err)) => HandleState::Errored(err),
            (
                HandleState::Opening | HandleState::Upgrading { .. },
                HandleEvent::UpgradeNeeded {
                    old_version,
                    new_version,
                },
            ) => HandleState::Upgrading {
                old_version,
                new_version,
            },
            (HandleState::Opening | HandleState::Upgrading { .. }, HandleEvent::Opened(conn)) => {
                HandleState::Ready(conn)
            }
            (HandleState::Ready(_), HandleEvent::Reopening) => HandleState::Opening,
            (state, event) => {
                tracing::warn!(state = ?state, event = ?event, "ignoring handle event");
                state
            }
        }
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self, HandleState::Ready(_) | HandleState::Errored(_))
    }
}

impl std::fmt::Debug for HandleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandleState::Opening => f.write_str("Opening"),
            HandleState::Upgrading {
                old_version,
                new_version,
            } => f
                .debug_struct("Upgrading")
                .field("old_version", old_version)
                .field("new_version", new_version)
                .finish(),
            HandleState::Ready(conn) => f
                .debug_struct("Ready")
                .field("name", &conn.name())
                .field("version", &conn.version())
                .finish(),
            HandleState::Errored(err) => f.debug_tuple("Errored").field(err).finish(),
        }
    }
}

impl std::fmt::Debug for HandleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandleEvent::UpgradeNeeded {
                old_version,
                new_version,
            } => f
                .debug_struct("UpgradeNeeded")
                .field("old_version", old_version)
                .field("new_version", new_version)
                .finish(),
            HandleEvent::Opened(conn) => f.debug_tuple("Opened").field(&conn.version()).finish(),
            HandleEvent::Failed(err) => f.debug_tuple("Failed").field(err).finish(),
            HandleEvent::Reopening => f.write_str("Reopening"),
        }
    }
}

/// Shared cell the engine callbacks fire events into and waiters subscribe to.
#[derive(Clone, Debug)]
pub(crate) struct StateCell(Arc<watch::Sender<HandleState>>);

impl StateCell {
    pub(crate) fn new() -> Self {
        let (sender, _) = watch::channel(HandleState::Opening);
        Self(Arc::new(sender))
    }

    pub(crate) fn fire(&self, event: HandleEvent) {
        self.0.send_modify(|state| {
            let current = std::mem::replace(state, HandleState::Opening);
            *state = current.apply(event);
            tracing::debug!(state = ?state, "database handle state");
        });
    }

    pub(crate) fn snapshot(&self) -> HandleState {
        self.0.borrow().clone()
    }

    /// Wait until the handle is Ready or Errored.
    pub(crate) async fn settled(&self) -> HandleState {
        let mut receiver = self.0.subscribe();
        match receiver.wait_for(HandleState::is_settled).await {
            Ok(state) => state.clone(),
            // The sender lives as long as `self`.
            Err(_) => self.snapshot(),
        }
    }
}
