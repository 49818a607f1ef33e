use crate::error::WebSqlError;

/// Lifecycle of one `transaction(...)` call.
#[derive(Debug, Clone)]
pub enum TransactionState {
    /// Constructed; the setup callback has not returned yet.
    Pending,
    /// Statements may be issued; `in_flight` of them have not settled.
    Active { in_flight: usize },
    Committed,
    Failed(WebSqlError),
}

/// Completion events that move a transaction between states.
#[derive(Debug, Clone)]
pub enum TransactionEvent {
    SetupReturned,
    StatementIssued,
    StatementSettled,
    /// The engine reported the transaction complete.
    Completed,
    /// Initialization or the engine transaction failed.
    Errored(WebSqlError),
}

impl TransactionState {
    /// Apply `event`. Events that do not fit the current state leave it unchanged.
    #[must_use]
    pub fn apply(self, event: TransactionEvent) -> Self {
        match (self, event) {
            (TransactionState::Pending, TransactionEvent::SetupReturned) => {
                TransactionState::Active { in_flight: 0 }
            }
            (TransactionState::Active { in_flight }, TransactionEvent::StatementIssued) => {
                TransactionState::Active {
                    in_flight: in_flight + 1,
                }
            }
            (TransactionState::Active { in_flight }, TransactionEvent::StatementSettled)
                if in_flight > 0 =>
            {
                TransactionState::Active {
                    in_flight: in_flight - 1,
                }
            }
            (TransactionState::Active { in_flight: 0 }, TransactionEvent::Completed) => {
                TransactionState::Committed
            }
            (
                TransactionState::Pending | TransactionState::Active { .. },
                TransactionEvent::Errored(err),
            ) => TransactionState::Failed(err),
            (state, event) => {
                tracing::warn!(?state, ?event, "ignoring transaction event");
                state
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commits_only_once_nothing_is_in_flight() {
        let state = TransactionState::Pending
            .apply(TransactionEvent::SetupReturned)
            .apply(TransactionEvent::StatementIssued)
            .apply(TransactionEvent::Completed);
        assert!(matches!(state, TransactionState::Active { in_flight: 1 }));

        let state = state
            .apply(TransactionEvent::StatementSettled)
            .apply(TransactionEvent::Completed);
        assert!(matches!(state, TransactionState::Committed));
    }

    #[test]
    fn errors_are_terminal() {
        let state = TransactionState::Pending
            .apply(TransactionEvent::Errored(WebSqlError::TransactionClosed))
            .apply(TransactionEvent::SetupReturned)
            .apply(TransactionEvent::Completed);
        assert!(matches!(
            state,
            TransactionState::Failed(WebSqlError::TransactionClosed)
        ));
    }

    #[test]
    fn settle_without_issue_is_ignored() {
        let state = TransactionState::Pending
            .apply(TransactionEvent::SetupReturned)
            .apply(TransactionEvent::StatementSettled);
        assert!(matches!(state, TransactionState::Active { in_flight: 0 }));
    }
}
