use thiserror::Error;

use crate::statement::StatementKind;
use crate::store::StorageError;

/// Every failure surfaced to a statement or transaction error callback.
///
/// The variants follow the four failure classes of the adapter: initialization
/// (`Init`, `ConfigError`), malformed statements (`MissingId`, `MissingTable`,
/// `InvalidCommand`, `ParameterError`), storage requests (`Storage`) and the
/// transaction itself (`TransactionError`, `TransactionClosed`).
#[derive(Debug, Clone, Error)]
pub enum WebSqlError {
    #[error("database initialization failed: {0}")]
    Init(#[source] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("ID for {kind} cannot be null")]
    MissingId { kind: StatementKind },

    #[error("no table name found in statement: {0}")]
    MissingTable(String),

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("{kind} failed: {source}")]
    Storage {
        kind: StatementKind,
        #[source]
        source: StorageError,
    },

    #[error("transaction failed: {0}")]
    TransactionError(#[source] StorageError),

    #[error("transaction already completed")]
    TransactionClosed,
}

impl WebSqlError {
    /// Wrap a storage failure raised while executing a statement of `kind`.
    #[must_use]
    pub fn storage(kind: StatementKind, source: StorageError) -> Self {
        WebSqlError::Storage { kind, source }
    }

    /// The originating storage error, when the failure came from the engine.
    #[must_use]
    pub fn storage_cause(&self) -> Option<&StorageError> {
        match self {
            WebSqlError::Init(source)
            | WebSqlError::TransactionError(source)
            | WebSqlError::Storage { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StorageErrorKind;

    #[test]
    fn missing_id_message_names_statement() {
        let err = WebSqlError::MissingId {
            kind: StatementKind::Update,
        };
        assert_eq!(err.to_string(), "ID for UPDATE cannot be null");
    }

    #[test]
    fn storage_cause_is_attached() {
        let cause = StorageError::new(StorageErrorKind::Constraint, "key already exists");
        let err = WebSqlError::storage(StatementKind::Insert, cause.clone());
        assert_eq!(err.storage_cause(), Some(&cause));
        assert!(std::error::Error::source(&err).is_some());
        assert!(WebSqlError::TransactionClosed.storage_cause().is_none());
    }
}
