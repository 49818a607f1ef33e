use std::fmt;

use thiserror::Error;

/// Error names reported by the record-store engine, modelled on DOMException names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageErrorKind {
    Constraint,
    NotFound,
    Data,
    Version,
    InvalidState,
    TransactionInactive,
    ReadOnly,
    InvalidAccess,
    Abort,
    Unknown,
}

impl StorageErrorKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            StorageErrorKind::Constraint => "ConstraintError",
            StorageErrorKind::NotFound => "NotFoundError",
            StorageErrorKind::Data => "DataError",
            StorageErrorKind::Version => "VersionError",
            StorageErrorKind::InvalidState => "InvalidStateError",
            StorageErrorKind::TransactionInactive => "TransactionInactiveError",
            StorageErrorKind::ReadOnly => "ReadOnlyError",
            StorageErrorKind::InvalidAccess => "InvalidAccessError",
            StorageErrorKind::Abort => "AbortError",
            StorageErrorKind::Unknown => "UnknownError",
        }
    }
}

impl fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failed storage request, open, or commit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct StorageError {
    pub kind: StorageErrorKind,
    pub message: String,
}

impl StorageError {
    pub fn new(kind: StorageErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn worker_closed(message: &str) -> Self {
        Self::new(StorageErrorKind::InvalidState, message)
    }
}
