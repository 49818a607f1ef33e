//! Convenient imports for common functionality.
//!
//! This module re-exports the types most callers need to open a database and run
//! statements.

pub use crate::database::{DatabaseHandle, DatabaseOptions, DatabaseOptionsBuilder, HandleState};
pub use crate::error::WebSqlError;
pub use crate::install::{Registry, install, install_with_mode};
pub use crate::results::{Record, ResultSet, RowList};
pub use crate::store::{MemoryEngine, StorageEngine, StorageError, StorageErrorKind};
pub use crate::transaction::{SqlTransaction, StatementCallbacks, TransactionCallbacks};
pub use crate::types::{CollectionMode, RowValues};
