//! WebSQL-style `transaction` / `execute_sql` callbacks over an async record-store engine.
//!
//! Legacy callers keep issuing the handful of SQL shapes they always did; each statement is
//! classified, its clauses are matched positionally against the parameter list, and the
//! result becomes one request against a collection keyed by an auto-incrementing `id`.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use websql_middleware::prelude::*;
//!
//! # async fn demo() -> Result<(), WebSqlError> {
//! let engine = MemoryEngine::new().map_err(WebSqlError::Init)?;
//! let mut registry = Registry::new();
//! install(&mut registry, Arc::new(engine));
//!
//! let Some(db) = registry.open_database("notes", "1", "Notes", 1024) else {
//!     return Ok(());
//! };
//! db.run_transaction(
//!     |tx| {
//!         tx.execute_sql(
//!             "INSERT INTO notes (title) VALUES (?)",
//!             &[RowValues::Text("hello".into())],
//!             StatementCallbacks::new()
//!                 .on_success(|_tx, result| println!("inserted {:?}", result.insert_id)),
//!         );
//!     },
//!     TransactionCallbacks::new(),
//! )
//! .await
//! # }
//! ```

pub mod adapter;
pub mod database;
pub mod error;
pub mod install;
pub mod prelude;
pub mod results;
pub mod statement;
pub mod store;
pub mod transaction;
pub mod types;

pub use database::{DatabaseHandle, DatabaseOptions, DatabaseOptionsBuilder, HandleState};
pub use error::WebSqlError;
pub use install::{OpenDatabaseFactory, Registry, install, install_with_mode};
pub use results::{Record, ResultSet, RowList};
pub use transaction::{SqlTransaction, StatementCallbacks, TransactionCallbacks};
pub use types::{CollectionMode, FIXED_COLLECTION, RowValues};
