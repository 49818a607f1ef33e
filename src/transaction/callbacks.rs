use crate::error::WebSqlError;
use crate::results::ResultSet;

use super::SqlTransaction;

type StatementSuccessFn = Box<dyn FnOnce(&SqlTransaction, &ResultSet) + Send>;
type StatementErrorFn = Box<dyn FnOnce(&SqlTransaction, &WebSqlError) + Send>;
type TransactionErrorFn = Box<dyn FnOnce(&WebSqlError) + Send>;
type TransactionSuccessFn = Box<dyn FnOnce() + Send>;

/// Optional success/error callbacks for one `execute_sql` call.
///
/// ```rust
/// use websql_middleware::prelude::*;
///
/// let callbacks = StatementCallbacks::new()
///     .on_success(|_tx, result| println!("{} rows", result.rows.length()))
///     .on_error(|_tx, err| eprintln!("statement failed: {err}"));
/// # let _ = callbacks;
/// ```
#[derive(Default)]
pub struct StatementCallbacks {
    success: Option<StatementSuccessFn>,
    error: Option<StatementErrorFn>,
}

impl StatementCallbacks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_success(
        mut self,
        callback: impl FnOnce(&SqlTransaction, &ResultSet) + Send + 'static,
    ) -> Self {
        self.success = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn on_error(
        mut self,
        callback: impl FnOnce(&SqlTransaction, &WebSqlError) + Send + 'static,
    ) -> Self {
        self.error = Some(Box::new(callback));
        self
    }

    /// Deliver the statement's outcome to exactly one of the callbacks.
    pub(crate) fn settle(self, tx: &SqlTransaction, outcome: Result<ResultSet, WebSqlError>) {
        match outcome {
            Ok(result) => {
                if let Some(success) = self.success {
                    success(tx, &result);
                }
            }
            Err(err) => {
                if let Some(error) = self.error {
                    error(tx, &err);
                }
            }
        }
    }
}

impl std::fmt::Debug for StatementCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatementCallbacks")
            .field("success", &self.success.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

/// Optional error/success callbacks for one `transaction(...)` call.
#[derive(Default)]
pub struct TransactionCallbacks {
    error: Option<TransactionErrorFn>,
    success: Option<TransactionSuccessFn>,
}

impl TransactionCallbacks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_error(mut self, callback: impl FnOnce(&WebSqlError) + Send + 'static) -> Self {
        self.error = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn on_success(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.success = Some(Box::new(callback));
        self
    }

    pub(crate) fn complete(self) {
        if let Some(success) = self.success {
            success();
        }
    }

    pub(crate) fn fail(self, err: &WebSqlError) {
        if let Some(error) = self.error {
            error(err);
        }
    }
}

impl std::fmt::Debug for TransactionCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionCallbacks")
            .field("error", &self.error.is_some())
            .field("success", &self.success.is_some())
            .finish()
    }
}
