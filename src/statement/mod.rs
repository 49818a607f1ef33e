//! Narrow recognizer for the statement shapes legacy WebSQL callers issue.
//!
//! This is deliberately not a SQL parser. Statements are classified by their leading
//! keyword and their clauses are matched against fixed patterns; parameters are taken by
//! position and the literal value/placeholder tokens in the SQL text are never read.
//! Callers written against the legacy API depend on exactly these quirks:
//!
//! - SELECT ignores everything after the table name and always scans the whole collection.
//! - INSERT values embedded as literals are dropped; only `?` parameters by position count.
//! - UPDATE reads only the left-hand side of each `SET` assignment.
//! - UPDATE/DELETE only understand `WHERE id = ?`.

mod classify;
mod extract;
mod plan;

pub use classify::{StatementKind, classify};
pub use extract::{UpdateClause, extract_delete_key, extract_insert, extract_update, resolve_table};
pub use plan::{StatementPlan, plan, record_key};
