//! Database handles: asynchronous open/upgrade/ready and the `transaction` entry point.

mod config;
mod handle;
mod state;

pub use config::{DatabaseOptions, DatabaseOptionsBuilder, parse_version};
pub use handle::DatabaseHandle;
pub use state::{HandleEvent, HandleState};
