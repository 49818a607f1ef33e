use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use websql_middleware::CollectionMode;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay a WebSQL statement script against the in-memory engine")]
pub(crate) struct Args {
    /// JSON script of transactions to run
    pub(crate) script: PathBuf,
    #[arg(long, value_enum, default_value = "per-statement")]
    pub(crate) mode: CollectionMode,
    /// Overrides the script's database name
    #[arg(long)]
    pub(crate) database: Option<String>,
    /// Overrides the script's version string
    #[arg(long)]
    pub(crate) version: Option<String>,
    /// Print the engine's contents after the last transaction
    #[arg(long)]
    pub(crate) dump: bool,
    #[arg(long)]
    pub(crate) log: Option<PathBuf>,
    #[arg(long)]
    pub(crate) verbose: bool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ReplayConfig {
    pub(crate) script: PathBuf,
    pub(crate) mode: CollectionMode,
    pub(crate) database: Option<String>,
    pub(crate) version: Option<String>,
    pub(crate) dump: bool,
    pub(crate) log: Option<PathBuf>,
    pub(crate) verbose: bool,
}

impl ReplayConfig {
    pub(crate) fn from_args(args: Args) -> Self {
        ReplayConfig {
            script: args.script,
            mode: args.mode,
            database: args.database,
            version: args.version,
            dump: args.dump,
            log: args.log,
            verbose: args.verbose,
        }
    }
}
