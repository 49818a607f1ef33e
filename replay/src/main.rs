mod args;
mod script;

use std::fs::File;
use std::io;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use websql_middleware::prelude::*;

use crate::args::{Args, ReplayConfig};

/// Logs go to stderr, and to `--log` when given. Stdout carries the report.
fn init_logging(config: &ReplayConfig) -> io::Result<()> {
    let level = if config.verbose { Level::DEBUG } else { Level::INFO };
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level);
    match &config.log {
        Some(path) => {
            let file = Mutex::new(File::create(path)?);
            builder.with_writer(io::stderr.and(file)).init();
        }
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = ReplayConfig::from_args(args);
    if let Err(err) = init_logging(&config) {
        eprintln!("failed to open log file: {err}");
        std::process::exit(1);
    }

    let config_json = serde_json::to_string_pretty(&config).unwrap_or_else(|_| "{}".to_string());
    tracing::info!("config: {}", config_json);

    let script = script::load(&config.script).unwrap_or_else(|err| {
        eprintln!("failed to read {}: {err}", config.script.display());
        std::process::exit(1);
    });

    let memory = MemoryEngine::new().unwrap_or_else(|err| {
        eprintln!("failed to start the memory engine: {err}");
        std::process::exit(1);
    });
    let mut registry = Registry::new();
    install_with_mode(&mut registry, Arc::new(memory.clone()), config.mode);

    let name = config.database.clone().unwrap_or_else(|| script.database.clone());
    let version = config.version.clone().unwrap_or_else(|| script.version.clone());
    let Some(db) = registry.open_database(&name, &version, &name, 0) else {
        eprintln!("open_database is not installed");
        std::process::exit(1);
    };

    let reports = script::replay(&db, &script).await;
    let failed = reports.iter().filter(|report| !report.committed).count();

    let mut output = serde_json::json!({ "transactions": reports });
    if config.dump {
        match memory.export_json(&name).await {
            Ok(dump) => output["database"] = dump.unwrap_or_default(),
            Err(err) => tracing::error!(error = %err, "failed to export database"),
        }
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    );

    if failed > 0 {
        tracing::warn!(failed, "some transactions failed");
        std::process::exit(2);
    }
}
