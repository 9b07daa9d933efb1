mod history;
mod ingest;
mod lookup;
mod snapshot;

use std::time::Instant;

use serde_json::Value;
use tickstore_core::{TickStore, WarehouseConfig};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[derive(Debug)]
pub struct CommandResult {
    pub command: &'static str,
    pub data: Value,
    pub warnings: Vec<String>,
    pub latency_ms: u64,
    /// Observations rejected by an ingest run.
    pub rejected: usize,
}

impl CommandResult {
    pub fn ok(command: &'static str, data: Value) -> Self {
        Self {
            command,
            data,
            warnings: Vec::new(),
            latency_ms: 0,
            rejected: 0,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_rejected(mut self, rejected: usize) -> Self {
        self.rejected = rejected;
        self
    }

    /// Fails with [`CliError::PartialIngest`] once the result has been
    /// rendered, if any observation was rejected.
    pub fn ensure_complete(&self) -> Result<(), CliError> {
        if self.rejected > 0 {
            return Err(CliError::PartialIngest {
                rejected: self.rejected,
            });
        }
        Ok(())
    }

    fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }
}

pub fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    let started = Instant::now();
    let store = open_store(cli)?;

    let result = match &cli.command {
        Command::Ingest(args) => ingest::run(args, &store)?,
        Command::Resolve(args) => lookup::resolve(args, &store)?,
        Command::Latest(args) => lookup::latest(args, &store)?,
        Command::Previous(args) => lookup::previous(args, &store)?,
        Command::History(args) => history::run(args, &store)?,
        Command::Tickers => lookup::tickers(&store)?,
        Command::Snapshot => snapshot::run(&store)?,
    };

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    Ok(result.with_latency(latency_ms))
}

fn open_store(cli: &Cli) -> Result<TickStore, CliError> {
    let mut config = WarehouseConfig::default();
    if let Some(db_path) = &cli.db {
        config.db_path = db_path.clone();
    }
    Ok(TickStore::open(config)?)
}
