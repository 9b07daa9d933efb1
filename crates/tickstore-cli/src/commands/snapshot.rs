use serde::Serialize;
use tickstore_core::{LiveSnapshotRow, TickStore};

use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct SnapshotResponseData {
    quotes: Vec<LiveSnapshotRow>,
}

pub fn run(store: &TickStore) -> Result<CommandResult, CliError> {
    let warehouse = store
        .warehouse()
        .ok_or_else(|| CliError::Command(String::from("snapshot requires a warehouse")))?;
    let quotes = warehouse.live_snapshot().map_err(tickstore_core::StoreError::from)?;

    let data = serde_json::to_value(SnapshotResponseData { quotes })?;
    Ok(CommandResult::ok("snapshot", data))
}
