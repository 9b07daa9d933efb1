use serde::Serialize;
use tickstore_core::{StoreError, TickStore, Ticker};

use crate::cli::{ResolveArgs, TierArgs};
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct TickersResponseData {
    tickers: Vec<Ticker>,
}

pub fn resolve(args: &ResolveArgs, store: &TickStore) -> Result<CommandResult, CliError> {
    let tickers = args
        .symbols
        .iter()
        .map(|symbol| store.resolve(symbol))
        .collect::<Result<Vec<_>, _>>()?;

    let data = serde_json::to_value(TickersResponseData { tickers })?;
    Ok(CommandResult::ok("resolve", data))
}

pub fn tickers(store: &TickStore) -> Result<CommandResult, CliError> {
    let tickers = store.registry().tickers();
    let data = serde_json::to_value(TickersResponseData { tickers })?;
    Ok(CommandResult::ok("tickers", data))
}

pub fn latest(args: &TierArgs, store: &TickStore) -> Result<CommandResult, CliError> {
    let record = store.latest(&args.symbol, args.tier)?.ok_or_else(|| {
        StoreError::NotFound(format!("no {} value for {}", args.tier, args.symbol))
    })?;
    Ok(CommandResult::ok("latest", serde_json::to_value(record.as_ref())?))
}

pub fn previous(args: &TierArgs, store: &TickStore) -> Result<CommandResult, CliError> {
    let record = store.previous(&args.symbol, args.tier)?.ok_or_else(|| {
        StoreError::NotFound(format!("no previous {} value for {}", args.tier, args.symbol))
    })?;
    Ok(CommandResult::ok("previous", serde_json::to_value(record.as_ref())?))
}
