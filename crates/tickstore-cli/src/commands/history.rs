use std::ops::Bound;

use serde::Serialize;
use tickstore_core::{TickStore, TierRecord, UtcDateTime};

use crate::cli::HistoryArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct HistoryResponseData<'a> {
    symbol: &'a str,
    tier: tickstore_core::Tier,
    records: Vec<TierRecord>,
}

pub fn run(args: &HistoryArgs, store: &TickStore) -> Result<CommandResult, CliError> {
    let from = match &args.from {
        Some(value) => Bound::Included(UtcDateTime::parse(value)?),
        None => Bound::Unbounded,
    };
    let to = match &args.to {
        Some(value) => Bound::Excluded(UtcDateTime::parse(value)?),
        None => Bound::Unbounded,
    };

    let cursor = store.history(&args.symbol, args.tier, (from, to))?;
    let records = cursor
        .take(args.limit.unwrap_or(usize::MAX))
        .map(|record| record.as_ref().clone())
        .collect::<Vec<_>>();

    let data = serde_json::to_value(HistoryResponseData {
        symbol: &args.symbol,
        tier: args.tier,
        records,
    })?;
    Ok(CommandResult::ok("history", data))
}
