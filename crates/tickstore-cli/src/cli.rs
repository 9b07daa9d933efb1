//! CLI argument definitions for tickstore.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ingest` | Append NDJSON observations to the store |
//! | `resolve` | Look up registered tickers |
//! | `latest` | Current value of a ticker's tier |
//! | `previous` | Value replaced by the current one |
//! | `history` | Range of a ticker's tier series |
//! | `tickers` | List registered tickers |
//! | `snapshot` | Latest live quote of every ticker |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--db` | `$TICKSTORE_HOME/data/tickstore.duckdb` | Warehouse file |
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `-v` | off | Verbose logging on stderr (repeatable) |

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tickstore_core::Tier;

/// Tiered stock-market time-series store.
#[derive(Debug, Parser)]
#[command(name = "tickstore", author, version, about = "Tiered stock-market time-series store")]
pub struct Cli {
    /// DuckDB warehouse file. Defaults to `$TICKSTORE_HOME/data/tickstore.duckdb`.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Increase log verbosity. `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON object output.
    Json,
    /// Plain text for terminal display.
    Table,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest newline-delimited JSON observations.
    ///
    /// Each line holds `symbol`, `tier`, `timestamp`, `payload` and an
    /// optional `name`. Exits with code 3 if any line was rejected.
    ///
    /// # Examples
    ///
    ///   tickstore ingest quotes.ndjson --source feed-a
    Ingest(IngestArgs),

    /// Look up one or more registered tickers.
    Resolve(ResolveArgs),

    /// Show the current value of a ticker's tier.
    Latest(TierArgs),

    /// Show the value that the current one replaced.
    Previous(TierArgs),

    /// List a ticker's tier records, oldest first.
    ///
    /// # Examples
    ///
    ///   tickstore history AAPL --tier live --from 2026-02-20T15:00:00Z
    History(HistoryArgs),

    /// List registered tickers.
    Tickers,

    /// Latest live quote and previous price of every ticker.
    Snapshot,
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// NDJSON file to read. Use `-` for stdin.
    pub file: PathBuf,

    /// Source label recorded in the ingest log.
    #[arg(long, default_value = "cli")]
    pub source: String,
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    #[arg(required = true, num_args = 1..)]
    pub symbols: Vec<String>,
}

#[derive(Debug, Args)]
pub struct TierArgs {
    pub symbol: String,

    #[arg(long, default_value_t = Tier::Live)]
    pub tier: Tier,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    pub symbol: String,

    #[arg(long, default_value_t = Tier::Live)]
    pub tier: Tier,

    /// Inclusive lower bound (RFC3339 UTC).
    #[arg(long)]
    pub from: Option<String>,

    /// Exclusive upper bound (RFC3339 UTC).
    #[arg(long)]
    pub to: Option<String>,

    /// Maximum number of records to return.
    #[arg(long)]
    pub limit: Option<usize>,
}
