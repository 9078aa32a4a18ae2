//! CLI argument definitions for intrabar.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fetch` | Download, validate and store bars for symbol × timeframe jobs |
//! | `aggregate` | Build a coarser series from a stored one |
//! | `validate` | Run quality checks over a stored CSV file |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--config` | none | TOML configuration file |
//! | `--data-dir` | `data` | Root of the `<timeframe>/<SYMBOL>.csv` layout |
//! | `--log-format` | `pretty` | Log format on stderr (pretty, compact, json) |
//! | `--pretty` | `false` | Pretty-print the JSON summary on stdout |
//!
//! # Examples
//!
//! ```bash
//! intrabar fetch --symbols SPY,QQQ --timeframes 1m,5m --start 2025-01-01
//! intrabar fetch --symbols-file symbols.txt --timeframes-file timeframes.txt
//! intrabar aggregate --symbol SPY --from 1m --to 3m
//! intrabar validate data/1m/SPY.csv --pretty
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "intrabar",
    author,
    version,
    about = "Historical intraday bar downloader"
)]
pub struct Cli {
    /// TOML configuration file; INTRABAR_* variables override it.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Root directory of stored series.
    #[arg(long, global = true, default_value = "data")]
    pub data_dir: PathBuf,

    /// Log output format. Verbosity follows RUST_LOG (default `info`).
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch bars for every symbol × timeframe pair.
    ///
    /// Each series is validated and only written when the checks pass,
    /// unless --force is given. Exits with code 3 when any job fails.
    Fetch(FetchArgs),

    /// Aggregate a stored series into a coarser timeframe.
    Aggregate(AggregateArgs),

    /// Validate a stored CSV series. Exits with code 4 when checks fail.
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Comma-separated symbols.
    #[arg(
        long,
        value_delimiter = ',',
        required_unless_present = "symbols_file",
        conflicts_with = "symbols_file"
    )]
    pub symbols: Vec<String>,

    /// File with one symbol per line.
    #[arg(long)]
    pub symbols_file: Option<PathBuf>,

    /// Comma-separated timeframes (1m, 5m, 10m, 15m, 30m). Defaults to 1m.
    #[arg(long, value_delimiter = ',', conflicts_with = "timeframes_file")]
    pub timeframes: Vec<String>,

    /// File with one timeframe per line.
    #[arg(long)]
    pub timeframes_file: Option<PathBuf>,

    /// First day, YYYY-MM-DD.
    #[arg(long, default_value = "2025-01-01")]
    pub start: String,

    /// Last day, YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    pub end: Option<String>,

    /// Store series even when validation reports errors.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct AggregateArgs {
    #[arg(long)]
    pub symbol: String,

    /// Source timeframe.
    #[arg(long)]
    pub from: String,

    /// Target timeframe.
    #[arg(long)]
    pub to: String,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// CSV file to check.
    pub path: PathBuf,
}
