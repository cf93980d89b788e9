//! CLI argument definitions for harkonnen.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `score` | Score a batch of annotated posts |
//! | `history` | Fetch close-price history for one symbol |
//! | `window` | Show the fetch window resolved for a post timestamp |
//! | `resolve` | Match tickers in free text against a company list |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--verbose` | `false` | Debug-level logs on stderr |
//! | `--source` | `yahoo` | Market data source |
//! | `--fixture` | none | Price fixture file for `--source fixture` |
//! | `--timeout-ms` | `15000` | Per-request timeout for the Yahoo source |
//!
//! # Examples
//!
//! ```bash
//! harkonnen score --input posts.json --pretty
//! harkonnen score --input posts.json --source fixture --fixture prices.json --as-of 2024-04-01T00:00:00Z
//! harkonnen history AAPL --start 2024-03-01T00:00:00Z --end 2024-03-11T00:00:00Z --interval daily
//! harkonnen window 2024-03-01T15:30:00Z --as-of 2024-03-20T00:00:00Z
//! harkonnen resolve --companies companies.json "Apple and Microsoft beat estimates"
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use harkonnen_core::{Interval, ProviderId};
use harkonnen_influence::DenominatorPolicy;

/// Influence scoring for sentiment-annotated social posts.
///
/// Measures how often a post's sentiment anticipated the direction of the
/// prices of the tickers it mentions, one day and seven days later.
#[derive(Debug, Parser)]
#[command(
    name = "harkonnen",
    author,
    version,
    about = "Influence scoring for sentiment-annotated social posts"
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Emit debug-level logs (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Market data source.
    #[arg(long, global = true, value_enum, default_value_t = SourceSelector::Yahoo)]
    pub source: SourceSelector,

    /// Price fixture file, required with `--source fixture`.
    ///
    /// Layout: {"AAPL": [{"timestamp": "...", "close_price": 150.0}]}
    #[arg(long, global = true)]
    pub fixture: Option<PathBuf>,

    /// Per-request timeout budget for the Yahoo source, in milliseconds.
    #[arg(long, global = true, default_value_t = 15_000)]
    pub timeout_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

/// Market data source selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceSelector {
    /// Yahoo Finance chart endpoint.
    Yahoo,
    /// Offline replay from a JSON fixture.
    Fixture,
}

impl From<SourceSelector> for ProviderId {
    fn from(value: SourceSelector) -> Self {
        match value {
            SourceSelector::Yahoo => ProviderId::Yahoo,
            SourceSelector::Fixture => ProviderId::Fixture,
        }
    }
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Score a batch of annotated posts.
    ///
    /// Reads a JSON array of posts with post_id, timestamp, sentiment and
    /// tickers, and prints the batch report.
    ///
    /// # Examples
    ///
    ///   harkonnen score --input posts.json
    ///   harkonnen score --input posts.json --denominator resolved-only --pretty
    Score(ScoreArgs),

    /// Fetch close-price history for one symbol.
    ///
    /// # Examples
    ///
    ///   harkonnen history AAPL --start 2024-03-01T00:00:00Z --end 2024-03-11T00:00:00Z
    History(HistoryArgs),

    /// Show the fetch window and interval resolved for a post timestamp.
    Window(WindowArgs),

    /// Match tickers in free text against a company list.
    Resolve(ResolveArgs),
}

/// Arguments for the `score` command.
#[derive(Debug, Args)]
pub struct ScoreArgs {
    /// JSON file holding the annotated posts.
    #[arg(long)]
    pub input: PathBuf,

    /// Reference instant for post ages (RFC3339); defaults to now.
    #[arg(long)]
    pub as_of: Option<String>,

    /// Upper bound on concurrent market data fetches.
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Timeout for a single ticker fetch, in milliseconds.
    #[arg(long)]
    pub fetch_timeout_ms: Option<u64>,

    /// Deadline for the whole batch, in milliseconds.
    #[arg(long)]
    pub batch_timeout_ms: Option<u64>,

    /// Which mentions count toward the score denominator.
    ///
    /// - all-mentions: every attempted ticker
    /// - resolved-only: tickers that produced a price change
    #[arg(long)]
    pub denominator: Option<DenominatorPolicy>,
}

/// Arguments for the `history` command.
#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Market symbol to fetch.
    pub symbol: String,

    /// Window start (RFC3339, inclusive).
    #[arg(long)]
    pub start: String,

    /// Window end (RFC3339, exclusive).
    #[arg(long)]
    pub end: String,

    /// Sampling interval: fine (2m) or daily (1d).
    #[arg(long, default_value = "daily")]
    pub interval: Interval,
}

/// Arguments for the `window` command.
#[derive(Debug, Args)]
pub struct WindowArgs {
    /// Post timestamp (RFC3339 or ISO-8601 without offset).
    pub timestamp: String,

    /// Reference instant for the post age; defaults to now.
    #[arg(long)]
    pub as_of: Option<String>,
}

/// Arguments for the `resolve` command.
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// JSON array of {"name": ..., "ticker": ...} objects.
    #[arg(long)]
    pub companies: PathBuf,

    /// Text to scan for company names and cashtags.
    pub text: String,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_score_overrides() {
        let cli = Cli::try_parse_from([
            "harkonnen",
            "score",
            "--input",
            "posts.json",
            "--source",
            "fixture",
            "--fixture",
            "prices.json",
            "--denominator",
            "resolved-only",
            "--max-concurrency",
            "2",
        ])
        .expect("parse");

        assert_eq!(cli.source, SourceSelector::Fixture);
        let Command::Score(args) = cli.command else {
            panic!("expected score command");
        };
        assert_eq!(args.denominator, Some(DenominatorPolicy::ResolvedOnly));
        assert_eq!(args.max_concurrency, Some(2));
    }

    #[test]
    fn history_interval_accepts_provider_codes() {
        let cli = Cli::try_parse_from([
            "harkonnen",
            "history",
            "MSFT",
            "--start",
            "2024-03-01T00:00:00Z",
            "--end",
            "2024-03-02T00:00:00Z",
            "--interval",
            "2m",
        ])
        .expect("parse");

        let Command::History(args) = cli.command else {
            panic!("expected history command");
        };
        assert_eq!(args.interval, Interval::Fine);
    }
}
