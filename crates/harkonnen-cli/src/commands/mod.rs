mod history;
mod resolve;
mod score;
mod window;

use std::sync::Arc;

use harkonnen_core::{
    CachedMarketData, FixtureMarketData, MarketDataClient, ReqwestHttpClient, UtcDateTime,
    YahooAdapter, YahooConfig,
};
use serde_json::Value;

use crate::cli::{Cli, Command, SourceSelector};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<Value, CliError> {
    match &cli.command {
        Command::Score(args) => score::run(args, market_data(cli)?).await,
        Command::History(args) => history::run(args, market_data(cli)?).await,
        Command::Window(args) => window::run(args),
        Command::Resolve(args) => resolve::run(args),
    }
}

/// Builds the market data client selected by the global options.
///
/// Yahoo responses are memoized for the lifetime of the process so tickers
/// repeated across posts with the same window are fetched once.
fn market_data(cli: &Cli) -> Result<Arc<dyn MarketDataClient>, CliError> {
    match cli.source {
        SourceSelector::Fixture => {
            let path = cli.fixture.as_ref().ok_or_else(|| {
                CliError::Command(String::from("--fixture is required with --source fixture"))
            })?;
            Ok(Arc::new(FixtureMarketData::from_json_file(path)?))
        }
        SourceSelector::Yahoo => {
            let config = YahooConfig {
                timeout_ms: cli.timeout_ms,
                ..YahooConfig::default()
            };
            let adapter = YahooAdapter::new(Arc::new(ReqwestHttpClient::new()), config);
            Ok(Arc::new(CachedMarketData::with_default_ttl(adapter)))
        }
    }
}

fn parse_as_of(as_of: Option<&str>) -> Result<UtcDateTime, CliError> {
    match as_of {
        Some(value) => Ok(UtcDateTime::parse(value)?),
        None => Ok(UtcDateTime::now()),
    }
}
