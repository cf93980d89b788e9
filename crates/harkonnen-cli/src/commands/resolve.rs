use harkonnen_influence::{AliasTickerResolver, TickerMatch};
use serde::Serialize;
use serde_json::Value;

use crate::cli::ResolveArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct ResolveResponseData {
    tickers: Vec<TickerMatch>,
}

pub fn run(args: &ResolveArgs) -> Result<Value, CliError> {
    let resolver = AliasTickerResolver::from_json_file(&args.companies)?;
    let tickers = resolver.resolve(&args.text);
    tracing::debug!(aliases = resolver.len(), matches = tickers.len(), "text resolved");
    Ok(serde_json::to_value(ResolveResponseData { tickers })?)
}
