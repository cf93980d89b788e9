use std::sync::Arc;

use harkonnen_core::{HistoryRequest, MarketDataClient, Symbol, UtcDateTime};
use serde_json::Value;

use crate::cli::HistoryArgs;
use crate::error::CliError;

pub async fn run(
    args: &HistoryArgs,
    client: Arc<dyn MarketDataClient>,
) -> Result<Value, CliError> {
    let request = HistoryRequest::new(
        Symbol::parse(&args.symbol)?,
        UtcDateTime::parse(&args.start)?,
        UtcDateTime::parse(&args.end)?,
        args.interval,
    )?;

    let series = client.fetch_history(request).await?;
    tracing::debug!(symbol = %series.symbol(), samples = series.len(), "history fetched");
    Ok(serde_json::to_value(&series)?)
}

#[cfg(test)]
mod tests {
    use harkonnen_core::{FixtureMarketData, Interval};

    use super::*;

    fn args(start: &str, end: &str) -> HistoryArgs {
        HistoryArgs {
            symbol: String::from("msft"),
            start: start.to_owned(),
            end: end.to_owned(),
            interval: Interval::Daily,
        }
    }

    #[tokio::test]
    async fn prints_samples_inside_window() {
        let fixture = FixtureMarketData::from_json_str(
            r#"{"MSFT": [
                {"timestamp": "2024-03-01T00:00:00Z", "close_price": 410.0},
                {"timestamp": "2024-03-04T00:00:00Z", "close_price": 412.5},
                {"timestamp": "2024-03-10T00:00:00Z", "close_price": 405.0}
            ]}"#,
        )
        .expect("fixture");

        let series = run(
            &args("2024-03-01T00:00:00Z", "2024-03-05T00:00:00Z"),
            Arc::new(fixture),
        )
        .await
        .expect("series");

        assert_eq!(series["symbol"], "MSFT");
        assert_eq!(series["samples"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn inverted_window_is_rejected() {
        let error = run(
            &args("2024-03-05T00:00:00Z", "2024-03-01T00:00:00Z"),
            Arc::new(FixtureMarketData::new()),
        )
        .await
        .expect_err("inverted window");

        assert_eq!(error.exit_code(), 2);
    }
}
