use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::{
    CoreError, HistoryFuture, HistoryRequest, MarketDataClient, PriceSample, PriceSeries,
    ProviderId, Symbol, UtcDateTime,
};

/// Offline market data replayed from memory or a JSON file.
///
/// File layout:
///
/// ```json
/// {"AAPL": [{"timestamp": "2024-03-01T15:30:00Z", "close_price": 150.0}]}
/// ```
///
/// Requests are answered with the samples inside `[start, end)`; tickers the
/// fixture does not know yield an empty series.
#[derive(Debug, Clone, Default)]
pub struct FixtureMarketData {
    series: HashMap<Symbol, Vec<PriceSample>>,
}

impl FixtureMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let raw: BTreeMap<String, Vec<PriceSample>> = serde_json::from_str(json)?;
        let mut fixture = Self::new();
        for (ticker, samples) in raw {
            fixture = fixture.with_series(Symbol::parse(&ticker)?, samples);
        }
        Ok(fixture)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Adds samples for `symbol`, merging with any already present.
    pub fn with_series(mut self, symbol: Symbol, samples: Vec<PriceSample>) -> Self {
        let entry = self.series.entry(symbol).or_default();
        entry.extend(samples);
        entry.sort_by_key(|sample| sample.timestamp);
        self
    }

    /// Convenience for tests and demos: `(timestamp, close)` pairs.
    pub fn with_closes(
        self,
        symbol: Symbol,
        closes: &[(UtcDateTime, f64)],
    ) -> Result<Self, CoreError> {
        let samples = closes
            .iter()
            .map(|(timestamp, close)| PriceSample::new(*timestamp, *close))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.with_series(symbol, samples))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.series.keys()
    }
}

impl MarketDataClient for FixtureMarketData {
    fn provider(&self) -> ProviderId {
        ProviderId::Fixture
    }

    fn fetch_history<'a>(&'a self, req: HistoryRequest) -> HistoryFuture<'a> {
        Box::pin(async move {
            let samples = self
                .series
                .get(&req.symbol)
                .map(|samples| {
                    samples
                        .iter()
                        .filter(|s| s.timestamp >= req.start && s.timestamp < req.end)
                        .copied()
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            Ok(PriceSeries::new(req.symbol, req.interval, samples))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::Interval;

    fn ts(value: &str) -> UtcDateTime {
        UtcDateTime::parse(value).expect("timestamp")
    }

    #[tokio::test]
    async fn filters_samples_to_requested_window() {
        let fixture = FixtureMarketData::from_json_str(
            r#"{"aapl": [
                {"timestamp": "2024-03-05T00:00:00Z", "close_price": 153.0},
                {"timestamp": "2024-03-01T00:00:00Z", "close_price": 150.0},
                {"timestamp": "2024-03-20T00:00:00Z", "close_price": 160.0}
            ]}"#,
        )
        .expect("fixture");

        let request = HistoryRequest::new(
            Symbol::parse("AAPL").expect("symbol"),
            ts("2024-02-29T00:00:00Z"),
            ts("2024-03-10T00:00:00Z"),
            Interval::Daily,
        )
        .expect("request");
        let series = fixture.fetch_history(request).await.expect("history");

        let closes: Vec<f64> = series.samples().iter().map(|s| s.close_price).collect();
        assert_eq!(closes, vec![150.0, 153.0]);
    }

    #[tokio::test]
    async fn unknown_ticker_yields_empty_series() {
        let fixture = FixtureMarketData::new();
        let request = HistoryRequest::new(
            Symbol::parse("ZZZZ").expect("symbol"),
            ts("2024-03-01T00:00:00Z"),
            ts("2024-03-02T00:00:00Z"),
            Interval::Fine,
        )
        .expect("request");

        let series = fixture.fetch_history(request).await.expect("history");
        assert!(series.is_empty());
        assert_eq!(series.interval(), Interval::Fine);
    }

    #[test]
    fn loads_fixture_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"MSFT": [{{"timestamp": "2024-01-02T14:30:00Z", "close_price": 370.6}}]}}"#
        )
        .expect("write fixture");

        let fixture = FixtureMarketData::from_json_file(file.path()).expect("fixture");
        let symbols: Vec<_> = fixture.symbols().map(Symbol::as_str).collect();
        assert_eq!(symbols, vec!["MSFT"]);
    }

    #[test]
    fn missing_file_reports_path() {
        let error = FixtureMarketData::from_json_file("/definitely/not/here.json")
            .expect_err("missing file");
        assert!(error.to_string().contains("/definitely/not/here.json"));
    }
}
