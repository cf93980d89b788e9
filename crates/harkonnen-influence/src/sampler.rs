//! Nearest-Price Sampler with forward-fill semantics.

use harkonnen_core::{PriceSeries, UtcDateTime};

use crate::EngineConfig;

/// Close of the latest sample at or before `target`.
///
/// `None` when the series is empty or `target` precedes its first sample;
/// there is no earlier anchor to carry forward.
pub fn nearest_price(series: &PriceSeries, target: UtcDateTime) -> Option<f64> {
    let samples = series.samples();
    let after = samples.partition_point(|sample| sample.timestamp <= target);
    after.checked_sub(1).map(|index| samples[index].close_price)
}

/// The three prices a ticker needs to be scored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizonPrices {
    pub original: f64,
    pub one_day: f64,
    pub seven_day: f64,
}

/// Which of the three sample points could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPrice {
    Original,
    OneDay,
    SevenDay,
}

impl MissingPrice {
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Original => "no price at or before the post time",
            Self::OneDay => "no price at the one-day horizon",
            Self::SevenDay => "no price at the seven-day horizon",
        }
    }
}

/// Samples the post-time price and both horizon prices.
pub fn horizon_prices(
    series: &PriceSeries,
    posted_at: UtcDateTime,
    config: &EngineConfig,
) -> Result<HorizonPrices, MissingPrice> {
    let original = nearest_price(series, posted_at).ok_or(MissingPrice::Original)?;
    let one_day = nearest_price(series, posted_at.saturating_add(config.one_day_horizon))
        .ok_or(MissingPrice::OneDay)?;
    let seven_day = nearest_price(series, posted_at.saturating_add(config.seven_day_horizon))
        .ok_or(MissingPrice::SevenDay)?;

    Ok(HorizonPrices {
        original,
        one_day,
        seven_day,
    })
}

#[cfg(test)]
mod tests {
    use harkonnen_core::{Interval, PriceSample, Symbol};

    use super::*;

    fn ts(value: &str) -> UtcDateTime {
        UtcDateTime::parse(value).expect("timestamp")
    }

    fn series(points: &[(&str, f64)]) -> PriceSeries {
        let samples = points
            .iter()
            .map(|(at, close)| PriceSample::new(ts(at), *close).expect("sample"))
            .collect();
        PriceSeries::new(Symbol::parse("AAPL").expect("symbol"), Interval::Daily, samples)
    }

    #[test]
    fn forward_fills_between_samples() {
        let series = series(&[
            ("2024-03-01T00:00:00Z", 10.0),
            ("2024-03-02T00:00:00Z", 11.0),
            ("2024-03-04T00:00:00Z", 12.0),
        ]);

        assert_eq!(nearest_price(&series, ts("2024-02-29T23:59:59Z")), None);
        assert_eq!(nearest_price(&series, ts("2024-03-01T00:00:00Z")), Some(10.0));
        assert_eq!(nearest_price(&series, ts("2024-03-01T18:00:00Z")), Some(10.0));
        assert_eq!(nearest_price(&series, ts("2024-03-03T12:00:00Z")), Some(11.0));
        assert_eq!(nearest_price(&series, ts("2024-03-30T00:00:00Z")), Some(12.0));
    }

    #[test]
    fn empty_series_is_unavailable() {
        let series = series(&[]);
        assert_eq!(nearest_price(&series, ts("2024-03-01T00:00:00Z")), None);
    }

    #[test]
    fn horizon_prices_report_first_missing_point() {
        let config = EngineConfig::default();
        let late_start = series(&[("2024-03-02T00:00:00Z", 10.0)]);

        let missing = horizon_prices(&late_start, ts("2024-03-01T12:00:00Z"), &config)
            .expect_err("post precedes series");
        assert_eq!(missing, MissingPrice::Original);

        let full = series(&[
            ("2024-03-01T00:00:00Z", 150.0),
            ("2024-03-02T12:00:00Z", 153.0),
            ("2024-03-08T12:00:00Z", 148.0),
        ]);
        let prices = horizon_prices(&full, ts("2024-03-01T12:00:00Z"), &config).expect("prices");
        assert_eq!(
            prices,
            HorizonPrices {
                original: 150.0,
                one_day: 153.0,
                seven_day: 148.0,
            }
        );
    }
}
