//! Post Transformer: per-ticker evaluation and per-post assembly.
//!
//! Everything here is synchronous and pure over its inputs. Fetching lives in
//! [`crate::engine`], which feeds fetched series back through
//! [`evaluate_ticker`] and [`assemble_post`].

use harkonnen_core::{AnnotatedPost, PriceChange, PriceSeries, ProcessedPost, UtcDateTime};

use crate::sampler::horizon_prices;
use crate::scorer::{score_delta, HorizonOutcome, SentimentLabel};
use crate::window::{is_too_recent, resolve_window, FetchWindow};
use crate::{DenominatorPolicy, EngineConfig, InfluenceError, TickerSkip};

/// Price change of one mention plus how the post's label fared against it.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerEvaluation {
    pub change: PriceChange,
    pub one_day: HorizonOutcome,
    pub seven_day: HorizonOutcome,
}

/// Result of transforming one post.
#[derive(Debug, Clone, PartialEq)]
pub struct PostOutcome {
    pub post: ProcessedPost,
    pub one_day_hits: u32,
    pub seven_day_hits: u32,
    /// Mentions counted toward the score denominator.
    pub ticker_count: u32,
    pub attempted: u32,
    pub resolved: u32,
    pub skipped: Vec<TickerSkip>,
}

impl PostOutcome {
    /// Terminal state for posts whose longest horizon has not elapsed.
    pub fn too_recent(post: AnnotatedPost) -> Self {
        Self {
            post: ProcessedPost::pending(post),
            one_day_hits: 0,
            seven_day_hits: 0,
            ticker_count: 0,
            attempted: 0,
            resolved: 0,
            skipped: Vec::new(),
        }
    }
}

/// Turns a fetched series into a scored price change for one mention.
pub fn evaluate_ticker(
    ticker: &str,
    series: &PriceSeries,
    posted_at: UtcDateTime,
    label: SentimentLabel,
    config: &EngineConfig,
) -> Result<TickerEvaluation, InfluenceError> {
    if series.is_empty() {
        return Err(InfluenceError::data_unavailable(ticker, "empty price series"));
    }

    let prices = horizon_prices(series, posted_at, config)
        .map_err(|missing| InfluenceError::data_unavailable(ticker, missing.describe()))?;
    let change = PriceChange::from_prices(ticker, prices.original, prices.one_day, prices.seven_day)
        .map_err(|e| InfluenceError::data_unavailable(ticker, e.to_string()))?;

    Ok(TickerEvaluation {
        one_day: score_delta(label, change.one_day_delta),
        seven_day: score_delta(label, change.seven_day_delta),
        change,
    })
}

/// Folds per-mention results into a post outcome.
///
/// `results` must hold one entry per element of `post.tickers`, in the same
/// order; price changes keep that order.
pub fn assemble_post(
    post: AnnotatedPost,
    window: &FetchWindow,
    results: Vec<Result<TickerEvaluation, InfluenceError>>,
    config: &EngineConfig,
) -> PostOutcome {
    let mut changes = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();
    let mut one_day_hits = 0;
    let mut seven_day_hits = 0;
    let attempted = u32::try_from(results.len()).unwrap_or(u32::MAX);

    for (ticker, result) in post.tickers.iter().zip(results) {
        match result {
            Ok(evaluation) => {
                one_day_hits += u32::from(evaluation.one_day.is_hit());
                seven_day_hits += u32::from(evaluation.seven_day.is_hit());
                changes.push(evaluation.change);
            }
            Err(error) => {
                tracing::warn!(
                    post_id = %post.post_id,
                    ticker = %ticker,
                    window_start = %window.start,
                    window_end = %window.end,
                    interval = %window.interval,
                    code = error.code(),
                    "skipping ticker: {error}"
                );
                skipped.push(TickerSkip::new(&post.post_id, ticker, &error));
            }
        }
    }

    let resolved = u32::try_from(changes.len()).unwrap_or(u32::MAX);
    let ticker_count = match config.denominator {
        DenominatorPolicy::AllMentions => attempted,
        DenominatorPolicy::ResolvedOnly => resolved,
    };

    PostOutcome {
        post: ProcessedPost::scored(post, changes),
        one_day_hits,
        seven_day_hits,
        ticker_count,
        attempted,
        resolved,
        skipped,
    }
}

/// Transforms one post against series supplied by `lookup`.
///
/// `lookup` receives the ticker and the resolved window. Running this twice
/// with the same inputs yields the same outcome.
pub fn transform_post_with<F>(
    post: AnnotatedPost,
    as_of: UtcDateTime,
    config: &EngineConfig,
    mut lookup: F,
) -> PostOutcome
where
    F: FnMut(&str, &FetchWindow) -> Result<PriceSeries, InfluenceError>,
{
    if is_too_recent(post.timestamp, as_of, config) {
        return PostOutcome::too_recent(post);
    }

    let window = resolve_window(post.timestamp, as_of, config);
    let label = SentimentLabel::classify(&post.sentiment, config.label_threshold);
    let results = post
        .tickers
        .iter()
        .map(|ticker| {
            lookup(ticker, &window).and_then(|series| {
                evaluate_ticker(ticker, &series, post.timestamp, label, config)
            })
        })
        .collect();

    assemble_post(post, &window, results, config)
}

#[cfg(test)]
mod tests {
    use harkonnen_core::{Interval, PriceSample, RawPost, Sentiment, Symbol};

    use super::*;

    fn ts(value: &str) -> UtcDateTime {
        UtcDateTime::parse(value).expect("timestamp")
    }

    fn post(tickers: &[&str], sentiment: Sentiment) -> AnnotatedPost {
        AnnotatedPost::new(
            RawPost {
                post_id: String::from("p1"),
                timestamp: ts("2024-03-01T15:30:00Z"),
                username: String::from("user_alpha"),
                content: String::from("I think $AAPL is going to rally this week."),
            },
            sentiment,
            tickers.iter().map(|t| (*t).to_owned()).collect(),
        )
        .expect("post")
    }

    fn bullish() -> Sentiment {
        Sentiment::new(0.8, 0.1, 0.1).expect("sentiment")
    }

    fn aapl_series(window: &FetchWindow) -> PriceSeries {
        let samples = [
            ("2024-03-01T15:00:00Z", 150.0),
            ("2024-03-02T15:30:00Z", 153.0),
            ("2024-03-08T15:30:00Z", 148.0),
        ]
        .iter()
        .map(|(at, close)| PriceSample::new(ts(at), *close).expect("sample"))
        .collect();
        PriceSeries::new(Symbol::parse("AAPL").expect("symbol"), window.interval, samples)
    }

    #[test]
    fn scores_single_ticker_post() {
        let outcome = transform_post_with(
            post(&["AAPL"], bullish()),
            ts("2024-03-10T16:00:00Z"),
            &EngineConfig::default(),
            |_, window| Ok(aapl_series(window)),
        );

        assert_eq!(outcome.one_day_hits, 1);
        assert_eq!(outcome.seven_day_hits, 0);
        assert_eq!(outcome.ticker_count, 1);

        let changes = outcome.post.price_changes.expect("scored");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].ticker, "AAPL");
        assert!((changes[0].one_day_delta - 3.0).abs() < 1e-9);
        assert!((changes[0].one_day_percent - 2.0).abs() < 1e-9);
        assert!((changes[0].seven_day_delta + 2.0).abs() < 1e-9);
        assert!((changes[0].seven_day_percent + 4.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn too_recent_post_is_pending_and_inert() {
        let outcome = transform_post_with(
            post(&["AAPL", "MSFT"], bullish()),
            ts("2024-03-08T15:29:59Z"),
            &EngineConfig::default(),
            |_, _| panic!("no fetch for pending posts"),
        );

        assert!(outcome.post.is_pending());
        assert_eq!(
            (outcome.one_day_hits, outcome.seven_day_hits, outcome.ticker_count),
            (0, 0, 0)
        );
    }

    #[test]
    fn empty_series_skips_but_still_counts() {
        let outcome = transform_post_with(
            post(&["ZZZZ", "AAPL"], bullish()),
            ts("2024-03-20T00:00:00Z"),
            &EngineConfig::default(),
            |ticker, window| {
                if ticker == "AAPL" {
                    Ok(aapl_series(window))
                } else {
                    Ok(PriceSeries::empty(
                        Symbol::parse(ticker).expect("symbol"),
                        Interval::Daily,
                    ))
                }
            },
        );

        assert_eq!(outcome.ticker_count, 2);
        assert_eq!(outcome.resolved, 1);
        assert_eq!(outcome.one_day_hits, 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].ticker, "ZZZZ");
        assert_eq!(outcome.skipped[0].code, "influence.data_unavailable");

        let tickers: Vec<_> = outcome
            .post
            .price_changes
            .expect("scored")
            .into_iter()
            .map(|change| change.ticker)
            .collect();
        assert_eq!(tickers, vec!["AAPL"]);
    }

    #[test]
    fn resolved_only_policy_excludes_skips_from_count() {
        let config = EngineConfig::default().with_denominator(DenominatorPolicy::ResolvedOnly);
        let outcome = transform_post_with(
            post(&["ZZZZ", "AAPL"], bullish()),
            ts("2024-03-20T00:00:00Z"),
            &config,
            |ticker, window| {
                if ticker == "AAPL" {
                    Ok(aapl_series(window))
                } else {
                    Err(InfluenceError::upstream(ticker, "connection reset"))
                }
            },
        );

        assert_eq!(outcome.attempted, 2);
        assert_eq!(outcome.ticker_count, 1);
    }

    #[test]
    fn transform_is_idempotent() {
        let config = EngineConfig::default();
        let as_of = ts("2024-03-20T00:00:00Z");
        let run = || {
            transform_post_with(post(&["AAPL"], bullish()), as_of, &config, |_, window| {
                Ok(aapl_series(window))
            })
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn non_positive_original_price_is_unavailable() {
        let window = FetchWindow {
            start: ts("2024-02-29T15:30:00Z"),
            end: ts("2024-03-11T15:30:00Z"),
            interval: Interval::Daily,
        };
        let series = PriceSeries::new(
            Symbol::parse("AAPL").expect("symbol"),
            window.interval,
            vec![PriceSample::new(ts("2024-03-01T00:00:00Z"), 0.0).expect("sample")],
        );

        let error = evaluate_ticker(
            "AAPL",
            &series,
            ts("2024-03-01T15:30:00Z"),
            SentimentLabel::Positive,
            &EngineConfig::default(),
        )
        .expect_err("zero price");
        assert!(matches!(error, InfluenceError::DataUnavailable { .. }));
    }
}
