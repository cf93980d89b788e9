//! # Harkonnen Influence
//!
//! Measures how often the direction of a post's sentiment agreed with what
//! the prices of the tickers it mentioned did afterwards.
//!
//! ## Pipeline
//!
//! ```text
//! AnnotatedPost ──▶ window ──▶ MarketDataClient ──▶ sampler ──▶ scorer
//!                                                                  │
//!                      BatchReport ◀── aggregate ◀── transform ◀───┘
//! ```
//!
//! | Stage | Module |
//! |-------|--------|
//! | Window Resolver | [`window`] |
//! | Nearest-Price Sampler | [`sampler`] |
//! | Directional Scorer | [`scorer`] |
//! | Post Transformer | [`transform`] |
//! | Batch Aggregator | [`aggregate`] |
//! | Bounded fan-out | [`engine`] |
//!
//! Upstream of scoring, [`annotate`] turns raw posts into annotated ones
//! through the [`SentimentClassifier`] and [`TickerResolver`] contracts.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use harkonnen_core::{FixtureMarketData, UtcDateTime};
//! use harkonnen_influence::{EngineConfig, InfluenceEngine};
//!
//! async fn score(posts: Vec<harkonnen_core::AnnotatedPost>) -> Result<(), Box<dyn std::error::Error>> {
//!     let prices = FixtureMarketData::from_json_file("prices.json")?;
//!     let engine = InfluenceEngine::new(Arc::new(prices), EngineConfig::from_env()?);
//!     let report = engine.score_batch(posts, UtcDateTime::now()).await;
//!     println!("1d influence: {:.2}", report.one_day_influence_score);
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod alias;
pub mod annotate;
pub mod config;
pub mod engine;
pub mod error;
pub mod report;
pub mod sampler;
pub mod scorer;
pub mod transform;
pub mod upstream;
pub mod window;

pub use aggregate::BatchAggregator;
pub use alias::{AliasTickerResolver, Company};
pub use annotate::{AnnotateError, Annotator};
pub use config::{ConfigError, DenominatorPolicy, EngineConfig};
pub use engine::InfluenceEngine;
pub use error::InfluenceError;
pub use report::{BatchReport, BatchSummary, RejectedPost, TickerSkip};
pub use sampler::{horizon_prices, nearest_price, HorizonPrices, MissingPrice};
pub use scorer::{score_delta, HorizonOutcome, SentimentLabel};
pub use transform::{
    assemble_post, evaluate_ticker, transform_post_with, PostOutcome, TickerEvaluation,
};
pub use upstream::{
    ClassificationError, ClassifyFuture, ResolveError, ResolveFuture, SentimentClassifier,
    TickerMatch, TickerResolver,
};
pub use window::{age_in_days, is_too_recent, resolve_window, FetchWindow};
