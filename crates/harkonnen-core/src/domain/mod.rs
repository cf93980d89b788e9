//! # Domain Models
//!
//! Canonical types shared by the market data sources and the influence
//! engine.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated ticker symbol |
//! | [`UtcDateTime`] | Instant normalized to UTC |
//! | [`Interval`] | Sampling granularity (fine / daily) |
//! | [`Sentiment`] | Positive / negative / neutral distribution |
//! | [`RawPost`] | Scraped post before annotation |
//! | [`AnnotatedPost`] | Post with sentiment and ticker mentions |
//! | [`PostRecord`] | Wire form of an annotated post |
//! | [`PriceSample`] / [`PriceSeries`] | Close prices for one fetch window |
//! | [`PriceChange`] | Per-ticker deltas after a post |
//! | [`ProcessedPost`] | Annotated post plus its price changes |
//!
//! Constructors validate their invariants and return [`ValidationError`]
//! instead of producing half-valid values.
//!
//! [`ValidationError`]: crate::ValidationError

mod interval;
mod models;
mod series;
mod symbol;
mod timestamp;

pub use interval::Interval;
pub use models::{
    AnnotatedPost, PostRecord, PriceChange, ProcessedPost, RawPost, Sentiment,
};
pub use series::{PriceSample, PriceSeries};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
