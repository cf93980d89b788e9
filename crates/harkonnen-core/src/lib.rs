//! # Harkonnen Core
//!
//! Domain types and market data plumbing shared by the harkonnen influence
//! engine and CLI.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Market data sources (Yahoo chart API, offline fixtures) |
//! | [`cache`] | Memoizing decorator for any market data client |
//! | [`circuit_breaker`] | Circuit breaker for resilient upstream calls |
//! | [`domain`] | Posts, sentiment, price series, price changes |
//! | [`error`] | Validation and I/O errors |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`market_data`] | Market data client contract |
//! | [`retry`] | Retry policy with backoff and jitter |
//! | [`source`] | Provider identifiers |
//! | [`throttling`] | Request rate budget |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use harkonnen_core::{FixtureMarketData, HistoryRequest, Interval, MarketDataClient, Symbol, UtcDateTime};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = FixtureMarketData::from_json_file("prices.json")?;
//!     let request = HistoryRequest::new(
//!         Symbol::parse("AAPL")?,
//!         UtcDateTime::parse("2024-03-01T00:00:00Z")?,
//!         UtcDateTime::parse("2024-03-12T00:00:00Z")?,
//!         Interval::Daily,
//!     )?;
//!     let series = source.fetch_history(request).await?;
//!     println!("{} closes", series.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use harkonnen_core::{SourceError, SourceErrorKind};
//!
//! fn should_back_off(error: &SourceError) -> bool {
//!     matches!(error.kind(), SourceErrorKind::RateLimited | SourceErrorKind::Unavailable)
//! }
//! ```

pub mod adapters;
pub mod cache;
pub mod circuit_breaker;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod market_data;
pub mod retry;
pub mod source;
pub mod throttling;

// Adapter implementations
pub use adapters::{FixtureMarketData, YahooAdapter, YahooAuthManager, YahooConfig};

// Circuit breaker
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitPermit, CircuitState};

// Caching
pub use cache::{CacheMode, CachedMarketData};

// Domain models
pub use domain::{
    AnnotatedPost, Interval, PostRecord, PriceChange, PriceSample, PriceSeries, ProcessedPost,
    RawPost, Sentiment, Symbol, UtcDateTime,
};

// Error types
pub use error::{CoreError, ValidationError};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpErrorKind, HttpFuture, HttpRequest, HttpResponse,
    ReqwestHttpClient,
};

// Market data contract
pub use market_data::{
    HistoryFuture, HistoryRequest, MarketDataClient, SourceError, SourceErrorKind,
};

// Retry logic
pub use retry::{Backoff, RetryPolicy};

// Source identifiers
pub use source::ProviderId;

// Throttling
pub use throttling::RequestThrottle;
