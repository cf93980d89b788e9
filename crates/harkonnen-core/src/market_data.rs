//! Market data contract consumed by the influence engine.
//!
//! A [`MarketDataClient`] turns a [`HistoryRequest`] (ticker, window,
//! interval) into a [`PriceSeries`]. Unknown tickers are not an error: the
//! client answers with an empty series and lets the caller decide what a
//! missing price means.
//!
//! # Example
//!
//! ```rust,ignore
//! use harkonnen_core::{HistoryRequest, Interval, MarketDataClient, Symbol, UtcDateTime, YahooAdapter};
//!
//! async fn closes(adapter: &YahooAdapter) -> Result<(), harkonnen_core::SourceError> {
//!     let request = HistoryRequest::new(
//!         Symbol::parse("AAPL")?,
//!         UtcDateTime::parse("2025-11-09T15:30:00Z")?,
//!         UtcDateTime::parse("2025-11-20T15:30:00Z")?,
//!         Interval::Daily,
//!     )?;
//!     let series = adapter.fetch_history(request).await?;
//!     println!("{} samples", series.len());
//!     Ok(())
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{Interval, PriceSeries, ProviderId, Symbol, UtcDateTime, ValidationError};

/// Source-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    Internal,
}

/// Structured market data error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<ValidationError> for SourceError {
    fn from(error: ValidationError) -> Self {
        Self::invalid_request(error.to_string())
    }
}

/// Request for the close-price history of one ticker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    pub start: UtcDateTime,
    pub end: UtcDateTime,
    pub interval: Interval,
}

impl HistoryRequest {
    pub fn new(
        symbol: Symbol,
        start: UtcDateTime,
        end: UtcDateTime,
        interval: Interval,
    ) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::EmptyWindow {
                start: start.format_rfc3339(),
                end: end.format_rfc3339(),
            });
        }
        Ok(Self {
            symbol,
            start,
            end,
            interval,
        })
    }
}

pub type HistoryFuture<'a> =
    Pin<Box<dyn Future<Output = Result<PriceSeries, SourceError>> + Send + 'a>>;

/// Market data source contract.
///
/// Implementations must be `Send + Sync`: the engine shares one client across
/// all concurrent ticker fetches of a batch.
pub trait MarketDataClient: Send + Sync {
    /// Returns the provider identifier used in logs and reports.
    fn provider(&self) -> ProviderId;

    /// Fetches close prices for `req.symbol` within `[req.start, req.end)`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the upstream cannot be reached, rate
    /// limits the call, or answers with something unparsable. An unknown
    /// ticker is answered with an empty series instead.
    fn fetch_history<'a>(&'a self, req: HistoryRequest) -> HistoryFuture<'a>;
}
