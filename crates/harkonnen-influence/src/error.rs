use thiserror::Error;

/// Failures the engine recovers from locally.
///
/// Ticker-level variants become skip records of the enclosing post;
/// post-level variants become rejected entries of the batch report. Neither
/// aborts the batch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InfluenceError {
    #[error("no usable price data for {ticker}: {reason}")]
    DataUnavailable { ticker: String, reason: String },

    #[error("post '{post_id}' has an unusable timestamp: {value}")]
    InvalidTimestamp { post_id: String, value: String },

    #[error("market data request for {ticker} failed: {message}")]
    UpstreamFailure { ticker: String, message: String },

    #[error("post '{post_id}' is invalid: {reason}")]
    InvalidPost { post_id: String, reason: String },
}

impl InfluenceError {
    pub fn data_unavailable(ticker: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            ticker: ticker.into(),
            reason: reason.into(),
        }
    }

    pub fn upstream(ticker: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UpstreamFailure {
            ticker: ticker.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code used in reports.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DataUnavailable { .. } => "influence.data_unavailable",
            Self::InvalidTimestamp { .. } => "influence.invalid_timestamp",
            Self::UpstreamFailure { .. } => "influence.upstream_failure",
            Self::InvalidPost { .. } => "influence.invalid_post",
        }
    }

    /// Human-readable cause without the identifying prefix.
    pub fn reason(&self) -> &str {
        match self {
            Self::DataUnavailable { reason, .. } | Self::InvalidPost { reason, .. } => reason,
            Self::InvalidTimestamp { value, .. } => value,
            Self::UpstreamFailure { message, .. } => message,
        }
    }

    pub const fn is_ticker_level(&self) -> bool {
        matches!(
            self,
            Self::DataUnavailable { .. } | Self::UpstreamFailure { .. }
        )
    }
}
