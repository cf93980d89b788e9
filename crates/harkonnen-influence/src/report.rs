use harkonnen_core::ProcessedPost;
use serde::{Deserialize, Serialize};

use crate::InfluenceError;

/// A ticker mention that produced no price change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerSkip {
    pub post_id: String,
    pub ticker: String,
    pub code: String,
    pub reason: String,
}

impl TickerSkip {
    pub fn new(post_id: impl Into<String>, ticker: impl Into<String>, error: &InfluenceError) -> Self {
        Self {
            post_id: post_id.into(),
            ticker: ticker.into(),
            code: error.code().to_owned(),
            reason: error.reason().to_owned(),
        }
    }
}

/// A post that could not enter scoring at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedPost {
    pub post_id: String,
    pub code: String,
    pub reason: String,
}

impl From<&InfluenceError> for RejectedPost {
    fn from(error: &InfluenceError) -> Self {
        let post_id = match error {
            InfluenceError::InvalidTimestamp { post_id, .. }
            | InfluenceError::InvalidPost { post_id, .. } => post_id.clone(),
            InfluenceError::DataUnavailable { .. } | InfluenceError::UpstreamFailure { .. } => {
                String::new()
            }
        };
        Self {
            post_id,
            code: error.code().to_owned(),
            reason: error.to_string(),
        }
    }
}

/// Aggregate diagnostics of one batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub posts_total: usize,
    pub posts_scored: usize,
    pub posts_too_recent: usize,
    pub tickers_attempted: usize,
    pub tickers_resolved: usize,
    pub tickers_skipped: usize,
    /// Mentions counted in the score denominator.
    pub ticker_count: u64,
    pub one_day_hits: u64,
    pub seven_day_hits: u64,
    pub skipped: Vec<TickerSkip>,
    pub rejected: Vec<RejectedPost>,
}

/// Output of a batch run: both influence scores and every processed post in
/// input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub one_day_influence_score: f64,
    pub seven_day_influence_score: f64,
    pub posts: Vec<ProcessedPost>,
    pub summary: BatchSummary,
}
