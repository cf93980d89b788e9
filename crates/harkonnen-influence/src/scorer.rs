//! Directional Scorer.

use harkonnen_core::Sentiment;
use serde::Serialize;

/// Direction a post claims for the tickers it mentions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Positive wins when both sides clear the threshold.
    pub fn classify(sentiment: &Sentiment, threshold: f64) -> Self {
        if sentiment.positive >= threshold {
            Self::Positive
        } else if sentiment.negative >= threshold {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

/// Result of comparing a label with one realized delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizonOutcome {
    Hit,
    Miss,
    /// Neutral posts make no claim.
    Abstain,
}

impl HorizonOutcome {
    pub const fn is_hit(self) -> bool {
        matches!(self, Self::Hit)
    }
}

/// Scores one horizon. A zero delta is never a hit.
pub fn score_delta(label: SentimentLabel, delta: f64) -> HorizonOutcome {
    match label {
        SentimentLabel::Neutral => HorizonOutcome::Abstain,
        SentimentLabel::Positive if delta > 0.0 => HorizonOutcome::Hit,
        SentimentLabel::Negative if delta < 0.0 => HorizonOutcome::Hit,
        SentimentLabel::Positive | SentimentLabel::Negative => HorizonOutcome::Miss,
    }
}
