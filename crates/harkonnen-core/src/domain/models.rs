use serde::{Deserialize, Serialize};

use crate::{UtcDateTime, ValidationError};

/// Sentiment distribution attached to a post by the upstream classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl Sentiment {
    pub fn new(positive: f64, negative: f64, neutral: f64) -> Result<Self, ValidationError> {
        let sentiment = Self {
            positive,
            negative,
            neutral,
        };
        sentiment.validate()?;
        Ok(sentiment)
    }

    /// Checks every component is a finite probability.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_probability("positive", self.positive)?;
        validate_probability("negative", self.negative)?;
        validate_probability("neutral", self.neutral)
    }
}

/// Post as scraped from a social platform, before any annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPost {
    pub post_id: String,
    pub timestamp: UtcDateTime,
    pub username: String,
    pub content: String,
}

/// Post carrying its sentiment distribution and referenced tickers.
///
/// Ticker strings are kept as delivered by the resolver so that every price
/// change can point back at exactly the mention it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedPost {
    pub post_id: String,
    pub timestamp: UtcDateTime,
    pub username: String,
    pub content: String,
    pub sentiment: Sentiment,
    #[serde(default)]
    pub tickers: Vec<String>,
}

impl AnnotatedPost {
    pub fn new(
        raw: RawPost,
        sentiment: Sentiment,
        tickers: Vec<String>,
    ) -> Result<Self, ValidationError> {
        sentiment.validate()?;
        Ok(Self {
            post_id: raw.post_id,
            timestamp: raw.timestamp,
            username: raw.username,
            content: raw.content,
            sentiment,
            tickers,
        })
    }
}

/// Wire form of an [`AnnotatedPost`] whose timestamp has not been checked yet.
///
/// Batches are decoded into records first so that one malformed timestamp
/// only rejects its own post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub post_id: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub content: String,
    pub sentiment: Sentiment,
    #[serde(default)]
    pub tickers: Vec<String>,
}

impl PostRecord {
    pub fn into_post(self) -> Result<AnnotatedPost, ValidationError> {
        let timestamp = self
            .timestamp
            .as_deref()
            .ok_or(ValidationError::MissingTimestamp)
            .and_then(UtcDateTime::parse)?;
        let raw = RawPost {
            post_id: self.post_id,
            timestamp,
            username: self.username,
            content: self.content,
        };
        AnnotatedPost::new(raw, self.sentiment, self.tickers)
    }
}

impl From<AnnotatedPost> for PostRecord {
    fn from(post: AnnotatedPost) -> Self {
        Self {
            post_id: post.post_id,
            timestamp: Some(post.timestamp.format_rfc3339()),
            username: post.username,
            content: post.content,
            sentiment: post.sentiment,
            tickers: post.tickers,
        }
    }
}

/// Price movement of one ticker after one post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    pub ticker: String,
    pub one_day_delta: f64,
    pub seven_day_delta: f64,
    pub one_day_percent: f64,
    pub seven_day_percent: f64,
}

impl PriceChange {
    /// Derives deltas and percentages from the three resolved prices.
    ///
    /// The original price is the percentage base, so it must be strictly
    /// positive.
    pub fn from_prices(
        ticker: impl Into<String>,
        original_price: f64,
        price_24h: f64,
        price_7d: f64,
    ) -> Result<Self, ValidationError> {
        validate_finite("original_price", original_price)?;
        validate_finite("price_24h", price_24h)?;
        validate_finite("price_7d", price_7d)?;
        if original_price <= 0.0 {
            return Err(ValidationError::NonPositiveValue {
                field: "original_price",
            });
        }

        let one_day_delta = price_24h - original_price;
        let seven_day_delta = price_7d - original_price;
        Ok(Self {
            ticker: ticker.into(),
            one_day_delta,
            seven_day_delta,
            one_day_percent: one_day_delta / original_price * 100.0,
            seven_day_percent: seven_day_delta / original_price * 100.0,
        })
    }
}

/// Annotated post together with the price changes observed after it.
///
/// `price_changes` is `None` while the post is too recent for the longest
/// horizon to have elapsed; it serializes as `null` in that state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedPost {
    #[serde(flatten)]
    pub post: AnnotatedPost,
    pub price_changes: Option<Vec<PriceChange>>,
}

impl ProcessedPost {
    pub fn pending(post: AnnotatedPost) -> Self {
        Self {
            post,
            price_changes: None,
        }
    }

    pub fn scored(post: AnnotatedPost, price_changes: Vec<PriceChange>) -> Self {
        Self {
            post,
            price_changes: Some(price_changes),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.price_changes.is_none()
    }
}

fn validate_probability(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::SentimentOutOfRange {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn validate_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_change_percentages_follow_original_price() {
        let change = PriceChange::from_prices("AAPL", 150.0, 153.0, 148.0).expect("valid prices");
        assert!((change.one_day_delta - 3.0).abs() < 1e-9);
        assert!((change.one_day_percent - 2.0).abs() < 1e-9);
        assert!((change.seven_day_delta + 2.0).abs() < 1e-9);
        assert!((change.seven_day_percent + 1.333_333).abs() < 1e-4);
    }

    #[test]
    fn rejects_zero_original_price() {
        let err = PriceChange::from_prices("AAPL", 0.0, 1.0, 1.0).expect_err("must fail");
        assert!(matches!(
            err,
            ValidationError::NonPositiveValue {
                field: "original_price"
            }
        ));
    }

    #[test]
    fn sentiment_components_must_be_probabilities() {
        assert!(Sentiment::new(0.8, 0.1, 0.1).is_ok());
        let err = Sentiment::new(1.2, 0.0, 0.0).expect_err("must fail");
        assert!(matches!(
            err,
            ValidationError::SentimentOutOfRange {
                field: "positive",
                ..
            }
        ));
        assert!(Sentiment::new(0.1, f64::NAN, 0.1).is_err());
    }

    #[test]
    fn record_without_timestamp_is_rejected() {
        let record: PostRecord = serde_json::from_str(
            r#"{"post_id":"p1","sentiment":{"positive":0.5,"negative":0.2,"neutral":0.3}}"#,
        )
        .expect("record should decode");
        assert!(matches!(
            record.into_post(),
            Err(ValidationError::MissingTimestamp)
        ));
    }

    #[test]
    fn pending_post_serializes_null_price_changes() {
        let record = PostRecord {
            post_id: String::from("p1"),
            timestamp: Some(String::from("2025-11-10T15:30:00")),
            username: String::from("user_alpha"),
            content: String::from("$AAPL to the moon"),
            sentiment: Sentiment::new(0.8, 0.1, 0.1).expect("valid"),
            tickers: vec![String::from("AAPL")],
        };
        let post = record.into_post().expect("valid record");
        let value = serde_json::to_value(ProcessedPost::pending(post)).expect("serializable");

        assert!(value["price_changes"].is_null());
        assert_eq!(value["timestamp"], "2025-11-10T15:30:00Z");
        assert_eq!(value["tickers"][0], "AAPL");
    }
}
