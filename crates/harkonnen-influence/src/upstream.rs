//! Capability contracts for the stages that run before scoring.
//!
//! Sentiment classification and ticker extraction are injected into the
//! [`Annotator`](crate::Annotator) as trait objects so deterministic fakes, a
//! lexical alias matcher, or a semantic index client can be swapped freely.

use std::future::Future;
use std::pin::Pin;

use harkonnen_core::Sentiment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("sentiment classification failed: {message}")]
pub struct ClassificationError {
    message: String,
}

impl ClassificationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("ticker resolution failed: {message}")]
pub struct ResolveError {
    message: String,
}

impl ResolveError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Ticker found in a text, with the resolver's confidence.
///
/// Lexical matches carry a score of `1.0`; semantic search reports its
/// cosine similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerMatch {
    pub symbol: String,
    pub score: f64,
}

impl TickerMatch {
    pub fn exact(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            score: 1.0,
        }
    }
}

pub type ClassifyFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Sentiment, ClassificationError>> + Send + 'a>>;

pub type ResolveFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<TickerMatch>, ResolveError>> + Send + 'a>>;

/// Maps post text to a positive / negative / neutral distribution.
pub trait SentimentClassifier: Send + Sync {
    fn classify<'a>(&'a self, text: &'a str) -> ClassifyFuture<'a>;
}

/// Extracts referenced tickers from post text, most relevant first.
pub trait TickerResolver: Send + Sync {
    fn resolve_tickers<'a>(&'a self, text: &'a str) -> ResolveFuture<'a>;
}
