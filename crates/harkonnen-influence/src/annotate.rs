//! Annotation pipeline: raw post -> sentiment -> tickers -> annotated post.

use std::sync::Arc;

use harkonnen_core::{AnnotatedPost, RawPost, ValidationError};
use thiserror::Error;
use tokio::task::JoinSet;

use crate::upstream::{ClassificationError, ResolveError, SentimentClassifier, TickerResolver};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnnotateError {
    #[error("post '{post_id}': {source}")]
    Classification {
        post_id: String,
        #[source]
        source: ClassificationError,
    },
    #[error("post '{post_id}': {source}")]
    Resolution {
        post_id: String,
        #[source]
        source: ResolveError,
    },
    #[error("post '{post_id}': classifier returned an invalid distribution: {source}")]
    InvalidSentiment {
        post_id: String,
        #[source]
        source: ValidationError,
    },
    #[error("annotation task for post '{post_id}' did not complete")]
    Aborted { post_id: String },
}

impl AnnotateError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Classification { .. } => "annotate.sentiment_failed",
            Self::Resolution { .. } => "annotate.entity_failed",
            Self::InvalidSentiment { .. } => "annotate.invalid_sentiment",
            Self::Aborted { .. } => "annotate.aborted",
        }
    }

    pub fn post_id(&self) -> &str {
        match self {
            Self::Classification { post_id, .. }
            | Self::Resolution { post_id, .. }
            | Self::InvalidSentiment { post_id, .. }
            | Self::Aborted { post_id } => post_id,
        }
    }
}

/// Composes a sentiment classifier and a ticker resolver.
#[derive(Clone)]
pub struct Annotator {
    classifier: Arc<dyn SentimentClassifier>,
    resolver: Arc<dyn TickerResolver>,
    min_score: f64,
}

impl Annotator {
    pub fn new(classifier: Arc<dyn SentimentClassifier>, resolver: Arc<dyn TickerResolver>) -> Self {
        Self {
            classifier,
            resolver,
            min_score: 0.0,
        }
    }

    /// Drops ticker matches scoring below `min_score`.
    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    pub async fn annotate(&self, raw: RawPost) -> Result<AnnotatedPost, AnnotateError> {
        let sentiment = self
            .classifier
            .classify(&raw.content)
            .await
            .map_err(|source| AnnotateError::Classification {
                post_id: raw.post_id.clone(),
                source,
            })?;

        let matches = self
            .resolver
            .resolve_tickers(&raw.content)
            .await
            .map_err(|source| AnnotateError::Resolution {
                post_id: raw.post_id.clone(),
                source,
            })?;

        let mut tickers: Vec<String> = Vec::with_capacity(matches.len());
        for candidate in matches {
            if candidate.score >= self.min_score && !tickers.contains(&candidate.symbol) {
                tickers.push(candidate.symbol);
            }
        }

        let post_id = raw.post_id.clone();
        let post = AnnotatedPost::new(raw, sentiment, tickers)
            .map_err(|source| AnnotateError::InvalidSentiment { post_id, source })?;
        tracing::debug!(post_id = %post.post_id, tickers = ?post.tickers, "annotated post");
        Ok(post)
    }

    /// Annotates posts concurrently; results keep input order.
    pub async fn annotate_all(
        &self,
        posts: Vec<RawPost>,
    ) -> Vec<Result<AnnotatedPost, AnnotateError>> {
        let ids: Vec<String> = posts.iter().map(|post| post.post_id.clone()).collect();
        let mut slots: Vec<Option<Result<AnnotatedPost, AnnotateError>>> = vec![None; posts.len()];

        let mut tasks = JoinSet::new();
        for (index, post) in posts.into_iter().enumerate() {
            let annotator = self.clone();
            tasks.spawn(async move { (index, annotator.annotate(post).await) });
        }
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(error) => tracing::error!(error = %error, "annotation task did not complete"),
            }
        }

        slots
            .into_iter()
            .zip(ids)
            .map(|(slot, post_id)| slot.unwrap_or_else(|| Err(AnnotateError::Aborted { post_id })))
            .collect()
    }
}
