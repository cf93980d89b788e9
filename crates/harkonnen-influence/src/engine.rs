//! Bounded fan-out over (post, ticker) pairs.
//!
//! Every mention of every scorable post becomes one task in a [`JoinSet`].
//! A shared [`Semaphore`] caps in-flight fetches, each fetch runs under its
//! own timeout, and an optional batch deadline abandons whatever is still
//! outstanding. Results land in per-post slots that are folded only after
//! collection, so no counter is shared between tasks.

use std::sync::Arc;

use harkonnen_core::{
    AnnotatedPost, HistoryRequest, MarketDataClient, PostRecord, Symbol, UtcDateTime,
    ValidationError,
};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::scorer::SentimentLabel;
use crate::transform::{assemble_post, evaluate_ticker, PostOutcome, TickerEvaluation};
use crate::window::{is_too_recent, resolve_window, FetchWindow};
use crate::{BatchAggregator, BatchReport, EngineConfig, InfluenceError, RejectedPost};

type TickerResult = Result<TickerEvaluation, InfluenceError>;

/// Influence Scoring Engine.
///
/// Cloning is cheap; clones share the market data client and the
/// concurrency budget.
#[derive(Clone)]
pub struct InfluenceEngine {
    client: Arc<dyn MarketDataClient>,
    config: Arc<EngineConfig>,
    permits: Arc<Semaphore>,
}

impl std::fmt::Debug for InfluenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluenceEngine")
            .field("provider", &self.client.provider())
            .field("config", &self.config)
            .finish()
    }
}

struct ScorablePost {
    post: AnnotatedPost,
    window: FetchWindow,
    label: SentimentLabel,
}

enum Plan {
    TooRecent(AnnotatedPost),
    Scorable(ScorablePost),
}

impl InfluenceEngine {
    pub fn new(client: Arc<dyn MarketDataClient>, config: EngineConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
        Self {
            client,
            config: Arc::new(config),
            permits,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Scores a batch as of the current instant.
    pub async fn score_batch_now(&self, posts: Vec<AnnotatedPost>) -> BatchReport {
        self.score_batch(posts, UtcDateTime::now()).await
    }

    /// Scores a batch of annotated posts.
    ///
    /// Never fails: unusable posts are listed in `summary.rejected` and
    /// unresolvable tickers in `summary.skipped`.
    pub async fn score_batch(&self, posts: Vec<AnnotatedPost>, as_of: UtcDateTime) -> BatchReport {
        let entries = posts
            .into_iter()
            .map(|post| match post.sentiment.validate() {
                Ok(()) => Ok(post),
                Err(error) => Err(InfluenceError::InvalidPost {
                    post_id: post.post_id,
                    reason: error.to_string(),
                }),
            })
            .collect();
        self.run(entries, as_of).await
    }

    /// Scores wire records, rejecting those whose timestamp or sentiment is
    /// unusable without affecting the rest of the batch.
    pub async fn score_records(&self, records: Vec<PostRecord>, as_of: UtcDateTime) -> BatchReport {
        let entries = records.into_iter().map(record_to_post).collect();
        self.run(entries, as_of).await
    }

    /// Transforms a single post, fetching its tickers concurrently.
    pub async fn transform_post(&self, post: AnnotatedPost, as_of: UtcDateTime) -> PostOutcome {
        let mut outcomes = self.collect_outcomes(vec![post], as_of).await;
        // one outcome per input post
        outcomes.remove(0)
    }

    async fn run(
        &self,
        entries: Vec<Result<AnnotatedPost, InfluenceError>>,
        as_of: UtcDateTime,
    ) -> BatchReport {
        let total = entries.len();
        let mut posts = Vec::with_capacity(total);
        let mut rejected = Vec::new();
        for entry in entries {
            match entry {
                Ok(post) => posts.push(post),
                Err(error) => {
                    tracing::warn!(code = error.code(), "rejecting post: {error}");
                    rejected.push(RejectedPost::from(&error));
                }
            }
        }

        tracing::info!(
            posts = total,
            rejected = rejected.len(),
            provider = %self.client.provider(),
            as_of = %as_of,
            "scoring batch"
        );

        let mut aggregator = BatchAggregator::with_capacity(posts.len());
        for outcome in self.collect_outcomes(posts, as_of).await {
            aggregator.push(outcome);
        }
        for entry in rejected {
            aggregator.reject(entry);
        }

        let report = aggregator.finish();
        tracing::info!(
            posts_scored = report.summary.posts_scored,
            posts_too_recent = report.summary.posts_too_recent,
            tickers_skipped = report.summary.tickers_skipped,
            one_day_influence_score = report.one_day_influence_score,
            seven_day_influence_score = report.seven_day_influence_score,
            "batch scored"
        );
        report
    }

    async fn collect_outcomes(
        &self,
        posts: Vec<AnnotatedPost>,
        as_of: UtcDateTime,
    ) -> Vec<PostOutcome> {
        let plans: Vec<Plan> = posts
            .into_iter()
            .map(|post| self.plan(post, as_of))
            .collect();

        let mut slots: Vec<Vec<Option<TickerResult>>> = plans
            .iter()
            .map(|plan| match plan {
                Plan::TooRecent(_) => Vec::new(),
                Plan::Scorable(scorable) => vec![None; scorable.post.tickers.len()],
            })
            .collect();

        let mut tasks = JoinSet::new();
        for (post_index, plan) in plans.iter().enumerate() {
            let Plan::Scorable(scorable) = plan else {
                continue;
            };
            for (ticker_index, ticker) in scorable.post.tickers.iter().enumerate() {
                let fetch = MentionFetch {
                    client: Arc::clone(&self.client),
                    permits: Arc::clone(&self.permits),
                    config: Arc::clone(&self.config),
                    ticker: ticker.clone(),
                    posted_at: scorable.post.timestamp,
                    window: scorable.window,
                    label: scorable.label,
                };
                tasks.spawn(async move { (post_index, ticker_index, fetch.run().await) });
            }
        }

        let unfinished_reason = self.drain(&mut tasks, &mut slots).await;

        plans
            .into_iter()
            .zip(slots)
            .map(|(plan, slots)| match plan {
                Plan::TooRecent(post) => PostOutcome::too_recent(post),
                Plan::Scorable(scorable) => {
                    let results = scorable
                        .post
                        .tickers
                        .iter()
                        .zip(slots)
                        .map(|(ticker, slot)| {
                            slot.unwrap_or_else(|| {
                                Err(InfluenceError::upstream(ticker, unfinished_reason))
                            })
                        })
                        .collect();
                    assemble_post(scorable.post, &scorable.window, results, &self.config)
                }
            })
            .collect()
    }

    fn plan(&self, post: AnnotatedPost, as_of: UtcDateTime) -> Plan {
        if is_too_recent(post.timestamp, as_of, &self.config) {
            tracing::debug!(post_id = %post.post_id, "post is too recent to score");
            return Plan::TooRecent(post);
        }
        Plan::Scorable(ScorablePost {
            window: resolve_window(post.timestamp, as_of, &self.config),
            label: SentimentLabel::classify(&post.sentiment, self.config.label_threshold),
            post,
        })
    }

    /// Collects finished tasks into `slots` until all are done or the batch
    /// deadline passes. Returns the reason recorded for unfilled slots.
    async fn drain(
        &self,
        tasks: &mut JoinSet<(usize, usize, TickerResult)>,
        slots: &mut [Vec<Option<TickerResult>>],
    ) -> &'static str {
        let deadline = self
            .config
            .batch_timeout
            .map(|timeout| tokio::time::Instant::now() + timeout);

        loop {
            let joined = match deadline {
                Some(deadline) => {
                    let next = tokio::time::timeout_at(deadline, tasks.join_next()).await;
                    match next {
                        Ok(joined) => joined,
                        Err(_) => {
                            tracing::warn!(
                                outstanding = tasks.len(),
                                "batch deadline elapsed; abandoning outstanding fetches"
                            );
                            tasks.abort_all();
                            return "batch deadline elapsed before the fetch completed";
                        }
                    }
                }
                None => tasks.join_next().await,
            };

            match joined {
                None => return "ticker task did not complete",
                Some(Ok((post_index, ticker_index, result))) => {
                    slots[post_index][ticker_index] = Some(result);
                }
                Some(Err(error)) => {
                    tracing::error!(error = %error, "ticker task did not complete");
                }
            }
        }
    }
}

/// Everything one ticker task needs, owned so the task is `'static`.
struct MentionFetch {
    client: Arc<dyn MarketDataClient>,
    permits: Arc<Semaphore>,
    config: Arc<EngineConfig>,
    ticker: String,
    posted_at: UtcDateTime,
    window: FetchWindow,
    label: SentimentLabel,
}

impl MentionFetch {
    async fn run(self) -> TickerResult {
        let symbol = Symbol::parse(&self.ticker)
            .map_err(|e| InfluenceError::data_unavailable(&self.ticker, e.to_string()))?;
        let request =
            HistoryRequest::new(symbol, self.window.start, self.window.end, self.window.interval)
                .map_err(|e| InfluenceError::data_unavailable(&self.ticker, e.to_string()))?;

        let series = {
            let _permit = Arc::clone(&self.permits)
                .acquire_owned()
                .await
                .map_err(|_| InfluenceError::upstream(&self.ticker, "engine is shutting down"))?;

            match tokio::time::timeout(self.config.fetch_timeout, self.client.fetch_history(request))
                .await
            {
                Ok(Ok(series)) => series,
                Ok(Err(error)) => return Err(InfluenceError::upstream(&self.ticker, error.to_string())),
                Err(_) => {
                    return Err(InfluenceError::upstream(
                        &self.ticker,
                        format!("timed out after {}ms", self.config.fetch_timeout.as_millis()),
                    ))
                }
            }
        };

        evaluate_ticker(&self.ticker, &series, self.posted_at, self.label, &self.config)
    }
}

fn record_to_post(record: PostRecord) -> Result<AnnotatedPost, InfluenceError> {
    let post_id = record.post_id.clone();
    let raw_timestamp = record.timestamp.clone();
    record.into_post().map_err(|error| match error {
        ValidationError::MissingTimestamp => InfluenceError::InvalidTimestamp {
            post_id,
            value: String::from("<missing>"),
        },
        ValidationError::InvalidTimestamp { .. } => InfluenceError::InvalidTimestamp {
            post_id,
            value: raw_timestamp.unwrap_or_default(),
        },
        other => InfluenceError::InvalidPost {
            post_id,
            reason: other.to_string(),
        },
    })
}
