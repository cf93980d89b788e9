//! Batch Aggregator.

use harkonnen_core::ProcessedPost;

use crate::{BatchReport, BatchSummary, PostOutcome, RejectedPost};

/// Accumulates post outcomes into a [`BatchReport`].
///
/// Posts are kept in push order.
#[derive(Debug, Default)]
pub struct BatchAggregator {
    posts: Vec<ProcessedPost>,
    summary: BatchSummary,
}

impl BatchAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            posts: Vec::with_capacity(capacity),
            summary: BatchSummary::default(),
        }
    }

    pub fn push(&mut self, outcome: PostOutcome) {
        let summary = &mut self.summary;
        summary.posts_total += 1;
        if outcome.post.is_pending() {
            summary.posts_too_recent += 1;
        } else {
            summary.posts_scored += 1;
        }
        summary.tickers_attempted += outcome.attempted as usize;
        summary.tickers_resolved += outcome.resolved as usize;
        summary.tickers_skipped += outcome.skipped.len();
        summary.ticker_count += u64::from(outcome.ticker_count);
        summary.one_day_hits += u64::from(outcome.one_day_hits);
        summary.seven_day_hits += u64::from(outcome.seven_day_hits);
        summary.skipped.extend(outcome.skipped);

        self.posts.push(outcome.post);
    }

    pub fn reject(&mut self, rejected: RejectedPost) {
        self.summary.posts_total += 1;
        self.summary.rejected.push(rejected);
    }

    pub fn finish(self) -> BatchReport {
        let summary = self.summary;
        BatchReport {
            one_day_influence_score: ratio(summary.one_day_hits, summary.ticker_count),
            seven_day_influence_score: ratio(summary.seven_day_hits, summary.ticker_count),
            posts: self.posts,
            summary,
        }
    }
}

fn ratio(hits: u64, mentions: u64) -> f64 {
    if mentions == 0 {
        return 0.0;
    }
    hits as f64 / mentions as f64
}

#[cfg(test)]
mod tests {
    use harkonnen_core::{AnnotatedPost, PriceChange, RawPost, Sentiment, UtcDateTime};

    use super::*;

    fn post(id: &str) -> AnnotatedPost {
        AnnotatedPost::new(
            RawPost {
                post_id: id.to_owned(),
                timestamp: UtcDateTime::parse("2024-03-01T00:00:00Z").expect("timestamp"),
                username: String::from("user"),
                content: String::new(),
            },
            Sentiment::new(0.8, 0.1, 0.1).expect("sentiment"),
            vec![String::from("AAPL"), String::from("MSFT")],
        )
        .expect("post")
    }

    fn scored(id: &str, one_day_hits: u32, seven_day_hits: u32, ticker_count: u32) -> PostOutcome {
        let change = PriceChange::from_prices("AAPL", 100.0, 101.0, 99.0).expect("change");
        PostOutcome {
            post: ProcessedPost::scored(post(id), vec![change]),
            one_day_hits,
            seven_day_hits,
            ticker_count,
            attempted: ticker_count,
            resolved: 1,
            skipped: Vec::new(),
        }
    }

    #[test]
    fn empty_batch_scores_zero() {
        let report = BatchAggregator::new().finish();
        assert_eq!(report.one_day_influence_score, 0.0);
        assert_eq!(report.seven_day_influence_score, 0.0);
        assert!(report.posts.is_empty());
    }

    #[test]
    fn only_pending_posts_score_zero() {
        let mut aggregator = BatchAggregator::new();
        aggregator.push(PostOutcome::too_recent(post("p1")));
        let report = aggregator.finish();

        assert_eq!(report.one_day_influence_score, 0.0);
        assert_eq!(report.summary.posts_too_recent, 1);
        assert_eq!(report.posts.len(), 1);
    }

    #[test]
    fn scores_are_hits_over_mentions() {
        let mut aggregator = BatchAggregator::with_capacity(2);
        aggregator.push(scored("p1", 1, 0, 2));
        aggregator.push(scored("p2", 2, 1, 2));
        aggregator.reject(RejectedPost {
            post_id: String::from("p3"),
            code: String::from("influence.invalid_timestamp"),
            reason: String::from("timestamp is missing"),
        });
        let report = aggregator.finish();

        assert_eq!(report.one_day_influence_score, 0.75);
        assert_eq!(report.seven_day_influence_score, 0.25);
        assert_eq!(report.summary.posts_total, 3);
        assert_eq!(report.summary.posts_scored, 2);
        assert_eq!(report.summary.rejected.len(), 1);

        let ids: Vec<_> = report.posts.iter().map(|p| p.post.post_id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }
}
