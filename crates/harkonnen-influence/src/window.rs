//! Window Resolver: which slice of history a post needs.

use harkonnen_core::{Interval, UtcDateTime};
use serde::Serialize;

use crate::EngineConfig;

const SECONDS_PER_DAY: i64 = 86_400;

/// History slice and granularity to fetch for one post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchWindow {
    pub start: UtcDateTime,
    pub end: UtcDateTime,
    pub interval: Interval,
}

/// Whole days between `posted_at` and `as_of`, rounded down.
///
/// A post from the future has a negative age.
pub fn age_in_days(posted_at: UtcDateTime, as_of: UtcDateTime) -> i64 {
    let elapsed = as_of.into_inner() - posted_at.into_inner();
    elapsed.whole_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Resolves the fetch window around a post.
///
/// The window starts `window_lead` before the post and ends `window_trail`
/// after it, enough to cover the longest horizon plus non-trading days.
/// Fine bars are requested while the post is young enough for providers to
/// still keep them.
pub fn resolve_window(
    posted_at: UtcDateTime,
    as_of: UtcDateTime,
    config: &EngineConfig,
) -> FetchWindow {
    let interval = if age_in_days(posted_at, as_of) <= config.fine_interval_max_age_days {
        Interval::Fine
    } else {
        Interval::Daily
    };

    FetchWindow {
        start: posted_at.saturating_sub(config.window_lead),
        end: posted_at.saturating_add(config.window_trail),
        interval,
    }
}

/// Whether the longest horizon has not elapsed yet for a post of this age.
pub fn is_too_recent(posted_at: UtcDateTime, as_of: UtcDateTime, config: &EngineConfig) -> bool {
    age_in_days(posted_at, as_of) <= config.too_recent_days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(value: &str) -> UtcDateTime {
        UtcDateTime::parse(value).expect("timestamp")
    }

    #[test]
    fn window_pads_one_day_before_and_ten_after() {
        let window = resolve_window(
            ts("2024-03-10T15:30:00Z"),
            ts("2024-04-01T00:00:00Z"),
            &EngineConfig::default(),
        );

        assert_eq!(window.start, ts("2024-03-09T15:30:00Z"));
        assert_eq!(window.end, ts("2024-03-20T15:30:00Z"));
        assert_eq!(window.interval, Interval::Fine);
    }

    #[test]
    fn interval_switches_to_daily_after_fifty_days() {
        let config = EngineConfig::default();
        let posted = ts("2024-01-01T12:00:00Z");

        let fifty = resolve_window(posted, ts("2024-02-20T12:00:00Z"), &config);
        let fifty_one = resolve_window(posted, ts("2024-02-21T12:00:00Z"), &config);

        assert_eq!(fifty.interval, Interval::Fine);
        assert_eq!(fifty_one.interval, Interval::Daily);
    }

    #[test]
    fn age_rounds_down_like_calendar_days() {
        let posted = ts("2024-03-01T12:00:00Z");
        assert_eq!(age_in_days(posted, ts("2024-03-09T11:59:59Z")), 7);
        assert_eq!(age_in_days(posted, ts("2024-03-09T12:00:00Z")), 8);
        assert_eq!(age_in_days(posted, ts("2024-03-01T00:00:00Z")), -1);
    }

    #[test]
    fn seven_whole_days_is_still_too_recent() {
        let config = EngineConfig::default();
        let posted = ts("2024-03-01T12:00:00Z");
        assert!(is_too_recent(posted, ts("2024-03-09T11:59:59Z"), &config));
        assert!(!is_too_recent(posted, ts("2024-03-09T12:00:00Z"), &config));
    }
}
