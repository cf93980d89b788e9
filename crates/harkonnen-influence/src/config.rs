use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration as StdDuration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::Duration;

/// Which ticker mentions count toward the influence-score denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DenominatorPolicy {
    /// Every mention attempted, resolved or skipped.
    #[default]
    AllMentions,
    /// Only mentions that produced a price change.
    ResolvedOnly,
}

impl DenominatorPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllMentions => "all-mentions",
            Self::ResolvedOnly => "resolved-only",
        }
    }
}

impl Display for DenominatorPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DenominatorPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "all-mentions" | "all" => Ok(Self::AllMentions),
            "resolved-only" | "resolved" => Ok(Self::ResolvedOnly),
            _ => Err(ConfigError::Invalid {
                key: "denominator",
                value: value.to_owned(),
                expected: "all-mentions or resolved-only",
            }),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: expected {expected}")]
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Tunables of the influence engine.
///
/// Defaults reproduce the behaviour the scores were calibrated with; change
/// them only when comparing batches scored under the same settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Posts at most this many whole days old are not scored yet.
    pub too_recent_days: i64,
    /// Posts at most this many whole days old are fetched at the fine interval.
    pub fine_interval_max_age_days: i64,
    pub window_lead: Duration,
    pub window_trail: Duration,
    pub one_day_horizon: Duration,
    pub seven_day_horizon: Duration,
    /// Minimum positive (then negative) probability for a directional label.
    pub label_threshold: f64,
    /// Upper bound on in-flight market data fetches.
    pub max_concurrency: usize,
    pub fetch_timeout: StdDuration,
    /// Deadline for a whole batch; `None` waits for every fetch.
    pub batch_timeout: Option<StdDuration>,
    pub denominator: DenominatorPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            too_recent_days: 7,
            fine_interval_max_age_days: 50,
            window_lead: Duration::days(1),
            window_trail: Duration::days(10),
            one_day_horizon: Duration::hours(24),
            seven_day_horizon: Duration::hours(168),
            label_threshold: 0.3,
            max_concurrency: 8,
            fetch_timeout: StdDuration::from_secs(15),
            batch_timeout: None,
            denominator: DenominatorPolicy::AllMentions,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with `HARKONNEN_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] but reading from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("HARKONNEN_TOO_RECENT_DAYS") {
            config.too_recent_days = parse_days("HARKONNEN_TOO_RECENT_DAYS", &value)?;
        }
        if let Some(value) = lookup("HARKONNEN_FINE_INTERVAL_MAX_AGE_DAYS") {
            config.fine_interval_max_age_days =
                parse_days("HARKONNEN_FINE_INTERVAL_MAX_AGE_DAYS", &value)?;
        }
        if let Some(value) = lookup("HARKONNEN_MAX_CONCURRENCY") {
            config.max_concurrency = value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    key: "HARKONNEN_MAX_CONCURRENCY",
                    value: value.clone(),
                    expected: "a positive integer",
                })?;
        }
        if let Some(value) = lookup("HARKONNEN_FETCH_TIMEOUT_MS") {
            config.fetch_timeout = parse_millis("HARKONNEN_FETCH_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("HARKONNEN_BATCH_TIMEOUT_MS") {
            config.batch_timeout = Some(parse_millis("HARKONNEN_BATCH_TIMEOUT_MS", &value)?);
        }
        if let Some(value) = lookup("HARKONNEN_DENOMINATOR") {
            config.denominator = value.parse()?;
        }

        Ok(config)
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: StdDuration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn with_batch_timeout(mut self, batch_timeout: Option<StdDuration>) -> Self {
        self.batch_timeout = batch_timeout;
        self
    }

    pub fn with_denominator(mut self, denominator: DenominatorPolicy) -> Self {
        self.denominator = denominator;
        self
    }
}

fn parse_days(key: &'static str, value: &str) -> Result<i64, ConfigError> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|days| *days >= 0)
        .ok_or_else(|| ConfigError::Invalid {
            key,
            value: value.to_owned(),
            expected: "a non-negative whole number of days",
        })
}

fn parse_millis(key: &'static str, value: &str) -> Result<StdDuration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|ms| *ms > 0)
        .map(StdDuration::from_millis)
        .ok_or_else(|| ConfigError::Invalid {
            key,
            value: value.to_owned(),
            expected: "a positive number of milliseconds",
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_calibrated_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.too_recent_days, 7);
        assert_eq!(config.fine_interval_max_age_days, 50);
        assert_eq!(config.seven_day_horizon, Duration::days(7));
        assert_eq!(config.label_threshold, 0.3);
        assert_eq!(config.denominator, DenominatorPolicy::AllMentions);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("HARKONNEN_TOO_RECENT_DAYS", "3"),
            ("HARKONNEN_MAX_CONCURRENCY", "2"),
            ("HARKONNEN_BATCH_TIMEOUT_MS", "5000"),
            ("HARKONNEN_DENOMINATOR", "resolved_only"),
        ]))
        .expect("config");

        assert_eq!(config.too_recent_days, 3);
        assert_eq!(config.fine_interval_max_age_days, 50);
        assert_eq!(config.max_concurrency, 2);
        assert_eq!(config.batch_timeout, Some(StdDuration::from_secs(5)));
        assert_eq!(config.denominator, DenominatorPolicy::ResolvedOnly);
    }

    #[test]
    fn rejects_unparsable_values() {
        let error = EngineConfig::from_lookup(lookup(&[("HARKONNEN_MAX_CONCURRENCY", "0")]))
            .expect_err("zero concurrency");
        assert!(error.to_string().contains("HARKONNEN_MAX_CONCURRENCY"));

        let error = EngineConfig::from_lookup(lookup(&[("HARKONNEN_DENOMINATOR", "some")]))
            .expect_err("unknown policy");
        assert!(matches!(error, ConfigError::Invalid { key: "denominator", .. }));
    }
}
