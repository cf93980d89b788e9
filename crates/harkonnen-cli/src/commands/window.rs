use harkonnen_core::UtcDateTime;
use harkonnen_influence::{age_in_days, is_too_recent, resolve_window, EngineConfig, FetchWindow};
use serde::Serialize;
use serde_json::Value;

use crate::cli::WindowArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct WindowResponseData {
    posted_at: UtcDateTime,
    as_of: UtcDateTime,
    age_days: i64,
    too_recent: bool,
    window: FetchWindow,
}

pub fn run(args: &WindowArgs) -> Result<Value, CliError> {
    let posted_at = UtcDateTime::parse(&args.timestamp)?;
    let as_of = super::parse_as_of(args.as_of.as_deref())?;
    let config = EngineConfig::from_env()?;

    let data = WindowResponseData {
        posted_at,
        as_of,
        age_days: age_in_days(posted_at, as_of),
        too_recent: is_too_recent(posted_at, as_of, &config),
        window: resolve_window(posted_at, as_of, &config),
    };
    Ok(serde_json::to_value(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn old_posts_fall_back_to_daily_bars() {
        let data = run(&WindowArgs {
            timestamp: String::from("2024-01-01T12:00:00+02:00"),
            as_of: Some(String::from("2024-03-20T00:00:00Z")),
        })
        .expect("window");

        assert_eq!(data["posted_at"], "2024-01-01T10:00:00Z");
        assert_eq!(data["too_recent"], false);
        assert_eq!(data["window"]["interval"], "daily");
        assert_eq!(data["window"]["start"], "2023-12-31T10:00:00Z");
        assert_eq!(data["window"]["end"], "2024-01-11T10:00:00Z");
    }
}
