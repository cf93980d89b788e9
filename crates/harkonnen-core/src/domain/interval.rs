use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Sampling granularity requested from a market data source.
///
/// Providers keep sub-hour history only for a bounded recent window, so
/// older windows have to fall back to daily bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interval {
    /// Two-minute bars.
    Fine,
    /// One bar per trading day.
    Daily,
}

impl Interval {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fine => "fine",
            Self::Daily => "daily",
        }
    }

    /// Interval code understood by chart-style HTTP endpoints.
    pub const fn provider_code(self) -> &'static str {
        match self {
            Self::Fine => "2m",
            Self::Daily => "1d",
        }
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fine" | "2m" => Ok(Self::Fine),
            "daily" | "1d" => Ok(Self::Daily),
            other => Err(ValidationError::InvalidInterval {
                value: other.to_owned(),
            }),
        }
    }
}
