//! Bar sizes accepted by the historical data API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// Historical bar size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Timeframe {
    Sec1,
    Sec5,
    Sec10,
    Sec15,
    Sec30,
    Min1,
    Min2,
    Min3,
    Min5,
    Min10,
    Min15,
    Min20,
    Min30,
    Hour1,
    Hour2,
    Hour3,
    Hour4,
    Hour8,
    Day1,
    Week1,
    Month1,
}

impl Timeframe {
    /// Every bar size, shortest first.
    pub const ALL: [Self; 21] = [
        Self::Sec1,
        Self::Sec5,
        Self::Sec10,
        Self::Sec15,
        Self::Sec30,
        Self::Min1,
        Self::Min2,
        Self::Min3,
        Self::Min5,
        Self::Min10,
        Self::Min15,
        Self::Min20,
        Self::Min30,
        Self::Hour1,
        Self::Hour2,
        Self::Hour3,
        Self::Hour4,
        Self::Hour8,
        Self::Day1,
        Self::Week1,
        Self::Month1,
    ];

    /// Text form used by the API (e.g. "5 mins").
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sec1 => "1 secs",
            Self::Sec5 => "5 secs",
            Self::Sec10 => "10 secs",
            Self::Sec15 => "15 secs",
            Self::Sec30 => "30 secs",
            Self::Min1 => "1 min",
            Self::Min2 => "2 mins",
            Self::Min3 => "3 mins",
            Self::Min5 => "5 mins",
            Self::Min10 => "10 mins",
            Self::Min15 => "15 mins",
            Self::Min20 => "20 mins",
            Self::Min30 => "30 mins",
            Self::Hour1 => "1 hour",
            Self::Hour2 => "2 hours",
            Self::Hour3 => "3 hours",
            Self::Hour4 => "4 hours",
            Self::Hour8 => "8 hours",
            Self::Day1 => "1 day",
            Self::Week1 => "1 week",
            Self::Month1 => "1 month",
        }
    }

    /// True for bars shorter than one day.
    #[must_use]
    pub const fn is_intraday(self) -> bool {
        !matches!(self, Self::Day1 | Self::Week1 | Self::Month1)
    }

    /// True for bars of 30 seconds or less. These are subject to pacing
    /// limits and are only kept for six months.
    #[must_use]
    pub const fn is_small(self) -> bool {
        matches!(
            self,
            Self::Sec1 | Self::Sec5 | Self::Sec10 | Self::Sec15 | Self::Sec30
        )
    }

    /// Compact form used in generated filenames ("1 min" -> "1m", "2 hours" -> "2hs").
    #[must_use]
    pub fn file_token(self) -> String {
        self.as_str()
            .replace(' ', "")
            .replace("secs", "s")
            .replace("mins", "m")
            .replace("min", "m")
            .replace("hour", "h")
            .replace("day", "d")
            .replace("week", "w")
            .replace("month", "M")
    }

    /// Comma-separated list of all valid text forms, for help and error output.
    #[must_use]
    pub fn valid_list() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Self::Day1
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| RequestError::InvalidTimeframe {
                value: s.to_string(),
                valid: Self::valid_list(),
            })
    }
}

impl TryFrom<String> for Timeframe {
    type Error = RequestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(value: Timeframe) -> Self {
        value.as_str().to_string()
    }
}
