//! Output timezone for bar timestamps.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::RequestError;
use crate::timeframe::Timeframe;

const INTRADAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DAILY_FORMAT: &str = "%Y-%m-%d";

/// Timezone choice for the date column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputTimezone {
    #[serde(rename = "UTC")]
    Utc,
    /// Exchange timezone of the instrument.
    #[default]
    #[serde(rename = "market")]
    Market,
    /// System timezone.
    #[serde(rename = "local")]
    Local,
}

/// Timezone resolved for a specific symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedZone {
    Utc,
    Named(Tz),
    /// System zone whose IANA name could not be determined.
    Local,
}

/// Resolves the system timezone by IANA name, e.g. `Europe/Berlin`.
fn system_zone() -> ResolvedZone {
    match iana_time_zone::get_timezone() {
        Ok(name) => zone_from_name(&name),
        Err(e) => {
            tracing::debug!(error = %e, "System timezone name unavailable");
            ResolvedZone::Local
        }
    }
}

fn zone_from_name(name: &str) -> ResolvedZone {
    name.parse::<Tz>().map_or(ResolvedZone::Local, ResolvedZone::Named)
}

impl OutputTimezone {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Utc => "UTC",
            Self::Market => "market",
            Self::Local => "local",
        }
    }

    /// Resolves the choice for `symbol`.
    ///
    /// Every symbol currently maps to US/Eastern in market mode.
    #[must_use]
    pub fn resolve(self, _symbol: &str) -> ResolvedZone {
        match self {
            Self::Utc => ResolvedZone::Utc,
            Self::Market => ResolvedZone::Named(chrono_tz::US::Eastern),
            Self::Local => system_zone(),
        }
    }
}

impl fmt::Display for OutputTimezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputTimezone {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UTC" => Ok(Self::Utc),
            "market" => Ok(Self::Market),
            "local" => Ok(Self::Local),
            other => Err(RequestError::Unsupported {
                kind: "timezone",
                value: other.to_string(),
            }),
        }
    }
}

impl ResolvedZone {
    /// Abbreviation in effect at `at` (e.g. "EST", "EDT", "UTC").
    ///
    /// An unnamed system zone falls back to its numeric offset.
    #[must_use]
    pub fn label_at(&self, at: DateTime<Utc>) -> String {
        match self {
            Self::Utc => "UTC".to_string(),
            Self::Named(tz) => at.with_timezone(tz).format("%Z").to_string(),
            Self::Local => at.with_timezone(&Local).format("%:z").to_string(),
        }
    }

    /// Abbreviation in effect now.
    #[must_use]
    pub fn label(&self) -> String {
        self.label_at(Utc::now())
    }

    /// Header of the date column for `timeframe`.
    #[must_use]
    pub fn column_header(&self, timeframe: Timeframe) -> String {
        if timeframe.is_intraday() {
            format!("DateTime_{}", self.label())
        } else {
            "Date".to_string()
        }
    }

    /// Formats a bar timestamp for the CSV.
    ///
    /// Intraday bars are converted to this zone. Daily and longer bars keep
    /// their calendar date, since converting a midnight-UTC date westwards
    /// would move it to the previous day.
    #[must_use]
    pub fn format_timestamp(&self, ts: DateTime<Utc>, timeframe: Timeframe) -> String {
        if !timeframe.is_intraday() {
            return ts.format(DAILY_FORMAT).to_string();
        }
        match self {
            Self::Utc => ts.format(INTRADAY_FORMAT).to_string(),
            Self::Named(tz) => ts.with_timezone(tz).format(INTRADAY_FORMAT).to_string(),
            Self::Local => ts.with_timezone(&Local).format(INTRADAY_FORMAT).to_string(),
        }
    }
}
