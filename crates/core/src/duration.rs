//! History duration ("30 D", "6 M", "1 Y").

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// Unit of a history duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationUnit {
    Seconds,
    Days,
    Weeks,
    Months,
    Years,
}

impl DurationUnit {
    /// Single-letter code used by the API.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Seconds => 'S',
            Self::Days => 'D',
            Self::Weeks => 'W',
            Self::Months => 'M',
            Self::Years => 'Y',
        }
    }

    fn from_code(c: &str) -> Option<Self> {
        match c.to_ascii_uppercase().as_str() {
            "S" => Some(Self::Seconds),
            "D" => Some(Self::Days),
            "W" => Some(Self::Weeks),
            "M" => Some(Self::Months),
            "Y" => Some(Self::Years),
            _ => None,
        }
    }
}

/// How far back to request bars, counted from the request end time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HistoryDuration {
    pub amount: u32,
    pub unit: DurationUnit,
}

impl HistoryDuration {
    #[must_use]
    pub const fn new(amount: u32, unit: DurationUnit) -> Self {
        Self { amount, unit }
    }

    #[must_use]
    pub const fn days(amount: u32) -> Self {
        Self::new(amount, DurationUnit::Days)
    }

    #[must_use]
    pub const fn years(amount: u32) -> Self {
        Self::new(amount, DurationUnit::Years)
    }

    /// Duration without spaces, for filenames ("30 D" -> "30D").
    #[must_use]
    pub fn file_token(&self) -> String {
        format!("{}{}", self.amount, self.unit.code())
    }
}

impl Default for HistoryDuration {
    fn default() -> Self {
        Self::years(1)
    }
}

impl fmt::Display for HistoryDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.unit.code())
    }
}

impl FromStr for HistoryDuration {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RequestError::InvalidDuration(s.to_string());
        let trimmed = s.trim();

        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (digits, rest) = trimmed.split_at(split);

        let amount: u32 = digits.parse().map_err(|_| invalid())?;
        if amount == 0 {
            return Err(invalid());
        }
        let unit = DurationUnit::from_code(rest.trim_start()).ok_or_else(invalid)?;

        Ok(Self { amount, unit })
    }
}

impl TryFrom<String> for HistoryDuration {
    type Error = RequestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HistoryDuration> for String {
    fn from(value: HistoryDuration) -> Self {
        value.to_string()
    }
}
