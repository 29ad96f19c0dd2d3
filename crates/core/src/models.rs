//! Request and result types shared by the data source and the writers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RequestError;
use crate::timeframe::Timeframe;
use crate::window::RequestWindow;

/// One OHLCV bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OhlcvBar {
    /// Bar start time.
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Contract as resolved by the terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifiedContract {
    pub contract_id: i32,
    pub symbol: String,
    pub local_symbol: String,
    pub exchange: String,
}

/// Price series to request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WhatToShow {
    #[default]
    Trades,
    Midpoint,
    Bid,
    Ask,
    AdjustedLast,
}

impl WhatToShow {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trades => "TRADES",
            Self::Midpoint => "MIDPOINT",
            Self::Bid => "BID",
            Self::Ask => "ASK",
            Self::AdjustedLast => "ADJUSTED_LAST",
        }
    }
}

impl fmt::Display for WhatToShow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WhatToShow {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TRADES" => Ok(Self::Trades),
            "MIDPOINT" => Ok(Self::Midpoint),
            "BID" => Ok(Self::Bid),
            "ASK" => Ok(Self::Ask),
            "ADJUSTED_LAST" => Ok(Self::AdjustedLast),
            _ => Err(RequestError::Unsupported {
                kind: "data type (use TRADES, MIDPOINT, BID, ASK or ADJUSTED_LAST)",
                value: s.to_string(),
            }),
        }
    }
}

/// A fully planned historical data request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub window: RequestWindow,
    pub timeframe: Timeframe,
    pub what_to_show: WhatToShow,
    /// Regular trading hours only.
    pub use_rth: bool,
}
