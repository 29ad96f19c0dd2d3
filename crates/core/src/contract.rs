//! Instrument specifications.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RequestError, Result};

/// Default routing exchange for stocks.
pub const DEFAULT_STOCK_EXCHANGE: &str = "SMART";
/// Exchange used for currency pairs.
pub const FOREX_EXCHANGE: &str = "IDEALPRO";
pub const DEFAULT_CURRENCY: &str = "USD";

/// Security type of the requested instrument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityKind {
    #[default]
    #[serde(rename = "STK")]
    Stock,
    #[serde(rename = "CASH")]
    Forex,
    #[serde(rename = "FUT")]
    Future,
}

impl SecurityKind {
    /// API code ("STK", "CASH", "FUT").
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Stock => "STK",
            Self::Forex => "CASH",
            Self::Future => "FUT",
        }
    }
}

impl fmt::Display for SecurityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SecurityKind {
    type Err = RequestError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STK" => Ok(Self::Stock),
            "CASH" => Ok(Self::Forex),
            "FUT" => Ok(Self::Future),
            _ => Err(RequestError::Unsupported {
                kind: "security type (use STK, CASH or FUT)",
                value: s.to_string(),
            }),
        }
    }
}

/// Instrument to request, before the terminal has qualified it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSpec {
    /// Symbol as sent to the API. For forex this is the base currency.
    pub symbol: String,
    pub kind: SecurityKind,
    pub exchange: String,
    pub currency: String,
    /// Futures only: YYYYMM or YYYYMMDD.
    pub contract_month: Option<String>,
}

impl ContractSpec {
    /// A stock routed through `exchange`.
    #[must_use]
    pub fn stock(symbol: &str, exchange: &str, currency: &str) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            kind: SecurityKind::Stock,
            exchange: exchange.to_string(),
            currency: currency.to_string(),
            contract_month: None,
        }
    }

    /// A currency pair written as six letters ("EURUSD").
    ///
    /// # Errors
    /// Returns [`RequestError::InvalidContract`] if `pair` is not six letters.
    pub fn forex(pair: &str) -> Result<Self> {
        let pair = pair.trim().to_uppercase();
        if pair.len() != 6 || !pair.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(RequestError::InvalidContract(format!(
                "forex pair must be six letters like EURUSD, got '{pair}'"
            )));
        }
        let (base, quote) = pair.split_at(3);
        Ok(Self {
            symbol: base.to_string(),
            kind: SecurityKind::Forex,
            exchange: FOREX_EXCHANGE.to_string(),
            currency: quote.to_string(),
            contract_month: None,
        })
    }

    /// A futures contract. Contract month and exchange are required.
    ///
    /// # Errors
    /// Returns [`RequestError::InvalidContract`] if either is missing or the
    /// month is not YYYYMM / YYYYMMDD.
    pub fn future(
        symbol: &str,
        contract_month: Option<&str>,
        exchange: Option<&str>,
        currency: &str,
    ) -> Result<Self> {
        let month = contract_month.map(str::trim).filter(|m| !m.is_empty());
        let exchange = exchange.map(str::trim).filter(|e| !e.is_empty());

        let (Some(month), Some(exchange)) = (month, exchange) else {
            return Err(RequestError::InvalidContract(
                "futures require both a contract month (YYYYMM or YYYYMMDD) and an exchange"
                    .to_string(),
            ));
        };

        if !matches!(month.len(), 6 | 8) || !month.chars().all(|c| c.is_ascii_digit()) {
            return Err(RequestError::InvalidContract(format!(
                "contract month must be YYYYMM or YYYYMMDD, got '{month}'"
            )));
        }

        Ok(Self {
            symbol: symbol.trim().to_uppercase(),
            kind: SecurityKind::Future,
            exchange: exchange.to_uppercase(),
            currency: currency.to_string(),
            contract_month: Some(month.to_string()),
        })
    }

    /// Builds a spec of `kind` from user-facing parameters.
    ///
    /// # Errors
    /// Propagates validation errors from the per-kind constructors.
    pub fn build(
        kind: SecurityKind,
        symbol: &str,
        exchange: Option<&str>,
        currency: Option<&str>,
        contract_month: Option<&str>,
    ) -> Result<Self> {
        let currency = currency.unwrap_or(DEFAULT_CURRENCY);
        match kind {
            SecurityKind::Stock => Ok(Self::stock(
                symbol,
                exchange.unwrap_or(DEFAULT_STOCK_EXCHANGE),
                currency,
            )),
            SecurityKind::Forex => Self::forex(symbol),
            SecurityKind::Future => Self::future(symbol, contract_month, exchange, currency),
        }
    }

    /// Human-readable name for logs ("EUR.USD (CASH)").
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.kind {
            SecurityKind::Forex => format!("{}.{} ({})", self.symbol, self.currency, self.kind),
            SecurityKind::Future => format!(
                "{} {} ({})",
                self.symbol,
                self.contract_month.as_deref().unwrap_or_default(),
                self.kind
            ),
            SecurityKind::Stock => format!("{} ({})", self.symbol, self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_is_uppercased() {
        let spec = ContractSpec::stock("spy", "SMART", "USD");
        assert_eq!(spec.symbol, "SPY");
        assert_eq!(spec.kind, SecurityKind::Stock);
        assert_eq!(spec.display_name(), "SPY (STK)");
    }

    #[test]
    fn test_forex_splits_pair() {
        let spec = ContractSpec::forex("eurusd").unwrap();
        assert_eq!(spec.symbol, "EUR");
        assert_eq!(spec.currency, "USD");
        assert_eq!(spec.exchange, "IDEALPRO");
        assert_eq!(spec.display_name(), "EUR.USD (CASH)");
    }

    #[test]
    fn test_forex_rejects_bad_pair() {
        assert!(ContractSpec::forex("EUR").is_err());
        assert!(ContractSpec::forex("EUR/USD").is_err());
    }

    #[test]
    fn test_future_requires_month_and_exchange() {
        assert!(ContractSpec::future("ES", None, Some("CME"), "USD").is_err());
        assert!(ContractSpec::future("ES", Some("202409"), None, "USD").is_err());
        assert!(ContractSpec::future("ES", Some(""), Some("CME"), "USD").is_err());
        assert!(ContractSpec::future("ES", Some("2024-09"), Some("CME"), "USD").is_err());

        let spec = ContractSpec::future("es", Some("202409"), Some("cme"), "USD").unwrap();
        assert_eq!(spec.symbol, "ES");
        assert_eq!(spec.exchange, "CME");
        assert_eq!(spec.contract_month.as_deref(), Some("202409"));
    }

    #[test]
    fn test_build_uses_stock_defaults() {
        let spec = ContractSpec::build(SecurityKind::Stock, "aapl", None, None, None).unwrap();
        assert_eq!(spec.exchange, "SMART");
        assert_eq!(spec.currency, "USD");
    }

    #[test]
    fn test_security_kind_codes() {
        assert_eq!("cash".parse::<SecurityKind>().unwrap(), SecurityKind::Forex);
        assert_eq!(SecurityKind::Future.to_string(), "FUT");
        assert!("IND".parse::<SecurityKind>().is_err());
    }
}
