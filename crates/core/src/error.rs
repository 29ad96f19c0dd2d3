//! Error types for request planning and argument validation.

use thiserror::Error;

/// Errors raised while turning user input into a historical data request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    /// Bar size is not one of the sizes the API accepts.
    #[error("invalid timeframe '{value}'. Valid timeframes: {valid}")]
    InvalidTimeframe {
        /// The rejected input.
        value: String,
        /// Comma-separated list of accepted bar sizes.
        valid: String,
    },

    /// Duration text could not be parsed.
    #[error("invalid duration '{0}'. Use '<number> <unit>' with unit S, D, W, M or Y (e.g. \"30 D\")")]
    InvalidDuration(String),

    /// Date text matched none of the accepted formats.
    #[error("invalid date format: {0}. Use YYYY-MM-DD or YYYY-MM-DD HH:MM:SS")]
    InvalidDate(String),

    /// Start date lies after the end date.
    #[error("start date cannot be after end date")]
    StartAfterEnd,

    /// Contract parameters are incomplete or inconsistent.
    #[error("invalid contract: {0}")]
    InvalidContract(String),

    /// Unknown enumerated value (security type, timezone, data type).
    #[error("unsupported {kind} '{value}'")]
    Unsupported {
        /// What kind of value was rejected.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}

/// Result alias for request planning.
pub type Result<T> = std::result::Result<T, RequestError>;
