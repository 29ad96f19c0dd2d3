//! Interactive Brokers integration for historical bar downloads.
//!
//! Provides IB Gateway/TWS connectivity, contract qualification and
//! historical OHLCV requests. The wire protocol is handled by `ibapi`.

pub mod client;
pub mod error;
pub mod market_data;
pub mod types;

pub use client::{IBClient, IBConfig};
pub use error::IbError;
pub use market_data::IbBarSource;
