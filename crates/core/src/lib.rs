//! Core types for the IB historical data downloader.
//!
//! Holds everything that does not touch the network or the filesystem:
//! bar sizes, durations, request window planning, timezone handling,
//! contract specifications, configuration and the bar-source trait.

pub mod config;
pub mod config_loader;
pub mod contract;
pub mod duration;
pub mod error;
pub mod models;
pub mod timeframe;
pub mod timezone;
pub mod traits;
pub mod validation;
pub mod window;

pub use config::{AppConfig, ContractConfig, HistoryConfig, IbConnectionConfig};
pub use config_loader::ConfigLoader;
pub use contract::{ContractSpec, SecurityKind};
pub use duration::{DurationUnit, HistoryDuration};
pub use error::RequestError;
pub use models::{HistoryRequest, OhlcvBar, QualifiedContract, WhatToShow};
pub use timeframe::Timeframe;
pub use timezone::{OutputTimezone, ResolvedZone};
pub use traits::HistoricalBarSource;
pub use validation::request_warnings;
pub use window::{plan_window, RequestWindow, WindowMode};
