//! CLI commands for the historical data downloader.

pub mod fetch_history;

pub use fetch_history::{run_fetch_history, FetchHistoryArgs};
