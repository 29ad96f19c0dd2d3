//! Command-line front end for downloading historical bars from IB Gateway/TWS.

pub mod commands;
pub mod prompt;
