//! Output handling for downloaded bars.
//!
//! This crate provides:
//! - CSV writing with timezone-aware date columns
//! - Descriptive output filenames
//! - Existing-file conflict resolution

pub mod csv_storage;
pub mod output_path;

pub use csv_storage::CsvStorage;
pub use output_path::{
    generate_filename, resolve_conflict, unique_filename, ConflictChoice, ConflictInfo,
    OutputTarget,
};
