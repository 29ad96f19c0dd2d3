//! Output filename generation and existing-file handling.

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDateTime};
use ib_history_core::{HistoryDuration, SecurityKind, Timeframe};
use std::path::{Path, PathBuf};

/// Builds a descriptive filename such as `SPY_STK_30D_1m_OHLCV.csv`.
///
/// The contract month is included for futures only; `_ETH` marks extended hours.
#[must_use]
pub fn generate_filename(
    symbol: &str,
    kind: SecurityKind,
    contract_month: Option<&str>,
    duration: HistoryDuration,
    timeframe: Timeframe,
    extended_hours: bool,
) -> String {
    let mut parts = vec![symbol.to_uppercase(), kind.code().to_string()];

    if kind == SecurityKind::Future {
        if let Some(month) = contract_month.filter(|m| !m.is_empty()) {
            parts.push(month.to_string());
        }
    }

    parts.push(duration.file_token());
    parts.push(timeframe.file_token());

    if extended_hours {
        parts.push("ETH".to_string());
    }
    parts.push("OHLCV".to_string());

    format!("{}.csv", parts.join("_"))
}

/// Returns `path` if it is free, otherwise a sibling with a timestamp suffix
/// (`name_20250904_163045.csv`), then a counter (`name_20250904_163045_01.csv`).
#[must_use]
pub fn unique_filename(path: &Path, now: NaiveDateTime) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let stamp = now.format("%Y%m%d_%H%M%S");

    let mut candidate = path.with_file_name(format!("{stem}_{stamp}{ext}"));
    let mut counter = 1u32;
    while candidate.exists() {
        candidate = path.with_file_name(format!("{stem}_{stamp}_{counter:02}{ext}"));
        counter += 1;
    }
    candidate
}

/// What to do with an output file that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictChoice {
    Overwrite,
    Rename,
    Cancel,
}

/// Details shown to the user when the output file exists.
#[derive(Debug, Clone)]
pub struct ConflictInfo {
    pub path: PathBuf,
    pub absolute: PathBuf,
    pub modified: Option<DateTime<Local>>,
}

impl ConflictInfo {
    fn inspect(path: &Path) -> Self {
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Local>::from);
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        Self {
            path: path.to_path_buf(),
            absolute,
            modified,
        }
    }

    /// Modification time for display, or "unknown".
    #[must_use]
    pub fn modified_display(&self) -> String {
        self.modified
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Outcome of conflict resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Write to this path (it may replace an existing file).
    Write { path: PathBuf, replaces: bool },
    /// The user declined to write.
    Cancelled,
}

/// Decides where to write `path`.
///
/// A free path is used directly. With `overwrite` an existing file is
/// replaced. Otherwise `choose` is asked; a rename picks a unique sibling.
///
/// # Errors
/// Propagates errors from `choose`.
pub fn resolve_conflict<F>(path: &Path, overwrite: bool, choose: F) -> Result<OutputTarget>
where
    F: FnOnce(&ConflictInfo) -> Result<ConflictChoice>,
{
    if !path.exists() {
        return Ok(OutputTarget::Write {
            path: path.to_path_buf(),
            replaces: false,
        });
    }

    if overwrite {
        tracing::info!(path = %path.display(), "Overwriting existing file");
        return Ok(OutputTarget::Write {
            path: path.to_path_buf(),
            replaces: true,
        });
    }

    let info = ConflictInfo::inspect(path);
    let target = match choose(&info)? {
        ConflictChoice::Overwrite => OutputTarget::Write {
            path: path.to_path_buf(),
            replaces: true,
        },
        ConflictChoice::Rename => OutputTarget::Write {
            path: unique_filename(path, Local::now().naive_local()),
            replaces: false,
        },
        ConflictChoice::Cancel => OutputTarget::Cancelled,
    };
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 4)
            .unwrap()
            .and_hms_opt(16, 30, 45)
            .unwrap()
    }

    #[test]
    fn test_stock_filename() {
        let name = generate_filename(
            "spy",
            SecurityKind::Stock,
            None,
            HistoryDuration::days(30),
            Timeframe::Min1,
            false,
        );
        assert_eq!(name, "SPY_STK_30D_1m_OHLCV.csv");
    }

    #[test]
    fn test_future_filename_includes_month_and_eth() {
        let name = generate_filename(
            "ES",
            SecurityKind::Future,
            Some("202409"),
            HistoryDuration::years(2),
            Timeframe::Day1,
            true,
        );
        assert_eq!(name, "ES_FUT_202409_2Y_1d_ETH_OHLCV.csv");
    }

    #[test]
    fn test_month_ignored_for_stocks() {
        let name = generate_filename(
            "AAPL",
            SecurityKind::Stock,
            Some("202409"),
            HistoryDuration::years(1),
            Timeframe::Hour2,
            false,
        );
        assert_eq!(name, "AAPL_STK_1Y_2hs_OHLCV.csv");
    }

    #[test]
    fn test_unique_filename_free_path_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SPY.csv");
        assert_eq!(unique_filename(&path, stamp()), path);
    }

    #[test]
    fn test_unique_filename_appends_timestamp_then_counter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SPY.csv");
        std::fs::write(&path, "x").unwrap();

        let first = unique_filename(&path, stamp());
        assert_eq!(first, dir.path().join("SPY_20250904_163045.csv"));

        std::fs::write(&first, "x").unwrap();
        let second = unique_filename(&path, stamp());
        assert_eq!(second, dir.path().join("SPY_20250904_163045_01.csv"));
    }

    #[test]
    fn test_resolve_free_path_skips_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.csv");
        let target = resolve_conflict(&path, false, |_| panic!("should not prompt")).unwrap();
        assert_eq!(
            target,
            OutputTarget::Write {
                path,
                replaces: false
            }
        );
    }

    #[test]
    fn test_resolve_overwrite_flag_skips_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.csv");
        std::fs::write(&path, "x").unwrap();
        let target = resolve_conflict(&path, true, |_| panic!("should not prompt")).unwrap();
        assert_eq!(
            target,
            OutputTarget::Write {
                path,
                replaces: true
            }
        );
    }

    #[test]
    fn test_resolve_prompt_choices() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.csv");
        std::fs::write(&path, "x").unwrap();

        let cancelled = resolve_conflict(&path, false, |info| {
            assert_eq!(info.path, path);
            assert_ne!(info.modified_display(), "unknown");
            Ok(ConflictChoice::Cancel)
        })
        .unwrap();
        assert_eq!(cancelled, OutputTarget::Cancelled);

        let renamed = resolve_conflict(&path, false, |_| Ok(ConflictChoice::Rename)).unwrap();
        match renamed {
            OutputTarget::Write { path: new, replaces } => {
                assert!(!replaces);
                assert_ne!(new, path);
                assert!(new.to_string_lossy().contains("old_"));
            }
            OutputTarget::Cancelled => panic!("expected rename"),
        }
    }
}
