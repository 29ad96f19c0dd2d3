use anyhow::{Context, Result};
use csv::Writer;
use ib_history_core::{OhlcvBar, ResolvedZone, Timeframe};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

const PERMISSION_HINT: &str = "Possible causes:
  - File is currently open in Excel or another application
  - Insufficient write permissions in the directory
  - File is marked as read-only
Solutions:
  - Close the file in any applications and try again
  - Choose a different output directory";

pub struct CsvStorage;

impl CsvStorage {
    /// Writes bars to a CSV file.
    ///
    /// Format: `<date column>,Open,High,Low,Close,Volume`. The date column is
    /// `DateTime_<TZ>` for intraday bars and `Date` otherwise.
    ///
    /// # Errors
    /// Returns error if file cannot be created or writing fails
    pub fn write_bars(
        path: &Path,
        bars: &[OhlcvBar],
        zone: &ResolvedZone,
        timeframe: Timeframe,
    ) -> Result<usize> {
        let file = File::create(path).map_err(|e| {
            let hint = if e.kind() == io::ErrorKind::PermissionDenied {
                format!("\n{PERMISSION_HINT}")
            } else {
                String::new()
            };
            anyhow::Error::new(e).context(format!(
                "Failed to create CSV file: {}{hint}",
                path.display()
            ))
        })?;

        let written = Self::write_bars_to(file, bars, zone, timeframe)
            .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), rows = written, "CSV written");
        Ok(written)
    }

    /// Writes bars to any writer, sorted by timestamp ascending. Returns the row count.
    ///
    /// # Errors
    /// Returns error if writing fails
    pub fn write_bars_to<W: Write>(
        sink: W,
        bars: &[OhlcvBar],
        zone: &ResolvedZone,
        timeframe: Timeframe,
    ) -> Result<usize> {
        let mut writer = Writer::from_writer(sink);

        let date_header = zone.column_header(timeframe);
        writer.write_record([date_header.as_str(), "Open", "High", "Low", "Close", "Volume"])?;

        let mut sorted: Vec<&OhlcvBar> = bars.iter().collect();
        sorted.sort_by_key(|b| b.timestamp);

        for bar in &sorted {
            writer.write_record(&[
                zone.format_timestamp(bar.timestamp, timeframe),
                bar.open.normalize().to_string(),
                bar.high.normalize().to_string(),
                bar.low.normalize().to_string(),
                bar.close.normalize().to_string(),
                bar.volume.normalize().to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(sorted.len())
    }
}
