//! Advisory checks on timeframe/duration combinations.
//!
//! None of these block a request; they flag combinations the API is likely
//! to throttle or reject.

use crate::duration::{DurationUnit, HistoryDuration};
use crate::timeframe::Timeframe;

/// Warnings for the given request parameters, in display order.
#[must_use]
pub fn request_warnings(timeframe: Timeframe, duration: HistoryDuration) -> Vec<String> {
    let mut warnings = Vec::new();

    if timeframe.is_small() {
        warnings.push(format!(
            "WARNING: Timeframe '{timeframe}' with duration '{duration}' may hit IBKR pacing limits"
        ));
        warnings.push(
            "WARNING: Bars 30 seconds or smaller older than 6 months are not available from IBKR"
                .to_string(),
        );

        if duration.unit == DurationUnit::Years {
            warnings.push(
                "WARNING: Small timeframes with yearly durations may result in very large datasets"
                    .to_string(),
            );
        }
    }

    warnings
}
