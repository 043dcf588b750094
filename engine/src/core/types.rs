//! cuesync Core Type Definitions
//!
//! Defines fundamental types shared by the timing stores, the caption
//! renderer and the overlay state machine.
//! All payload types are exported to TypeScript via specta.

use serde::{Deserialize, Serialize};
use specta::Type;
use tracing::warn;

// =============================================================================
// Index Types
// =============================================================================

/// Position of a word inside a [`TimestampStore`](crate::core::timing::TimestampStore)
pub type WordIndex = usize;

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

/// Closed time interval `[start_sec, end_sec]`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_sec: TimeSec,
    pub end_sec: TimeSec,
}

impl TimeRange {
    pub fn new(start_sec: TimeSec, end_sec: TimeSec) -> Self {
        if start_sec > end_sec {
            warn!(
                "TimeRange created with start > end ({} > {}), swapping",
                start_sec, end_sec
            );
            return Self {
                start_sec: end_sec,
                end_sec: start_sec,
            };
        }
        Self { start_sec, end_sec }
    }

    /// Returns duration in seconds
    pub fn duration(&self) -> TimeSec {
        self.end_sec - self.start_sec
    }

    /// Checks if a given time is within range (both ends inclusive)
    pub fn contains(&self, time: TimeSec) -> bool {
        time >= self.start_sec && time <= self.end_sec
    }
}

/// Formats seconds as `MM:SS` for time displays.
///
/// Negative and non-finite values render as `00:00`.
pub fn format_clock(seconds: TimeSec) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "00:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

// =============================================================================
// Tests
// =============================================================================
