//! Load-time repairs for timed records.
//!
//! Malformed input never reaches the engine as an error. Records are sorted,
//! clamped or dropped here, and every change is written to a [`LoadReport`]
//! so the caller can surface it.

use serde::{Deserialize, Serialize};
use specta::Type;
use tracing::warn;

use crate::core::{TimeRange, TimeSec};

/// A single correction applied while loading records.
///
/// `index` always refers to the record's position in the original input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(tag = "repair", rename_all = "camelCase")]
pub enum Repair {
    /// A start or end value was not a number
    #[serde(rename_all = "camelCase")]
    DroppedNonNumeric { index: usize, field: String },
    /// A start or end value was NaN or infinite
    DroppedNonFinite { index: usize },
    /// Overlay `type` string was not recognised
    UnknownOverlayKind { index: usize, kind: String },
    /// `start > end`; the bounds were swapped
    SwappedBounds { index: usize },
    /// Start was negative and was clamped to zero
    ClampedNegativeStart { index: usize },
    /// Records were not sorted by start and have been stably re-sorted
    Resorted,
}

/// Summary of every repair applied to one input sequence
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub repairs: Vec<Repair>,
}

impl LoadReport {
    /// Returns true when the input needed no correction
    pub fn is_clean(&self) -> bool {
        self.repairs.is_empty()
    }

    pub fn push(&mut self, repair: Repair) {
        self.repairs.push(repair);
    }

    /// Appends every repair from `other`
    pub fn merge(&mut self, other: LoadReport) {
        self.repairs.extend(other.repairs);
    }

    pub fn len(&self) -> usize {
        self.repairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repairs.is_empty()
    }
}

/// Records carrying a time range that can be repaired in place
pub(crate) trait Timed {
    fn range(&self) -> TimeRange;
    fn set_range(&mut self, start_sec: TimeSec, end_sec: TimeSec);
}

/// Drops non-finite records, fixes bounds, and stably sorts by start.
///
/// `indexed` pairs each record with its position in the original input so
/// repairs can be reported against what the caller actually supplied.
pub(crate) fn sanitize<T: Timed>(
    indexed: Vec<(usize, T)>,
    label: &str,
    report: &mut LoadReport,
) -> Vec<T> {
    let mut kept: Vec<T> = Vec::with_capacity(indexed.len());

    for (index, mut item) in indexed {
        let TimeRange {
            mut start_sec,
            mut end_sec,
        } = item.range();

        if !start_sec.is_finite() || !end_sec.is_finite() {
            warn!("Dropping {} #{}: non-finite timing", label, index);
            report.push(Repair::DroppedNonFinite { index });
            continue;
        }

        if start_sec > end_sec {
            warn!(
                "{} #{} has start > end ({} > {}), swapping",
                label, index, start_sec, end_sec
            );
            std::mem::swap(&mut start_sec, &mut end_sec);
            report.push(Repair::SwappedBounds { index });
        }

        if start_sec < 0.0 {
            warn!("{} #{} starts before zero, clamping", label, index);
            start_sec = 0.0;
            end_sec = end_sec.max(0.0);
            report.push(Repair::ClampedNegativeStart { index });
        }

        item.set_range(start_sec, end_sec);
        kept.push(item);
    }

    let sorted = kept
        .windows(2)
        .all(|pair| pair[0].range().start_sec <= pair[1].range().start_sec);
    if !sorted {
        warn!("{} records were not sorted by start, re-sorting", label);
        kept.sort_by(|a, b| a.range().start_sec.total_cmp(&b.range().start_sec));
        report.push(Repair::Resorted);
    }

    kept
}
