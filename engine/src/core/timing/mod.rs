//! Word Timing Store
//!
//! Immutable, start-sorted word timings for one media asset, with
//! logarithmic lookup of the word spoken at a given instant.

mod interval;
mod repair;

pub use interval::IntervalIndex;
pub use repair::{LoadReport, Repair};

pub(crate) use repair::{sanitize, Timed};

use serde::{Deserialize, Serialize};
use specta::Type;
use tracing::info;

use super::{TimeRange, TimeSec, WordIndex};

// =============================================================================
// Word Timing
// =============================================================================

/// A single recognized spoken word with its offsets in the narration track
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct WordTiming {
    pub text: String,
    pub start_sec: TimeSec,
    pub end_sec: TimeSec,
}

impl WordTiming {
    pub fn new(text: &str, start_sec: TimeSec, end_sec: TimeSec) -> Self {
        Self {
            text: text.to_string(),
            start_sec,
            end_sec,
        }
    }

    /// Returns true if the word is being spoken at `time_sec` (inclusive bounds)
    pub fn is_active_at(&self, time_sec: TimeSec) -> bool {
        time_sec >= self.start_sec && time_sec <= self.end_sec
    }
}

impl Timed for WordTiming {
    fn range(&self) -> TimeRange {
        TimeRange {
            start_sec: self.start_sec,
            end_sec: self.end_sec,
        }
    }

    fn set_range(&mut self, start_sec: TimeSec, end_sec: TimeSec) {
        self.start_sec = start_sec;
        self.end_sec = end_sec;
    }
}

// =============================================================================
// Timestamp Store
// =============================================================================

/// Ordered word timings for one asset. Immutable once loaded.
#[derive(Clone, Debug, Default)]
pub struct TimestampStore {
    words: Vec<WordTiming>,
    index: IntervalIndex,
}

impl TimestampStore {
    /// Builds a store, repairing malformed records instead of failing.
    pub fn load(words: Vec<WordTiming>) -> (Self, LoadReport) {
        Self::load_indexed(words.into_iter().enumerate().collect())
    }

    /// Like [`load`](Self::load) but with caller-supplied original positions,
    /// used when some records were already dropped upstream.
    pub fn load_indexed(words: Vec<(usize, WordTiming)>) -> (Self, LoadReport) {
        let mut report = LoadReport::default();
        let words = sanitize(words, "word", &mut report);
        let index = IntervalIndex::new(words.iter().map(Timed::range));

        info!(
            "Loaded {} word timings ({} repairs)",
            words.len(),
            report.len()
        );

        (Self { words, index }, report)
    }

    pub fn words(&self) -> &[WordTiming] {
        &self.words
    }

    pub fn get(&self, index: WordIndex) -> Option<&WordTiming> {
        self.words.get(index)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Index of the word spoken at `time_sec`.
    ///
    /// When adjacent words share a boundary instant the earlier word wins.
    pub fn active_word_at(&self, time_sec: TimeSec) -> Option<WordIndex> {
        self.index.first_containing(time_sec)
    }

    /// End of the last spoken word, or zero for an empty store
    pub fn end_sec(&self) -> TimeSec {
        self.index.max_end().map_or(0.0, |end| end.max(0.0))
    }
}

// =============================================================================
// Tests
// =============================================================================
