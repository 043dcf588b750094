//! Interval lookup over start-sorted time ranges.
//!
//! Both the word store and the overlay store answer "which record covers
//! time `t`?" on every tick. A forward-only cursor breaks under scrubbing, so
//! lookups here are stateless binary searches that behave the same for
//! forward playback and arbitrary backward seeks.

use crate::core::{TimeRange, TimeSec};

/// Binary-searchable index over ranges sorted ascending by start.
///
/// Alongside the raw bounds it keeps the running maximum of end times, which
/// is monotone even when ranges overlap and therefore searchable.
#[derive(Clone, Debug, Default)]
pub struct IntervalIndex {
    starts: Vec<TimeSec>,
    ends: Vec<TimeSec>,
    max_end: Vec<TimeSec>,
}

impl IntervalIndex {
    /// Builds the index. Ranges must already be sorted by start.
    pub fn new(ranges: impl IntoIterator<Item = TimeRange>) -> Self {
        let mut index = Self::default();
        let mut running = TimeSec::NEG_INFINITY;
        for range in ranges {
            debug_assert!(
                index
                    .starts
                    .last()
                    .is_none_or(|prev| *prev <= range.start_sec),
                "ranges must be sorted by start"
            );
            running = running.max(range.end_sec);
            index.starts.push(range.start_sec);
            index.ends.push(range.end_sec);
            index.max_end.push(running);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Lowest index whose `[start, end]` contains `time`.
    ///
    /// The first position whose running max end reaches `time` is the only
    /// candidate: every earlier range ends before `time`, and every later one
    /// starts no earlier than it.
    pub fn first_containing(&self, time: TimeSec) -> Option<usize> {
        if !time.is_finite() {
            return None;
        }
        let candidate = self.max_end.partition_point(|&end| end < time);
        match self.starts.get(candidate) {
            Some(&start) if start <= time => Some(candidate),
            _ => None,
        }
    }

    /// Containing range with the latest start; ties go to the lowest index.
    ///
    /// Walks backwards from the last range starting at or before `time` and
    /// stops as soon as the running max end proves nothing earlier can match.
    pub fn latest_containing(&self, time: TimeSec) -> Option<usize> {
        if !time.is_finite() {
            return None;
        }
        let started = self.starts.partition_point(|&start| start <= time);
        let mut found = None;
        for i in (0..started).rev() {
            if self.max_end[i] < time {
                break;
            }
            if self.ends[i] >= time {
                found = Some(i);
                break;
            }
        }

        let mut best = found?;
        while best > 0 && self.starts[best - 1] == self.starts[best] && self.ends[best - 1] >= time
        {
            best -= 1;
        }
        Some(best)
    }

    /// Latest end across all ranges, in constant time
    pub fn max_end(&self) -> Option<TimeSec> {
        self.max_end.last().copied()
    }

    /// Number of ranges starting at or before `time`.
    pub fn started_by(&self, time: TimeSec) -> usize {
        if time.is_nan() {
            return 0;
        }
        self.starts.partition_point(|&start| start <= time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(ranges: &[(f64, f64)]) -> IntervalIndex {
        IntervalIndex::new(ranges.iter().map(|&(s, e)| TimeRange::new(s, e)))
    }

    #[test]
    fn test_max_end_tracks_overlaps() {
        assert_eq!(index(&[]).max_end(), None);
        let idx = index(&[(0.0, 10.0), (1.0, 3.0), (4.0, 6.0)]);
        assert_eq!(idx.max_end(), Some(10.0));
    }

    #[test]
    fn test_first_containing_basic() {
        let idx = index(&[(0.0, 0.5), (0.5, 1.0), (2.0, 2.5)]);
        assert_eq!(idx.first_containing(0.3), Some(0));
        // Shared boundary resolves to the earlier record
        assert_eq!(idx.first_containing(0.5), Some(0));
        assert_eq!(idx.first_containing(0.7), Some(1));
        assert_eq!(idx.first_containing(1.5), None);
        assert_eq!(idx.first_containing(2.5), Some(2));
        assert_eq!(idx.first_containing(3.0), None);
        assert_eq!(idx.first_containing(-1.0), None);
    }

    #[test]
    fn test_first_containing_with_overlap() {
        // A long early range encloses a short later one
        let idx = index(&[(0.0, 10.0), (1.0, 3.0), (4.0, 6.0)]);
        assert_eq!(idx.first_containing(5.0), Some(0));
        assert_eq!(idx.first_containing(10.0), Some(0));
        assert_eq!(idx.first_containing(10.5), None);
    }

    #[test]
    fn test_first_containing_skips_short_early_range() {
        let idx = index(&[(0.0, 1.0), (0.5, 5.0), (2.0, 2.5)]);
        assert_eq!(idx.first_containing(2.2), Some(1));
    }

    #[test]
    fn test_latest_containing_prefers_inner_range() {
        let idx = index(&[(0.0, 10.0), (1.0, 3.0), (4.0, 6.0), (10.0, 20.0)]);
        assert_eq!(idx.latest_containing(0.5), Some(0));
        assert_eq!(idx.latest_containing(2.0), Some(1));
        assert_eq!(idx.latest_containing(3.5), Some(0));
        assert_eq!(idx.latest_containing(5.0), Some(2));
        assert_eq!(idx.latest_containing(10.0), Some(3));
        assert_eq!(idx.latest_containing(25.0), None);
    }

    #[test]
    fn test_latest_containing_ties_go_to_document_order() {
        let idx = index(&[(1.0, 4.0), (1.0, 2.0)]);
        assert_eq!(idx.latest_containing(1.5), Some(0));
        assert_eq!(idx.latest_containing(3.0), Some(0));
    }

    #[test]
    fn test_non_finite_time_matches_nothing() {
        let idx = index(&[(0.0, 1.0)]);
        assert_eq!(idx.first_containing(f64::NAN), None);
        assert_eq!(idx.latest_containing(f64::INFINITY), None);
        assert_eq!(idx.started_by(f64::NAN), 0);
    }

    #[test]
    fn test_empty_index() {
        let idx = IntervalIndex::default();
        assert!(idx.is_empty());
        assert_eq!(idx.first_containing(0.0), None);
        assert_eq!(idx.latest_containing(0.0), None);
    }
}
