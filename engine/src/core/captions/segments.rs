//! Caption Segmentation
//!
//! Splits the word sequence into caption lines wherever the narrator pauses
//! for at least `min_gap_sec`, and slices over-long lines into sub-chunks of
//! at most `words_per_caption` words.

use serde::{Deserialize, Serialize};
use specta::Type;
use tracing::debug;

use crate::core::timing::{TimestampStore, WordTiming};
use crate::core::{TimeSec, WordIndex};

// =============================================================================
// Caption Segment
// =============================================================================

/// Inclusive, contiguous range of word indices shown as one caption line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct CaptionSegment {
    pub start_index: WordIndex,
    pub end_index: WordIndex,
}

/// Identifies what is currently on the caption line: a whole segment or one
/// of its sub-chunks
pub type SegmentKey = CaptionSegment;

impl CaptionSegment {
    pub fn new(start_index: WordIndex, end_index: WordIndex) -> Self {
        debug_assert!(start_index <= end_index);
        Self {
            start_index,
            end_index,
        }
    }

    /// Number of words in the segment
    pub fn len(&self) -> usize {
        self.end_index - self.start_index + 1
    }

    /// Never true; a segment holds at least one word
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, index: WordIndex) -> bool {
        index >= self.start_index && index <= self.end_index
    }

    /// Sub-chunk of this segment holding `word_index`.
    ///
    /// `chunk = floor(local_index / words_per_caption)`; boundaries are
    /// derived on demand and never cached.
    pub fn sub_chunk(&self, word_index: WordIndex, words_per_caption: usize) -> SegmentKey {
        let per = words_per_caption.max(1);
        if self.len() <= per {
            return *self;
        }
        let local = word_index.clamp(self.start_index, self.end_index) - self.start_index;
        let chunk_start = self.start_index + (local / per) * per;
        let chunk_end = (chunk_start + per - 1).min(self.end_index);
        Self::new(chunk_start, chunk_end)
    }
}

// =============================================================================
// Segment Index
// =============================================================================

/// Ordered segments exactly covering `[0, len - 1]` of a word sequence
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SegmentIndex {
    segments: Vec<CaptionSegment>,
    min_gap_sec: TimeSec,
}

impl SegmentIndex {
    /// Splits `words` at every pause of at least `min_gap_sec`
    pub fn build(words: &[WordTiming], min_gap_sec: TimeSec) -> Self {
        let mut segments = Vec::new();

        if !words.is_empty() {
            let mut open = 0;
            for (i, pair) in words.windows(2).enumerate() {
                if pair[1].start_sec - pair[0].end_sec >= min_gap_sec {
                    segments.push(CaptionSegment::new(open, i));
                    open = i + 1;
                }
            }
            segments.push(CaptionSegment::new(open, words.len() - 1));
        }

        debug!(
            "Built {} caption segments from {} words (min gap {:.2}s)",
            segments.len(),
            words.len(),
            min_gap_sec
        );

        Self {
            segments,
            min_gap_sec,
        }
    }

    pub fn segments(&self) -> &[CaptionSegment] {
        &self.segments
    }

    pub fn min_gap_sec(&self) -> TimeSec {
        self.min_gap_sec
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segment holding `word_index`, by binary search over segment starts
    pub fn locate_word(&self, word_index: WordIndex) -> Option<CaptionSegment> {
        let after = self
            .segments
            .partition_point(|segment| segment.start_index <= word_index);
        let segment = *self.segments.get(after.checked_sub(1)?)?;
        segment.contains(word_index).then_some(segment)
    }

    /// Segment whose word is being spoken at `time_sec`
    pub fn locate_time(
        &self,
        store: &TimestampStore,
        time_sec: TimeSec,
    ) -> Option<CaptionSegment> {
        self.locate_word(store.active_word_at(time_sec)?)
    }

    /// What the caption line shows while `word_index` is spoken
    pub fn display_key(&self, word_index: WordIndex, words_per_caption: usize) -> Option<SegmentKey> {
        self.locate_word(word_index)
            .map(|segment| segment.sub_chunk(word_index, words_per_caption))
    }
}

// =============================================================================
// Tests
// =============================================================================
