//! Caption Renderer
//!
//! Maps the playback time to the caption line that should be on screen.
//! Lookups are stateless binary searches; the only carried state is the last
//! payload and when it was produced, which drives the pause hold.

use serde::{Deserialize, Serialize};
use specta::Type;
use tracing::debug;

use super::segments::{CaptionSegment, SegmentIndex, SegmentKey};
use super::style::{StyleCache, WordStyle};
use crate::core::config::PresentationMode;
use crate::core::timing::TimestampStore;
use crate::core::{TimeSec, WordIndex};

// =============================================================================
// Payloads
// =============================================================================

/// One word on the caption line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct CaptionWord {
    pub text: String,
    /// True only for the word being spoken
    pub is_current: bool,
    /// Box style, present in block presentation only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<WordStyle>,
}

/// The caption line to display
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct CaptionPayload {
    pub words: Vec<CaptionWord>,
    pub segment_key: SegmentKey,
    /// The line should be hidden because an overlay covers it
    #[serde(default)]
    pub suppressed: bool,
}

impl CaptionPayload {
    /// Words joined by single spaces
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The highlighted word, if any
    pub fn current_word(&self) -> Option<&CaptionWord> {
        self.words.iter().find(|w| w.is_current)
    }
}

/// Inputs the renderer reads on each tick
#[derive(Clone, Copy, Debug)]
pub struct CaptionContext<'a> {
    pub store: &'a TimestampStore,
    pub segments: &'a SegmentIndex,
    pub words_per_caption: usize,
    pub hold_sec: TimeSec,
    pub mode: PresentationMode,
}

// =============================================================================
// Renderer
// =============================================================================

/// Caption state for one engine instance
#[derive(Clone, Debug, Default)]
pub struct CaptionRenderer {
    last: Option<CaptionPayload>,
    last_update_sec: Option<TimeSec>,
    active_word: Option<WordIndex>,
    styles: StyleCache,
}

impl CaptionRenderer {
    pub fn new(style_seed: Option<u64>) -> Self {
        Self {
            styles: StyleCache::new(style_seed),
            ..Default::default()
        }
    }

    /// Caption for `time_sec`, or `None` when the line should fade out.
    ///
    /// Between words the previous line is held for `hold_sec` after the last
    /// tick that had a spoken word. A `discontinuous` tick (seek, restart, or
    /// time running backwards) never holds a stale line.
    pub fn on_tick(
        &mut self,
        ctx: CaptionContext<'_>,
        time_sec: TimeSec,
        discontinuous: bool,
    ) -> Option<CaptionPayload> {
        if let Some(word_index) = ctx.store.active_word_at(time_sec) {
            let payload = self.compose(ctx, word_index);
            self.last = Some(payload.clone());
            self.last_update_sec = Some(time_sec);
            self.active_word = Some(word_index);
            return Some(payload);
        }

        self.active_word = None;

        if !discontinuous {
            if let (Some(last), Some(updated)) = (&self.last, self.last_update_sec) {
                let elapsed = time_sec - updated;
                if (0.0..ctx.hold_sec).contains(&elapsed) {
                    return Some(last.clone());
                }
            }
        }

        if self.last.take().is_some() {
            debug!("Caption hold expired at {:.3}s", time_sec);
            self.styles.invalidate();
        }
        self.last_update_sec = None;
        None
    }

    fn compose(&mut self, ctx: CaptionContext<'_>, word_index: WordIndex) -> CaptionPayload {
        let key = ctx
            .segments
            .display_key(word_index, ctx.words_per_caption)
            .unwrap_or_else(|| CaptionSegment::new(word_index, word_index));

        if self.last.as_ref().map(|p| p.segment_key) != Some(key) {
            debug!(
                "Caption line -> words {}..={}",
                key.start_index, key.end_index
            );
        }

        let words = (key.start_index..=key.end_index)
            .filter_map(|i| ctx.store.get(i).map(|word| (i, word)))
            .map(|(i, word)| CaptionWord {
                text: word.text.clone(),
                is_current: i == word_index,
                style: match ctx.mode {
                    PresentationMode::Block => {
                        Some(self.styles.get_style(key, i - key.start_index))
                    }
                    PresentationMode::Inline => None,
                },
            })
            .collect();

        CaptionPayload {
            words,
            segment_key: key,
            suppressed: false,
        }
    }

    /// Last payload produced or held; pure query
    pub fn current(&self) -> Option<&CaptionPayload> {
        self.last.as_ref()
    }

    /// Index of the word spoken on the last tick
    pub fn active_word(&self) -> Option<WordIndex> {
        self.active_word
    }

    pub fn styles(&self) -> &StyleCache {
        &self.styles
    }

    /// Forgets the memoized block styles, e.g. after a configuration change
    pub fn invalidate_styles(&mut self) {
        self.styles.invalidate();
    }

    /// Restarts the style sequence from `style_seed` without touching the line
    pub fn reseed_styles(&mut self, style_seed: Option<u64>) {
        self.styles.reset(style_seed);
    }

    /// Clears all caption state and restarts the style sequence
    pub fn reset(&mut self, style_seed: Option<u64>) {
        self.last = None;
        self.last_update_sec = None;
        self.active_word = None;
        self.styles.reset(style_seed);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timing::WordTiming;

    struct Fixture {
        store: TimestampStore,
        segments: SegmentIndex,
        words_per_caption: usize,
        hold_sec: f64,
        mode: PresentationMode,
    }

    impl Fixture {
        fn new(words: Vec<WordTiming>) -> Self {
            let (store, _) = TimestampStore::load(words);
            let segments = SegmentIndex::build(store.words(), 0.4);
            Self {
                store,
                segments,
                words_per_caption: 5,
                hold_sec: 2.0,
                mode: PresentationMode::Inline,
            }
        }

        fn ctx(&self) -> CaptionContext<'_> {
            CaptionContext {
                store: &self.store,
                segments: &self.segments,
                words_per_caption: self.words_per_caption,
                hold_sec: self.hold_sec,
                mode: self.mode,
            }
        }
    }

    fn abc() -> Vec<WordTiming> {
        vec![
            WordTiming::new("a", 0.0, 0.5),
            WordTiming::new("b", 0.5, 1.0),
            WordTiming::new("c", 2.0, 2.5),
        ]
    }

    #[test]
    fn test_single_word_per_caption() {
        let mut fixture = Fixture::new(abc());
        fixture.words_per_caption = 1;
        let mut renderer = CaptionRenderer::new(Some(1));

        let payload = renderer.on_tick(fixture.ctx(), 0.3, false).unwrap();
        assert_eq!(
            payload.words,
            vec![CaptionWord {
                text: "a".to_string(),
                is_current: true,
                style: None
            }]
        );
        assert_eq!(payload.segment_key, CaptionSegment::new(0, 0));
    }

    #[test]
    fn test_whole_segment_with_current_word() {
        let fixture = Fixture::new(abc());
        let mut renderer = CaptionRenderer::new(Some(1));

        let payload = renderer.on_tick(fixture.ctx(), 0.7, false).unwrap();
        assert_eq!(payload.text(), "a b");
        assert_eq!(payload.current_word().unwrap().text, "b");
        assert_eq!(payload.words.iter().filter(|w| w.is_current).count(), 1);
        assert_eq!(renderer.active_word(), Some(1));
    }

    #[test]
    fn test_idempotent_ticks() {
        let mut fixture = Fixture::new(abc());
        fixture.mode = PresentationMode::Block;
        let mut renderer = CaptionRenderer::new(None);

        let first = renderer.on_tick(fixture.ctx(), 0.3, false);
        let second = renderer.on_tick(fixture.ctx(), 0.3, false);
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn test_hold_then_fade() {
        let words = vec![WordTiming::new("last", 4.0, 5.0)];
        let fixture = Fixture::new(words);
        let mut renderer = CaptionRenderer::new(Some(1));

        let at_end = renderer.on_tick(fixture.ctx(), 5.0, false);
        assert!(at_end.is_some());
        assert_eq!(renderer.on_tick(fixture.ctx(), 6.5, false), at_end);
        assert_eq!(renderer.on_tick(fixture.ctx(), 7.1, false), None);
        assert_eq!(renderer.on_tick(fixture.ctx(), 7.2, false), None);
        assert!(renderer.current().is_none());
    }

    #[test]
    fn test_hold_boundary_is_exclusive() {
        let words = vec![WordTiming::new("x", 0.0, 1.0)];
        let fixture = Fixture::new(words);
        let mut renderer = CaptionRenderer::new(Some(1));

        renderer.on_tick(fixture.ctx(), 1.0, false);
        assert!(renderer.on_tick(fixture.ctx(), 2.999, false).is_some());
        assert!(renderer.on_tick(fixture.ctx(), 3.0, false).is_none());
    }

    #[test]
    fn test_discontinuous_tick_skips_hold() {
        let fixture = Fixture::new(abc());
        let mut renderer = CaptionRenderer::new(Some(1));

        renderer.on_tick(fixture.ctx(), 2.2, false);
        assert!(renderer.on_tick(fixture.ctx(), 1.5, true).is_none());
    }

    #[test]
    fn test_backward_seek_resolves_earlier_segment() {
        let fixture = Fixture::new(abc());
        let mut renderer = CaptionRenderer::new(Some(1));

        let later = renderer.on_tick(fixture.ctx(), 2.2, false).unwrap();
        assert_eq!(later.segment_key, CaptionSegment::new(2, 2));

        let earlier = renderer.on_tick(fixture.ctx(), 0.2, true).unwrap();
        assert_eq!(earlier.segment_key, CaptionSegment::new(0, 1));
        assert_eq!(earlier.text(), "a b");
    }

    #[test]
    fn test_block_mode_styles_follow_key() {
        let mut fixture = Fixture::new(abc());
        fixture.mode = PresentationMode::Block;
        let mut renderer = CaptionRenderer::new(Some(3));

        let first = renderer.on_tick(fixture.ctx(), 0.2, false).unwrap();
        let same_line = renderer.on_tick(fixture.ctx(), 0.8, false).unwrap();
        let styles = |p: &CaptionPayload| {
            p.words
                .iter()
                .map(|w| w.style.clone().unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(styles(&first), styles(&same_line));

        renderer.on_tick(fixture.ctx(), 2.2, false);
        assert_eq!(
            renderer.styles().cached_key(),
            Some(CaptionSegment::new(2, 2))
        );
    }

    #[test]
    fn test_empty_store_never_captions() {
        let fixture = Fixture::new(Vec::new());
        let mut renderer = CaptionRenderer::new(Some(1));
        for t in [-1.0, 0.0, 3.0, 100.0] {
            assert!(renderer.on_tick(fixture.ctx(), t, false).is_none());
        }
    }
}
