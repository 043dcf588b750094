//! Synchronization Engine
//!
//! Owns the immutable stores for one asset plus a single render state, and
//! maps each clock tick to the caption line, the overlay instructions and
//! any audio cues for that instant.
//!
//! The engine is a pure function of `(state, tick) -> (state', frame)`: it
//! performs no I/O and schedules nothing. Fade and hold durations are
//! reported in the frame and the host decides when to act on them.

use serde::{Deserialize, Serialize};
use specta::Type;
use tracing::{debug, info, warn};

use crate::core::captions::{CaptionContext, CaptionPayload, CaptionRenderer, SegmentIndex};
use crate::core::clock::{ClockTick, TickHint, TickSource};
use crate::core::config::{EngineConfig, PresentationMode};
use crate::core::overlays::{
    AudioCueEvent, OverlayPayload, OverlayState, OverlayStateMachine, OverlayStore,
    OverlayTiming, OverlayTransition,
};
use crate::core::prompts::Orientation;
use crate::core::timing::TimestampStore;
use crate::core::{TimeSec, WordIndex};

/// Everything the presentation layer needs after one tick
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct TickFrame {
    pub time_sec: TimeSec,
    pub hint: TickHint,
    pub caption: Option<CaptionPayload>,
    /// Set on the tick the caption line disappears
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption_fade_out_ms: Option<u32>,
    pub overlay: OverlayPayload,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<OverlayTransition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cues: Vec<AudioCueEvent>,
    pub prompt_visible: bool,
    pub active_word_index: Option<WordIndex>,
}

/// Caption and overlay synchronization engine for one media asset.
///
/// Not reentrant: ticks take `&mut self`, so there is exactly one writer.
#[derive(Clone, Debug)]
pub struct SyncEngine {
    words: TimestampStore,
    overlays: OverlayStore,
    segments: SegmentIndex,
    config: EngineConfig,
    media_duration_sec: Option<TimeSec>,

    captions: CaptionRenderer,
    overlay_state: OverlayStateMachine,
    caption: Option<CaptionPayload>,
    overlay: OverlayPayload,
    prompt_visible: bool,
    last_tick_sec: Option<TimeSec>,
}

impl SyncEngine {
    pub fn new(words: TimestampStore, overlays: OverlayStore, config: EngineConfig) -> Self {
        let config = config.normalized();
        let segments = SegmentIndex::build(words.words(), config.min_line_gap_sec);
        Self {
            captions: CaptionRenderer::new(config.style_seed),
            words,
            overlays,
            segments,
            config,
            media_duration_sec: None,
            overlay_state: OverlayStateMachine::new(),
            caption: None,
            overlay: OverlayPayload::Idle,
            prompt_visible: false,
            last_tick_sec: None,
        }
    }

    /// Engine with no asset loaded; every tick yields nothing
    pub fn empty(config: EngineConfig) -> Self {
        Self::new(TimestampStore::default(), OverlayStore::default(), config)
    }

    /// Swaps in a new asset and clears all derived state
    pub fn load_asset(&mut self, words: TimestampStore, overlays: OverlayStore) {
        info!(
            "Loading asset: {} words, {} overlays",
            words.len(),
            overlays.len()
        );
        self.segments = SegmentIndex::build(words.words(), self.config.min_line_gap_sec);
        self.words = words;
        self.overlays = overlays;
        self.media_duration_sec = None;
        self.reset();
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Updates the caption knobs; effective from the next tick
    pub fn configure(
        &mut self,
        min_line_gap_sec: TimeSec,
        words_per_caption: u32,
        hold_sec: TimeSec,
        presentation_mode: PresentationMode,
    ) {
        let config = EngineConfig {
            min_line_gap_sec,
            words_per_caption,
            hold_sec,
            presentation_mode,
            ..self.config.clone()
        };
        self.set_config(config);
    }

    /// Replaces the whole configuration; effective from the next tick
    pub fn set_config(&mut self, config: EngineConfig) {
        let config = config.normalized();

        if config.min_line_gap_sec != self.config.min_line_gap_sec {
            self.segments = SegmentIndex::build(self.words.words(), config.min_line_gap_sec);
        }
        if config.min_line_gap_sec != self.config.min_line_gap_sec
            || config.words_per_caption != self.config.words_per_caption
            || config.presentation_mode != self.config.presentation_mode
        {
            self.captions.invalidate_styles();
        }
        if config.style_seed != self.config.style_seed {
            self.captions.reseed_styles(config.style_seed);
        }

        self.config = config;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Media length used for the closing subscribe prompt.
    ///
    /// Without it the end of the last word or overlay is used.
    pub fn set_media_duration(&mut self, duration_sec: Option<TimeSec>) {
        self.media_duration_sec = duration_sec.filter(|d| d.is_finite() && *d >= 0.0);
    }

    pub fn media_duration_sec(&self) -> TimeSec {
        self.media_duration_sec
            .unwrap_or_else(|| self.words.end_sec().max(self.overlays.end_sec()))
    }

    // =========================================================================
    // Ticks
    // =========================================================================

    /// Advances to `time_sec` assuming normal playback
    pub fn on_tick(&mut self, time_sec: TimeSec) -> TickFrame {
        self.on_clock_tick(ClockTick::continuous(time_sec))
    }

    /// Advances to the tick's position, honoring its discontinuity hint.
    ///
    /// Time running backwards, or forwards by more than
    /// `seek_threshold_sec`, is treated as a seek even without the hint.
    pub fn on_clock_tick(&mut self, tick: ClockTick) -> TickFrame {
        let time_sec = tick.time_sec;

        if tick.hint == TickHint::Restart {
            self.reset();
        }

        let jumped_back = self.last_tick_sec.is_some_and(|prev| time_sec < prev);
        let discontinuous = match (tick.hint, self.last_tick_sec) {
            (TickHint::Seek | TickHint::Restart, _) | (_, None) => true,
            (TickHint::Continuous, Some(prev)) => {
                jumped_back || time_sec - prev > self.config.seek_threshold_sec
            }
        };
        if discontinuous && self.last_tick_sec.is_some() {
            debug!("Playhead jump to {:.3}s ({:?})", time_sec, tick.hint);
        }

        if time_sec.is_finite() {
            self.last_tick_sec = Some(time_sec);
        } else {
            warn!("Ignoring non-finite playhead position {}", time_sec);
        }

        let overlay_tick = self.overlay_state.on_tick(
            &self.overlays,
            time_sec,
            discontinuous,
            OverlayTiming {
                fade_out_ms: self.config.transient_fade_out_ms,
                cue_volume: self.config.cue_volume,
            },
        );

        let ctx = CaptionContext {
            store: &self.words,
            segments: &self.segments,
            words_per_caption: self.config.words_per_caption(),
            hold_sec: self.config.hold_sec,
            mode: self.config.presentation_mode,
        };
        let caption_jump = jumped_back || tick.hint != TickHint::Continuous;
        let mut caption = self.captions.on_tick(ctx, time_sec, caption_jump);

        if let Some(payload) = caption.as_mut() {
            payload.suppressed = self.config.orientation == Orientation::Portrait
                && overlay_tick.payload.is_transient();
        }

        self.prompt_visible = self.config.subscribe_prompt.is_visible(
            time_sec,
            self.media_duration_sec(),
            self.config.orientation,
        );
        let caption_fade_out_ms = (self.caption.is_some() && caption.is_none())
            .then_some(self.config.caption_fade_out_ms);
        self.caption = caption.clone();
        self.overlay = overlay_tick.payload.clone();

        TickFrame {
            time_sec,
            hint: tick.hint,
            caption,
            caption_fade_out_ms,
            overlay: overlay_tick.payload,
            transitions: overlay_tick.transitions,
            cues: overlay_tick.cues,
            prompt_visible: self.prompt_visible,
            active_word_index: self.captions.active_word(),
        }
    }

    /// Drains `source`, handing every frame to `on_frame`
    pub fn drive<S, F>(&mut self, source: &mut S, mut on_frame: F)
    where
        S: TickSource + ?Sized,
        F: FnMut(&TickFrame),
    {
        while let Some(tick) = source.next_tick() {
            let frame = self.on_clock_tick(tick);
            on_frame(&frame);
        }
    }

    /// Clears all derived state: caption hold, overlays, cue dedupe, styles
    pub fn reset(&mut self) {
        debug!("Engine reset");
        self.captions.reset(self.config.style_seed);
        self.overlay_state.reset();
        self.caption = None;
        self.overlay = OverlayPayload::Idle;
        self.prompt_visible = false;
        self.last_tick_sec = None;
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Caption produced by the last tick; pure query
    pub fn current_caption_payload(&self) -> Option<&CaptionPayload> {
        self.caption.as_ref()
    }

    /// Overlay produced by the last tick; pure query
    pub fn current_overlay_payload(&self) -> &OverlayPayload {
        &self.overlay
    }

    pub fn overlay_state(&self) -> OverlayState {
        self.overlay_state.state()
    }

    pub fn prompt_visible(&self) -> bool {
        self.prompt_visible
    }

    /// Word spoken at the last tick, for word-editor highlighting
    pub fn active_word_index(&self) -> Option<WordIndex> {
        self.captions.active_word()
    }

    pub fn segments(&self) -> &SegmentIndex {
        &self.segments
    }

    pub fn words(&self) -> &TimestampStore {
        &self.words
    }

    pub fn overlays(&self) -> &OverlayStore {
        &self.overlays
    }
}

// =============================================================================
// Tests
// =============================================================================
