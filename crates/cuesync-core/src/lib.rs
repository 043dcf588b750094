//! cuesync Core Facade
//!
//! Re-exports the engine library without any host dependencies and adds a
//! broadcaster that publishes payload changes to any number of subscribers.
//! Hosts (CLI, desktop shell, web bridge) subscribe instead of diffing
//! frames themselves.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

pub use cuesync_lib::core::captions::{
    CaptionPayload, CaptionSegment, CaptionWord, SegmentIndex, WordStyle,
};
pub use cuesync_lib::core::clock::{
    ClockTick, FixedRateClock, ScheduledSeek, TickHint, TickSource,
};
pub use cuesync_lib::core::config::{EngineConfig, PresentationMode};
pub use cuesync_lib::core::overlays::{
    AudioCueEvent, CueFamily, OverlayPayload, OverlayStore, OverlayTransition,
};
pub use cuesync_lib::core::prompts::Orientation;
pub use cuesync_lib::core::timing::{LoadReport, TimestampStore};
pub use cuesync_lib::core::{format_clock, CoreError, CoreResult, SyncEngine, TickFrame, TimeSec};
pub use cuesync_lib::io;

/// Default capacity of the event channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// Event Types
// =============================================================================

/// Event names used by hosts that route events by string
pub mod event_names {
    /// Caption line changed or disappeared
    pub const CAPTION_CHANGED: &str = "caption:changed";
    /// Overlay mode or content changed
    pub const OVERLAY_CHANGED: &str = "overlay:changed";
    /// One-shot sound should play
    pub const AUDIO_CUE: &str = "audio:cue";
    /// Subscribe prompt appeared or disappeared
    pub const PROMPT_CHANGED: &str = "prompt:changed";
    /// Engine state was cleared
    pub const RESET: &str = "engine:reset";
}

/// A change published to subscribers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum PlaybackEvent {
    #[serde(rename_all = "camelCase")]
    CaptionChanged {
        time_sec: TimeSec,
        caption: Option<CaptionPayload>,
    },
    #[serde(rename_all = "camelCase")]
    OverlayChanged {
        time_sec: TimeSec,
        overlay: OverlayPayload,
        transitions: Vec<OverlayTransition>,
    },
    #[serde(rename_all = "camelCase")]
    AudioCue { time_sec: TimeSec, cue: AudioCueEvent },
    #[serde(rename_all = "camelCase")]
    PromptVisibilityChanged { time_sec: TimeSec, visible: bool },
    Reset,
}

impl PlaybackEvent {
    /// Routing name of the event
    pub fn name(&self) -> &'static str {
        match self {
            Self::CaptionChanged { .. } => event_names::CAPTION_CHANGED,
            Self::OverlayChanged { .. } => event_names::OVERLAY_CHANGED,
            Self::AudioCue { .. } => event_names::AUDIO_CUE,
            Self::PromptVisibilityChanged { .. } => event_names::PROMPT_CHANGED,
            Self::Reset => event_names::RESET,
        }
    }

    /// Single-line JSON rendering
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// Broadcaster
// =============================================================================

/// Broadcaster shared between a clock task and command handlers
pub type SharedBroadcaster = Arc<Mutex<PayloadBroadcaster>>;

/// Drives a [`SyncEngine`] and publishes only what changed
pub struct PayloadBroadcaster {
    engine: SyncEngine,
    sender: broadcast::Sender<PlaybackEvent>,
    caption: Option<CaptionPayload>,
    overlay: OverlayPayload,
    prompt_visible: bool,
}

impl PayloadBroadcaster {
    pub fn new(engine: SyncEngine) -> Self {
        Self::with_capacity(engine, DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(engine: SyncEngine, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            engine,
            sender,
            caption: None,
            overlay: OverlayPayload::Idle,
            prompt_visible: false,
        }
    }

    pub fn into_shared(self) -> SharedBroadcaster {
        Arc::new(Mutex::new(self))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.sender.subscribe()
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// Mutable engine access for configuration changes
    pub fn engine_mut(&mut self) -> &mut SyncEngine {
        &mut self.engine
    }

    /// Forwards a tick and publishes the resulting changes.
    ///
    /// Returns the events that were published, in publication order.
    pub fn on_clock_tick(&mut self, tick: ClockTick) -> Vec<PlaybackEvent> {
        if tick.hint == TickHint::Restart {
            self.publish_reset();
        }

        let frame = self.engine.on_clock_tick(tick);
        let mut events = Vec::new();

        if frame.overlay != self.overlay {
            self.overlay = frame.overlay.clone();
            events.push(PlaybackEvent::OverlayChanged {
                time_sec: frame.time_sec,
                overlay: frame.overlay.clone(),
                transitions: frame.transitions.clone(),
            });
        }

        events.extend(frame.cues.iter().map(|cue| PlaybackEvent::AudioCue {
            time_sec: frame.time_sec,
            cue: cue.clone(),
        }));

        if frame.caption != self.caption {
            self.caption = frame.caption.clone();
            events.push(PlaybackEvent::CaptionChanged {
                time_sec: frame.time_sec,
                caption: frame.caption.clone(),
            });
        }

        if frame.prompt_visible != self.prompt_visible {
            self.prompt_visible = frame.prompt_visible;
            events.push(PlaybackEvent::PromptVisibilityChanged {
                time_sec: frame.time_sec,
                visible: frame.prompt_visible,
            });
        }

        for event in &events {
            self.send(event.clone());
        }
        events
    }

    pub fn on_tick(&mut self, time_sec: TimeSec) -> Vec<PlaybackEvent> {
        self.on_clock_tick(ClockTick::continuous(time_sec))
    }

    /// Clears engine state and tells subscribers to clear theirs
    pub fn reset(&mut self) {
        self.engine.reset();
        self.publish_reset();
    }

    fn publish_reset(&mut self) {
        info!("Publishing engine reset");
        self.caption = None;
        self.overlay = OverlayPayload::Idle;
        self.prompt_visible = false;
        self.send(PlaybackEvent::Reset);
    }

    fn send(&self, event: PlaybackEvent) {
        // Err only means nobody is listening right now
        if self.sender.send(event).is_err() {
            debug!("No subscribers for playback event");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
