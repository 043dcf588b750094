//! Overlay State Machine
//!
//! Tracks which overlay is on screen: nothing, a transient heading/list item,
//! or a staying heading with its accumulated list items. Also decides when a
//! one-shot audio cue should play.
//!
//! The machine never schedules anything itself. Fades are reported as
//! [`OverlayTransition`] hints with their delays, and the presentation layer
//! owns the timers.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use specta::Type;
use tracing::debug;

use super::models::{CueFamily, OverlayEvent, OverlayKind, OverlayStore};
use crate::core::TimeSec;

// =============================================================================
// Payloads
// =============================================================================

/// What the overlay layer should show
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Type, Default)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum OverlayPayload {
    #[default]
    Idle,
    #[serde(rename_all = "camelCase")]
    Transient { text: String, kind: OverlayKind },
    #[serde(rename_all = "camelCase")]
    Staying {
        #[serde(skip_serializing_if = "Option::is_none")]
        heading_text: Option<String>,
        list_items: Vec<String>,
    },
}

impl OverlayPayload {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Overlay element a transition applies to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub enum OverlayLayer {
    Transient,
    StayingHeading,
    StayingListItem,
    /// Staying heading together with its list
    Staying,
}

/// Animation hint for the presentation layer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(tag = "transition", rename_all = "camelCase")]
pub enum OverlayTransition {
    FadeIn {
        layer: OverlayLayer,
    },
    /// Start fading out and remove the element after `after_ms`
    #[serde(rename_all = "camelCase")]
    FadeOut {
        layer: OverlayLayer,
        after_ms: u32,
    },
    /// Remove immediately
    Hide {
        layer: OverlayLayer,
    },
}

/// One-shot sound request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct AudioCueEvent {
    pub family: CueFamily,
    pub text: String,
    pub volume: f64,
}

/// Result of one overlay tick
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayTick {
    pub payload: OverlayPayload,
    pub transitions: Vec<OverlayTransition>,
    pub cues: Vec<AudioCueEvent>,
}

/// Knobs the machine reads on every tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayTiming {
    pub fade_out_ms: u32,
    pub cue_volume: f64,
}

/// Read-only view of the machine's state
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OverlayState {
    Idle,
    ShowingTransient {
        text: String,
        kind: OverlayKind,
    },
    ShowingStaying {
        heading_text: Option<String>,
        list_items: Vec<String>,
    },
}

// =============================================================================
// State Machine
// =============================================================================

/// Overlay state for one engine instance
#[derive(Clone, Debug, Default)]
pub struct OverlayStateMachine {
    transient: Option<(String, OverlayKind)>,
    staying_heading: Option<String>,
    staying_items: Vec<String>,
    /// Texts already cued since the last tick with no active overlay
    cued: HashSet<(CueFamily, String)>,
    /// False until the first tick has rebuilt the staying context
    synced: bool,
}

impl OverlayStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances to `time_sec`.
    ///
    /// `discontinuous` marks a seek or restart: the staying context is then
    /// rebuilt from every event that started before `time_sec`, so a jump
    /// lands on the same state continuous playback would have reached. The
    /// first tick after construction or reset is always treated this way.
    pub fn on_tick(
        &mut self,
        store: &OverlayStore,
        time_sec: TimeSec,
        discontinuous: bool,
        timing: OverlayTiming,
    ) -> OverlayTick {
        let mut transitions = Vec::new();
        let mut cues = Vec::new();

        if discontinuous || !self.synced {
            self.resync(store, time_sec, &mut transitions);
            self.synced = true;
        }

        match store.active_at(time_sec) {
            None => {
                if self.transient.take().is_some() {
                    transitions.push(OverlayTransition::FadeOut {
                        layer: OverlayLayer::Transient,
                        after_ms: timing.fade_out_ms,
                    });
                }
                self.cued.clear();
            }
            Some((_, event)) => {
                self.apply(event, timing, &mut transitions);

                let family = event.kind.cue_family();
                if self.cued.insert((family, event.text.clone())) {
                    debug!("Audio cue {:?} for {:?}", family, event.text);
                    cues.push(AudioCueEvent {
                        family,
                        text: event.text.clone(),
                        volume: timing.cue_volume,
                    });
                }
            }
        }

        OverlayTick {
            payload: self.payload(),
            transitions,
            cues,
        }
    }

    fn apply(
        &mut self,
        event: &OverlayEvent,
        timing: OverlayTiming,
        transitions: &mut Vec<OverlayTransition>,
    ) {
        match event.kind {
            OverlayKind::StayingHeading => {
                self.leave_transient(timing, transitions);
                if self.staying_heading.as_deref() != Some(event.text.as_str()) {
                    self.staying_heading = Some(event.text.clone());
                    self.staying_items.clear();
                    transitions.push(OverlayTransition::FadeIn {
                        layer: OverlayLayer::StayingHeading,
                    });
                }
            }
            OverlayKind::StayingListItem => {
                self.leave_transient(timing, transitions);
                if !self.staying_items.contains(&event.text) {
                    self.staying_items.push(event.text.clone());
                    transitions.push(OverlayTransition::FadeIn {
                        layer: OverlayLayer::StayingListItem,
                    });
                }
            }
            OverlayKind::Heading | OverlayKind::ListItem => {
                let shown = self.transient.as_ref().map(|(text, _)| text.as_str());
                if shown != Some(event.text.as_str()) {
                    if self.has_staying() {
                        self.clear_staying();
                        transitions.push(OverlayTransition::Hide {
                            layer: OverlayLayer::Staying,
                        });
                    }
                    self.transient = Some((event.text.clone(), event.kind));
                    transitions.push(OverlayTransition::FadeIn {
                        layer: OverlayLayer::Transient,
                    });
                }
            }
        }
    }

    fn leave_transient(&mut self, timing: OverlayTiming, transitions: &mut Vec<OverlayTransition>) {
        if self.transient.take().is_some() {
            transitions.push(OverlayTransition::FadeOut {
                layer: OverlayLayer::Transient,
                after_ms: timing.fade_out_ms,
            });
        }
    }

    /// Rebuilds the staying context as of `time_sec` by replaying events in
    /// start order, the way uninterrupted playback would have seen them.
    ///
    /// A transient that is still active at `time_sec` stays up, and the cue
    /// dedupe set is left alone: only a tick with no active overlay ends a
    /// streak.
    fn resync(
        &mut self,
        store: &OverlayStore,
        time_sec: TimeSec,
        transitions: &mut Vec<OverlayTransition>,
    ) {
        let mut heading: Option<String> = None;
        let mut items: Vec<String> = Vec::new();

        for event in store.started_by(time_sec) {
            match event.kind {
                OverlayKind::StayingHeading => {
                    if heading.as_deref() != Some(event.text.as_str()) {
                        heading = Some(event.text.clone());
                        items.clear();
                    }
                }
                OverlayKind::StayingListItem => {
                    if !items.contains(&event.text) {
                        items.push(event.text.clone());
                    }
                }
                OverlayKind::Heading | OverlayKind::ListItem => {
                    heading = None;
                    items.clear();
                }
            }
        }

        let still_active = match (&self.transient, store.active_at(time_sec)) {
            (Some((text, kind)), Some((_, event))) => *text == event.text && *kind == event.kind,
            _ => false,
        };
        if !still_active && self.transient.take().is_some() {
            transitions.push(OverlayTransition::Hide {
                layer: OverlayLayer::Transient,
            });
        }

        if heading != self.staying_heading || items != self.staying_items {
            debug!(
                "Overlay resync at {:.3}s: heading {:?}, {} items",
                time_sec,
                heading,
                items.len()
            );
            if self.has_staying() {
                transitions.push(OverlayTransition::Hide {
                    layer: OverlayLayer::Staying,
                });
            }
            self.staying_heading = heading;
            self.staying_items = items;
            if self.has_staying() {
                transitions.push(OverlayTransition::FadeIn {
                    layer: OverlayLayer::Staying,
                });
            }
        }
    }

    fn has_staying(&self) -> bool {
        self.staying_heading.is_some() || !self.staying_items.is_empty()
    }

    fn clear_staying(&mut self) {
        self.staying_heading = None;
        self.staying_items.clear();
    }

    /// Current payload; pure query
    pub fn payload(&self) -> OverlayPayload {
        if let Some((text, kind)) = &self.transient {
            return OverlayPayload::Transient {
                text: text.clone(),
                kind: *kind,
            };
        }
        if self.has_staying() {
            return OverlayPayload::Staying {
                heading_text: self.staying_heading.clone(),
                list_items: self.staying_items.clone(),
            };
        }
        OverlayPayload::Idle
    }

    pub fn state(&self) -> OverlayState {
        match self.payload() {
            OverlayPayload::Idle => OverlayState::Idle,
            OverlayPayload::Transient { text, kind } => {
                OverlayState::ShowingTransient { text, kind }
            }
            OverlayPayload::Staying {
                heading_text,
                list_items,
            } => OverlayState::ShowingStaying {
                heading_text,
                list_items,
            },
        }
    }

    /// Clears everything, including the cue dedupe set
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// =============================================================================
// Tests
// =============================================================================
