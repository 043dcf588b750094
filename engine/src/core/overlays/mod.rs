//! Overlay System Module
//!
//! Headings and list items shown on top of the video, independent of the
//! caption line.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Overlay System                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  models.rs  - OverlayEvent, OverlayKind, OverlayStore           │
//! │  state.rs   - Idle / Transient / Staying state machine, cues    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod models;
mod state;

pub use models::{CueFamily, OverlayEvent, OverlayKind, OverlayStore};
pub use state::{
    AudioCueEvent, OverlayLayer, OverlayPayload, OverlayState, OverlayStateMachine, OverlayTick,
    OverlayTiming, OverlayTransition,
};
