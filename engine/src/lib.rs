//! cuesync Library
//!
//! Synchronizes word-level captions and timed heading/list overlays with a
//! media playhead. The [`core`] module holds the engine; [`io`] reads input
//! files and persists settings.

pub mod core;
pub mod io;

pub use crate::core::{CoreError, CoreResult, SyncEngine, TickFrame};
