//! cuesync Core Engine
//!
//! Caption and overlay synchronization for narrated video.
//! Everything here is pure in-memory computation: no I/O, no timers.

pub mod captions;
pub mod clock;
pub mod config;
pub mod engine;
pub mod overlays;
pub mod prompts;
pub mod timing;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;

pub use engine::{SyncEngine, TickFrame};

#[cfg(test)]
mod tests_destructive;
