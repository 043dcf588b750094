//! Caption System Module
//!
//! Turns word timings into the caption line shown at each instant:
//! - Silence-gap segmentation into lines, with sub-chunks for long lines
//! - Current-word highlighting and a hold across short pauses
//! - Stable per-line word styles for block presentation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Caption System                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  segments.rs  - CaptionSegment, SegmentIndex (gap heuristic)    │
//! │  renderer.rs  - CaptionRenderer, CaptionPayload (hold, chunks)  │
//! │  style.rs     - StyleCache, WordStyle (block palettes)          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use crate::core::captions::SegmentIndex;
//!
//! let index = SegmentIndex::build(store.words(), 0.4);
//! let line = index.display_key(word_index, 5);
//! ```

mod renderer;
mod segments;
mod style;

pub use renderer::{CaptionContext, CaptionPayload, CaptionRenderer, CaptionWord};
pub use segments::{CaptionSegment, SegmentIndex, SegmentKey};
pub use style::{StyleCache, WordStyle};
