//! Input Loading and Settings Persistence
//!
//! The only part of the library that touches the filesystem. The engine in
//! [`crate::core`] receives already-parsed stores and configuration.

pub mod loader;
pub mod settings;

pub use loader::{
    load_overlay_events, load_overlay_events_from_str, load_word_timings,
    load_word_timings_from_str,
};
pub use settings::{AppSettings, SettingsManager, SETTINGS_FILE, SETTINGS_VERSION};
