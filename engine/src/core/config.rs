//! Engine Configuration
//!
//! Every knob the engine reads on a tick. Values may change at any time and
//! take effect on the next tick. Bad values are clamped, never rejected.

use serde::{Deserialize, Serialize};
use specta::Type;
use tracing::warn;

use crate::core::prompts::{Orientation, SubscribePromptConfig};

/// How caption words are presented
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Type, Default)]
#[serde(rename_all = "snake_case")]
pub enum PresentationMode {
    /// Plain line with the spoken word highlighted
    #[default]
    Inline,
    /// Each word in its own colored box
    Block,
}

/// Caption and overlay engine configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Silence between words that starts a new caption line
    #[serde(default = "default_min_line_gap")]
    pub min_line_gap_sec: f64,

    /// Maximum words shown at once; longer lines are split into sub-chunks
    #[serde(default = "default_words_per_caption")]
    pub words_per_caption: u32,

    /// How long the last caption stays up during a pause
    #[serde(default = "default_hold")]
    pub hold_sec: f64,

    #[serde(default)]
    pub presentation_mode: PresentationMode,

    /// Forward jumps larger than this are treated as seeks
    #[serde(default = "default_seek_threshold")]
    pub seek_threshold_sec: f64,

    /// Delay before a transient overlay is removed after its fade-out starts
    #[serde(default = "default_transient_fade_out_ms")]
    pub transient_fade_out_ms: u32,

    /// Caption fade-out duration once the hold expires
    #[serde(default = "default_caption_fade_out_ms")]
    pub caption_fade_out_ms: u32,

    /// Volume attached to audio cues (0.0 ~ 1.0)
    #[serde(default = "default_cue_volume")]
    pub cue_volume: f64,

    /// Seed for block-style palettes; `None` draws from OS entropy
    #[serde(default)]
    pub style_seed: Option<u64>,

    #[serde(default)]
    pub orientation: Orientation,

    #[serde(default)]
    pub subscribe_prompt: SubscribePromptConfig,
}

fn default_min_line_gap() -> f64 {
    0.40
}

fn default_words_per_caption() -> u32 {
    5
}

fn default_hold() -> f64 {
    4.0
}

fn default_seek_threshold() -> f64 {
    1.0
}

fn default_transient_fade_out_ms() -> u32 {
    500
}

fn default_caption_fade_out_ms() -> u32 {
    300
}

fn default_cue_volume() -> f64 {
    0.5
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_line_gap_sec: default_min_line_gap(),
            words_per_caption: default_words_per_caption(),
            hold_sec: default_hold(),
            presentation_mode: PresentationMode::default(),
            seek_threshold_sec: default_seek_threshold(),
            transient_fade_out_ms: default_transient_fade_out_ms(),
            caption_fade_out_ms: default_caption_fade_out_ms(),
            cue_volume: default_cue_volume(),
            style_seed: None,
            orientation: Orientation::default(),
            subscribe_prompt: SubscribePromptConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Clamps values so the engine always sees a usable configuration.
    ///
    /// Tolerant by intent: corrects bad values instead of failing.
    pub fn normalize(&mut self) {
        if self.words_per_caption == 0 {
            warn!("wordsPerCaption must be at least 1, clamping");
            self.words_per_caption = 1;
        }
        self.min_line_gap_sec = clamp_min(self.min_line_gap_sec, 0.0, default_min_line_gap());
        self.hold_sec = clamp_min(self.hold_sec, 0.0, default_hold());
        self.seek_threshold_sec =
            clamp_min(self.seek_threshold_sec, 0.0, default_seek_threshold());
        self.cue_volume = if self.cue_volume.is_finite() {
            self.cue_volume.clamp(0.0, 1.0)
        } else {
            default_cue_volume()
        };
        self.subscribe_prompt.normalize();
    }

    /// Returns a normalized copy
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    pub fn words_per_caption(&self) -> usize {
        self.words_per_caption.max(1) as usize
    }
}

fn clamp_min(value: f64, min: f64, fallback: f64) -> f64 {
    if !value.is_finite() {
        warn!("Non-finite configuration value, using default {}", fallback);
        return fallback;
    }
    if value < min {
        warn!("Configuration value {} below minimum {}, clamping", value, min);
        return min;
    }
    value
}
