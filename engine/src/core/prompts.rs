//! Subscribe Prompt Schedule
//!
//! Decides when the call-to-action graphic is on screen: once shortly after
//! the video starts and once shortly before it ends. Landscape only.

use serde::{Deserialize, Serialize};
use specta::Type;

use crate::core::{TimeRange, TimeSec};

/// Output frame orientation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Type, Default)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
}

/// Timing of the subscribe prompt
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct SubscribePromptConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds after the start when the first prompt appears
    #[serde(default = "default_lead_in")]
    pub lead_in_sec: f64,
    /// Seconds before the end when the second prompt appears
    #[serde(default = "default_lead_out")]
    pub lead_out_sec: f64,
    /// How long each prompt stays visible
    #[serde(default = "default_show")]
    pub show_sec: f64,
}

fn default_true() -> bool {
    true
}

fn default_lead_in() -> f64 {
    30.0
}

fn default_lead_out() -> f64 {
    30.0
}

fn default_show() -> f64 {
    5.0
}

impl Default for SubscribePromptConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lead_in_sec: default_lead_in(),
            lead_out_sec: default_lead_out(),
            show_sec: default_show(),
        }
    }
}

impl SubscribePromptConfig {
    /// Visibility windows for a video of `duration_sec`.
    ///
    /// The closing window is omitted when the video is too short to hold it.
    pub fn windows(&self, duration_sec: TimeSec) -> Vec<TimeRange> {
        let mut windows = vec![TimeRange::new(
            self.lead_in_sec,
            self.lead_in_sec + self.show_sec,
        )];
        if duration_sec.is_finite() && duration_sec >= self.lead_out_sec {
            let start = duration_sec - self.lead_out_sec;
            windows.push(TimeRange::new(start, start + self.show_sec));
        }
        windows
    }

    /// Returns true if the prompt should be on screen at `time_sec`
    pub fn is_visible(
        &self,
        time_sec: TimeSec,
        duration_sec: TimeSec,
        orientation: Orientation,
    ) -> bool {
        if !self.enabled || orientation == Orientation::Portrait || !time_sec.is_finite() {
            return false;
        }
        self.windows(duration_sec)
            .iter()
            .any(|window| window.contains(time_sec))
    }

    /// Clamps every field to a usable value
    pub(crate) fn normalize(&mut self) {
        self.lead_in_sec = non_negative_or(self.lead_in_sec, default_lead_in());
        self.lead_out_sec = non_negative_or(self.lead_out_sec, default_lead_out());
        self.show_sec = non_negative_or(self.show_sec, default_show());
    }
}

fn non_negative_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opening_window() {
        let config = SubscribePromptConfig::default();
        assert!(!config.is_visible(29.9, 120.0, Orientation::Landscape));
        assert!(config.is_visible(30.0, 120.0, Orientation::Landscape));
        assert!(config.is_visible(35.0, 120.0, Orientation::Landscape));
        assert!(!config.is_visible(35.1, 120.0, Orientation::Landscape));
    }

    #[test]
    fn test_closing_window() {
        let config = SubscribePromptConfig::default();
        assert!(config.is_visible(90.0, 120.0, Orientation::Landscape));
        assert!(config.is_visible(95.0, 120.0, Orientation::Landscape));
        assert!(!config.is_visible(96.0, 120.0, Orientation::Landscape));
        assert!(!config.is_visible(89.0, 120.0, Orientation::Landscape));
    }

    #[test]
    fn test_portrait_and_disabled_never_show() {
        let mut config = SubscribePromptConfig::default();
        assert!(!config.is_visible(31.0, 120.0, Orientation::Portrait));

        config.enabled = false;
        assert!(!config.is_visible(31.0, 120.0, Orientation::Landscape));
    }

    #[test]
    fn test_short_video_has_single_window() {
        let config = SubscribePromptConfig::default();
        assert_eq!(config.windows(20.0).len(), 1);
    }

    #[test]
    fn test_normalize_replaces_bad_values() {
        let mut config = SubscribePromptConfig {
            enabled: true,
            lead_in_sec: -4.0,
            lead_out_sec: f64::NAN,
            show_sec: 2.0,
        };
        config.normalize();
        assert_eq!(config.lead_in_sec, 0.0);
        assert_eq!(config.lead_out_sec, 30.0);
        assert_eq!(config.show_sec, 2.0);
    }
}
