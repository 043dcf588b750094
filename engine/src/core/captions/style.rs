//! Block-Style Word Palettes
//!
//! In block presentation each word sits in its own colored box. Styles are
//! drawn at random once per displayed segment and reused until the caption
//! line changes, so colors do not flicker from frame to frame.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use specta::Type;
use tracing::debug;

use super::segments::SegmentKey;

const TEXT_COLORS: &[&str] = &[
    "#222222", "#9f2f16", "#85540d", "#46850d", "#0d5a85", "#5f0d85",
];

const BG_COLORS: &[&str] = &[
    "#e9d7f2", "#d7eaf2", "#adf3e2", "#d2f3ad", "#f3efad", "#f3c7ad",
];

const FONT_SIZES: &[&str] = &["1.9em", "1.8em", "2em", "2.5em", "2.3em"];

const ANGLES: &[&str] = &["angle1", "angle2", "angle3", "angle4", "angle5", "angle6"];

/// Visual style of one word box
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct WordStyle {
    pub text_color: String,
    pub bg_color: String,
    pub font_size_token: String,
    pub angle_token: String,
}

impl WordStyle {
    fn draw(rng: &mut StdRng) -> Self {
        Self {
            text_color: pick(TEXT_COLORS, rng),
            bg_color: pick(BG_COLORS, rng),
            font_size_token: pick(FONT_SIZES, rng),
            angle_token: pick(ANGLES, rng),
        }
    }
}

fn pick(options: &[&str], rng: &mut StdRng) -> String {
    options.choose(rng).copied().unwrap_or_default().to_string()
}

/// Single-entry style memo keyed by the displayed segment
#[derive(Clone, Debug)]
pub struct StyleCache {
    seed: Option<u64>,
    rng: StdRng,
    entry: Option<(SegmentKey, Vec<WordStyle>)>,
}

impl StyleCache {
    /// Creates a cache; with a seed the sequence of draws is reproducible
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            seed,
            rng: make_rng(seed),
            entry: None,
        }
    }

    /// Style for word `local_index` of `key`.
    ///
    /// The whole key is drawn on first request and reused until a different
    /// key is requested.
    pub fn get_style(&mut self, key: SegmentKey, local_index: usize) -> WordStyle {
        let stale = self.entry.as_ref().is_none_or(|(cached, _)| *cached != key);
        if stale {
            debug!(
                "Drawing block styles for words {}..={}",
                key.start_index, key.end_index
            );
            let styles = (0..key.len())
                .map(|_| WordStyle::draw(&mut self.rng))
                .collect();
            self.entry = Some((key, styles));
        }

        match &mut self.entry {
            Some((_, styles)) => {
                while styles.len() <= local_index {
                    styles.push(WordStyle::draw(&mut self.rng));
                }
                styles[local_index].clone()
            }
            None => WordStyle::draw(&mut self.rng),
        }
    }

    /// Key currently memoized, if any
    pub fn cached_key(&self) -> Option<SegmentKey> {
        self.entry.as_ref().map(|(key, _)| *key)
    }

    /// Drops the memoized entry; the next request draws fresh styles
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Drops the entry and restarts the random sequence
    pub fn reset(&mut self, seed: Option<u64>) {
        self.seed = seed;
        self.rng = make_rng(seed);
        self.entry = None;
    }
}

impl Default for StyleCache {
    fn default() -> Self {
        Self::new(None)
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
