//! Clock Adapter Interface
//!
//! The engine never owns a timer. A host (video element, render loop, CLI
//! simulation) supplies the playhead position on every tick together with a
//! hint saying whether playback jumped.

use std::collections::VecDeque;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use specta::Type;

use crate::core::TimeSec;

/// How the playhead got to the ticked position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Type, Default)]
#[serde(rename_all = "camelCase")]
pub enum TickHint {
    /// Normal playback since the previous tick
    #[default]
    Continuous,
    /// The user scrubbed or jumped
    Seek,
    /// Playback restarted; all derived state must be dropped
    Restart,
}

/// One playhead sample
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct ClockTick {
    pub time_sec: TimeSec,
    #[serde(default)]
    pub hint: TickHint,
}

impl ClockTick {
    pub fn continuous(time_sec: TimeSec) -> Self {
        Self {
            time_sec,
            hint: TickHint::Continuous,
        }
    }

    pub fn seek(time_sec: TimeSec) -> Self {
        Self {
            time_sec,
            hint: TickHint::Seek,
        }
    }

    pub fn restart(time_sec: TimeSec) -> Self {
        Self {
            time_sec,
            hint: TickHint::Restart,
        }
    }
}

/// Anything that can feed ticks to the engine
pub trait TickSource {
    fn next_tick(&mut self) -> Option<ClockTick>;
}

impl<I> TickSource for I
where
    I: Iterator<Item = ClockTick>,
{
    fn next_tick(&mut self) -> Option<ClockTick> {
        self.next()
    }
}

// =============================================================================
// Fixed-Rate Clock
// =============================================================================

/// A jump of the playhead, written `AT:TO` on the command line
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledSeek {
    /// Playhead position at which the jump happens
    pub at_sec: TimeSec,
    /// Where the playhead lands
    pub to_sec: TimeSec,
}

impl FromStr for ScheduledSeek {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (at, to) = s
            .split_once(':')
            .ok_or_else(|| format!("Expected AT:TO, got '{}'", s))?;
        let parse = |v: &str| -> Result<f64, String> {
            let value: f64 = v
                .trim()
                .parse()
                .map_err(|e| format!("Invalid seconds '{}': {}", v.trim(), e))?;
            if value.is_finite() && value >= 0.0 {
                Ok(value)
            } else {
                Err(format!("Seconds must be finite and non-negative: {}", v.trim()))
            }
        };
        Ok(Self {
            at_sec: parse(at)?,
            to_sec: parse(to)?,
        })
    }
}

/// Deterministic clock stepping at a fixed frame rate.
///
/// Positions are computed as `base + frame / fps` so long runs do not drift.
/// Each scheduled seek fires once, the first time the playhead reaches it.
#[derive(Clone, Debug)]
pub struct FixedRateClock {
    fps: f64,
    base_sec: TimeSec,
    frame: u64,
    end_sec: TimeSec,
    seeks: VecDeque<ScheduledSeek>,
    pending_hint: TickHint,
}

impl FixedRateClock {
    /// Ticks from `start_sec` to `end_sec` inclusive at `fps` frames per second
    pub fn new(fps: f64, start_sec: TimeSec, end_sec: TimeSec) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 { fps } else { 30.0 };
        Self {
            fps,
            base_sec: start_sec.max(0.0),
            frame: 0,
            end_sec,
            seeks: VecDeque::new(),
            pending_hint: TickHint::Restart,
        }
    }

    /// Adds jumps; they fire in the order given
    pub fn with_seeks(mut self, seeks: impl IntoIterator<Item = ScheduledSeek>) -> Self {
        self.seeks.extend(seeks);
        self
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    fn playhead_sec(&self) -> TimeSec {
        self.base_sec + self.frame as f64 / self.fps
    }
}

impl Iterator for FixedRateClock {
    type Item = ClockTick;

    fn next(&mut self) -> Option<ClockTick> {
        let time_sec = self.playhead_sec();
        if time_sec > self.end_sec + 1e-9 {
            return None;
        }

        let tick = ClockTick {
            time_sec,
            hint: std::mem::take(&mut self.pending_hint),
        };

        match self.seeks.front() {
            Some(seek) if seek.at_sec <= time_sec => {
                self.base_sec = seek.to_sec;
                self.frame = 0;
                self.pending_hint = TickHint::Seek;
                self.seeks.pop_front();
            }
            _ => self.frame += 1,
        }

        Some(tick)
    }
}
