//! Overlay Data Models
//!
//! Timed headings and list items shown independently of captions.

use serde::{Deserialize, Serialize};
use specta::Type;
use tracing::info;

use crate::core::timing::{sanitize, IntervalIndex, LoadReport, Timed};
use crate::core::{TimeRange, TimeSec};

// =============================================================================
// Overlay Kind
// =============================================================================

/// Kind of overlay annotation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayKind {
    /// Transient heading, hidden when its window ends
    Heading,
    /// Transient list item, hidden when its window ends
    ListItem,
    /// Heading that stays on screen until another context replaces it
    StayingHeading,
    /// List item accumulated under the current staying heading
    StayingListItem,
}

impl OverlayKind {
    /// Parses the wire name (`"staying-list-item"`, ...).
    ///
    /// The caption generator writes transient list items as `"list_item"`,
    /// so underscores are accepted wherever dashes are.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name.trim() {
            "heading" => Some(Self::Heading),
            "list-item" | "list_item" => Some(Self::ListItem),
            "staying-heading" | "staying_heading" => Some(Self::StayingHeading),
            "staying-list-item" | "staying_list_item" => Some(Self::StayingListItem),
            _ => None,
        }
    }

    pub fn is_staying(&self) -> bool {
        matches!(self, Self::StayingHeading | Self::StayingListItem)
    }

    /// Audio cue family: staying list items "pop", everything else "whooshes"
    pub fn cue_family(&self) -> CueFamily {
        match self {
            Self::StayingListItem => CueFamily::ListItem,
            Self::Heading | Self::ListItem | Self::StayingHeading => CueFamily::Heading,
        }
    }
}

/// Sound family an audio cue belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub enum CueFamily {
    Heading,
    ListItem,
}

// =============================================================================
// Overlay Event
// =============================================================================

/// A timed overlay annotation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct OverlayEvent {
    pub text: String,
    pub kind: OverlayKind,
    pub start_sec: TimeSec,
    pub end_sec: TimeSec,
}

impl OverlayEvent {
    pub fn new(text: &str, kind: OverlayKind, start_sec: TimeSec, end_sec: TimeSec) -> Self {
        Self {
            text: text.to_string(),
            kind,
            start_sec,
            end_sec,
        }
    }
}

impl Timed for OverlayEvent {
    fn range(&self) -> TimeRange {
        TimeRange {
            start_sec: self.start_sec,
            end_sec: self.end_sec,
        }
    }

    fn set_range(&mut self, start_sec: TimeSec, end_sec: TimeSec) {
        self.start_sec = start_sec;
        self.end_sec = end_sec;
    }
}

// =============================================================================
// Overlay Store
// =============================================================================

/// Start-sorted overlay events for one asset. Immutable once loaded.
#[derive(Clone, Debug, Default)]
pub struct OverlayStore {
    events: Vec<OverlayEvent>,
    index: IntervalIndex,
}

impl OverlayStore {
    /// Builds a store, repairing malformed records instead of failing.
    pub fn load(events: Vec<OverlayEvent>) -> (Self, LoadReport) {
        Self::load_indexed(events.into_iter().enumerate().collect())
    }

    /// Like [`load`](Self::load) but with caller-supplied original positions
    pub fn load_indexed(events: Vec<(usize, OverlayEvent)>) -> (Self, LoadReport) {
        let mut report = LoadReport::default();
        let events = sanitize(events, "overlay", &mut report);
        let index = IntervalIndex::new(events.iter().map(Timed::range));

        info!(
            "Loaded {} overlay events ({} repairs)",
            events.len(),
            report.len()
        );

        (Self { events, index }, report)
    }

    pub fn events(&self) -> &[OverlayEvent] {
        &self.events
    }

    pub fn get(&self, index: usize) -> Option<&OverlayEvent> {
        self.events.get(index)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The event in effect at `time_sec`.
    ///
    /// When windows overlap, the event that started most recently wins, so a
    /// list item nested inside its heading's window is still seen. Ties go to
    /// document order.
    pub fn active_at(&self, time_sec: TimeSec) -> Option<(usize, &OverlayEvent)> {
        let index = self.index.latest_containing(time_sec)?;
        Some((index, &self.events[index]))
    }

    /// Events that started at or before `time_sec`, in start order
    pub fn started_by(&self, time_sec: TimeSec) -> &[OverlayEvent] {
        &self.events[..self.index.started_by(time_sec)]
    }

    /// Latest end time across all events, or zero for an empty store
    pub fn end_sec(&self) -> TimeSec {
        self.index.max_end().map_or(0.0, |end| end.max(0.0))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(OverlayKind::from_wire("heading"), Some(OverlayKind::Heading));
        assert_eq!(
            OverlayKind::from_wire("staying-list-item"),
            Some(OverlayKind::StayingListItem)
        );
        assert_eq!(OverlayKind::from_wire("list_item"), Some(OverlayKind::ListItem));
        assert_eq!(OverlayKind::from_wire("banner"), None);

        let json = serde_json::to_string(&OverlayKind::StayingHeading).unwrap();
        assert_eq!(json, "\"staying-heading\"");
    }

    #[test]
    fn test_cue_families() {
        assert_eq!(OverlayKind::Heading.cue_family(), CueFamily::Heading);
        assert_eq!(OverlayKind::ListItem.cue_family(), CueFamily::Heading);
        assert_eq!(OverlayKind::StayingHeading.cue_family(), CueFamily::Heading);
        assert_eq!(
            OverlayKind::StayingListItem.cue_family(),
            CueFamily::ListItem
        );
    }

    #[test]
    fn test_active_at_prefers_nested_event() {
        let (store, _) = OverlayStore::load(vec![
            OverlayEvent::new("Intro", OverlayKind::StayingHeading, 0.0, 10.0),
            OverlayEvent::new("Item1", OverlayKind::StayingListItem, 1.0, 3.0),
        ]);
        assert_eq!(store.active_at(0.5).unwrap().1.text, "Intro");
        assert_eq!(store.active_at(2.0).unwrap().1.text, "Item1");
        assert_eq!(store.active_at(5.0).unwrap().1.text, "Intro");
        assert!(store.active_at(11.0).is_none());
    }

    #[test]
    fn test_started_by() {
        let (store, _) = OverlayStore::load(vec![
            OverlayEvent::new("A", OverlayKind::Heading, 0.0, 1.0),
            OverlayEvent::new("B", OverlayKind::Heading, 2.0, 3.0),
        ]);
        assert_eq!(store.started_by(-1.0).len(), 0);
        assert_eq!(store.started_by(2.0).len(), 2);
        assert_eq!(store.end_sec(), 3.0);
    }
}
