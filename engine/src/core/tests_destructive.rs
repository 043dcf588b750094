//! Destructive and Edge Case Tests for the Engine
//!
//! These tests feed the engine malformed inputs, hostile playhead sequences
//! and degenerate configurations, and check that it degrades to "nothing to
//! show" instead of panicking or leaking state across seeks.

use crate::core::captions::{CaptionSegment, SegmentIndex};
use crate::core::clock::{ClockTick, FixedRateClock, ScheduledSeek};
use crate::core::config::{EngineConfig, PresentationMode};
use crate::core::overlays::{OverlayEvent, OverlayKind, OverlayPayload, OverlayStore};
use crate::core::timing::{Repair, TimestampStore, WordTiming};
use crate::core::{SyncEngine, TimeRange};
use crate::io::{load_overlay_events_from_str, load_word_timings_from_str};

fn seeded() -> EngineConfig {
    EngineConfig {
        style_seed: Some(5),
        ..Default::default()
    }
}

#[test]
fn test_destructive_time_range_inversion() {
    let range = TimeRange::new(10.0, 5.0);
    assert_eq!(range.start_sec, 5.0);
    assert_eq!(range.end_sec, 10.0);
}

#[test]
fn test_destructive_empty_inputs() {
    let mut engine = SyncEngine::empty(seeded());
    for t in [0.0, 1.0, 1e9, -5.0] {
        let frame = engine.on_tick(t);
        assert!(frame.caption.is_none());
        assert!(frame.overlay.is_idle());
        assert!(frame.cues.is_empty());
    }
    assert!(engine.segments().is_empty());
}

#[test]
fn test_destructive_garbage_word_file() {
    let json = r#"[
        {"word": "ok", "start": 0.0, "end": 0.5},
        {"word": "obj", "start": {"s": 1}, "end": 1.0},
        {"word": "arr", "start": [1], "end": 1.0},
        {"word": "bool", "start": true, "end": 1.0},
        {"word": "late", "start": 9.0, "end": 8.0},
        {"word": "early", "start": -1.0, "end": 0.2}
    ]"#;
    let (store, report) = load_word_timings_from_str(json).unwrap();
    assert_eq!(store.len(), 3);
    assert!(report.repairs.contains(&Repair::SwappedBounds { index: 4 }));
    assert!(report
        .repairs
        .contains(&Repair::ClampedNegativeStart { index: 5 }));
    assert!(report.repairs.contains(&Repair::Resorted));

    // Starts are sorted after the repair
    let starts: Vec<f64> = store.words().iter().map(|w| w.start_sec).collect();
    assert!(starts.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_destructive_overlay_without_type() {
    let json = r#"[{"text": "No type", "start_word_start_timing": 0, "end_word_end_timing": 1}]"#;
    let (store, report) = load_overlay_events_from_str(json).unwrap();
    assert!(store.is_empty());
    assert_eq!(
        report.repairs,
        vec![Repair::UnknownOverlayKind {
            index: 0,
            kind: String::new()
        }]
    );
}

#[test]
fn test_destructive_non_finite_ticks() {
    let (words, _) = TimestampStore::load(vec![WordTiming::new("a", 0.0, 1.0)]);
    let mut engine = SyncEngine::new(words, OverlayStore::default(), seeded());

    assert!(engine.on_tick(0.5).caption.is_some());
    for t in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let frame = engine.on_tick(t);
        assert!(frame.caption.is_none());
        assert!(!frame.prompt_visible);
    }
    // A bogus tick does not poison the next real one
    assert!(engine.on_tick(0.6).caption.is_some());
}

#[test]
fn test_destructive_zero_length_words() {
    let (words, _) = TimestampStore::load(vec![
        WordTiming::new("a", 1.0, 1.0),
        WordTiming::new("b", 1.0, 1.0),
    ]);
    let mut engine = SyncEngine::new(words, OverlayStore::default(), seeded());

    let caption = engine.on_tick(1.0).caption.unwrap();
    assert_eq!(caption.current_word().unwrap().text, "a");
    assert_eq!(caption.text(), "a b");
}

#[test]
fn test_destructive_zero_gap_splits_every_word() {
    let words = vec![
        WordTiming::new("a", 0.0, 0.5),
        WordTiming::new("b", 0.5, 1.0),
        WordTiming::new("c", 1.0, 1.5),
    ];
    let index = SegmentIndex::build(&words, 0.0);
    assert_eq!(index.len(), 3);
}

#[test]
fn test_destructive_huge_words_per_caption() {
    let (words, _) = TimestampStore::load(
        (0..20)
            .map(|i| WordTiming::new("w", i as f64 * 0.1, i as f64 * 0.1 + 0.1))
            .collect(),
    );
    let mut engine = SyncEngine::new(words, OverlayStore::default(), seeded());
    engine.configure(0.4, u32::MAX, 4.0, PresentationMode::Block);

    let caption = engine.on_tick(1.05).caption.unwrap();
    assert_eq!(caption.segment_key, CaptionSegment::new(0, 19));
    assert_eq!(caption.words.len(), 20);
    assert!(caption.words.iter().all(|w| w.style.is_some()));
}

#[test]
fn test_destructive_hostile_config_is_clamped() {
    let mut engine = SyncEngine::empty(EngineConfig::default());
    engine.set_config(EngineConfig {
        min_line_gap_sec: f64::NAN,
        words_per_caption: 0,
        hold_sec: f64::NEG_INFINITY,
        seek_threshold_sec: -1.0,
        cue_volume: 7.0,
        ..Default::default()
    });
    let config = engine.config();
    assert_eq!(config.min_line_gap_sec, 0.40);
    assert_eq!(config.words_per_caption, 1);
    assert_eq!(config.hold_sec, 4.0);
    assert_eq!(config.seek_threshold_sec, 0.0);
    assert_eq!(config.cue_volume, 1.0);
}

#[test]
fn test_destructive_seek_storm_matches_fresh_engine() {
    let (words, _) = TimestampStore::load(vec![
        WordTiming::new("one", 0.0, 0.5),
        WordTiming::new("two", 3.0, 3.5),
    ]);
    let (overlays, _) = OverlayStore::load(vec![
        OverlayEvent::new("Intro", OverlayKind::StayingHeading, 0.0, 10.0),
        OverlayEvent::new("Item1", OverlayKind::StayingListItem, 1.0, 3.0),
        OverlayEvent::new("Aside", OverlayKind::Heading, 12.0, 13.0),
        OverlayEvent::new("Chapter2", OverlayKind::StayingHeading, 15.0, 20.0),
        OverlayEvent::new("Item9", OverlayKind::StayingListItem, 16.0, 18.0),
    ]);

    let mut stormy = SyncEngine::new(words.clone(), overlays.clone(), seeded());
    for t in [19.0, 0.1, 12.5, 2.0, 17.0, 0.0, 14.0] {
        stormy.on_clock_tick(ClockTick::seek(t));
    }

    for t in [0.2, 2.5, 12.2, 14.0, 16.5, 19.5] {
        let mut fresh = SyncEngine::new(words.clone(), overlays.clone(), seeded());
        let expected = fresh.on_clock_tick(ClockTick::seek(t));
        let actual = stormy.on_clock_tick(ClockTick::seek(t));
        assert_eq!(actual.overlay, expected.overlay, "overlay at {}", t);
        assert_eq!(
            actual.caption.map(|c| c.text()),
            expected.caption.map(|c| c.text()),
            "caption at {}",
            t
        );
    }
}

#[test]
fn test_destructive_transient_clears_staying_on_seek() {
    let (overlays, _) = OverlayStore::load(vec![
        OverlayEvent::new("Intro", OverlayKind::StayingHeading, 0.0, 2.0),
        OverlayEvent::new("Aside", OverlayKind::ListItem, 3.0, 4.0),
    ]);
    let mut engine = SyncEngine::new(TimestampStore::default(), overlays, seeded());

    // Past the transient: continuous playback would have cleared the staying context
    let frame = engine.on_clock_tick(ClockTick::seek(5.0));
    assert_eq!(frame.overlay, OverlayPayload::Idle);
}

#[test]
fn test_destructive_repeated_seeks_on_fixed_clock() {
    let (words, _) = TimestampStore::load(vec![WordTiming::new("x", 1.0, 2.0)]);
    let mut engine = SyncEngine::new(words, OverlayStore::default(), seeded());
    let mut clock = FixedRateClock::new(4.0, 0.0, 3.0).with_seeks([
        ScheduledSeek {
            at_sec: 1.5,
            to_sec: 0.0,
        },
        ScheduledSeek {
            at_sec: 1.5,
            to_sec: 2.75,
        },
    ]);

    let mut frames = Vec::new();
    engine.drive(&mut clock, |frame| frames.push(frame.clone()));

    // The hold never survives a backward seek into silence
    let after_first_seek = frames
        .iter()
        .find(|f| f.time_sec == 0.0 && f.hint == crate::core::clock::TickHint::Seek)
        .unwrap();
    assert!(after_first_seek.caption.is_none());

    // ...and never survives a forward seek either
    let after_second_seek = frames.iter().find(|f| f.time_sec == 2.75).unwrap();
    assert!(after_second_seek.caption.is_none());
}
