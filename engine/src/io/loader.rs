//! JSON Input Loader
//!
//! Reads the word timing and overlay files produced by the transcription
//! pipeline:
//!
//! ```text
//! words.json     [{"word": "hello", "start": 0.0, "end": 0.42}, ...]
//! overlays.json  [{"text": "Intro", "type": "staying-heading",
//!                  "start_word_start_timing": 0.0,
//!                  "end_word_end_timing": 10.0}, ...]
//! ```
//!
//! Only a file that is not a JSON array of objects is an error. Individual
//! bad records are dropped or repaired and listed in the returned
//! [`LoadReport`].

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::core::overlays::{OverlayEvent, OverlayKind, OverlayStore};
use crate::core::timing::{LoadReport, Repair, TimestampStore, WordTiming};
use crate::core::{CoreError, CoreResult, TimeSec};

// =============================================================================
// Raw Records
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawWord {
    #[serde(default, alias = "text")]
    word: String,
    #[serde(default)]
    start: Value,
    #[serde(default)]
    end: Value,
}

#[derive(Debug, Deserialize)]
struct RawOverlay {
    #[serde(default)]
    text: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default, alias = "start")]
    start_word_start_timing: Value,
    #[serde(default, alias = "end")]
    end_word_end_timing: Value,
}

/// Accepts JSON numbers and numeric strings such as `"1.25"`
fn seconds(value: &Value) -> Option<TimeSec> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<TimeSec>().ok(),
        _ => None,
    }
}

fn bounds(
    index: usize,
    start: &Value,
    end: &Value,
    report: &mut LoadReport,
) -> Option<(TimeSec, TimeSec)> {
    let start_sec = seconds(start);
    let end_sec = seconds(end);
    for (field, parsed) in [("start", start_sec), ("end", end_sec)] {
        if parsed.is_none() {
            warn!("Dropping record {}: non-numeric {}", index, field);
            report.push(Repair::DroppedNonNumeric {
                index,
                field: field.to_string(),
            });
            return None;
        }
    }
    Some((start_sec?, end_sec?))
}

// =============================================================================
// Word Timings
// =============================================================================

/// Parses a word timing array and builds the store
pub fn load_word_timings_from_str(json: &str) -> CoreResult<(TimestampStore, LoadReport)> {
    let raw: Vec<RawWord> = serde_json::from_str(json)
        .map_err(|e| CoreError::InvalidWordTimings(e.to_string()))?;

    let mut report = LoadReport::default();
    let words: Vec<(usize, WordTiming)> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let (start_sec, end_sec) = bounds(index, &record.start, &record.end, &mut report)?;
            Some((
                index,
                WordTiming {
                    text: record.word,
                    start_sec,
                    end_sec,
                },
            ))
        })
        .collect();

    let (store, repairs) = TimestampStore::load_indexed(words);
    report.merge(repairs);
    Ok((store, report))
}

/// Reads and parses a word timing file
pub fn load_word_timings(path: &Path) -> CoreResult<(TimestampStore, LoadReport)> {
    let json = read(path)?;
    info!("Reading word timings from {}", path.display());
    load_word_timings_from_str(&json)
}

// =============================================================================
// Overlay Events
// =============================================================================

/// Parses an overlay array and builds the store.
///
/// Records with an unknown `type` are dropped, not fatal.
pub fn load_overlay_events_from_str(json: &str) -> CoreResult<(OverlayStore, LoadReport)> {
    let raw: Vec<RawOverlay> =
        serde_json::from_str(json).map_err(|e| CoreError::InvalidOverlays(e.to_string()))?;

    let mut report = LoadReport::default();
    let events: Vec<(usize, OverlayEvent)> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let Some(kind) = OverlayKind::from_wire(&record.kind) else {
                warn!("Dropping overlay {}: unknown type {:?}", index, record.kind);
                report.push(Repair::UnknownOverlayKind {
                    index,
                    kind: record.kind,
                });
                return None;
            };
            let (start_sec, end_sec) = bounds(
                index,
                &record.start_word_start_timing,
                &record.end_word_end_timing,
                &mut report,
            )?;
            Some((
                index,
                OverlayEvent {
                    text: record.text,
                    kind,
                    start_sec,
                    end_sec,
                },
            ))
        })
        .collect();

    let (store, repairs) = OverlayStore::load_indexed(events);
    report.merge(repairs);
    Ok((store, report))
}

/// Reads and parses an overlay file
pub fn load_overlay_events(path: &Path) -> CoreResult<(OverlayStore, LoadReport)> {
    let json = read(path)?;
    info!("Reading overlay events from {}", path.display());
    load_overlay_events_from_str(&json)
}

fn read(path: &Path) -> CoreResult<String> {
    if !path.exists() {
        return Err(CoreError::FileNotFound(path.display().to_string()));
    }
    Ok(fs::read_to_string(path)?)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_words_from_str() {
        let json = r#"[
            {"word": "hello", "start": 0.0, "end": 0.4},
            {"word": "world", "start": "0.4", "end": 0.9}
        ]"#;
        let (store, report) = load_word_timings_from_str(json).unwrap();
        assert!(report.is_clean());
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).unwrap().start_sec, 0.4);
    }

    #[test]
    fn test_non_numeric_word_is_dropped_and_reported() {
        let json = r#"[
            {"word": "a", "start": 0.0, "end": 0.5},
            {"word": "b", "start": "soon", "end": 1.0},
            {"word": "c", "start": 1.0}
        ]"#;
        let (store, report) = load_word_timings_from_str(json).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(
            report.repairs,
            vec![
                Repair::DroppedNonNumeric {
                    index: 1,
                    field: "start".to_string()
                },
                Repair::DroppedNonNumeric {
                    index: 2,
                    field: "end".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_repairs_keep_original_indices() {
        let json = r#"[
            {"word": "x", "start": null, "end": 1.0},
            {"word": "y", "start": 3.0, "end": 2.0}
        ]"#;
        let (_, report) = load_word_timings_from_str(json).unwrap();
        assert!(report.repairs.contains(&Repair::SwappedBounds { index: 1 }));
    }

    #[test]
    fn test_not_an_array_is_an_error() {
        let err = load_word_timings_from_str(r#"{"word": "a"}"#).unwrap_err();
        assert!(matches!(err, CoreError::InvalidWordTimings(_)));

        let err = load_overlay_events_from_str("not json").unwrap_err();
        assert!(matches!(err, CoreError::InvalidOverlays(_)));
    }

    #[test]
    fn test_load_overlays_from_str() {
        let json = r#"[
            {"text": "Intro", "type": "staying-heading",
             "start_word_start_timing": 0.0, "end_word_end_timing": 10.0},
            {"text": "Item1", "type": "staying-list-item",
             "start_word_start_timing": 1.0, "end_word_end_timing": 3.0},
            {"text": "Odd", "type": "banner",
             "start_word_start_timing": 2.0, "end_word_end_timing": 3.0}
        ]"#;
        let (store, report) = load_overlay_events_from_str(json).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).unwrap().kind, OverlayKind::StayingListItem);
        assert_eq!(
            report.repairs,
            vec![Repair::UnknownOverlayKind {
                index: 2,
                kind: "banner".to_string()
            }]
        );
    }

    #[test]
    fn test_generator_list_item_spelling_is_kept() {
        let json = r#"[
            {"text": "Aside", "type": "list_item",
             "start_word_start_timing": 1.0, "end_word_end_timing": 2.0}
        ]"#;
        let (store, report) = load_overlay_events_from_str(json).unwrap();
        assert!(report.is_clean());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0).unwrap().kind, OverlayKind::ListItem);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"[{{"word": "hi", "start": 0.1, "end": 0.3}}]"#).unwrap();

        let (store, _) = load_word_timings(file.path()).unwrap();
        assert_eq!(store.get(0).unwrap().text, "hi");
    }

    #[test]
    fn test_missing_file() {
        let err = load_overlay_events(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, CoreError::FileNotFound(_)));
    }
}
