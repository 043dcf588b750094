//! cuesync command line interface
//!
//! Headless access to the engine: inspect caption segmentation, replay a
//! deterministic playback, or play in real time while printing changes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use cuesync_core::io::{load_overlay_events, load_word_timings, SettingsManager};
use cuesync_core::{
    format_clock, ClockTick, EngineConfig, FixedRateClock, LoadReport, OverlayPayload,
    OverlayStore, PayloadBroadcaster, PlaybackEvent, ScheduledSeek, SegmentIndex, SyncEngine,
    TimeSec,
};

#[derive(Parser)]
#[command(name = "cuesync", version, about = "Caption and overlay sync engine")]
struct Cli {
    /// Also write logs to a daily-rotated file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the caption segments of a word timing file as JSON
    Segments {
        #[arg(long)]
        words: PathBuf,

        /// Silence that starts a new line; defaults to the engine default
        #[arg(long)]
        min_gap: Option<f64>,
    },
    /// Replay playback on a fixed-rate clock, one JSON line per change
    Simulate(SimulateArgs),
    /// Play in real time, printing changes as they happen
    Play(PlayArgs),
}

#[derive(Args)]
struct InputArgs {
    #[arg(long)]
    words: PathBuf,

    #[arg(long)]
    overlays: Option<PathBuf>,

    /// Directory holding settings.json
    #[arg(long)]
    settings_dir: Option<PathBuf>,

    /// Media length in seconds; defaults to the end of the last word or overlay
    #[arg(long)]
    duration: Option<f64>,

    /// Seed for block-style palettes
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct SimulateArgs {
    #[command(flatten)]
    input: InputArgs,

    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    #[arg(long, default_value_t = 0.0)]
    from: f64,

    #[arg(long)]
    to: Option<f64>,

    /// Jump written AT:TO, e.g. 12.5:3; repeatable
    #[arg(long = "seek-to", value_name = "AT:TO")]
    seeks: Vec<ScheduledSeek>,
}

#[derive(Args)]
struct PlayArgs {
    #[command(flatten)]
    input: InputArgs,

    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    #[arg(long, default_value_t = 0.0)]
    from: f64,

    /// Playback-rate multiplier
    #[arg(long, default_value_t = 1.0)]
    speed: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SegmentLine {
    start_index: usize,
    end_index: usize,
    start: String,
    start_sec: TimeSec,
    end_sec: TimeSec,
    text: String,
}

// =============================================================================
// Logging
// =============================================================================

/// Logs go to stderr so stdout stays machine-readable
fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "cuesync.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer);

    let _ = tracing::subscriber::set_global_default(subscriber);
    guard
}

// =============================================================================
// Commands
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_dir.as_deref());

    match cli.command {
        Command::Segments { words, min_gap } => segments(&words, min_gap),
        Command::Simulate(args) => simulate(args),
        Command::Play(args) => play(args).await,
    }
}

fn segments(words: &Path, min_gap: Option<f64>) -> Result<()> {
    let (store, report) = load_word_timings(words)
        .with_context(|| format!("Failed to load word timings from {}", words.display()))?;
    log_report("words", &report);

    let min_gap = EngineConfig {
        min_line_gap_sec: min_gap.unwrap_or(EngineConfig::default().min_line_gap_sec),
        ..Default::default()
    }
    .normalized()
    .min_line_gap_sec;

    let index = SegmentIndex::build(store.words(), min_gap);
    let lines: Vec<SegmentLine> = index
        .segments()
        .iter()
        .map(|segment| {
            let words = &store.words()[segment.start_index..=segment.end_index];
            let start_sec = words.first().map(|w| w.start_sec).unwrap_or_default();
            SegmentLine {
                start_index: segment.start_index,
                end_index: segment.end_index,
                start: format_clock(start_sec),
                start_sec,
                end_sec: words.last().map(|w| w.end_sec).unwrap_or_default(),
                text: words
                    .iter()
                    .map(|w| w.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
            }
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&lines)?);
    Ok(())
}

fn simulate(args: SimulateArgs) -> Result<()> {
    let engine = build_engine(&args.input)?;
    let end_sec = args.to.unwrap_or_else(|| engine.media_duration_sec());
    let clock = FixedRateClock::new(args.fps, args.from, end_sec).with_seeks(args.seeks);
    info!(
        "Simulating {:.2}s..{:.2}s at {} fps",
        args.from,
        end_sec,
        clock.fps()
    );

    let mut broadcaster = PayloadBroadcaster::new(engine);
    for tick in clock {
        for event in broadcaster.on_clock_tick(tick) {
            println!("{}", event.to_json()?);
        }
    }
    Ok(())
}

async fn play(args: PlayArgs) -> Result<()> {
    let engine = build_engine(&args.input)?;
    let end_sec = engine.media_duration_sec();
    let speed = if args.speed.is_finite() && args.speed > 0.0 {
        args.speed
    } else {
        warn!("Invalid speed {}, using 1.0", args.speed);
        1.0
    };
    let fps = if args.fps.is_finite() && args.fps > 0.0 {
        args.fps
    } else {
        30.0
    };

    let shared = PayloadBroadcaster::new(engine).into_shared();
    let mut rx = shared.lock().await.subscribe();

    let printer = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!("Skipped {} events", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    info!(
        "Playing {} from {} at {}x (Ctrl-C to stop)",
        format_clock(end_sec),
        format_clock(args.from),
        speed
    );

    let mut ticker = interval(Duration::from_secs_f64(1.0 / fps));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let started = Instant::now();
    let mut first = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let position = args.from + started.elapsed().as_secs_f64() * speed;
                let tick = if first {
                    first = false;
                    ClockTick::restart(position)
                } else {
                    ClockTick::continuous(position)
                };
                shared.lock().await.on_clock_tick(tick);
                if position >= end_sec {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    // Dropping the last handle closes the channel and ends the printer
    drop(shared);
    printer.await.context("Event printer task failed")?;
    Ok(())
}

fn print_event(event: &PlaybackEvent) {
    match event {
        PlaybackEvent::CaptionChanged { time_sec, caption } => {
            let text = match caption {
                Some(caption) if caption.suppressed => "(hidden)".to_string(),
                Some(caption) => caption
                    .words
                    .iter()
                    .map(|w| {
                        if w.is_current {
                            format!("[{}]", w.text)
                        } else {
                            w.text.clone()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" "),
                None => String::new(),
            };
            println!("{}  caption  {}", format_clock(*time_sec), text);
        }
        PlaybackEvent::OverlayChanged {
            time_sec, overlay, ..
        } => {
            let text = match overlay {
                OverlayPayload::Idle => "-".to_string(),
                OverlayPayload::Transient { text, .. } => text.clone(),
                OverlayPayload::Staying {
                    heading_text,
                    list_items,
                } => format!(
                    "{} {:?}",
                    heading_text.as_deref().unwrap_or_default(),
                    list_items
                ),
            };
            println!("{}  overlay  {}", format_clock(*time_sec), text);
        }
        PlaybackEvent::AudioCue { time_sec, cue } => {
            println!(
                "{}  cue      {:?} {}",
                format_clock(*time_sec),
                cue.family,
                cue.text
            );
        }
        PlaybackEvent::PromptVisibilityChanged { time_sec, visible } => {
            let state = if *visible { "shown" } else { "hidden" };
            println!("{}  prompt   {}", format_clock(*time_sec), state);
        }
        PlaybackEvent::Reset => println!("--:--  reset"),
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn build_engine(input: &InputArgs) -> Result<SyncEngine> {
    let mut config = match &input.settings_dir {
        Some(dir) => SettingsManager::new(dir.clone()).load().engine,
        None => EngineConfig::default(),
    };
    if input.seed.is_some() {
        config.style_seed = input.seed;
    }

    let (words, report) = load_word_timings(&input.words).with_context(|| {
        format!(
            "Failed to load word timings from {}",
            input.words.display()
        )
    })?;
    log_report("words", &report);

    let overlays = match &input.overlays {
        Some(path) => {
            let (overlays, report) = load_overlay_events(path)
                .with_context(|| format!("Failed to load overlays from {}", path.display()))?;
            log_report("overlays", &report);
            overlays
        }
        None => OverlayStore::default(),
    };

    let mut engine = SyncEngine::new(words, overlays, config);
    engine.set_media_duration(input.duration);
    Ok(engine)
}

fn log_report(label: &str, report: &LoadReport) {
    if report.is_clean() {
        return;
    }
    warn!("{} input needed {} repairs", label, report.len());
    for repair in &report.repairs {
        warn!("  {:?}", repair);
    }
}
