use std::fs;
use std::path::{Path, PathBuf};

use beatfill_core::{
    fill_gaps, format_duration, parse_duration, BeatSource, BeatfillError, Effect, EndMode,
    Interval, IntervalIndex, RoundRobinSelector, Salience, ScheduleConfig, SeededSelector,
};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// How close a downbeat timestamp must sit to a beat to upgrade it.
const DOWNBEAT_TOLERANCE: f64 = 0.001;

fn main() -> beatfill_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fill {
            beats,
            downbeats,
            existing,
            free_running,
            seed,
            output,
        } => run_fill(
            &beats,
            downbeats.as_deref(),
            existing.as_deref(),
            free_running,
            seed,
            output.as_deref(),
        ),
        Commands::Gaps { existing, length } => run_gaps(&existing, length),
    }
}

fn run_fill(
    beats_path: &Path,
    downbeats: Option<&Path>,
    existing: Option<&Path>,
    free_running: bool,
    seed: Option<u64>,
    output: Option<&Path>,
) -> beatfill_core::Result<()> {
    let mut beats = BeatSource::from_times(read_times(beats_path)?)?;
    if let Some(path) = downbeats {
        beats.tag(&read_times(path)?, Salience::Downbeat, DOWNBEAT_TOLERANCE);
    }
    let existing = match existing {
        Some(path) => read_existing(path)?,
        None => Vec::new(),
    };

    let mut config = ScheduleConfig::default();
    if free_running {
        config.end_mode = EndMode::FreeRunning;
    }

    tracing::info!(
        beats = beats.len(),
        existing = existing.len(),
        free_running,
        "running gap-fill pass"
    );

    let effects = match seed {
        Some(seed) => fill_gaps(&beats, existing, config, SeededSelector::new(seed))?,
        None => fill_gaps(&beats, existing, config, RoundRobinSelector::new())?,
    };
    tracing::info!(placed = effects.len(), "pass complete");

    let records: Vec<EffectRecord> = effects.iter().map(EffectRecord::from).collect();
    let json = serde_json::to_string_pretty(&records)
        .map_err(|e| BeatfillError::input(format!("could not encode effects: {e}")))?;
    match output {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}

fn run_gaps(existing: &Path, length: f64) -> beatfill_core::Result<()> {
    let index = IntervalIndex::new(read_existing(existing)?, 0.0)?;

    let mut previous_end = 0.0;
    for span in index.spans() {
        if span.start > previous_end {
            println!("{previous_end:.3} .. {:.3}", span.start);
        }
        previous_end = span.end;
    }
    if length > previous_end {
        println!("{previous_end:.3} .. {length:.3}");
    }
    Ok(())
}

/// One beat timestamp in seconds per line; blank lines are skipped.
fn read_times(path: &Path) -> beatfill_core::Result<Vec<f64>> {
    let mut times = Vec::new();
    for line in fs::read_to_string(path)?.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let time: f64 = line.parse().map_err(|_| {
            BeatfillError::input(format!("{}: `{line}` is not a timestamp", path.display()))
        })?;
        times.push(time);
    }
    Ok(times)
}

fn read_existing(path: &Path) -> beatfill_core::Result<Vec<Interval>> {
    let text = fs::read_to_string(path)?;
    let records: Vec<IntervalRecord> = serde_json::from_str(&text)
        .map_err(|e| BeatfillError::input(format!("{}: {e}", path.display())))?;

    records
        .iter()
        .map(|record| {
            let start = parse_duration(&record.start)?;
            let span = parse_duration(&record.span)?;
            Interval::new(start, start + span)
        })
        .collect()
}

/// Occupied span as stored in the persisted sequence document.
#[derive(Debug, Deserialize)]
struct IntervalRecord {
    start: String,
    span: String,
}

/// Output record for one placed effect.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EffectRecord {
    id: String,
    start: String,
    span: String,
    kind: String,
    color_index: usize,
}

impl From<&Effect> for EffectRecord {
    fn from(effect: &Effect) -> Self {
        Self {
            id: effect.id.to_string(),
            start: format_duration(effect.interval.start),
            span: format_duration(effect.interval.duration()),
            kind: format!("{:?}", effect.kind),
            color_index: effect.color_index,
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Beat-aligned gap filler for show timelines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fill uncovered beats with new effects and emit them as JSON.
    Fill {
        /// File with one beat timestamp (seconds) per line.
        beats: PathBuf,
        /// Optional file with downbeat timestamps to upgrade.
        #[arg(long)]
        downbeats: Option<PathBuf>,
        /// Optional JSON file with the already occupied spans.
        #[arg(long)]
        existing: Option<PathBuf>,
        /// Let effect ends run to the next occupied span instead of a beat.
        #[arg(long)]
        free_running: bool,
        /// Seed for randomised kind/colour choice; rotation order is used
        /// when omitted.
        #[arg(long)]
        seed: Option<u64>,
        /// Output path; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the free gaps between the occupied spans of a timeline.
    Gaps {
        /// JSON file with the occupied spans.
        existing: PathBuf,
        /// Total timeline length in seconds.
        #[arg(long)]
        length: f64,
    },
}
