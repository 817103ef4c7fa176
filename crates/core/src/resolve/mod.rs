//! End-point resolution for a candidate placement.

use serde::{Deserialize, Serialize};

use crate::beats::{BeatSource, Salience};
use crate::timeline::IntervalIndex;

/// How the end of a new effect is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndMode {
    /// The effect must end exactly on a later beat, scanning at most
    /// `lookahead` beats past the start.
    BeatQuantized { lookahead: usize },
    /// The effect runs until the duration cap or the next occupied span,
    /// whichever comes first.
    FreeRunning,
}

impl Default for EndMode {
    fn default() -> Self {
        EndMode::BeatQuantized { lookahead: 20 }
    }
}

/// Accepted end point for a placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndPoint {
    pub end: f64,
    pub duration: f64,
    /// Index of the beat the effect ends on, in beat-quantized mode.
    pub end_beat: Option<usize>,
}

/// Finds an end for an effect starting on beat `start` so that the duration
/// lands in `[min, max]` without entering occupied territory. Deterministic
/// and total: returns `None` when the beat cannot host an effect.
pub fn resolve_end(
    mode: EndMode,
    beats: &BeatSource,
    index: &IntervalIndex,
    start: usize,
    min: f64,
    max: f64,
) -> Option<EndPoint> {
    let start_time = beats.get(start)?.time;

    match mode {
        EndMode::FreeRunning => {
            let duration = index.free_span(start_time, max);
            (duration >= min).then_some(EndPoint {
                end: start_time + duration,
                duration,
                end_beat: None,
            })
        }
        EndMode::BeatQuantized { lookahead } => {
            // Intermediate beats may be covered, but the new span must not
            // cross into the next occupied one.
            let limit = index.next_occupied_start(start_time).unwrap_or(f64::INFINITY);
            let last = (start + lookahead).min(beats.len().saturating_sub(1));

            for candidate in (start + 1)..=last {
                let beat = beats.get(candidate)?;
                let duration = beat.time - start_time;
                if duration < min {
                    continue;
                }
                if duration > max || beat.time > limit {
                    break;
                }
                // Downbeats stay available to start their own, longer effect.
                if beat.salience == Salience::Downbeat {
                    continue;
                }
                if !index.is_free(beat.time, 0.0) {
                    continue;
                }
                return Some(EndPoint {
                    end: beat.time,
                    duration,
                    end_beat: Some(candidate),
                });
            }
            None
        }
    }
}
