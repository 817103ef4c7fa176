//! Ordered beat sequence shared by the resolver and the scheduler.

use serde::{Deserialize, Serialize};

use crate::{BeatfillError, Result};

/// Qualitative strength class of a beat.
///
/// The ordering matters: when duplicate timestamps collapse, the stronger
/// tag wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Salience {
    Normal,
    Strong,
    Downbeat,
}

/// A candidate alignment point for an effect's start or end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    pub time: f64,
    pub salience: Salience,
}

impl Beat {
    pub fn new(time: f64, salience: Salience) -> Self {
        Self { time, salience }
    }
}

/// Immutable, deduplicated beat sequence for one scheduling pass.
#[derive(Debug, Clone, Default)]
pub struct BeatSource {
    beats: Vec<Beat>,
}

impl BeatSource {
    /// Builds a source from tagged beats. The input must already be sorted
    /// by time; duplicate timestamps collapse into one beat keeping the
    /// stronger tag. Out-of-order input fails the whole pass.
    pub fn new(beats: Vec<Beat>) -> Result<Self> {
        let mut deduped: Vec<Beat> = Vec::with_capacity(beats.len());
        for beat in beats {
            if !beat.time.is_finite() || beat.time < 0.0 {
                return Err(BeatfillError::input(format!(
                    "beat timestamp {} is not a valid time",
                    beat.time
                )));
            }
            match deduped.last_mut() {
                Some(last) if beat.time == last.time => {
                    last.salience = last.salience.max(beat.salience);
                }
                Some(last) if beat.time < last.time => {
                    return Err(BeatfillError::input(format!(
                        "beats are not sorted: {} follows {}",
                        beat.time, last.time
                    )));
                }
                _ => deduped.push(beat),
            }
        }
        Ok(Self { beats: deduped })
    }

    /// Builds a source of plain beats without salience tags.
    pub fn from_times(times: Vec<f64>) -> Result<Self> {
        Self::new(
            times
                .into_iter()
                .map(|time| Beat::new(time, Salience::Normal))
                .collect(),
        )
    }

    /// Upgrades every beat lying within `tolerance` of one of `times` to
    /// `salience`. Tags never downgrade an already stronger beat. This is
    /// how a separately supplied downbeat list is merged in.
    pub fn tag(&mut self, times: &[f64], salience: Salience, tolerance: f64) {
        for &time in times {
            let from = self
                .beats
                .partition_point(|beat| beat.time < time - tolerance);
            for beat in self.beats[from..].iter_mut() {
                if beat.time > time + tolerance {
                    break;
                }
                beat.salience = beat.salience.max(salience);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.beats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Beat> {
        self.beats.get(index)
    }

    pub fn beats(&self) -> &[Beat] {
        &self.beats
    }

    /// Index of the first beat strictly after `time`.
    pub fn first_after(&self, time: f64) -> usize {
        self.beats.partition_point(|beat| beat.time <= time)
    }
}
