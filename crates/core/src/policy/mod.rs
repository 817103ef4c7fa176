//! Per-salience duration windows and the effect kinds they admit.
//!
//! The tiers are configuration, not hardwired logic: the whole table is
//! plain serde-able data so alternative policies can be swapped in and
//! tested on their own.

use serde::{Deserialize, Serialize};

use crate::{beats::Salience, BeatfillError, Result};

/// Closed set of visual effect categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Pulse,
    Twinkle,
    Butterfly,
    Spiral,
    Wipe,
}

impl Kind {
    pub const ALL: [Kind; 5] = [
        Kind::Pulse,
        Kind::Twinkle,
        Kind::Butterfly,
        Kind::Spiral,
        Kind::Wipe,
    ];

    /// Characteristic duration range of the kind, independent of salience.
    /// A pulse is a short hit; the textured kinds can run much longer.
    pub fn duration_range(self) -> (f64, f64) {
        match self {
            Kind::Pulse => (0.05, 2.0),
            Kind::Wipe => (0.25, 6.0),
            Kind::Twinkle => (0.4, 8.0),
            Kind::Butterfly => (0.4, 8.0),
            Kind::Spiral => (0.4, 10.0),
        }
    }
}

/// Duration window and eligible kinds for one salience tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierWindow {
    pub min_duration: f64,
    pub max_duration: f64,
    pub kinds: Vec<Kind>,
}

impl TierWindow {
    pub fn new(min_duration: f64, max_duration: f64, kinds: Vec<Kind>) -> Self {
        Self {
            min_duration,
            max_duration,
            kinds,
        }
    }

    /// Intersects the tier window with the kind's characteristic range.
    /// Returns `None` when the kind cannot fit this tier at all.
    pub fn clamp_to(&self, kind: Kind) -> Option<(f64, f64)> {
        let (kind_min, kind_max) = kind.duration_range();
        let min = self.min_duration.max(kind_min);
        let max = self.max_duration.min(kind_max);
        (min <= max).then_some((min, max))
    }

    /// Union of the clamped windows over every admitted kind. End
    /// resolution works against this, so whether a beat can host an effect
    /// never depends on which kind is later drawn from the selector.
    pub fn feasible_window(&self) -> Option<(f64, f64)> {
        self.kinds
            .iter()
            .filter_map(|&kind| self.clamp_to(kind))
            .reduce(|a, b| (a.0.min(b.0), a.1.max(b.1)))
    }

    /// The admitted kinds whose clamped window contains `duration`.
    pub fn kinds_admitting(&self, duration: f64) -> Vec<Kind> {
        self.kinds
            .iter()
            .copied()
            .filter(|&kind| {
                self.clamp_to(kind)
                    .is_some_and(|(min, max)| duration >= min && duration <= max)
            })
            .collect()
    }

    fn validate(&self, tier: &str) -> Result<()> {
        if !self.min_duration.is_finite() || self.min_duration <= 0.0 {
            return Err(BeatfillError::config(format!(
                "{tier} tier min duration {} must be positive",
                self.min_duration
            )));
        }
        if !self.max_duration.is_finite() || self.min_duration > self.max_duration {
            return Err(BeatfillError::config(format!(
                "{tier} tier window [{}, {}] is inverted",
                self.min_duration, self.max_duration
            )));
        }
        if self.kinds.is_empty() {
            return Err(BeatfillError::config(format!(
                "{tier} tier admits no effect kinds"
            )));
        }
        Ok(())
    }
}

/// Three-tier table mapping beat salience to a duration window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationPolicy {
    pub normal: TierWindow,
    pub strong: TierWindow,
    pub downbeat: TierWindow,
}

impl Default for DurationPolicy {
    fn default() -> Self {
        Self {
            normal: TierWindow::new(0.1, 2.0, vec![Kind::Pulse]),
            strong: TierWindow::new(
                0.5,
                3.0,
                vec![Kind::Pulse, Kind::Twinkle, Kind::Wipe, Kind::Butterfly],
            ),
            downbeat: TierWindow::new(
                1.0,
                8.0,
                vec![Kind::Spiral, Kind::Butterfly, Kind::Twinkle, Kind::Wipe],
            ),
        }
    }
}

impl DurationPolicy {
    pub fn window(&self, salience: Salience) -> &TierWindow {
        match salience {
            Salience::Normal => &self.normal,
            Salience::Strong => &self.strong,
            Salience::Downbeat => &self.downbeat,
        }
    }

    /// Pre-flight validation, run once before a pass starts.
    pub fn validate(&self) -> Result<()> {
        self.normal.validate("normal")?;
        self.strong.validate("strong")?;
        self.downbeat.validate("downbeat")
    }
}
