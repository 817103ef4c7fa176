use serde::{Deserialize, Serialize};

use crate::{
    palette::Palette, policy::DurationPolicy, resolve::EndMode, BeatfillError, Result,
};

/// Top-level configuration for one scheduling pass.
///
/// Everything the pass depends on is an explicit parameter here; there are
/// no hidden globals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Slack around occupied spans when deciding whether a beat is free.
    /// Beat detection jitters, and abutting effects must not visually
    /// double-fire.
    pub margin: f64,
    /// Clearance kept between a new span and the next occupied one.
    pub gap_buffer: f64,
    pub end_mode: EndMode,
    pub policy: DurationPolicy,
    pub palette: Palette,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            margin: 0.3,
            gap_buffer: 0.1,
            end_mode: EndMode::default(),
            policy: DurationPolicy::default(),
            palette: Palette::default(),
        }
    }
}

impl ScheduleConfig {
    /// Pre-flight validation, run once before a pass starts. A bad policy
    /// table or palette aborts here rather than part-way through a pass.
    pub fn validate(&self) -> Result<()> {
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(BeatfillError::config(format!(
                "margin {} must be non-negative",
                self.margin
            )));
        }
        if !self.gap_buffer.is_finite() || self.gap_buffer < 0.0 {
            return Err(BeatfillError::config(format!(
                "gap buffer {} must be non-negative",
                self.gap_buffer
            )));
        }
        if self.palette.is_empty() {
            return Err(BeatfillError::config("palette holds no colours"));
        }
        if let EndMode::BeatQuantized { lookahead } = self.end_mode {
            if lookahead == 0 {
                return Err(BeatfillError::config(
                    "beat-quantized lookahead must be at least 1",
                ));
            }
        }
        self.policy.validate()
    }
}
