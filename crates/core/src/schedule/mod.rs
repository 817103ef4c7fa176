//! The gap-fill scheduling pass.
//!
//! One pass is a single forward sweep over the beat source: beats already
//! covered by occupied spans are discarded, every free beat is offered to
//! the duration policy and the end-point resolver, and each successful
//! placement is committed into the interval index so later placements see
//! earlier ones. A beat that cannot host an effect is simply skipped; the
//! only fatal conditions are malformed input and a bad configuration, both
//! caught before any output is produced.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::beats::BeatSource;
use crate::config::ScheduleConfig;
use crate::palette::Selector;
use crate::policy::Kind;
use crate::resolve::resolve_end;
use crate::timeline::{Interval, IntervalIndex};
use crate::Result;

/// A newly placed effect. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub id: Uuid,
    pub interval: Interval,
    pub kind: Kind,
    /// Index into the palette the pass was configured with.
    pub color_index: usize,
}

/// Single-pass scheduler that fills free beats with non-overlapping effects.
pub struct GapFillScheduler<S> {
    config: ScheduleConfig,
    selector: S,
}

impl<S: Selector> GapFillScheduler<S> {
    /// Validates the configuration up front; a bad policy table fails here
    /// rather than part-way through a pass.
    pub fn new(config: ScheduleConfig, selector: S) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, selector })
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Runs one pass over `beats`, committing every placement into `index`
    /// and returning the emitted effects in start order.
    ///
    /// The cursor strictly advances on every iteration — either past a
    /// skipped beat or past the whole placed interval — so the pass
    /// terminates within `O(beats)` steps.
    pub fn run(&mut self, beats: &BeatSource, index: &mut IntervalIndex) -> Result<Vec<Effect>> {
        let mut effects = Vec::new();
        let mut cursor = 0;

        while let Some(beat) = beats.get(cursor).copied() {
            if !index.is_free(beat.time, self.config.margin) {
                cursor += 1;
                continue;
            }

            // The end is resolved against the union of the tier's per-kind
            // windows, so whether a beat can host an effect never depends
            // on the selector's state. The kind is drawn afterwards from
            // the kinds that admit the resolved duration.
            let tier = self.config.policy.window(beat.salience);
            let Some((min, max)) = tier.feasible_window() else {
                cursor += 1;
                continue;
            };

            let Some(end) =
                resolve_end(self.config.end_mode, beats, index, cursor, min, max)
            else {
                tracing::trace!(time = beat.time, "no placement for beat");
                cursor += 1;
                continue;
            };

            let fitting = tier.kinds_admitting(end.duration);
            if fitting.is_empty() {
                cursor += 1;
                continue;
            }
            let kind = self.selector.next_kind(&fitting);

            let interval = Interval::new(beat.time, end.end)?;
            index.insert(interval);
            effects.push(Effect {
                id: self.selector.next_id(),
                interval,
                kind,
                color_index: self.selector.next_color(self.config.palette.len()),
            });
            tracing::debug!(
                start = interval.start,
                end = interval.end,
                ?kind,
                "placed effect"
            );

            cursor = match end.end_beat {
                Some(end_beat) => end_beat + 1,
                None => beats.first_after(end.end),
            };
        }

        Ok(effects)
    }
}

/// Builds the interval index from the pre-existing spans, runs one pass and
/// returns the emitted effects.
pub fn fill_gaps<S: Selector>(
    beats: &BeatSource,
    existing: Vec<Interval>,
    config: ScheduleConfig,
    selector: S,
) -> Result<Vec<Effect>> {
    let mut index = IntervalIndex::new(existing, config.gap_buffer)?;
    let mut scheduler = GapFillScheduler::new(config, selector)?;
    scheduler.run(beats, &mut index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beats::Salience;
    use crate::palette::{RoundRobinSelector, SeededSelector};
    use crate::policy::{DurationPolicy, TierWindow};
    use crate::resolve::EndMode;

    fn spans(pairs: &[(f64, f64)]) -> Vec<Interval> {
        pairs
            .iter()
            .map(|&(s, e)| Interval::new(s, e).unwrap())
            .collect()
    }

    fn whole_second_beats(count: usize, downbeats: &[f64]) -> BeatSource {
        let mut beats = BeatSource::from_times((0..count).map(|i| i as f64).collect()).unwrap();
        beats.tag(downbeats, Salience::Downbeat, 0.001);
        beats
    }

    /// Tight table used by the step-by-step placement tests: pulses only on
    /// normal beats, two textured kinds on downbeats.
    fn pulse_heavy_policy() -> DurationPolicy {
        DurationPolicy {
            normal: TierWindow::new(0.1, 2.0, vec![Kind::Pulse]),
            strong: DurationPolicy::default().strong,
            downbeat: TierWindow::new(1.0, 8.0, vec![Kind::Spiral, Kind::Twinkle]),
        }
    }

    #[test]
    fn places_pulses_between_the_occupied_spans() {
        let beats = whole_second_beats(13, &[4.0]);
        let config = ScheduleConfig {
            policy: pulse_heavy_policy(),
            ..ScheduleConfig::default()
        };

        let effects = fill_gaps(
            &beats,
            spans(&[(0.0, 2.0), (10.0, 12.0)]),
            config,
            RoundRobinSelector::new(),
        )
        .unwrap();

        // Beats 0-2 are occupied within the margin. Beat 3 ends at beat 5:
        // the downbeat at 4 is skipped as an end point so it stays available
        // for its own effect, and it is covered by the placed span anyway.
        // Beats 10-12 sit inside or within the margin of [10, 12].
        let placed: Vec<(f64, f64)> = effects
            .iter()
            .map(|e| (e.interval.start, e.interval.end))
            .collect();
        assert_eq!(placed, vec![(3.0, 5.0), (6.0, 7.0), (8.0, 9.0)]);
        assert!(effects.iter().all(|e| e.kind == Kind::Pulse));

        let colors: Vec<usize> = effects.iter().map(|e| e.color_index).collect();
        assert_eq!(colors, vec![0, 1, 2]);
    }

    #[test]
    fn no_beats_in_gaps_yields_an_empty_list() {
        let beats = whole_second_beats(4, &[]);
        let effects = fill_gaps(
            &beats,
            spans(&[(0.0, 3.5)]),
            ScheduleConfig::default(),
            RoundRobinSelector::new(),
        )
        .unwrap();
        assert!(effects.is_empty());
    }

    #[test]
    fn an_empty_beat_source_yields_an_empty_list() {
        let beats = BeatSource::from_times(Vec::new()).unwrap();
        let effects = fill_gaps(
            &beats,
            spans(&[(0.0, 2.0)]),
            ScheduleConfig::default(),
            RoundRobinSelector::new(),
        )
        .unwrap();
        assert!(effects.is_empty());
    }

    #[test]
    fn emitted_effects_never_overlap_each_other_or_existing_spans() {
        let times: Vec<f64> = (0..240).map(|i| i as f64 * 0.25).collect();
        let downbeats: Vec<f64> = (0..30).map(|i| i as f64 * 2.0).collect();
        let mut beats = BeatSource::from_times(times).unwrap();
        beats.tag(&downbeats, Salience::Downbeat, 0.001);

        let existing = spans(&[(3.0, 5.0), (14.2, 18.7), (30.0, 31.0), (40.0, 47.5)]);
        let effects = fill_gaps(
            &beats,
            existing.clone(),
            ScheduleConfig::default(),
            SeededSelector::new(99),
        )
        .unwrap();
        assert!(!effects.is_empty());

        let mut all = existing;
        all.extend(effects.iter().map(|e| e.interval));
        all.sort_by(|a, b| a.start.total_cmp(&b.start));
        for pair in all.windows(2) {
            assert!(
                pair[0].end <= pair[1].start,
                "[{}, {}] overlaps [{}, {}]",
                pair[0].start,
                pair[0].end,
                pair[1].start,
                pair[1].end
            );
        }
    }

    #[test]
    fn quantized_effects_start_and_end_exactly_on_beats() {
        let beats = whole_second_beats(40, &[0.0, 8.0, 16.0, 24.0, 32.0]);
        let effects = fill_gaps(
            &beats,
            spans(&[(11.0, 13.0)]),
            ScheduleConfig::default(),
            SeededSelector::new(5),
        )
        .unwrap();
        assert!(!effects.is_empty());

        let beat_times: Vec<f64> = beats.beats().iter().map(|b| b.time).collect();
        for effect in &effects {
            assert!(beat_times.contains(&effect.interval.start));
            assert!(beat_times.contains(&effect.interval.end));
        }
    }

    #[test]
    fn durations_stay_inside_the_tier_and_kind_windows() {
        let beats = whole_second_beats(60, &[0.0, 4.0, 8.0, 12.0, 16.0, 20.0]);
        let config = ScheduleConfig::default();
        let policy = config.policy.clone();

        let effects = fill_gaps(&beats, Vec::new(), config, SeededSelector::new(17)).unwrap();
        assert!(!effects.is_empty());

        for effect in &effects {
            let salience = beats
                .beats()
                .iter()
                .find(|b| b.time == effect.interval.start)
                .expect("effects start on beats")
                .salience;
            let (min, max) = policy.window(salience).clamp_to(effect.kind).unwrap();
            let duration = effect.interval.duration();
            assert!(
                duration >= min && duration <= max,
                "{:?} lasting {duration}s escapes [{min}, {max}]",
                effect.kind
            );
        }
    }

    #[test]
    fn rerunning_over_the_merged_output_places_nothing() {
        let beats = whole_second_beats(40, &[0.0, 8.0, 16.0, 24.0, 32.0]);
        let existing = spans(&[(5.0, 7.0), (20.0, 22.5)]);

        let effects = fill_gaps(
            &beats,
            existing.clone(),
            ScheduleConfig::default(),
            RoundRobinSelector::new(),
        )
        .unwrap();
        assert!(!effects.is_empty());

        let mut merged = existing;
        merged.extend(effects.iter().map(|e| e.interval));
        let again = fill_gaps(
            &beats,
            merged,
            ScheduleConfig::default(),
            RoundRobinSelector::new(),
        )
        .unwrap();
        assert!(again.is_empty(), "second pass placed {}", again.len());
    }

    #[test]
    fn hosting_a_beat_never_depends_on_selector_state() {
        // A downbeat whose only candidate end lies past the wipe cap must
        // be placed with one of the longer kinds, not skipped because the
        // rotation happened to hand it a wipe; otherwise a re-run with a
        // fresh selector can reach the beat in a different rotation state
        // and place an effect the first pass did not.
        let mut beats =
            BeatSource::from_times(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 20.0, 27.0]).unwrap();
        beats.tag(&[20.0], Salience::Downbeat, 0.001);

        let effects = fill_gaps(
            &beats,
            Vec::new(),
            ScheduleConfig::default(),
            RoundRobinSelector::new(),
        )
        .unwrap();

        let on_downbeat = effects
            .iter()
            .find(|e| e.interval.start == 20.0)
            .expect("the downbeat hosts an effect");
        assert_eq!(on_downbeat.interval.end, 27.0);
        assert_ne!(on_downbeat.kind, Kind::Wipe);

        let merged: Vec<Interval> = effects.iter().map(|e| e.interval).collect();
        let again = fill_gaps(
            &beats,
            merged,
            ScheduleConfig::default(),
            RoundRobinSelector::new(),
        )
        .unwrap();
        assert!(again.is_empty(), "second pass placed {again:?}");
    }

    #[test]
    fn identical_inputs_and_seed_give_identical_output() {
        let beats = whole_second_beats(50, &[0.0, 6.0, 12.0, 18.0]);
        let existing = spans(&[(9.0, 10.5)]);

        let run = |seed| {
            fill_gaps(
                &beats,
                existing.clone(),
                ScheduleConfig::default(),
                SeededSelector::new(seed),
            )
            .unwrap()
        };

        assert_eq!(run(7), run(7));
    }

    #[test]
    fn free_running_mode_fills_up_to_the_next_occupied_span() {
        let beats = whole_second_beats(10, &[]);
        let config = ScheduleConfig {
            end_mode: EndMode::FreeRunning,
            ..ScheduleConfig::default()
        };

        let effects = fill_gaps(
            &beats,
            spans(&[(4.5, 6.0)]),
            config,
            RoundRobinSelector::new(),
        )
        .unwrap();

        // Beat 3 is capped by the occupied span at 4.5 minus the gap buffer.
        let third = effects
            .iter()
            .find(|e| e.interval.start == 3.0)
            .expect("beat 3 hosts an effect");
        assert!((third.interval.end - 4.4).abs() < 1e-9);
    }

    #[test]
    fn downbeats_receive_the_longer_textured_kinds() {
        let beats = whole_second_beats(30, &[4.0]);
        let effects = fill_gaps(
            &beats,
            Vec::new(),
            ScheduleConfig::default(),
            RoundRobinSelector::new(),
        )
        .unwrap();

        let on_downbeat = effects
            .iter()
            .find(|e| e.interval.start == 4.0);
        if let Some(effect) = on_downbeat {
            assert_ne!(effect.kind, Kind::Pulse);
            assert!(effect.interval.duration() >= 1.0);
        }
    }

    #[test]
    fn a_bad_policy_aborts_before_the_pass_runs() {
        let mut config = ScheduleConfig::default();
        config.policy.normal.kinds.clear();
        let beats = whole_second_beats(4, &[]);

        let err = fill_gaps(&beats, Vec::new(), config, RoundRobinSelector::new()).unwrap_err();
        assert!(matches!(err, crate::BeatfillError::InvalidConfig(_)));
    }
}
