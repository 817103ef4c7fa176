//! Core library for the Beatfill effect scheduler.
//!
//! Beatfill places timed visual effects onto a one-dimensional show
//! timeline: regions not already covered by existing effects receive new,
//! non-overlapping effects whose boundaries align to beat timestamps
//! supplied by an external audio analysis step. Each module owns one stage
//! of that pipeline — the occupied interval index, the beat source, the
//! per-salience duration policy, end-point resolution and the driving
//! gap-fill pass — so that every stage can be exercised on its own.

pub mod beats;
pub mod codec;
pub mod config;
pub mod error;
pub mod palette;
pub mod policy;
pub mod resolve;
pub mod schedule;
pub mod timeline;

pub use beats::{Beat, BeatSource, Salience};
pub use codec::{format_duration, parse_duration};
pub use config::ScheduleConfig;
pub use error::{BeatfillError, Result};
pub use palette::{Color, Palette, RoundRobinSelector, SeededSelector, Selector};
pub use policy::{DurationPolicy, Kind, TierWindow};
pub use resolve::{resolve_end, EndMode, EndPoint};
pub use schedule::{fill_gaps, Effect, GapFillScheduler};
pub use timeline::{Interval, IntervalIndex};
