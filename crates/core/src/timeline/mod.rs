//! Sorted index of the occupied spans on the timeline.

use serde::{Deserialize, Serialize};

use crate::{BeatfillError, Result};

/// An occupied span on the timeline, `start < end`, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn new(start: f64, end: f64) -> Result<Self> {
        if !start.is_finite() || !end.is_finite() || start < 0.0 {
            return Err(BeatfillError::input(format!(
                "interval [{start}, {end}] is not a valid span"
            )));
        }
        if start >= end {
            return Err(BeatfillError::input(format!(
                "interval [{start}, {end}] has non-positive length"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// True when the two spans share more than a boundary point.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Sorted set of occupied intervals, owned exclusively by one scheduling
/// pass.
///
/// Pre-existing spans may overlap each other (real sequence files layer
/// effects) and are coalesced on construction, so every query works on
/// disjoint spans with strictly increasing ends. Spans inserted during the
/// pass must already be known free.
#[derive(Debug, Clone, Default)]
pub struct IntervalIndex {
    spans: Vec<Interval>,
    gap_buffer: f64,
}

impl IntervalIndex {
    /// Builds the index from the pre-existing occupied spans. `gap_buffer`
    /// is the clearance [`IntervalIndex::free_span`] keeps before the next
    /// occupied span so a new effect never touches it.
    pub fn new(existing: Vec<Interval>, gap_buffer: f64) -> Result<Self> {
        if !gap_buffer.is_finite() || gap_buffer < 0.0 {
            return Err(BeatfillError::config(format!(
                "gap buffer {gap_buffer} must be non-negative"
            )));
        }

        let mut sorted = existing;
        sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut spans: Vec<Interval> = Vec::with_capacity(sorted.len());
        for span in sorted {
            match spans.last_mut() {
                Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
                _ => spans.push(span),
            }
        }

        Ok(Self { spans, gap_buffer })
    }

    /// True iff no occupied span comes within `margin` of `time`.
    pub fn is_free(&self, time: f64, margin: f64) -> bool {
        // Spans are disjoint with increasing ends, so only the last span
        // starting at or before `time + margin` can reach the query point.
        let idx = self.spans.partition_point(|span| span.start <= time + margin);
        match idx.checked_sub(1).and_then(|i| self.spans.get(i)) {
            Some(span) => time > span.end + margin,
            None => true,
        }
    }

    /// Largest free duration starting at `time`, capped at `cap` and backed
    /// off from the next occupied span by the gap buffer. The caller is
    /// expected to have checked that `time` itself is free.
    pub fn free_span(&self, time: f64, cap: f64) -> f64 {
        match self.next_occupied_start(time) {
            Some(next_start) if next_start - time - self.gap_buffer < cap => {
                (next_start - time - self.gap_buffer).max(0.0)
            }
            _ => cap,
        }
    }

    /// Start of the first occupied span beginning strictly after `time`.
    pub fn next_occupied_start(&self, time: f64) -> Option<f64> {
        let idx = self.spans.partition_point(|span| span.start <= time);
        self.spans.get(idx).map(|span| span.start)
    }

    /// Commits a newly placed span, keeping the index sorted.
    ///
    /// The caller must have validated the placement first; inserting into
    /// occupied territory is a programming error and fails fast.
    pub fn insert(&mut self, interval: Interval) {
        let idx = self
            .spans
            .partition_point(|span| span.start <= interval.start);
        if let Some(prev) = idx.checked_sub(1).and_then(|i| self.spans.get(i)) {
            assert!(
                !prev.overlaps(&interval),
                "insert of [{}, {}] overlaps occupied [{}, {}]",
                interval.start,
                interval.end,
                prev.start,
                prev.end
            );
        }
        if let Some(next) = self.spans.get(idx) {
            assert!(
                !next.overlaps(&interval),
                "insert of [{}, {}] overlaps occupied [{}, {}]",
                interval.start,
                interval.end,
                next.start,
                next.end
            );
        }
        self.spans.insert(idx, interval);
    }

    pub fn spans(&self) -> &[Interval] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}
