//! Colour palette and the pluggable kind/colour selection strategies.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::policy::Kind;

/// CIE XYZ colour triple, matching what the sequence format stores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Fixed list of colours new effects draw from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: vec![
                Color { x: 41.245_643_94, y: 21.267_290_07, z: 1.933_390_82 }, // red
                Color { x: 18.05, y: 7.22, z: 95.05 },                         // blue
                Color { x: 35.76, y: 71.52, z: 11.92 },                        // green
                Color { x: 77.0, y: 92.78, z: 13.85 },                         // yellow
                Color { x: 13.80, y: 6.16, z: 43.59 },                         // purple
                Color { x: 59.01, y: 56.80, z: 7.85 },                         // orange
                Color { x: 95.05, y: 100.0, z: 108.88 },                       // white
                Color { x: 42.35, y: 55.82, z: 103.15 },                       // light blue
            ],
        }
    }
}

impl Palette {
    pub fn new(colors: Vec<Color>) -> Self {
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Color> {
        self.colors.get(index)
    }
}

/// Pluggable choice of effect kind, colour and id for each placement.
///
/// Implementations must be deterministic for a fixed starting state so that
/// two identical passes emit identical effect lists. The eligible kind set
/// handed to [`Selector::next_kind`] is never empty (the scheduler only
/// asks once it has a duration some kind admits).
pub trait Selector {
    /// Picks one kind out of the eligible set.
    fn next_kind(&mut self, eligible: &[Kind]) -> Kind;

    /// Picks a palette index. Consecutive calls must not return the same
    /// index while the palette holds more than one colour.
    fn next_color(&mut self, palette_len: usize) -> usize;

    /// Produces the id for the next emitted effect.
    fn next_id(&mut self) -> Uuid;
}

/// Default strategy: walks the eligible kinds and the palette in rotation.
#[derive(Debug, Default)]
pub struct RoundRobinSelector {
    kind_cursor: usize,
    color_cursor: usize,
    id_counter: u128,
}

impl RoundRobinSelector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Selector for RoundRobinSelector {
    fn next_kind(&mut self, eligible: &[Kind]) -> Kind {
        let kind = eligible[self.kind_cursor % eligible.len()];
        self.kind_cursor += 1;
        kind
    }

    fn next_color(&mut self, palette_len: usize) -> usize {
        let index = self.color_cursor % palette_len;
        self.color_cursor += 1;
        index
    }

    fn next_id(&mut self) -> Uuid {
        self.id_counter += 1;
        Uuid::from_u128(self.id_counter)
    }
}

/// Seeded random strategy: varied output that stays reproducible.
#[derive(Debug)]
pub struct SeededSelector {
    rng: StdRng,
    last_color: Option<usize>,
}

impl SeededSelector {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            last_color: None,
        }
    }
}

impl Selector for SeededSelector {
    fn next_kind(&mut self, eligible: &[Kind]) -> Kind {
        eligible[self.rng.gen_range(0..eligible.len())]
    }

    fn next_color(&mut self, palette_len: usize) -> usize {
        loop {
            let index = self.rng.gen_range(0..palette_len);
            if palette_len == 1 || self.last_color != Some(index) {
                self.last_color = Some(index);
                return index;
            }
        }
    }

    fn next_id(&mut self) -> Uuid {
        Uuid::from_u128(self.rng.gen())
    }
}
