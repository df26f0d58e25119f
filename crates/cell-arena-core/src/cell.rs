use crate::constants::OVERLAP_EPSILON;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Stable identity of a cell. Never reused within a `World`.
pub type CellId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Normal,
    Tumor,
    Immune,
}

impl CellKind {
    pub const ALL: [CellKind; 3] = [CellKind::Normal, CellKind::Tumor, CellKind::Immune];

    pub fn as_str(self) -> &'static str {
        match self {
            CellKind::Normal => "normal",
            CellKind::Tumor => "tumor",
            CellKind::Immune => "immune",
        }
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded trail position. `age` counts steps since it was recorded.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrailSample {
    pub position: [f64; 2],
    pub radius: f64,
    pub age: u32,
}

#[derive(Clone, Debug)]
pub struct Cell {
    // Identity and geometry are fixed at creation; use accessors.
    id: CellId,
    kind: CellKind,
    radius: f64,
    division_threshold: u32,
    pub position: [f64; 2],
    pub velocity: [f64; 2],
    /// Steps since creation or since the last division.
    pub age: u32,
    pub health: f64,
    /// Monotonically increasing phase used by renderers for breathing effects.
    pub pulse_phase: f64,
    /// Most recent sample at the front.
    pub trail: VecDeque<TrailSample>,
}

impl Cell {
    pub fn new(
        id: CellId,
        kind: CellKind,
        position: [f64; 2],
        radius: f64,
        division_threshold: u32,
        health: f64,
    ) -> Self {
        Self {
            id,
            kind,
            radius,
            division_threshold,
            position,
            velocity: [0.0; 2],
            age: 0,
            health,
            pulse_phase: 0.0,
            trail: VecDeque::new(),
        }
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn division_threshold(&self) -> u32 {
        self.division_threshold
    }

    pub fn is_division_eligible(&self) -> bool {
        self.age >= self.division_threshold
    }

    pub fn is_depleted(&self) -> bool {
        self.health <= 0.0
    }

    /// Reduce health by `amount`, never going below zero.
    pub fn damage(&mut self, amount: f64) {
        self.health = (self.health - amount).max(0.0);
    }

    pub fn distance_to(&self, other: &Cell) -> f64 {
        let dx = other.position[0] - self.position[0];
        let dy = other.position[1] - self.position[1];
        (dx * dx + dy * dy).sqrt()
    }

    /// Penetration depth of the two discs; zero or negative when apart.
    pub fn overlap_depth(&self, other: &Cell) -> f64 {
        self.radius + other.radius - self.distance_to(other)
    }

    /// Whether the two discs intersect by more than `OVERLAP_EPSILON`.
    pub fn overlaps(&self, other: &Cell) -> bool {
        self.overlap_depth(other) > OVERLAP_EPSILON
    }
}
