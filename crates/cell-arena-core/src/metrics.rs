use crate::cell::{Cell, CellId, CellKind, TrailSample};
use crate::population::Population;
use serde::{Deserialize, Serialize};

/// Read-only view of one cell, enough for a renderer to draw it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CellSnapshot {
    pub id: CellId,
    pub kind: CellKind,
    pub position: [f64; 2],
    pub radius: f64,
    pub health: f64,
    pub age: u32,
    pub pulse_phase: f64,
    pub trail: Vec<TrailSample>,
}

impl From<&Cell> for CellSnapshot {
    fn from(cell: &Cell) -> Self {
        Self {
            id: cell.id(),
            kind: cell.kind(),
            position: cell.position,
            radius: cell.radius(),
            health: cell.health,
            age: cell.age,
            pulse_phase: cell.pulse_phase,
            trail: cell.trail.iter().copied().collect(),
        }
    }
}

/// Counters produced by a single `World::step`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepEvents {
    pub births: usize,
    pub deaths: usize,
    /// Successful immune hits on tumor cells.
    pub immune_hits: usize,
    /// Successful tumor hits on normal cells.
    pub tumor_hits: usize,
    /// Overlapping pairs separated by collision resolution.
    pub collisions: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StepMetrics {
    pub step: usize,
    pub population_size: usize,
    pub normal_count: usize,
    pub tumor_count: usize,
    pub immune_count: usize,
    pub health_mean: f64,
    pub tumor_health_mean: f64,
    pub age_mean: f64,
    pub trail_samples: usize,
    pub birth_count: usize,
    pub death_count: usize,
    pub immune_hits: usize,
    pub tumor_hits: usize,
    pub collisions: usize,
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub steps: usize,
    pub sample_every: usize,
    pub final_population: usize,
    pub samples: Vec<StepMetrics>,
    #[serde(default)]
    pub total_births: usize,
    #[serde(default)]
    pub total_deaths: usize,
    #[serde(default)]
    pub total_immune_hits: usize,
    #[serde(default)]
    pub total_tumor_hits: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PopulationStats {
    pub population_size: usize,
    pub normal_count: usize,
    pub tumor_count: usize,
    pub immune_count: usize,
    pub total_births: usize,
    pub total_deaths: usize,
}

fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

pub fn collect_step_metrics(step: usize, population: &Population, events: &StepEvents) -> StepMetrics {
    let mut counts = [0usize; 3];
    let mut health_sum = 0.0;
    let mut tumor_health_sum = 0.0;
    let mut age_sum = 0.0;
    let mut trail_samples = 0;
    for cell in population {
        let slot = match cell.kind() {
            CellKind::Normal => 0,
            CellKind::Tumor => {
                tumor_health_sum += cell.health;
                1
            }
            CellKind::Immune => 2,
        };
        counts[slot] += 1;
        health_sum += cell.health;
        age_sum += cell.age as f64;
        trail_samples += cell.trail.len();
    }
    let n = population.len();
    StepMetrics {
        step,
        population_size: n,
        normal_count: counts[0],
        tumor_count: counts[1],
        immune_count: counts[2],
        health_mean: mean(health_sum, n),
        tumor_health_mean: mean(tumor_health_sum, counts[1]),
        age_mean: mean(age_sum, n),
        trail_samples,
        birth_count: events.births,
        death_count: events.deaths,
        immune_hits: events.immune_hits,
        tumor_hits: events.tumor_hits,
        collisions: events.collisions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_population_yields_zeroed_means() {
        let pop = Population::new(4);
        let m = collect_step_metrics(3, &pop, &StepEvents::default());
        assert_eq!(m.step, 3);
        assert_eq!(m.population_size, 0);
        assert_eq!(m.health_mean, 0.0);
        assert_eq!(m.tumor_health_mean, 0.0);
    }

    #[test]
    fn metrics_split_counts_by_kind() {
        let mut pop = Population::new(4);
        pop.insert(Cell::new(0, CellKind::Normal, [0.0, 0.0], 1.0, 10, 100.0));
        pop.insert(Cell::new(1, CellKind::Tumor, [0.0, 0.0], 1.0, 10, 50.0));
        pop.insert(Cell::new(2, CellKind::Immune, [0.0, 0.0], 1.0, 10, 90.0));
        let events = StepEvents {
            births: 1,
            ..StepEvents::default()
        };
        let m = collect_step_metrics(1, &pop, &events);
        assert_eq!((m.normal_count, m.tumor_count, m.immune_count), (1, 1, 1));
        assert_eq!(m.tumor_health_mean, 50.0);
        assert_eq!(m.health_mean, 80.0);
        assert_eq!(m.birth_count, 1);
    }

    #[test]
    fn run_summary_defaults_schema_version() {
        let json = r#"{"steps": 1, "sample_every": 1, "final_population": 0, "samples": []}"#;
        let summary: RunSummary = serde_json::from_str(json).expect("summary should parse");
        assert_eq!(summary.schema_version, 1);
        assert_eq!(summary.total_births, 0);
    }
}
