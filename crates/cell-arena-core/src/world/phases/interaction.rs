use super::super::World;
use crate::cell::{Cell, CellKind, TrailSample};
use crate::config::ArenaConfig;
use crate::constants::{COINCIDENT_EPSILON, OVERLAP_EPSILON};
use crate::metrics::StepEvents;
use rand::Rng;
use rand_chacha::ChaCha12Rng;

/// Push two overlapping cells apart along the line between their centers,
/// each by half the penetration depth. Returns whether they overlapped.
///
/// Coincident centers are separated along the x axis.
pub(crate) fn resolve_overlap(a: &mut Cell, b: &mut Cell) -> bool {
    let dx = b.position[0] - a.position[0];
    let dy = b.position[1] - a.position[1];
    let distance = (dx * dx + dy * dy).sqrt();
    let depth = a.radius() + b.radius() - distance;
    if depth <= OVERLAP_EPSILON {
        return false;
    }
    let normal = if distance > COINCIDENT_EPSILON {
        [dx / distance, dy / distance]
    } else {
        [1.0, 0.0]
    };
    let half = depth * 0.5;
    a.position[0] -= normal[0] * half;
    a.position[1] -= normal[1] * half;
    b.position[0] += normal[0] * half;
    b.position[1] += normal[1] * half;
    true
}

fn immune_hit(
    immune: &mut Cell,
    tumor: &mut Cell,
    config: &ArenaConfig,
    rng: &mut ChaCha12Rng,
    events: &mut StepEvents,
) {
    // Already depleted targets are left for the next lifecycle pass.
    if tumor.is_depleted() || rng.random::<f64>() >= config.immune_kill_rate {
        return;
    }
    tumor.damage(config.immune_kill_damage);
    events.immune_hits += 1;

    // Visual-only burst around the immune cell.
    for _ in 0..config.kill_trail_samples {
        if immune.trail.len() >= config.trail_max_len {
            break;
        }
        let offset = [
            (rng.random::<f64>() * 2.0 - 1.0) * config.kill_trail_spread,
            (rng.random::<f64>() * 2.0 - 1.0) * config.kill_trail_spread,
        ];
        immune.trail.push_front(TrailSample {
            position: [
                immune.position[0] + offset[0],
                immune.position[1] + offset[1],
            ],
            radius: immune.radius() * 0.5,
            age: config.kill_trail_start_age,
        });
    }
}

fn tumor_hit(
    normal: &mut Cell,
    config: &ArenaConfig,
    rng: &mut ChaCha12Rng,
    events: &mut StepEvents,
) {
    if normal.is_depleted() || rng.random::<f64>() >= config.tumor_damage_rate {
        return;
    }
    normal.damage(config.tumor_damage);
    events.tumor_hits += 1;
}

fn apply_kind_effects(
    a: &mut Cell,
    b: &mut Cell,
    config: &ArenaConfig,
    rng: &mut ChaCha12Rng,
    events: &mut StepEvents,
) {
    match (a.kind(), b.kind()) {
        (CellKind::Immune, CellKind::Tumor) => immune_hit(a, b, config, rng, events),
        (CellKind::Tumor, CellKind::Immune) => immune_hit(b, a, config, rng, events),
        (CellKind::Tumor, CellKind::Normal) => tumor_hit(b, config, rng, events),
        (CellKind::Normal, CellKind::Tumor) => tumor_hit(a, config, rng, events),
        _ => {}
    }
}

impl World {
    /// All-pairs pass: each unordered pair is visited once. Overlapping pairs
    /// are separated, then kind effects are rolled for them.
    pub(in crate::world) fn step_interaction_phase(&mut self, events: &mut StepEvents) {
        let config = &self.config;
        let rng = &mut self.rng;
        let cells = self.population.as_mut_slice();
        let n = cells.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let (head, tail) = cells.split_at_mut(j);
                let a = &mut head[i];
                let b = &mut tail[0];
                if !resolve_overlap(a, b) {
                    continue;
                }
                events.collisions += 1;
                apply_kind_effects(a, b, config, rng, events);
            }
        }
    }
}
