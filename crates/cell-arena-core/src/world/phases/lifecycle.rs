use super::super::{clamp_axis, fresh_cell, signed_unit, World};
use crate::cell::{CellId, CellKind};
use crate::metrics::StepEvents;
use rand::Rng;
use std::collections::HashSet;

impl World {
    /// Age every cell, decide divisions and deaths against the pre-step
    /// population, then apply removals and births together.
    pub(in crate::world) fn step_lifecycle_phase(&mut self, events: &mut StepEvents) {
        let capacity = self.population.capacity();
        let pre_step_len = self.population.len();
        let mut births: Vec<(CellKind, [f64; 2])> = Vec::new();
        let mut doomed: HashSet<CellId> = HashSet::new();
        {
            let config = &self.config;
            let rng = &mut self.rng;

            for cell in self.population.iter_mut() {
                cell.age = cell.age.saturating_add(1);
                let params = config.kind(cell.kind());

                if cell.is_division_eligible()
                    && pre_step_len + births.len() < capacity
                    && rng.random::<f64>() < params.division_rate
                {
                    births.push((cell.kind(), cell.position));
                    cell.age = 0;
                }

                if rng.random::<f64>() < params.death_rate || cell.is_depleted() {
                    doomed.insert(cell.id());
                }
            }
        }

        if !doomed.is_empty() {
            events.deaths += self
                .population
                .remove_where(|cell| doomed.contains(&cell.id()));
        }

        for (kind, parent_position) in births {
            let id = self.allocate_id();
            let mut child = fresh_cell(&self.config, id, kind, &mut self.rng);
            let radius = child.radius();
            let jitter = self.config.division_jitter;
            child.position = [
                clamp_axis(
                    parent_position[0] + signed_unit(&mut self.rng) * jitter,
                    radius,
                    self.arena[0],
                ),
                clamp_axis(
                    parent_position[1] + signed_unit(&mut self.rng) * jitter,
                    radius,
                    self.arena[1],
                ),
            ];
            if self.population.insert(child) {
                events.births += 1;
            }
        }
    }
}
