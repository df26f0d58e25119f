use super::super::World;
use crate::cell::TrailSample;
use rand::Rng;

impl World {
    /// Age and expire trail samples, maybe record a new one, and advance the
    /// pulse phase. Purely visual state.
    pub(in crate::world) fn step_trail_phase(&mut self) {
        let config = &self.config;
        let rng = &mut self.rng;
        for cell in self.population.iter_mut() {
            cell.pulse_phase += config.pulse_rate;

            for sample in cell.trail.iter_mut() {
                sample.age = sample.age.saturating_add(1);
            }
            cell.trail.retain(|s| s.age < config.trail_max_age);

            if cell.trail.len() < config.trail_max_len
                && rng.random::<f64>() < config.trail_sample_rate
            {
                cell.trail.push_front(TrailSample {
                    position: cell.position,
                    radius: cell.radius(),
                    age: 0,
                });
            }
        }
    }
}
