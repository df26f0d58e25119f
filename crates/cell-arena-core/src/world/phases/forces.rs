use super::super::World;
use crate::cell::Cell;
use crate::constants::COINCIDENT_EPSILON;

/// Push `cell` away from the pointer, scaled linearly from `force` at the
/// pointer down to zero at `radius`.
fn apply_pointer_repulsion(cell: &mut Cell, pointer: [f64; 2], radius: f64, force: f64) {
    let dx = cell.position[0] - pointer[0];
    let dy = cell.position[1] - pointer[1];
    let distance = (dx * dx + dy * dy).sqrt();
    if distance >= radius || distance <= COINCIDENT_EPSILON {
        return;
    }
    let strength = (radius - distance) / radius * force;
    cell.velocity[0] += dx / distance * strength;
    cell.velocity[1] += dy / distance * strength;
}

/// Keep the disc inside `[0, bound]` on one axis, reflecting the velocity
/// component so it points back into the arena.
fn reflect_axis(position: &mut f64, velocity: &mut f64, radius: f64, bound: f64) {
    if 2.0 * radius >= bound {
        *position = bound * 0.5;
        *velocity = 0.0;
    } else if *position - radius < 0.0 {
        *position = radius;
        *velocity = velocity.abs();
    } else if *position + radius > bound {
        *position = bound - radius;
        *velocity = -velocity.abs();
    }
}

impl World {
    /// Pointer impulse, unit-step integration with drag, then wall reflection.
    pub(in crate::world) fn step_forces_phase(&mut self, pointer: Option<[f64; 2]>) {
        let config = &self.config;
        let arena = self.arena;
        for cell in self.population.iter_mut() {
            if let Some(pointer) = pointer {
                apply_pointer_repulsion(cell, pointer, config.pointer_radius, config.pointer_force);
            }

            cell.position[0] += cell.velocity[0];
            cell.position[1] += cell.velocity[1];
            cell.velocity[0] *= config.drag;
            cell.velocity[1] *= config.drag;

            let radius = cell.radius();
            for axis in 0..2 {
                reflect_axis(
                    &mut cell.position[axis],
                    &mut cell.velocity[axis],
                    radius,
                    arena[axis],
                );
            }
        }
    }
}
