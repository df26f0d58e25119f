use crate::cell::{Cell, CellId, CellKind};
use crate::config::{ArenaConfig, ArenaConfigError};
use crate::constants::{MAX_ARENA_SIZE, SEEDING_STREAM};
use crate::metrics::{CellSnapshot, PopulationStats, RunSummary, StepEvents};
use crate::population::Population;
use crate::rng;
use rand::Rng;
use rand_chacha::ChaCha12Rng;
use std::time::Instant;
use std::{error::Error, fmt};
use tracing::{debug, trace, warn};

#[derive(Clone, Debug)]
pub struct StepReport {
    pub step: usize,
    pub events: StepEvents,
    pub lifecycle_us: u64,
    pub interaction_us: u64,
    pub forces_us: u64,
    pub total_us: u64,
}

/// Owns one simulation session: the population, arena bounds, pointer field
/// and random stream. The host drives it by calling `step` once per frame.
pub struct World {
    population: Population,
    config: ArenaConfig,
    arena: [f64; 2],
    pointer: Option<[f64; 2]>,
    seed: u64,
    rng: ChaCha12Rng,
    next_cell_id: CellId,
    step_index: usize,
    last_events: StepEvents,
    total_births: usize,
    total_deaths: usize,
    total_immune_hits: usize,
    total_tumor_hits: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArenaInitError {
    Config(ArenaConfigError),
}

impl fmt::Display for ArenaInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArenaInitError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl From<ArenaConfigError> for ArenaInitError {
    fn from(err: ArenaConfigError) -> Self {
        ArenaInitError::Config(err)
    }
}

impl Error for ArenaInitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ArenaInitError::Config(e) => Some(e),
        }
    }
}

/// Host input rejected at the interface boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ArenaInputError {
    NonFiniteArena { width: f64, height: f64 },
    NonPositiveArena { width: f64, height: f64 },
    ArenaTooLarge { max: f64, actual: f64 },
    NonFinitePointer,
    NonFinitePosition,
    PopulationFull { capacity: usize },
}

impl fmt::Display for ArenaInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArenaInputError::NonFiniteArena { width, height } => {
                write!(f, "arena dimensions must be finite (got {width} x {height})")
            }
            ArenaInputError::NonPositiveArena { width, height } => {
                write!(f, "arena dimensions must be positive (got {width} x {height})")
            }
            ArenaInputError::ArenaTooLarge { max, actual } => {
                write!(f, "arena dimension ({actual}) exceeds supported maximum ({max})")
            }
            ArenaInputError::NonFinitePointer => write!(f, "pointer coordinates must be finite"),
            ArenaInputError::NonFinitePosition => write!(f, "cell position must be finite"),
            ArenaInputError::PopulationFull { capacity } => {
                write!(f, "population is at capacity ({capacity})")
            }
        }
    }
}

impl Error for ArenaInputError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExperimentError {
    InvalidSampleEvery,
    TooManySteps { max: usize, actual: usize },
    TooManySamples { max: usize, actual: usize },
}

impl fmt::Display for ExperimentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperimentError::InvalidSampleEvery => write!(f, "sample_every must be positive"),
            ExperimentError::TooManySteps { max, actual } => {
                write!(f, "steps ({actual}) exceed supported maximum ({max})")
            }
            ExperimentError::TooManySamples { max, actual } => {
                write!(
                    f,
                    "sample count ({actual}) exceeds supported maximum ({max})"
                )
            }
        }
    }
}

impl Error for ExperimentError {}

fn validate_arena(width: f64, height: f64) -> Result<[f64; 2], ArenaInputError> {
    if !(width.is_finite() && height.is_finite()) {
        return Err(ArenaInputError::NonFiniteArena { width, height });
    }
    if width <= 0.0 || height <= 0.0 {
        return Err(ArenaInputError::NonPositiveArena { width, height });
    }
    let largest = width.max(height);
    if largest > MAX_ARENA_SIZE {
        return Err(ArenaInputError::ArenaTooLarge {
            max: MAX_ARENA_SIZE,
            actual: largest,
        });
    }
    Ok([width, height])
}

/// Clamp one coordinate so a disc of `radius` stays inside `[0, bound]`.
/// Discs wider than the bound are centered.
pub(crate) fn clamp_axis(value: f64, radius: f64, bound: f64) -> f64 {
    if 2.0 * radius >= bound {
        bound * 0.5
    } else {
        value.clamp(radius, bound - radius)
    }
}

/// Uniform draw in `[-1, 1)`.
pub(crate) fn signed_unit(rng: &mut ChaCha12Rng) -> f64 {
    rng.random::<f64>() * 2.0 - 1.0
}

/// Build a cell with freshly drawn radius, division threshold, velocity and
/// pulse phase. The caller places it.
pub(crate) fn fresh_cell(
    config: &ArenaConfig,
    id: CellId,
    kind: CellKind,
    rng: &mut ChaCha12Rng,
) -> Cell {
    let params = config.kind(kind);
    let radius = params.base_radius + rng.random::<f64>() * params.radius_jitter;
    let division_threshold = rng.random_range(params.division_age_min..params.division_age_max);
    let mut cell = Cell::new(
        id,
        kind,
        [0.0, 0.0],
        radius,
        division_threshold,
        config.initial_health,
    );
    cell.velocity = [
        signed_unit(rng) * config.initial_speed,
        signed_unit(rng) * config.initial_speed,
    ];
    cell.pulse_phase = rng.random::<f64>() * std::f64::consts::TAU;
    cell
}

impl World {
    pub const MAX_EXPERIMENT_STEPS: usize = 1_000_000;
    pub const MAX_EXPERIMENT_SAMPLES: usize = 50_000;

    /// Create an empty world with the configured arena. Call `initialize` to
    /// seed the starting population.
    ///
    /// Without a configured seed, one is drawn from the thread RNG; read it
    /// back with `seed()` to replay the session.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaInitError> {
        config.validate()?;
        let seed = match config.seed {
            Some(seed) => seed,
            None => {
                let seed: u64 = rand::rng().random();
                debug!(seed, "no seed configured, drew one");
                seed
            }
        };
        Ok(Self {
            population: Population::new(config.max_cells),
            arena: [config.width, config.height],
            pointer: None,
            seed,
            rng: rng::create_rng(seed),
            next_cell_id: 0,
            step_index: 0,
            last_events: StepEvents::default(),
            total_births: 0,
            total_deaths: 0,
            total_immune_hits: 0,
            total_tumor_hits: 0,
            config,
        })
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Replace the configuration. Arena bounds, the population and the random
    /// stream are left untouched; a lowered `max_cells` only stops new inserts.
    pub fn set_config(&mut self, config: ArenaConfig) -> Result<(), ArenaInitError> {
        config.validate()?;
        self.population.set_capacity(config.max_cells);
        self.config = config;
        Ok(())
    }

    /// Replace the step random stream. Seeding via `initialize` also uses
    /// this seed from then on.
    pub fn reseed(&mut self, seed: u64) {
        debug!(seed, "reseeding world");
        self.seed = seed;
        self.rng = rng::create_rng(seed);
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Clear the population, set the arena, and seed the configured number of
    /// cells of each kind at random positions with random velocities.
    pub fn initialize(&mut self, width: f64, height: f64) -> Result<(), ArenaInputError> {
        let arena = validate_arena(width, height).inspect_err(|e| {
            warn!(%e, "rejected initialize");
        })?;
        self.arena = arena;
        self.population.clear();
        self.step_index = 0;
        self.last_events = StepEvents::default();

        let mut seeding_rng = rng::derive_stream_rng(self.seed, SEEDING_STREAM);
        for kind in CellKind::ALL {
            for _ in 0..self.config.initial_count(kind) {
                let id = self.allocate_id();
                let mut cell = fresh_cell(&self.config, id, kind, &mut seeding_rng);
                let radius = cell.radius();
                cell.position = [
                    Self::random_coord(radius, arena[0], &mut seeding_rng),
                    Self::random_coord(radius, arena[1], &mut seeding_rng),
                ];
                self.population.insert(cell);
            }
        }
        debug!(
            width,
            height,
            population = self.population.len(),
            "initialized world"
        );
        Ok(())
    }

    fn random_coord(radius: f64, bound: f64, rng: &mut ChaCha12Rng) -> f64 {
        let span = bound - 2.0 * radius;
        if span <= 0.0 {
            bound * 0.5
        } else {
            radius + rng.random::<f64>() * span
        }
    }

    /// Update arena bounds. Cells left outside are pushed back by the boundary
    /// pass of the next step.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<(), ArenaInputError> {
        let arena = validate_arena(width, height).inspect_err(|e| {
            warn!(%e, "rejected resize");
        })?;
        debug!(width, height, "resized arena");
        self.arena = arena;
        Ok(())
    }

    pub fn arena(&self) -> [f64; 2] {
        self.arena
    }

    pub fn set_pointer(&mut self, x: f64, y: f64) -> Result<(), ArenaInputError> {
        if !(x.is_finite() && y.is_finite()) {
            warn!(x, y, "rejected non-finite pointer");
            return Err(ArenaInputError::NonFinitePointer);
        }
        self.pointer = Some([x, y]);
        Ok(())
    }

    pub fn clear_pointer(&mut self) {
        self.pointer = None;
    }

    pub fn pointer(&self) -> Option<[f64; 2]> {
        self.pointer
    }

    /// Place one fresh cell of `kind` at `position`, clamped into the arena.
    pub fn spawn(&mut self, kind: CellKind, position: [f64; 2]) -> Result<CellId, ArenaInputError> {
        if !(position[0].is_finite() && position[1].is_finite()) {
            return Err(ArenaInputError::NonFinitePosition);
        }
        if self.population.is_full() {
            return Err(ArenaInputError::PopulationFull {
                capacity: self.population.capacity(),
            });
        }
        let id = self.allocate_id();
        let mut cell = fresh_cell(&self.config, id, kind, &mut self.rng);
        let radius = cell.radius();
        cell.position = [
            clamp_axis(position[0], radius, self.arena[0]),
            clamp_axis(position[1], radius, self.arena[1]),
        ];
        self.population.insert(cell);
        Ok(id)
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.population.iter()
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.population.get(id)
    }

    pub(crate) fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.population.get_mut(id)
    }

    /// Owned copy of every live cell for the renderer.
    pub fn snapshot(&self) -> Vec<CellSnapshot> {
        self.population.iter().map(CellSnapshot::from).collect()
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn last_events(&self) -> &StepEvents {
        &self.last_events
    }

    pub fn population_stats(&self) -> PopulationStats {
        PopulationStats {
            population_size: self.population.len(),
            normal_count: self.population.count_kind(CellKind::Normal),
            tumor_count: self.population.count_kind(CellKind::Tumor),
            immune_count: self.population.count_kind(CellKind::Immune),
            total_births: self.total_births,
            total_deaths: self.total_deaths,
        }
    }

    fn allocate_id(&mut self) -> CellId {
        let id = self.next_cell_id;
        self.next_cell_id += 1;
        id
    }

    /// Number of metric samples a run of `steps` records: one every
    /// `sample_every` steps plus the final step.
    fn experiment_sample_count(steps: usize, sample_every: usize) -> Result<usize, ExperimentError> {
        if sample_every == 0 {
            return Err(ExperimentError::InvalidSampleEvery);
        }
        if steps > Self::MAX_EXPERIMENT_STEPS {
            return Err(ExperimentError::TooManySteps {
                max: Self::MAX_EXPERIMENT_STEPS,
                actual: steps,
            });
        }
        let samples = steps.div_ceil(sample_every);
        if samples > Self::MAX_EXPERIMENT_SAMPLES {
            return Err(ExperimentError::TooManySamples {
                max: Self::MAX_EXPERIMENT_SAMPLES,
                actual: samples,
            });
        }
        Ok(samples)
    }

    /// Run `steps` steps, sampling metrics along the way. Totals in the
    /// summary count only this run, not earlier steps of the session.
    pub fn try_run_experiment(
        &mut self,
        steps: usize,
        sample_every: usize,
    ) -> Result<RunSummary, ExperimentError> {
        let sample_count = Self::experiment_sample_count(steps, sample_every)?;

        let births_before = self.total_births;
        let deaths_before = self.total_deaths;
        let immune_before = self.total_immune_hits;
        let tumor_before = self.total_tumor_hits;
        let mut samples = Vec::with_capacity(sample_count);
        for step in 1..=steps {
            let report = self.step();
            if step % sample_every == 0 || step == steps {
                samples.push(crate::metrics::collect_step_metrics(
                    self.step_index,
                    &self.population,
                    &report.events,
                ));
            }
        }
        Ok(RunSummary {
            schema_version: 1,
            steps,
            sample_every,
            final_population: self.population.len(),
            samples,
            total_births: self.total_births - births_before,
            total_deaths: self.total_deaths - deaths_before,
            total_immune_hits: self.total_immune_hits - immune_before,
            total_tumor_hits: self.total_tumor_hits - tumor_before,
        })
    }

    /// Advance the simulation by one unit of time.
    ///
    /// Phases run in a fixed order: lifecycle (aging, division, death, with
    /// removals and births applied at its end), interaction (collisions and
    /// kind effects), forces (pointer, integration, walls), then trail and
    /// pulse bookkeeping. Cells that die in the lifecycle phase take no part
    /// in later phases of the same step.
    pub fn step(&mut self) -> StepReport {
        let total_start = Instant::now();
        self.step_index = self.step_index.saturating_add(1);
        // The pointer is read once so the whole step sees one field.
        let pointer = self.pointer;
        let mut events = StepEvents::default();

        let t0 = Instant::now();
        self.step_lifecycle_phase(&mut events);
        let lifecycle_us = t0.elapsed().as_micros() as u64;

        let t1 = Instant::now();
        self.step_interaction_phase(&mut events);
        let interaction_us = t1.elapsed().as_micros() as u64;

        let t2 = Instant::now();
        self.step_forces_phase(pointer);
        self.step_trail_phase();
        let forces_us = t2.elapsed().as_micros() as u64;

        self.total_births += events.births;
        self.total_deaths += events.deaths;
        self.total_immune_hits += events.immune_hits;
        self.total_tumor_hits += events.tumor_hits;
        trace!(
            step = self.step_index,
            population = self.population.len(),
            births = events.births,
            deaths = events.deaths,
            immune_hits = events.immune_hits,
            tumor_hits = events.tumor_hits,
            "step complete"
        );
        self.last_events = events.clone();

        StepReport {
            step: self.step_index,
            events,
            lifecycle_us,
            interaction_us,
            forces_us,
            total_us: total_start.elapsed().as_micros() as u64,
        }
    }
}

mod phases;
