pub mod cell;
pub mod config;
pub mod constants;
pub mod metrics;
pub mod population;
pub mod rng;
pub mod world;

pub use cell::{Cell, CellId, CellKind, TrailSample};
pub use config::{ArenaConfig, ArenaConfigError, KindParams};
pub use constants::{MAX_ARENA_SIZE, MAX_CELLS};
pub use metrics::{CellSnapshot, PopulationStats, RunSummary, StepEvents, StepMetrics};
pub use population::Population;
pub use world::{ArenaInitError, ArenaInputError, ExperimentError, StepReport, World};
