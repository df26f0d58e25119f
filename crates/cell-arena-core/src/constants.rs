/// Largest accepted arena dimension (arena units) on either axis.
pub const MAX_ARENA_SIZE: f64 = 16_384.0;

/// Hard ceiling on the configurable population cap. Interaction is all-pairs,
/// so per-step cost grows with the square of this value.
pub const MAX_CELLS: usize = 2_000;

/// Prime multiplier used to derive independent RNG streams from a base seed.
pub const RNG_DERIVATION_PRIME: u64 = 7919;

/// Stream index reserved for the initial seeding batch.
pub const SEEDING_STREAM: u64 = 1;

/// Distance below which two centers are treated as coincident during
/// collision resolution.
pub const COINCIDENT_EPSILON: f64 = 1e-9;

/// Overlap depth below which two discs are treated as merely touching.
/// Keeps collision resolution idempotent under floating-point rounding.
pub const OVERLAP_EPSILON: f64 = 1e-9;
