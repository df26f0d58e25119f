use crate::cell::CellKind;
use crate::constants::{MAX_ARENA_SIZE, MAX_CELLS};
use serde::{Deserialize, Deserializer, Serialize};

/// Per-kind lifecycle and geometry parameters.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct KindParams {
    /// Per-step division probability once the cell is division-eligible.
    pub division_rate: f64,
    /// Per-step stochastic death probability.
    pub death_rate: f64,
    /// Radius before jitter.
    pub base_radius: f64,
    /// Upper bound of the uniform jitter added to `base_radius` at creation.
    pub radius_jitter: f64,
    /// Lower bound (inclusive) of the division-threshold draw, in steps.
    pub division_age_min: u32,
    /// Upper bound (exclusive) of the division-threshold draw, in steps.
    pub division_age_max: u32,
}

impl KindParams {
    pub fn normal() -> Self {
        Self {
            division_rate: 0.001,
            death_rate: 0.0005,
            base_radius: 4.0,
            radius_jitter: 2.0,
            division_age_min: 300,
            division_age_max: 600,
        }
    }

    pub fn tumor() -> Self {
        Self {
            division_rate: 0.002,
            death_rate: 0.0003,
            base_radius: 5.0,
            radius_jitter: 2.5,
            division_age_min: 200,
            division_age_max: 400,
        }
    }

    pub fn immune() -> Self {
        Self {
            division_rate: 0.0015,
            death_rate: 0.0008,
            base_radius: 3.0,
            radius_jitter: 1.5,
            division_age_min: 250,
            division_age_max: 500,
        }
    }

    /// Largest radius a cell of this kind can be created with.
    pub fn max_radius(&self) -> f64 {
        self.base_radius + self.radius_jitter
    }
}

/// A per-kind block as it appears in config JSON. Missing fields keep the
/// defaults of the kind the block belongs to.
#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct KindParamsPatch {
    division_rate: Option<f64>,
    death_rate: Option<f64>,
    base_radius: Option<f64>,
    radius_jitter: Option<f64>,
    division_age_min: Option<u32>,
    division_age_max: Option<u32>,
}

impl KindParamsPatch {
    fn apply(self, base: KindParams) -> KindParams {
        KindParams {
            division_rate: self.division_rate.unwrap_or(base.division_rate),
            death_rate: self.death_rate.unwrap_or(base.death_rate),
            base_radius: self.base_radius.unwrap_or(base.base_radius),
            radius_jitter: self.radius_jitter.unwrap_or(base.radius_jitter),
            division_age_min: self.division_age_min.unwrap_or(base.division_age_min),
            division_age_max: self.division_age_max.unwrap_or(base.division_age_max),
        }
    }
}

fn normal_params<'de, D: Deserializer<'de>>(de: D) -> Result<KindParams, D::Error> {
    KindParamsPatch::deserialize(de).map(|patch| patch.apply(KindParams::normal()))
}

fn tumor_params<'de, D: Deserializer<'de>>(de: D) -> Result<KindParams, D::Error> {
    KindParamsPatch::deserialize(de).map(|patch| patch.apply(KindParams::tumor()))
}

fn immune_params<'de, D: Deserializer<'de>>(de: D) -> Result<KindParams, D::Error> {
    KindParamsPatch::deserialize(de).map(|patch| patch.apply(KindParams::immune()))
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArenaConfig {
    /// Seed for the step RNG and the seeding stream. When absent,
    /// `World::new` draws one from the thread RNG.
    pub seed: Option<u64>,
    /// Initial arena width in arena units.
    pub width: f64,
    /// Initial arena height in arena units.
    pub height: f64,
    /// Population cap. Inserts beyond this are dropped.
    pub max_cells: usize,
    /// Normal cells placed by `World::initialize`.
    pub initial_normal: usize,
    /// Tumor cells placed by `World::initialize`.
    pub initial_tumor: usize,
    /// Immune cells placed by `World::initialize`.
    pub initial_immune: usize,
    #[serde(deserialize_with = "normal_params")]
    pub normal: KindParams,
    #[serde(deserialize_with = "tumor_params")]
    pub tumor: KindParams,
    #[serde(deserialize_with = "immune_params")]
    pub immune: KindParams,
    /// Health every cell starts with.
    pub initial_health: f64,
    /// Each velocity component of a fresh cell is drawn from
    /// `[-initial_speed, initial_speed)`.
    pub initial_speed: f64,
    /// Maximum per-axis offset of a child from its parent.
    pub division_jitter: f64,
    /// Per-step probability that an overlapping immune cell damages a tumor cell.
    pub immune_kill_rate: f64,
    /// Health removed from a tumor cell by a successful immune hit.
    pub immune_kill_damage: f64,
    /// Per-step probability that an overlapping tumor cell damages a normal cell.
    pub tumor_damage_rate: f64,
    /// Health removed from a normal cell by a successful tumor hit.
    pub tumor_damage: f64,
    /// Pointer influence radius.
    pub pointer_radius: f64,
    /// Velocity impulse applied at zero distance from the pointer.
    pub pointer_force: f64,
    /// Multiplicative velocity damping applied every step.
    pub drag: f64,
    /// Maximum number of trail samples per cell.
    pub trail_max_len: usize,
    /// Per-step probability of recording a trail sample.
    pub trail_sample_rate: f64,
    /// Trail samples are dropped once their age reaches this many steps.
    pub trail_max_age: u32,
    /// Decorative trail samples emitted around an immune cell on a hit.
    pub kill_trail_samples: usize,
    /// Maximum per-axis scatter of hit samples around the immune cell.
    pub kill_trail_spread: f64,
    /// Age hit samples start at, so they expire sooner than regular samples.
    pub kill_trail_start_age: u32,
    /// Pulse phase advance per step (radians).
    pub pulse_rate: f64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            seed: None,
            width: 800.0,
            height: 600.0,
            max_cells: 200,
            initial_normal: 40,
            initial_tumor: 15,
            initial_immune: 25,
            normal: KindParams::normal(),
            tumor: KindParams::tumor(),
            immune: KindParams::immune(),
            initial_health: 100.0,
            initial_speed: 0.5,
            division_jitter: 20.0,
            immune_kill_rate: 0.01,
            immune_kill_damage: 10.0,
            tumor_damage_rate: 0.005,
            tumor_damage: 5.0,
            pointer_radius: 100.0,
            pointer_force: 0.5,
            drag: 0.99,
            trail_max_len: 10,
            trail_sample_rate: 0.2,
            trail_max_age: 20,
            kill_trail_samples: 3,
            kill_trail_spread: 8.0,
            kill_trail_start_age: 10,
            pulse_rate: 0.05,
        }
    }
}

macro_rules! define_arena_config_error {
    (
        $(
            $variant:ident $( { $($field:ident : $type:ty),* } )? => $fmt:literal $(, $arg:expr)*
        );* $(;)?
    ) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum ArenaConfigError {
            $(
                $variant $( { $($field : $type),* } )?,
            )*
        }

        impl std::fmt::Display for ArenaConfigError {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        Self::$variant $( { $($field),* } )? => write!(f, $fmt $(, $arg)*),
                    )*
                }
            }
        }
    };
}

define_arena_config_error! {
    InvalidArenaSize => "width and height must be positive and finite";
    ArenaTooLarge { max: f64, actual: f64 } => "arena dimension ({actual}) exceeds supported maximum ({max})";
    InvalidMaxCells => "max_cells must be greater than 0";
    TooManyCells { max: usize, actual: usize } => "max_cells ({actual}) exceeds supported maximum ({max})";
    InitialPopulationExceedsCap { cap: usize, actual: usize } => "initial population ({actual}) exceeds max_cells ({cap})";
    InvalidDivisionRate { kind: CellKind } => "{kind}.division_rate must be finite and within [0,1]";
    InvalidDeathRate { kind: CellKind } => "{kind}.death_rate must be finite and within [0,1]";
    InvalidBaseRadius { kind: CellKind } => "{kind}.base_radius must be positive and finite";
    InvalidRadiusJitter { kind: CellKind } => "{kind}.radius_jitter must be finite and non-negative";
    InvalidDivisionAgeRange { kind: CellKind } => "{kind}.division_age_min must be less than division_age_max";
    InvalidInitialHealth => "initial_health must be positive and finite";
    InvalidInitialSpeed => "initial_speed must be finite and non-negative";
    InvalidDivisionJitter => "division_jitter must be finite and non-negative";
    InvalidImmuneKillRate => "immune_kill_rate must be finite and within [0,1]";
    InvalidImmuneKillDamage => "immune_kill_damage must be finite and non-negative";
    InvalidTumorDamageRate => "tumor_damage_rate must be finite and within [0,1]";
    InvalidTumorDamage => "tumor_damage must be finite and non-negative";
    InvalidPointerRadius => "pointer_radius must be positive and finite";
    InvalidPointerForce => "pointer_force must be finite and non-negative";
    InvalidDrag => "drag must be finite and within (0,1]";
    InvalidTrailSampleRate => "trail_sample_rate must be finite and within [0,1]";
    InvalidTrailMaxAge => "trail_max_age must be positive";
    InvalidKillTrailSpread => "kill_trail_spread must be finite and non-negative";
    InvalidKillTrailStartAge => "kill_trail_start_age must be less than trail_max_age";
    InvalidPulseRate => "pulse_rate must be finite and non-negative";
}

impl std::error::Error for ArenaConfigError {}

fn is_probability(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl ArenaConfig {
    pub fn validate(&self) -> Result<(), ArenaConfigError> {
        self.validate_arena()?;
        self.validate_population()?;
        for kind in CellKind::ALL {
            self.validate_kind(kind)?;
        }
        self.validate_effects()?;
        self.validate_field()?;
        self.validate_trail()?;
        Ok(())
    }

    /// Parameters for one cell kind.
    pub fn kind(&self, kind: CellKind) -> &KindParams {
        match kind {
            CellKind::Normal => &self.normal,
            CellKind::Tumor => &self.tumor,
            CellKind::Immune => &self.immune,
        }
    }

    pub fn kind_mut(&mut self, kind: CellKind) -> &mut KindParams {
        match kind {
            CellKind::Normal => &mut self.normal,
            CellKind::Tumor => &mut self.tumor,
            CellKind::Immune => &mut self.immune,
        }
    }

    /// Number of cells `World::initialize` seeds for `kind`.
    pub fn initial_count(&self, kind: CellKind) -> usize {
        match kind {
            CellKind::Normal => self.initial_normal,
            CellKind::Tumor => self.initial_tumor,
            CellKind::Immune => self.initial_immune,
        }
    }

    pub fn initial_total(&self) -> usize {
        self.initial_normal
            .saturating_add(self.initial_tumor)
            .saturating_add(self.initial_immune)
    }

    fn validate_arena(&self) -> Result<(), ArenaConfigError> {
        if !(is_positive(self.width) && is_positive(self.height)) {
            return Err(ArenaConfigError::InvalidArenaSize);
        }
        let largest = self.width.max(self.height);
        if largest > MAX_ARENA_SIZE {
            return Err(ArenaConfigError::ArenaTooLarge {
                max: MAX_ARENA_SIZE,
                actual: largest,
            });
        }
        Ok(())
    }

    fn validate_population(&self) -> Result<(), ArenaConfigError> {
        if self.max_cells == 0 {
            return Err(ArenaConfigError::InvalidMaxCells);
        }
        if self.max_cells > MAX_CELLS {
            return Err(ArenaConfigError::TooManyCells {
                max: MAX_CELLS,
                actual: self.max_cells,
            });
        }
        let initial = self.initial_total();
        if initial > self.max_cells {
            return Err(ArenaConfigError::InitialPopulationExceedsCap {
                cap: self.max_cells,
                actual: initial,
            });
        }
        if !is_positive(self.initial_health) {
            return Err(ArenaConfigError::InvalidInitialHealth);
        }
        if !is_non_negative(self.initial_speed) {
            return Err(ArenaConfigError::InvalidInitialSpeed);
        }
        if !is_non_negative(self.division_jitter) {
            return Err(ArenaConfigError::InvalidDivisionJitter);
        }
        Ok(())
    }

    fn validate_kind(&self, kind: CellKind) -> Result<(), ArenaConfigError> {
        let params = self.kind(kind);
        if !is_probability(params.division_rate) {
            return Err(ArenaConfigError::InvalidDivisionRate { kind });
        }
        if !is_probability(params.death_rate) {
            return Err(ArenaConfigError::InvalidDeathRate { kind });
        }
        if !is_positive(params.base_radius) {
            return Err(ArenaConfigError::InvalidBaseRadius { kind });
        }
        if !is_non_negative(params.radius_jitter) {
            return Err(ArenaConfigError::InvalidRadiusJitter { kind });
        }
        if params.division_age_min >= params.division_age_max {
            return Err(ArenaConfigError::InvalidDivisionAgeRange { kind });
        }
        Ok(())
    }

    fn validate_effects(&self) -> Result<(), ArenaConfigError> {
        if !is_probability(self.immune_kill_rate) {
            return Err(ArenaConfigError::InvalidImmuneKillRate);
        }
        if !is_non_negative(self.immune_kill_damage) {
            return Err(ArenaConfigError::InvalidImmuneKillDamage);
        }
        if !is_probability(self.tumor_damage_rate) {
            return Err(ArenaConfigError::InvalidTumorDamageRate);
        }
        if !is_non_negative(self.tumor_damage) {
            return Err(ArenaConfigError::InvalidTumorDamage);
        }
        Ok(())
    }

    fn validate_field(&self) -> Result<(), ArenaConfigError> {
        if !is_positive(self.pointer_radius) {
            return Err(ArenaConfigError::InvalidPointerRadius);
        }
        if !is_non_negative(self.pointer_force) {
            return Err(ArenaConfigError::InvalidPointerForce);
        }
        if !(self.drag.is_finite() && self.drag > 0.0 && self.drag <= 1.0) {
            return Err(ArenaConfigError::InvalidDrag);
        }
        if !is_non_negative(self.pulse_rate) {
            return Err(ArenaConfigError::InvalidPulseRate);
        }
        Ok(())
    }

    fn validate_trail(&self) -> Result<(), ArenaConfigError> {
        if !is_probability(self.trail_sample_rate) {
            return Err(ArenaConfigError::InvalidTrailSampleRate);
        }
        if self.trail_max_age == 0 {
            return Err(ArenaConfigError::InvalidTrailMaxAge);
        }
        if !is_non_negative(self.kill_trail_spread) {
            return Err(ArenaConfigError::InvalidKillTrailSpread);
        }
        if self.kill_trail_start_age >= self.trail_max_age {
            return Err(ArenaConfigError::InvalidKillTrailStartAge);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_default() {
        let config = ArenaConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_rates_match_documented_values() {
        let config = ArenaConfig::default();
        assert_eq!(config.kind(CellKind::Normal).division_rate, 0.001);
        assert_eq!(config.kind(CellKind::Normal).death_rate, 0.0005);
        assert_eq!(config.kind(CellKind::Tumor).division_rate, 0.002);
        assert_eq!(config.kind(CellKind::Tumor).death_rate, 0.0003);
        assert_eq!(config.kind(CellKind::Immune).division_rate, 0.0015);
        assert_eq!(config.kind(CellKind::Immune).death_rate, 0.0008);
        assert_eq!(config.initial_total(), 80);
    }

    #[test]
    fn validate_rejects_invalid_arena() {
        let config = ArenaConfig {
            width: -1.0,
            ..ArenaConfig::default()
        };
        assert_eq!(config.validate(), Err(ArenaConfigError::InvalidArenaSize));

        let config = ArenaConfig {
            height: f64::NAN,
            ..ArenaConfig::default()
        };
        assert_eq!(config.validate(), Err(ArenaConfigError::InvalidArenaSize));

        let config = ArenaConfig {
            width: MAX_ARENA_SIZE + 1.0,
            ..ArenaConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ArenaConfigError::ArenaTooLarge { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_population_bounds() {
        let config = ArenaConfig {
            max_cells: 0,
            ..ArenaConfig::default()
        };
        assert_eq!(config.validate(), Err(ArenaConfigError::InvalidMaxCells));

        let config = ArenaConfig {
            max_cells: MAX_CELLS + 1,
            ..ArenaConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ArenaConfigError::TooManyCells { .. })
        ));

        let config = ArenaConfig {
            max_cells: 10,
            ..ArenaConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ArenaConfigError::InitialPopulationExceedsCap {
                cap: 10,
                actual: 80
            })
        );
    }

    #[test]
    fn validate_reports_offending_kind() {
        let mut config = ArenaConfig::default();
        config.kind_mut(CellKind::Tumor).death_rate = 1.5;
        assert_eq!(
            config.validate(),
            Err(ArenaConfigError::InvalidDeathRate {
                kind: CellKind::Tumor
            })
        );

        let mut config = ArenaConfig::default();
        config.immune.division_age_min = 500;
        config.immune.division_age_max = 500;
        assert_eq!(
            config.validate(),
            Err(ArenaConfigError::InvalidDivisionAgeRange {
                kind: CellKind::Immune
            })
        );
    }

    #[test]
    fn validate_rejects_out_of_range_drag_and_trail() {
        let config = ArenaConfig {
            drag: 0.0,
            ..ArenaConfig::default()
        };
        assert_eq!(config.validate(), Err(ArenaConfigError::InvalidDrag));

        let config = ArenaConfig {
            kill_trail_start_age: 20,
            trail_max_age: 20,
            ..ArenaConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ArenaConfigError::InvalidKillTrailStartAge)
        );
    }

    #[test]
    fn partial_config_json_deserializes_with_defaults() {
        let partial_json = r#"{
            "seed": 7,
            "max_cells": 120,
            "tumor": { "division_rate": 0.01 }
        }"#;
        let cfg: ArenaConfig =
            serde_json::from_str(partial_json).expect("partial config should parse");
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.max_cells, 120);
        assert_eq!(cfg.immune, KindParams::immune());
        assert_eq!(cfg.drag, 0.99);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_kind_block_keeps_that_kinds_defaults() {
        let cfg: ArenaConfig = serde_json::from_str(
            r#"{
                "tumor": { "division_rate": 0.01 },
                "immune": { "base_radius": 6.0, "division_age_max": 900 }
            }"#,
        )
        .expect("partial kind blocks should parse");
        assert_eq!(
            cfg.tumor,
            KindParams {
                division_rate: 0.01,
                ..KindParams::tumor()
            }
        );
        assert_eq!(
            cfg.immune,
            KindParams {
                base_radius: 6.0,
                division_age_max: 900,
                ..KindParams::immune()
            }
        );
        assert_eq!(cfg.normal, KindParams::normal());
        assert!(cfg.validate().is_ok());

        let typo = serde_json::from_str::<ArenaConfig>(r#"{ "tumor": { "death_rat": 0.1 } }"#);
        assert!(typo.is_err());
    }

    #[test]
    fn missing_seed_is_left_unset() {
        let cfg: ArenaConfig = serde_json::from_str(r#"{ "max_cells": 50 }"#).unwrap();
        assert_eq!(cfg.seed, None);
        assert_eq!(ArenaConfig::default().seed, None);
    }

    #[test]
    fn error_display_messages_are_preserved() {
        let cases = vec![
            (
                ArenaConfigError::InvalidArenaSize,
                "width and height must be positive and finite",
            ),
            (
                ArenaConfigError::TooManyCells {
                    max: 2000,
                    actual: 3000,
                },
                "max_cells (3000) exceeds supported maximum (2000)",
            ),
            (
                ArenaConfigError::InvalidDivisionRate {
                    kind: CellKind::Immune,
                },
                "immune.division_rate must be finite and within [0,1]",
            ),
            (
                ArenaConfigError::InvalidDrag,
                "drag must be finite and within (0,1]",
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }
}
