use anyhow::{Context, Result};
use cell_arena_core::config::ArenaConfig;
use cell_arena_core::world::World;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const WARMUP_STEPS: usize = 10;
const BENCHMARK_STEPS: usize = 500;
/// One animation frame at 60 Hz.
const FRAME_BUDGET_US: f64 = 16_667.0;

#[derive(Parser)]
#[command(name = "cell-arena")]
#[command(about = "Headless driver for the cell arena backdrop simulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation from a config file and report population metrics
    Run {
        /// Path to config file (JSON). Missing fields use defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for summary.json (optional)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Number of simulation steps to run
        #[arg(long, default_value_t = 3600)]
        steps: usize,

        /// Record metrics every N steps
        #[arg(long, default_value_t = 60)]
        sample_every: usize,

        /// Override the config seed; a random seed is drawn when neither is set
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the cell snapshot after N steps as JSON, as a renderer would see it
    Snapshot {
        /// Path to config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, default_value_t = 60)]
        steps: usize,

        /// Hold the pointer at X,Y for the whole run
        #[arg(long, value_parser = parse_point)]
        pointer: Option<(f64, f64)>,
    },
    /// Time steps at several population caps
    Benchmark,
    /// Dump the default configuration to stdout
    DumpDefaultConfig,
}

fn parse_point(raw: &str) -> Result<(f64, f64), String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got {raw:?}"))?;
    let x = x.trim().parse::<f64>().map_err(|e| format!("bad x: {e}"))?;
    let y = y.trim().parse::<f64>().map_err(|e| format!("bad y: {e}"))?;
    Ok((x, y))
}

fn load_config(path: Option<&PathBuf>) -> Result<ArenaConfig> {
    let config = match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open config file {}", path.display()))?;
            let reader = BufReader::new(file);
            serde_json::from_reader(reader).context("failed to parse config")?
        }
        None => ArenaConfig::default(),
    };
    Ok(config)
}

fn build_world(config: ArenaConfig) -> Result<World> {
    let (width, height) = (config.width, config.height);
    let mut world = World::new(config).context("config validation error")?;
    world
        .initialize(width, height)
        .context("failed to seed initial population")?;
    Ok(world)
}

fn run_benchmark(max_cells: usize) -> Result<()> {
    let initial = max_cells / 2;
    let config = ArenaConfig {
        max_cells,
        initial_normal: initial / 2,
        initial_tumor: initial / 4,
        initial_immune: initial - initial / 2 - initial / 4,
        ..ArenaConfig::default()
    };
    let mut world = build_world(config)?;
    world
        .set_pointer(400.0, 300.0)
        .context("benchmark pointer rejected")?;

    for _ in 0..WARMUP_STEPS {
        world.step();
    }

    let mut total_lifecycle = 0u64;
    let mut total_interaction = 0u64;
    let mut total_forces = 0u64;
    let mut total_time = 0u64;
    for _ in 0..BENCHMARK_STEPS {
        let report = world.step();
        total_lifecycle += report.lifecycle_us;
        total_interaction += report.interaction_us;
        total_forces += report.forces_us;
        total_time += report.total_us;
    }

    let avg_step_us = (total_time as f64 / BENCHMARK_STEPS as f64).max(f64::EPSILON);
    let steps_per_sec = 1_000_000.0 / avg_step_us;
    println!("--- max_cells={max_cells} (started with {initial}) ---");
    println!("  Avg step:      {avg_step_us:.1} us ({steps_per_sec:.0} steps/sec)");
    println!(
        "  Breakdown:     lifecycle={:.1} us, interaction={:.1} us, forces={:.1} us",
        total_lifecycle as f64 / BENCHMARK_STEPS as f64,
        total_interaction as f64 / BENCHMARK_STEPS as f64,
        total_forces as f64 / BENCHMARK_STEPS as f64,
    );
    let budget_share = avg_step_us / FRAME_BUDGET_US * 100.0;
    println!("  Frame budget:  {budget_share:.2}% of a 60 Hz frame");
    println!("  Population:    {}", world.population().len());
    println!();
    Ok(())
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::DumpDefaultConfig => {
            let config = ArenaConfig::default();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Benchmark => {
            if cfg!(debug_assertions) {
                eprintln!("WARNING: running in debug mode. Results are not representative.");
                eprintln!("         Use: cargo run -p cell-arena-cli --release -- benchmark");
                eprintln!();
            }
            println!("=== Cell Arena Step Benchmark ===");
            println!("Warmup: {WARMUP_STEPS} steps, Benchmark: {BENCHMARK_STEPS} steps");
            println!();
            for max_cells in [50, 200, 500, 2000] {
                run_benchmark(max_cells)?;
            }
        }
        Commands::Run {
            config,
            out,
            steps,
            sample_every,
            seed,
        } => {
            let mut sim_config = load_config(config.as_ref())?;
            if seed.is_some() {
                sim_config.seed = seed;
            }

            let mut world = build_world(sim_config)?;
            info!(seed = world.seed(), steps, "starting run");
            let summary = world
                .try_run_experiment(steps, sample_every)
                .context("invalid experiment parameters")?;

            if let Some(out_dir) = out {
                std::fs::create_dir_all(&out_dir).context("failed to create output directory")?;
                let summary_path = out_dir.join("summary.json");
                let file = File::create(&summary_path).context("failed to create summary file")?;
                serde_json::to_writer_pretty(file, &summary).context("failed to write summary")?;
                info!(path = %summary_path.display(), "run complete");
            } else {
                let stats = world.population_stats();
                println!(
                    "Run complete. Population: {} (normal {}, tumor {}, immune {}); births {}, deaths {}, immune hits {}",
                    stats.population_size,
                    stats.normal_count,
                    stats.tumor_count,
                    stats.immune_count,
                    summary.total_births,
                    summary.total_deaths,
                    summary.total_immune_hits,
                );
            }
        }
        Commands::Snapshot {
            config,
            steps,
            pointer,
        } => {
            let sim_config = load_config(config.as_ref())?;
            let mut world = build_world(sim_config)?;
            if let Some((x, y)) = pointer {
                world.set_pointer(x, y).context("pointer rejected")?;
            }
            for _ in 0..steps {
                world.step();
            }
            println!("{}", serde_json::to_string_pretty(&world.snapshot())?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_point_accepts_comma_pair() {
        assert_eq!(parse_point("12.5, 40").unwrap(), (12.5, 40.0));
        assert!(parse_point("12.5").is_err());
        assert!(parse_point("a,1").is_err());
    }
}
