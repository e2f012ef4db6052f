//! Command-line driver for the gut tissue simulation.

mod render;
mod telemetry;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gut_core::SimConfig;
use gut_world::Simulation;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Initialize, divide, die and infect once, printing the patch after each
    Demo,
    /// Run every configured step with the perturbation schedule
    Run,
}

#[derive(Debug, Parser)]
#[command(name = "gut-runner", about = "Stochastic gut tissue population simulation")]
struct Args {
    /// JSON configuration file; the reference configuration when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the configured number of steps
    #[arg(long)]
    steps: Option<u64>,

    #[arg(long, value_enum, default_value_t = Mode::Demo)]
    mode: Mode,

    /// Census lines to print at the end of a run
    #[arg(long, default_value_t = 10)]
    tail: usize,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    telemetry::init_telemetry(args.json_logs)?;

    let mut config = load_config(args.config.as_ref())?;
    if let Some(seed) = args.seed {
        config.run.seed = seed;
    }
    if let Some(steps) = args.steps {
        config.run.time_steps = steps;
    }

    info!(
        mode = ?args.mode,
        seed = config.run.seed,
        time_steps = config.run.time_steps,
        "Starting gut tissue simulation"
    );

    let mut sim = Simulation::new(config).context("invalid simulation configuration")?;

    match args.mode {
        Mode::Demo => run_demo(&mut sim),
        Mode::Run => {
            let result = sim.run();
            print_patch(&sim);
            print!("{}", render::render_timeline(&result.timeline, args.tail));
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<SimConfig> {
    match path {
        Some(path) => {
            let config = SimConfig::from_path(path)
                .with_context(|| format!("loading {}", path.display()))?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => Ok(SimConfig::default()),
    }
}

fn run_demo(sim: &mut Simulation) {
    print_patch(sim);
    sim.divide();
    print_patch(sim);
    sim.die();
    print_patch(sim);
    sim.infect();
    print_patch(sim);
}

fn print_patch(sim: &Simulation) {
    println!("{}", render::render_patch(&sim.census(), &sim.grid().snapshot()));
}
