mod annotate;
mod config;
mod constants;
mod engine;
mod error;
mod fitness;
mod ga;
mod game;
mod genome;
mod optimizer;
mod report;
mod worker;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing_subscriber::EnvFilter;

use crate::config::{FitnessMode, OptimizerConfig};
use crate::constants::DEFAULT_SAMPLE_COUNT;
use crate::engine::{EngineProcess, PositionOracle, SharedEngine};
use crate::error::Result;
use crate::fitness::{AcplFitness, FitnessStrategy, TournamentFitness};
use crate::game::agents::StandardAgents;
use crate::game::book::OpeningBook;
use crate::game::ChessRules;
use crate::optimizer::Optimizer;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON run profile; missing fields use built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evolve genomes with the genetic algorithm
    Optimize(Overrides),
    /// Score freshly sampled genomes once by average centipawn loss
    Sample {
        /// Number of genomes to sample
        #[arg(long, default_value_t = DEFAULT_SAMPLE_COUNT)]
        count: usize,

        #[command(flatten)]
        overrides: Overrides,
    },
    /// Score a file of FEN positions with the reference engine
    Annotate {
        /// Newline-delimited FEN file
        input: PathBuf,

        /// Destination CSV
        #[arg(long, default_value = "annotations.csv")]
        output: PathBuf,

        /// Path to the reference engine binary
        #[arg(long)]
        engine: Option<PathBuf>,
    },
}

/// Command line values that take precedence over the profile.
#[derive(clap::Args, Debug, Default)]
struct Overrides {
    #[arg(long)]
    population: Option<usize>,

    #[arg(long)]
    generations: Option<u32>,

    /// Seed for every random choice of the run
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum)]
    mode: Option<FitnessMode>,

    /// Opening book (one FEN per line)
    #[arg(long)]
    book: Option<PathBuf>,

    /// Path to the reference engine binary
    #[arg(long)]
    engine: Option<PathBuf>,

    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Maximum number of concurrent evaluations
    #[arg(long)]
    workers: Option<usize>,

    /// Append every ACPL score to this CSV
    #[arg(long)]
    audit_trail: Option<PathBuf>,
}

impl Overrides {
    fn apply(&self, config: &mut OptimizerConfig) {
        if let Some(population) = self.population {
            config.population_size = population;
        }
        if let Some(generations) = self.generations {
            config.generations = generations;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(mode) = self.mode {
            config.fitness_mode = mode;
        }
        if let Some(book) = &self.book {
            config.opening_book = book.clone();
        }
        if let Some(engine) = &self.engine {
            config.engine.path = engine.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(workers) = self.workers {
            config.max_concurrent_evaluations = workers;
        }
        if let Some(audit_trail) = &self.audit_trail {
            config.audit_trail = Some(audit_trail.clone());
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
    std::panic::set_hook(Box::new(tracing_panic::panic_hook));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => OptimizerConfig::load(path)?,
        None => OptimizerConfig::default(),
    };

    match cli.command {
        Command::Optimize(overrides) => {
            overrides.apply(&mut config);
            let (config, rng) = prepare(config)?;
            let strategy = build_strategy(&config, config.fitness_mode)?;
            Optimizer::new(config, strategy, rng).run()?;
        }
        Command::Sample { count, overrides } => {
            overrides.apply(&mut config);
            config.fitness_mode = FitnessMode::Acpl;
            let (config, rng) = prepare(config)?;
            let strategy = build_strategy(&config, FitnessMode::Acpl)?;
            Optimizer::new(config, strategy, rng).sample(count)?;
        }
        Command::Annotate {
            input,
            output,
            engine,
        } => {
            if let Some(engine) = engine {
                config.engine.path = engine;
            }
            let oracle = SharedEngine::new(EngineProcess::spawn(&config.engine)?);
            let rows = annotate::annotate_positions(&input, &oracle)?;
            report::write_annotations(&output, &rows)?;
        }
    }
    Ok(())
}

/// Validates the final configuration, fixes the seed and snapshots both
/// next to the results.
fn prepare(mut config: OptimizerConfig) -> Result<(OptimizerConfig, StdRng)> {
    config.validate()?;
    let seed = config.seed.unwrap_or_else(|| StdRng::from_entropy().next_u64());
    config.seed = Some(seed);
    let snapshot = config.save_snapshot()?;
    tracing::info!("Run seed {seed}, configuration saved to {}", snapshot.display());
    Ok((config, StdRng::seed_from_u64(seed)))
}

fn build_strategy(config: &OptimizerConfig, mode: FitnessMode) -> Result<Box<dyn FitnessStrategy>> {
    let book = Arc::new(OpeningBook::<ChessRules>::load(&config.opening_book)?);
    // Reference seeds come from the run seed, not from the GA's stream.
    let agents = StandardAgents::new(config.seed.unwrap_or_default().rotate_left(32));
    let settings = config.match_settings.clone();

    let strategy: Box<dyn FitnessStrategy> = match mode {
        FitnessMode::Tournament => Box::new(TournamentFitness::new(book, agents, settings)),
        FitnessMode::Acpl => {
            let oracle: Arc<dyn PositionOracle> =
                Arc::new(SharedEngine::new(EngineProcess::spawn(&config.engine)?));
            Box::new(AcplFitness::new(book, agents, settings, oracle))
        }
    };
    Ok(strategy)
}
