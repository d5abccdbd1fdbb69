// src/optimizer.rs

use std::collections::HashSet;

use rand::rngs::StdRng;

use crate::config::OptimizerConfig;
use crate::error::{Result, TunerError};
use crate::fitness::{FitnessStrategy, Ranking};
use crate::ga::{self, Individual};
use crate::report::{self, AuditTrail};
use crate::worker::EvaluationPool;

/// Drives the generational loop and persists its results.
pub struct Optimizer {
    config: OptimizerConfig,
    strategy: Box<dyn FitnessStrategy>,
    pool: EvaluationPool,
    rng: StdRng,
    audit: Option<AuditTrail>,
    next_id: usize,
}

impl Optimizer {
    pub fn new(config: OptimizerConfig, strategy: Box<dyn FitnessStrategy>, rng: StdRng) -> Self {
        let pool = EvaluationPool::new(config.max_concurrent_evaluations);
        let audit = match (&config.audit_trail, strategy.ranking()) {
            (Some(path), Ranking::LowerAcpl) => Some(AuditTrail::new(path.clone())),
            _ => None,
        };
        Self {
            config,
            strategy,
            pool,
            rng,
            audit,
            next_id: 0,
        }
    }

    /// Runs every generation and returns the best individual found.
    pub fn run(&mut self) -> Result<Individual> {
        let size = self.config.population_size;
        let ranking = self.strategy.ranking();
        let policy = self.config.mutation_policy();

        tracing::info!(
            "Starting {} optimization: population={}, generations={}, workers={}",
            self.strategy.name(),
            size,
            self.config.generations,
            self.pool.workers()
        );

        let mut population = ga::initial_population(size, &mut self.rng);
        self.next_id = size;

        for generation in 0..self.config.generations {
            population = self.evaluate(generation, population)?;

            let survivors = ga::select(&population, ranking);
            let offspring: Vec<Individual> = ga::breed(
                &survivors,
                size.saturating_sub(survivors.len()),
                &mut self.next_id,
                &mut self.rng,
            )
            .into_iter()
            .map(|mut child| {
                child.genome = ga::mutate(&child.genome, &policy, &mut self.rng);
                child
            })
            .collect();
            let offspring = self.evaluate(generation, offspring)?;

            population = ga::replace(population, offspring, size, ranking);
            log_generation(generation, &population);
        }

        // With zero generations nothing has been scored yet.
        let population = self.evaluate(self.config.generations, population)?;
        self.finalize(&population)
    }

    /// Scores `count` freshly sampled genomes once and keeps the ranking.
    pub fn sample(&mut self, count: usize) -> Result<Individual> {
        tracing::info!(
            "Sampling {count} genomes with the {} strategy",
            self.strategy.name()
        );
        let population = ga::initial_population(count, &mut self.rng);
        self.next_id = count;
        let ranked = self.evaluate(0, population)?;
        log_generation(0, &ranked);
        self.finalize(&ranked)
    }

    fn evaluate(&self, generation: u32, individuals: Vec<Individual>) -> Result<Vec<Individual>> {
        let fresh: HashSet<usize> = individuals
            .iter()
            .filter(|ind| !ind.is_scored())
            .map(|ind| ind.id)
            .collect();
        let ranked = self.pool.evaluate(individuals, self.strategy.as_ref())?;

        if let Some(audit) = &self.audit {
            for individual in ranked.iter().filter(|ind| fresh.contains(&ind.id)) {
                audit.append(generation, individual)?;
            }
        }
        Ok(ranked)
    }

    fn finalize(&self, ranked: &[Individual]) -> Result<Individual> {
        let best = ranked
            .first()
            .cloned()
            .ok_or_else(|| TunerError::Configuration("population is empty".to_string()))?;

        report::write_best_genome(&self.config.output_dir, &best.genome)?;
        report::write_leaderboard(&self.config.output_dir, ranked, self.config.leaderboard_size)?;
        tracing::info!("Best individual {}: {:?}", best.id, best.fitness);
        Ok(best)
    }
}

fn log_generation(generation: u32, ranked: &[Individual]) {
    let headlines: Vec<f64> = ranked
        .iter()
        .filter_map(|ind| ind.fitness.as_ref().and_then(|f| f.headline()))
        .collect();
    let best = ranked
        .first()
        .and_then(|ind| ind.fitness.as_ref())
        .and_then(|f| f.headline());
    let mean = if headlines.is_empty() {
        None
    } else {
        Some(headlines.iter().sum::<f64>() / headlines.len() as f64)
    };

    let drifted = ranked
        .iter()
        .filter(|ind| !ind.genome.in_sampling_range())
        .count();
    if drifted > 0 {
        tracing::debug!("{drifted} genomes have drifted outside the sampling range");
    }

    match (best, mean) {
        (Some(best), Some(mean)) => {
            tracing::info!("Generation {}: best={:.3}, mean={:.3}", generation + 1, best, mean)
        }
        _ => tracing::info!("Generation {}: no measurable fitness", generation + 1),
    }
}
