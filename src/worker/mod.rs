use std::sync::{Mutex, PoisonError};

use crate::error::{Result, TunerError};
use crate::fitness::{FitnessStrategy, Ranking};
use crate::ga::Individual;

/// Best-first collection shared by the workers. Each insertion keeps the
/// order, so the lock is held only for one binary search and one insert.
struct RankedResults {
    ranking: Ranking,
    items: Mutex<Vec<Individual>>,
}

impl RankedResults {
    fn new(ranking: Ranking, capacity: usize) -> Self {
        Self {
            ranking,
            items: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    fn insert(&self, individual: Individual) {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        let at = items.partition_point(|existing| {
            self.ranking.compare(
                existing.fitness.as_ref(),
                existing.id,
                individual.fitness.as_ref(),
                individual.id,
            ) == std::cmp::Ordering::Less
        });
        items.insert(at, individual);
    }

    fn into_vec(self) -> Vec<Individual> {
        self.items.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Scores individuals on a bounded number of scoped worker threads.
pub struct EvaluationPool {
    workers: usize,
}

impl EvaluationPool {
    /// At most `max_workers` threads, and never more than there are CPUs.
    pub fn new(max_workers: usize) -> Self {
        let workers = max_workers.min(num_cpus::get()).max(1);
        Self { workers }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Scores every unscored individual and returns the whole set ranked best
    /// first. Individuals that already carry a fitness are not evaluated
    /// again. Nothing is returned unless every worker finished.
    pub fn evaluate(
        &self,
        individuals: Vec<Individual>,
        strategy: &dyn FitnessStrategy,
    ) -> Result<Vec<Individual>> {
        let results = RankedResults::new(strategy.ranking(), individuals.len());
        let (pending, scored): (Vec<_>, Vec<_>) =
            individuals.into_iter().partition(|ind| !ind.is_scored());
        for individual in scored {
            results.insert(individual);
        }
        if pending.is_empty() {
            return Ok(results.into_vec());
        }

        let workers = self.workers.min(pending.len());
        tracing::debug!(
            "Evaluating {} individuals with {} workers ({} strategy)",
            pending.len(),
            workers,
            strategy.name()
        );

        let (job_tx, job_rx) = crossbeam_channel::unbounded::<Individual>();
        for individual in pending {
            // `job_rx` is alive for the whole function, so this cannot fail.
            let _ = job_tx.send(individual);
        }
        drop(job_tx);

        crossbeam_utils::thread::scope(|s| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let results = &results;
                s.spawn(move |_| {
                    for mut individual in job_rx.iter() {
                        let fitness = strategy.evaluate(&individual.genome);
                        tracing::debug!("Individual {} scored {:?}", individual.id, fitness);
                        individual.fitness = Some(fitness);
                        results.insert(individual);
                    }
                });
            }
        })
        .map_err(|_| TunerError::WorkerPanicked)?;

        Ok(results.into_vec())
    }
}
