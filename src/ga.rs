use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{INT_GENE_MAX, INT_GENE_MIN, REAL_GENE_MAX, REAL_GENE_MIN, SURVIVOR_FRACTION};
use crate::fitness::{Fitness, Ranking};
use crate::genome::Genome;

/// A single candidate in the population.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub id: usize,
    #[serde(flatten)]
    pub genome: Genome,
    pub fitness: Option<Fitness>,
}

impl Individual {
    pub fn new(id: usize, genome: Genome) -> Self {
        Self {
            id,
            genome,
            fitness: None,
        }
    }

    pub fn is_scored(&self) -> bool {
        self.fitness.is_some()
    }
}

/// Whether a real gene moves on every mutation pass or only when the same
/// draw that gates integer genes succeeds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RealGeneMutation {
    #[default]
    Always,
    Gated,
}

/// What happens when a mutated gene leaves its sampling range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneDrift {
    #[default]
    Unbounded,
    /// Integers are held in `[INT_GENE_MIN, INT_GENE_MAX - 1]`, reals in
    /// `[REAL_GENE_MIN, REAL_GENE_MAX]`.
    Clamp,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MutationPolicy {
    /// Probability of an integer step, and the size of a real step.
    pub rate: f64,
    pub real_genes: RealGeneMutation,
    pub drift: GeneDrift,
}

pub fn initial_population(size: usize, rng: &mut impl Rng) -> Vec<Individual> {
    (0..size)
        .map(|id| Individual::new(id, Genome::random(rng)))
        .collect()
}

/// Sorts best first. Unscored individuals sink to the bottom.
pub fn rank(individuals: &mut [Individual], ranking: Ranking) {
    individuals.sort_by(|a, b| ranking.compare(a.fitness.as_ref(), a.id, b.fitness.as_ref(), b.id));
}

/// `ceil(SURVIVOR_FRACTION × population_size)`, never less than one.
pub fn survivor_count(population_size: usize) -> usize {
    ((population_size as f64 * SURVIVOR_FRACTION).ceil() as usize).max(1)
}

pub fn select(population: &[Individual], ranking: Ranking) -> Vec<Individual> {
    let mut ranked = population.to_vec();
    rank(&mut ranked, ranking);
    ranked.truncate(survivor_count(population.len()));
    ranked
}

/// Uniform crossover: every gene comes from either parent with equal odds.
pub fn crossover(p1: &Genome, p2: &Genome, rng: &mut impl Rng) -> Genome {
    let (a_ints, b_ints) = (p1.int_genes(), p2.int_genes());
    let (a_reals, b_reals) = (p1.real_genes(), p2.real_genes());
    let ints = std::array::from_fn(|i| if rng.gen_bool(0.5) { a_ints[i] } else { b_ints[i] });
    let reals = std::array::from_fn(|i| if rng.gen_bool(0.5) { a_reals[i] } else { b_reals[i] });
    Genome::from_genes(ints, reals)
}

/// Produces `count` unscored children from parents drawn with replacement.
/// New ids continue from `next_id`.
pub fn breed(
    survivors: &[Individual],
    count: usize,
    next_id: &mut usize,
    rng: &mut impl Rng,
) -> Vec<Individual> {
    let mut offspring = Vec::with_capacity(count);
    for _ in 0..count {
        let (Some(p1), Some(p2)) = (survivors.choose(rng), survivors.choose(rng)) else {
            break;
        };
        let child = crossover(&p1.genome, &p2.genome, rng);
        offspring.push(Individual::new(*next_id, child));
        *next_id += 1;
    }
    offspring
}

pub fn mutate(genome: &Genome, policy: &MutationPolicy, rng: &mut impl Rng) -> Genome {
    let ints = genome.int_genes().map(|gene| {
        if !rng.gen_bool(policy.rate) {
            return gene;
        }
        let stepped = if rng.gen_bool(0.5) {
            gene.saturating_add(1)
        } else {
            gene.saturating_sub(1)
        };
        match policy.drift {
            GeneDrift::Unbounded => stepped,
            GeneDrift::Clamp => stepped.clamp(INT_GENE_MIN, INT_GENE_MAX - 1),
        }
    });

    let reals = genome.real_genes().map(|gene| {
        if policy.real_genes == RealGeneMutation::Gated && !rng.gen_bool(policy.rate) {
            return gene;
        }
        let stepped = if rng.gen_bool(0.5) {
            gene + policy.rate
        } else {
            gene - policy.rate
        };
        match policy.drift {
            GeneDrift::Unbounded => stepped,
            GeneDrift::Clamp => stepped.clamp(REAL_GENE_MIN, REAL_GENE_MAX),
        }
    });

    Genome::from_genes(ints, reals)
}

/// Elitist (μ+λ) replacement: the best `size` of parents and children.
pub fn replace(
    population: Vec<Individual>,
    offspring: Vec<Individual>,
    size: usize,
    ranking: Ranking,
) -> Vec<Individual> {
    let mut merged = population;
    merged.extend(offspring);
    rank(&mut merged, ranking);
    merged.truncate(size);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::{AcplScore, MatchTally};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scored(id: usize, wins: u32) -> Individual {
        let mut ind = Individual::new(id, Genome::random(&mut StdRng::seed_from_u64(id as u64)));
        ind.fitness = Some(Fitness::Tournament(MatchTally {
            wins,
            ..MatchTally::default()
        }));
        ind
    }

    fn fixed_genome(int: u32, real: f64) -> Genome {
        Genome::from_genes([int; 2], [real; 6])
    }

    fn policy(rate: f64, real_genes: RealGeneMutation, drift: GeneDrift) -> MutationPolicy {
        MutationPolicy {
            rate,
            real_genes,
            drift,
        }
    }

    #[test]
    fn test_survivor_count_rounds_up() {
        assert_eq!(survivor_count(10), 3);
        assert_eq!(survivor_count(7), 3);
        assert_eq!(survivor_count(4), 2);
        assert_eq!(survivor_count(3), 1);
        assert_eq!(survivor_count(1), 1);
    }

    #[test]
    fn test_initial_population_has_sequential_ids() {
        let population = initial_population(10, &mut StdRng::seed_from_u64(1));
        assert_eq!(population.len(), 10);
        assert!(population.iter().enumerate().all(|(i, ind)| ind.id == i && !ind.is_scored()));
    }

    #[test]
    fn test_select_keeps_the_best() {
        let population: Vec<_> = [4, 9, 1, 9, 0, 3, 7, 2, 5, 6]
            .into_iter()
            .enumerate()
            .map(|(id, wins)| scored(id, wins))
            .collect();
        let survivors = select(&population, Ranking::HigherScore);
        let ids: Vec<_> = survivors.iter().map(|ind| ind.id).collect();
        // Two individuals tie on 9 wins; the lower id ranks first.
        assert_eq!(ids, [1, 3, 6]);
    }

    #[test]
    fn test_select_by_acpl_prefers_lower_loss() {
        let population: Vec<_> = [(0, 500u64, 10u32), (1, 50, 10), (2, 0, 0)]
            .into_iter()
            .map(|(id, total_loss, moves)| {
                let mut ind = Individual::new(id, fixed_genome(1, 1.0));
                ind.fitness = Some(Fitness::Acpl(AcplScore { total_loss, moves }));
                ind
            })
            .collect();
        let mut ranked = population.clone();
        rank(&mut ranked, Ranking::LowerAcpl);
        let ids: Vec<_> = ranked.iter().map(|ind| ind.id).collect();
        assert_eq!(ids, [1, 0, 2]);
    }

    #[test]
    fn test_crossover_takes_every_gene_from_a_parent() {
        let a = fixed_genome(10, 0.25);
        let b = fixed_genome(20, 1.75);
        let mut rng = StdRng::seed_from_u64(3);
        let (mut from_a, mut from_b) = (0, 0);
        for _ in 0..200 {
            let child = crossover(&a, &b, &mut rng);
            for gene in child.int_genes() {
                assert!(gene == 10 || gene == 20);
            }
            for gene in child.real_genes() {
                assert!(gene == 0.25 || gene == 1.75);
                if gene == 0.25 {
                    from_a += 1;
                } else {
                    from_b += 1;
                }
            }
        }
        assert!(from_a > 400 && from_b > 400, "{from_a} vs {from_b}");
    }

    #[test]
    fn test_breed_produces_fresh_unscored_children() {
        let survivors = vec![scored(0, 5)];
        let mut next_id = 10;
        let children = breed(&survivors, 7, &mut next_id, &mut StdRng::seed_from_u64(4));
        assert_eq!(children.len(), 7);
        assert_eq!(next_id, 17);
        for (offset, child) in children.iter().enumerate() {
            assert_eq!(child.id, 10 + offset);
            assert!(!child.is_scored());
            // A single survivor is paired with itself.
            assert_eq!(child.genome, survivors[0].genome);
        }
    }

    #[test]
    fn test_breed_without_survivors_is_empty() {
        let mut next_id = 0;
        assert!(breed(&[], 3, &mut next_id, &mut StdRng::seed_from_u64(4)).is_empty());
        assert_eq!(next_id, 0);
    }

    #[test]
    fn test_zero_rate_never_changes_genes() {
        let genome = fixed_genome(50, 1.0);
        let mut rng = StdRng::seed_from_u64(5);
        for real_genes in [RealGeneMutation::Always, RealGeneMutation::Gated] {
            let p = policy(0.0, real_genes, GeneDrift::Unbounded);
            assert_eq!(mutate(&genome, &p, &mut rng), genome);
        }
    }

    #[test]
    fn test_steps_are_plus_or_minus_one_and_rate() {
        let genome = fixed_genome(50, 1.0);
        let p = policy(1.0, RealGeneMutation::Gated, GeneDrift::Unbounded);
        let mutated = mutate(&genome, &p, &mut StdRng::seed_from_u64(6));
        for gene in mutated.int_genes() {
            assert!(gene == 49 || gene == 51);
        }
        for gene in mutated.real_genes() {
            assert!(gene == 0.0 || gene == 2.0);
        }
    }

    #[test]
    fn test_always_mode_moves_real_genes_at_low_rate() {
        let genome = fixed_genome(50, 1.0);
        let p = policy(0.05, RealGeneMutation::Always, GeneDrift::Unbounded);
        let mutated = mutate(&genome, &p, &mut StdRng::seed_from_u64(7));
        for gene in mutated.real_genes() {
            assert!((gene - 1.0).abs() > 0.049 && (gene - 1.0).abs() < 0.051);
        }
    }

    #[test]
    fn test_integer_genes_never_go_below_zero() {
        let genome = fixed_genome(0, 0.0);
        let p = policy(1.0, RealGeneMutation::Always, GeneDrift::Unbounded);
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..100 {
            for gene in mutate(&genome, &p, &mut rng).int_genes() {
                assert!(gene <= 1);
            }
        }
    }

    #[test]
    fn test_unbounded_drift_can_leave_range() {
        let genome = fixed_genome(INT_GENE_MAX - 1, 1.9);
        let p = policy(0.5, RealGeneMutation::Always, GeneDrift::Unbounded);
        let mut rng = StdRng::seed_from_u64(9);
        let escaped = (0..100).any(|_| !mutate(&genome, &p, &mut rng).in_sampling_range());
        assert!(escaped);
    }

    #[test]
    fn test_clamp_drift_stays_in_range() {
        let genome = fixed_genome(INT_GENE_MAX - 1, 1.9);
        let p = policy(1.0, RealGeneMutation::Always, GeneDrift::Clamp);
        let mut rng = StdRng::seed_from_u64(10);
        for _ in 0..100 {
            let mutated = mutate(&genome, &p, &mut rng);
            assert!(mutated.int_genes().iter().all(|g| *g < INT_GENE_MAX));
            assert!(mutated
                .real_genes()
                .iter()
                .all(|g| (REAL_GENE_MIN..=REAL_GENE_MAX).contains(g)));
        }
    }

    #[test]
    fn test_replace_is_elitist() {
        let population: Vec<_> = (0..4).map(|id| scored(id, id as u32)).collect();
        let offspring = vec![scored(4, 10), scored(5, 0)];
        let next = replace(population, offspring, 4, Ranking::HigherScore);
        let ids: Vec<_> = next.iter().map(|ind| ind.id).collect();
        assert_eq!(ids, [4, 3, 2, 1]);
    }

    #[test]
    fn test_replace_keeps_parents_over_worse_children() {
        let population: Vec<_> = (0..3).map(|id| scored(id, 5)).collect();
        let offspring = vec![scored(3, 1), scored(4, 2)];
        let next = replace(population, offspring, 3, Ranking::HigherScore);
        assert!(next.iter().all(|ind| ind.id < 3));
    }

    #[test]
    fn test_individual_json_flattens_genes() {
        let ind = scored(2, 3);
        let json = serde_json::to_value(&ind).unwrap();
        assert!(json.get("num_opening_moves").is_some());
        assert_eq!(json["fitness"]["mode"], "tournament");
        let back: Individual = serde_json::from_value(json).unwrap();
        assert_eq!(back, ind);
    }
}
