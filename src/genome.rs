// src/genome.rs

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{INT_GENE_MAX, INT_GENE_MIN, REAL_GENE_MAX, REAL_GENE_MIN};

/// The tunable parameters of the candidate agent.
///
/// The two integer genes are move-count thresholds, the six real genes are
/// penalty/bonus weights expressed in units of `HEURISTIC_UNIT_CP`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub num_opening_moves: u32,
    pub num_moves_repeated_piece_movement: u32,
    pub early_queen_moves_penalty: f64,
    pub early_overextending_penalty: f64,
    pub early_knight_bishop_development_bonus: f64,
    pub repeated_piece_move_penalty: f64,
    pub knight_on_edge_penalty: f64,
    pub repeated_position_penalty: f64,
}

/// Column names in gene order, used for tabular output.
pub const GENE_NAMES: [&str; 8] = [
    "num_opening_moves",
    "num_moves_repeated_piece_movement",
    "early_queen_moves_penalty",
    "early_overextending_penalty",
    "early_knight_bishop_development_bonus",
    "repeated_piece_move_penalty",
    "knight_on_edge_penalty",
    "repeated_position_penalty",
];

impl Genome {
    /// Samples every gene uniformly from its range, lower bound inclusive and
    /// upper bound exclusive.
    pub fn random(rng: &mut impl Rng) -> Self {
        let mut real = || rng.gen_range(REAL_GENE_MIN..REAL_GENE_MAX);
        let early_queen_moves_penalty = real();
        let early_overextending_penalty = real();
        let early_knight_bishop_development_bonus = real();
        let repeated_piece_move_penalty = real();
        let knight_on_edge_penalty = real();
        let repeated_position_penalty = real();

        Self {
            num_opening_moves: rng.gen_range(INT_GENE_MIN..INT_GENE_MAX),
            num_moves_repeated_piece_movement: rng.gen_range(INT_GENE_MIN..INT_GENE_MAX),
            early_queen_moves_penalty,
            early_overextending_penalty,
            early_knight_bishop_development_bonus,
            repeated_piece_move_penalty,
            knight_on_edge_penalty,
            repeated_position_penalty,
        }
    }

    /// Rebuilds a genome from its genes in `GENE_NAMES` order.
    pub fn from_genes(ints: [u32; 2], reals: [f64; 6]) -> Self {
        let [num_opening_moves, num_moves_repeated_piece_movement] = ints;
        let [
            early_queen_moves_penalty,
            early_overextending_penalty,
            early_knight_bishop_development_bonus,
            repeated_piece_move_penalty,
            knight_on_edge_penalty,
            repeated_position_penalty,
        ] = reals;
        Self {
            num_opening_moves,
            num_moves_repeated_piece_movement,
            early_queen_moves_penalty,
            early_overextending_penalty,
            early_knight_bishop_development_bonus,
            repeated_piece_move_penalty,
            knight_on_edge_penalty,
            repeated_position_penalty,
        }
    }

    pub fn int_genes(&self) -> [u32; 2] {
        [self.num_opening_moves, self.num_moves_repeated_piece_movement]
    }

    pub fn real_genes(&self) -> [f64; 6] {
        [
            self.early_queen_moves_penalty,
            self.early_overextending_penalty,
            self.early_knight_bishop_development_bonus,
            self.repeated_piece_move_penalty,
            self.knight_on_edge_penalty,
            self.repeated_position_penalty,
        ]
    }

    /// Genes in `GENE_NAMES` order, formatted for CSV output.
    pub fn csv_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = self.int_genes().iter().map(|g| g.to_string()).collect();
        fields.extend(self.real_genes().iter().map(|g| g.to_string()));
        fields
    }

    pub fn in_sampling_range(&self) -> bool {
        self.int_genes()
            .iter()
            .all(|g| (INT_GENE_MIN..INT_GENE_MAX).contains(g))
            && self
                .real_genes()
                .iter()
                .all(|g| (REAL_GENE_MIN..REAL_GENE_MAX).contains(g))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_genomes_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..5_000 {
            let genome = Genome::random(&mut rng);
            assert!(genome.in_sampling_range(), "{genome:?}");
        }
    }

    #[test]
    fn test_range_bounds_are_half_open() {
        let mut genome = Genome::random(&mut StdRng::seed_from_u64(1));
        genome.num_opening_moves = INT_GENE_MIN;
        genome.early_queen_moves_penalty = REAL_GENE_MIN;
        assert!(genome.in_sampling_range());

        genome.num_opening_moves = INT_GENE_MAX;
        assert!(!genome.in_sampling_range());

        genome.num_opening_moves = INT_GENE_MAX - 1;
        genome.early_queen_moves_penalty = REAL_GENE_MAX;
        assert!(!genome.in_sampling_range());
    }

    #[test]
    fn test_same_seed_same_genome() {
        let a = Genome::random(&mut StdRng::seed_from_u64(42));
        let b = Genome::random(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_csv_fields_follow_gene_names() {
        let genome = Genome::random(&mut StdRng::seed_from_u64(3));
        let fields = genome.csv_fields();
        assert_eq!(fields.len(), GENE_NAMES.len());
        assert_eq!(fields[0], genome.num_opening_moves.to_string());
        assert_eq!(fields[7], genome.repeated_position_penalty.to_string());
    }

    #[test]
    fn test_from_genes_inverts_accessors() {
        let genome = Genome::random(&mut StdRng::seed_from_u64(9));
        assert_eq!(Genome::from_genes(genome.int_genes(), genome.real_genes()), genome);
    }

    #[test]
    fn test_json_is_field_per_gene() {
        let genome = Genome::random(&mut StdRng::seed_from_u64(5));
        let json = serde_json::to_value(&genome).unwrap();
        for name in GENE_NAMES {
            assert!(json.get(name).is_some(), "missing {name}");
        }
    }
}
