// src/config.rs

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    CONFIG_SNAPSHOT_FILE, GENERATIONS, LEADERBOARD_SIZE, MAX_CONCURRENT_EVALUATIONS,
    MUTATION_RATE, OPENING_BOOK_PATH, OUTPUT_DIR, POPULATION_SIZE,
};
use crate::engine::EngineSettings;
use crate::error::{Result, TunerError};
use crate::ga::{GeneDrift, MutationPolicy, RealGeneMutation};
use crate::game::clock::MatchSettings;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FitnessMode {
    /// Win/draw tally against the reference agent.
    #[default]
    Tournament,
    /// Average centipawn loss judged by the reference engine.
    Acpl,
}

/// Everything a run needs. Missing fields in a profile fall back to the
/// defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub population_size: usize,
    pub generations: u32,
    pub mutation_rate: f64,
    pub real_gene_mutation: RealGeneMutation,
    pub gene_drift: GeneDrift,
    pub max_concurrent_evaluations: usize,
    pub fitness_mode: FitnessMode,
    /// `None` seeds from entropy.
    pub seed: Option<u64>,
    pub leaderboard_size: usize,
    pub output_dir: PathBuf,
    pub opening_book: PathBuf,
    pub match_settings: MatchSettings,
    pub engine: EngineSettings,
    /// ACPL runs append one row per scored individual here when set.
    pub audit_trail: Option<PathBuf>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            population_size: POPULATION_SIZE,
            generations: GENERATIONS,
            mutation_rate: MUTATION_RATE,
            real_gene_mutation: RealGeneMutation::default(),
            gene_drift: GeneDrift::default(),
            max_concurrent_evaluations: MAX_CONCURRENT_EVALUATIONS,
            fitness_mode: FitnessMode::default(),
            seed: None,
            leaderboard_size: LEADERBOARD_SIZE,
            output_dir: PathBuf::from(OUTPUT_DIR),
            opening_book: PathBuf::from(OPENING_BOOK_PATH),
            match_settings: MatchSettings::default(),
            engine: EngineSettings::default(),
            audit_trail: None,
        }
    }
}

impl OptimizerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Writes the effective configuration next to the run's results.
    pub fn save_snapshot(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(CONFIG_SNAPSHOT_FILE);
        self.save(&path)?;
        Ok(path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(TunerError::Configuration(
                "population_size must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(TunerError::Configuration(format!(
                "mutation_rate must be within [0, 1], got {}",
                self.mutation_rate
            )));
        }
        if self.max_concurrent_evaluations == 0 {
            return Err(TunerError::Configuration(
                "max_concurrent_evaluations must be at least 1".to_string(),
            ));
        }
        if self.match_settings.game_duration_ms == 0 {
            return Err(TunerError::Configuration(
                "game_duration_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn mutation_policy(&self) -> MutationPolicy {
        MutationPolicy {
            rate: self.mutation_rate,
            real_genes: self.real_gene_mutation,
            drift: self.gene_drift,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_profile() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profile.json");
        let config = OptimizerConfig {
            population_size: 24,
            fitness_mode: FitnessMode::Acpl,
            seed: Some(99),
            gene_drift: GeneDrift::Clamp,
            ..OptimizerConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(OptimizerConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_profile_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{ "generations": 3, "fitness_mode": "acpl" }"#).unwrap();
        let config = OptimizerConfig::load(&path).unwrap();
        assert_eq!(config.generations, 3);
        assert_eq!(config.fitness_mode, FitnessMode::Acpl);
        assert_eq!(config.population_size, POPULATION_SIZE);
        assert_eq!(config.engine, EngineSettings::default());
        assert_eq!(config.real_gene_mutation, RealGeneMutation::Always);
        assert_eq!(config.gene_drift, GeneDrift::Unbounded);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let bad_rate = OptimizerConfig {
            mutation_rate: 1.5,
            ..OptimizerConfig::default()
        };
        assert!(matches!(bad_rate.validate(), Err(TunerError::Configuration(_))));

        let empty = OptimizerConfig {
            population_size: 0,
            ..OptimizerConfig::default()
        };
        assert!(matches!(empty.validate(), Err(TunerError::Configuration(_))));
        assert!(OptimizerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_unreadable_profile_is_an_error() {
        let dir = tempdir().unwrap();
        let err = OptimizerConfig::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, TunerError::Io(_)));

        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(OptimizerConfig::load(&path), Err(TunerError::Serde(_))));
    }

    #[test]
    fn test_snapshot_lands_in_output_dir() {
        let dir = tempdir().unwrap();
        let config = OptimizerConfig {
            output_dir: dir.path().join("run"),
            ..OptimizerConfig::default()
        };
        let path = config.save_snapshot().unwrap();
        assert_eq!(path, dir.path().join("run").join(CONFIG_SNAPSHOT_FILE));
        assert!(path.exists());
    }
}
