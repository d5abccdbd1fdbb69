// src/report.rs

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::constants::{BEST_GENOME_FILE, LEADERBOARD_FILE};
use crate::error::Result;
use crate::fitness::Fitness;
use crate::ga::Individual;
use crate::genome::{Genome, GENE_NAMES};

const FITNESS_COLUMNS: [&str; 6] = ["wins", "losses", "draws", "timeouts", "illegal_moves", "acpl"];

/// Fitness columns of one row. Columns that do not apply to the fitness
/// mode, and an ACPL with no measured moves, are left empty.
fn fitness_fields(fitness: Option<&Fitness>) -> [String; 6] {
    match fitness {
        Some(Fitness::Tournament(t)) => [
            t.wins.to_string(),
            t.losses.to_string(),
            t.draws.to_string(),
            t.timeouts.to_string(),
            t.illegal_moves.to_string(),
            String::new(),
        ],
        Some(Fitness::Acpl(score)) => {
            let mut fields: [String; 6] = Default::default();
            fields[5] = score.average().map(|avg| format!("{avg:.4}")).unwrap_or_default();
            fields
        }
        None => Default::default(),
    }
}

pub fn leaderboard_csv(ranked: &[Individual], size: usize) -> String {
    let mut content = GENE_NAMES
        .iter()
        .chain(FITNESS_COLUMNS.iter())
        .copied()
        .collect::<Vec<_>>()
        .join(",");
    content.push('\n');

    for individual in ranked.iter().take(size) {
        let mut fields = individual.genome.csv_fields();
        fields.extend(fitness_fields(individual.fitness.as_ref()));
        content.push_str(&fields.join(","));
        content.push('\n');
    }
    content
}

pub fn write_leaderboard(dir: &Path, ranked: &[Individual], size: usize) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(LEADERBOARD_FILE);
    fs::write(&path, leaderboard_csv(ranked, size))?;
    tracing::info!("Saved leaderboard to {}", path.display());
    Ok(path)
}

pub fn write_best_genome(dir: &Path, genome: &Genome) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(BEST_GENOME_FILE);
    let json = serde_json::to_string_pretty(genome)?;
    fs::write(&path, json)?;
    tracing::info!("Saved best genome to {}", path.display());
    Ok(path)
}

/// Append-only CSV log of every individual scored in ACPL mode.
pub struct AuditTrail {
    path: PathBuf,
}

impl AuditTrail {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append(&self, generation: u32, individual: &Individual) -> Result<()> {
        let Some(Fitness::Acpl(score)) = individual.fitness else {
            return Ok(());
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        if file.metadata()?.len() == 0 {
            writeln!(
                file,
                "generation,id,{},total_loss,moves,acpl",
                GENE_NAMES.join(",")
            )?;
        }

        let acpl = score.average().map(|avg| format!("{avg:.4}")).unwrap_or_default();
        writeln!(
            file,
            "{generation},{},{},{},{},{acpl}",
            individual.id,
            individual.genome.csv_fields().join(","),
            score.total_loss,
            score.moves
        )?;
        Ok(())
    }
}

/// Writes `fen,score` rows.
pub fn write_annotations(path: &Path, rows: &[(String, i32)]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut content = String::from("fen,score\n");
    for (fen, score) in rows {
        content.push_str(&format!("{fen},{score}\n"));
    }
    fs::write(path, content)?;
    tracing::info!("Saved {} annotated positions to {}", rows.len(), path.display());
    Ok(())
}
