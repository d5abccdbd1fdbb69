// src/fitness/mod.rs

pub mod acpl;
pub mod tournament;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::game::simulator::GameOutcome;
use crate::genome::Genome;

pub use acpl::AcplFitness;
pub use tournament::TournamentFitness;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTally {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub timeouts: u32,
    pub illegal_moves: u32,
}

impl MatchTally {
    pub fn record(&mut self, outcome: GameOutcome) {
        match outcome {
            GameOutcome::Win => self.wins += 1,
            GameOutcome::Loss => self.losses += 1,
            GameOutcome::Draw => self.draws += 1,
            GameOutcome::Timeout => self.timeouts += 1,
            GameOutcome::IllegalMove => self.illegal_moves += 1,
        }
    }

    /// Tournament score: 10 per win, 5 per draw.
    pub fn score(&self) -> u32 {
        10 * self.wins + 5 * self.draws
    }

    pub fn games(&self) -> u32 {
        self.wins + self.losses + self.draws + self.timeouts + self.illegal_moves
    }
}

/// Accumulated centipawn loss over the candidate's moves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcplScore {
    pub total_loss: u64,
    pub moves: u32,
}

impl AcplScore {
    pub fn record(&mut self, loss: u64) {
        self.total_loss += loss;
        self.moves += 1;
    }

    /// `None` when no move was measured. Ranked as the worst possible score.
    pub fn average(&self) -> Option<f64> {
        (self.moves > 0).then(|| self.total_loss as f64 / f64::from(self.moves))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Fitness {
    Tournament(MatchTally),
    Acpl(AcplScore),
}

impl Fitness {
    /// The number a person reads: tournament score or average loss.
    pub fn headline(&self) -> Option<f64> {
        match self {
            Fitness::Tournament(tally) => Some(f64::from(tally.score())),
            Fitness::Acpl(score) => score.average(),
        }
    }
}

/// Which direction counts as better. Owned by the strategy that produced
/// the scores.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ranking {
    /// Higher `10×wins + 5×draws` first.
    HigherScore,
    /// Lower average centipawn loss first.
    LowerAcpl,
}

impl Ranking {
    /// A single number where larger is always better. Unscored and
    /// mismatched fitness values rank last.
    pub fn desirability(&self, fitness: Option<&Fitness>) -> f64 {
        match (self, fitness) {
            (Ranking::HigherScore, Some(Fitness::Tournament(tally))) => f64::from(tally.score()),
            (Ranking::LowerAcpl, Some(Fitness::Acpl(score))) => {
                score.average().map_or(f64::NEG_INFINITY, |avg| -avg)
            }
            _ => f64::NEG_INFINITY,
        }
    }

    /// Orders best first. Equal fitness falls back to `a_id`/`b_id` so the
    /// order never depends on evaluation timing.
    pub fn compare(
        &self,
        a: Option<&Fitness>,
        a_id: usize,
        b: Option<&Fitness>,
        b_id: usize,
    ) -> Ordering {
        self.desirability(b)
            .total_cmp(&self.desirability(a))
            .then(a_id.cmp(&b_id))
    }
}

/// Scores one genome. Implementations are shared by all evaluation workers.
pub trait FitnessStrategy: Send + Sync {
    fn evaluate(&self, genome: &Genome) -> Fitness;
    fn ranking(&self) -> Ranking;
    fn name(&self) -> &'static str;
}
