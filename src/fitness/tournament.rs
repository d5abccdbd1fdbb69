// src/fitness/tournament.rs

use std::sync::Arc;

use super::{Fitness, FitnessStrategy, MatchTally, Ranking};
use crate::game::agents::AgentFactory;
use crate::game::book::OpeningBook;
use crate::game::clock::MatchSettings;
use crate::game::simulator::play_game;
use crate::game::{Color, Rules};
use crate::genome::Genome;

/// Plays every opening twice per genome, once with each color, against the
/// reference agent and tallies the results.
pub struct TournamentFitness<R: Rules, A: AgentFactory<R>> {
    book: Arc<OpeningBook<R>>,
    agents: A,
    settings: MatchSettings,
}

impl<R: Rules, A: AgentFactory<R>> TournamentFitness<R, A> {
    pub fn new(book: Arc<OpeningBook<R>>, agents: A, settings: MatchSettings) -> Self {
        Self {
            book,
            agents,
            settings,
        }
    }
}

impl<R: Rules, A: AgentFactory<R>> FitnessStrategy for TournamentFitness<R, A> {
    fn evaluate(&self, genome: &Genome) -> Fitness {
        let mut tally = MatchTally::default();

        for (opening, start) in self.book.positions().iter().enumerate() {
            for (side, color) in [Color::White, Color::Black].into_iter().enumerate() {
                let game_index = (opening * 2 + side) as u64;
                let mut candidate = self.agents.candidate(genome);
                let mut reference = self.agents.reference(game_index);
                let record = play_game(
                    start.clone(),
                    color,
                    candidate.as_mut(),
                    reference.as_mut(),
                    &self.settings,
                    &mut |_| {},
                );
                tracing::debug!(
                    "opening {opening} as {color:?}: {:?} after {} plies",
                    record.end,
                    record.plies
                );
                tally.record(record.outcome);
            }
        }

        tracing::debug!("Tournament score {} over {} games", tally.score(), tally.games());
        Fitness::Tournament(tally)
    }

    fn ranking(&self) -> Ranking {
        Ranking::HigherScore
    }

    fn name(&self) -> &'static str {
        "tournament"
    }
}
