// src/fitness/acpl.rs

use std::sync::Arc;

use super::{AcplScore, Fitness, FitnessStrategy, Ranking};
use crate::engine::PositionOracle;
use crate::game::agents::AgentFactory;
use crate::game::book::OpeningBook;
use crate::game::clock::MatchSettings;
use crate::game::simulator::play_game;
use crate::game::{Color, Rules};
use crate::genome::Genome;

/// Average centipawn loss of the candidate's moves, as judged by the
/// reference engine.
pub struct AcplFitness<R: Rules, A: AgentFactory<R>> {
    book: Arc<OpeningBook<R>>,
    agents: A,
    settings: MatchSettings,
    oracle: Arc<dyn PositionOracle>,
}

impl<R: Rules, A: AgentFactory<R>> AcplFitness<R, A> {
    pub fn new(
        book: Arc<OpeningBook<R>>,
        agents: A,
        settings: MatchSettings,
        oracle: Arc<dyn PositionOracle>,
    ) -> Self {
        Self {
            book,
            agents,
            settings,
            oracle,
        }
    }
}

impl<R: Rules, A: AgentFactory<R>> FitnessStrategy for AcplFitness<R, A> {
    fn evaluate(&self, genome: &Genome) -> Fitness {
        let mut score = AcplScore::default();

        for (opening, start) in self.book.positions().iter().enumerate() {
            for (side, color) in [Color::White, Color::Black].into_iter().enumerate() {
                let game_index = (opening * 2 + side) as u64;
                let mut candidate = self.agents.candidate(genome);
                let mut reference = self.agents.reference(game_index);

                let mut previous = 0i32;
                let mut observe = |position: &R| {
                    let current = self.oracle.score(&position.fen());
                    score.record(u64::from(current.abs_diff(previous)));
                    previous = current;
                };

                play_game(
                    start.clone(),
                    color,
                    candidate.as_mut(),
                    reference.as_mut(),
                    &self.settings,
                    &mut observe,
                );
            }
        }

        Fitness::Acpl(score)
    }

    fn ranking(&self) -> Ranking {
        Ranking::LowerAcpl
    }

    fn name(&self) -> &'static str {
        "acpl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::agents::FirstLegalAgents;
    use crate::game::ChessRules;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    const MATED: &str = "R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1";

    fn strategy(fens: &[&str], oracle: Arc<dyn PositionOracle>) -> AcplFitness<ChessRules, FirstLegalAgents> {
        let book = Arc::new(OpeningBook::from_fens(fens.iter().copied()).unwrap());
        AcplFitness::new(book, FirstLegalAgents, MatchSettings::default(), oracle)
    }

    fn genome() -> Genome {
        Genome::random(&mut StdRng::seed_from_u64(8))
    }

    #[test]
    fn test_constant_oracle_loses_only_on_first_move_of_each_game() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let oracle: Arc<dyn PositionOracle> = Arc::new(move |_fen: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            50
        });

        let Fitness::Acpl(score) = strategy(&[START], oracle).evaluate(&genome()) else {
            panic!("acpl strategy must produce an acpl score");
        };
        // Previous score starts at zero in each of the two games.
        assert_eq!(score.total_loss, 100);
        assert_eq!(score.moves as usize, calls.load(Ordering::SeqCst));
        assert!(score.moves >= 2);
    }

    #[test]
    fn test_queries_see_positions_after_candidate_moves() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let oracle: Arc<dyn PositionOracle> = Arc::new(move |fen: &str| {
            sink.lock().unwrap().push(fen.to_string());
            0
        });

        strategy(&[START], oracle).evaluate(&genome());
        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty());
        assert!(!seen.iter().any(|fen| fen == START));
    }

    #[test]
    fn test_no_candidate_moves_means_no_average() {
        let oracle: Arc<dyn PositionOracle> = Arc::new(|_fen: &str| 0);
        let s = strategy(&[MATED], oracle);
        let fitness = s.evaluate(&genome());
        let Fitness::Acpl(score) = fitness else {
            panic!("acpl strategy must produce an acpl score");
        };
        assert_eq!(score.moves, 0);
        assert_eq!(score.average(), None);
        assert_eq!(s.ranking(), Ranking::LowerAcpl);
        assert_eq!(s.ranking().desirability(Some(&fitness)), f64::NEG_INFINITY);
    }
}
