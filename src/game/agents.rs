// src/game/agents.rs

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use shakmaty::{Chess, Color, File, Move, Position, Rank, Role};

use super::clock::Timer;
use super::{material_balance, ChessRules, Rules};
use crate::constants::HEURISTIC_UNIT_CP;
use crate::genome::Genome;

/// An agent that picks a move for the side to move. `None` means the agent
/// could not produce a move and forfeits.
pub trait MoveChooser<R: Rules>: Send {
    fn choose_move(&mut self, position: &R, timer: &Timer) -> Option<R::Move>;
}

/// Builds the two agents of every evaluation game.
pub trait AgentFactory<R: Rules>: Send + Sync {
    fn candidate(&self, genome: &Genome) -> Box<dyn MoveChooser<R>>;
    /// `game_index` identifies the game within one evaluation so that every
    /// genome faces the same reference behavior in the same game.
    fn reference(&self, game_index: u64) -> Box<dyn MoveChooser<R>>;
}

/// Always plays the first legal move. Fully deterministic.
#[cfg(test)]
pub struct FirstLegalMove;

#[cfg(test)]
impl<R: Rules> MoveChooser<R> for FirstLegalMove {
    fn choose_move(&mut self, position: &R, _timer: &Timer) -> Option<R::Move> {
        position.legal_moves().into_iter().next()
    }
}

/// Plays a uniformly random legal move.
pub struct RandomMover {
    rng: StdRng,
}

impl RandomMover {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rules> MoveChooser<R> for RandomMover {
    fn choose_move(&mut self, position: &R, _timer: &Timer) -> Option<R::Move> {
        position.legal_moves().choose(&mut self.rng).cloned()
    }
}

/// Two-ply material search with genome-weighted opening and repetition
/// heuristics.
pub struct GenomeBot {
    genome: Genome,
}

impl GenomeBot {
    pub fn new(genome: Genome) -> Self {
        Self { genome }
    }

    fn heuristic(&self, rules: &ChessRules, m: &Move, next: &Chess) -> i32 {
        let pos = rules.chess();
        let us = pos.turn();
        let g = &self.genome;
        let mut units = 0.0;

        let in_opening = pos.fullmoves().get() <= g.num_opening_moves;
        if in_opening {
            match m.role() {
                Role::Queen => units -= g.early_queen_moves_penalty,
                Role::Knight | Role::Bishop if m.from().map(|sq| sq.rank()) == Some(back_rank(us)) => {
                    units += g.early_knight_bishop_development_bonus;
                }
                Role::Pawn if is_overextended(m.to().rank(), us) => {
                    units -= g.early_overextending_penalty;
                }
                _ => {}
            }
        }

        if m.role() == Role::Knight && matches!(m.to().file(), File::A | File::H) {
            units -= g.knight_on_edge_penalty;
        }

        // Our own recent moves sit at every other entry, counting back from
        // the opponent's last move.
        let window = g.num_moves_repeated_piece_movement as usize;
        let moved_again = m.from().is_some_and(|from| {
            rules
                .moves()
                .iter()
                .rev()
                .skip(1)
                .step_by(2)
                .take(window)
                .any(|prev| prev.to() == from)
        });
        if moved_again {
            units -= g.repeated_piece_move_penalty;
        }

        if rules.occurrences(next) > 0 {
            units -= g.repeated_position_penalty;
        }

        (units * HEURISTIC_UNIT_CP).round() as i32
    }
}

impl MoveChooser<ChessRules> for GenomeBot {
    fn choose_move(&mut self, position: &ChessRules, _timer: &Timer) -> Option<Move> {
        let pos = position.chess();
        let us = pos.turn();
        let mut best: Option<(Move, i32)> = None;

        for m in pos.legal_moves() {
            let mut next = pos.clone();
            next.play_unchecked(m);
            if next.is_checkmate() {
                return Some(m);
            }
            let score = worst_case_material(&next, us) + self.heuristic(position, &m, &next);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((m, score));
            }
        }
        best.map(|(m, _)| m)
    }
}

/// Material for `us` after the opponent's most damaging reply.
fn worst_case_material(pos: &Chess, us: Color) -> i32 {
    let replies = pos.legal_moves();
    if replies.is_empty() {
        // Checkmates were handled by the caller, so this is a stalemate.
        return 0;
    }
    replies
        .iter()
        .map(|reply| {
            let mut after = pos.clone();
            after.play_unchecked(*reply);
            material_balance(&after, us)
        })
        .min()
        .unwrap_or(0)
}

fn back_rank(color: Color) -> Rank {
    match color {
        Color::White => Rank::First,
        Color::Black => Rank::Eighth,
    }
}

fn is_overextended(rank: Rank, color: Color) -> bool {
    match color {
        Color::White => rank >= Rank::Fifth,
        Color::Black => rank <= Rank::Fourth,
    }
}

/// The production pairing: a `GenomeBot` candidate against a seeded random
/// reference.
pub struct StandardAgents {
    reference_seed: u64,
}

impl StandardAgents {
    pub fn new(reference_seed: u64) -> Self {
        Self { reference_seed }
    }
}

impl AgentFactory<ChessRules> for StandardAgents {
    fn candidate(&self, genome: &Genome) -> Box<dyn MoveChooser<ChessRules>> {
        Box::new(GenomeBot::new(genome.clone()))
    }

    fn reference(&self, game_index: u64) -> Box<dyn MoveChooser<ChessRules>> {
        Box::new(RandomMover::new(self.reference_seed.wrapping_add(game_index)))
    }
}

/// Both sides play `FirstLegalMove`.
#[cfg(test)]
pub struct FirstLegalAgents;

#[cfg(test)]
impl<R: Rules> AgentFactory<R> for FirstLegalAgents {
    fn candidate(&self, _genome: &Genome) -> Box<dyn MoveChooser<R>> {
        Box::new(FirstLegalMove)
    }

    fn reference(&self, _game_index: u64) -> Box<dyn MoveChooser<R>> {
        Box::new(FirstLegalMove)
    }
}
