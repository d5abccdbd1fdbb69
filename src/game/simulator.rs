// src/game/simulator.rs

use std::time::Instant;

use super::agents::MoveChooser;
use super::clock::{Clock, MatchSettings};
use super::{Color, DrawReason, GameStatus, Rules};

/// Result of one game from the candidate's point of view. Every game lands
/// in exactly one bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameOutcome {
    Win,
    Loss,
    Draw,
    Timeout,
    IllegalMove,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Forfeit {
    NoMove,
    IllegalMove,
    Flagged,
}

/// Why the game stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEnd {
    Checkmate { winner: Color },
    Draw(DrawReason),
    Forfeit { offender: Color, reason: Forfeit },
}

impl GameEnd {
    pub fn outcome_for(&self, candidate: Color) -> GameOutcome {
        match *self {
            GameEnd::Checkmate { winner } if winner == candidate => GameOutcome::Win,
            GameEnd::Checkmate { .. } => GameOutcome::Loss,
            GameEnd::Draw(_) => GameOutcome::Draw,
            GameEnd::Forfeit { offender, .. } if offender != candidate => GameOutcome::Win,
            GameEnd::Forfeit {
                reason: Forfeit::Flagged,
                ..
            } => GameOutcome::Timeout,
            GameEnd::Forfeit { .. } => GameOutcome::IllegalMove,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameRecord {
    pub end: GameEnd,
    pub outcome: GameOutcome,
    pub plies: u32,
}

/// Transient state of one game. Owned by a single simulator run.
pub struct MatchContext<R: Rules> {
    pub position: R,
    pub clock: Clock,
    pub plies: u32,
}

impl<R: Rules> MatchContext<R> {
    pub fn new(start: R, settings: &MatchSettings) -> Self {
        Self {
            position: start,
            clock: Clock::new(settings),
            plies: 0,
        }
    }
}

/// Plays one game between the candidate and the reference agent.
///
/// `after_candidate_move` is called with the position reached after each of
/// the candidate's moves.
pub fn play_game<R: Rules>(
    start: R,
    candidate_color: Color,
    candidate: &mut dyn MoveChooser<R>,
    reference: &mut dyn MoveChooser<R>,
    settings: &MatchSettings,
    after_candidate_move: &mut dyn FnMut(&R),
) -> GameRecord {
    let mut ctx = MatchContext::new(start, settings);

    let end = loop {
        match ctx.position.status() {
            GameStatus::Checkmate { winner } => break GameEnd::Checkmate { winner },
            GameStatus::Draw(reason) => break GameEnd::Draw(reason),
            GameStatus::Ongoing => {}
        }
        if ctx.plies >= settings.max_plies {
            break GameEnd::Draw(DrawReason::MoveLimit);
        }

        let side = ctx.position.turn();
        let agent: &mut dyn MoveChooser<R> = if side == candidate_color {
            &mut *candidate
        } else {
            &mut *reference
        };

        let timer = ctx.clock.timer_for(side);
        let started = Instant::now();
        let chosen = agent.choose_move(&ctx.position, &timer);
        if !ctx.clock.charge(side, started.elapsed()) {
            break GameEnd::Forfeit {
                offender: side,
                reason: Forfeit::Flagged,
            };
        }

        let Some(mv) = chosen else {
            break GameEnd::Forfeit {
                offender: side,
                reason: Forfeit::NoMove,
            };
        };
        if !ctx.position.play(&mv) {
            tracing::debug!("{side:?} played illegal move {mv:?}");
            break GameEnd::Forfeit {
                offender: side,
                reason: Forfeit::IllegalMove,
            };
        }
        ctx.plies += 1;

        if side == candidate_color {
            after_candidate_move(&ctx.position);
        }
    };

    GameRecord {
        end,
        outcome: end.outcome_for(candidate_color),
        plies: ctx.plies,
    }
}
