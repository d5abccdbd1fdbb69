// game/mod.rs

pub mod agents;
pub mod book;
pub mod clock;
pub mod simulator;

use std::fmt::Debug;

use shakmaty::fen::Fen;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move, Position};

use crate::constants::{BISHOP_VALUE, KNIGHT_VALUE, PAWN_VALUE, QUEEN_VALUE, ROOK_VALUE};
use crate::error::{Result, TunerError};

pub use shakmaty::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawReason {
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    Repetition,
    MoveLimit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate { winner: Color },
    Draw(DrawReason),
}

/// The rules collaborator: everything the simulator needs to know about a
/// position, independent of how moves are represented.
pub trait Rules: Clone + Send + Sync + Sized {
    type Move: Clone + Debug + Send;

    fn from_fen(fen: &str) -> Result<Self>;
    fn turn(&self) -> Color;
    fn legal_moves(&self) -> Vec<Self::Move>;
    /// Applies `mv` if it is legal in the current position. Returns `false`
    /// and leaves the position untouched otherwise.
    fn play(&mut self, mv: &Self::Move) -> bool;
    fn status(&self) -> GameStatus;
    fn fen(&self) -> String;
}

/// Standard chess backed by `shakmaty`, with the game history needed for
/// repetition detection.
#[derive(Clone, Debug)]
pub struct ChessRules {
    chess: Chess,
    history: Vec<u64>,
    moves: Vec<Move>,
}

impl ChessRules {
    pub fn new(chess: Chess) -> Self {
        let hash = position_hash(&chess);
        Self {
            chess,
            history: vec![hash],
            moves: Vec::new(),
        }
    }

    pub fn chess(&self) -> &Chess {
        &self.chess
    }

    /// Moves played since the starting position, oldest first.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// How many times `pos` has already occurred in this game.
    pub fn occurrences(&self, pos: &Chess) -> usize {
        let hash = position_hash(pos);
        self.history.iter().filter(|&&h| h == hash).count()
    }
}

impl Default for ChessRules {
    fn default() -> Self {
        Self::new(Chess::default())
    }
}

impl Rules for ChessRules {
    type Move = Move;

    fn from_fen(fen: &str) -> Result<Self> {
        let invalid = |reason: String| TunerError::InvalidFen {
            fen: fen.to_string(),
            reason,
        };
        let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{e}")))?;
        let chess: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| invalid(format!("{e}")))?;
        Ok(Self::new(chess))
    }

    fn turn(&self) -> Color {
        self.chess.turn()
    }

    fn legal_moves(&self) -> Vec<Move> {
        self.chess.legal_moves().to_vec()
    }

    fn play(&mut self, mv: &Move) -> bool {
        match self.chess.clone().play(*mv) {
            Ok(next) => {
                self.chess = next;
                self.history.push(position_hash(&self.chess));
                self.moves.push(*mv);
                true
            }
            Err(_) => false,
        }
    }

    fn status(&self) -> GameStatus {
        if self.chess.is_checkmate() {
            return GameStatus::Checkmate {
                winner: !self.chess.turn(),
            };
        }
        if self.chess.is_stalemate() {
            return GameStatus::Draw(DrawReason::Stalemate);
        }
        if self.chess.is_insufficient_material() {
            return GameStatus::Draw(DrawReason::InsufficientMaterial);
        }
        if self.chess.halfmoves() >= 100 {
            return GameStatus::Draw(DrawReason::FiftyMoveRule);
        }
        if self.occurrences(&self.chess) >= 3 {
            return GameStatus::Draw(DrawReason::Repetition);
        }
        GameStatus::Ongoing
    }

    fn fen(&self) -> String {
        Fen::from_position(&self.chess, EnPassantMode::Legal).to_string()
    }
}

fn position_hash(pos: &Chess) -> u64 {
    let hash: Zobrist64 = pos.zobrist_hash(EnPassantMode::Legal);
    hash.0
}

/// Material balance from `color`'s point of view, in centipawns.
pub fn material_balance(pos: &Chess, color: Color) -> i32 {
    let board = pos.board();
    let mut white_material = 0;
    let mut black_material = 0;

    for square in shakmaty::Square::ALL {
        if let Some(piece) = board.piece_at(square) {
            let value = match piece.role {
                shakmaty::Role::Pawn => PAWN_VALUE,
                shakmaty::Role::Knight => KNIGHT_VALUE,
                shakmaty::Role::Bishop => BISHOP_VALUE,
                shakmaty::Role::Rook => ROOK_VALUE,
                shakmaty::Role::Queen => QUEEN_VALUE,
                shakmaty::Role::King => 0,
            };
            if piece.color.is_white() {
                white_material += value;
            } else {
                black_material += value;
            }
        }
    }

    let diff = white_material - black_material;
    if color.is_white() {
        diff
    } else {
        -diff
    }
}
