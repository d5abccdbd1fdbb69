// src/annotate.rs

use std::fs;
use std::path::Path;

use crate::engine::PositionOracle;
use crate::error::Result;
use crate::game::{ChessRules, Color, Rules};

/// Scores every FEN in `input` with `oracle`. Engine scores are relative to
/// the side to move; the returned scores are relative to White.
pub fn annotate_positions(input: &Path, oracle: &dyn PositionOracle) -> Result<Vec<(String, i32)>> {
    let content = fs::read_to_string(input)?;
    let positions = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ChessRules::from_fen)
        .collect::<Result<Vec<_>>>()?;

    tracing::info!("Annotating {} positions from {}", positions.len(), input.display());
    let rows = positions
        .iter()
        .map(|position| {
            let fen = position.fen();
            let score = white_relative(position.turn(), oracle.score(&fen));
            (fen, score)
        })
        .collect();
    Ok(rows)
}

fn white_relative(side_to_move: Color, score: i32) -> i32 {
    match side_to_move {
        Color::White => score,
        Color::Black => -score,
    }
}
