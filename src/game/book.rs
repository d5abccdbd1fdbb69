// src/game/book.rs

use std::fs;
use std::path::Path;

use super::Rules;
use crate::error::{Result, TunerError};

/// The fixed set of starting positions every genome is scored on.
#[derive(Clone, Debug)]
pub struct OpeningBook<R: Rules> {
    positions: Vec<R>,
}

impl<R: Rules> OpeningBook<R> {
    /// Loads a newline-delimited FEN file. Blank lines are skipped; any
    /// unparsable line fails the whole load.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let book = Self::from_fens(content.lines())?;
        if book.is_empty() {
            return Err(TunerError::EmptyBook(path.to_path_buf()));
        }
        tracing::info!("Loaded {} opening positions from {:?}", book.len(), path);
        Ok(book)
    }

    pub fn from_fens<'a>(fens: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let positions = fens
            .into_iter()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(R::from_fen)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { positions })
    }

    pub fn positions(&self) -> &[R] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ChessRules;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    #[test]
    fn test_load_skips_blank_lines() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{START}\n\n   \n{KIWIPETE}\n").unwrap();
        let book = OpeningBook::<ChessRules>::load(file.path()).unwrap();
        assert_eq!(book.len(), 2);
        assert_eq!(book.positions()[1].fen(), KIWIPETE);
    }

    #[test]
    fn test_empty_book_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file).unwrap();
        let err = OpeningBook::<ChessRules>::load(file.path()).unwrap_err();
        assert!(matches!(err, TunerError::EmptyBook(_)));
    }

    #[test]
    fn test_bad_line_fails_the_load() {
        let err = OpeningBook::<ChessRules>::from_fens([START, "garbage"]).unwrap_err();
        assert!(matches!(err, TunerError::InvalidFen { .. }));
    }
}
