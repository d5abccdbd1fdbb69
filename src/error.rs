use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TunerError {
    #[error("reference engine handshake failed: {0}")]
    EngineHandshake(String),

    #[error("failed to start reference engine {path:?}: {source}")]
    EngineSpawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid FEN {fen:?}: {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("opening book {0:?} contains no positions")]
    EmptyBook(PathBuf),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("an evaluation worker panicked; generation results discarded")]
    WorkerPanicked,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TunerError>;
