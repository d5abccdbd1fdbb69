// src/engine/mod.rs

pub mod process;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use serde::{Deserialize, Serialize};

use crate::constants::{
    ENGINE_DEPTH, ENGINE_HANDSHAKE_TIMEOUT_MS, ENGINE_PATH, ENGINE_QUERY_TIMEOUT_MS,
    ENGINE_SKILL_LEVEL,
};
use crate::error::{Result, TunerError};

pub use process::EngineProcess;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub path: PathBuf,
    pub args: Vec<String>,
    pub depth: u8,
    /// Sent as `setoption name <Name> value <Value>` after the handshake.
    pub options: Vec<(String, String)>,
    pub handshake_timeout_ms: u64,
    pub query_timeout_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(ENGINE_PATH),
            args: Vec::new(),
            depth: ENGINE_DEPTH,
            options: vec![("Skill Level".to_string(), ENGINE_SKILL_LEVEL.to_string())],
            handshake_timeout_ms: ENGINE_HANDSHAKE_TIMEOUT_MS,
            query_timeout_ms: ENGINE_QUERY_TIMEOUT_MS,
        }
    }
}

/// Extracts the centipawn value from an `info ... score cp <n> ...` line.
pub fn parse_cp_score(line: &str) -> Option<i32> {
    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == "score" {
            return match (tokens.next(), tokens.next()) {
                (Some("cp"), Some(value)) => value.parse().ok(),
                _ => None,
            };
        }
    }
    None
}

/// Forwards every line of `reader` to the returned channel from a background
/// thread. The channel disconnects when the stream ends.
pub fn spawn_line_reader<R: BufRead + Send + 'static>(reader: R) -> Receiver<String> {
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::spawn(move || {
        for line in reader.lines() {
            let Ok(line) = line else { break };
            if tx.send(line.trim_end().to_string()).is_err() {
                break;
            }
        }
    });
    rx
}

/// The request/response side of the engine protocol, independent of how the
/// engine process is run.
pub struct EngineSession<W: Write> {
    writer: Option<W>,
    lines: Receiver<String>,
    depth: u8,
    query_timeout: Duration,
    desynced: bool,
}

impl<W: Write> EngineSession<W> {
    /// Sends `uci`, waits for `uciok` and applies the configured options.
    pub fn handshake(writer: W, lines: Receiver<String>, settings: &EngineSettings) -> Result<Self> {
        let mut session = Self {
            writer: Some(writer),
            lines,
            depth: settings.depth,
            query_timeout: Duration::from_millis(settings.query_timeout_ms),
            desynced: false,
        };

        session
            .send("uci")
            .map_err(|e| TunerError::EngineHandshake(format!("cannot write to engine: {e}")))?;

        let deadline = Instant::now() + Duration::from_millis(settings.handshake_timeout_ms);
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            match session.lines.recv_timeout(left) {
                Ok(line) if line.trim() == "uciok" => break,
                Ok(line) => tracing::debug!("engine: {line}"),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(TunerError::EngineHandshake(
                        "engine closed its output before uciok".to_string(),
                    ));
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(TunerError::EngineHandshake(format!(
                        "no uciok within {}ms",
                        settings.handshake_timeout_ms
                    )));
                }
            }
        }

        for (name, value) in &settings.options {
            session.send(&format!("setoption name {name} value {value}"))?;
        }
        Ok(session)
    }

    /// Score of `fen` from the side to move, in centipawns. Any failure
    /// yields the neutral score 0.
    pub fn evaluate(&mut self, fen: &str) -> i32 {
        match self.query(fen) {
            Ok(Some(cp)) => cp,
            Ok(None) => {
                tracing::warn!("Engine gave no centipawn score for {fen}");
                0
            }
            Err(e) => {
                tracing::warn!("Engine query for {fen} failed: {e}");
                0
            }
        }
    }

    fn query(&mut self, fen: &str) -> io::Result<Option<i32>> {
        if self.desynced {
            self.resync()?;
        }

        self.send("ucinewgame")?;
        self.send(&format!("position fen {fen}"))?;
        self.send(&format!("go depth {}", self.depth))?;

        let mut score = None;
        loop {
            let line = self.next_line()?;
            if line.starts_with("bestmove") {
                return Ok(score);
            }
            if let Some(cp) = parse_cp_score(&line) {
                score = Some(cp);
            }
        }
    }

    /// Discards output left over from an abandoned search.
    fn resync(&mut self) -> io::Result<()> {
        self.send("stop")?;
        self.send("isready")?;
        while self.next_line()? != "readyok" {}
        self.desynced = false;
        Ok(())
    }

    fn next_line(&mut self) -> io::Result<String> {
        match self.lines.recv_timeout(self.query_timeout) {
            Ok(line) => Ok(line),
            Err(RecvTimeoutError::Timeout) => {
                self.desynced = true;
                Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no engine output for {:?}", self.query_timeout),
                ))
            }
            Err(RecvTimeoutError::Disconnected) => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "engine output closed",
            )),
        }
    }

    pub(crate) fn send(&mut self, command: &str) -> io::Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "engine input closed"))?;
        writeln!(writer, "{command}")?;
        writer.flush()
    }

    /// Drops the writer, closing the engine's input.
    pub fn close_input(&mut self) {
        self.writer = None;
    }

    #[cfg(test)]
    fn into_writer(self) -> Option<W> {
        self.writer
    }
}

/// Exclusive access to something that can score a position.
pub trait PositionScorer: Send {
    fn score_position(&mut self, fen: &str) -> i32;
}

impl<W: Write + Send> PositionScorer for EngineSession<W> {
    fn score_position(&mut self, fen: &str) -> i32 {
        self.evaluate(fen)
    }
}

/// Shared, thread-safe position scoring used by the ACPL strategy.
pub trait PositionOracle: Send + Sync {
    fn score(&self, fen: &str) -> i32;
}

impl<F> PositionOracle for F
where
    F: Fn(&str) -> i32 + Send + Sync,
{
    fn score(&self, fen: &str) -> i32 {
        self(fen)
    }
}

/// One scorer shared by all workers. Each query holds the lock for the whole
/// round trip so responses never interleave.
pub struct SharedEngine<S: PositionScorer> {
    inner: Mutex<S>,
}

impl<S: PositionScorer> SharedEngine<S> {
    pub fn new(scorer: S) -> Self {
        Self {
            inner: Mutex::new(scorer),
        }
    }
}

impl<S: PositionScorer> PositionOracle for SharedEngine<S> {
    fn score(&self, fen: &str) -> i32 {
        let mut scorer = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        scorer.score_position(fen)
    }
}
