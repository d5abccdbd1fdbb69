// src/engine/process.rs

use std::io::BufReader;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::{spawn_line_reader, EngineSession, EngineSettings, PositionScorer};
use crate::constants::ENGINE_TEARDOWN_GRACE_MS;
use crate::error::{Result, TunerError};

/// A running reference engine. Dropping it shuts the process down.
pub struct EngineProcess {
    child: Child,
    session: EngineSession<ChildStdin>,
}

impl EngineProcess {
    pub fn spawn(settings: &EngineSettings) -> Result<Self> {
        let mut child = Command::new(&settings.path)
            .args(&settings.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| TunerError::EngineSpawn {
                path: settings.path.clone(),
                source,
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            reap(&mut child);
            return Err(TunerError::EngineHandshake(
                "engine pipes unavailable".to_string(),
            ));
        };

        let lines = spawn_line_reader(BufReader::new(stdout));
        match EngineSession::handshake(stdin, lines, settings) {
            Ok(session) => {
                tracing::info!(
                    "Reference engine {:?} ready (pid {}, depth {})",
                    settings.path,
                    child.id(),
                    settings.depth
                );
                Ok(Self { child, session })
            }
            Err(e) => {
                reap(&mut child);
                Err(e)
            }
        }
    }
}

impl PositionScorer for EngineProcess {
    fn score_position(&mut self, fen: &str) -> i32 {
        self.session.score_position(fen)
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        // The engine may already be gone; a failed write is fine here.
        let _ = self.session.send("quit");
        self.session.close_input();

        let deadline = Instant::now() + Duration::from_millis(ENGINE_TEARDOWN_GRACE_MS);
        while Instant::now() < deadline {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    tracing::debug!("Reference engine exited with {status}");
                    return;
                }
                Ok(None) => thread::sleep(Duration::from_millis(10)),
                Err(_) => break,
            }
        }
        tracing::debug!("Reference engine did not quit in time, killing it");
        reap(&mut self.child);
    }
}

fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn shell(script: &str, handshake_timeout_ms: u64) -> EngineSettings {
        EngineSettings {
            path: PathBuf::from("sh"),
            args: vec!["-c".to_string(), script.to_string()],
            handshake_timeout_ms,
            query_timeout_ms: 2_000,
            ..EngineSettings::default()
        }
    }

    const FAKE_ENGINE: &str = r#"
        while read cmd; do
            case "$cmd" in
                uci) echo "id name fake"; echo uciok ;;
                go*) echo "info depth 1 score cp 42"; echo "bestmove e2e4" ;;
                quit) exit 0 ;;
            esac
        done
    "#;

    #[test]
    fn test_spawn_and_query_fake_engine() {
        let mut engine = EngineProcess::spawn(&shell(FAKE_ENGINE, 2_000)).unwrap();
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        assert_eq!(engine.score_position(fen), 42);
        assert_eq!(engine.score_position(fen), 42);
    }

    #[test]
    fn test_missing_binary_fails_to_spawn() {
        let settings = EngineSettings {
            path: PathBuf::from("/nonexistent/engine-binary"),
            ..EngineSettings::default()
        };
        let err = EngineProcess::spawn(&settings).err().unwrap();
        assert!(matches!(err, TunerError::EngineSpawn { .. }));
    }

    #[test]
    fn test_silent_engine_fails_handshake_without_hanging() {
        let started = Instant::now();
        let err = EngineProcess::spawn(&shell("sleep 30", 100)).err().unwrap();
        assert!(matches!(err, TunerError::EngineHandshake(_)));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_engine_exiting_early_fails_handshake() {
        let err = EngineProcess::spawn(&shell("exit 0", 2_000)).err().unwrap();
        assert!(matches!(err, TunerError::EngineHandshake(_)));
    }

    #[test]
    fn test_drop_kills_engine_ignoring_quit() {
        let stubborn = r#"
            trap '' TERM
            echo uciok
            while true; do sleep 1; done
        "#;
        let started = Instant::now();
        let engine = EngineProcess::spawn(&shell(stubborn, 2_000)).unwrap();
        drop(engine);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
