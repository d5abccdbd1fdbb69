// src/game/clock.rs

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::Color;
use crate::constants::{GAME_DURATION_MS, INCREMENT_MS, MAX_PLIES};

/// Time control and adjudication limits shared by every simulated game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    pub game_duration_ms: u64,
    pub increment_ms: u64,
    pub max_plies: u32,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            game_duration_ms: GAME_DURATION_MS,
            increment_ms: INCREMENT_MS,
            max_plies: MAX_PLIES,
        }
    }
}

impl MatchSettings {
    pub fn game_duration(&self) -> Duration {
        Duration::from_millis(self.game_duration_ms)
    }

    pub fn increment(&self) -> Duration {
        Duration::from_millis(self.increment_ms)
    }
}

/// What an agent is told about the clocks when asked for a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timer {
    pub remaining: Duration,
    pub opponent_remaining: Duration,
    pub game_duration: Duration,
    pub increment: Duration,
}

/// Per-side remaining time for one game.
#[derive(Clone, Debug)]
pub struct Clock {
    white: Duration,
    black: Duration,
    game_duration: Duration,
    increment: Duration,
}

impl Clock {
    pub fn new(settings: &MatchSettings) -> Self {
        Self {
            white: settings.game_duration(),
            black: settings.game_duration(),
            game_duration: settings.game_duration(),
            increment: settings.increment(),
        }
    }

    pub fn remaining(&self, color: Color) -> Duration {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    pub fn timer_for(&self, color: Color) -> Timer {
        Timer {
            remaining: self.remaining(color),
            opponent_remaining: self.remaining(!color),
            game_duration: self.game_duration,
            increment: self.increment,
        }
    }

    /// Charges `elapsed` to `color`. Returns `false` when the side ran out of
    /// time; otherwise the increment is credited.
    pub fn charge(&mut self, color: Color, elapsed: Duration) -> bool {
        let increment = self.increment;
        let slot = match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        };
        match slot.checked_sub(elapsed) {
            Some(left) => {
                *slot = left + increment;
                true
            }
            None => {
                *slot = Duration::ZERO;
                false
            }
        }
    }
}
