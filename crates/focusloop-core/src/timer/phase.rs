//! Phase cadence: work, short break, work, ..., long break.
//!
//! Everything here is pure. Recovery after a reload re-derives the next phase
//! from the persisted `(phase, cycle_count)` pair, so the functions must give
//! the same answer for the same inputs every time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::configuration::TimerConfiguration;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Work, Phase::ShortBreak, Phase::LongBreak];

    pub fn is_break(self) -> bool {
        matches!(self, Phase::ShortBreak | Phase::LongBreak)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Work => "work",
            Phase::ShortBreak => "short_break",
            Phase::LongBreak => "long_break",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "work" | "focus" | "pomodoro" => Ok(Phase::Work),
            "short_break" | "short" => Ok(Phase::ShortBreak),
            "long_break" | "long" => Ok(Phase::LongBreak),
            other => Err(ValidationError::InvalidValue {
                field: "phase".into(),
                message: format!("unknown phase '{other}'"),
            }),
        }
    }
}

/// Phase that follows `current`, and its duration in seconds.
///
/// `cycle_count` is the number of work phases completed before `current`
/// finished; for a finishing work phase the incremented count decides between
/// a short and a long break.
pub fn next_phase(current: Phase, cycle_count: u32, config: &TimerConfiguration) -> (Phase, u64) {
    let next = match current {
        Phase::Work => {
            let cycles = config.cycles_until_long_break.max(1);
            if cycle_count.saturating_add(1) % cycles == 0 {
                Phase::LongBreak
            } else {
                Phase::ShortBreak
            }
        }
        Phase::ShortBreak | Phase::LongBreak => Phase::Work,
    };
    (next, config.duration_of(next))
}

/// Cycle count after `finished` completes or is skipped.
pub fn advance_cycle(finished: Phase, cycle_count: u32) -> u32 {
    match finished {
        Phase::Work => cycle_count.saturating_add(1),
        Phase::ShortBreak => cycle_count,
        Phase::LongBreak => 0,
    }
}

/// Whether entering `next` should start the countdown without user input.
pub fn should_auto_start(next: Phase, config: &TimerConfiguration) -> bool {
    match next {
        Phase::Work => config.auto_start_work,
        Phase::ShortBreak | Phase::LongBreak => config.auto_start_break,
    }
}
