use serde::{Deserialize, Serialize};

use super::phase::Phase;
use crate::error::ValidationError;

/// Immutable snapshot of the timer settings. Durations are whole seconds.
///
/// Replaced wholesale when the user saves settings; never patched in place
/// by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfiguration {
    #[serde(default = "default_work_duration")]
    pub work_duration: u64,
    #[serde(default = "default_short_break_duration")]
    pub short_break_duration: u64,
    #[serde(default = "default_long_break_duration")]
    pub long_break_duration: u64,
    #[serde(default = "default_cycles_until_long_break")]
    pub cycles_until_long_break: u32,
    #[serde(default)]
    pub auto_start_work: bool,
    #[serde(default)]
    pub auto_start_break: bool,
}

fn default_work_duration() -> u64 {
    30 * 60
}
fn default_short_break_duration() -> u64 {
    5 * 60
}
fn default_long_break_duration() -> u64 {
    15 * 60
}
fn default_cycles_until_long_break() -> u32 {
    4
}

impl Default for TimerConfiguration {
    fn default() -> Self {
        Self {
            work_duration: default_work_duration(),
            short_break_duration: default_short_break_duration(),
            long_break_duration: default_long_break_duration(),
            cycles_until_long_break: default_cycles_until_long_break(),
            auto_start_work: false,
            auto_start_break: false,
        }
    }
}

impl TimerConfiguration {
    /// Full countdown length for `phase`, in seconds.
    pub fn duration_of(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Work => self.work_duration,
            Phase::ShortBreak => self.short_break_duration,
            Phase::LongBreak => self.long_break_duration,
        }
    }

    /// Reject non-positive durations and a zero cycle count.
    ///
    /// # Errors
    /// Returns the first offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let durations = [
            ("work_duration", self.work_duration),
            ("short_break_duration", self.short_break_duration),
            ("long_break_duration", self.long_break_duration),
        ];
        if let Some((field, _)) = durations.iter().find(|(_, secs)| *secs == 0) {
            return Err(ValidationError::NonPositiveDuration { field });
        }
        if self.cycles_until_long_break == 0 {
            return Err(ValidationError::ZeroCycles);
        }
        Ok(())
    }
}
