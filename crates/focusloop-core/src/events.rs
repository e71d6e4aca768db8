use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{EngineStatus, Phase};

/// Every state change in the engine produces an Event.
/// The UI renders them; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_seconds: u64,
        deadline_epoch_ms: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_seconds: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        phase: Phase,
        remaining_seconds: u64,
        at: DateTime<Utc>,
    },
    Tick {
        remaining_seconds: u64,
        at: DateTime<Utc>,
    },
    /// A phase ran out. `late_by_seconds` is set when the expiry was only
    /// discovered on initialization.
    PhaseCompleted {
        phase: Phase,
        duration_seconds: u64,
        cycle_count: u32,
        late_by_seconds: Option<u64>,
        at: DateTime<Utc>,
    },
    PhaseSkipped {
        phase: Phase,
        at: DateTime<Utc>,
    },
    /// The engine moved to a new phase after a completion or skip.
    PhaseAdvanced {
        phase: Phase,
        duration_seconds: u64,
        cycle_count: u32,
        at: DateTime<Utc>,
    },
    ModeChanged {
        from: Phase,
        to: Phase,
        remaining_seconds: u64,
        at: DateTime<Utc>,
    },
    RewardUnlocked {
        reward_id: String,
        name: String,
        at: DateTime<Utc>,
    },
    ConfigurationUpdated {
        remaining_seconds: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        status: EngineStatus,
        phase: Phase,
        remaining_seconds: u64,
        running: bool,
        cycle_count: u32,
        deadline_epoch_ms: Option<u64>,
        at: DateTime<Utc>,
    },
}
