//! Durable projection of the interval state.
//!
//! The clock is written on every start and pause, deleted on reset and on
//! phase completion, and read once when the engine initializes. The phase
//! cursor is written whenever the phase or cycle count changes.

use serde::{Deserialize, Serialize};

use super::KvStore;
use crate::error::Result;
use crate::timer::Phase;

pub const CLOCK_KEY: &str = "interval_clock";
pub const CURSOR_KEY: &str = "interval_cursor";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PersistedClock {
    Running {
        deadline_epoch_ms: u64,
        phase: Phase,
        cycle_count: u32,
    },
    Paused {
        remaining_seconds: u64,
        phase: Phase,
        cycle_count: u32,
    },
}

impl PersistedClock {
    pub fn phase(&self) -> Phase {
        match self {
            PersistedClock::Running { phase, .. } | PersistedClock::Paused { phase, .. } => *phase,
        }
    }

    pub fn cycle_count(&self) -> u32 {
        match self {
            PersistedClock::Running { cycle_count, .. }
            | PersistedClock::Paused { cycle_count, .. } => *cycle_count,
        }
    }
}

/// Last known phase and cycle count. Outlives the clock itself so an idle
/// engine reloads into the phase it was left in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseCursor {
    pub phase: Phase,
    pub cycle_count: u32,
}

pub struct ClockStore<S: KvStore> {
    store: S,
}

impl<S: KvStore> ClockStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Read the persisted clock. Undecodable contents count as no clock.
    ///
    /// # Errors
    /// Only fails when the underlying store cannot be read.
    pub fn load(&self) -> Result<Option<PersistedClock>> {
        let Some(raw) = self.store.get(CLOCK_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<PersistedClock>(&raw) {
            Ok(clock) => Ok(Some(clock)),
            Err(e) => {
                tracing::warn!(error = %e, "persisted clock is corrupt; treating as no active timer");
                Ok(None)
            }
        }
    }

    pub fn save(&self, clock: &PersistedClock) -> Result<()> {
        let json = serde_json::to_string(clock)?;
        self.store.set(CLOCK_KEY, &json)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.delete(CLOCK_KEY)
    }

    pub fn load_cursor(&self) -> Result<Option<PhaseCursor>> {
        let Some(raw) = self.store.get(CURSOR_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<PhaseCursor>(&raw) {
            Ok(cursor) => Ok(Some(cursor)),
            Err(e) => {
                tracing::warn!(error = %e, "persisted phase cursor is corrupt; ignoring");
                Ok(None)
            }
        }
    }

    pub fn save_cursor(&self, cursor: &PhaseCursor) -> Result<()> {
        let json = serde_json::to_string(cursor)?;
        self.store.set(CURSOR_KEY, &json)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
