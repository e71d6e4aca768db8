//! Locally persisted progress counters.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};
use crate::storage::KvStore;

pub const STATS_KEY: &str = "user_stats";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyProgress {
    #[serde(default)]
    pub work_phases: u64,
    #[serde(default)]
    pub focus_seconds: u64,
    #[serde(default)]
    pub break_seconds: u64,
}

/// Accumulated progress. Counters only ever grow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    #[serde(default)]
    pub total_completed_work_phases: u64,
    #[serde(default)]
    pub total_focus_seconds: u64,
    #[serde(default)]
    pub total_break_seconds: u64,
    #[serde(default)]
    pub unlocked_rewards: Vec<String>,
    /// Keyed by `YYYY-MM-DD` (UTC).
    #[serde(default)]
    pub history: BTreeMap<String, DailyProgress>,
    /// Completion key of the last applied completion.
    #[serde(default)]
    pub last_completion_key: Option<u64>,
}

impl UserStats {
    /// Load from `store`; a missing entry is a fresh user.
    ///
    /// # Errors
    /// A present but undecodable entry is an error: silently starting from
    /// zero would break monotonic counters.
    pub fn load<S: KvStore + ?Sized>(store: &S) -> Result<Self> {
        match store.get(STATS_KEY)? {
            None => Ok(Self::default()),
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                StorageError::Corrupt {
                    key: STATS_KEY.into(),
                    message: e.to_string(),
                }
                .into()
            }),
        }
    }

    pub fn save<S: KvStore + ?Sized>(&self, store: &S) -> Result<()> {
        let json = serde_json::to_string(self)?;
        store.set(STATS_KEY, &json)
    }

    pub fn day_mut(&mut self, at: DateTime<Utc>) -> &mut DailyProgress {
        self.history
            .entry(at.format("%Y-%m-%d").to_string())
            .or_default()
    }

    pub fn day(&self, at: DateTime<Utc>) -> DailyProgress {
        self.history
            .get(&at.format("%Y-%m-%d").to_string())
            .cloned()
            .unwrap_or_default()
    }
}
