//! Side effects of a finished phase: stats, milestone rewards, remote log.
//!
//! The interval engine knows only the [`CompletionNotifier`] trait. Reward
//! tables, stats layout and delivery live here so timing and reward logic can
//! be tested apart.

mod recorder;
mod rewards;
mod stats;

pub use recorder::{CompletionRecord, HttpStatsRecorder, RetryPolicy, StatsRecorder};
pub use rewards::{Milestone, RewardCatalog, RewardKind};
pub use stats::{DailyProgress, UserStats, STATS_KEY};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::KvStore;
use crate::timer::Phase;

/// One genuine phase completion, as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionNotice {
    pub phase: Phase,
    pub duration_seconds: u64,
    /// Work phases completed including this one; `None` for breaks.
    pub new_cycle_index: Option<u32>,
    pub completed_at: DateTime<Utc>,
    /// Deadline (epoch ms) of the countdown that expired. The same logical
    /// completion always carries the same key, even when rediscovered after
    /// a reload.
    pub completion_key: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReceipt {
    /// The notice repeated an already-applied completion key.
    pub duplicate: bool,
    pub unlocked: Vec<Milestone>,
}

pub trait CompletionNotifier {
    /// Apply the side effects of `notice`. Must be idempotent per
    /// `completion_key`.
    fn notify(&mut self, notice: &CompletionNotice) -> Result<CompletionReceipt>;
}

impl<T: CompletionNotifier + ?Sized> CompletionNotifier for Box<T> {
    fn notify(&mut self, notice: &CompletionNotice) -> Result<CompletionReceipt> {
        (**self).notify(notice)
    }
}

/// Notifier backed by locally persisted [`UserStats`].
pub struct StatsNotifier<S: KvStore> {
    store: S,
    catalog: RewardCatalog,
    recorders: Vec<Box<dyn StatsRecorder>>,
}

impl<S: KvStore> StatsNotifier<S> {
    pub fn new(store: S, catalog: RewardCatalog) -> Self {
        Self {
            store,
            catalog,
            recorders: Vec::new(),
        }
    }

    pub fn with_recorder(mut self, recorder: impl StatsRecorder + 'static) -> Self {
        self.recorders.push(Box::new(recorder));
        self
    }

    pub fn catalog(&self) -> &RewardCatalog {
        &self.catalog
    }

    pub fn stats(&self) -> Result<UserStats> {
        UserStats::load(&self.store)
    }

    fn deliver(&self, record: &CompletionRecord) {
        for recorder in &self.recorders {
            if let Err(e) = recorder.record_completion(record) {
                tracing::warn!(error = %e, "stats recorder failed; local completion kept");
            }
        }
    }
}

impl<S: KvStore> CompletionNotifier for StatsNotifier<S> {
    fn notify(&mut self, notice: &CompletionNotice) -> Result<CompletionReceipt> {
        let mut stats = UserStats::load(&self.store)?;

        if notice.completion_key.is_some() && stats.last_completion_key == notice.completion_key {
            tracing::info!(
                key = ?notice.completion_key,
                phase = %notice.phase,
                "completion already applied; skipping"
            );
            return Ok(CompletionReceipt {
                duplicate: true,
                unlocked: Vec::new(),
            });
        }

        let mut receipt = CompletionReceipt::default();
        match notice.phase {
            Phase::Work => {
                stats.total_completed_work_phases += 1;
                stats.total_focus_seconds += notice.duration_seconds;
                let day = stats.day_mut(notice.completed_at);
                day.work_phases += 1;
                day.focus_seconds += notice.duration_seconds;

                let fresh: Vec<Milestone> = self
                    .catalog
                    .newly_unlocked(stats.total_completed_work_phases, &stats.unlocked_rewards)
                    .into_iter()
                    .cloned()
                    .collect();
                stats
                    .unlocked_rewards
                    .extend(fresh.iter().map(|m| m.id.clone()));
                receipt.unlocked = fresh;
            }
            Phase::ShortBreak | Phase::LongBreak => {
                stats.total_break_seconds += notice.duration_seconds;
                stats.day_mut(notice.completed_at).break_seconds += notice.duration_seconds;
            }
        }
        if notice.completion_key.is_some() {
            stats.last_completion_key = notice.completion_key;
        }
        stats.save(&self.store)?;

        tracing::info!(
            phase = %notice.phase,
            duration_seconds = notice.duration_seconds,
            total_work_phases = stats.total_completed_work_phases,
            unlocked = receipt.unlocked.len(),
            "completion recorded"
        );

        if notice.phase == Phase::Work {
            self.deliver(&CompletionRecord {
                duration_seconds: notice.duration_seconds,
                completed_at: notice.completed_at,
                mode: notice.phase,
            });
        }

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::cell::RefCell;

    #[derive(Default)]
    struct CountingRecorder {
        records: RefCell<Vec<CompletionRecord>>,
    }

    impl StatsRecorder for CountingRecorder {
        fn record_completion(&self, record: &CompletionRecord) -> Result<()> {
            self.records.borrow_mut().push(record.clone());
            Ok(())
        }
    }

    struct FailingRecorder;

    impl StatsRecorder for FailingRecorder {
        fn record_completion(&self, _record: &CompletionRecord) -> Result<()> {
            Err(crate::error::CoreError::Custom("offline".into()))
        }
    }

    fn work_notice(key: u64) -> CompletionNotice {
        CompletionNotice {
            phase: Phase::Work,
            duration_seconds: 1500,
            new_cycle_index: Some(1),
            completed_at: Utc::now(),
            completion_key: Some(key),
        }
    }

    #[test]
    fn work_completion_updates_counters_and_unlocks_first_rewards() {
        let store = MemoryStore::new();
        let mut notifier = StatsNotifier::new(&store, RewardCatalog::default());

        let receipt = notifier.notify(&work_notice(1)).unwrap();
        assert!(!receipt.duplicate);
        assert_eq!(receipt.unlocked.len(), 2);

        let stats = notifier.stats().unwrap();
        assert_eq!(stats.total_completed_work_phases, 1);
        assert_eq!(stats.total_focus_seconds, 1500);
        assert_eq!(stats.unlocked_rewards.len(), 2);
    }

    #[test]
    fn repeated_completion_key_is_ignored() {
        let store = MemoryStore::new();
        let mut notifier = StatsNotifier::new(&store, RewardCatalog::default());

        notifier.notify(&work_notice(42)).unwrap();
        let again = notifier.notify(&work_notice(42)).unwrap();

        assert!(again.duplicate);
        assert_eq!(notifier.stats().unwrap().total_completed_work_phases, 1);
    }

    #[test]
    fn break_completion_records_break_time_only() {
        let store = MemoryStore::new();
        let mut notifier = StatsNotifier::new(&store, RewardCatalog::default());

        let receipt = notifier
            .notify(&CompletionNotice {
                phase: Phase::ShortBreak,
                duration_seconds: 300,
                new_cycle_index: None,
                completed_at: Utc::now(),
                completion_key: Some(7),
            })
            .unwrap();

        assert!(receipt.unlocked.is_empty());
        let stats = notifier.stats().unwrap();
        assert_eq!(stats.total_completed_work_phases, 0);
        assert_eq!(stats.total_break_seconds, 300);
        assert!(stats.unlocked_rewards.is_empty());
    }

    #[test]
    fn recorders_see_work_completions_only() {
        let store = MemoryStore::new();
        let recorder = std::rc::Rc::new(CountingRecorder::default());
        let mut notifier =
            StatsNotifier::new(&store, RewardCatalog::empty()).with_recorder(std::rc::Rc::clone(&recorder));

        notifier.notify(&work_notice(1)).unwrap();
        notifier
            .notify(&CompletionNotice {
                phase: Phase::LongBreak,
                duration_seconds: 900,
                new_cycle_index: None,
                completed_at: Utc::now(),
                completion_key: Some(2),
            })
            .unwrap();

        let records = recorder.records.borrow();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].mode, Phase::Work);
        assert_eq!(records[0].duration_seconds, 1500);
    }

    #[test]
    fn recorder_failure_does_not_fail_the_completion() {
        let store = MemoryStore::new();
        let mut notifier =
            StatsNotifier::new(&store, RewardCatalog::default()).with_recorder(FailingRecorder);

        assert!(notifier.notify(&work_notice(1)).is_ok());
        assert_eq!(notifier.stats().unwrap().total_completed_work_phases, 1);
    }
}
