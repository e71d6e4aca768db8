//! Interval engine implementation.
//!
//! The engine is a deadline-based state machine over a single work/break
//! countdown. It owns its ticker and cancels it on every transition out of
//! `Running`; the persisted clock, not in-memory state, is authoritative
//! across reloads.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Idle | Completing -> Idle | Running)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = IntervalEngine::new(config, store, notifier)?;
//! engine.initialize()?; // catches up on a deadline that passed while closed
//! engine.start()?;
//! // Once per second:
//! engine.tick()?; // Returns completion events when the phase runs out
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::clock::{Clock, SystemClock};
use super::configuration::TimerConfiguration;
use super::phase::{self, Phase};
use super::ticker::{ManualTicker, Tick, Ticker};
use crate::completion::{CompletionNotice, CompletionNotifier};
use crate::error::{Result, TimerError};
use crate::events::Event;
use crate::storage::{ClockStore, KvStore, PersistedClock, PhaseCursor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    Idle,
    Running,
    /// Transient: a completion is being applied.
    Completing,
}

/// What the UI layer sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalState {
    pub phase: Phase,
    pub remaining_seconds: u64,
    pub running: bool,
    pub cycle_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompletionCause {
    Expired,
    CaughtUp { late_by_seconds: u64 },
    Skipped,
}

pub struct IntervalEngine<S: KvStore, N: CompletionNotifier> {
    config: TimerConfiguration,
    phase: Phase,
    remaining_seconds: u64,
    cycle_count: u32,
    status: EngineStatus,
    /// Set exactly while `Running` (and during a completion that started
    /// from `Running`).
    deadline_epoch_ms: Option<u64>,
    /// Bumped on every arm and disarm; ticks from older generations are stale.
    generation: u64,
    clocks: ClockStore<S>,
    notifier: N,
    clock: Arc<dyn Clock>,
    ticker: Box<dyn Ticker>,
    tick_listeners: Vec<Box<dyn FnMut(u64)>>,
}

impl<S: KvStore, N: CompletionNotifier> IntervalEngine<S, N> {
    /// Create an idle engine in the first work phase.
    ///
    /// Uses the system clock and a caller-driven ticker until replaced with
    /// [`with_clock`](Self::with_clock) / [`with_ticker`](Self::with_ticker).
    ///
    /// # Errors
    /// Returns a validation error for an invalid configuration.
    pub fn new(config: TimerConfiguration, store: S, notifier: N) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            remaining_seconds: config.duration_of(Phase::Work),
            config,
            phase: Phase::Work,
            cycle_count: 0,
            status: EngineStatus::Idle,
            deadline_epoch_ms: None,
            generation: 0,
            clocks: ClockStore::new(store),
            notifier,
            clock: Arc::new(SystemClock),
            ticker: Box::new(ManualTicker::new()),
            tick_listeners: Vec::new(),
        })
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_ticker(mut self, ticker: impl Ticker + 'static) -> Self {
        self.ticker.disarm();
        self.ticker = Box::new(ticker);
        self
    }

    /// Register a display listener called with the remaining seconds after
    /// every applied tick.
    pub fn on_tick(&mut self, listener: impl FnMut(u64) + 'static) {
        self.tick_listeners.push(Box::new(listener));
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> IntervalState {
        IntervalState {
            phase: self.phase,
            remaining_seconds: self.remaining_seconds,
            running: self.status == EngineStatus::Running,
            cycle_count: self.cycle_count,
        }
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn cycle_count(&self) -> u32 {
        self.cycle_count
    }

    pub fn is_running(&self) -> bool {
        self.status == EngineStatus::Running
    }

    pub fn deadline_epoch_ms(&self) -> Option<u64> {
        self.deadline_epoch_ms
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &TimerConfiguration {
        &self.config
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            status: self.status,
            phase: self.phase,
            remaining_seconds: self.remaining_seconds,
            running: self.is_running(),
            cycle_count: self.cycle_count,
            deadline_epoch_ms: self.deadline_epoch_ms,
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Restore from the persisted clock. Call once, before anything else.
    ///
    /// A running clock whose deadline already passed is completed here
    /// (catch-up). Exactly one phase is completed no matter how long the
    /// deadline has been overdue; the engine lands in the following phase
    /// with its full duration.
    pub fn initialize(&mut self) -> Result<Vec<Event>> {
        self.disarm_ticker();
        self.status = EngineStatus::Idle;
        self.deadline_epoch_ms = None;

        if let Some(cursor) = self.clocks.load_cursor()? {
            self.phase = cursor.phase;
            self.cycle_count = cursor.cycle_count;
            self.remaining_seconds = self.config.duration_of(cursor.phase);
        }

        let Some(persisted) = self.clocks.load()? else {
            tracing::debug!(phase = %self.phase, "no active timer to restore");
            return Ok(Vec::new());
        };

        self.phase = persisted.phase();
        self.cycle_count = persisted.cycle_count();

        match persisted {
            PersistedClock::Running {
                deadline_epoch_ms, ..
            } => {
                let now_ms = self.clock.now_ms();
                let remaining = seconds_until(deadline_epoch_ms, now_ms);
                self.deadline_epoch_ms = Some(deadline_epoch_ms);

                if remaining > 0 {
                    self.remaining_seconds = remaining.unsigned_abs();
                    self.status = EngineStatus::Running;
                    self.arm_ticker();
                    tracing::info!(
                        phase = %self.phase,
                        remaining_seconds = self.remaining_seconds,
                        "resumed running timer"
                    );
                    return Ok(Vec::new());
                }

                let late_by_seconds = now_ms.saturating_sub(deadline_epoch_ms) / 1000;
                let (next, next_duration) = phase::next_phase(self.phase, self.cycle_count, &self.config);
                tracing::info!(
                    phase = %self.phase,
                    late_by_seconds,
                    next_phase = %next,
                    forgone_phases = late_by_seconds / next_duration.max(1),
                    "deadline passed while unobserved; completing one phase"
                );
                self.remaining_seconds = 0;
                self.status = EngineStatus::Running;
                self.complete(CompletionCause::CaughtUp { late_by_seconds })
            }
            PersistedClock::Paused {
                remaining_seconds, ..
            } => {
                self.remaining_seconds = remaining_seconds;
                tracing::info!(
                    phase = %self.phase,
                    remaining_seconds,
                    "restored paused timer"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Start the countdown. A no-op when already running.
    pub fn start(&mut self) -> Result<Vec<Event>> {
        match self.status {
            EngineStatus::Running => {
                tracing::debug!("start ignored: already running");
                Ok(Vec::new())
            }
            EngineStatus::Completing => Err(TimerError::CompletionInProgress.into()),
            EngineStatus::Idle => self.begin_countdown(),
        }
    }

    /// Freeze the countdown at the time left until the deadline.
    pub fn pause(&mut self) -> Result<Vec<Event>> {
        if self.status != EngineStatus::Running {
            tracing::debug!(status = ?self.status, "pause ignored: not running");
            return Ok(Vec::new());
        }

        let now = self.clock.now();
        let remaining = match self.deadline_epoch_ms {
            Some(deadline) => seconds_until(deadline, self.clock.now_ms()).max(0).unsigned_abs(),
            None => self.remaining_seconds,
        };

        self.clocks.save(&PersistedClock::Paused {
            remaining_seconds: remaining,
            phase: self.phase,
            cycle_count: self.cycle_count,
        })?;

        self.disarm_ticker();
        self.status = EngineStatus::Idle;
        self.deadline_epoch_ms = None;
        self.remaining_seconds = remaining;

        tracing::info!(phase = %self.phase, remaining_seconds = remaining, "timer paused");
        Ok(vec![Event::TimerPaused {
            phase: self.phase,
            remaining_seconds: remaining,
            at: now,
        }])
    }

    /// Back to a full, idle countdown of the current phase.
    pub fn reset(&mut self) -> Result<Vec<Event>> {
        if self.status == EngineStatus::Completing {
            return Err(TimerError::CompletionInProgress.into());
        }
        self.clocks.clear()?;

        self.disarm_ticker();
        self.status = EngineStatus::Idle;
        self.deadline_epoch_ms = None;
        self.remaining_seconds = self.config.duration_of(self.phase);

        tracing::info!(phase = %self.phase, "timer reset");
        Ok(vec![Event::TimerReset {
            phase: self.phase,
            remaining_seconds: self.remaining_seconds,
            at: self.clock.now(),
        }])
    }

    /// Advance to the next phase without recording the current one.
    pub fn skip(&mut self) -> Result<Vec<Event>> {
        self.complete(CompletionCause::Skipped)
    }

    /// Jump to `phase` with its full duration, stopped. Cycle count is kept.
    pub fn change_mode(&mut self, phase: Phase) -> Result<Vec<Event>> {
        if phase == self.phase {
            tracing::debug!(phase = %phase, "mode change ignored: already in phase");
            return Ok(Vec::new());
        }
        if self.status == EngineStatus::Completing {
            return Err(TimerError::CompletionInProgress.into());
        }

        self.clocks.save_cursor(&PhaseCursor {
            phase,
            cycle_count: self.cycle_count,
        })?;
        self.clocks.clear()?;

        self.disarm_ticker();
        let from = self.phase;
        self.status = EngineStatus::Idle;
        self.deadline_epoch_ms = None;
        self.phase = phase;
        self.remaining_seconds = self.config.duration_of(phase);

        tracing::info!(from = %from, to = %phase, "mode changed");
        Ok(vec![Event::ModeChanged {
            from,
            to: phase,
            remaining_seconds: self.remaining_seconds,
            at: self.clock.now(),
        }])
    }

    /// Apply a tick delivered by the ticker. Ticks from an older generation
    /// are dropped.
    pub fn handle_tick(&mut self, tick: Tick) -> Result<Vec<Event>> {
        if tick.generation != self.generation {
            tracing::debug!(
                tick_generation = tick.generation,
                current = self.generation,
                "stale tick dropped"
            );
            return Ok(Vec::new());
        }
        self.tick()
    }

    /// One second elapsed. Returns completion events when the phase runs out.
    pub fn tick(&mut self) -> Result<Vec<Event>> {
        if self.status != EngineStatus::Running {
            return Ok(Vec::new());
        }

        let now = self.clock.now();
        let mut remaining = self.remaining_seconds.saturating_sub(1);
        if let Some(deadline) = self.deadline_epoch_ms {
            let by_deadline = seconds_until(deadline, self.clock.now_ms()).max(0).unsigned_abs();
            remaining = remaining.min(by_deadline);
        }
        self.remaining_seconds = remaining;

        for listener in &mut self.tick_listeners {
            listener(remaining);
        }
        tracing::debug!(remaining_seconds = remaining, "tick");

        let mut events = vec![Event::Tick {
            remaining_seconds: remaining,
            at: now,
        }];
        if remaining == 0 {
            events.extend(self.complete(CompletionCause::Expired)?);
        }
        Ok(events)
    }

    /// Replace the configuration wholesale.
    ///
    /// An idle countdown is reset to the new duration of the current phase.
    /// A running countdown keeps its deadline; only later phases see the new
    /// durations.
    pub fn update_configuration(&mut self, config: TimerConfiguration) -> Result<Vec<Event>> {
        config.validate()?;

        if self.status == EngineStatus::Running {
            self.config = config;
            tracing::info!("configuration updated; in-flight countdown untouched");
        } else {
            self.clocks.clear()?;
            self.config = config;
            self.remaining_seconds = self.config.duration_of(self.phase);
            tracing::info!(
                phase = %self.phase,
                remaining_seconds = self.remaining_seconds,
                "configuration updated"
            );
        }

        Ok(vec![Event::ConfigurationUpdated {
            remaining_seconds: self.remaining_seconds,
            at: self.clock.now(),
        }])
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin_countdown(&mut self) -> Result<Vec<Event>> {
        let now = self.clock.now();
        let deadline = self
            .clock
            .now_ms()
            .saturating_add(self.remaining_seconds.saturating_mul(1000));

        self.clocks.save(&PersistedClock::Running {
            deadline_epoch_ms: deadline,
            phase: self.phase,
            cycle_count: self.cycle_count,
        })?;

        self.deadline_epoch_ms = Some(deadline);
        self.status = EngineStatus::Running;
        self.arm_ticker();

        tracing::info!(
            phase = %self.phase,
            remaining_seconds = self.remaining_seconds,
            deadline_epoch_ms = deadline,
            "timer started"
        );
        Ok(vec![Event::TimerStarted {
            phase: self.phase,
            remaining_seconds: self.remaining_seconds,
            deadline_epoch_ms: deadline,
            at: now,
        }])
    }

    fn complete(&mut self, cause: CompletionCause) -> Result<Vec<Event>> {
        if self.status == EngineStatus::Completing {
            tracing::warn!("completion requested while another is in progress");
            return Err(TimerError::CompletionInProgress.into());
        }

        let previous = self.status;
        self.status = EngineStatus::Completing;
        self.disarm_ticker();

        match self.apply_completion(cause) {
            Ok(events) => Ok(events),
            Err(e) => {
                if self.status == EngineStatus::Completing {
                    self.status = previous;
                    if previous == EngineStatus::Running {
                        self.arm_ticker();
                    }
                }
                tracing::error!(error = %e, phase = %self.phase, "phase completion failed");
                Err(e)
            }
        }
    }

    fn apply_completion(&mut self, cause: CompletionCause) -> Result<Vec<Event>> {
        let now = self.clock.now();
        let finished = self.phase;
        let next_cycle = phase::advance_cycle(finished, self.cycle_count);
        let mut events = Vec::new();

        if cause == CompletionCause::Skipped {
            events.push(Event::PhaseSkipped {
                phase: finished,
                at: now,
            });
        } else {
            let duration = self.config.duration_of(finished);
            let notice = CompletionNotice {
                phase: finished,
                duration_seconds: duration,
                new_cycle_index: (finished == Phase::Work).then_some(next_cycle),
                completed_at: now,
                completion_key: self.deadline_epoch_ms,
            };
            let receipt = self.notifier.notify(&notice)?;
            if receipt.duplicate {
                tracing::info!(phase = %finished, "completion replayed after reload; advancing only");
            }

            let late_by_seconds = match cause {
                CompletionCause::CaughtUp { late_by_seconds } => Some(late_by_seconds),
                CompletionCause::Expired | CompletionCause::Skipped => None,
            };
            if !receipt.duplicate {
                events.push(Event::PhaseCompleted {
                    phase: finished,
                    duration_seconds: duration,
                    cycle_count: next_cycle,
                    late_by_seconds,
                    at: now,
                });
            }
            events.extend(receipt.unlocked.into_iter().map(|m| Event::RewardUnlocked {
                reward_id: m.id,
                name: m.name,
                at: now,
            }));
        }

        let (next, next_duration) = phase::next_phase(finished, self.cycle_count, &self.config);

        // Cursor before clock: a crash in between replays the expired clock,
        // which the notifier recognises by its completion key.
        self.clocks.save_cursor(&PhaseCursor {
            phase: next,
            cycle_count: next_cycle,
        })?;
        self.clocks.clear()?;

        self.phase = next;
        self.cycle_count = next_cycle;
        self.remaining_seconds = next_duration;
        self.deadline_epoch_ms = None;
        self.status = EngineStatus::Idle;

        tracing::info!(
            finished = %finished,
            next = %next,
            cycle_count = next_cycle,
            skipped = cause == CompletionCause::Skipped,
            "phase advanced"
        );
        events.push(Event::PhaseAdvanced {
            phase: next,
            duration_seconds: next_duration,
            cycle_count: next_cycle,
            at: now,
        });

        if phase::should_auto_start(next, &self.config) {
            events.extend(self.begin_countdown()?);
        }
        Ok(events)
    }

    fn arm_ticker(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.ticker.arm(self.generation);
    }

    fn disarm_ticker(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.ticker.disarm();
    }
}

/// Whole seconds from `now_ms` to `deadline_ms`, rounded to nearest.
/// Negative once the deadline has passed.
fn seconds_until(deadline_ms: u64, now_ms: u64) -> i64 {
    let diff = deadline_ms as i64 - now_ms as i64;
    (diff + 500).div_euclid(1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionReceipt;
    use crate::storage::MemoryStore;
    use crate::timer::ManualClock;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct RecordingNotifier {
        notices: Rc<RefCell<Vec<CompletionNotice>>>,
        fail: Rc<RefCell<bool>>,
    }

    impl CompletionNotifier for RecordingNotifier {
        fn notify(&mut self, notice: &CompletionNotice) -> Result<CompletionReceipt> {
            if *self.fail.borrow() {
                return Err(crate::error::CoreError::Custom("disk full".into()));
            }
            self.notices.borrow_mut().push(notice.clone());
            Ok(CompletionReceipt::default())
        }
    }

    fn config() -> TimerConfiguration {
        TimerConfiguration {
            work_duration: 10,
            short_break_duration: 3,
            long_break_duration: 6,
            cycles_until_long_break: 2,
            auto_start_work: false,
            auto_start_break: false,
        }
    }

    fn engine(
        store: &MemoryStore,
    ) -> (
        IntervalEngine<&MemoryStore, RecordingNotifier>,
        ManualClock,
        ManualTicker,
        RecordingNotifier,
    ) {
        let clock = ManualClock::at_epoch_ms(1_000_000);
        let ticker = ManualTicker::new();
        let notifier = RecordingNotifier::default();
        let engine = IntervalEngine::new(config(), store, notifier.clone())
            .unwrap()
            .with_clock(clock.clone())
            .with_ticker(ticker.clone());
        (engine, clock, ticker, notifier)
    }

    #[test]
    fn seconds_until_rounds_to_nearest() {
        assert_eq!(seconds_until(10_000, 0), 10);
        assert_eq!(seconds_until(10_400, 0), 10);
        assert_eq!(seconds_until(10_600, 0), 11);
        assert_eq!(seconds_until(0, 400), 0);
        assert_eq!(seconds_until(0, 5_000), -5);
    }

    #[test]
    fn new_rejects_invalid_configuration() {
        let store = MemoryStore::new();
        let bad = TimerConfiguration {
            work_duration: 0,
            ..config()
        };
        assert!(IntervalEngine::new(bad, &store, RecordingNotifier::default()).is_err());
    }

    #[test]
    fn start_arms_ticker_and_persists_deadline() {
        let store = MemoryStore::new();
        let (mut engine, _clock, ticker, _) = engine(&store);

        let events = engine.start().unwrap();
        assert!(matches!(events[0], Event::TimerStarted { deadline_epoch_ms: 1_010_000, .. }));
        assert!(engine.is_running());
        assert_eq!(ticker.armed_generation(), Some(engine.generation()));
        assert_eq!(
            ClockStore::new(&store).load().unwrap(),
            Some(PersistedClock::Running {
                deadline_epoch_ms: 1_010_000,
                phase: Phase::Work,
                cycle_count: 0,
            })
        );
    }

    #[test]
    fn starting_twice_is_a_no_op() {
        let store = MemoryStore::new();
        let (mut engine, _, _, _) = engine(&store);
        engine.start().unwrap();
        let generation = engine.generation();
        assert!(engine.start().unwrap().is_empty());
        assert_eq!(engine.generation(), generation);
    }

    #[test]
    fn stale_tick_after_pause_is_dropped() {
        let store = MemoryStore::new();
        let (mut engine, clock, ticker, _) = engine(&store);
        engine.start().unwrap();
        let queued = ticker.fire().unwrap();

        clock.advance_secs(1);
        engine.pause().unwrap();
        assert!(!ticker.is_armed());

        let remaining = engine.remaining_seconds();
        assert!(engine.handle_tick(queued).unwrap().is_empty());
        assert_eq!(engine.remaining_seconds(), remaining);
    }

    #[test]
    fn stale_tick_from_before_restart_is_dropped() {
        let store = MemoryStore::new();
        let (mut engine, _, ticker, _) = engine(&store);
        engine.start().unwrap();
        let old = ticker.fire().unwrap();
        engine.pause().unwrap();
        engine.start().unwrap();

        assert!(engine.handle_tick(old).unwrap().is_empty());
        assert_eq!(engine.remaining_seconds(), 10);
        let fresh = ticker.fire().unwrap();
        assert_eq!(engine.handle_tick(fresh).unwrap().len(), 1);
    }

    #[test]
    fn tick_follows_deadline_when_ticks_were_missed() {
        let store = MemoryStore::new();
        let (mut engine, clock, _, _) = engine(&store);
        engine.start().unwrap();

        clock.advance_secs(4);
        engine.tick().unwrap();
        assert_eq!(engine.remaining_seconds(), 6);
    }

    #[test]
    fn completion_in_progress_is_rejected() {
        let store = MemoryStore::new();
        let (mut engine, _, _, notifier) = engine(&store);
        engine.status = EngineStatus::Completing;

        let err = engine.skip().unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::Timer(TimerError::CompletionInProgress)
        ));
        assert!(engine.start().is_err());
        assert!(notifier.notices.borrow().is_empty());
    }

    #[test]
    fn failed_notifier_leaves_countdown_running_for_retry() {
        let store = MemoryStore::new();
        let (mut engine, clock, ticker, notifier) = engine(&store);
        engine.start().unwrap();
        *notifier.fail.borrow_mut() = true;

        clock.advance_secs(10);
        assert!(engine.tick().is_err());
        assert_eq!(engine.status(), EngineStatus::Running);
        assert_eq!(engine.phase(), Phase::Work);
        assert!(ticker.is_armed());

        *notifier.fail.borrow_mut() = false;
        let events = engine.tick().unwrap();
        assert!(events.iter().any(|e| matches!(e, Event::PhaseCompleted { .. })));
        assert_eq!(notifier.notices.borrow().len(), 1);
        assert_eq!(engine.phase(), Phase::ShortBreak);
    }

    #[test]
    fn completion_notice_carries_deadline_as_key() {
        let store = MemoryStore::new();
        let (mut engine, clock, _, notifier) = engine(&store);
        engine.start().unwrap();
        clock.advance_secs(10);
        engine.tick().unwrap();

        let notices = notifier.notices.borrow();
        assert_eq!(notices[0].completion_key, Some(1_010_000));
        assert_eq!(notices[0].new_cycle_index, Some(1));
    }

    #[test]
    fn tick_listeners_receive_remaining_seconds() {
        let store = MemoryStore::new();
        let (mut engine, clock, _, _) = engine(&store);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        engine.on_tick(move |remaining| sink.borrow_mut().push(remaining));

        engine.start().unwrap();
        for _ in 0..3 {
            clock.advance_secs(1);
            engine.tick().unwrap();
        }
        assert_eq!(*seen.borrow(), vec![9, 8, 7]);
    }

    #[test]
    fn change_mode_keeps_cycle_count_and_stops() {
        let store = MemoryStore::new();
        let (mut engine, _, ticker, _) = engine(&store);
        engine.skip().unwrap();
        engine.skip().unwrap();
        assert_eq!(engine.cycle_count(), 1);

        engine.start().unwrap();
        let events = engine.change_mode(Phase::LongBreak).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(engine.phase(), Phase::LongBreak);
        assert_eq!(engine.remaining_seconds(), 6);
        assert_eq!(engine.cycle_count(), 1);
        assert!(!engine.is_running());
        assert!(!ticker.is_armed());
        assert_eq!(ClockStore::new(&store).load().unwrap(), None);

        assert!(engine.change_mode(Phase::LongBreak).unwrap().is_empty());
    }

    #[test]
    fn reset_restores_full_duration_and_clears_clock() {
        let store = MemoryStore::new();
        let (mut engine, clock, _, _) = engine(&store);
        engine.start().unwrap();
        clock.advance_secs(4);
        engine.tick().unwrap();

        engine.reset().unwrap();
        assert_eq!(engine.remaining_seconds(), 10);
        assert!(!engine.is_running());
        assert_eq!(ClockStore::new(&store).load().unwrap(), None);
    }

    #[test]
    fn snapshot_reports_state() {
        let store = MemoryStore::new();
        let (engine, _, _, _) = engine(&store);
        match engine.snapshot() {
            Event::StateSnapshot {
                status,
                phase,
                remaining_seconds,
                running,
                ..
            } => {
                assert_eq!(status, EngineStatus::Idle);
                assert_eq!(phase, Phase::Work);
                assert_eq!(remaining_seconds, 10);
                assert!(!running);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }
}
