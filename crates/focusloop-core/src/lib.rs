//! # Focusloop Core Library
//!
//! Core logic for the Focusloop focus-interval timer. Every operation is
//! reachable through the standalone `focusloop` CLI, which is a thin layer
//! over this crate.
//!
//! ## Architecture
//!
//! - **Timer**: A deadline-based interval engine. Work and break phases
//!   alternate; the persisted deadline, not the tick stream, decides when a
//!   phase is over
//! - **Storage**: SQLite key-value and completion log, TOML configuration
//! - **Completion**: Stats, milestone rewards and the optional remote log,
//!   applied exactly once per finished phase
//!
//! ## Key Components
//!
//! - [`IntervalEngine`]: Core timer state machine
//! - [`ClockStore`]: Durable projection of the running or paused countdown
//! - [`StatsNotifier`]: Idempotent completion side effects
//! - [`Database`]: Local persistence
//! - [`Config`]: Application configuration management

pub mod completion;
pub mod error;
pub mod events;
pub mod storage;
pub mod timer;

pub use completion::{
    CompletionNotice, CompletionNotifier, CompletionReceipt, HttpStatsRecorder, RewardCatalog,
    StatsNotifier, StatsRecorder, UserStats,
};
pub use error::{ConfigError, CoreError, StorageError, TimerError, ValidationError};
pub use events::Event;
pub use storage::{ClockStore, Config, Database, KvStore, MemoryStore, PersistedClock};
pub use timer::{
    Clock, EngineStatus, IntervalEngine, IntervalState, ManualClock, ManualTicker, Phase,
    SystemClock, Tick, Ticker, TimerConfiguration, TokioTicker,
};
