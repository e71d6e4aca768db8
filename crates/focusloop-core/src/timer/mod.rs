mod clock;
mod configuration;
mod engine;
mod phase;
mod ticker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use configuration::TimerConfiguration;
pub use engine::{EngineStatus, IntervalEngine, IntervalState};
pub use phase::{advance_cycle, next_phase, should_auto_start, Phase};
pub use ticker::{ManualTicker, Tick, Ticker, TokioTicker};
