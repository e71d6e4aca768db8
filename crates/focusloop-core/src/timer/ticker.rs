//! The one-second tick source owned by the interval engine.
//!
//! Every arm gets a fresh generation number from the engine. Ticks carry the
//! generation they were produced for, and the engine drops any tick whose
//! generation is not the current one. A tick that was already queued when the
//! timer paused therefore never reaches the countdown.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

pub trait Ticker {
    /// Begin producing one tick per period, tagged with `generation`.
    /// Re-arming replaces any previous schedule.
    fn arm(&mut self, generation: u64);

    /// Stop producing ticks. Must take effect before returning.
    fn disarm(&mut self);
}

/// Caller-driven ticker: nothing fires on its own.
///
/// Clones share state, so a test can keep a handle after boxing one into the
/// engine and ask for the tick the engine would currently accept.
#[derive(Debug, Clone, Default)]
pub struct ManualTicker {
    armed: Arc<Mutex<Option<u64>>>,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn armed_generation(&self) -> Option<u64> {
        self.armed.lock().ok().and_then(|g| *g)
    }

    pub fn is_armed(&self) -> bool {
        self.armed_generation().is_some()
    }

    /// The tick a real ticker would deliver now, if armed.
    pub fn fire(&self) -> Option<Tick> {
        self.armed_generation().map(|generation| Tick { generation })
    }
}

impl Ticker for ManualTicker {
    fn arm(&mut self, generation: u64) {
        if let Ok(mut armed) = self.armed.lock() {
            *armed = Some(generation);
        }
    }

    fn disarm(&mut self) {
        if let Ok(mut armed) = self.armed.lock() {
            *armed = None;
        }
    }
}

/// Ticker backed by a tokio interval task that feeds an mpsc channel.
///
/// Arming requires a running tokio runtime; the receiving half is polled by
/// whoever drives the engine.
pub struct TokioTicker {
    period: Duration,
    tx: mpsc::UnboundedSender<Tick>,
    handle: Option<JoinHandle<()>>,
}

impl TokioTicker {
    pub fn channel(period: Duration) -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let ticker = Self {
            period,
            tx,
            handle: None,
        };
        (ticker, rx)
    }

    pub fn every_second() -> (Self, mpsc::UnboundedReceiver<Tick>) {
        Self::channel(Duration::from_secs(1))
    }
}

impl Ticker for TokioTicker {
    fn arm(&mut self, generation: u64) {
        self.disarm();

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!(generation, "no tokio runtime available; ticker left disarmed");
                return;
            }
        };

        let tx = self.tx.clone();
        let period = self.period;
        let handle = runtime.spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tx.send(Tick { generation }).is_err() {
                    break;
                }
            }
        });
        self.handle = Some(handle);
    }

    fn disarm(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for TokioTicker {
    fn drop(&mut self) {
        self.disarm();
    }
}
