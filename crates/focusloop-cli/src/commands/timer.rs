use std::time::Duration;

use clap::Subcommand;
use focusloop_core::{Config, Event, HttpStatsRecorder, Phase, TokioTicker};

use super::{format_remaining, open_engine, print_events, CliEngine};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start or resume the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Restart the current phase from its full duration
    Reset,
    /// Move to the next phase without recording the current one
    Skip,
    /// Switch to a phase (work, short_break, long_break)
    Mode {
        phase: Phase,
    },
    /// Print current timer state as JSON
    Status,
    /// Run the countdown in the foreground until the phase ends or Ctrl-C
    Run,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let (mut engine, remote) = open_engine(&config)?;

    if let TimerAction::Run = action {
        return run_foreground(engine, remote);
    }

    // Catch-up completions discovered on load are reported like any other.
    print_events(&engine.initialize()?)?;

    let events = match action {
        TimerAction::Start => engine.start()?,
        TimerAction::Pause => engine.pause()?,
        TimerAction::Reset => engine.reset()?,
        TimerAction::Skip => engine.skip()?,
        TimerAction::Mode { phase } => engine.change_mode(phase)?,
        TimerAction::Status | TimerAction::Run => Vec::new(),
    };
    print_events(&events)?;
    println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
    Ok(())
}

/// Upper bound on waiting for remote deliveries before the runtime goes away.
const DELIVERY_GRACE: Duration = Duration::from_secs(15);

fn run_foreground(
    engine: CliEngine,
    remote: Option<HttpStatsRecorder>,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let (ticker, mut ticks) = TokioTicker::every_second();
        let mut engine = engine.with_ticker(ticker);
        engine.on_tick(|remaining| eprintln!("{}", format_remaining(remaining)));

        print_events(&engine.initialize()?)?;
        if !engine.is_running() {
            print_events(&engine.start()?)?;
        }

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        let mut phase_done = false;
        while engine.is_running() && !phase_done {
            tokio::select! {
                Some(tick) = ticks.recv() => {
                    let events: Vec<Event> = engine
                        .handle_tick(tick)?
                        .into_iter()
                        .filter(|e| !matches!(e, Event::Tick { .. }))
                        .collect();
                    phase_done = events.iter().any(|e| matches!(e, Event::PhaseAdvanced { .. }));
                    print_events(&events)?;
                }
                _ = &mut shutdown => {
                    tracing::info!("interrupted; pausing timer");
                    print_events(&engine.pause()?)?;
                }
            }
        }

        println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);

        if let Some(remote) = &remote {
            remote.flush(DELIVERY_GRACE).await;
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
