pub mod config;
pub mod stats;
pub mod timer;

use std::rc::Rc;

use focusloop_core::{
    Config, Database, Event, HttpStatsRecorder, IntervalEngine, RewardCatalog, StatsNotifier,
};

pub type CliEngine = IntervalEngine<Rc<Database>, StatsNotifier<Rc<Database>>>;

/// Build an engine over the local database. Completed work phases go to the
/// local log, and to the remote stats API when enabled. The remote recorder
/// is returned as well so a caller driving a runtime can flush it.
pub fn open_engine(
    config: &Config,
) -> Result<(CliEngine, Option<HttpStatsRecorder>), Box<dyn std::error::Error>> {
    let db = Rc::new(Database::open()?);

    let mut notifier =
        StatsNotifier::new(Rc::clone(&db), RewardCatalog::default()).with_recorder(Rc::clone(&db));
    let remote = if config.stats_api.enabled {
        let recorder = HttpStatsRecorder::from_config(&config.stats_api)?;
        notifier = notifier.with_recorder(recorder.clone());
        Some(recorder)
    } else {
        None
    };

    let engine = IntervalEngine::new(config.timer.clone(), db, notifier)?;
    Ok((engine, remote))
}

pub fn print_events(events: &[Event]) -> Result<(), serde_json::Error> {
    for event in events {
        println!("{}", serde_json::to_string_pretty(event)?);
    }
    Ok(())
}

/// `MM:SS`, minutes unbounded.
pub fn format_remaining(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
