use clap::Subcommand;
use focusloop_core::Config;

use super::{open_engine, print_events};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "timer.work_duration", "stats_api.enabled")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

/// Hand the saved timer settings to the engine so a stopped countdown picks
/// up the new duration. A running countdown keeps its deadline.
fn apply_to_timer(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let (mut engine, _remote) = open_engine(config)?;
    print_events(&engine.initialize()?)?;
    print_events(&engine.update_configuration(config.timer.clone())?)?;
    Ok(())
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            if key.starts_with("timer.") {
                apply_to_timer(&config)?;
            }
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            apply_to_timer(&config)?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
