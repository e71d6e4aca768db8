use chrono::Utc;
use clap::Subcommand;
use focusloop_core::{Database, RewardCatalog, UserStats};
use serde_json::json;

#[derive(Subcommand)]
pub enum StatsAction {
    /// All-time totals
    Show,
    /// Today's progress
    Today,
    /// Reward milestones and which are unlocked
    Rewards,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let stats = UserStats::load(&db)?;
    let now = Utc::now();

    let output = match action {
        StatsAction::Show => {
            let log = db.summary(now)?;
            json!({
                "total_completed_work_phases": stats.total_completed_work_phases,
                "total_focus_seconds": stats.total_focus_seconds,
                "total_break_seconds": stats.total_break_seconds,
                "unlocked_rewards": stats.unlocked_rewards,
                "logged_work_phases": log.completed_work_phases,
                "recent": db.recent_completions(5)?,
            })
        }
        StatsAction::Today => {
            let day = stats.day(now);
            json!({
                "date": now.format("%Y-%m-%d").to_string(),
                "work_phases": day.work_phases,
                "focus_seconds": day.focus_seconds,
                "break_seconds": day.break_seconds,
            })
        }
        StatsAction::Rewards => {
            let catalog = RewardCatalog::default();
            let milestones: Vec<_> = catalog
                .milestones()
                .iter()
                .map(|m| {
                    json!({
                        "id": m.id,
                        "name": m.name,
                        "kind": m.kind,
                        "threshold_count": m.threshold_count,
                        "unlocked": stats.unlocked_rewards.contains(&m.id),
                    })
                })
                .collect();
            json!({
                "completed_work_phases": stats.total_completed_work_phases,
                "next": catalog.next_after(stats.total_completed_work_phases),
                "milestones": milestones,
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
