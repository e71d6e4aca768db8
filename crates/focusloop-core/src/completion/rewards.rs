//! Milestone rewards unlocked by completed work phases.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardKind {
    Title,
    Frame,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub name: String,
    pub kind: RewardKind,
    /// Completed work phases required.
    pub threshold_count: u64,
}

impl Milestone {
    fn new(id: &str, name: &str, kind: RewardKind, threshold_count: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            threshold_count,
        }
    }
}

/// Read-only milestone table, kept sorted by threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardCatalog {
    milestones: Vec<Milestone>,
}

impl RewardCatalog {
    pub fn new(mut milestones: Vec<Milestone>) -> Self {
        milestones.sort_by(|a, b| {
            a.threshold_count
                .cmp(&b.threshold_count)
                .then_with(|| a.id.cmp(&b.id))
        });
        Self { milestones }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    pub fn get(&self, id: &str) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.id == id)
    }

    /// Milestones reached at `completed` work phases that are not in `unlocked`.
    pub fn newly_unlocked<'a>(&'a self, completed: u64, unlocked: &[String]) -> Vec<&'a Milestone> {
        self.milestones
            .iter()
            .take_while(|m| m.threshold_count <= completed)
            .filter(|m| !unlocked.iter().any(|id| *id == m.id))
            .collect()
    }

    /// The next milestone still ahead of `completed`, if any.
    pub fn next_after(&self, completed: u64) -> Option<&Milestone> {
        self.milestones
            .iter()
            .find(|m| m.threshold_count > completed)
    }
}

impl Default for RewardCatalog {
    /// Titles and profile frames; thresholds assume 25-minute work phases.
    fn default() -> Self {
        use RewardKind::{Frame, Title};
        Self::new(vec![
            Milestone::new("title-novice", "Novice Focus", Title, 0),
            Milestone::new("title-apprentice", "Apprentice Timer", Title, 10),
            Milestone::new("title-ninja", "Focus Ninja", Title, 20),
            Milestone::new("title-prodigy", "Pomodoro Prodigy", Title, 50),
            Milestone::new("title-master", "Focus Master", Title, 100),
            Milestone::new("title-legend", "Time Lord", Title, 250),
            Milestone::new("frame-basic", "Bronze Border", Frame, 0),
            Milestone::new("frame-silver", "Silver Shine", Frame, 12),
            Milestone::new("frame-fire", "Fire Edge", Frame, 25),
            Milestone::new("frame-gold", "Golden Glory", Frame, 40),
            Milestone::new("frame-green", "Emerald Energy", Frame, 75),
            Milestone::new("frame-ice", "Ice Glow", Frame, 150),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_sorted_by_threshold() {
        let catalog = RewardCatalog::default();
        let thresholds: Vec<u64> = catalog.milestones().iter().map(|m| m.threshold_count).collect();
        let mut sorted = thresholds.clone();
        sorted.sort_unstable();
        assert_eq!(thresholds, sorted);
    }

    #[test]
    fn first_completion_unlocks_zero_threshold_rewards() {
        let catalog = RewardCatalog::default();
        let ids: Vec<&str> = catalog
            .newly_unlocked(1, &[])
            .into_iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, vec!["frame-basic", "title-novice"]);
    }

    #[test]
    fn already_unlocked_rewards_are_skipped() {
        let catalog = RewardCatalog::default();
        let unlocked = vec!["frame-basic".to_string(), "title-novice".to_string()];
        let fresh = catalog.newly_unlocked(12, &unlocked);
        let ids: Vec<&str> = fresh.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["title-apprentice", "frame-silver"]);
    }

    #[test]
    fn next_after_points_at_upcoming_milestone() {
        let catalog = RewardCatalog::default();
        assert_eq!(catalog.next_after(10).map(|m| m.id.as_str()), Some("frame-silver"));
        assert!(catalog.next_after(1_000).is_none());
    }
}
