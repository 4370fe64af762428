use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::raid::Difficulty;

/// New kills for one raid at one difficulty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidChange {
    pub raid: String,
    pub difficulty: Difficulty,
    /// Bosses that flipped to killed, in encounter order.
    pub killed: Vec<String>,
    pub new_total: u32,
}

/// Everything that newly changed for a group in one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub changes: Vec<RaidChange>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn total_kills(&self) -> usize {
        self.changes.iter().map(|c| c.killed.len()).sum()
    }
}

/// Dated record of a group's new kills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Group name. Not an owning reference; history outlives the group.
    pub group: String,
    pub date: NaiveDate,
    pub changes: Vec<RaidChange>,
    #[serde(default)]
    pub announced: bool,
}

impl HistoryEntry {
    /// Fold a later pass from the same day into this entry.
    fn merge(&mut self, changes: &ChangeSet) {
        for change in &changes.changes {
            match self
                .changes
                .iter_mut()
                .find(|c| c.raid == change.raid && c.difficulty == change.difficulty)
            {
                Some(existing) => {
                    for boss in &change.killed {
                        if !existing.killed.contains(boss) {
                            existing.killed.push(boss.clone());
                        }
                    }
                    existing.new_total = existing.new_total.max(change.new_total);
                }
                None => self.changes.push(change.clone()),
            }
        }
    }
}

/// All history entries recorded on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryContainer {
    pub date: NaiveDate,
    pub entries: Vec<HistoryEntry>,
}

impl HistoryContainer {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            entries: Vec::new(),
        }
    }

    /// Add a group's change set, merging with that group's entry for the day
    /// if one exists. Empty change sets are ignored.
    pub fn append(&mut self, group: &str, changes: &ChangeSet) {
        if changes.is_empty() {
            return;
        }
        match self.entries.iter_mut().find(|e| e.group == group) {
            Some(entry) => {
                entry.merge(changes);
                // new kills after an announcement need announcing too
                entry.announced = false;
            }
            None => {
                self.entries.push(HistoryEntry {
                    group: group.to_string(),
                    date: self.date,
                    changes: changes.changes.clone(),
                    announced: false,
                });
                self.entries.sort_by(|a, b| a.group.cmp(&b.group));
            }
        }
    }

    pub fn entry(&self, group: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.group == group)
    }

    pub fn unannounced(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().filter(|e| !e.announced)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
