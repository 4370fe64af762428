//! Group progress models.
//!
//! A `Group` owns one `RaidProgress` per tracked raid, each holding the
//! per-boss kill markers and the derived per-difficulty kill counts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::raid::{Difficulty, PerDifficulty, RaidDefinition};

/// Kill markers for a single boss.
///
/// A marker is the canonical kill time for that difficulty, or `None` while
/// the kill is unconfirmed. Markers are never cleared once set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossProgress {
    pub name: String,
    #[serde(default)]
    pub killed: PerDifficulty<Option<DateTime<Utc>>>,
}

impl BossProgress {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            killed: PerDifficulty::default(),
        }
    }

    pub fn is_killed(&self, difficulty: Difficulty) -> bool {
        self.killed.get(difficulty).is_some()
    }

    pub fn killed_at(&self, difficulty: Difficulty) -> Option<DateTime<Utc>> {
        *self.killed.get(difficulty)
    }
}

/// Progress for one raid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidProgress {
    pub slug: String,
    /// Stored kill count per difficulty. Never decreases.
    #[serde(default)]
    pub counts: PerDifficulty<u32>,
    pub bosses: Vec<BossProgress>,
}

impl RaidProgress {
    /// Fresh progress with every boss unconfirmed.
    pub fn new(raid: &RaidDefinition) -> Self {
        Self {
            slug: raid.slug.clone(),
            counts: PerDifficulty::default(),
            bosses: raid.bosses.iter().map(BossProgress::new).collect(),
        }
    }

    pub fn count(&self, difficulty: Difficulty) -> u32 {
        *self.counts.get(difficulty)
    }

    /// Number of bosses carrying a kill marker for `difficulty`.
    pub fn killed_count(&self, difficulty: Difficulty) -> u32 {
        self.bosses.iter().filter(|b| b.is_killed(difficulty)).count() as u32
    }

    pub fn boss(&self, name: &str) -> Option<&BossProgress> {
        self.bosses.iter().find(|b| b.name == name)
    }

    pub fn boss_mut(&mut self, name: &str) -> Option<&mut BossProgress> {
        self.bosses.iter_mut().find(|b| b.name == name)
    }

    /// Progress string such as `7/9H`.
    pub fn progress_string(&self, difficulty: Difficulty, total: usize) -> String {
        format!("{}/{}{}", self.count(difficulty), total, difficulty.initial())
    }
}

/// A raid group: its roster and its progress in each tracked raid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    /// Roster entries, `name` or `name/Realm`.
    pub toons: Vec<String>,
    pub raids: Vec<RaidProgress>,
    #[serde(default)]
    pub avg_ilvl: u32,
    pub roster_updated: Option<NaiveDate>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Group {
    /// Create a group with unconfirmed progress for every raid in the catalog.
    pub fn new(name: impl Into<String>, toons: Vec<String>, catalog: &[RaidDefinition]) -> Self {
        Self {
            name: name.into(),
            toons,
            raids: catalog.iter().map(RaidProgress::new).collect(),
            avg_ilvl: 0,
            roster_updated: None,
            last_updated: None,
        }
    }

    pub fn raid(&self, slug: &str) -> Option<&RaidProgress> {
        self.raids.iter().find(|r| r.slug == slug)
    }

    pub fn raid_mut(&mut self, slug: &str) -> Option<&mut RaidProgress> {
        self.raids.iter_mut().find(|r| r.slug == slug)
    }

    /// Bring stored progress in line with a (possibly new) catalog.
    ///
    /// Raids and bosses missing from the group are added unconfirmed. Entries
    /// the catalog no longer names are left alone. Returns whether anything
    /// was added.
    pub fn ensure_catalog(&mut self, catalog: &[RaidDefinition]) -> bool {
        let mut changed = false;
        for def in catalog {
            match self.raid_mut(&def.slug) {
                Some(raid) => {
                    for boss in &def.bosses {
                        if raid.boss(boss).is_none() {
                            raid.bosses.push(BossProgress::new(boss));
                            changed = true;
                        }
                    }
                }
                None => {
                    self.raids.push(RaidProgress::new(def));
                    changed = true;
                }
            }
        }
        changed
    }
}
