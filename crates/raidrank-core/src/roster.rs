//! Roster updates for stored groups.
//!
//! Importers hand over a group name and its character list. New groups are
//! only created once they have enough characters to ever reach a quorum;
//! existing groups get their roster replaced and keep their progress.

use anyhow::Result;
use chrono::NaiveDate;
use tracing::info;

use crate::models::{Group, RaidDefinition};
use crate::store::GroupStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterOutcome {
    Created,
    Updated,
    /// New group below the minimum size; nothing stored.
    Skipped,
}

impl RosterOutcome {
    pub fn stored(&self) -> bool {
        !matches!(self, RosterOutcome::Skipped)
    }
}

pub fn import_roster<S: GroupStore + ?Sized>(
    store: &S,
    name: &str,
    toons: Vec<String>,
    catalog: &[RaidDefinition],
    min_group_size: usize,
    today: NaiveDate,
) -> Result<RosterOutcome> {
    let mut toons: Vec<String> = toons
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    toons.sort();
    toons.dedup();

    let outcome = match store.get_by_name(name)? {
        Some(mut group) => {
            group.toons = toons;
            group.roster_updated = Some(today);
            store.save(&group)?;
            RosterOutcome::Updated
        }
        None if toons.len() >= min_group_size => {
            let mut group = Group::new(name, toons, catalog);
            group.roster_updated = Some(today);
            store.save(&group)?;
            RosterOutcome::Created
        }
        None => RosterOutcome::Skipped,
    };

    info!(group = %name, outcome = ?outcome, "Roster imported");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;
    use crate::store::MemoryStore;

    fn catalog() -> Vec<RaidDefinition> {
        vec![RaidDefinition::new("bod", "Battle of Dazar'alor", &["A", "B"])]
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 3, 1).unwrap()
    }

    fn toons(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("toon{}", i)).collect()
    }

    #[test]
    fn test_small_new_group_is_skipped() {
        let store = MemoryStore::new();
        let outcome = import_roster(&store, "tiny", toons(4), &catalog(), 5, today()).unwrap();
        assert_eq!(outcome, RosterOutcome::Skipped);
        assert!(!outcome.stored());
        assert!(store.get_by_name("tiny").unwrap().is_none());
    }

    #[test]
    fn test_new_group_is_created_sorted() {
        let store = MemoryStore::new();
        let roster: Vec<String> = ["Zed", "abe", "Mid", "Zed", " ", "Kay", "Lou"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let outcome = import_roster(&store, "g", roster, &catalog(), 5, today()).unwrap();
        assert_eq!(outcome, RosterOutcome::Created);

        let group = store.get_by_name("g").unwrap().unwrap();
        assert_eq!(group.toons, vec!["Kay", "Lou", "Mid", "Zed", "abe"]);
        assert_eq!(group.roster_updated, Some(today()));
        assert!(group.raid("bod").is_some());
    }

    #[test]
    fn test_existing_group_keeps_progress() {
        let store = MemoryStore::new();
        let mut group = Group::new("g", toons(6), &catalog());
        group.raid_mut("bod").unwrap().counts.set(Difficulty::Heroic, 2);
        store.save(&group).unwrap();

        // existing groups are updated even below the minimum size
        let outcome = import_roster(&store, "g", toons(3), &catalog(), 5, today()).unwrap();
        assert_eq!(outcome, RosterOutcome::Updated);

        let group = store.get_by_name("g").unwrap().unwrap();
        assert_eq!(group.toons.len(), 3);
        assert_eq!(group.raid("bod").unwrap().count(Difficulty::Heroic), 2);
    }
}
