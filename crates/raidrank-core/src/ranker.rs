//! Group processing.
//!
//! `Ranker` ties the collaborators together: it loads character data for a
//! group, reconciles it against stored progress, and persists the new group
//! state together with the day's history entry. A dry run computes exactly
//! the same result and skips the writes.

use std::cmp::Reverse;
use std::fmt;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{error, info, warn};

use crate::api::CharacterDataSource;
use crate::models::{ChangeSet, Difficulty, Group, RaidDefinition};
use crate::notify::{self, Notifier};
use crate::progress::{reconcile, ProgressRules};
use crate::store::{GroupStore, HistorySink};

/// Outcome of processing one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub group: String,
    pub changes: ChangeSet,
    pub failed_characters: usize,
    pub violations: usize,
    pub avg_ilvl: u32,
    pub persisted: bool,
}

impl fmt::Display for GroupSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} data generated", self.group)?;
        if !self.changes.is_empty() {
            write!(f, " ({} new kills)", self.changes.total_kills())?;
        }
        if self.failed_characters > 0 {
            write!(f, " [{} characters unavailable]", self.failed_characters)?;
        }
        if !self.persisted {
            write!(f, " (dry run)")?;
        }
        Ok(())
    }
}

/// Outcome of processing every stored group.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub lines: Vec<String>,
    pub processed: usize,
    pub failed: usize,
    pub new_kills: usize,
}

pub struct Ranker<S, G, H> {
    source: S,
    store: G,
    history: H,
    catalog: Vec<RaidDefinition>,
    rules: ProgressRules,
}

impl<S, G, H> Ranker<S, G, H>
where
    S: CharacterDataSource,
    G: GroupStore,
    H: HistorySink,
{
    pub fn new(
        source: S,
        store: G,
        history: H,
        catalog: Vec<RaidDefinition>,
        rules: ProgressRules,
    ) -> Self {
        Self {
            source,
            store,
            history,
            catalog,
            rules,
        }
    }

    pub fn store(&self) -> &G {
        &self.store
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn catalog(&self) -> &[RaidDefinition] {
        &self.catalog
    }

    /// Process one group now. See `process_group_at`.
    pub async fn process_group(&self, group: Group, persist: bool) -> Result<GroupSummary> {
        self.process_group_at(group, persist, Utc::now()).await
    }

    /// Fetch, reconcile and (when `persist` is set) store one group.
    ///
    /// The group and its history entry for `now`'s date are written together:
    /// if the history write fails the previous group state is restored.
    pub async fn process_group_at(
        &self,
        group: Group,
        persist: bool,
        now: DateTime<Utc>,
    ) -> Result<GroupSummary> {
        info!(group = %group.name, toons = group.toons.len(), persist, "Processing group");

        let original = group.clone();
        let mut prior = group;
        if prior.ensure_catalog(&self.catalog) {
            info!(group = %prior.name, "Added catalog raids missing from stored progress");
        }

        let records = self.source.load(&prior.toons).await;
        let result = reconcile(&prior, &self.catalog, &records, &self.rules)
            .with_context(|| format!("Failed to reconcile group {}", prior.name))?;

        let mut updated = result.group;
        updated.last_updated = Some(now);

        if persist {
            self.commit(&original, &updated, &result.changes, now.date_naive())?;
        }

        let summary = GroupSummary {
            group: updated.name.clone(),
            changes: result.changes,
            failed_characters: records.iter().filter(|r| r.is_failed()).count(),
            violations: result.violations.len(),
            avg_ilvl: updated.avg_ilvl,
            persisted: persist,
        };
        info!(group = %summary.group, new_kills = summary.changes.total_kills(), "Finished group");
        Ok(summary)
    }

    fn commit(
        &self,
        original: &Group,
        updated: &Group,
        changes: &ChangeSet,
        date: NaiveDate,
    ) -> Result<()> {
        if changes.is_empty() {
            return self.store.save(updated);
        }

        let mut container = self.history.get_or_create_for_date(date)?;
        self.history.append(&mut container, &updated.name, changes);

        self.store.save(updated)?;
        if let Err(e) = self.history.save_container(&container) {
            if let Err(rollback) = self.store.save(original) {
                error!(
                    group = %original.name,
                    error = %rollback,
                    "Failed to restore group after history write failure"
                );
            }
            return Err(e.context(format!("Failed to record history for {}", updated.name)));
        }
        Ok(())
    }

    /// Process a stored group by name. `None` when no such group exists.
    pub async fn process_by_name(&self, name: &str, persist: bool) -> Result<Option<GroupSummary>> {
        match self.store.get_by_name(name)? {
            Some(group) => Ok(Some(self.process_group(group, persist).await?)),
            None => {
                info!(group = %name, "No stored group with that name");
                Ok(None)
            }
        }
    }

    /// Process every stored group, one at a time.
    ///
    /// A failing group is logged and skipped. When persisting, the global
    /// last-updated time is recorded at the end.
    pub async fn process_all(&self, persist: bool) -> Result<BatchSummary> {
        let groups = self.store.get_all()?;
        let mut batch = BatchSummary::default();

        for group in groups {
            let name = group.name.clone();
            match self.process_group(group, persist).await {
                Ok(summary) => {
                    batch.processed += 1;
                    batch.new_kills += summary.changes.total_kills();
                    batch.lines.push(summary.to_string());
                }
                Err(e) => {
                    error!(group = %name, error = %e, "Group processing failed");
                    batch.failed += 1;
                    batch.lines.push(format!("{} failed: {}", name, e));
                }
            }
        }

        if persist {
            self.store.set_last_updated(Utc::now())?;
        }
        Ok(batch)
    }

    /// Publish the unannounced history for `date` and mark it announced.
    pub fn announce<N: Notifier + ?Sized>(&self, date: NaiveDate, notifier: &N) -> Result<usize> {
        let mut container = self.history.get_or_create_for_date(date)?;
        if container.unannounced().next().is_none() {
            info!(%date, "Nothing to announce");
            return Ok(0);
        }

        let published = notify::announce(&mut container, &self.catalog, notifier);
        self.history.save_container(&container)?;
        if published == 0 {
            warn!(%date, "No announcements were published");
        }
        Ok(published)
    }
}

/// Sort groups for display in one raid: mythic, then heroic, then normal
/// kills, most first, then by name.
pub fn rank_groups(groups: &mut [Group], raid_slug: &str) {
    groups.sort_by_key(|g| {
        let counts = g
            .raid(raid_slug)
            .map(|r| Difficulty::ALL.map(|d| r.count(d)))
            .unwrap_or_default();
        (
            Reverse(counts[2]),
            Reverse(counts[1]),
            Reverse(counts[0]),
            g.name.clone(),
        )
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StaticSource;
    use crate::models::{CharacterKillRecord, HistoryContainer, HistoryEntry};
    use crate::store::MemoryStore;
    use anyhow::anyhow;
    use chrono::TimeZone;
    use std::cell::RefCell;

    const RAID: &str = "Battle of Dazar'alor";
    const T: i64 = 1_549_400_400_000;

    fn catalog() -> Vec<RaidDefinition> {
        vec![RaidDefinition::new("bod", RAID, &["A", "B"])]
    }

    fn toons(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("toon{}", i)).collect()
    }

    /// `n` characters that killed A on normal at T.
    fn source(n: usize) -> StaticSource {
        toons(n)
            .into_iter()
            .map(|name| {
                let mut record = CharacterKillRecord::new(name);
                record.add_kill(RAID, "A", Difficulty::Normal, T);
                record.level = Some(120);
                record.average_item_level = Some(410);
                record
            })
            .collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 2, 6, 9, 0, 0).unwrap()
    }

    fn ranker(src: StaticSource) -> Ranker<StaticSource, MemoryStore, MemoryStore> {
        Ranker::new(
            src,
            MemoryStore::new(),
            MemoryStore::new(),
            catalog(),
            ProgressRules::default(),
        )
    }

    #[tokio::test]
    async fn test_process_group_persists_state_and_history() {
        let ranker = ranker(source(5));
        let group = Group::new("Raided-X", toons(5), &catalog());

        let summary = ranker.process_group_at(group, true, now()).await.unwrap();
        assert_eq!(summary.changes.total_kills(), 1);
        assert_eq!(summary.avg_ilvl, 410);
        assert_eq!(summary.to_string(), "Raided-X data generated (1 new kills)");

        let stored = ranker.store().get_by_name("Raided-X").unwrap().unwrap();
        assert_eq!(stored.raid("bod").unwrap().count(Difficulty::Normal), 1);
        assert_eq!(stored.last_updated, Some(now()));

        let container = ranker.history().get_or_create_for_date(now().date_naive()).unwrap();
        let entry = container.entry("Raided-X").unwrap();
        assert_eq!(entry.changes[0].killed, vec!["A"]);
        assert_eq!(entry.changes[0].new_total, 1);
    }

    #[tokio::test]
    async fn test_dry_run_computes_but_does_not_write() {
        let ranker = ranker(source(5));
        let group = Group::new("Raided-X", toons(5), &catalog());

        let summary = ranker.process_group_at(group, false, now()).await.unwrap();
        assert_eq!(summary.changes.total_kills(), 1);
        assert!(summary.to_string().ends_with("(dry run)"));
        assert!(ranker.store().get_by_name("Raided-X").unwrap().is_none());
        let day = ranker.history().get_or_create_for_date(now().date_naive()).unwrap();
        assert!(day.is_empty());
    }

    #[tokio::test]
    async fn test_second_pass_records_no_history() {
        let ranker = ranker(source(5));
        ranker.store().save(&Group::new("g", toons(5), &catalog())).unwrap();

        let first = ranker.process_by_name("g", true).await.unwrap().unwrap();
        let second = ranker.process_by_name("g", true).await.unwrap().unwrap();
        assert_eq!(first.changes.total_kills(), 1);
        assert!(second.changes.is_empty());

        let entries: Vec<HistoryEntry> = ranker.history().for_group("g").unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_group_by_name() {
        let ranker = ranker(source(5));
        assert!(ranker.process_by_name("nobody", true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_characters_count_as_failed() {
        let ranker = ranker(source(3));
        let group = Group::new("g", toons(5), &catalog());

        let summary = ranker.process_group_at(group, true, now()).await.unwrap();
        assert_eq!(summary.failed_characters, 2);
        assert!(summary.changes.is_empty());
    }

    #[tokio::test]
    async fn test_old_group_is_migrated_to_catalog() {
        let ranker = ranker(source(5));
        let group = Group::new("g", toons(5), &[]);

        let summary = ranker.process_group_at(group, true, now()).await.unwrap();
        assert_eq!(summary.changes.total_kills(), 1);
        let stored = ranker.store().get_by_name("g").unwrap().unwrap();
        assert_eq!(stored.raid("bod").unwrap().bosses.len(), 2);
    }

    #[tokio::test]
    async fn test_process_all() {
        let ranker = ranker(source(5));
        ranker.store().save(&Group::new("one", toons(5), &catalog())).unwrap();
        ranker.store().save(&Group::new("two", toons(2), &catalog())).unwrap();

        let batch = ranker.process_all(true).await.unwrap();
        assert_eq!(batch.processed, 2);
        assert_eq!(batch.failed, 0);
        assert_eq!(batch.new_kills, 1);
        assert_eq!(batch.lines.len(), 2);
        assert!(ranker.store().last_updated().unwrap().is_some());
    }

    struct BrokenHistory;

    impl HistorySink for BrokenHistory {
        fn get_or_create_for_date(&self, date: NaiveDate) -> Result<HistoryContainer> {
            Ok(HistoryContainer::new(date))
        }

        fn save_container(&self, _container: &HistoryContainer) -> Result<()> {
            Err(anyhow!("disk full"))
        }

        fn for_group(&self, _group: &str) -> Result<Vec<HistoryEntry>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_history_failure_restores_group() {
        let ranker = Ranker::new(
            source(5),
            MemoryStore::new(),
            BrokenHistory,
            catalog(),
            ProgressRules::default(),
        );
        let group = Group::new("g", toons(5), &catalog());
        ranker.store().save(&group).unwrap();

        assert!(ranker.process_group_at(group.clone(), true, now()).await.is_err());
        assert_eq!(ranker.store().get_by_name("g").unwrap(), Some(group));
    }

    #[derive(Default)]
    struct Recorder {
        sent: RefCell<Vec<String>>,
    }

    impl Notifier for Recorder {
        fn publish(&self, text: &str) -> Result<()> {
            self.sent.borrow_mut().push(text.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_announce_marks_history() {
        let ranker = ranker(source(5));
        let group = Group::new("Raided-X", toons(5), &catalog());
        ranker.process_group_at(group, true, now()).await.unwrap();

        let recorder = Recorder::default();
        let date = now().date_naive();
        assert_eq!(ranker.announce(date, &recorder).unwrap(), 1);
        assert_eq!(
            recorder.sent.borrow()[0],
            "Raided-X killed 1 new boss in Normal Battle of Dazar'alor to be 1/2N!"
        );
        assert_eq!(ranker.announce(date, &recorder).unwrap(), 0);
    }

    #[test]
    fn test_rank_groups() {
        let mut a = Group::new("alpha", vec![], &catalog());
        a.raid_mut("bod").unwrap().counts.set(Difficulty::Heroic, 2);
        let mut b = Group::new("bravo", vec![], &catalog());
        b.raid_mut("bod").unwrap().counts.set(Difficulty::Mythic, 1);
        let mut c = Group::new("charlie", vec![], &catalog());
        c.raid_mut("bod").unwrap().counts.set(Difficulty::Heroic, 2);
        c.raid_mut("bod").unwrap().counts.set(Difficulty::Normal, 2);
        let d = Group::new("delta", vec![], &[]);

        let mut groups = vec![d, a, c, b];
        rank_groups(&mut groups, "bod");
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["bravo", "charlie", "alpha", "delta"]);
    }
}
