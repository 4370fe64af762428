use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{Group, HistoryContainer, HistoryEntry};
use crate::utils::normalize_group_name;

use super::{GroupStore, HistorySink};

#[derive(Debug, Default)]
struct Inner {
    groups: BTreeMap<String, Group>,
    history: BTreeMap<NaiveDate, HistoryContainer>,
    last_updated: Option<DateTime<Utc>>,
}

/// In-memory group store and history sink.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| anyhow!("Memory store lock poisoned"))
    }
}

impl GroupStore for MemoryStore {
    fn get_by_name(&self, name: &str) -> Result<Option<Group>> {
        Ok(self.lock()?.groups.get(name).cloned())
    }

    fn get_all(&self) -> Result<Vec<Group>> {
        Ok(self.lock()?.groups.values().cloned().collect())
    }

    fn save(&self, group: &Group) -> Result<()> {
        let mut inner = self.lock()?;
        let key = normalize_group_name(&group.name);
        if let Some(other) = inner
            .groups
            .keys()
            .find(|n| **n != group.name && normalize_group_name(n) == key)
        {
            bail!("Group name {:?} collides with stored group {:?}", group.name, other);
        }
        inner.groups.insert(group.name.clone(), group.clone());
        Ok(())
    }

    fn last_updated(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.lock()?.last_updated)
    }

    fn set_last_updated(&self, at: DateTime<Utc>) -> Result<()> {
        self.lock()?.last_updated = Some(at);
        Ok(())
    }
}

impl HistorySink for MemoryStore {
    fn get_or_create_for_date(&self, date: NaiveDate) -> Result<HistoryContainer> {
        Ok(self
            .lock()?
            .history
            .get(&date)
            .cloned()
            .unwrap_or_else(|| HistoryContainer::new(date)))
    }

    fn save_container(&self, container: &HistoryContainer) -> Result<()> {
        self.lock()?.history.insert(container.date, container.clone());
        Ok(())
    }

    fn for_group(&self, group: &str) -> Result<Vec<HistoryEntry>> {
        Ok(self
            .lock()?
            .history
            .values()
            .rev()
            .flat_map(|c| c.entries.iter().filter(move |e| e.group == group).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colliding_group_names_are_rejected() {
        let store = MemoryStore::new();
        store.save(&Group::new("Raided X", vec![], &[])).unwrap();

        assert!(store.save(&Group::new("raided-x", vec![], &[])).is_err());
        // re-saving the same name is fine
        store.save(&Group::new("Raided X", vec!["a".into()], &[])).unwrap();

        let groups = store.get_all().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].toons, vec!["a"]);
    }
}
