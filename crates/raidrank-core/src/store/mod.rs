//! Persistence for groups and kill history.
//!
//! This module defines the `GroupStore` and `HistorySink` collaborators and
//! two implementations:
//! - `FileStore`: pretty-printed JSON files under a data directory
//! - `MemoryStore`: in-process maps, for dry runs and tests
//!
//! Layout of a `FileStore` directory:
//! - `groups/<normalized name>.json`
//! - `history/<YYYY-MM-DD>.json`
//! - `meta.json` (time of the last completed batch)

pub mod file;
pub mod memory;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{ChangeSet, Group, HistoryContainer, HistoryEntry};

pub use file::{FileStore, StoredData};
pub use memory::MemoryStore;

/// Storage for groups, keyed by name.
pub trait GroupStore {
    fn get_by_name(&self, name: &str) -> Result<Option<Group>>;

    /// All groups, ordered by name.
    fn get_all(&self) -> Result<Vec<Group>>;

    fn save(&self, group: &Group) -> Result<()>;

    /// Time the last batch over all groups completed.
    fn last_updated(&self) -> Result<Option<DateTime<Utc>>>;

    fn set_last_updated(&self, at: DateTime<Utc>) -> Result<()>;
}

/// Append-only storage for dated history entries.
pub trait HistorySink {
    /// The container for `date`, empty if nothing was recorded yet.
    fn get_or_create_for_date(&self, date: NaiveDate) -> Result<HistoryContainer>;

    fn append(&self, container: &mut HistoryContainer, group: &str, changes: &ChangeSet) {
        container.append(group, changes);
    }

    fn save_container(&self, container: &HistoryContainer) -> Result<()>;

    /// Every entry for one group, newest first.
    fn for_group(&self, group: &str) -> Result<Vec<HistoryEntry>>;
}
