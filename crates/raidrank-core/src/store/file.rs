use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{Group, HistoryContainer, HistoryEntry};
use crate::utils::normalize_group_name;

use super::{GroupStore, HistorySink};

const GROUPS_DIR: &str = "groups";
const HISTORY_DIR: &str = "history";
const META_FILE: &str = "meta.json";

/// File contents wrapped with the time they were written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredData<T> {
    pub data: T,
    pub saved_at: DateTime<Utc>,
}

impl<T> StoredData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            saved_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.saved_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

/// JSON file store for groups and history.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(dir.join(GROUPS_DIR))
            .with_context(|| format!("Failed to create store directory: {}", dir.display()))?;
        std::fs::create_dir_all(dir.join(HISTORY_DIR))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn group_path(&self, name: &str) -> PathBuf {
        self.dir
            .join(GROUPS_DIR)
            .join(format!("{}.json", normalize_group_name(name)))
    }

    fn history_path(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(HISTORY_DIR)
            .join(format!("{}.json", date.format("%Y-%m-%d")))
    }

    fn read_file<T: DeserializeOwned>(path: &Path) -> Result<Option<StoredData<T>>> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read store file: {}", path.display()))?;

        let stored: StoredData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse store file: {}", path.display()))?;

        Ok(Some(stored))
    }

    /// Write through a temp file and rename so readers never see a partial file.
    fn write_file<T: Serialize>(path: &Path, data: &T) -> Result<()> {
        let stored = StoredData::new(data);
        let contents = serde_json::to_string_pretty(&stored)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write store file: {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace store file: {}", path.display()))?;
        Ok(())
    }

    fn json_files(&self, sub: &str) -> Result<Vec<PathBuf>> {
        let dir = self.dir.join(sub);
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&dir)
            .with_context(|| format!("Failed to list {}", dir.display()))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Human readable age of the last completed batch, e.g. `5m ago`.
    pub fn last_updated_display(&self) -> String {
        match Self::read_file::<DateTime<Utc>>(&self.dir.join(META_FILE)) {
            Ok(Some(stored)) => stored.age_display(),
            Ok(None) => "never".to_string(),
            Err(e) => {
                debug!(error = %e, "Failed to load meta for age display");
                "unknown".to_string()
            }
        }
    }
}

impl GroupStore for FileStore {
    fn get_by_name(&self, name: &str) -> Result<Option<Group>> {
        // Distinct names can share a file key; only an exact name is a match
        Ok(Self::read_file::<Group>(&self.group_path(name))?
            .map(|s| s.data)
            .filter(|g| g.name == name))
    }

    fn get_all(&self) -> Result<Vec<Group>> {
        let mut groups = Vec::new();
        for path in self.json_files(GROUPS_DIR)? {
            match Self::read_file::<Group>(&path) {
                Ok(Some(stored)) => groups.push(stored.data),
                Ok(None) => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable group file")
                }
            }
        }
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }

    fn save(&self, group: &Group) -> Result<()> {
        let path = self.group_path(&group.name);
        match Self::read_file::<Group>(&path) {
            Ok(Some(existing)) if existing.data.name != group.name => {
                bail!(
                    "Group name {:?} collides with stored group {:?} ({})",
                    group.name,
                    existing.data.name,
                    path.display()
                );
            }
            Ok(_) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Replacing unreadable group file"),
        }
        Self::write_file(&path, group)
    }

    fn last_updated(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(Self::read_file::<DateTime<Utc>>(&self.dir.join(META_FILE))?.map(|s| s.data))
    }

    fn set_last_updated(&self, at: DateTime<Utc>) -> Result<()> {
        Self::write_file(&self.dir.join(META_FILE), &at)
    }
}

impl HistorySink for FileStore {
    fn get_or_create_for_date(&self, date: NaiveDate) -> Result<HistoryContainer> {
        Ok(Self::read_file::<HistoryContainer>(&self.history_path(date))?
            .map(|s| s.data)
            .unwrap_or_else(|| HistoryContainer::new(date)))
    }

    fn save_container(&self, container: &HistoryContainer) -> Result<()> {
        Self::write_file(&self.history_path(container.date), container)
    }

    fn for_group(&self, group: &str) -> Result<Vec<HistoryEntry>> {
        let mut entries = Vec::new();
        for path in self.json_files(HISTORY_DIR)?.iter().rev() {
            if let Some(stored) = Self::read_file::<HistoryContainer>(path)? {
                entries.extend(stored.data.entries.into_iter().filter(|e| e.group == group));
            }
        }
        Ok(entries)
    }
}
