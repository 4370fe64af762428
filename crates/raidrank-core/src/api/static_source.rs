use std::collections::HashMap;

use crate::models::{CharacterKillRecord, CharacterRecord};

use super::CharacterDataSource;

/// Character data source over preloaded records.
///
/// Used for replaying saved API data and in tests. Ids without a record come
/// back as failed fetches, the same way an unreachable character would.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: HashMap<String, CharacterKillRecord>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: CharacterKillRecord) {
        self.records.insert(record.character.clone(), record);
    }
}

impl FromIterator<CharacterKillRecord> for StaticSource {
    fn from_iter<I: IntoIterator<Item = CharacterKillRecord>>(iter: I) -> Self {
        let mut source = Self::new();
        for record in iter {
            source.insert(record);
        }
        source
    }
}

impl CharacterDataSource for StaticSource {
    async fn load(&self, character_ids: &[String]) -> Vec<CharacterRecord> {
        character_ids
            .iter()
            .map(|id| match self.records.get(id) {
                Some(record) => CharacterRecord::Loaded(record.clone()),
                None => CharacterRecord::failed(id.as_str(), "no data"),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_preserves_order_and_marks_missing() {
        let source: StaticSource = ["a", "b"]
            .iter()
            .map(|n| CharacterKillRecord::new(*n))
            .collect();
        let ids = vec!["b".to_string(), "zzz".to_string(), "a".to_string()];

        let records = source.load(&ids).await;
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].character(), "b");
        assert!(records[1].is_failed());
        assert_eq!(records[2].character(), "a");
    }
}
