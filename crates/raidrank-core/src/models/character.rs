use serde::{Deserialize, Serialize};

use super::raid::{Difficulty, PerDifficulty};

// ============================================================================
// API response types
// ============================================================================

/// Character profile as returned by the progression API
/// (`fields=progression,items`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CharacterResponse {
    pub name: Option<String>,
    pub realm: Option<String>,
    pub level: Option<u32>,
    pub items: Option<ItemsResponse>,
    pub progression: Option<ProgressionResponse>,
    /// `"nok"` when the API could not produce the character.
    pub status: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ItemsResponse {
    #[serde(rename = "averageItemLevel")]
    pub average_item_level: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProgressionResponse {
    #[serde(default)]
    pub raids: Vec<RaidResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaidResponse {
    pub name: String,
    #[serde(default)]
    pub bosses: Vec<BossResponse>,
}

// Timestamps are epoch milliseconds; zero means never killed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossResponse {
    pub name: String,
    #[serde(rename = "normalTimestamp", default)]
    pub normal_timestamp: i64,
    #[serde(rename = "heroicTimestamp", default)]
    pub heroic_timestamp: i64,
    #[serde(rename = "mythicTimestamp", default)]
    pub mythic_timestamp: i64,
}

impl CharacterResponse {
    pub fn is_error(&self) -> bool {
        self.status.as_deref() == Some("nok")
    }

    /// Convert to a kill record, keeping only the raids named in `raid_names`.
    pub fn to_record(&self, character: &str, raid_names: &[String]) -> CharacterKillRecord {
        let raids = self
            .progression
            .as_ref()
            .map(|p| {
                p.raids
                    .iter()
                    .filter(|r| raid_names.iter().any(|n| n == &r.name))
                    .map(RaidKills::from_api)
                    .collect()
            })
            .unwrap_or_default();

        CharacterKillRecord {
            character: character.to_string(),
            level: self.level,
            average_item_level: self.items.as_ref().and_then(|i| i.average_item_level),
            raids,
        }
    }
}

// ============================================================================
// Domain types
// ============================================================================

/// Raw kill data for one character, fetched fresh on every pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterKillRecord {
    pub character: String,
    pub level: Option<u32>,
    pub average_item_level: Option<u32>,
    pub raids: Vec<RaidKills>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaidKills {
    pub name: String,
    pub bosses: Vec<BossKills>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BossKills {
    pub name: String,
    pub timestamps: PerDifficulty<Vec<i64>>,
}

impl RaidKills {
    fn from_api(raid: &RaidResponse) -> Self {
        Self {
            name: raid.name.clone(),
            bosses: raid
                .bosses
                .iter()
                .map(|b| BossKills {
                    name: b.name.clone(),
                    timestamps: PerDifficulty {
                        normal: nonzero(b.normal_timestamp),
                        heroic: nonzero(b.heroic_timestamp),
                        mythic: nonzero(b.mythic_timestamp),
                    },
                })
                .collect(),
        }
    }
}

fn nonzero(ts: i64) -> Vec<i64> {
    if ts == 0 {
        Vec::new()
    } else {
        vec![ts]
    }
}

impl CharacterKillRecord {
    pub fn new(character: impl Into<String>) -> Self {
        Self {
            character: character.into(),
            ..Default::default()
        }
    }

    /// Observed kill timestamps for one boss at one difficulty.
    ///
    /// A raid or boss missing from the record yields an empty slice, which
    /// callers treat as "no observed kill".
    pub fn kill_timestamps(&self, raid_name: &str, boss: &str, difficulty: Difficulty) -> &[i64] {
        self.raids
            .iter()
            .find(|r| r.name == raid_name)
            .and_then(|r| r.bosses.iter().find(|b| b.name == boss))
            .map(|b| b.timestamps.get(difficulty).as_slice())
            .unwrap_or(&[])
    }

    /// Record a kill, creating the raid and boss entries as needed.
    #[cfg(test)]
    pub fn add_kill(&mut self, raid_name: &str, boss: &str, difficulty: Difficulty, ts: i64) {
        let raid = match self.raids.iter().position(|r| r.name == raid_name) {
            Some(i) => &mut self.raids[i],
            None => {
                self.raids.push(RaidKills {
                    name: raid_name.to_string(),
                    bosses: Vec::new(),
                });
                let last = self.raids.len() - 1;
                &mut self.raids[last]
            }
        };
        let entry = match raid.bosses.iter().position(|b| b.name == boss) {
            Some(i) => &mut raid.bosses[i],
            None => {
                raid.bosses.push(BossKills {
                    name: boss.to_string(),
                    timestamps: PerDifficulty::default(),
                });
                let last = raid.bosses.len() - 1;
                &mut raid.bosses[last]
            }
        };
        entry.timestamps.get_mut(difficulty).push(ts);
    }
}

/// A character that could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub character: String,
    pub reason: String,
}

/// One entry per requested character: either kill data or a failure marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CharacterRecord {
    Loaded(CharacterKillRecord),
    Failed(FetchFailure),
}

impl CharacterRecord {
    pub fn failed(character: impl Into<String>, reason: impl Into<String>) -> Self {
        CharacterRecord::Failed(FetchFailure {
            character: character.into(),
            reason: reason.into(),
        })
    }

    pub fn character(&self) -> &str {
        match self {
            CharacterRecord::Loaded(r) => &r.character,
            CharacterRecord::Failed(f) => &f.character,
        }
    }

    /// Kill data, or `None` for a failed fetch.
    pub fn kills(&self) -> Option<&CharacterKillRecord> {
        match self {
            CharacterRecord::Loaded(r) => Some(r),
            CharacterRecord::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CharacterRecord::Failed(_))
    }
}

impl From<CharacterKillRecord> for CharacterRecord {
    fn from(record: CharacterKillRecord) -> Self {
        CharacterRecord::Loaded(record)
    }
}
