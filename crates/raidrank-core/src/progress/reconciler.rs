//! Progress reconciliation for one group.
//!
//! Runs the kill-quorum resolver over every (raid, boss, difficulty) cell,
//! merges the result with the group's stored progress, and reports what
//! newly changed. Stored progress is a ratchet: a confirmed kill is never
//! cleared and a stored count never decreases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::CatalogError;
use crate::models::{
    ChangeSet, CharacterRecord, Difficulty, Group, PerDifficulty, RaidChange, RaidDefinition,
};

use super::resolver::{resolve_kill, QuorumRule, DEFAULT_QUORUM, DEFAULT_ROUNDING_SECS};

/// Default level cap for characters counted in the item level average.
pub const DEFAULT_MAX_CHARACTER_LEVEL: u32 = 120;

/// Settings that drive a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRules {
    pub quorum: usize,
    pub rounding_secs: u32,
    /// Only characters at exactly this level count toward the item level average.
    pub max_character_level: u32,
}

impl Default for ProgressRules {
    fn default() -> Self {
        Self {
            quorum: DEFAULT_QUORUM,
            rounding_secs: DEFAULT_ROUNDING_SECS,
            max_character_level: DEFAULT_MAX_CHARACTER_LEVEL,
        }
    }
}

impl ProgressRules {
    pub fn quorum_rule(&self) -> QuorumRule {
        QuorumRule {
            quorum: self.quorum,
            rounding_secs: self.rounding_secs,
        }
    }
}

/// A recomputed count that came out lower than the stored one.
///
/// The stored value is kept; this only records that it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonotonicityViolation {
    pub raid: String,
    pub difficulty: Difficulty,
    pub stored: u32,
    pub recomputed: u32,
}

/// Result of a reconciliation pass.
///
/// `group` and `changes` are meant to be persisted together or not at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub group: Group,
    pub changes: ChangeSet,
    pub violations: Vec<MonotonicityViolation>,
}

/// Reconcile a group's stored progress against freshly fetched character data.
///
/// Failed or missing character records count as "no observed kill". The
/// only error is a group whose stored progress lacks a raid or boss that the
/// catalog names; call `Group::ensure_catalog` first to migrate it.
pub fn reconcile(
    prior: &Group,
    catalog: &[RaidDefinition],
    records: &[CharacterRecord],
    rules: &ProgressRules,
) -> Result<Reconciliation, CatalogError> {
    let mut group = prior.clone();
    let mut changes = ChangeSet::default();
    let mut violations = Vec::new();
    let rule = rules.quorum_rule();

    let loaded: Vec<_> = records.iter().filter_map(CharacterRecord::kills).collect();
    let failed = records.len() - loaded.len();
    if failed > 0 {
        info!(group = %prior.name, failed, "Characters without data, treated as no observed kill");
    }
    if rules.quorum > loaded.len() {
        info!(
            group = %prior.name,
            quorum = rules.quorum,
            characters = loaded.len(),
            "Quorum exceeds available characters, no new kills possible"
        );
    }

    for def in catalog {
        let raid = group
            .raid_mut(&def.slug)
            .ok_or_else(|| CatalogError::MissingRaid {
                group: prior.name.clone(),
                raid: def.slug.clone(),
            })?;

        let mut killed_today: PerDifficulty<Vec<String>> = PerDifficulty::default();

        for boss_name in &def.bosses {
            let boss = raid
                .boss_mut(boss_name)
                .ok_or_else(|| CatalogError::MissingBoss {
                    group: prior.name.clone(),
                    raid: def.slug.clone(),
                    boss: boss_name.clone(),
                })?;

            for difficulty in Difficulty::ALL {
                if let Some(at) = boss.killed_at(difficulty) {
                    debug!(boss = %boss_name, difficulty = %difficulty, %at, "Already confirmed");
                    continue;
                }
                let times = loaded
                    .iter()
                    .flat_map(|r| r.kill_timestamps(&def.name, boss_name, difficulty))
                    .copied();
                let Some(kill_ms) = resolve_kill(times, &rule) else {
                    continue;
                };
                let Some(kill_time) = DateTime::<Utc>::from_timestamp_millis(kill_ms) else {
                    warn!(boss = %boss_name, kill_ms, "Kill time out of range, ignoring");
                    continue;
                };
                debug!(
                    group = %prior.name,
                    raid = %def.slug,
                    boss = %boss_name,
                    difficulty = %difficulty,
                    at = %kill_time,
                    "New kill"
                );
                boss.killed.set(difficulty, Some(kill_time));
                killed_today.get_mut(difficulty).push(boss_name.clone());
            }
        }

        for difficulty in Difficulty::ALL {
            let stored = raid.count(difficulty);
            let recomputed = raid.killed_count(difficulty);

            if recomputed > stored {
                raid.counts.set(difficulty, recomputed);
                changes.changes.push(RaidChange {
                    raid: def.slug.clone(),
                    difficulty,
                    killed: std::mem::take(killed_today.get_mut(difficulty)),
                    new_total: recomputed,
                });
            } else if recomputed < stored {
                warn!(
                    group = %prior.name,
                    raid = %def.slug,
                    difficulty = %difficulty,
                    stored,
                    recomputed,
                    "Recomputed kill count below stored count, keeping stored"
                );
                violations.push(MonotonicityViolation {
                    raid: def.slug.clone(),
                    difficulty,
                    stored,
                    recomputed,
                });
            }
        }
    }

    if let Some(avg) = average_item_level(records, rules.max_character_level) {
        group.avg_ilvl = avg;
    }

    Ok(Reconciliation {
        group,
        changes,
        violations,
    })
}

/// Mean item level over loaded characters at `max_level` that report one.
/// `None` when no character qualifies.
pub fn average_item_level(records: &[CharacterRecord], max_level: u32) -> Option<u32> {
    let (sum, n) = records
        .iter()
        .filter_map(CharacterRecord::kills)
        .filter(|r| r.level == Some(max_level))
        .filter_map(|r| r.average_item_level)
        .fold((0u64, 0u64), |(sum, n), ilvl| (sum + u64::from(ilvl), n + 1));

    if n == 0 {
        None
    } else {
        Some((sum / n) as u32)
    }
}
