//! Data models for raid progress tracking.
//!
//! This module contains all the data structures used to represent
//! progress data including:
//!
//! - `RaidDefinition`, `Difficulty`: the externally configured raid catalog
//! - `CharacterKillRecord`, `CharacterRecord`: raw per-character kill data
//! - `Group`, `RaidProgress`, `BossProgress`: a group's stored progress
//! - `ChangeSet`, `HistoryEntry`, `HistoryContainer`: dated kill history

pub mod character;
pub mod group;
pub mod history;
pub mod raid;

pub use character::{
    BossKills, CharacterKillRecord, CharacterRecord, CharacterResponse, FetchFailure, RaidKills,
};
pub use group::{BossProgress, Group, RaidProgress};
pub use history::{ChangeSet, HistoryContainer, HistoryEntry, RaidChange};
pub use raid::{validate_catalog, Difficulty, PerDifficulty, RaidDefinition};
