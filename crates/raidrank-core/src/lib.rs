//! Core library for raidrank.
//!
//! Tracks raid boss kill progress for guild groups. Raw per-character kill
//! timestamps are fetched from the character progression API, collapsed into
//! group kills by a quorum vote, and merged into each group's stored progress
//! so that reported progress only ever moves forward.
//!
//! - `progress`: the kill-quorum resolver and the progress reconciler
//! - `models`: raid catalog, character records, group progress, history
//! - `api`: HTTP character data source
//! - `store`: group store and history sink (JSON files or in-memory)
//! - `notify`: announcement of new kills
//! - `ranker`: per-group and batch processing entry points

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod progress;
pub mod ranker;
pub mod roster;
pub mod store;
pub mod utils;

pub use api::{ApiClient, ApiError, CharacterDataSource};
pub use config::Config;
pub use error::CatalogError;
pub use models::{
    BossProgress, CharacterKillRecord, CharacterRecord, ChangeSet, Difficulty, Group,
    HistoryContainer, HistoryEntry, RaidChange, RaidDefinition, RaidProgress,
};
pub use progress::{reconcile, resolve_kill, ProgressRules, QuorumRule, Reconciliation};
pub use ranker::Ranker;
