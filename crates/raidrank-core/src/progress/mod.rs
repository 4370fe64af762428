//! Progress inference.
//!
//! - `resolver`: decides whether a quorum of characters killed one boss at
//!   one difficulty, and when
//! - `reconciler`: applies the resolver across a group's raids and merges
//!   the result into stored progress without ever regressing it

pub mod reconciler;
pub mod resolver;

pub use reconciler::{
    average_item_level, reconcile, MonotonicityViolation, ProgressRules, Reconciliation,
    DEFAULT_MAX_CHARACTER_LEVEL,
};
pub use resolver::{
    resolve_kill, round_timestamp, QuorumRule, DEFAULT_QUORUM, DEFAULT_ROUNDING_SECS,
};
