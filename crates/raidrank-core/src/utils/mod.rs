//! Utility functions for name normalization and display formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{
    normalize_group_name, normalize_realm, parse_character_id, truncate_string, CharacterId,
};
