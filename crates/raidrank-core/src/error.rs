use thiserror::Error;

/// Configuration bugs in the raid catalog or in a group's stored shape.
///
/// These are never raised for absent or failed character data, only when the
/// catalog and the stored progress structurally disagree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Catalog is empty")]
    Empty,

    #[error("Raid {0} has no bosses")]
    NoBosses(String),

    #[error("Duplicate raid slug in catalog: {0}")]
    DuplicateRaid(String),

    #[error("Duplicate boss {boss} in raid {raid}")]
    DuplicateBoss { raid: String, boss: String },

    #[error("Group {group} has no progress for raid {raid}")]
    MissingRaid { group: String, raid: String },

    #[error("Group {group} has no progress for boss {boss} in raid {raid}")]
    MissingBoss {
        group: String,
        raid: String,
        boss: String,
    },

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}
