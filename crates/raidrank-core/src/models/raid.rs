//! Raid catalog types.
//!
//! A catalog is a plain list of `RaidDefinition` values passed in from
//! configuration. It is replaced wholesale when a new tier is released.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Raid difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Normal,
    Heroic,
    Mythic,
}

impl Difficulty {
    /// All difficulties, easiest first.
    pub const ALL: [Difficulty; 3] = [Difficulty::Normal, Difficulty::Heroic, Difficulty::Mythic];

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Normal => "Normal",
            Difficulty::Heroic => "Heroic",
            Difficulty::Mythic => "Mythic",
        }
    }

    /// Single-letter suffix used in progress strings like `7/9H`.
    pub fn initial(&self) -> char {
        match self {
            Difficulty::Normal => 'N',
            Difficulty::Heroic => 'H',
            Difficulty::Mythic => 'M',
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One value per difficulty, indexed by `Difficulty`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerDifficulty<T> {
    #[serde(default)]
    pub normal: T,
    #[serde(default)]
    pub heroic: T,
    #[serde(default)]
    pub mythic: T,
}

impl<T> PerDifficulty<T> {
    pub fn get(&self, difficulty: Difficulty) -> &T {
        match difficulty {
            Difficulty::Normal => &self.normal,
            Difficulty::Heroic => &self.heroic,
            Difficulty::Mythic => &self.mythic,
        }
    }

    pub fn get_mut(&mut self, difficulty: Difficulty) -> &mut T {
        match difficulty {
            Difficulty::Normal => &mut self.normal,
            Difficulty::Heroic => &mut self.heroic,
            Difficulty::Mythic => &mut self.mythic,
        }
    }

    pub fn set(&mut self, difficulty: Difficulty, value: T) {
        *self.get_mut(difficulty) = value;
    }
}

/// A raid instance as configured for the current tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidDefinition {
    /// Short key used to address the raid in stored progress (e.g. `nya`).
    pub slug: String,
    /// Full name as reported by the progression API.
    pub name: String,
    /// Bosses in encounter order.
    pub bosses: Vec<String>,
}

impl RaidDefinition {
    pub fn new(slug: impl Into<String>, name: impl Into<String>, bosses: &[&str]) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            bosses: bosses.iter().map(|b| b.to_string()).collect(),
        }
    }

    pub fn boss_count(&self) -> usize {
        self.bosses.len()
    }
}

/// Check a catalog for structural problems before it is used.
pub fn validate_catalog(catalog: &[RaidDefinition]) -> Result<(), CatalogError> {
    if catalog.is_empty() {
        return Err(CatalogError::Empty);
    }

    let mut slugs = HashSet::new();
    for raid in catalog {
        if !slugs.insert(raid.slug.as_str()) {
            return Err(CatalogError::DuplicateRaid(raid.slug.clone()));
        }
        if raid.bosses.is_empty() {
            return Err(CatalogError::NoBosses(raid.slug.clone()));
        }
        let mut bosses = HashSet::new();
        for boss in &raid.bosses {
            if !bosses.insert(boss.as_str()) {
                return Err(CatalogError::DuplicateBoss {
                    raid: raid.slug.clone(),
                    boss: boss.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raid(slug: &str, bosses: &[&str]) -> RaidDefinition {
        RaidDefinition::new(slug, slug.to_uppercase(), bosses)
    }

    #[test]
    fn test_per_difficulty_indexing() {
        let mut counts: PerDifficulty<u32> = PerDifficulty::default();
        counts.set(Difficulty::Heroic, 4);
        *counts.get_mut(Difficulty::Mythic) += 1;

        assert_eq!(*counts.get(Difficulty::Normal), 0);
        assert_eq!(*counts.get(Difficulty::Heroic), 4);
        assert_eq!(*counts.get(Difficulty::Mythic), 1);
    }

    #[test]
    fn test_difficulty_serializes_lowercase() {
        let json = serde_json::to_string(&Difficulty::Mythic).unwrap();
        assert_eq!(json, "\"mythic\"");
        assert_eq!(Difficulty::Heroic.initial(), 'H');
    }

    #[test]
    fn test_validate_catalog_ok() {
        let catalog = vec![raid("a", &["One", "Two"]), raid("b", &["Three"])];
        assert!(validate_catalog(&catalog).is_ok());
    }

    #[test]
    fn test_validate_catalog_rejects_problems() {
        assert_eq!(validate_catalog(&[]), Err(CatalogError::Empty));
        assert_eq!(
            validate_catalog(&[raid("a", &["One"]), raid("a", &["Two"])]),
            Err(CatalogError::DuplicateRaid("a".to_string()))
        );
        assert_eq!(
            validate_catalog(&[raid("a", &[])]),
            Err(CatalogError::NoBosses("a".to_string()))
        );
        assert!(matches!(
            validate_catalog(&[raid("a", &["One", "One"])]),
            Err(CatalogError::DuplicateBoss { .. })
        ));
    }
}
