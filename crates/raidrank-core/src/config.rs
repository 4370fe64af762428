//! Application configuration management.
//!
//! This module handles loading and saving the configuration, which holds
//! the quorum rules, the raid catalog for the current tier, and the API
//! connection settings.
//!
//! Configuration is stored at `~/.config/raidrank/config.json`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::ApiSettings;
use crate::error::CatalogError;
use crate::models::{validate_catalog, RaidDefinition};
use crate::progress::{
    ProgressRules, DEFAULT_MAX_CHARACTER_LEVEL, DEFAULT_QUORUM, DEFAULT_ROUNDING_SECS,
};

/// Application name used for config/data directory paths
const APP_NAME: &str = "raidrank";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Minimum roster size for a new group to be tracked.
const DEFAULT_MIN_GROUP_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub quorum: usize,
    pub rounding_secs: u32,
    pub max_character_level: u32,
    pub min_group_size: usize,
    pub api: ApiSettings,
    pub catalog: Vec<RaidDefinition>,
    /// Overrides the platform data directory for the group store.
    pub data_dir: Option<PathBuf>,
    /// Directory for daily log files; logs go to stderr only when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quorum: DEFAULT_QUORUM,
            rounding_secs: DEFAULT_ROUNDING_SECS,
            max_character_level: DEFAULT_MAX_CHARACTER_LEVEL,
            min_group_size: DEFAULT_MIN_GROUP_SIZE,
            api: ApiSettings::default(),
            catalog: default_catalog(),
            data_dir: None,
            log_dir: None,
        }
    }
}

/// Raid catalog shipped as the default until a config file names another tier.
pub fn default_catalog() -> Vec<RaidDefinition> {
    vec![RaidDefinition::new(
        "bod",
        "Battle of Dazar'alor",
        &[
            "Champion of the Light",
            "Jadefire Masters",
            "Grong, the Revenant",
            "Opulence",
            "Conclave of the Chosen",
            "King Rastakhan",
            "High Tinker Mekkatorque",
            "Stormwall Blockade",
            "Lady Jaina Proudmoore",
        ],
    )]
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            Ok(serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn rules(&self) -> ProgressRules {
        ProgressRules {
            quorum: self.quorum,
            rounding_secs: self.rounding_secs,
            max_character_level: self.max_character_level,
        }
    }

    /// Full raid names, as the API reports them.
    pub fn raid_names(&self) -> Vec<String> {
        self.catalog.iter().map(|r| r.name.clone()).collect()
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.quorum == 0 {
            return Err(CatalogError::InvalidSetting("quorum must be at least 1".to_string()));
        }
        if self.rounding_secs == 0 {
            return Err(CatalogError::InvalidSetting(
                "rounding_secs must be at least 1".to_string(),
            ));
        }
        validate_catalog(&self.catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rules(), ProgressRules::default());
        assert_eq!(config.raid_names(), vec!["Battle of Dazar'alor".to_string()]);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{"quorum": 8, "api": {"region": "eu"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.quorum, 8);
        assert_eq!(config.rounding_secs, 60);
        assert_eq!(config.api.region, "eu");
        assert_eq!(config.api.locale, "en_US");
        assert_eq!(config.catalog, default_catalog());
    }

    #[test]
    fn test_validate_rejects_zero_settings() {
        let config = Config {
            quorum: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(CatalogError::InvalidSetting(_))));

        let config = Config {
            rounding_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_data_dir_override() {
        let config = Config {
            data_dir: Some(PathBuf::from("/tmp/raidrank-test")),
            ..Config::default()
        };
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/raidrank-test"));
    }
}
