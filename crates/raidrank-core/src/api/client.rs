//! API client for the character progression REST API.
//!
//! This module provides the `ApiClient` struct for fetching raid progression
//! and equipped item level for every character on a group's roster.

use std::time::{Duration, Instant};

use anyhow::Result;
use futures::stream::{self, StreamExt};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::models::{CharacterKillRecord, CharacterRecord, CharacterResponse};
use crate::utils::parse_character_id;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// The API is occasionally slow; 10s was too short under load.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Profile fields requested for each character.
const CHARACTER_FIELDS: &str = "progression,items";

/// Source of raw per-character kill data.
///
/// Implementations return exactly one entry per requested id, in request
/// order. A character that cannot be fetched is returned as
/// `CharacterRecord::Failed`; retry policy is the implementation's concern.
#[allow(async_fn_in_trait)]
pub trait CharacterDataSource {
    async fn load(&self, character_ids: &[String]) -> Vec<CharacterRecord>;
}

/// Connection settings for `ApiClient`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL; `{region}` is replaced with `region`.
    pub base_url: String,
    pub region: String,
    pub locale: String,
    /// Realm used for roster entries without an explicit realm.
    pub default_realm: String,
    /// Maximum concurrent character requests.
    pub max_concurrent_requests: usize,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://{region}.api.battle.net".to_string(),
            region: "us".to_string(),
            locale: "en_US".to_string(),
            default_realm: "aerie-peak".to_string(),
            max_concurrent_requests: 10,
        }
    }
}

/// Progression API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    api_key: String,
    settings: ApiSettings,
    /// Raids kept from each character's progression; the rest are dropped.
    raid_names: Vec<String>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(api_key: String, settings: ApiSettings, raid_names: Vec<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key,
            settings,
            raid_names,
        })
    }

    /// Build the profile URL for a roster entry.
    pub fn character_url(&self, entry: &str) -> Result<Url, ApiError> {
        let id = parse_character_id(entry, &self.settings.default_realm);
        let base = self.settings.base_url.replace("{region}", &self.settings.region);

        let mut url = Url::parse(&base).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| {
                ApiError::InvalidRequest(format!("Base URL cannot hold a path: {}", base))
            })?
            .pop_if_empty()
            .extend(["wow", "character", id.realm.as_str(), id.name.as_str()]);
        url.query_pairs_mut()
            .append_pair("fields", CHARACTER_FIELDS)
            .append_pair("locale", &self.settings.locale)
            .append_pair("apikey", &self.api_key);
        Ok(url)
    }

    /// Fetch one character's progression.
    pub async fn fetch_character(&self, entry: &str) -> Result<CharacterKillRecord, ApiError> {
        let url = self.character_url(entry)?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            // The API answers missing characters with a JSON body carrying a reason
            if let Ok(parsed) = serde_json::from_str::<CharacterResponse>(&text) {
                if parsed.is_error() {
                    let reason = parsed.reason.unwrap_or_else(|| status.to_string());
                    return Err(ApiError::Rejected(reason));
                }
            }
            return Err(ApiError::from_status(status, &text));
        }

        let parsed: CharacterResponse = serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", entry, e)))?;

        if parsed.is_error() {
            let reason = parsed.reason.unwrap_or_else(|| "unknown".to_string());
            return Err(ApiError::Rejected(reason));
        }

        debug!(
            character = %entry,
            name = ?parsed.name,
            realm = ?parsed.realm,
            level = ?parsed.level,
            "Character fetched"
        );
        Ok(parsed.to_record(entry, &self.raid_names))
    }
}

impl CharacterDataSource for ApiClient {
    async fn load(&self, character_ids: &[String]) -> Vec<CharacterRecord> {
        let start = Instant::now();
        let limit = self.settings.max_concurrent_requests.max(1);

        // `buffered` keeps results in request order
        let records: Vec<CharacterRecord> = stream::iter(character_ids)
            .map(|id| async move {
                match self.fetch_character(id).await {
                    Ok(record) => CharacterRecord::Loaded(record),
                    Err(ApiError::Rejected(reason)) => {
                        warn!(character = %id, reason = %reason, "API could not find character");
                        CharacterRecord::failed(id.as_str(), reason)
                    }
                    Err(e) if e.is_transient() => {
                        warn!(character = %id, error = %e, "Character fetch failed, will retry");
                        CharacterRecord::failed(id.as_str(), e.to_string())
                    }
                    Err(e) => {
                        error!(character = %id, error = %e, "Character fetch failed");
                        CharacterRecord::failed(id.as_str(), e.to_string())
                    }
                }
            })
            .buffered(limit)
            .collect()
            .await;

        let failed = records.iter().filter(|r| r.is_failed()).count();
        info!(
            characters = records.len(),
            failed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Character data retrieved"
        );
        records
    }
}
