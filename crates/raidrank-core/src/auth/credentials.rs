use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

const SERVICE_NAME: &str = "raidrank";

/// Keychain account under which the API key is stored.
const API_KEY_ACCOUNT: &str = "progression-api";

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "RAIDRANK_API_KEY";

pub struct CredentialStore;

impl CredentialStore {
    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, API_KEY_ACCOUNT).context("Failed to create keyring entry")
    }

    /// Store the API key in the OS keychain
    pub fn store_api_key(key: &str) -> Result<()> {
        Self::entry()?
            .set_password(key)
            .context("Failed to store API key in keychain")?;
        Ok(())
    }

    /// Retrieve the API key from the OS keychain
    pub fn get_api_key() -> Result<String> {
        Self::entry()?
            .get_password()
            .context("Failed to retrieve API key from keychain")
    }

    /// Delete the stored API key
    pub fn delete_api_key() -> Result<()> {
        Self::entry()?
            .delete_credential()
            .context("Failed to delete API key from keychain")?;
        Ok(())
    }

    /// Check if an API key is stored
    pub fn has_api_key() -> bool {
        Self::entry().map(|e| e.get_password().is_ok()).unwrap_or(false)
    }
}

/// API key from the environment, falling back to the keychain.
pub fn resolve_api_key() -> Result<String> {
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => {
            debug!("Using API key from environment");
            Ok(key.trim().to_string())
        }
        _ => CredentialStore::get_api_key().with_context(|| {
            format!("No API key found. Set {} or run `raidrank set-api-key`.", API_KEY_ENV)
        }),
    }
}
