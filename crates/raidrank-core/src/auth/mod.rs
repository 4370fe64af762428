//! API key storage.
//!
//! The progression API key is kept in the OS keychain via `CredentialStore`.
//! `RAIDRANK_API_KEY` in the environment (or a `.env` file) takes precedence.

pub mod credentials;

pub use credentials::{resolve_api_key, CredentialStore, API_KEY_ENV};
