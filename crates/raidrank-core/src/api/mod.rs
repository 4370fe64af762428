//! Character data source backed by the character progression REST API.
//!
//! This module provides the `ApiClient` for fetching per-character raid
//! progression and item level data, and the `CharacterDataSource` trait the
//! ranker depends on.
//!
//! Requests are authenticated with an API key passed as a query parameter.

pub mod client;
pub mod error;
pub mod static_source;

pub use client::{ApiClient, ApiSettings, CharacterDataSource};
pub use static_source::StaticSource;
pub use error::ApiError;
