//! Announcement of new kills.
//!
//! This module provides:
//! - `Notifier`: publishes a text message somewhere outside the system
//! - `LogNotifier`: publishes by logging, used when no external target is set
//! - `announce`: turns a day's unannounced history into messages
//!
//! Publishing is best effort. Failures are logged and never stop the batch.

pub mod announce;

use anyhow::Result;
use tracing::info;

pub use announce::{announce, kill_message, MAX_MESSAGE_LENGTH};

/// External publisher for announcement text.
pub trait Notifier {
    fn publish(&self, text: &str) -> Result<()>;
}

/// Notifier that writes each message to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn publish(&self, text: &str) -> Result<()> {
        info!(message = %text, "Announcement");
        Ok(())
    }
}
