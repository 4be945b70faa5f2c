//! The seam between the dispatcher and the external messaging service.
//!
//! The dispatcher only ever talks to a [`Messenger`], obtained from a
//! [`MessengerFactory`] once the credentials have been validated. The real
//! implementation lives in [`telegram`]; tests substitute recording fakes.
pub mod telegram;

use crate::config::TelegramSettings;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Acknowledgment returned by the messaging service for a delivered message.
#[derive(Debug, Clone, PartialEq)]
pub struct Ack {
    pub message_id: i64,
    pub chat_id: i64,
    pub sent_at: Option<DateTime<Utc>>,
}

/// A failed send. Never carries the bot token.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to the messaging service failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("messaging service rejected the request ({}): {description}", .code.map_or_else(|| "no code".to_string(), |c| c.to_string()))]
    Api {
        code: Option<i64>,
        description: String,
    },
    #[error("unexpected response from messaging service (HTTP {status}): {body}")]
    UnexpectedResponse { status: u16, body: String },
    #[error("could not read document {}: {source}", .path.display())]
    Document {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DeliveryError {
    /// Maps a `reqwest` error, dropping the request URL since it embeds the token.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Transport(err.without_url())
        }
    }
}

/// A client that can deliver messages to a chat.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends a text message.
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<Ack, DeliveryError>;

    /// Uploads a file, with an optional caption.
    async fn send_document(
        &self,
        chat_id: &str,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<Ack, DeliveryError>;
}

/// Builds a [`Messenger`] bound to a bot token.
pub trait MessengerFactory: Send + Sync {
    type Messenger: Messenger;

    fn connect(
        &self,
        bot_token: &str,
        settings: &TelegramSettings,
    ) -> Result<Self::Messenger, DeliveryError>;
}
