//! A client for the Telegram Bot API.
//!
//! Sends messages via `POST /bot<token>/sendMessage` and files via
//! `POST /bot<token>/sendDocument`, and turns the JSON envelope returned by
//! the API into an [`Ack`] or a [`DeliveryError`].

use super::{Ack, DeliveryError, Messenger, MessengerFactory};
use crate::config::TelegramSettings;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Telegram `sendMessage` text limit, in UTF-16 code units.
pub const MESSAGE_LIMIT: usize = 4096;

const TRUNCATION_SUFFIX: &str = "\n\n[truncated]";

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    disable_notification: bool,
}

/// The envelope every Bot API method answers with.
#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    result: Option<ApiMessage>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Deserialize)]
struct ApiMessage {
    message_id: i64,
    chat: ApiChat,
    date: Option<i64>,
}

#[derive(Deserialize)]
struct ApiChat {
    id: i64,
}

impl From<ApiMessage> for Ack {
    fn from(message: ApiMessage) -> Self {
        Ack {
            message_id: message.message_id,
            chat_id: message.chat.id,
            sent_at: message.date.and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
        }
    }
}

/// A client bound to one bot token.
pub struct TelegramClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
    parse_mode: Option<String>,
    disable_notification: bool,
}

impl TelegramClient {
    /// Creates a new `TelegramClient` with the request timeout from `settings`.
    pub fn new(bot_token: &str, settings: &TelegramSettings) -> Result<Self, DeliveryError> {
        let timeout = settings.timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(DeliveryError::Client)?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}",
                settings.api_base_url.trim_end_matches('/'),
                bot_token
            ),
            timeout,
            parse_mode: settings.parse_mode.clone(),
            disable_notification: settings.disable_notification,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.endpoint, method)
    }

    /// Sends the request and interprets the Bot API envelope.
    async fn execute(&self, method: &str, request: RequestBuilder) -> Result<Ack, DeliveryError> {
        let response = request.send().await.map_err(|e| {
            let err = DeliveryError::from_reqwest(e, self.timeout);
            error!(method, error = %err, "HTTP request to Telegram failed");
            err
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DeliveryError::from_reqwest(e, self.timeout))?;

        let envelope: ApiResponse = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) => {
                error!(method, status = %status, body = %body, "Telegram returned a non-JSON response");
                return Err(DeliveryError::UnexpectedResponse {
                    status: status.as_u16(),
                    body,
                });
            }
        };

        if !envelope.ok {
            let code = envelope.error_code.or(Some(i64::from(status.as_u16())));
            let description = envelope
                .description
                .unwrap_or_else(|| status.to_string());
            warn!(method, ?code, description = %description, "Telegram rejected the request");
            return Err(DeliveryError::Api { code, description });
        }

        match envelope.result {
            Some(message) => {
                debug!(method, message_id = message.message_id, "Telegram acknowledged the request");
                Ok(message.into())
            }
            None => Err(DeliveryError::UnexpectedResponse {
                status: status.as_u16(),
                body,
            }),
        }
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    #[instrument(skip(self, text), fields(len = utf16_len(text)))]
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<Ack, DeliveryError> {
        let text = truncate_message(text, MESSAGE_LIMIT);
        let payload = SendMessage {
            chat_id,
            text: &text,
            parse_mode: self.parse_mode.as_deref(),
            disable_notification: self.disable_notification,
        };

        info!("Sending message to Telegram.");
        let request = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&payload);
        self.execute("sendMessage", request).await
    }

    #[instrument(skip(self, caption))]
    async fn send_document(
        &self,
        chat_id: &str,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<Ack, DeliveryError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| DeliveryError::Document {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", Part::bytes(bytes).file_name(file_name));
        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }
        if let Some(mode) = &self.parse_mode {
            form = form.text("parse_mode", mode.clone());
        }
        if self.disable_notification {
            form = form.text("disable_notification", "true");
        }

        info!("Uploading document to Telegram.");
        let request = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form);
        self.execute("sendDocument", request).await
    }
}

/// Connects [`TelegramClient`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelegramConnector;

impl MessengerFactory for TelegramConnector {
    type Messenger = TelegramClient;

    fn connect(
        &self,
        bot_token: &str,
        settings: &TelegramSettings,
    ) -> Result<TelegramClient, DeliveryError> {
        TelegramClient::new(bot_token, settings)
    }
}

/// Truncates a message to fit within the Telegram length limit, which the
/// Bot API counts in UTF-16 code units. The result never exceeds `limit`.
pub(crate) fn truncate_message(text: &str, limit: usize) -> String {
    if utf16_len(text) <= limit {
        return text.to_string();
    }
    let suffix_len = utf16_len(TRUNCATION_SUFFIX);
    if limit < suffix_len {
        return take_utf16(text, limit);
    }
    let mut truncated = take_utf16(text, limit - suffix_len);
    truncated.push_str(TRUNCATION_SUFFIX);
    truncated
}

fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// The longest prefix of whole characters within `budget` UTF-16 units.
fn take_utf16(text: &str, budget: usize) -> String {
    let mut used = 0;
    text.chars()
        .take_while(|c| {
            used += c.len_utf16();
            used <= budget
        })
        .collect()
}
