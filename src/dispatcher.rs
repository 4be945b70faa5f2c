//! Delivers one notification to one chat.
//!
//! The dispatcher validates the credentials before anything touches the
//! network, connects a [`Messenger`] through its [`MessengerFactory`], sends
//! the message (and the optional document), and reports the outcome as a
//! single human-readable line.

use crate::config::{Config, ConfigError, MissingConfigPolicy};
use crate::notification::{Ack, DeliveryError, Messenger, MessengerFactory};
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// A single message addressed to a single chat. Both fields are non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    recipient_id: String,
    message_text: String,
}

impl NotificationRequest {
    pub fn new(
        recipient_id: impl Into<String>,
        message_text: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let recipient_id = recipient_id.into().trim().to_string();
        let message_text = message_text.into();
        if recipient_id.is_empty() {
            return Err(ConfigError::MissingChatId);
        }
        if message_text.trim().is_empty() {
            return Err(ConfigError::EmptyMessage);
        }
        Ok(Self {
            recipient_id,
            message_text,
        })
    }

    pub fn recipient_id(&self) -> &str {
        &self.recipient_id
    }

    pub fn message_text(&self) -> &str {
        &self.message_text
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Telegram notification is not configured: {0}")]
    Configuration(#[from] ConfigError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// What a successful dispatch produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub message: Ack,
    pub document: Option<Ack>,
}

/// The reported result of [`NotificationDispatcher::run`].
#[derive(Debug)]
pub enum DispatchOutcome {
    Delivered(Delivery),
    Skipped,
    ConfigurationFailed(ConfigError),
    DeliveryFailed(DeliveryError),
}

impl DispatchOutcome {
    /// Process exit status: 0 delivered or skipped, 1 delivery failed,
    /// 2 configuration error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Delivered(_) | Self::Skipped => 0,
            Self::DeliveryFailed(_) => 1,
            Self::ConfigurationFailed(_) => 2,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code() == 0
    }
}

pub struct NotificationDispatcher<F: MessengerFactory> {
    factory: F,
}

impl<F: MessengerFactory> NotificationDispatcher<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    /// Sends the configured notification.
    ///
    /// Fails with [`DispatchError::Configuration`] before the messenger is
    /// constructed when the token, chat id or text is missing, or when the
    /// document cannot be opened. The message is
    /// sent exactly once; the document, if any, only after the message was
    /// acknowledged.
    #[instrument(skip_all)]
    pub async fn dispatch(&self, config: &Config) -> Result<Delivery, DispatchError> {
        let bot_token = config.telegram.bot_token()?;
        let request = NotificationRequest::new(config.telegram.chat_id()?, &config.message.text)?;
        if let Some(path) = &config.message.document {
            check_document(path).await?;
        }

        let messenger = self.factory.connect(bot_token, &config.telegram)?;

        info!(chat_id = request.recipient_id(), "Sending Telegram notification.");
        let message = messenger
            .send_message(request.recipient_id(), request.message_text())
            .await?;

        let document = match &config.message.document {
            Some(path) => {
                info!(path = %path.display(), "Sending document.");
                let ack = messenger
                    .send_document(
                        request.recipient_id(),
                        path,
                        config.message.caption.as_deref(),
                    )
                    .await?;
                Some(ack)
            }
            None => None,
        };

        Ok(Delivery { message, document })
    }

    /// Runs [`dispatch`](Self::dispatch) and writes exactly one line
    /// describing the outcome to `out`. Never panics on failure.
    pub async fn run<W: Write>(&self, config: &Config, out: &mut W) -> DispatchOutcome {
        let (outcome, line) = match self.dispatch(config).await {
            Ok(delivery) => {
                info!(message_id = delivery.message.message_id, "Telegram notification delivered.");
                let line = match &delivery.document {
                    Some(document) => format!(
                        "Successfully sent Telegram notification (message_id={}, document message_id={}).",
                        delivery.message.message_id, document.message_id
                    ),
                    None => format!(
                        "Successfully sent Telegram notification (message_id={}).",
                        delivery.message.message_id
                    ),
                };
                (DispatchOutcome::Delivered(delivery), line)
            }
            Err(DispatchError::Configuration(err))
                if err.is_missing_credentials()
                    && config.on_missing_config == MissingConfigPolicy::Skip =>
            {
                warn!(error = %err, "Telegram credentials missing, skipping notification.");
                let line = format!("Warning: {err}. Skipping Telegram notification.");
                (DispatchOutcome::Skipped, line)
            }
            Err(DispatchError::Configuration(err)) => {
                error!(error = %err, "Telegram notification is not configured.");
                let line = format!("Error: Telegram notification is not configured: {err}");
                (DispatchOutcome::ConfigurationFailed(err), line)
            }
            Err(DispatchError::Delivery(err)) => {
                error!(error = %err, "Failed to send Telegram notification.");
                let line = format!("Error sending Telegram notification: {err}");
                (DispatchOutcome::DeliveryFailed(err), line)
            }
        };

        if let Err(e) = writeln!(out, "{line}") {
            error!(error = %e, "Failed to write the notification outcome.");
        }
        outcome
    }
}

/// The document must be openable before anything is sent, otherwise the
/// message goes out and the run still fails.
async fn check_document(path: &Path) -> Result<(), ConfigError> {
    let readable = match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => tokio::fs::File::open(path).await.is_ok(),
        _ => false,
    };
    if readable {
        Ok(())
    } else {
        Err(ConfigError::MissingDocument(path.to_path_buf()))
    }
}
