//! Configuration management for tgnotify
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer built-in defaults, an optional TOML file,
//! environment variables and command-line flags into one value that is built
//! once at startup and passed to the dispatcher.

use crate::cli::Cli;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the bot token.
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
/// Environment variable holding the destination chat identifier.
pub const CHAT_ID_ENV: &str = "TELEGRAM_CHAT_ID";
/// Prefix for every other environment override, nested with `__`.
pub const ENV_PREFIX: &str = "TGNOTIFY_";

/// Text sent when nothing else is configured.
pub const DEFAULT_MESSAGE: &str =
    "Deployment in progress... A new version of Forgeite Frenzy is being forged!";

pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TELEGRAM_BOT_TOKEN is not set")]
    MissingBotToken,
    #[error("TELEGRAM_CHAT_ID is not set")]
    MissingChatId,
    #[error("message text is empty")]
    EmptyMessage,
    #[error("configuration file not found: {0}")]
    MissingFile(PathBuf),
    #[error("document is not a readable file: {}", .0.display())]
    MissingDocument(PathBuf),
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),
}

impl ConfigError {
    /// True when the error is one of the two required credentials being absent.
    pub fn is_missing_credentials(&self) -> bool {
        matches!(self, Self::MissingBotToken | Self::MissingChatId)
    }
}

/// What to do when the bot token or chat id is missing.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingConfigPolicy {
    /// Report a configuration error and exit non-zero.
    #[default]
    Fail,
    /// Print a warning and exit successfully without sending anything.
    Skip,
}

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level, used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Behaviour when credentials are missing.
    #[serde(default)]
    pub on_missing_config: MissingConfigPolicy,
    /// Credentials and transport settings for the Bot API.
    pub telegram: TelegramSettings,
    /// The notification content.
    pub message: MessageSettings,
}

/// Credentials and transport settings for the Telegram Bot API.
#[derive(Deserialize, Serialize, Clone, PartialEq)]
pub struct TelegramSettings {
    #[serde(default, deserialize_with = "lenient_string")]
    pub bot_token: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub chat_id: Option<String>,
    pub api_base_url: String,
    pub timeout_seconds: u64,
    /// `HTML`, `Markdown` or `MarkdownV2`. Plain text when unset.
    #[serde(default)]
    pub parse_mode: Option<String>,
    #[serde(default)]
    pub disable_notification: bool,
}

/// The notification content.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MessageSettings {
    pub text: String,
    /// A file to upload after the text message.
    #[serde(default)]
    pub document: Option<PathBuf>,
    #[serde(default)]
    pub caption: Option<String>,
}

impl TelegramSettings {
    /// Returns the bot token, or an error if it is absent or blank.
    pub fn bot_token(&self) -> Result<&str, ConfigError> {
        non_blank(self.bot_token.as_deref()).ok_or(ConfigError::MissingBotToken)
    }

    /// Returns the chat id, or an error if it is absent or blank.
    pub fn chat_id(&self) -> Result<&str, ConfigError> {
        non_blank(self.chat_id.as_deref()).ok_or(ConfigError::MissingChatId)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// The token must never reach the logs.
impl fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("chat_id", &self.chat_id)
            .field("api_base_url", &self.api_base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("parse_mode", &self.parse_mode)
            .field("disable_notification", &self.disable_notification)
            .finish()
    }
}

/// Accepts either a string or an integer. Environment values such as
/// `TELEGRAM_CHAT_ID=-1001234` are parsed as numbers by figment.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(
        Option::<StringOrNumber>::deserialize(deserializer)?.map(|value| match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Signed(n) => n.to_string(),
            StringOrNumber::Unsigned(n) => n.to_string(),
        }),
    )
}

impl Config {
    /// Loads the configuration by layering, lowest precedence first:
    /// defaults, the TOML file named by `--config`, `TGNOTIFY_*` variables,
    /// `TELEGRAM_BOT_TOKEN`/`TELEGRAM_CHAT_ID`, then command-line flags.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(path) = &cli.config {
            if !path.exists() {
                return Err(ConfigError::MissingFile(path.clone()));
            }
            figment = figment.merge(Toml::file_exact(path));
        }

        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Env::raw().only(&[BOT_TOKEN_ENV]).map(|_| "telegram.bot_token".into()))
            .merge(Env::raw().only(&[CHAT_ID_ENV]).map(|_| "telegram.chat_id".into()))
            .merge(cli.clone())
            .extract()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            on_missing_config: MissingConfigPolicy::Fail,
            telegram: TelegramSettings {
                bot_token: None,
                chat_id: None,
                api_base_url: DEFAULT_API_BASE_URL.to_string(),
                timeout_seconds: 10,
                parse_mode: None,
                disable_notification: false,
            },
            message: MessageSettings {
                text: DEFAULT_MESSAGE.to_string(),
                document: None,
                caption: None,
            },
        }
    }
}
