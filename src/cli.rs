//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. These arguments are parsed at startup and then merged, with the
//! highest precedence, over the configuration file and environment variables.
//! With no arguments at all the program sends the default notification using
//! only `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Sends a one-off Telegram notification to a single chat.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Text to send instead of the configured message.
    #[arg(short, long, value_name = "TEXT")]
    pub message: Option<String>,

    /// File to upload to the chat after the message.
    #[arg(long, value_name = "PATH")]
    pub document: Option<PathBuf>,

    /// Caption for the uploaded document.
    #[arg(long, value_name = "TEXT")]
    pub caption: Option<String>,

    /// Base URL of the Bot API server.
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// Message formatting: HTML, Markdown or MarkdownV2.
    #[arg(long, value_name = "MODE")]
    pub parse_mode: Option<String>,

    /// Deliver the message without a notification sound.
    #[arg(long)]
    pub silent: bool,

    /// Print a warning and exit 0 when the token or chat id is missing.
    #[arg(long)]
    pub skip_if_unconfigured: bool,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();
        let mut telegram = Dict::new();
        let mut message = Dict::new();

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        // Flags only ever turn behaviour on; absence leaves lower layers alone.
        if self.skip_if_unconfigured {
            dict.insert("on_missing_config".into(), Value::from("skip"));
        }
        if self.silent {
            telegram.insert("disable_notification".into(), Value::from(true));
        }

        if let Some(url) = &self.api_url {
            telegram.insert("api_base_url".into(), Value::from(url.clone()));
        }
        if let Some(timeout) = self.timeout_secs {
            telegram.insert("timeout_seconds".into(), Value::from(timeout));
        }
        if let Some(mode) = &self.parse_mode {
            telegram.insert("parse_mode".into(), Value::from(mode.clone()));
        }

        if let Some(text) = &self.message {
            message.insert("text".into(), Value::from(text.clone()));
        }
        if let Some(path) = &self.document {
            message.insert(
                "document".into(),
                Value::from(path.to_string_lossy().into_owned()),
            );
        }
        if let Some(caption) = &self.caption {
            message.insert("caption".into(), Value::from(caption.clone()));
        }

        if !telegram.is_empty() {
            dict.insert("telegram".into(), Value::from(telegram));
        }
        if !message.is_empty() {
            dict.insert("message".into(), Value::from(message));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
