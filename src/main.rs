//! tgnotify - Telegram notification sender
//!
//! Reads `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`, sends one message, prints
//! one outcome line to stdout and exits with 0 (sent or skipped), 1 (delivery
//! failed) or 2 (configuration error). Logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::process::ExitCode;
use tgnotify::{
    cli::Cli,
    config::Config,
    notification::telegram::TelegramConnector,
    DispatchOutcome, NotificationDispatcher,
};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

const CONFIG_ERROR_EXIT: u8 = 2;

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            // Configuration failed before the log level is known.
            init_logging(cli.log_level.as_deref().unwrap_or("info"));
            error!("Failed to load configuration: {}", err);
            println!("Error: {err}");
            return Ok(ExitCode::from(CONFIG_ERROR_EXIT));
        }
    };

    init_logging(&config.log_level);
    debug!(?config, "Configuration loaded.");

    let dispatcher = NotificationDispatcher::new(TelegramConnector);
    let mut stdout = std::io::stdout().lock();
    let outcome = dispatcher.run(&config, &mut stdout).await;
    stdout.flush().context("failed to flush stdout")?;

    if let DispatchOutcome::Delivered(delivery) = &outcome {
        info!(
            message_id = delivery.message.message_id,
            chat_id = delivery.message.chat_id,
            "Done."
        );
    }

    Ok(ExitCode::from(outcome.exit_code()))
}
