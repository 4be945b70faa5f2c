//! Tests that run the `tgnotify` binary.

mod helpers;

use anyhow::Result;
use assert_cmd::prelude::*;
use helpers::telegram_api::{message_ok, service_unavailable, TOKEN};
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// The binary with an empty environment; tests add back what they need.
fn tgnotify_bin() -> Result<Command> {
    let mut cmd = Command::cargo_bin("tgnotify")?;
    cmd.env_clear();
    Ok(cmd)
}

#[test]
fn test_missing_credentials_exit_with_configuration_status() -> Result<()> {
    let mut cmd = tgnotify_bin()?;

    cmd.assert()
        .code(2)
        .stdout(contains(
            "Error: Telegram notification is not configured: TELEGRAM_BOT_TOKEN is not set",
        ));
    Ok(())
}

#[test]
fn test_empty_token_is_treated_as_missing() -> Result<()> {
    let mut cmd = tgnotify_bin()?;
    cmd.env("TELEGRAM_BOT_TOKEN", "").env("TELEGRAM_CHAT_ID", "123");

    cmd.assert().code(2).stdout(contains("TELEGRAM_BOT_TOKEN is not set"));
    Ok(())
}

#[test]
fn test_skip_if_unconfigured_exits_successfully() -> Result<()> {
    let mut cmd = tgnotify_bin()?;
    cmd.env("TELEGRAM_BOT_TOKEN", "abc")
        .arg("--skip-if-unconfigured");

    cmd.assert()
        .success()
        .stdout(contains("Warning: TELEGRAM_CHAT_ID is not set. Skipping Telegram notification."));
    Ok(())
}

#[test]
fn test_host_overrides_do_not_leak_into_the_binary() -> Result<()> {
    // Set on the test process; the child must not see them.
    std::env::set_var("TGNOTIFY_ON_MISSING_CONFIG", "skip");
    let mut cmd = tgnotify_bin()?;
    let assert = cmd.assert();
    std::env::remove_var("TGNOTIFY_ON_MISSING_CONFIG");

    assert.code(2).stdout(contains("TELEGRAM_BOT_TOKEN is not set"));
    Ok(())
}

#[test]
fn test_missing_config_file_is_a_configuration_error() -> Result<()> {
    let mut cmd = tgnotify_bin()?;
    cmd.arg("--config").arg("/tmp/this/file/does/not/exist.toml");

    cmd.assert()
        .code(2)
        .stdout(contains("configuration file not found"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sends_message_from_environment() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_ok(5, 123)))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = tgnotify_bin()?;
    cmd.env("TELEGRAM_BOT_TOKEN", TOKEN)
        .env("TELEGRAM_CHAT_ID", "123")
        .arg("--api-url")
        .arg(server.uri());

    tokio::task::spawn_blocking(move || {
        cmd.assert()
            .success()
            .stdout(contains("Successfully sent Telegram notification (message_id=5)."));
    })
    .await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_config_file_and_message_flag() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .and(wiremock::matchers::body_json(serde_json::json!({
            "chat_id": "777",
            "text": "from the command line"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_ok(9, 777)))
        .expect(1)
        .mount(&server)
        .await;

    let mut file = NamedTempFile::new()?;
    write!(
        file,
        "[telegram]\nbot_token = \"{TOKEN}\"\nchat_id = \"777\"\napi_base_url = \"{}\"\n",
        server.uri()
    )?;

    let mut cmd = tgnotify_bin()?;
    cmd.arg("--config")
        .arg(file.path())
        .arg("--message")
        .arg("from the command line");

    tokio::task::spawn_blocking(move || {
        cmd.assert().success().stdout(contains("message_id=9"));
    })
    .await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delivery_failure_exits_with_one() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(service_unavailable()))
        .mount(&server)
        .await;

    let mut cmd = tgnotify_bin()?;
    cmd.env("TELEGRAM_BOT_TOKEN", TOKEN)
        .env("TELEGRAM_CHAT_ID", "123")
        .arg("--api-url")
        .arg(server.uri());

    tokio::task::spawn_blocking(move || {
        cmd.assert()
            .code(1)
            .stdout(contains("Error sending Telegram notification:"))
            .stdout(contains("Service Unavailable"));
    })
    .await?;
    Ok(())
}
