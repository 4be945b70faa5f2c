//! A mock messenger for testing the dispatcher through the public API.

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tgnotify::config::TelegramSettings;
use tgnotify::{Ack, DeliveryError, Messenger, MessengerFactory};

/// Records every `(chat_id, text)` sent and answers with `reply`.
#[derive(Clone, Default)]
pub struct MockMessengerFactory {
    pub connections: Arc<Mutex<u32>>,
    pub sent_messages: Arc<Mutex<Vec<(String, String)>>>,
    pub fail_with: Option<(i64, &'static str)>,
}

impl MockMessengerFactory {
    pub fn failing(code: i64, description: &'static str) -> Self {
        Self {
            fail_with: Some((code, description)),
            ..Default::default()
        }
    }

    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent_messages.lock().unwrap().clone()
    }

    pub fn connections(&self) -> u32 {
        *self.connections.lock().unwrap()
    }
}

pub struct MockMessenger {
    sent_messages: Arc<Mutex<Vec<(String, String)>>>,
    fail_with: Option<(i64, &'static str)>,
}

impl MockMessenger {
    fn reply(&self) -> Result<Ack, DeliveryError> {
        match self.fail_with {
            Some((code, description)) => Err(DeliveryError::Api {
                code: Some(code),
                description: description.to_string(),
            }),
            None => Ok(Ack {
                message_id: 100,
                chat_id: 123,
                sent_at: None,
            }),
        }
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<Ack, DeliveryError> {
        self.sent_messages
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        self.reply()
    }

    async fn send_document(
        &self,
        _chat_id: &str,
        _path: &Path,
        _caption: Option<&str>,
    ) -> Result<Ack, DeliveryError> {
        self.reply()
    }
}

impl MessengerFactory for MockMessengerFactory {
    type Messenger = MockMessenger;

    fn connect(
        &self,
        _bot_token: &str,
        _settings: &TelegramSettings,
    ) -> Result<MockMessenger, DeliveryError> {
        *self.connections.lock().unwrap() += 1;
        Ok(MockMessenger {
            sent_messages: self.sent_messages.clone(),
            fail_with: self.fail_with,
        })
    }
}
