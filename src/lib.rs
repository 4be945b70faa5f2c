//! tgnotify - Send a one-off Telegram notification
//!
//! This library reads the Telegram credentials from a layered configuration,
//! validates them before any network activity, and delivers a single message
//! (and optionally a document) through the Bot API.
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod notification;

// Re-export the dispatch types for convenience
pub use dispatcher::{
    Delivery, DispatchError, DispatchOutcome, NotificationDispatcher, NotificationRequest,
};
pub use notification::{Ack, DeliveryError, Messenger, MessengerFactory};
