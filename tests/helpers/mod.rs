pub mod mock_messenger;
pub mod telegram_api;
