/// Per-chat search settings cache
pub mod chat_settings;
/// Command handlers (/start, /help, /stats, toggles)
pub mod handlers;
/// Resilient messaging with automatic retry for Telegram API operations
pub mod resilient;
/// Search query and result-button handlers
pub mod search_handlers;
/// View layer for UI components (captions, keyboards, alerts)
pub mod views;

pub use chat_settings::{ChatSettings, ChatSettingsCache};
