//! Telegram transport settings.

use config::ConfigError;
use filescout_core::config::SearchSettings;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Seconds before a "no results" notice is deleted.
pub const DEFAULT_NOTICE_TTL_SECS: u64 = 5;
/// Maximum number of chats whose settings are kept in memory.
pub const CHAT_SETTINGS_MAX_SIZE: u64 = 10_000;

/// Initial delay between Telegram API retries.
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Upper bound for the retry delay.
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 5_000;
/// Number of retries after the first failed attempt.
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;

/// Telegram transport settings loaded from environment variables.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TelegramSettings {
    /// Telegram Bot API token.
    pub telegram_token: String,
    /// Bot username used in file deep links; queried via `getMe` when unset.
    pub bot_username: Option<String>,
    /// Lifetime of the "no results" notice in seconds.
    #[serde(default = "default_notice_ttl_secs")]
    pub notice_ttl_secs: u64,
    /// Delay before results are removed in chats with auto-delete enabled.
    pub auto_delete_secs: Option<u64>,
}

const fn default_notice_ttl_secs() -> u64 {
    DEFAULT_NOTICE_TTL_SECS
}

impl TelegramSettings {
    /// Create new settings by loading from environment and files.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        filescout_core::config::build_config()?.try_deserialize()
    }

    /// Lifetime of the "no results" notice.
    #[must_use]
    pub const fn notice_ttl(&self) -> Duration {
        Duration::from_secs(self.notice_ttl_secs)
    }

    /// Auto-delete delay, if the feature is configured.
    #[must_use]
    pub fn auto_delete_after(&self) -> Option<Duration> {
        self.auto_delete_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Combined settings used by the Telegram transport layer.
#[derive(Clone)]
pub struct BotSettings {
    /// Search core settings.
    pub search: Arc<SearchSettings>,
    /// Telegram-specific settings.
    pub telegram: Arc<TelegramSettings>,
}

impl BotSettings {
    /// Create a new combined settings bundle.
    #[must_use]
    pub fn new(search: SearchSettings, telegram: TelegramSettings) -> Self {
        Self {
            search: Arc::new(search),
            telegram: Arc::new(telegram),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_delete_zero_means_disabled() {
        let mut settings = TelegramSettings {
            telegram_token: "dummy".to_string(),
            notice_ttl_secs: DEFAULT_NOTICE_TTL_SECS,
            ..TelegramSettings::default()
        };
        assert_eq!(settings.auto_delete_after(), None);

        settings.auto_delete_secs = Some(0);
        assert_eq!(settings.auto_delete_after(), None);

        settings.auto_delete_secs = Some(600);
        assert_eq!(settings.auto_delete_after(), Some(Duration::from_secs(600)));
        assert_eq!(settings.notice_ttl(), Duration::from_secs(5));
    }
}
