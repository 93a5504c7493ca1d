//! Per-chat search settings
//!
//! Group admins can turn search and auto-deletion on or off for their chat.
//! Settings live in a bounded in-memory cache; chats that were never
//! configured (or were evicted) get the defaults.

use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Search behaviour of one chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatSettings {
    /// Plain-text messages are treated as search queries
    pub search_enabled: bool,
    /// Results and the query are deleted after the configured delay
    pub auto_delete: bool,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            search_enabled: true,
            auto_delete: false,
        }
    }
}

/// Cache of chat settings keyed by chat ID.
#[derive(Clone)]
pub struct ChatSettingsCache {
    /// Moka cache storing chat_id -> settings mappings
    cache: Cache<i64, ChatSettings>,
    /// Number of searches skipped because search is disabled in the chat
    skipped_count: Arc<AtomicU64>,
}

impl ChatSettingsCache {
    /// Creates a cache holding at most `max_capacity` chats.
    ///
    /// # Examples
    ///
    /// ```
    /// use filescout_transport_telegram::bot::ChatSettingsCache;
    ///
    /// let cache = ChatSettingsCache::new(10_000);
    /// assert_eq!(cache.skipped_count(), 0);
    /// ```
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_capacity).build(),
            skipped_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Settings of `chat_id`, defaults when unknown.
    pub async fn get(&self, chat_id: i64) -> ChatSettings {
        self.cache.get(&chat_id).await.unwrap_or_default()
    }

    /// Enable or disable search in `chat_id`.
    pub async fn set_search_enabled(&self, chat_id: i64, enabled: bool) {
        let mut settings = self.get(chat_id).await;
        settings.search_enabled = enabled;
        self.cache.insert(chat_id, settings).await;
    }

    /// Enable or disable auto-deletion in `chat_id`.
    pub async fn set_auto_delete(&self, chat_id: i64, enabled: bool) {
        let mut settings = self.get(chat_id).await;
        settings.auto_delete = enabled;
        self.cache.insert(chat_id, settings).await;
    }

    /// Returns `true` if searches in `chat_id` should run.
    ///
    /// Skipped searches are counted; every 100th one is logged.
    pub async fn allows_search(&self, chat_id: i64) -> bool {
        if self.get(chat_id).await.search_enabled {
            return true;
        }

        let count = self.skipped_count.fetch_add(1, Ordering::Relaxed) + 1;
        if count.is_multiple_of(100) {
            debug!("Skipped {count} searches in disabled chats (recent: chat {chat_id})");
        }
        false
    }

    /// Number of chats with explicit settings.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Number of searches skipped in disabled chats.
    #[must_use]
    pub fn skipped_count(&self) -> u64 {
        self.skipped_count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_chat_gets_defaults() {
        let cache = ChatSettingsCache::new(100);
        assert_eq!(cache.get(-100).await, ChatSettings::default());
        assert!(cache.allows_search(-100).await);
    }

    #[tokio::test]
    async fn test_toggles_are_independent() {
        let cache = ChatSettingsCache::new(100);

        cache.set_search_enabled(-100, false).await;
        cache.set_auto_delete(-100, true).await;

        let settings = cache.get(-100).await;
        assert!(!settings.search_enabled);
        assert!(settings.auto_delete);

        // Other chats are not affected
        assert_eq!(cache.get(-200).await, ChatSettings::default());
    }

    #[tokio::test]
    async fn test_disabled_chat_counts_skips() {
        let cache = ChatSettingsCache::new(100);
        cache.set_search_enabled(-100, false).await;

        for _ in 0..3 {
            assert!(!cache.allows_search(-100).await);
        }
        assert_eq!(cache.skipped_count(), 3);
    }

    #[tokio::test]
    async fn test_entry_count() {
        let cache = ChatSettingsCache::new(100);

        cache.set_search_enabled(1, true).await;
        cache.set_auto_delete(2, true).await;

        // Manually run pending tasks to update the entry count
        cache.cache.run_pending_tasks().await;

        assert_eq!(cache.entry_count(), 2);
    }
}
