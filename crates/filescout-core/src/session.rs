//! Search session store
//!
//! Holds the query text and the last fetched page for every rendered result
//! message, so follow-up buttons work without the user resending the query.
//! Transport-agnostic: keys are built from chat and message identity.

use crate::catalog::FileRecord;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

/// Identity of the conversation turn that produced a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    /// Chat the query was sent in
    pub chat_id: i64,
    /// Message that carried the query
    pub message_id: i32,
}

/// Returned when a session key string is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid session key: {0}")]
pub struct InvalidSessionKey(pub String);

impl SessionKey {
    /// Create a key from chat and message identity.
    #[must_use]
    pub const fn new(chat_id: i64, message_id: i32) -> Self {
        Self {
            chat_id,
            message_id,
        }
    }
}

// Rendered as `<chat_id>_<message_id>`; the alphabet is `[-0-9_]`.
impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.chat_id, self.message_id)
    }
}

impl FromStr for SessionKey {
    type Err = InvalidSessionKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidSessionKey(s.to_string());
        let (chat, message) = s.split_once('_').ok_or_else(invalid)?;
        Ok(Self {
            chat_id: chat.parse().map_err(|_| invalid())?,
            message_id: message.parse().map_err(|_| invalid())?,
        })
    }
}

/// A browsable result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSession {
    /// Session identity
    pub key: SessionKey,
    /// Validated query text
    pub query: String,
    /// Most recently fetched page
    pub results: Vec<FileRecord>,
}

/// What happened to the store on `put`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The session was inserted or overwritten
    Stored,
    /// The ceiling was crossed and every session, including this one, was dropped
    Evicted {
        /// Number of sessions dropped
        cleared: usize,
    },
}

/// Size-bounded session map shared by all interactions.
///
/// When the number of distinct keys exceeds the ceiling the whole map is
/// cleared at once. There is no per-entry expiry and no LRU ordering.
/// Insert, ceiling check and clear run under one lock, so a concurrent `put`
/// never observes a half-cleared map.
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionKey, SearchSession>>,
    ceiling: usize,
}

impl SessionStore {
    /// Create an empty store. A zero ceiling is raised to one.
    ///
    /// # Examples
    ///
    /// ```
    /// use filescout_core::session::{SessionKey, SessionStore};
    ///
    /// # async fn example() {
    /// let store = SessionStore::new(500);
    /// let key = SessionKey::new(-100_123, 42);
    /// store.put(key, "batman".to_string(), Vec::new()).await;
    /// assert_eq!(store.get(&key).await.map(|s| s.query), Some("batman".to_string()));
    /// # }
    /// ```
    #[must_use]
    pub fn new(ceiling: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ceiling: ceiling.max(1),
        }
    }

    /// Insert or overwrite the session for `key`.
    pub async fn put(&self, key: SessionKey, query: String, results: Vec<FileRecord>) -> PutOutcome {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(
            key,
            SearchSession {
                key,
                query,
                results,
            },
        );

        if sessions.len() > self.ceiling {
            let cleared = sessions.len();
            sessions.clear();
            info!(
                "Session store exceeded ceiling of {}; cleared {} sessions",
                self.ceiling, cleared
            );
            return PutOutcome::Evicted { cleared };
        }
        PutOutcome::Stored
    }

    /// Copy of the session for `key`; `None` means it expired.
    pub async fn get(&self, key: &SessionKey) -> Option<SearchSession> {
        self.sessions.lock().await.get(key).cloned()
    }

    /// Replace the stored page of a live session.
    ///
    /// Never inserts: returns `false` when `key` has already been evicted.
    pub async fn replace_results(&self, key: &SessionKey, results: Vec<FileRecord>) -> bool {
        match self.sessions.lock().await.get_mut(key) {
            Some(session) => {
                session.results = results;
                true
            }
            None => false,
        }
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Returns `true` if no session is live.
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Configured ceiling.
    #[must_use]
    pub const fn ceiling(&self) -> usize {
        self.ceiling
    }
}
