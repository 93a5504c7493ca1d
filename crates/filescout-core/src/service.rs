//! Search orchestration
//!
//! Runs the two interaction flows on top of the aggregator, the session store
//! and the token codec:
//!
//! * fresh query: validate, search, store, render;
//! * follow-up click: decode, authorize, load session, re-fetch, update the
//!   live session (never re-inserting an evicted one), render.

use crate::catalog::{CatalogAggregator, CatalogPage, FileRecord};
use crate::session::{PutOutcome, SessionKey, SessionStore};
use crate::source::{Source, SourceSelector};
use crate::token::{PaginationToken, TokenError};
use crate::validator::{is_valid_search, SearchCandidate};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Outcomes of an interaction that do not produce a result page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Input is not a search query; ignore silently
    #[error("message is not a search query")]
    ValidationRejected,
    /// Nothing matched in any source (or the catalog failed)
    #[error("no results for {query:?}")]
    NoResults {
        /// Query that found nothing
        query: String,
    },
    /// The session was evicted before the click arrived
    #[error("search session {0} expired")]
    SessionExpired(SessionKey),
    /// The clicking user is not the one who searched
    #[error("user {actor_id} tried to use a button issued to {requester_id}")]
    Unauthorized {
        /// Owner of the session
        requester_id: i64,
        /// User who clicked
        actor_id: i64,
    },
    /// Callback payload could not be decoded
    #[error("malformed callback token: {0}")]
    MalformedToken(#[from] TokenError),
}

/// Everything the presentation layer needs to render one result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    /// User the buttons are bound to
    pub requester_id: i64,
    /// Session the buttons refer to
    pub session_key: SessionKey,
    /// Query text
    pub query: String,
    /// Total matches in `source`
    pub total: usize,
    /// 1-based page number
    pub page_index: usize,
    /// Number of pages in `source`
    pub total_pages: usize,
    /// Source that served the page
    pub source: Source,
    /// Records on this page (owned copy)
    pub records: Vec<FileRecord>,
    /// Offset of the next page
    pub next_offset: Option<usize>,
    /// Offset of the previous page
    pub prev_offset: Option<usize>,
    /// Sources the user can switch to
    pub available_sources: Vec<Source>,
}

impl PageView {
    fn new(
        requester_id: i64,
        session_key: SessionKey,
        query: String,
        page: CatalogPage,
        offset: usize,
        page_size: usize,
        available_sources: Vec<Source>,
    ) -> Self {
        let page_size = page_size.max(1);
        let prev_offset = (offset > 0).then(|| offset.saturating_sub(page_size));
        Self {
            requester_id,
            session_key,
            query,
            total: page.total,
            page_index: offset / page_size + 1,
            total_pages: page.total.div_ceil(page_size).max(1),
            source: page.source,
            records: page.records,
            next_offset: page.next_offset,
            prev_offset,
            available_sources,
        }
    }

    /// A next page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.next_offset.is_some()
    }

    /// A previous page exists.
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.prev_offset.is_some()
    }

    /// Token for the page at `offset` of the current source.
    #[must_use]
    pub const fn nav_token(&self, offset: usize) -> PaginationToken {
        PaginationToken::Nav {
            requester_id: self.requester_id,
            session_key: self.session_key,
            offset,
            source: self.source,
        }
    }

    /// Token that switches this session to `source`.
    #[must_use]
    pub const fn switch_token(&self, source: Source) -> PaginationToken {
        PaginationToken::Switch {
            requester_id: self.requester_id,
            session_key: self.session_key,
            source,
        }
    }
}

/// Search entry point shared by every chat.
pub struct SearchService {
    aggregator: CatalogAggregator,
    sessions: Arc<SessionStore>,
    page_size: usize,
}

impl SearchService {
    /// Create a service. A zero page size is raised to one.
    #[must_use]
    pub fn new(aggregator: CatalogAggregator, sessions: Arc<SessionStore>, page_size: usize) -> Self {
        Self {
            aggregator,
            sessions,
            page_size: page_size.max(1),
        }
    }

    /// Records per page.
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Shared session store.
    #[must_use]
    pub const fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Underlying aggregator.
    #[must_use]
    pub const fn aggregator(&self) -> &CatalogAggregator {
        &self.aggregator
    }

    /// Handle a fresh query and open a session for it.
    ///
    /// # Errors
    ///
    /// [`SearchError::ValidationRejected`] when the message is not a query,
    /// [`SearchError::NoResults`] when nothing matched.
    pub async fn start_search(
        &self,
        candidate: &SearchCandidate<'_>,
        requester_id: i64,
        session_key: SessionKey,
        selector: SourceSelector,
    ) -> Result<PageView, SearchError> {
        if !is_valid_search(candidate) {
            return Err(SearchError::ValidationRejected);
        }
        let query = candidate.text.unwrap_or_default().trim().to_string();

        let page = self
            .aggregator
            .search(&query, self.page_size, 0, selector)
            .await;
        if page.is_empty() {
            debug!("No results for '{query}' (session {session_key})");
            return Err(SearchError::NoResults { query });
        }

        self.store(session_key, &query, &page.records).await;
        info!(
            "Search '{query}' by {requester_id}: {} matches in {}",
            page.total, page.source
        );
        Ok(self.view(requester_id, session_key, query, page, 0))
    }

    /// Handle a button click carrying `payload`, pressed by `actor_id`.
    ///
    /// Authorization is checked before the session is touched.
    ///
    /// # Errors
    ///
    /// [`SearchError::MalformedToken`], [`SearchError::Unauthorized`],
    /// [`SearchError::SessionExpired`] or [`SearchError::NoResults`].
    pub async fn follow_up(&self, actor_id: i64, payload: &str) -> Result<PageView, SearchError> {
        let token = PaginationToken::decode(payload).map_err(|e| {
            warn!("Malformed callback payload {payload:?} from {actor_id}: {e}");
            SearchError::MalformedToken(e)
        })?;

        if !token.is_issued_to(actor_id) {
            debug!(
                "User {actor_id} clicked a button owned by {}",
                token.requester_id()
            );
            return Err(SearchError::Unauthorized {
                requester_id: token.requester_id(),
                actor_id,
            });
        }

        let session_key = token.session_key();
        let Some(session) = self.sessions.get(&session_key).await else {
            debug!("Session {session_key} expired");
            return Err(SearchError::SessionExpired(session_key));
        };

        let offset = token.offset();
        let page = self
            .aggregator
            .search(
                &session.query,
                self.page_size,
                offset,
                SourceSelector::Only(token.source()),
            )
            .await;
        if page.is_empty() {
            return Err(SearchError::NoResults {
                query: session.query,
            });
        }

        if !self
            .sessions
            .replace_results(&session_key, page.records.clone())
            .await
        {
            debug!("Session {session_key} expired during lookup");
            return Err(SearchError::SessionExpired(session_key));
        }
        Ok(self.view(actor_id, session_key, session.query, page, offset))
    }

    async fn store(&self, key: SessionKey, query: &str, records: &[FileRecord]) {
        if let PutOutcome::Evicted { cleared } = self
            .sessions
            .put(key, query.to_string(), records.to_vec())
            .await
        {
            warn!("Session ceiling crossed while storing {key}; {cleared} sessions expired");
        }
    }

    fn view(
        &self,
        requester_id: i64,
        session_key: SessionKey,
        query: String,
        page: CatalogPage,
        offset: usize,
    ) -> PageView {
        PageView::new(
            requester_id,
            session_key,
            query,
            page,
            offset,
            self.page_size,
            self.aggregator.sources().to_vec(),
        )
    }
}
