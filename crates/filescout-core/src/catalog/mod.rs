//! File catalogs and the multi-source aggregator
//!
//! A [`CatalogBackend`] answers per-source lookups. The [`CatalogAggregator`]
//! layers paging, precedence fallback and failure isolation on top of it.

mod memory;

pub use memory::InMemoryCatalog;

use crate::source::{Source, SourceSelector};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised by catalog backends
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Catalog file is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Lookup did not finish in time
    #[error("lookup in {catalog} timed out after {secs}s")]
    Timeout {
        /// Source that was being searched
        catalog: Source,
        /// Configured timeout
        secs: u64,
    },
    /// Any other backend failure
    #[error("backend error: {0}")]
    Backend(String),
}

/// A file entry in one of the catalogs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Identifier, unique within its source
    #[serde(alias = "_id")]
    pub id: String,
    /// Display name
    #[serde(alias = "file_name")]
    pub name: String,
    /// Size in bytes
    #[serde(alias = "file_size")]
    pub size: u64,
    /// Catalog the record belongs to
    pub source: Source,
}

/// Raw answer of a single-source lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSlice {
    /// Records in the requested window
    pub records: Vec<FileRecord>,
    /// Total number of matches in the source
    pub total: usize,
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPage {
    /// Records on this page
    pub records: Vec<FileRecord>,
    /// Offset of the next page, `None` on the last page
    pub next_offset: Option<usize>,
    /// Total matches in `source`
    pub total: usize,
    /// Source that served the page
    pub source: Source,
}

impl CatalogPage {
    fn from_slice(mut slice: CatalogSlice, offset: usize, page_size: usize, source: Source) -> Self {
        slice.records.truncate(page_size);
        let next_offset = if offset + slice.records.len() >= slice.total {
            None
        } else {
            Some(offset + page_size)
        };
        Self {
            records: slice.records,
            next_offset,
            total: slice.total,
            source,
        }
    }

    fn empty(source: Source) -> Self {
        Self {
            records: Vec::new(),
            next_offset: None,
            total: 0,
            source,
        }
    }

    /// Returns `true` when the page has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Interface for catalog storage engines
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Look up matches for `query` in one source, returning at most `limit`
    /// records starting at `offset` together with the total match count.
    async fn lookup(
        &self,
        source: Source,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<CatalogSlice, CatalogError>;

    /// Number of records held by the backend across all sources
    async fn record_count(&self) -> usize;
}

/// Searches several catalogs with precedence fallback.
///
/// Backend failures never escape: a failing or slow source is logged and
/// treated as empty, so callers see it exactly like "no results".
pub struct CatalogAggregator {
    backend: Arc<dyn CatalogBackend>,
    precedence: Vec<Source>,
    timeout: Duration,
}

impl CatalogAggregator {
    /// Create an aggregator over `backend`.
    ///
    /// An empty `precedence` falls back to every known source.
    #[must_use]
    pub fn new(backend: Arc<dyn CatalogBackend>, precedence: Vec<Source>, timeout: Duration) -> Self {
        let precedence = if precedence.is_empty() {
            Source::ALL.to_vec()
        } else {
            precedence
        };
        Self {
            backend,
            precedence,
            timeout,
        }
    }

    /// Configured sources in precedence order.
    #[must_use]
    pub fn sources(&self) -> &[Source] {
        &self.precedence
    }

    /// Number of records in the backing catalog.
    pub async fn record_count(&self) -> usize {
        self.backend.record_count().await
    }

    /// Fetch one page of results.
    ///
    /// The first candidate source with at least one match serves the page;
    /// paging and `total` are scoped to that source only. When nothing
    /// matches anywhere the page is empty and names the first candidate.
    ///
    /// # Examples
    ///
    /// ```
    /// use filescout_core::catalog::{CatalogAggregator, FileRecord, InMemoryCatalog};
    /// use filescout_core::source::{Source, SourceSelector};
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// # async fn example() {
    /// let catalog = InMemoryCatalog::from_records(vec![FileRecord {
    ///     id: "1".into(),
    ///     name: "Batman.2005.mkv".into(),
    ///     size: 1024,
    ///     source: Source::Cloud,
    /// }]);
    /// let aggregator = CatalogAggregator::new(
    ///     Arc::new(catalog),
    ///     Source::ALL.to_vec(),
    ///     Duration::from_secs(1),
    /// );
    /// let page = aggregator.search("batman", 10, 0, SourceSelector::All).await;
    /// assert_eq!(page.source, Source::Cloud);
    /// assert_eq!(page.total, 1);
    /// # }
    /// ```
    pub async fn search(
        &self,
        query: &str,
        page_size: usize,
        offset: usize,
        requested: SourceSelector,
    ) -> CatalogPage {
        let page_size = page_size.max(1);
        let candidates = requested.candidates(&self.precedence);

        for source in &candidates {
            if let Some(slice) = self.lookup(*source, query, page_size, offset).await {
                if slice.total > 0 {
                    return CatalogPage::from_slice(slice, offset, page_size, *source);
                }
            }
        }

        CatalogPage::empty(candidates.first().copied().unwrap_or(Source::Primary))
    }

    async fn lookup(
        &self,
        source: Source,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Option<CatalogSlice> {
        let result = tokio::time::timeout(
            self.timeout,
            self.backend.lookup(source, query, limit, offset),
        )
        .await
        .unwrap_or_else(|_| {
            Err(CatalogError::Timeout {
                catalog: source,
                secs: self.timeout.as_secs(),
            })
        });

        match result {
            Ok(slice) => {
                if slice.total == 0 {
                    debug!("No matches for '{query}' in {source}");
                }
                Some(slice)
            }
            Err(e) => {
                warn!("Catalog lookup failed for '{query}' in {source}: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn records(source: Source, count: usize) -> Vec<FileRecord> {
        (0..count)
            .map(|i| FileRecord {
                id: format!("{source}-{i}"),
                name: format!("file {i}"),
                size: 1000,
                source,
            })
            .collect()
    }

    fn aggregator(mock: MockCatalogBackend) -> CatalogAggregator {
        CatalogAggregator::new(Arc::new(mock), Source::ALL.to_vec(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_falls_back_to_next_non_empty_source() {
        let mut mock = MockCatalogBackend::new();
        mock.expect_lookup()
            .with(eq(Source::Primary), eq("batman"), eq(10), eq(0))
            .returning(|_, _, _, _| Ok(CatalogSlice::default()));
        mock.expect_lookup()
            .with(eq(Source::Cloud), eq("batman"), eq(10), eq(0))
            .returning(|_, _, _, _| {
                Ok(CatalogSlice {
                    records: records(Source::Cloud, 5),
                    total: 5,
                })
            });

        let page = aggregator(mock)
            .search("batman", 10, 0, SourceSelector::Only(Source::Primary))
            .await;

        assert_eq!(page.source, Source::Cloud);
        assert_eq!(page.total, 5);
        assert_eq!(page.records, records(Source::Cloud, 5));
        assert_eq!(page.next_offset, None);
    }

    #[tokio::test]
    async fn test_backend_error_is_reported_as_empty() {
        let mut mock = MockCatalogBackend::new();
        mock.expect_lookup()
            .returning(|_, _, _, _| Err(CatalogError::Backend("connection reset".to_string())));

        let page = aggregator(mock).search("batman", 10, 0, SourceSelector::All).await;

        assert!(page.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.next_offset, None);
        assert_eq!(page.source, Source::Primary);
    }

    #[tokio::test]
    async fn test_failing_source_is_skipped() {
        let mut mock = MockCatalogBackend::new();
        mock.expect_lookup()
            .with(eq(Source::Primary), eq("batman"), eq(2), eq(0))
            .returning(|_, _, _, _| Err(CatalogError::Backend("down".to_string())));
        mock.expect_lookup()
            .with(eq(Source::Cloud), eq("batman"), eq(2), eq(0))
            .returning(|_, _, _, _| {
                Ok(CatalogSlice {
                    records: records(Source::Cloud, 2),
                    total: 3,
                })
            });

        let page = aggregator(mock).search("batman", 2, 0, SourceSelector::All).await;

        assert_eq!(page.source, Source::Cloud);
        assert_eq!(page.next_offset, Some(2));
    }

    #[tokio::test]
    async fn test_offset_past_end_does_not_fall_back() {
        let mut mock = MockCatalogBackend::new();
        mock.expect_lookup()
            .with(eq(Source::Archive), eq("batman"), eq(5), eq(10))
            .times(1)
            .returning(|_, _, _, _| {
                Ok(CatalogSlice {
                    records: Vec::new(),
                    total: 4,
                })
            });

        let page = aggregator(mock)
            .search("batman", 5, 10, SourceSelector::Only(Source::Archive))
            .await;

        assert!(page.is_empty());
        assert_eq!(page.source, Source::Archive);
        assert_eq!(page.total, 4);
        assert_eq!(page.next_offset, None);
    }

    struct StalledBackend;

    #[async_trait]
    impl CatalogBackend for StalledBackend {
        async fn lookup(
            &self,
            _source: Source,
            _query: &str,
            _limit: usize,
            _offset: usize,
        ) -> Result<CatalogSlice, CatalogError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(CatalogSlice::default())
        }

        async fn record_count(&self) -> usize {
            0
        }
    }

    #[tokio::test]
    async fn test_timeout_is_reported_as_empty() {
        let aggregator = CatalogAggregator::new(
            Arc::new(StalledBackend),
            vec![Source::Primary],
            Duration::from_millis(20),
        );

        let page = aggregator.search("batman", 10, 0, SourceSelector::All).await;

        assert!(page.is_empty());
        assert_eq!(page.source, Source::Primary);
    }

    #[tokio::test]
    async fn test_empty_precedence_uses_every_source() {
        let aggregator = CatalogAggregator::new(
            Arc::new(MockCatalogBackend::new()),
            Vec::new(),
            Duration::from_secs(1),
        );
        assert_eq!(aggregator.sources(), Source::ALL.as_slice());
    }
}
