//! In-memory catalog backend loaded from a JSON file.

use super::{CatalogBackend, CatalogError, CatalogSlice, FileRecord};
use crate::source::Source;
use async_trait::async_trait;
use lazy_regex::regex;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Catalog held entirely in memory.
///
/// Matching is case-insensitive: every whitespace-separated query term must
/// occur in the file name, where `.`, `_`, `-` and brackets count as spaces.
/// Records keep their load order, which doubles as ranking.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    by_source: HashMap<Source, Vec<IndexedRecord>>,
    len: usize,
}

#[derive(Debug)]
struct IndexedRecord {
    record: FileRecord,
    normalized: String,
}

impl InMemoryCatalog {
    /// Build a catalog from records, grouping them by source.
    #[must_use]
    pub fn from_records(records: Vec<FileRecord>) -> Self {
        let len = records.len();
        let mut by_source: HashMap<Source, Vec<IndexedRecord>> = HashMap::new();
        for record in records {
            let normalized = normalize(&record.name);
            by_source
                .entry(record.source)
                .or_default()
                .push(IndexedRecord { record, normalized });
        }
        Self { by_source, len }
    }

    /// Load a catalog from a JSON array of records.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let records: Vec<FileRecord> = serde_json::from_slice(&bytes)?;
        info!("Loaded {} catalog records from {}", records.len(), path.display());
        Ok(Self::from_records(records))
    }

    /// Total number of records across all sources.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the catalog holds no records.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn normalize(text: &str) -> String {
    regex!(r"[\s._\-\[\]()]+")
        .replace_all(&text.to_lowercase(), " ")
        .trim()
        .to_string()
}

#[async_trait]
impl CatalogBackend for InMemoryCatalog {
    async fn lookup(
        &self,
        source: Source,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<CatalogSlice, CatalogError> {
        let Some(entries) = self.by_source.get(&source) else {
            return Ok(CatalogSlice::default());
        };

        let query = normalize(query);
        let terms: Vec<&str> = query.split(' ').filter(|t| !t.is_empty()).collect();
        if terms.is_empty() {
            return Ok(CatalogSlice::default());
        }

        let mut total = 0;
        let mut records = Vec::with_capacity(limit);
        for entry in entries
            .iter()
            .filter(|e| terms.iter().all(|t| e.normalized.contains(t)))
        {
            if total >= offset && records.len() < limit {
                records.push(entry.record.clone());
            }
            total += 1;
        }

        Ok(CatalogSlice { records, total })
    }

    async fn record_count(&self) -> usize {
        self.len
    }
}
