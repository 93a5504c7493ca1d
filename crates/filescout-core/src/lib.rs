#![deny(missing_docs)]
//! FileScout core library.
//!
//! Transport-agnostic search sessions: query validation, catalog aggregation,
//! the bounded session store and the callback token codec.

/// Catalog records, backends and the multi-source aggregator.
pub mod catalog;
/// Configuration management.
pub mod config;
/// Search orchestration for fresh queries and follow-up clicks.
pub mod service;
/// Session store holding browsable result sets.
pub mod session;
/// Catalog source identifiers.
pub mod source;
/// Callback token codec.
pub mod token;
/// Utility functions.
pub mod utils;
/// Search query validation.
pub mod validator;

pub use catalog::{CatalogAggregator, CatalogBackend, CatalogPage, FileRecord, InMemoryCatalog};
pub use service::{PageView, SearchError, SearchService};
pub use session::{SearchSession, SessionKey, SessionStore};
pub use source::{Source, SourceSelector};
pub use token::{PaginationToken, TokenError};
