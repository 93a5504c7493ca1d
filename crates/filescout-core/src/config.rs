//! Configuration and settings management
//!
//! Loads search settings from config files and environment variables.

use crate::source::Source;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Results per page (one Telegram message).
pub const DEFAULT_PAGE_SIZE: usize = 10;
/// Number of live sessions that triggers a full store clear.
pub const DEFAULT_SESSION_CEILING: usize = 500;
/// Per-source catalog lookup timeout in seconds.
pub const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 10;
/// Default source precedence list.
pub const DEFAULT_SOURCES: &str = "primary,cloud,archive";
/// Default location of the catalog file.
pub const DEFAULT_CATALOG_PATH: &str = "data/catalog.json";

/// Build the layered configuration shared by every settings struct.
///
/// Sources, later ones win: `config/default`, `config/{RUN_MODE}`,
/// `config/local`, `APP__*` variables, then plain environment variables.
///
/// # Errors
///
/// Returns a `ConfigError` if a present config file cannot be parsed.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Not checked into git
        .add_source(File::with_name("config/local").required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        // UPPER_SNAKE_CASE maps to snake_case; empty values count as unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

/// Invalid search settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// Page size must be positive
    #[error("page_size must be greater than zero")]
    ZeroPageSize,
    /// Session ceiling must be positive
    #[error("session_ceiling must be greater than zero")]
    ZeroCeiling,
    /// The source list names a catalog that does not exist
    #[error("unknown source in sources list: {0}")]
    UnknownSource(String),
    /// The source list is empty
    #[error("sources list is empty")]
    NoSources,
}

/// Settings consumed by the search core.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchSettings {
    /// Records shown per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Live session count above which the store is cleared
    #[serde(default = "default_session_ceiling")]
    pub session_ceiling: usize,
    /// Comma-separated source precedence list
    #[serde(rename = "sources", default = "default_sources")]
    pub sources_str: String,
    /// Per-source lookup timeout in seconds
    #[serde(default = "default_catalog_timeout_secs")]
    pub catalog_timeout_secs: u64,
    /// Path of the JSON catalog file
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
}

const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

const fn default_session_ceiling() -> usize {
    DEFAULT_SESSION_CEILING
}

fn default_sources() -> String {
    DEFAULT_SOURCES.to_string()
}

const fn default_catalog_timeout_secs() -> u64 {
    DEFAULT_CATALOG_TIMEOUT_SECS
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from(DEFAULT_CATALOG_PATH)
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            session_ceiling: DEFAULT_SESSION_CEILING,
            sources_str: default_sources(),
            catalog_timeout_secs: DEFAULT_CATALOG_TIMEOUT_SECS,
            catalog_path: default_catalog_path(),
        }
    }
}

impl SearchSettings {
    /// Load search settings from config files and environment.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use filescout_core::config::SearchSettings;
    ///
    /// let settings = SearchSettings::new().expect("Failed to load configuration");
    /// assert!(settings.page_size > 0);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or the values are invalid.
    pub fn new() -> Result<Self, ConfigError> {
        let settings: Self = build_config()?.try_deserialize()?;
        settings
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(settings)
    }

    /// Check the invariants the core relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.page_size == 0 {
            return Err(SettingsError::ZeroPageSize);
        }
        if self.session_ceiling == 0 {
            return Err(SettingsError::ZeroCeiling);
        }
        let mut seen = 0;
        for token in split_list(&self.sources_str) {
            token
                .parse::<Source>()
                .map_err(|e| SettingsError::UnknownSource(e.0))?;
            seen += 1;
        }
        if seen == 0 {
            return Err(SettingsError::NoSources);
        }
        Ok(())
    }

    /// Sources in precedence order, duplicates and unknown names dropped.
    #[must_use]
    pub fn sources(&self) -> Vec<Source> {
        let mut sources = Vec::new();
        for source in split_list(&self.sources_str).filter_map(|s| s.parse::<Source>().ok()) {
            if !sources.contains(&source) {
                sources.push(source);
            }
        }
        sources
    }

    /// Catalog lookup timeout.
    #[must_use]
    pub const fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_secs)
    }
}

fn split_list(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        env::set_var("PAGE_SIZE", "4");
        env::set_var("SOURCES", "cloud,primary");

        let settings = SearchSettings::new()?;
        assert_eq!(settings.page_size, 4);
        assert_eq!(settings.sources(), vec![Source::Cloud, Source::Primary]);
        assert_eq!(settings.session_ceiling, DEFAULT_SESSION_CEILING);

        env::remove_var("PAGE_SIZE");
        env::remove_var("SOURCES");
        Ok(())
    }

    #[test]
    fn test_sources_parsing() {
        let mut settings = SearchSettings::default();
        assert_eq!(settings.sources(), Source::ALL.to_vec());

        settings.sources_str = "archive; primary archive".to_string();
        assert_eq!(settings.sources(), vec![Source::Archive, Source::Primary]);

        settings.sources_str = "primary, tape".to_string();
        assert_eq!(settings.sources(), vec![Source::Primary]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = SearchSettings::default();
        assert_eq!(settings.validate(), Ok(()));

        settings.page_size = 0;
        assert_eq!(settings.validate(), Err(SettingsError::ZeroPageSize));

        settings.page_size = 5;
        settings.session_ceiling = 0;
        assert_eq!(settings.validate(), Err(SettingsError::ZeroCeiling));

        settings.session_ceiling = 10;
        settings.sources_str = "primary,tape".to_string();
        assert_eq!(
            settings.validate(),
            Err(SettingsError::UnknownSource("tape".to_string()))
        );

        settings.sources_str = " , ".to_string();
        assert_eq!(settings.validate(), Err(SettingsError::NoSources));
    }
}
