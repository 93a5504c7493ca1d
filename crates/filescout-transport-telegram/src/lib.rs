#![deny(missing_docs)]
//! Telegram transport adapter for FileScout.

/// Telegram-specific bot implementation.
pub mod bot;
/// Telegram transport configuration.
pub mod config;
/// Telegram runtime entrypoint.
pub mod runner;
