//! Homespace: a classified-ad crawler
//!
//! This crate builds search queries against a classified-ad site, walks the
//! listing pages, fetches each ad's detail page and reduces it to a flat,
//! normalized record. Every site- and category-specific detail (query template,
//! translation tables, selector maps, reducers) is configuration data.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod query;
pub mod record;
pub mod selector;

use thiserror::Error;

/// Main error type for Homespace operations
#[derive(Debug, Error)]
pub enum HomespaceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Unknown ad category: {0}")]
    UnknownCategory(String),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: crawler::CrawlState,
        to: crawler::CrawlState,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector for '{field}': {source}")]
    InvalidSelector {
        field: String,
        source: SelectorError,
    },
}

/// Selector expression errors
#[derive(Debug, Error)]
pub enum SelectorError {
    #[error("Empty selector expression")]
    Empty,

    #[error("Invalid CSS in '{expr}': {message}")]
    Css { expr: String, message: String },

    #[error("Unknown pseudo-element in '{0}'")]
    UnknownPseudo(String),
}

/// Result type alias for Homespace operations
pub type Result<T> = std::result::Result<T, HomespaceError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlController, CrawlState, CrawlSummary};
pub use query::{PageSelection, QueryBuilder, QuerySpec};
pub use record::{Record, Value};
