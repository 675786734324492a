//! Configuration module for Homespace
//!
//! This module handles loading, parsing, and validating the TOML file that
//! describes a classified-ad site: its search endpoint, query defaults,
//! translation tables, selector maps and ad categories.
//!
//! # Example
//!
//! ```no_run
//! use homespace::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("leboncoin.toml")).unwrap();
//! println!("Listing pages per crawl: {}", config.query.page_count);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_query_template, CategoryConfig, Config, CrawlerConfig, DetailConfig, ListingConfig,
    NormalizeConfig, QueryConfig, SiteConfig, TranslationConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
