//! Selector module for evaluating expressions against HTML documents
//!
//! This module wraps the `scraper` crate behind a small capability:
//! - `SelectorExpr`: a CSS selector with a `::text` / `::attr(x)` / `::html` target
//! - `SelectorDocument` / `Scope`: a parsed page and sub-trees of it
//! - `SelectorMap`: field name to expression, as supplied by configuration

mod document;
mod expr;

pub use document::{Scope, SelectorDocument};
pub use expr::{SelectorExpr, Target};

use crate::{ConfigError, ConfigResult};
use std::collections::BTreeMap;

/// Read-only mapping of field name to selector expression
#[derive(Debug, Clone, Default)]
pub struct SelectorMap {
    entries: BTreeMap<String, SelectorExpr>,
}

impl SelectorMap {
    /// Compiles a raw field → expression table
    ///
    /// # Returns
    ///
    /// * `Ok(SelectorMap)` - Every expression compiled
    /// * `Err(ConfigError::InvalidSelector)` - The first field whose expression is invalid
    pub fn compile(raw: &BTreeMap<String, String>) -> ConfigResult<Self> {
        let mut entries = BTreeMap::new();
        for (field, source) in raw {
            let expr = source
                .parse::<SelectorExpr>()
                .map_err(|source| ConfigError::InvalidSelector {
                    field: field.clone(),
                    source,
                })?;
            entries.insert(field.clone(), expr);
        }
        Ok(Self { entries })
    }

    pub fn get(&self, field: &str) -> Option<&SelectorExpr> {
        self.entries.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.entries.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SelectorExpr)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Compiles a single expression, attributing failures to `field`
pub fn compile_expr(field: &str, source: &str) -> ConfigResult<SelectorExpr> {
    source
        .parse()
        .map_err(|source| ConfigError::InvalidSelector {
            field: field.to_string(),
            source,
        })
}
