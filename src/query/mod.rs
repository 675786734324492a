//! Query module: search parameters and the URLs built from them
//!
//! - `QuerySpec`: resolved parameter set for one listing request
//! - `TranslationTable`: category / location names to site codes
//! - `QueryBuilder`: template + overrides → QuerySpec → search URL
//! - `PageSelection`: which listing pages a crawl requests

mod builder;
mod translate;

pub use builder::{
    merge_overrides, QueryBuilder, CATEGORY_KEY, LOCATIONS_KEY, PAGE_KEY, PRICE_KEY,
    PRICE_MAX_KEY, PRICE_MIN_KEY,
};
pub use translate::TranslationTable;

use std::collections::BTreeMap;

/// Caller-supplied parameter overrides, keyed by parameter name
pub type Overrides = BTreeMap<String, String>;

/// Resolved search parameters, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySpec {
    params: BTreeMap<String, String>,
}

impl QuerySpec {
    pub fn new(params: BTreeMap<String, String>) -> Self {
        Self { params }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Returns a copy with the `page` parameter set
    pub fn with_page(&self, page: u32) -> Self {
        let mut spec = self.clone();
        spec.set(PAGE_KEY, page.to_string());
        spec
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `application/x-www-form-urlencoded` form of the parameters
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

impl From<BTreeMap<String, String>> for QuerySpec {
    fn from(params: BTreeMap<String, String>) -> Self {
        Self::new(params)
    }
}

/// Which listing pages to request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSelection {
    /// Pages 1 through n
    Count(u32),
    /// Exactly these pages, in this order
    Pages(Vec<u32>),
}

impl PageSelection {
    /// The page numbers to request, without duplicates
    pub fn pages(&self) -> Vec<u32> {
        match self {
            Self::Count(n) => (1..=*n).collect(),
            Self::Pages(pages) => {
                let mut seen = Vec::with_capacity(pages.len());
                for page in pages {
                    if !seen.contains(page) {
                        seen.push(*page);
                    }
                }
                seen
            }
        }
    }
}

impl Default for PageSelection {
    fn default() -> Self {
        Self::Count(1)
    }
}
