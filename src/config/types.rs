use crate::record::ReducerKind;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for one classified-ad site
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub translations: TranslationConfig,
    pub listing: ListingConfig,
    pub detail: DetailConfig,
    #[serde(default)]
    pub normalize: NormalizeConfig,
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryConfig>,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
}

impl Config {
    /// Looks up an ad category by name
    pub fn category(&self, name: &str) -> Option<&CategoryConfig> {
        self.categories.get(name)
    }
}

/// Site endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Search endpoint the encoded query string is appended to
    #[serde(rename = "base-endpoint")]
    pub base_endpoint: String,

    /// Origin relative ad links are resolved against
    pub origin: String,
}

/// Default search query and pagination
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// Number of listing pages requested when the caller does not say
    #[serde(rename = "page-count", default = "default_page_count")]
    pub page_count: u32,

    /// Default value of every query parameter
    #[serde(default = "default_query_template")]
    pub defaults: BTreeMap<String, String>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            page_count: default_page_count(),
            defaults: default_query_template(),
        }
    }
}

fn default_page_count() -> u32 {
    1
}

/// The parameter set the search endpoint understands
pub fn default_query_template() -> BTreeMap<String, String> {
    [
        ("category", ""),
        ("locations", ""),
        ("page", "1"),
        ("price", ""),
        ("search_in", ""),
        ("shippable", "1"),
        ("text", ""),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Human-readable key → site-internal code tables
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslationConfig {
    #[serde(default)]
    pub category: BTreeMap<String, String>,

    #[serde(default)]
    pub locations: BTreeMap<String, String>,
}

/// Selectors applied to a search-results page
#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    /// One match per ad row; fields are evaluated inside each row when set
    pub root: Option<String>,

    pub url: String,
    pub title: Option<String>,
    pub price: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "last-updated")]
    pub last_updated: Option<String>,
    pub images: Option<String>,
}

/// Selectors applied to every ad detail page
#[derive(Debug, Clone, Deserialize)]
pub struct DetailConfig {
    /// The sub-tree holding the ad itself (page chrome excluded)
    pub root: String,

    /// Generic field selectors, evaluated inside `root`
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

/// Text reduction and cleaning
#[derive(Debug, Clone, Deserialize)]
pub struct NormalizeConfig {
    /// Separator used by `join` reducers
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Characters removed from every value in addition to control characters
    #[serde(rename = "strip-characters", default)]
    pub strip_characters: String,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            strip_characters: String::new(),
        }
    }
}

fn default_separator() -> String {
    " ".to_string()
}

/// Per-category additions to the detail extraction
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryConfig {
    /// Query defaults layered over `[query.defaults]`
    #[serde(default)]
    pub query: BTreeMap<String, String>,

    /// Extra detail selectors; must not redefine generic fields
    #[serde(default)]
    pub fields: BTreeMap<String, String>,

    /// Reducer per field; fields left out default to `first`
    #[serde(default)]
    pub reducers: BTreeMap<String, ReducerKind>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of fetches in flight; 0 leaves it to the fetch layer
    #[serde(rename = "max-concurrent-requests", default)]
    pub max_concurrent_requests: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Drop records whose fields (other than `url`) are all empty
    #[serde(rename = "drop-blank-records", default = "default_true")]
    pub drop_blank_records: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 0,
            request_timeout_secs: default_timeout(),
            drop_blank_records: true,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}
