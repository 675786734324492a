//! Crawler module for query-driven ad crawling
//!
//! This module contains the crawl engine, including:
//! - The fetch seam and its reqwest implementation
//! - Per-category crawl profiles (query, selectors, record schema)
//! - Crawl session state and the listing → item state machine
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod profile;
mod session;

pub use coordinator::CrawlController;
pub use fetcher::{build_http_client, fetch_url, FetchResult, Fetcher, HttpFetcher};
pub use profile::CrawlProfile;
pub use session::{CrawlSession, CrawlState, CrawlSummary, CrawlTask};

use crate::config::Config;
use crate::query::{Overrides, PageSelection};
use crate::record::Record;
use crate::HomespaceError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl of one ad category
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Compile the category's query, selectors and record schema
/// 2. Build the HTTP client
/// 3. Request every selected listing page
/// 4. Request every discovered ad and send its record to `sink`
///
/// # Example
///
/// ```no_run
/// use homespace::config::load_config;
/// use homespace::crawler::crawl;
/// use homespace::query::{Overrides, PageSelection};
/// use std::path::Path;
/// use tokio::sync::mpsc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("leboncoin.toml"))?;
/// let (tx, mut rx) = mpsc::unbounded_channel();
/// let summary = crawl(
///     &config,
///     Some("shoes"),
///     &Overrides::new(),
///     &PageSelection::Count(2),
///     tx,
///     CancellationToken::new(),
/// )
/// .await?;
/// while let Some(record) = rx.recv().await {
///     println!("{}", record.url());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn crawl(
    config: &Config,
    category: Option<&str>,
    overrides: &Overrides,
    pages: &PageSelection,
    sink: mpsc::UnboundedSender<Record>,
    cancel: CancellationToken,
) -> Result<CrawlSummary, HomespaceError> {
    let controller = CrawlController::from_config(config, category)?;
    controller.run(overrides, pages, sink, cancel).await
}
