//! Crawl controller - main crawl orchestration logic
//!
//! This module drives one crawl from query to records:
//! - building the search query and one URL per requested listing page
//! - fetching listing pages and extracting ad previews
//! - fetching every ad's detail page and extracting its record
//! - isolating failures per URL and handling cancellation
//!
//! Listing pages run concurrently; within a page, detail fetches start in
//! document order but may finish in any order. Records are only sent once
//! fully built, so consumers never observe a partial record.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::{FetchResult, Fetcher, HttpFetcher};
use crate::crawler::profile::CrawlProfile;
use crate::crawler::session::{CrawlSession, CrawlState, CrawlSummary, CrawlTask};
use crate::extract::AdPreview;
use crate::query::{Overrides, PageSelection, QuerySpec};
use crate::record::Record;
use crate::HomespaceError;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Orchestrates listing and detail requests for one ad category
pub struct CrawlController {
    fetcher: Arc<dyn Fetcher>,
    profile: CrawlProfile,
    limiter: Option<Arc<Semaphore>>,
    drop_blank_records: bool,
}

impl CrawlController {
    /// Creates a controller around an existing fetcher
    ///
    /// # Arguments
    ///
    /// * `fetcher` - The page fetching layer
    /// * `profile` - Query, selectors and schema of the category to crawl
    /// * `crawler` - Concurrency bound and blank-record policy
    pub fn new(fetcher: Arc<dyn Fetcher>, profile: CrawlProfile, crawler: &CrawlerConfig) -> Self {
        let limiter = match crawler.max_concurrent_requests {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n as usize))),
        };

        Self {
            fetcher,
            profile,
            limiter,
            drop_blank_records: crawler.drop_blank_records,
        }
    }

    /// Creates a controller with the reqwest fetcher described by `config`
    pub fn from_config(config: &Config, category: Option<&str>) -> Result<Self, HomespaceError> {
        let profile = CrawlProfile::from_config(config, category)?;
        let fetcher = HttpFetcher::from_config(&config.user_agent, &config.crawler)?;
        Ok(Self::new(Arc::new(fetcher), profile, &config.crawler))
    }

    pub fn profile(&self) -> &CrawlProfile {
        &self.profile
    }

    /// The listing URLs a crawl with these inputs would request
    pub fn listing_urls(&self, overrides: &Overrides, pages: &PageSelection) -> Vec<Url> {
        let query = self.profile.query().build(overrides);
        pages
            .pages()
            .into_iter()
            .map(|page| self.profile.query().page_url(&query, page))
            .collect()
    }

    /// Runs a crawl, sending each finished record to `sink`
    ///
    /// Failed fetches and unparseable pages are logged and skipped; they never
    /// abort sibling pages. Cancelling `cancel` drops in-flight fetches and
    /// lets the crawl wind down to `Done`. Dropping the receiving end of
    /// `sink` cancels the crawl as well.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - The crawl reached `Done`
    /// * `Err(HomespaceError::InvalidTransition)` - Internal state machine violation
    pub async fn run(
        &self,
        overrides: &Overrides,
        pages: &PageSelection,
        sink: mpsc::UnboundedSender<Record>,
        cancel: CancellationToken,
    ) -> Result<CrawlSummary, HomespaceError> {
        let session = CrawlSession::new(self.profile.category().map(str::to_string));
        session.transition(CrawlState::ListingRequested)?;

        let query = self.profile.query().build(overrides);
        tracing::info!(
            "Starting crawl of {} listing page(s): {}",
            pages.pages().len(),
            query.to_query_string()
        );

        let results = join_all(
            pages
                .pages()
                .into_iter()
                .map(|page| self.crawl_listing_page(&query, page, &session, &sink, &cancel)),
        )
        .await;
        results.into_iter().collect::<Result<(), _>>()?;

        let summary = session.finish(cancel.is_cancelled())?;
        summary.log();
        Ok(summary)
    }

    /// Runs a crawl and gathers every record in memory
    pub async fn collect(
        &self,
        overrides: &Overrides,
        pages: &PageSelection,
    ) -> Result<(Vec<Record>, CrawlSummary), HomespaceError> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let summary = self
            .run(overrides, pages, tx, CancellationToken::new())
            .await?;

        let mut records = Vec::new();
        while let Some(record) = rx.recv().await {
            records.push(record);
        }
        Ok((records, summary))
    }

    async fn crawl_listing_page(
        &self,
        query: &QuerySpec,
        page: u32,
        session: &CrawlSession,
        sink: &mpsc::UnboundedSender<Record>,
        cancel: &CancellationToken,
    ) -> Result<(), HomespaceError> {
        let mut task = CrawlTask::listing(self.profile.query().page_url(query, page));
        task.transition(CrawlState::ListingRequested)?;
        session.listing_requested();

        let body = match self.fetch(task.url(), cancel).await {
            Some(FetchResult::Success { body, .. }) => body,
            Some(failure) => {
                tracing::warn!(
                    "[Page {}] Listing fetch failed for {} ({}): {}",
                    page,
                    task.url(),
                    task.state(),
                    failure
                );
                session.listing_failed();
                return task.transition(CrawlState::Done);
            }
            None => {
                tracing::debug!("[Page {}] Cancelled before listing arrived", page);
                return task.transition(CrawlState::Done);
            }
        };

        let previews = self.profile.listing().extract_html(&body);
        task.transition(CrawlState::ListingParsed)?;
        session.ads_discovered(previews.len());
        tracing::info!("[Page {}] {} ads queued...", page, previews.len());

        let results = join_all(
            previews
                .into_iter()
                .map(|preview| self.crawl_item(preview, session, sink, cancel)),
        )
        .await;

        task.transition(CrawlState::Done)?;
        results.into_iter().collect()
    }

    async fn crawl_item(
        &self,
        preview: AdPreview,
        session: &CrawlSession,
        sink: &mpsc::UnboundedSender<Record>,
        cancel: &CancellationToken,
    ) -> Result<(), HomespaceError> {
        let mut task = CrawlTask::item(preview.url);
        task.transition(CrawlState::ItemRequested)?;

        let (final_url, body) = match self.fetch(task.url(), cancel).await {
            Some(FetchResult::Success {
                final_url, body, ..
            }) => (final_url, body),
            Some(failure) => {
                tracing::warn!("Skipping ad {} ({}): {}", task.url(), task.state(), failure);
                session.item_skipped();
                return task.transition(CrawlState::Done);
            }
            None => {
                tracing::debug!("Dropping in-flight ad {} ({})", task.url(), task.state());
                session.item_skipped();
                return task.transition(CrawlState::Done);
            }
        };

        let record = self.profile.extract_record(&final_url, &body);
        task.transition(CrawlState::ItemParsed)?;

        if record.is_blank() && self.drop_blank_records {
            tracing::warn!("Ad {} matched no fields, dropping it", record.url());
            session.blank_record_dropped();
        } else if sink.send(record).is_err() {
            tracing::warn!("Record receiver closed, cancelling crawl");
            cancel.cancel();
            session.item_skipped();
        } else {
            session.record_emitted();
        }

        task.transition(CrawlState::Done)
    }

    /// Fetches `url`, honouring the concurrency bound and cancellation
    ///
    /// Returns `None` when the crawl was cancelled before the response arrived.
    async fn fetch(&self, url: &Url, cancel: &CancellationToken) -> Option<FetchResult> {
        let _permit = match &self.limiter {
            Some(limiter) => tokio::select! {
                _ = cancel.cancelled() => return None,
                permit = limiter.clone().acquire_owned() => permit.ok(),
            },
            None => None,
        };

        if cancel.is_cancelled() {
            return None;
        }

        tokio::select! {
            _ = cancel.cancelled() => None,
            result = self.fetcher.fetch(url) => Some(result),
        }
    }
}
