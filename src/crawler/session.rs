//! Crawl session state
//!
//! One `CrawlSession` exists per crawl: created when the crawl starts, torn
//! down into a `CrawlSummary` at `Done`. Listing pages and ads move through
//! `CrawlState` individually via `CrawlTask`.

use crate::HomespaceError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use url::Url;

/// Lifecycle of a crawl and of each page it requests
///
/// ```text
/// Init → ListingRequested → ListingParsed → ItemRequested → ItemParsed → Done
/// ```
///
/// Any non-terminal state may also go straight to `Done` (failed fetch,
/// empty listing, cancellation). There are no backward transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlState {
    Init,
    ListingRequested,
    ListingParsed,
    ItemRequested,
    ItemParsed,
    Done,
}

impl CrawlState {
    /// Returns true if moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        use CrawlState::*;
        matches!(
            (self, next),
            (Init, ListingRequested)
                | (ListingRequested, ListingParsed)
                | (ListingParsed, ItemRequested)
                | (ItemRequested, ItemParsed)
                | (Init | ListingRequested | ListingParsed | ItemRequested | ItemParsed, Done)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::ListingRequested => "listing_requested",
            Self::ListingParsed => "listing_parsed",
            Self::ItemRequested => "item_requested",
            Self::ItemParsed => "item_parsed",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn checked_transition(current: &mut CrawlState, next: CrawlState) -> Result<(), HomespaceError> {
    if !current.can_transition_to(next) {
        return Err(HomespaceError::InvalidTransition {
            from: *current,
            to: next,
        });
    }
    *current = next;
    Ok(())
}

/// A single listing page or ad moving through [`CrawlState`]
#[derive(Debug, Clone)]
pub struct CrawlTask {
    url: Url,
    state: CrawlState,
}

impl CrawlTask {
    /// A listing page about to be requested
    pub fn listing(url: Url) -> Self {
        Self {
            url,
            state: CrawlState::Init,
        }
    }

    /// An ad discovered on a parsed listing page
    pub fn item(url: Url) -> Self {
        Self {
            url,
            state: CrawlState::ListingParsed,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn transition(&mut self, next: CrawlState) -> Result<(), HomespaceError> {
        checked_transition(&mut self.state, next)?;
        tracing::trace!("{} -> {}", self.url, next);
        Ok(())
    }
}

/// Per-crawl counters and lifecycle
///
/// Shared by reference between the concurrently running page futures, so
/// every counter is atomic and the state sits behind a mutex.
#[derive(Debug)]
pub struct CrawlSession {
    category: Option<String>,
    started_at: DateTime<Utc>,
    state: Mutex<CrawlState>,
    listing_pages_requested: AtomicUsize,
    listing_pages_failed: AtomicUsize,
    ads_discovered: AtomicUsize,
    records_emitted: AtomicUsize,
    items_skipped: AtomicUsize,
    blank_records_dropped: AtomicUsize,
}

impl CrawlSession {
    pub fn new(category: Option<String>) -> Self {
        Self {
            category,
            started_at: Utc::now(),
            state: Mutex::new(CrawlState::Init),
            listing_pages_requested: AtomicUsize::new(0),
            listing_pages_failed: AtomicUsize::new(0),
            ads_discovered: AtomicUsize::new(0),
            records_emitted: AtomicUsize::new(0),
            items_skipped: AtomicUsize::new(0),
            blank_records_dropped: AtomicUsize::new(0),
        }
    }

    pub fn transition(&self, next: CrawlState) -> Result<(), HomespaceError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        checked_transition(&mut state, next)
    }

    pub fn listing_requested(&self) {
        self.listing_pages_requested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn listing_failed(&self) {
        self.listing_pages_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ads_discovered(&self, count: usize) {
        self.ads_discovered.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_emitted(&self) {
        self.records_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn item_skipped(&self) {
        self.items_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn blank_record_dropped(&self) {
        self.blank_records_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Moves the session to `Done` and produces its summary
    pub fn finish(self, cancelled: bool) -> Result<CrawlSummary, HomespaceError> {
        self.transition(CrawlState::Done)?;

        let finished_at = Utc::now();
        Ok(CrawlSummary {
            category: self.category,
            started_at: self.started_at,
            finished_at,
            duration_ms: (finished_at - self.started_at).num_milliseconds().max(0) as u64,
            listing_pages_requested: self.listing_pages_requested.into_inner(),
            listing_pages_failed: self.listing_pages_failed.into_inner(),
            ads_discovered: self.ads_discovered.into_inner(),
            records_emitted: self.records_emitted.into_inner(),
            items_skipped: self.items_skipped.into_inner(),
            blank_records_dropped: self.blank_records_dropped.into_inner(),
            cancelled,
        })
    }
}

/// What a finished crawl did
#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    pub category: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub listing_pages_requested: usize,
    pub listing_pages_failed: usize,
    pub ads_discovered: usize,
    pub records_emitted: usize,
    pub items_skipped: usize,
    pub blank_records_dropped: usize,
    pub cancelled: bool,
}

impl CrawlSummary {
    /// Logs the summary at info level
    pub fn log(&self) {
        tracing::info!(
            "Crawl {} finished in {}ms: {} listing pages ({} failed), {} ads discovered",
            self.category.as_deref().unwrap_or("(generic)"),
            self.duration_ms,
            self.listing_pages_requested,
            self.listing_pages_failed,
            self.ads_discovered
        );
        tracing::info!(
            "Records: {} emitted, {} skipped, {} blank dropped{}",
            self.records_emitted,
            self.items_skipped,
            self.blank_records_dropped,
            if self.cancelled { " (cancelled)" } else { "" }
        );
    }
}
