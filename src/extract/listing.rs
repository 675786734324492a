//! Listing page extraction
//!
//! Turns a search-results page into ad previews, each carrying at least the
//! absolute URL of the ad's detail page.

use crate::config::ListingConfig;
use crate::selector::{compile_expr, Scope, SelectorDocument, SelectorExpr};
use crate::ConfigError;
use url::Url;

/// One ad as seen on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdPreview {
    /// Absolute URL of the detail page
    pub url: Url,
    pub title: Option<String>,
    pub price: Option<String>,
    pub location: Option<String>,
    pub last_updated: Option<String>,
    pub images: Vec<String>,
}

/// Applies the listing selector map to search-results pages
#[derive(Debug, Clone)]
pub struct ListingExtractor {
    origin: Url,
    row: Option<SelectorExpr>,
    url: SelectorExpr,
    title: Option<SelectorExpr>,
    price: Option<SelectorExpr>,
    location: Option<SelectorExpr>,
    last_updated: Option<SelectorExpr>,
    images: Option<SelectorExpr>,
}

impl ListingExtractor {
    /// Compiles the listing selectors
    ///
    /// # Arguments
    ///
    /// * `config` - Listing selectors from the site configuration
    /// * `origin` - Base URL relative ad links are resolved against
    pub fn from_config(config: &ListingConfig, origin: Url) -> Result<Self, ConfigError> {
        let optional = |field: &str, source: &Option<String>| {
            source
                .as_deref()
                .map(|s| compile_expr(field, s))
                .transpose()
        };

        Ok(Self {
            origin,
            row: optional("listing.root", &config.root)?,
            url: compile_expr("listing.url", &config.url)?,
            title: optional("listing.title", &config.title)?,
            price: optional("listing.price", &config.price)?,
            location: optional("listing.location", &config.location)?,
            last_updated: optional("listing.last-updated", &config.last_updated)?,
            images: optional("listing.images", &config.images)?,
        })
    }

    /// Extracts previews from raw listing HTML
    pub fn extract_html(&self, body: &str) -> Vec<AdPreview> {
        self.extract(&SelectorDocument::parse(body))
    }

    /// Extracts previews in document order
    ///
    /// With a row selector, every field is scoped to its row; each usable link
    /// in a row yields one preview sharing that row's fields, and rows without
    /// one are skipped. Without a row selector, the link sequence drives the
    /// result and the other fields are paired with it by position.
    /// A page without ads yields an empty vector.
    pub fn extract(&self, document: &SelectorDocument) -> Vec<AdPreview> {
        let root = document.root();
        match &self.row {
            Some(row) => root
                .scopes(row)
                .iter()
                .flat_map(|scope| self.previews_in_row(scope))
                .collect(),
            None => self.previews_by_position(&root),
        }
    }

    fn previews_in_row(&self, row: &Scope<'_>) -> Vec<AdPreview> {
        let first = |expr: &Option<SelectorExpr>| {
            expr.as_ref()
                .and_then(|e| row.select(e).into_iter().next())
        };

        let title = first(&self.title);
        let price = first(&self.price);
        let location = first(&self.location);
        let last_updated = first(&self.last_updated);
        let images = self
            .images
            .as_ref()
            .map(|e| row.select(e))
            .unwrap_or_default();

        row.select(&self.url)
            .iter()
            .filter_map(|href| self.resolve(href))
            .map(|url| AdPreview {
                url,
                title: title.clone(),
                price: price.clone(),
                location: location.clone(),
                last_updated: last_updated.clone(),
                images: images.clone(),
            })
            .collect()
    }

    fn previews_by_position(&self, root: &Scope<'_>) -> Vec<AdPreview> {
        let all = |expr: &Option<SelectorExpr>| {
            expr.as_ref().map(|e| root.select(e)).unwrap_or_default()
        };

        let titles = all(&self.title);
        let prices = all(&self.price);
        let locations = all(&self.location);
        let updates = all(&self.last_updated);
        let images = all(&self.images);

        root.select(&self.url)
            .iter()
            .enumerate()
            .filter_map(|(i, href)| {
                Some(AdPreview {
                    url: self.resolve(href)?,
                    title: titles.get(i).cloned(),
                    price: prices.get(i).cloned(),
                    location: locations.get(i).cloned(),
                    last_updated: updates.get(i).cloned(),
                    images: images.get(i).cloned().into_iter().collect(),
                })
            })
            .collect()
    }

    /// Resolves an ad link against the site origin
    ///
    /// Returns None for links that cannot lead to a detail page:
    /// - empty or fragment-only hrefs
    /// - javascript:, mailto:, tel:, data: schemes
    /// - anything that is not HTTP(S) after resolution
    fn resolve(&self, href: &str) -> Option<Url> {
        let href = href.trim();

        if href.is_empty() || href.starts_with('#') {
            return None;
        }

        if href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with("data:")
        {
            tracing::debug!("Skipping non-navigable ad link {}", href);
            return None;
        }

        match self.origin.join(href) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(url),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("Failed to resolve ad link {}: {}", href, e);
                None
            }
        }
    }
}
