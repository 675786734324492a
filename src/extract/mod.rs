//! Extraction module: listing pages to previews, detail pages to raw fragments
//!
//! Both extractors are driven entirely by compiled selector maps, so a new
//! site layout or ad category is a configuration change.

mod item;
mod listing;

pub use item::ItemExtractor;
pub use listing::{AdPreview, ListingExtractor};

use std::collections::BTreeMap;

/// Field name → matched fragments for one detail page, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawExtraction {
    fields: BTreeMap<String, Vec<String>>,
}

impl RawExtraction {
    /// Sets the fragments of `field`, replacing any previous ones
    pub fn insert(&mut self, field: impl Into<String>, fragments: Vec<String>) {
        self.fields.insert(field.into(), fragments);
    }

    /// Appends fragments to `field`, creating it if needed
    pub fn append(&mut self, field: impl Into<String>, fragments: Vec<String>) {
        self.fields.entry(field.into()).or_default().extend(fragments);
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
