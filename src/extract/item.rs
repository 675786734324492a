use crate::config::DetailConfig;
use crate::extract::RawExtraction;
use crate::selector::{compile_expr, SelectorDocument, SelectorExpr, SelectorMap};
use crate::ConfigError;

/// Applies the generic and category-specific selector maps to detail pages
#[derive(Debug, Clone)]
pub struct ItemExtractor {
    root: SelectorExpr,
    generic: SelectorMap,
}

impl ItemExtractor {
    pub fn new(root: SelectorExpr, generic: SelectorMap) -> Self {
        Self { root, generic }
    }

    pub fn from_config(config: &DetailConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            compile_expr("detail.root", &config.root)?,
            SelectorMap::compile(&config.fields)?,
        ))
    }

    /// The generic detail selectors
    pub fn generic(&self) -> &SelectorMap {
        &self.generic
    }

    /// Extracts raw fragments from raw detail HTML
    pub fn extract_html(&self, body: &str, category: &SelectorMap) -> RawExtraction {
        self.extract(&SelectorDocument::parse(body), category)
    }

    /// Extracts raw fragments for every generic and category field
    ///
    /// Evaluation is confined to the ad body matched by the root selector.
    /// If the root is missing, every field maps to an empty sequence. A field
    /// declared in both maps accumulates the fragments of both selectors.
    pub fn extract(&self, document: &SelectorDocument, category: &SelectorMap) -> RawExtraction {
        let mut raw = RawExtraction::default();

        let Some(ad) = document.restrict(&self.root) else {
            tracing::debug!("Ad root {} not found, extraction is empty", self.root);
            for field in self.generic.fields().chain(category.fields()) {
                raw.insert(field, Vec::new());
            }
            return raw;
        };

        for (field, expr) in self.generic.iter().chain(category.iter()) {
            raw.append(field, ad.select(expr));
        }

        raw
    }
}
