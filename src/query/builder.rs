use crate::config::{CategoryConfig, Config};
use crate::query::{Overrides, QuerySpec, TranslationTable};
use crate::ConfigError;
use url::Url;

pub const CATEGORY_KEY: &str = "category";
pub const LOCATIONS_KEY: &str = "locations";
pub const PAGE_KEY: &str = "page";
pub const PRICE_KEY: &str = "price";
pub const PRICE_MIN_KEY: &str = "price-min";
pub const PRICE_MAX_KEY: &str = "price-max";

/// Merges caller overrides into a template
///
/// Every template key keeps its default unless `overrides` names it. Keys
/// that only appear in `overrides` are not added.
pub fn merge_overrides(template: &QuerySpec, overrides: &Overrides) -> QuerySpec {
    let mut spec = template.clone();
    for (key, value) in overrides {
        if template.contains(key) {
            spec.set(key.as_str(), value.as_str());
        } else if key != PRICE_MIN_KEY && key != PRICE_MAX_KEY {
            tracing::debug!("Ignoring override for unknown query parameter '{}'", key);
        }
    }
    spec
}

/// Builds search queries and URLs for one ad category
///
/// Parameter resolution order, last wins:
/// 1. the site's `[query.defaults]`
/// 2. the category's `query` preset
/// 3. caller overrides
///
/// Category and location values then go through their translation tables,
/// and `price-min` / `price-max` overrides become `price = "min-max"`.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    base_endpoint: Url,
    template: QuerySpec,
    categories: TranslationTable,
    locations: TranslationTable,
}

impl QueryBuilder {
    pub fn new(
        base_endpoint: Url,
        template: QuerySpec,
        categories: TranslationTable,
        locations: TranslationTable,
    ) -> Self {
        Self {
            base_endpoint,
            template,
            categories,
            locations,
        }
    }

    /// Creates a builder from the site configuration and an optional category preset
    pub fn from_config(
        config: &Config,
        category: Option<&CategoryConfig>,
    ) -> Result<Self, ConfigError> {
        let base_endpoint = Url::parse(&config.site.base_endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!(
                "Invalid base-endpoint '{}': {}",
                config.site.base_endpoint, e
            ))
        })?;

        let mut template = QuerySpec::new(config.query.defaults.clone());
        if let Some(category) = category {
            for (key, value) in &category.query {
                template.set(key.as_str(), value.as_str());
            }
        }

        Ok(Self::new(
            base_endpoint,
            template,
            TranslationTable::new(config.translations.category.clone()),
            TranslationTable::new(config.translations.locations.clone()),
        ))
    }

    /// The defaults overrides are applied to
    pub fn template(&self) -> &QuerySpec {
        &self.template
    }

    /// Resolves the final query for `overrides`
    ///
    /// Pure: identical inputs always give identical output.
    pub fn build(&self, overrides: &Overrides) -> QuerySpec {
        let mut spec = merge_overrides(&self.template, overrides);

        if spec.contains(CATEGORY_KEY) {
            let code = self.categories.translate(spec.get(CATEGORY_KEY));
            spec.set(CATEGORY_KEY, code);
        }

        if spec.contains(LOCATIONS_KEY) {
            let code = self.locations.translate(spec.get(LOCATIONS_KEY));
            spec.set(LOCATIONS_KEY, code);
        }

        if let (Some(min), Some(max)) = (overrides.get(PRICE_MIN_KEY), overrides.get(PRICE_MAX_KEY))
        {
            spec.set(PRICE_KEY, format!("{}-{}", min.trim(), max.trim()));
        }

        spec
    }

    /// The listing URL for `spec`: base endpoint + encoded parameters
    pub fn search_url(&self, spec: &QuerySpec) -> Url {
        let mut url = self.base_endpoint.clone();
        url.query_pairs_mut().clear().extend_pairs(spec.iter());
        url
    }

    /// The listing URL for one page of `spec`
    pub fn page_url(&self, spec: &QuerySpec, page: u32) -> Url {
        self.search_url(&spec.with_page(page))
    }
}
