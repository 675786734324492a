use crate::config::Config;
use crate::extract::{ItemExtractor, ListingExtractor};
use crate::query::QueryBuilder;
use crate::record::{FieldNormalizer, Record, RecordSchema};
use crate::selector::SelectorMap;
use crate::{ConfigError, HomespaceError};
use url::Url;

/// Everything the crawl controller needs to know about one ad category
///
/// Categories differ only in data: a query preset, extra detail selectors
/// and reducers. The profile bundles them with the site-wide pieces so a
/// single controller can crawl any category.
#[derive(Debug, Clone)]
pub struct CrawlProfile {
    category: Option<String>,
    query: QueryBuilder,
    listing: ListingExtractor,
    item: ItemExtractor,
    category_selectors: SelectorMap,
    schema: RecordSchema,
    normalizer: FieldNormalizer,
}

impl CrawlProfile {
    /// Builds the profile for `category`, or the generic profile when `None`
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlProfile)` - All selectors compiled
    /// * `Err(HomespaceError::UnknownCategory)` - `category` is not configured
    /// * `Err(HomespaceError::Config)` - A URL or selector failed to compile
    pub fn from_config(config: &Config, category: Option<&str>) -> Result<Self, HomespaceError> {
        let category_config = match category {
            Some(name) => Some(
                config
                    .category(name)
                    .ok_or_else(|| HomespaceError::UnknownCategory(name.to_string()))?,
            ),
            None => None,
        };

        let origin = Url::parse(&config.site.origin).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid origin '{}': {}", config.site.origin, e))
        })?;

        let item = ItemExtractor::from_config(&config.detail)?;

        let mut schema = RecordSchema::generic();
        for field in item.generic().fields() {
            schema = schema.with_default_field(field);
        }

        let category_selectors = match category_config {
            Some(c) => {
                for (field, reducer) in &c.reducers {
                    schema = schema.with_field(field.as_str(), *reducer);
                }
                let selectors = SelectorMap::compile(&c.fields)?;
                for field in selectors.fields() {
                    schema = schema.with_default_field(field);
                }
                selectors
            }
            None => SelectorMap::default(),
        };

        Ok(Self {
            category: category.map(str::to_string),
            query: QueryBuilder::from_config(config, category_config)?,
            listing: ListingExtractor::from_config(&config.listing, origin)?,
            item,
            category_selectors,
            schema,
            normalizer: FieldNormalizer::new(
                config.normalize.separator.as_str(),
                &config.normalize.strip_characters,
            ),
        })
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn query(&self) -> &QueryBuilder {
        &self.query
    }

    pub fn listing(&self) -> &ListingExtractor {
        &self.listing
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// Turns one detail page into a record
    ///
    /// `url` is the page's final address and becomes the record's `url` field.
    pub fn extract_record(&self, url: &Url, body: &str) -> Record {
        let mut raw = self.item.extract_html(body, &self.category_selectors);
        raw.insert("url", vec![url.to_string()]);
        self.normalizer.normalize(&raw, &self.schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::record::{FieldKind, ReducerKind};

    const CONFIG: &str = r#"
[site]
base-endpoint = "https://ads.example.com/recherche/"
origin = "https://ads.example.com/"

[translations.category]
shoes = "53"

[listing]
root = "li"
url = "a::attr(href)"

[detail]
root = "section.ad"

[detail.fields]
title = "h1::text"
images = "img::attr(src)"
seller = "p.seller::text"

[categories.shoes.query]
category = "shoes"

[categories.shoes.fields]
size = "td.size::text"

[categories.shoes.reducers]
size = "join"

[user-agent]
crawler-name = "Homespace"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"
"#;

    #[test]
    fn test_schema_composition() {
        let config = parse_config(CONFIG).unwrap();
        let profile = CrawlProfile::from_config(&config, Some("shoes")).unwrap();

        let schema = profile.schema();
        assert_eq!(schema.kind("images"), Some(FieldKind::List));
        assert_eq!(schema.reducer("size"), Some(ReducerKind::Join));
        assert_eq!(schema.reducer("seller"), Some(ReducerKind::First));
        assert_eq!(profile.category(), Some("shoes"));
    }

    #[test]
    fn test_category_preset_translated() {
        let config = parse_config(CONFIG).unwrap();
        let profile = CrawlProfile::from_config(&config, Some("shoes")).unwrap();
        let query = profile.query().build(&Default::default());
        assert_eq!(query.get("category"), Some("53"));

        let generic = CrawlProfile::from_config(&config, None).unwrap();
        assert_eq!(generic.query().build(&Default::default()).get("category"), Some(""));
        assert!(!generic.schema().contains("size"));
    }

    #[test]
    fn test_unknown_category() {
        let config = parse_config(CONFIG).unwrap();
        assert!(matches!(
            CrawlProfile::from_config(&config, Some("boats")),
            Err(HomespaceError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_extract_record() {
        let config = parse_config(CONFIG).unwrap();
        let profile = CrawlProfile::from_config(&config, Some("shoes")).unwrap();
        let url = Url::parse("https://ads.example.com/shoes/7.htm").unwrap();

        let record = profile.extract_record(
            &url,
            r#"<section class="ad"><h1> Derbies </h1><img src="/7.jpg">
               <table><tr><td class="size">41</td><td class="size">42</td></tr></table></section>"#,
        );

        assert_eq!(record.url(), "https://ads.example.com/shoes/7.htm");
        assert_eq!(record.text("title"), Some("Derbies"));
        assert_eq!(record.text("size"), Some("41 42"));
        assert_eq!(record.list("images"), Some(&["/7.jpg".to_string()][..]));
        assert_eq!(record.text("description"), Some(""));
        assert!(!record.is_blank());
    }

    #[test]
    fn test_extract_record_layout_mismatch() {
        let config = parse_config(CONFIG).unwrap();
        let profile = CrawlProfile::from_config(&config, Some("shoes")).unwrap();
        let url = Url::parse("https://ads.example.com/shoes/8.htm").unwrap();

        let record = profile.extract_record(&url, "<html><body><h1>Not found</h1></body></html>");
        assert!(record.is_blank());
        assert_eq!(record.url(), url.as_str());
    }
}
