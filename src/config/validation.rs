use crate::config::types::{CategoryConfig, Config, CrawlerConfig, QueryConfig, UserAgentConfig};
use crate::extract::{ItemExtractor, ListingExtractor};
use crate::record::RecordSchema;
use crate::selector::SelectorMap;
use crate::ConfigError;
use std::collections::BTreeMap;
use url::Url;

/// Validates the entire configuration
///
/// Every selector is compiled here, so a crawl never starts with an
/// expression it cannot evaluate.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let origin = validate_site(config)?;
    validate_query(&config.query)?;
    ListingExtractor::from_config(&config.listing, origin)?;
    ItemExtractor::from_config(&config.detail)?;
    for (name, category) in &config.categories {
        validate_category(name, category, &config.detail.fields, &config.query)?;
    }
    validate_user_agent_config(&config.user_agent)?;
    validate_crawler_config(&config.crawler)?;
    Ok(())
}

/// Validates the site endpoints and returns the parsed origin
fn validate_site(config: &Config) -> Result<Url, ConfigError> {
    let base = parse_http_url("base-endpoint", &config.site.base_endpoint)?;
    if base.query().is_some() {
        return Err(ConfigError::Validation(format!(
            "base-endpoint '{}' must not carry a query string",
            config.site.base_endpoint
        )));
    }

    parse_http_url("origin", &config.site.origin)
}

fn parse_http_url(name: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use HTTP or HTTPS",
            name, value
        )));
    }

    Ok(url)
}

/// Validates query defaults and pagination
fn validate_query(config: &QueryConfig) -> Result<(), ConfigError> {
    if config.page_count < 1 {
        return Err(ConfigError::Validation(format!(
            "page-count must be >= 1, got {}",
            config.page_count
        )));
    }

    if config.defaults.is_empty() {
        return Err(ConfigError::Validation(
            "query.defaults cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates one ad category against the generic detail fields
///
/// Category fields extend the generic ones. Redefining a generic record field
/// is rejected even when the site's detail map leaves it out.
fn validate_category(
    name: &str,
    category: &CategoryConfig,
    generic_fields: &BTreeMap<String, String>,
    query: &QueryConfig,
) -> Result<(), ConfigError> {
    SelectorMap::compile(&category.fields)?;

    for field in category.fields.keys().chain(category.reducers.keys()) {
        if RecordSchema::is_generic_field(field) || generic_fields.contains_key(field) {
            return Err(ConfigError::Validation(format!(
                "Category '{}' redefines generic field '{}'",
                name, field
            )));
        }
    }

    for field in category.reducers.keys() {
        if !category.fields.contains_key(field) {
            return Err(ConfigError::Validation(format!(
                "Category '{}' declares a reducer for unknown field '{}'",
                name, field
            )));
        }
    }

    for key in category.query.keys() {
        if !query.defaults.contains_key(key) {
            return Err(ConfigError::Validation(format!(
                "Category '{}' presets unknown query parameter '{}'",
                name, key
            )));
        }
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
