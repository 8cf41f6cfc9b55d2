use crate::config::types::{BrandConfig, Config, CrawlerConfig, StorageConfig, UserAgentConfig};
use crate::dates::parse_utc_offset;
use crate::urls::normalize_origin;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    parse_utc_offset(&config.utc_offset)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_storage_config(&config.storage)?;
    validate_brands(&config.brands)?;
    if let Some(ads) = &config.ads {
        Url::parse(&ads.endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid ads endpoint: {}", e)))?;
        if ads.access_token.is_empty() {
            return Err(ConfigError::Validation(
                "ads access-token cannot be empty".to_string(),
            ));
        }
    }
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_products < 1 || config.max_concurrent_products > 50 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_products must be between 1 and 50, got {}",
            config.max_concurrent_products
        )));
    }

    if !(config.requests_per_second > 0.0) || config.requests_per_second > 20.0 {
        return Err(ConfigError::Validation(format!(
            "requests_per_second must be in (0, 20], got {}",
            config.requests_per_second
        )));
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

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.etag_cache_path.is_empty() {
        return Err(ConfigError::Validation(
            "etag_cache_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the brand list
fn validate_brands(brands: &[BrandConfig]) -> Result<(), ConfigError> {
    if brands.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[brands]] entry is required".to_string(),
        ));
    }

    for brand in brands {
        if brand.name.is_empty() {
            return Err(ConfigError::Validation(format!(
                "brand with domain '{}' has an empty name",
                brand.domain
            )));
        }

        if brand.category.is_empty() {
            return Err(ConfigError::Validation(format!(
                "brand '{}' has an empty category",
                brand.name
            )));
        }

        normalize_origin(&brand.domain).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid domain for brand '{}': {}", brand.name, e))
        })?;

        if let Some(account) = &brand.ads_account_id {
            if account.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "brand '{}' has an empty ads-account-id; omit the key instead",
                    brand.name
                )));
            }
        }
    }

    Ok(())
}

/// Basic email validation: one '@' with non-empty local part and dotted domain
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = email.split('@').collect();
    let valid = parts.len() == 2
        && !parts[0].is_empty()
        && parts[1].contains('.')
        && !parts[1].starts_with('.')
        && !parts[1].ends_with('.');

    if !valid {
        return Err(ConfigError::Validation(format!(
            "Invalid contact_email: '{}'",
            email
        )));
    }

    Ok(())
}
