use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Used to record which configuration produced a given ingest run.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const VALID_CONFIG: &str = r#"
utc-offset = "-08:00"

[crawler]
max-concurrent-products = 5
requests-per-second = 1.5

[user-agent]
crawler-name = "MerchwireBot"
crawler-version = "1.0"
contact-url = "https://merchwire.example/about"
contact-email = "crawler@merchwire.example"

[storage]
database-path = "./merchwire.db"
etag-cache-path = "./.cache/etags.json"

[[brands]]
name = "HexCo"
domain = "hexco.com"
category = "skincare"
ads-account-id = "123"
"#;

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_concurrent_products, 5);
        assert_eq!(config.user_agent.crawler_name, "MerchwireBot");
        assert_eq!(config.brands.len(), 1);
        assert_eq!(config.brands[0].ads_account_id.as_deref(), Some("123"));
        assert!(config.ads.is_none());
    }

    #[test]
    fn test_defaults_applied() {
        let minimal = r#"
[crawler]

[user-agent]
crawler-name = "MerchwireBot"
crawler-version = "1.0"
contact-url = "https://merchwire.example/about"
contact-email = "crawler@merchwire.example"

[storage]
database-path = "./merchwire.db"

[[brands]]
name = "HexCo"
domain = "hexco.com"
category = "skincare"
"#;
        let file = create_temp_config(minimal);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.utc_offset, "-08:00");
        assert_eq!(config.crawler.max_concurrent_products, 5);
        assert!((config.crawler.requests_per_second - 1.5).abs() < f64::EPSILON);
        assert!((config.signals.mover_threshold - 0.10).abs() < f64::EPSILON);
        assert_eq!(config.signals.ad_surge_min_delta, 5);
        assert_eq!(config.storage.etag_cache_path, ".cache/etags.json");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let invalid = VALID_CONFIG.replace("requests-per-second = 1.5", "requests-per-second = 0.0");
        let file = create_temp_config(&invalid);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA-256 produces 64 hex characters
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
