//! URL helpers for brand identity and request routing
//!
//! Brand identity is keyed by a normalized lowercase origin; the rate
//! limiter is keyed by host. Both normalizations live here.

use url::Url;

/// Extracts the host from a URL, lowercased
///
/// # Arguments
///
/// * `url` - The URL to extract the host from
///
/// # Returns
///
/// * `Some(String)` - The lowercase host
/// * `None` - If the URL has no host
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Normalizes a storefront domain string into a canonical origin
///
/// Accepts either a bare domain (`shop.example.com`) or a full URL and
/// returns `scheme://host` lowercased with no trailing slash, defaulting to
/// https when no scheme is given. This is the identity key for brands.
///
/// # Arguments
///
/// * `domain` - The configured domain or URL
///
/// # Returns
///
/// * `Ok(String)` - The normalized origin, e.g. `https://shop.example.com`
/// * `Err(url::ParseError)` - The input could not be parsed as a URL
pub fn normalize_origin(domain: &str) -> Result<String, url::ParseError> {
    let trimmed = domain.trim().trim_end_matches('/');
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let url = Url::parse(&candidate)?;
    let host = url.host_str().ok_or(url::ParseError::EmptyHost)?;
    let origin = match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host.to_lowercase(), port),
        None => format!("{}://{}", url.scheme(), host.to_lowercase()),
    };
    Ok(origin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_host_lowercases() {
        let url = Url::parse("https://Shop.EXAMPLE.com/products/x").unwrap();
        assert_eq!(extract_host(&url), Some("shop.example.com".to_string()));
    }

    #[test]
    fn test_normalize_bare_domain() {
        assert_eq!(
            normalize_origin("shop.example.com").unwrap(),
            "https://shop.example.com"
        );
    }

    #[test]
    fn test_normalize_full_url_strips_path() {
        assert_eq!(
            normalize_origin("https://Shop.Example.com/collections/all").unwrap(),
            "https://shop.example.com"
        );
    }

    #[test]
    fn test_normalize_trailing_slash() {
        assert_eq!(
            normalize_origin("https://shop.example.com/").unwrap(),
            "https://shop.example.com"
        );
    }

    #[test]
    fn test_normalize_keeps_port() {
        assert_eq!(
            normalize_origin("http://127.0.0.1:8080").unwrap(),
            "http://127.0.0.1:8080"
        );
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert!(normalize_origin("").is_err());
        assert!(normalize_origin("exa mple.com").is_err());
    }
}
