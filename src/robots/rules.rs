//! Robots.txt ruleset wrapper
//!
//! Wraps raw robots.txt content behind a simplified permission check using
//! the robotstxt crate's matcher. Matching happens on demand so the stored
//! state stays a plain string.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt ruleset for one origin
#[derive(Debug, Clone)]
pub struct RobotsRules {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    /// Whether to allow everything regardless of content
    allow_all: bool,
}

impl RobotsRules {
    /// Creates a ruleset from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a fully permissive ruleset
    ///
    /// Used when robots.txt cannot be fetched: the gate fails open rather
    /// than blocking a crawl on a missing control file.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Checks whether a URL path is allowed for the given product token
    ///
    /// # Arguments
    ///
    /// * `path` - The URL path to check (e.g. `/products/alpha-serum.js`)
    /// * `product_token` - The crawler's robots.txt product token
    pub fn is_allowed(&self, path: &str, product_token: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, product_token, path)
    }
}
