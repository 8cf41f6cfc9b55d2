//! Conditional-fetch validator cache
//!
//! Persists the last validator token (entity tag) the origin returned per
//! URL, so re-crawls can send `If-None-Match` and skip unchanged product
//! documents. The backing store is a JSON object file with an explicit
//! load/flush lifecycle; a corrupt or unreadable file is non-fatal and
//! degrades to an empty cache.

use std::collections::HashMap;
use std::path::PathBuf;

/// Durable URL -> validator-token cache
#[derive(Debug)]
pub struct EtagCache {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl EtagCache {
    /// Loads the cache from its backing file
    ///
    /// A missing file yields an empty cache; a corrupt one is logged and
    /// discarded, never raised.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(
                        "Invalid validator cache at {}: {}; starting empty",
                        path.display(),
                        e
                    );
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self { path, entries }
    }

    /// Creates an empty cache that will flush to `path`
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: HashMap::new(),
        }
    }

    /// The last-known validator for a URL
    pub fn get(&self, url: &str) -> Option<&str> {
        self.entries.get(url).map(String::as_str)
    }

    /// Records a validator for a URL; `None` removes the entry
    pub fn set(&mut self, url: &str, token: Option<String>) {
        match token {
            Some(token) if !token.is_empty() => {
                self.entries.insert(url.to_string(), token);
            }
            _ => {
                self.entries.remove(url);
            }
        }
    }

    /// Number of cached validators
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no validators
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persists the cache to its backing file, creating parent directories
    pub fn flush(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(&self.entries)?;
        std::fs::write(&self.path, json)
    }
}
