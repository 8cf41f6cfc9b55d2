//! Configuration module for Merchwire
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use merchwire::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Tracking {} brands", config.brands.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{AdsConfig, BrandConfig, Config, CrawlerConfig, StorageConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
