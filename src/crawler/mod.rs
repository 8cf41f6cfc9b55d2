//! Storefront crawling module
//!
//! This module contains the politeness primitives and the crawling client:
//! - Per-host rate limiting
//! - Bounded retry with exponential backoff
//! - Conditional-fetch validator caching
//! - Product handle discovery and per-product fetching

mod client;
mod discovery;
mod etag;
mod limiter;
mod retry;

pub use client::{build_http_client, ProductRecord, StorefrontClient};
pub use discovery::{handle_from_path, handles_from_listing, handles_from_text, has_next_page_marker};
pub use etag::EtagCache;
pub use limiter::RateLimiter;
pub use retry::RetryPolicy;
