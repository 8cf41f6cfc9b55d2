//! Product handle extraction from discovery documents
//!
//! Storefronts expose product URLs under a stable `/products/<handle>` path
//! scheme. Handles are pulled out of the product sitemap (raw XML text) or
//! out of anchor hrefs on catalog listing pages, deduplicated, and returned
//! sorted so repeated crawls see an identical order given identical source
//! data.

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Matches `/products/<handle>`; handles use the storefront slug charset
fn handle_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/products/([A-Za-z0-9._-]+)").expect("valid handle pattern"))
}

/// Extracts the handle from a single URL or path, if it points at a product
pub fn handle_from_path(path: &str) -> Option<String> {
    handle_pattern()
        .captures(path)
        .map(|captures| captures[1].to_string())
}

/// Extracts every product handle mentioned in a text document
///
/// Used for the product sitemap, where URLs sit inside XML elements; the
/// pattern match does not care about the surrounding markup.
pub fn handles_from_text(text: &str) -> BTreeSet<String> {
    handle_pattern()
        .captures_iter(text)
        .map(|captures| captures[1].to_string())
        .collect()
}

/// Extracts product handles from anchor hrefs on a catalog listing page
pub fn handles_from_listing(html: &str) -> BTreeSet<String> {
    let document = Html::parse_document(html);
    let mut handles = BTreeSet::new();

    if let Ok(anchor_selector) = Selector::parse("a[href]") {
        for anchor in document.select(&anchor_selector) {
            if let Some(href) = anchor.value().attr("href") {
                if let Some(handle) = handle_from_path(href) {
                    handles.insert(handle);
                }
            }
        }
    }

    handles
}

/// Whether a catalog listing page advertises a further page
///
/// True when the page carries an anchor with `rel="next"` or a link whose
/// text mentions "Next". Pagination stops when neither is present.
pub fn has_next_page_marker(html: &str) -> bool {
    let document = Html::parse_document(html);

    if let Ok(rel_selector) = Selector::parse("a[rel='next']") {
        if document.select(&rel_selector).next().is_some() {
            return true;
        }
    }

    if let Ok(anchor_selector) = Selector::parse("a") {
        for anchor in document.select(&anchor_selector) {
            let text: String = anchor.text().collect();
            if text.contains("Next") {
                return true;
            }
        }
    }

    false
}
