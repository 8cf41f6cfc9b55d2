//! Integration tests for the crawl-and-digest pipeline
//!
//! These tests use wiremock to stand in for storefront origins and the ads
//! directory, exercising the full cycle: robots gating, discovery,
//! conditional fetching, persistence, and digest computation.

use chrono::NaiveDate;
use merchwire::config::{
    AdsConfig, BrandConfig, Config, CrawlerConfig, StorageConfig, UserAgentConfig,
};
use merchwire::crawler::{build_http_client, EtagCache, RateLimiter, RetryPolicy, StorefrontClient};
use merchwire::digest::DigestAssembler;
use merchwire::robots::RobotsGate;
use merchwire::signals::SignalThresholds;
use merchwire::storage::{SqliteStore, Store};
use merchwire::CrawlError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Mutex;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ALPHA_PRODUCT: &str = r#"{
    "title": "Alpha Serum",
    "variants": [
        {"sku": "ALPHA-1", "price": "39.00", "compare_at_price": "49.00",
         "available": true, "option1": "30ml"}
    ]
}"#;

const BETA_PRODUCT: &str = r#"{
    "title": "Beta Balm",
    "variants": [
        {"sku": "BETA-1", "price": "20.00", "compare_at_price": "25.00", "available": true}
    ]
}"#;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "MerchwireBot".to_string(),
        crawler_version: "1.0".to_string(),
        contact_url: "https://merchwire.example/about".to_string(),
        contact_email: "crawler@merchwire.example".to_string(),
    }
}

fn brand_for(server: &MockServer) -> BrandConfig {
    BrandConfig {
        name: "HexCo".to_string(),
        domain: server.uri(),
        category: "skincare".to_string(),
        ads_account_id: None,
    }
}

/// A storefront client wired for tests: fast retries, loose rate limit
fn test_client(etag_path: &Path) -> (StorefrontClient, Arc<Mutex<EtagCache>>) {
    let http = build_http_client(&user_agent()).expect("client builds");
    let retry = RetryPolicy {
        max_attempts: 2,
        base_delay: Duration::from_millis(10),
    };
    let limiter = Arc::new(RateLimiter::new(50.0));
    let robots = Arc::new(RobotsGate::new(http.clone(), "MerchwireBot", retry.clone()));
    let etags = Arc::new(Mutex::new(EtagCache::load(etag_path)));
    let client = StorefrontClient::new(http, limiter, robots, etags.clone(), retry, 5);
    (client, etags)
}

fn sitemap_for(server: &MockServer, handles: &[&str]) -> String {
    let urls: String = handles
        .iter()
        .map(|handle| format!("<url><loc>{}/products/{}</loc></url>", server.uri(), handle))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><urlset>{}</urlset>",
        urls
    )
}

async fn mount_allow_all_robots(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_crawl_via_sitemap_persists_prices() {
    let server = MockServer::start().await;
    mount_allow_all_robots(&server).await;

    Mock::given(method("GET"))
        .and(path("/sitemap_products_1.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap_for(
            &server,
            &["alpha-serum", "beta-balm"],
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/products/alpha-serum.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ALPHA_PRODUCT))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/products/beta-balm.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BETA_PRODUCT))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let (client, _etags) = test_client(&tmp.path().join("etags.json"));
    let products = client.fetch_products(&brand_for(&server)).await.unwrap();

    assert_eq!(products.len(), 2);
    // Sorted by handle for reproducible persistence order
    assert_eq!(products[0].handle, "alpha-serum");
    assert_eq!(products[0].title, "Alpha Serum");
    assert_eq!(products[1].handle, "beta-balm");

    let mut store = SqliteStore::new(&tmp.path().join("test.db")).unwrap();
    let brand_id = store
        .upsert_brand(&merchwire::storage::BrandSeed {
            name: "HexCo".to_string(),
            domain: server.uri(),
            category: "skincare".to_string(),
            ads_account_id: None,
        })
        .unwrap();
    let written = store
        .persist_crawl(brand_id, &products, day(2025, 3, 9))
        .unwrap();

    assert_eq!(written, 2);
    assert_eq!(store.count_products().unwrap(), 2);

    let rows = store.load_price_rows(day(2025, 3, 9)).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].price_cents, Some(3900));
    assert_eq!(rows[0].compare_at_cents, Some(4900));
}

#[tokio::test]
async fn test_conditional_fetch_round_trip() {
    let server = MockServer::start().await;
    mount_allow_all_robots(&server).await;

    Mock::given(method("GET"))
        .and(path("/sitemap_products_1.xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(sitemap_for(&server, &["alpha-serum"])),
        )
        .mount(&server)
        .await;

    // Mounted first: a conditional request carrying the stored validator
    // gets 304. The general 200 mock below answers the first, unconditional
    // fetch and hands out the validator.
    Mock::given(method("GET"))
        .and(path("/products/alpha-serum.js"))
        .and(header("If-None-Match", "\"v1\""))
        .respond_with(ResponseTemplate::new(304))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/products/alpha-serum.js"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(ALPHA_PRODUCT)
                .insert_header("ETag", "\"v1\""),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let (client, etags) = test_client(&tmp.path().join("etags.json"));
    let brand = brand_for(&server);
    let as_of = day(2025, 3, 9);

    let mut store = SqliteStore::new(&tmp.path().join("test.db")).unwrap();
    let brand_id = store
        .upsert_brand(&merchwire::storage::BrandSeed {
            name: "HexCo".to_string(),
            domain: server.uri(),
            category: "skincare".to_string(),
            ads_account_id: None,
        })
        .unwrap();

    // First crawl: full fetch, validator stored, one price row
    let products = client.fetch_products(&brand).await.unwrap();
    assert_eq!(products.len(), 1);
    store.persist_crawl(brand_id, &products, as_of).unwrap();
    assert_eq!(store.count_price_rows().unwrap(), 1);

    let product_url = format!("{}/products/alpha-serum.js", server.uri());
    assert_eq!(etags.lock().await.get(&product_url), Some("\"v1\""));

    // Second crawl: conditional request answered 304, product skipped, no
    // second row
    let products = client.fetch_products(&brand).await.unwrap();
    assert!(products.is_empty());
    store.persist_crawl(brand_id, &products, as_of).unwrap();
    assert_eq!(store.count_price_rows().unwrap(), 1);
}

#[tokio::test]
async fn test_robots_denial_aborts_brand() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /products/"),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sitemap_products_1.xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(sitemap_for(&server, &["alpha-serum"])),
        )
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let (client, _etags) = test_client(&tmp.path().join("etags.json"));
    let result = client.fetch_products(&brand_for(&server)).await;

    assert!(matches!(result, Err(CrawlError::RobotsDenied { .. })));
}

#[tokio::test]
async fn test_unavailable_product_skipped_siblings_persist() {
    let server = MockServer::start().await;
    mount_allow_all_robots(&server).await;

    Mock::given(method("GET"))
        .and(path("/sitemap_products_1.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap_for(
            &server,
            &["alpha-serum", "gone-product"],
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/products/alpha-serum.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ALPHA_PRODUCT))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/products/gone-product.js"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let (client, _etags) = test_client(&tmp.path().join("etags.json"));
    let products = client.fetch_products(&brand_for(&server)).await.unwrap();

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].handle, "alpha-serum");
}

#[tokio::test]
async fn test_collections_fallback_pagination() {
    let server = MockServer::start().await;
    mount_allow_all_robots(&server).await;

    Mock::given(method("GET"))
        .and(path("/sitemap_products_1.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/collections/all"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<html><body>
                <a href="{0}/products/alpha-serum">Alpha</a>
                <a rel="next" href="{0}/collections/all?page=2">Next</a>
            </body></html>"#,
            server.uri()
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/collections/all"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<html><body><a href="{}/products/beta-balm">Beta</a></body></html>"#,
            server.uri()
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/products/alpha-serum.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ALPHA_PRODUCT))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/products/beta-balm.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BETA_PRODUCT))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let (client, _etags) = test_client(&tmp.path().join("etags.json"));
    let products = client.fetch_products(&brand_for(&server)).await.unwrap();

    let handles: Vec<&str> = products.iter().map(|p| p.handle.as_str()).collect();
    assert_eq!(handles, vec!["alpha-serum", "beta-balm"]);
}

#[tokio::test]
async fn test_full_run_through_assembler() {
    let server = MockServer::start().await;
    mount_allow_all_robots(&server).await;

    Mock::given(method("GET"))
        .and(path("/sitemap_products_1.xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(sitemap_for(&server, &["alpha-serum"])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/products/alpha-serum.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ALPHA_PRODUCT))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ads_archive"))
        .and(query_param("search_page_ids", "123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"data": [
                {"ad_creation_time": "2025-03-09T10:00:00+0000"},
                {"ad_creation_time": "2025-02-01T00:00:00+0000"}
            ]}"#,
        ))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("merchwire.db");
    let config = Config {
        utc_offset: "-08:00".to_string(),
        crawler: CrawlerConfig {
            max_concurrent_products: 5,
            requests_per_second: 50.0,
        },
        user_agent: user_agent(),
        storage: StorageConfig {
            database_path: db_path.display().to_string(),
            etag_cache_path: tmp.path().join("etags.json").display().to_string(),
        },
        signals: SignalThresholds::default(),
        ads: Some(AdsConfig {
            endpoint: format!("{}/ads_archive", server.uri()),
            access_token: "token".to_string(),
        }),
        brands: vec![BrandConfig {
            name: "HexCo".to_string(),
            domain: server.uri(),
            category: "skincare".to_string(),
            ads_account_id: Some("123".to_string()),
        }],
    };

    let as_of = day(2025, 3, 9);
    let mut assembler = DigestAssembler::new(config).unwrap();
    let digest = assembler.run(Some(as_of)).await.unwrap();

    // One discounted SKU and no price history: a leaderboard entry, no movers
    assert_eq!(digest.as_of, as_of);
    assert!(digest.movers.is_empty());
    assert_eq!(digest.leaderboard.len(), 1);
    assert_eq!(digest.leaderboard[0].brand_name, "HexCo");
    assert_eq!(digest.leaderboard[0].rank, 1);
    // Ads were recorded but an empty trailing window never surges
    assert!(digest.ads.is_empty());

    // Observations landed in the store
    let store = SqliteStore::new(&db_path).unwrap();
    assert_eq!(store.count_price_rows().unwrap(), 1);
    let activity = store.load_ad_activity(as_of).unwrap();
    let brand_activity = activity.values().next().unwrap();
    assert_eq!(brand_activity.active_today, 2);
    assert_eq!(brand_activity.new_ads_24h, 1);
}

#[tokio::test]
async fn test_brand_failure_is_isolated() {
    let healthy = MockServer::start().await;
    mount_allow_all_robots(&healthy).await;

    Mock::given(method("GET"))
        .and(path("/sitemap_products_1.xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(sitemap_for(&healthy, &["alpha-serum"])),
        )
        .mount(&healthy)
        .await;

    Mock::given(method("GET"))
        .and(path("/products/alpha-serum.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ALPHA_PRODUCT))
        .mount(&healthy)
        .await;

    // Second origin: everything answers 500, so discovery fails outright
    let broken = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&broken)
        .await;

    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("merchwire.db");
    let config = Config {
        utc_offset: "-08:00".to_string(),
        crawler: CrawlerConfig {
            max_concurrent_products: 5,
            requests_per_second: 50.0,
        },
        user_agent: user_agent(),
        storage: StorageConfig {
            database_path: db_path.display().to_string(),
            etag_cache_path: tmp.path().join("etags.json").display().to_string(),
        },
        signals: SignalThresholds::default(),
        ads: None,
        brands: vec![
            BrandConfig {
                name: "Broken".to_string(),
                domain: broken.uri(),
                category: "skincare".to_string(),
                ads_account_id: None,
            },
            BrandConfig {
                name: "HexCo".to_string(),
                domain: healthy.uri(),
                category: "skincare".to_string(),
                ads_account_id: None,
            },
        ],
    };

    let as_of = day(2025, 3, 9);
    let mut assembler = DigestAssembler::new(config).unwrap();
    let digest = assembler.run(Some(as_of)).await.unwrap();

    // The broken brand degraded; the healthy sibling still landed
    assert_eq!(digest.leaderboard.len(), 1);
    assert_eq!(digest.leaderboard[0].brand_name, "HexCo");

    let store = SqliteStore::new(&db_path).unwrap();
    assert_eq!(store.count_price_rows().unwrap(), 1);
}
