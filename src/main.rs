//! Merchwire main entry point
//!
//! Command-line interface for the storefront pricing and ads signal engine.

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use merchwire::config::load_config_with_hash;
use merchwire::digest::{DailyDigest, DigestAssembler};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Merchwire: storefront pricing and ads signal engine
///
/// Crawls configured storefront brands politely, records daily price and ad
/// observations, and computes the daily digest of movers, brand rankings,
/// and notable ad activity.
#[derive(Parser, Debug)]
#[command(name = "merchwire")]
#[command(version = "1.0.0")]
#[command(about = "Storefront pricing and ads signal engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Observation date (YYYY-MM-DD); defaults to today in the configured zone
    #[arg(long, value_name = "DATE")]
    date: Option<String>,

    /// Recompute the digest from stored data without crawling
    #[arg(long, conflicts_with = "dry_run")]
    digest_only: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Print the digest as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    let as_of = cli
        .date
        .as_deref()
        .map(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .with_context(|| format!("invalid --date '{}'", raw))
        })
        .transpose()?;

    if cli.dry_run {
        print_dry_run(&config);
        return Ok(());
    }

    let mut assembler = DigestAssembler::new(config)?;
    let digest = if cli.digest_only {
        assembler.run_digest_only(as_of)?
    } else {
        assembler.run(as_of).await?
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&digest)?);
    } else {
        print_digest(&digest);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("merchwire=info,warn"),
            1 => EnvFilter::new("merchwire=debug,info"),
            2 => EnvFilter::new("merchwire=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --dry-run: validates config and shows what a run would do
fn print_dry_run(config: &merchwire::Config) {
    println!("=== Merchwire Dry Run ===\n");

    println!("Crawler:");
    println!(
        "  Max concurrent product fetches: {}",
        config.crawler.max_concurrent_products
    );
    println!(
        "  Per-host request rate: {}/s",
        config.crawler.requests_per_second
    );

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);
    println!("  Validator cache: {}", config.storage.etag_cache_path);

    println!("\nSignals:");
    println!("  Mover threshold: {}", config.signals.mover_threshold);
    println!(
        "  Ad surge: {}x median, min delta {}",
        config.signals.ad_surge_multiplier, config.signals.ad_surge_min_delta
    );

    println!(
        "\nAds API: {}",
        if config.ads.is_some() { "configured" } else { "disabled" }
    );

    println!("\nBrands ({}):", config.brands.len());
    for brand in &config.brands {
        let ads = match &brand.ads_account_id {
            Some(account) => format!(", ads account {}", account),
            None => String::new(),
        };
        println!("  - {} [{}] ({}{})", brand.name, brand.category, brand.domain, ads);
    }

    println!("\n✓ Configuration is valid");
}

/// Prints the digest as human-readable text
fn print_digest(digest: &DailyDigest) {
    println!("=== Daily Digest - {} ===\n", digest.as_of);

    println!("Top movers ({}):", digest.movers.len());
    for mover in &digest.movers {
        let delta = mover
            .delta_pct_7d
            .map(|d| format!("{:+.1}%", d * 100.0))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {} - {} [{}]: {} -> {} ({}, discount {:.1}%)",
            mover.brand_name,
            mover.product_title,
            mover.sku.as_deref().unwrap_or("no sku"),
            format_cents(mover.old_price_cents),
            format_cents(mover.new_price_cents),
            delta,
            mover.discount_pct * 100.0
        );
    }

    println!("\nLeaderboard ({}):", digest.leaderboard.len());
    for entry in &digest.leaderboard {
        println!("  #{} {} (score {:.4})", entry.rank, entry.brand_name, entry.score);
    }

    println!("\nNotable ad activity ({}):", digest.ads.len());
    for ad in &digest.ads {
        println!(
            "  {} - {} active ads, {} new in 24h{}",
            ad.brand_name,
            ad.active_ads,
            ad.new_ads_24h,
            if ad.surge { " (surge)" } else { "" }
        );
    }
}

/// Formats integer cents as a currency string
fn format_cents(cents: Option<i64>) -> String {
    match cents {
        Some(cents) => format!("${:.2}", cents as f64 / 100.0),
        None => "-".to_string(),
    }
}
