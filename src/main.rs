//! # News Ticker
//!
//! Aggregates latest and breaking headlines from news portals and RSS feeds
//! into one deduplicated, day-scoped feed and plays it as a console ticker.
//!
//! ## Features
//!
//! - Scrapes a portal "latest" listing, its breaking teaser and banner, and
//!   RSS/Atom feeds (sources configurable through YAML)
//! - Normalizes relative, localized and feed-native timestamps to one local time
//! - Drops headlines that repeat (or extend) one already in the feed
//! - Keeps a per-day JSON snapshot so restarts resume the day's feed
//! - Polls breaking news in the background while the ticker plays
//!
//! ## Usage
//!
//! ```sh
//! news_ticker --news-dir ./data
//! news_ticker --once --filter "signal no"
//! ```
//!
//! ## Architecture
//!
//! 1. **Refresh**: roll the day, cold-load the snapshot, merge breaking then
//!    latest sources, save if the feed grew
//! 2. **Poll**: a background task re-merges breaking sources on an interval
//! 3. **Present**: cast the ordered feed and interleave the current breaking lane

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregator;
mod cache;
mod cli;
mod config;
mod fetch;
mod merge;
mod models;
mod query;
mod scheduler;
mod scrapers;
mod ticker;
mod timestamps;
mod utils;

use aggregator::Aggregator;
use cache::DayCache;
use cli::Cli;
use fetch::HttpFetcher;
use scrapers::Source;
use ticker::TickerPass;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("news_ticker starting up");

    let args = Cli::parse();
    debug!(?args.news_dir, ?args.cache_file, ?args.config, "Parsed CLI arguments");

    let feed_config = config::load_config(args.config.as_deref())?;
    info!(
        latest = feed_config.latest.len(),
        breaking = feed_config.breaking.len(),
        "Loaded source configuration"
    );

    let fetch_timeout = Duration::from_secs(args.fetch_timeout_secs);
    let fetcher = HttpFetcher::new(fetch_timeout)?
        .with_retries(args.fetch_retries, Duration::from_millis(500));
    let latest = Source::all_from_config(&feed_config.latest, &fetcher)?;
    let breaking = Source::all_from_config(&feed_config.breaking, &fetcher)?;

    // Early check: the snapshot directory must be writable
    let snapshot_dir = snapshot_dir(&args);
    if let Err(e) = ensure_writable_dir(&snapshot_dir).await {
        error!(
            path = %snapshot_dir.display(),
            error = %e,
            "Snapshot directory is not writable (fix perms or choose a different --news-dir)"
        );
        return Err(e);
    }

    let aggregator = Arc::new(Aggregator::new(
        DayCache::new(&args.news_dir, args.cache_file.clone()),
        Local::now().date_naive(),
    ));

    if args.once {
        aggregator.refresh(&latest, &breaking, fetch_timeout).await;
        print_cast(&aggregator, &args).await;
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller = scheduler::spawn(
        Arc::clone(&aggregator),
        Source::all_from_config(&feed_config.breaking, &fetcher)?,
        Duration::from_secs(args.breaking_interval_secs),
        fetch_timeout,
        shutdown_rx,
    );

    tokio::select! {
        _ = run_ticker(&aggregator, &latest, &breaking, &args) => {}
        _ = shutdown_signal() => {}
    }

    info!("Shutting down");
    if shutdown_tx.send(true).is_err() {
        warn!("Breaking news poller already stopped");
    }
    if let Err(e) = poller.await {
        error!(error = %e, "Breaking news poller ended abnormally");
    }
    Ok(())
}

/// Directory the day snapshots are written to.
fn snapshot_dir(args: &Cli) -> PathBuf {
    match args.cache_file.as_deref().and_then(Path::parent) {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        Some(_) => PathBuf::from("."),
        None => args.news_dir.join("News"),
    }
}

/// Refresh and play the ticker until the surrounding `select!` drops us.
async fn run_ticker(aggregator: &Aggregator, latest: &[Source], breaking: &[Source], args: &Cli) {
    let dwell = Duration::from_secs(args.dwell_secs);
    let fetch_timeout = Duration::from_secs(args.fetch_timeout_secs);

    loop {
        println!("\nFetching information from news channels...");
        aggregator.refresh(latest, breaking, fetch_timeout).await;

        if !aggregator.has_latest_news().await {
            println!("\nNo headlines found. Check your internet connection...");
            tokio::time::sleep(dwell.max(Duration::from_secs(1))).await;
            continue;
        }

        let latest_casts = aggregator.cast(args.filter.as_deref(), Local::now()).await;
        let mut pass = TickerPass::new(&latest_casts);
        info!(
            feed = aggregator.count().await,
            latest = latest_casts.len(),
            breaking = aggregator.is_new_breaking_news().await,
            "Starting ticker pass"
        );
        if pass.is_empty() {
            println!("\nNo headlines match the filter.");
            tokio::time::sleep(dwell.max(Duration::from_secs(1))).await;
        }
        while let Some(batch) = pass.next_from(aggregator, args.breaking_on_demand).await {
            for slot in &batch {
                println!("\n{}\n", ticker::banner(slot));
                tokio::time::sleep(dwell).await;
            }
        }
    }
}

async fn print_cast(aggregator: &Aggregator, args: &Cli) {
    let latest = aggregator.cast(args.filter.as_deref(), Local::now()).await;
    if latest.is_empty() {
        println!("No headlines found.");
        return;
    }
    let mut pass = TickerPass::new(&latest);
    while let Some(batch) = pass.next_from(aggregator, args.breaking_on_demand).await {
        for slot in &batch {
            println!("{}\n", ticker::banner(slot));
        }
    }
}

/// Resolve on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
