//! Command-line interface definitions for the news ticker.
//!
//! All options can be provided via command-line flags, and the ones an
//! operator usually pins per host also via environment variables.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the news ticker.
///
/// # Examples
///
/// ```sh
/// # Run the ticker, caching snapshots under ./data/News
/// news_ticker --news-dir ./data
///
/// # One refresh, print matching headlines, exit
/// news_ticker --once --filter typhoon
///
/// # Custom sources and a faster breaking-news poll
/// NEWS_TICKER_CONFIG=sources.yaml BREAKING_NEWS_TIMEOUT=30 news_ticker
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory whose `News/` subdirectory holds the daily snapshots
    #[arg(short, long, env = "NEWS_DIR", default_value = ".")]
    pub news_dir: PathBuf,

    /// Use this snapshot file instead of the day-stamped one
    #[arg(long)]
    pub cache_file: Option<PathBuf>,

    /// Optional path to a YAML source configuration
    #[arg(short, long, env = "NEWS_TICKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Seconds between background breaking-news polls
    #[arg(long, env = "BREAKING_NEWS_TIMEOUT", default_value_t = 60,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub breaking_interval_secs: u64,

    /// Upper bound in seconds for a single source fetch
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..))]
    pub fetch_timeout_secs: u64,

    /// Retries for a transient HTTP failure before a source gives up
    #[arg(long, default_value_t = 2)]
    pub fetch_retries: usize,

    /// Seconds each ticker slot stays on screen
    #[arg(long, default_value_t = 3)]
    pub dwell_secs: u64,

    /// Only show headlines matching this keyword or phrase
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Refresh once, print the cast and exit
    #[arg(long)]
    pub once: bool,

    /// Show every breaking item of the day instead of only the latest wave
    #[arg(long)]
    pub breaking_on_demand: bool,
}
