//! News source adapters that turn upstream pages and feeds into raw items.
//!
//! Every adapter implements [`SourceAdapter`]. An adapter never fails its
//! caller: it reports a [`FetchOutcome`], and [`collect`] logs failed
//! outcomes and keeps going with whatever the other sources produced.
//!
//! # Supported Sources
//!
//! | Adapter | Module | Lane | Notes |
//! |---------|--------|------|-------|
//! | HTML section | [`html_section`] | latest | One item per matched listing element |
//! | RSS / Atom feed | [`rss_feed`] | latest | Feed timestamps are UTC |
//! | Breaking teaser | [`breaking_fragment`] | breaking | Follows the teaser link to the article |
//! | Breaking banner | [`breaking_banner`] | breaking | Scrolling banner links on the home page |
//!
//! # Common Patterns
//!
//! Each adapter splits into an async fetch step and a synchronous `parse_*`
//! step. Parsed HTML documents are not `Send`, so they never live across an
//! `.await`; this also lets tests drive the parsers with inline fixtures.

pub mod breaking_banner;
pub mod breaking_fragment;
pub mod html_section;
pub mod rss_feed;

use crate::config::SourceConfig;
use crate::fetch::HttpFetcher;
use crate::models::RawItem;
use futures::future::join_all;
use scraper::Selector;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use breaking_banner::BreakingBannerAdapter;
use breaking_fragment::BreakingFragmentAdapter;
use html_section::HtmlSectionAdapter;
use rss_feed::RssFeedAdapter;

/// Reasons a source produced nothing.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected page structure: {0}")]
    Structure(String),
    #[error("feed parse failed: {0}")]
    Feed(#[from] quick_xml::DeError),
    #[error("invalid selector {0:?}")]
    Selector(String),
}

impl SourceError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            SourceError::Status { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

/// Result of one adapter invocation.
#[derive(Debug)]
pub enum FetchOutcome {
    Items(Vec<RawItem>),
    Failed(SourceError),
}

impl From<Result<Vec<RawItem>, SourceError>> for FetchOutcome {
    fn from(res: Result<Vec<RawItem>, SourceError>) -> Self {
        match res {
            Ok(items) => FetchOutcome::Items(items),
            Err(e) => FetchOutcome::Failed(e),
        }
    }
}

/// A news origin that can be polled for raw candidate items.
pub trait SourceAdapter: Send + Sync {
    /// Label used in logs.
    fn name(&self) -> &str;

    /// Retrieve and extract the current items. Must not panic or propagate errors.
    fn fetch(&self) -> impl Future<Output = FetchOutcome> + Send;
}

/// Any configured source.
pub enum Source {
    HtmlSection(HtmlSectionAdapter),
    RssFeed(RssFeedAdapter),
    BreakingFragment(BreakingFragmentAdapter),
    BreakingBanner(BreakingBannerAdapter),
}

impl Source {
    /// Build the adapter described by `config`, sharing `fetcher`.
    pub fn from_config(config: &SourceConfig, fetcher: HttpFetcher) -> Result<Self, SourceError> {
        Ok(match config {
            SourceConfig::HtmlSection(c) => Source::HtmlSection(HtmlSectionAdapter::new(c, fetcher)?),
            SourceConfig::RssFeed(c) => Source::RssFeed(RssFeedAdapter::new(c, fetcher)),
            SourceConfig::BreakingFragment(c) => {
                Source::BreakingFragment(BreakingFragmentAdapter::new(c, fetcher)?)
            }
            SourceConfig::BreakingBanner(c) => {
                Source::BreakingBanner(BreakingBannerAdapter::new(c, fetcher)?)
            }
        })
    }

    /// Build every adapter in `configs`.
    pub fn all_from_config(
        configs: &[SourceConfig],
        fetcher: &HttpFetcher,
    ) -> Result<Vec<Self>, SourceError> {
        configs
            .iter()
            .map(|c| Source::from_config(c, fetcher.clone()))
            .collect()
    }
}

impl SourceAdapter for Source {
    fn name(&self) -> &str {
        match self {
            Source::HtmlSection(a) => a.name(),
            Source::RssFeed(a) => a.name(),
            Source::BreakingFragment(a) => a.name(),
            Source::BreakingBanner(a) => a.name(),
        }
    }

    async fn fetch(&self) -> FetchOutcome {
        match self {
            Source::HtmlSection(a) => a.fetch().await,
            Source::RssFeed(a) => a.fetch().await,
            Source::BreakingFragment(a) => a.fetch().await,
            Source::BreakingBanner(a) => a.fetch().await,
        }
    }
}

/// Invoke every adapter concurrently, each bounded by `timeout`.
///
/// Items come back in adapter order, then in each adapter's own order.
/// Failed or timed-out adapters contribute nothing.
#[instrument(level = "info", skip_all, fields(adapters = adapters.len()))]
pub async fn collect<A: SourceAdapter>(adapters: &[A], timeout: Duration) -> Vec<RawItem> {
    let outcomes = join_all(adapters.iter().map(|adapter| async move {
        let outcome = match tokio::time::timeout(timeout, adapter.fetch()).await {
            Ok(outcome) => outcome,
            Err(_) => FetchOutcome::Failed(SourceError::Timeout(timeout)),
        };
        (adapter.name(), outcome)
    }))
    .await;

    let mut items = Vec::new();
    for (name, outcome) in outcomes {
        match outcome {
            FetchOutcome::Items(found) => {
                debug!(source = name, count = found.len(), "Source fetched");
                items.extend(found);
            }
            FetchOutcome::Failed(e) => {
                warn!(source = name, error = %e, "Source failed; continuing without it");
            }
        }
    }
    info!(count = items.len(), "Collected raw items");
    items
}

/// Parse a CSS selector taken from configuration.
pub(crate) fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|_| SourceError::Selector(css.to_string()))
}
