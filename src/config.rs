//! Source configuration loaded from YAML.
//!
//! The file lists the adapters polled for each lane:
//!
//! ```yaml
//! latest:
//!   - kind: html_section
//!     name: CNN Philippines
//!     url: https://cnnphilippines.com/latest
//!     item_selector: article.media
//!   - kind: rss_feed
//!     url: https://news.google.com/rss?hl=en-PH&gl=PH&ceid=PH:en
//! breaking:
//!   - kind: breaking_fragment
//!     name: CNN Philippines
//!     url: https://cnnphilippines.com
//! ```
//!
//! Selector fields are CSS selectors and all have defaults matching the
//! portal markup the built-in configuration targets. Without a file,
//! [`FeedConfig::default`] is used.

use serde::Deserialize;
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

const PORTAL_NAME: &str = "CNN Philippines";
const PORTAL_URL: &str = "https://cnnphilippines.com";

/// Adapters to poll, per lane.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FeedConfig {
    #[serde(default)]
    pub latest: Vec<SourceConfig>,
    #[serde(default)]
    pub breaking: Vec<SourceConfig>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            latest: vec![
                SourceConfig::HtmlSection(HtmlSectionConfig {
                    name: PORTAL_NAME.to_string(),
                    url: format!("{PORTAL_URL}/latest"),
                    item_selector: default_item_selector(),
                    headline_selector: default_headline_selector(),
                    paragraph_selector: default_paragraph_selector(),
                }),
                SourceConfig::RssFeed(RssFeedConfig {
                    name: None,
                    url: "https://news.google.com/rss?hl=en-PH&gl=PH&ceid=PH:en".to_string(),
                }),
            ],
            breaking: vec![
                SourceConfig::BreakingBanner(BreakingBannerConfig {
                    name: PORTAL_NAME.to_string(),
                    url: PORTAL_URL.to_string(),
                    container_selector: default_container_selector(),
                    link_selector: default_link_selector(),
                }),
                SourceConfig::BreakingFragment(BreakingFragmentConfig {
                    name: PORTAL_NAME.to_string(),
                    url: PORTAL_URL.to_string(),
                    teaser_selector: default_teaser_selector(),
                    header_selector: default_header_selector(),
                    marker: default_marker(),
                    article_selector: default_article_selector(),
                    byline_selector: default_byline_selector(),
                    dateline_selector: default_dateline_selector(),
                }),
            ],
        }
    }
}

/// One adapter definition.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    HtmlSection(HtmlSectionConfig),
    RssFeed(RssFeedConfig),
    BreakingFragment(BreakingFragmentConfig),
    BreakingBanner(BreakingBannerConfig),
}

/// A listing page with one element per story.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HtmlSectionConfig {
    pub name: String,
    pub url: String,
    #[serde(default = "default_item_selector")]
    pub item_selector: String,
    #[serde(default = "default_headline_selector")]
    pub headline_selector: String,
    /// First match holds the timestamp, second the summary.
    #[serde(default = "default_paragraph_selector")]
    pub paragraph_selector: String,
}

/// An RSS 2.0 or Atom feed.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RssFeedConfig {
    /// Source label used when an entry carries no publisher of its own.
    #[serde(default)]
    pub name: Option<String>,
    pub url: String,
}

/// A home page teaser that links to a breaking story.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BreakingFragmentConfig {
    pub name: String,
    pub url: String,
    #[serde(default = "default_teaser_selector")]
    pub teaser_selector: String,
    #[serde(default = "default_header_selector")]
    pub header_selector: String,
    #[serde(default = "default_marker")]
    pub marker: String,
    #[serde(default = "default_article_selector")]
    pub article_selector: String,
    #[serde(default = "default_byline_selector")]
    pub byline_selector: String,
    #[serde(default = "default_dateline_selector")]
    pub dateline_selector: String,
}

/// A scrolling breaking-news banner.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BreakingBannerConfig {
    pub name: String,
    pub url: String,
    #[serde(default = "default_container_selector")]
    pub container_selector: String,
    #[serde(default = "default_link_selector")]
    pub link_selector: String,
}

fn default_item_selector() -> String {
    "article.media".to_string()
}
fn default_headline_selector() -> String {
    "h4 a".to_string()
}
fn default_paragraph_selector() -> String {
    "p".to_string()
}
fn default_teaser_selector() -> String {
    "div.teaser".to_string()
}
fn default_header_selector() -> String {
    "h2.subhead-lead".to_string()
}
fn default_marker() -> String {
    "BREAKING NEWS".to_string()
}
fn default_article_selector() -> String {
    "article".to_string()
}
fn default_byline_selector() -> String {
    "div.author-byline".to_string()
}
fn default_dateline_selector() -> String {
    "div.dateLine".to_string()
}
fn default_container_selector() -> String {
    "div.breaking-news-content".to_string()
}
fn default_link_selector() -> String {
    "a.fancybox".to_string()
}

/// Load the source configuration, or the built-in one when `path` is `None`.
#[instrument(level = "info")]
pub fn load_config(path: Option<&Path>) -> Result<FeedConfig, Box<dyn Error>> {
    let Some(path) = path else {
        info!("No source config given; using built-in sources");
        return Ok(FeedConfig::default());
    };
    let content = std::fs::read_to_string(path)?;
    let config: FeedConfig = serde_yaml::from_str(&content)?;
    info!(
        latest = config.latest.len(),
        breaking = config.breaking.len(),
        "Loaded source config"
    );
    Ok(config)
}
