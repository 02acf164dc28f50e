//! RSS 2.0 / Atom feed adapter.
//!
//! Aggregator feeds (Google News in the default configuration) differ from
//! portal pages in a few ways the adapter smooths over:
//!
//! - the publisher is nested per entry (`<source url="...">Outlet</source>`),
//!   and the title repeats it as a `" - Outlet"` suffix
//! - descriptions are HTML and end with a syndication footer
//! - `pubDate` is RFC 2822 in GMT, so timestamps take the feed-native UTC path

use super::{FetchOutcome, SourceAdapter, SourceError};
use crate::config::RssFeedConfig;
use crate::fetch::HttpFetcher;
use crate::models::{RawItem, RawTimestamp};
use crate::timestamps::TimestampKind;
use crate::utils::html_to_text;
use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::{info, instrument};

/// Footer appended to every aggregated description.
const SYNDICATION_FOOTER: &str = "View Full coverage on Google News";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    source: Option<ItemSource>,
}

#[derive(Debug, Deserialize)]
struct ItemSource {
    #[serde(rename = "$text", default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct Atom {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    title: Option<Text>,
    #[serde(rename = "link", default)]
    links: Vec<Link>,
    published: Option<String>,
    updated: Option<String>,
    summary: Option<Text>,
    content: Option<Text>,
    source: Option<AtomSource>,
    author: Option<Author>,
}

#[derive(Debug, Deserialize)]
struct Text {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomSource {
    title: Option<Text>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: Option<String>,
}

pub struct RssFeedAdapter {
    name: String,
    fallback_source: String,
    url: String,
    fetcher: HttpFetcher,
}

impl RssFeedAdapter {
    pub fn new(config: &RssFeedConfig, fetcher: HttpFetcher) -> Self {
        let fallback_source = config.name.clone().unwrap_or_default();
        let name = config.name.clone().unwrap_or_else(|| config.url.clone());
        Self {
            name,
            fallback_source,
            url: config.url.clone(),
            fetcher,
        }
    }

    #[instrument(level = "info", skip_all, fields(source = %self.name, url = %self.url))]
    async fn try_fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        let page = self.fetcher.get(&self.url).await?;
        let items = parse_feed(&page.body, &self.fallback_source)?;
        info!(count = items.len(), "Parsed feed");
        Ok(items)
    }
}

impl SourceAdapter for RssFeedAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> FetchOutcome {
        self.try_fetch().await.into()
    }
}

/// Parse an RSS 2.0 or Atom document into raw items.
///
/// `fallback_source` labels entries that carry no publisher of their own.
pub fn parse_feed(xml: &str, fallback_source: &str) -> Result<Vec<RawItem>, SourceError> {
    let xml = scrub_html_entities_for_xml(xml);
    if xml.contains("<feed") && !xml.contains("<rss") {
        let atom: Atom = from_str(&xml)?;
        return Ok(atom
            .entries
            .into_iter()
            .map(|e| atom_entry(e, fallback_source))
            .collect());
    }

    let rss: Rss = from_str(&xml)?;
    Ok(rss
        .channel
        .items
        .into_iter()
        .map(|it| {
            let publisher = it.source.map(|s| s.name);
            build_item(
                it.title.as_deref(),
                publisher.as_deref(),
                fallback_source,
                it.link,
                it.pub_date,
                it.description.as_deref(),
            )
        })
        .collect())
}

fn atom_entry(entry: Entry, fallback_source: &str) -> RawItem {
    let publisher = entry
        .source
        .and_then(|s| s.title)
        .map(|t| t.value)
        .or_else(|| entry.author.and_then(|a| a.name));
    let link = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref().is_none_or(|rel| rel == "alternate"))
        .or_else(|| entry.links.first())
        .and_then(|l| l.href.clone());
    let body = entry.summary.or(entry.content).map(|t| t.value);

    build_item(
        entry.title.as_ref().map(|t| t.value.as_str()),
        publisher.as_deref(),
        fallback_source,
        link,
        entry.published.or(entry.updated),
        body.as_deref(),
    )
}

fn build_item(
    title: Option<&str>,
    publisher: Option<&str>,
    fallback_source: &str,
    link: Option<String>,
    published: Option<String>,
    description: Option<&str>,
) -> RawItem {
    let source = publisher
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(fallback_source)
        .to_string();

    let mut headline = html_to_text(title.unwrap_or_default());
    if !source.is_empty() {
        if let Some(stripped) = headline.strip_suffix(&format!(" - {source}")) {
            headline = stripped.trim_end().to_string();
        }
    }

    let story = description
        .map(|d| html_to_text(d).replace(SYNDICATION_FOOTER, "").trim().to_string())
        .filter(|s| !s.is_empty());

    RawItem {
        headline: Some(headline),
        time: published.map(|p| RawTimestamp::new(p, TimestampKind::Feed)),
        source: Some(source),
        source_url: link.map(|l| l.trim().to_string()),
        story,
        breaking: false,
    }
}

/// Replace HTML-only entities that are not valid in XML.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
