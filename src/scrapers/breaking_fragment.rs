//! Breaking-news teaser on the portal home page.
//!
//! When the portal has a breaking story, the home page teaser header reads
//! `BREAKING NEWS` and the teaser links to the full article. The adapter
//! follows that link and reads headline, byline and dateline from the
//! article. An article without a headline or dateline yields nothing.

use super::{FetchOutcome, SourceAdapter, SourceError, selector};
use crate::config::BreakingFragmentConfig;
use crate::fetch::HttpFetcher;
use crate::models::{RawItem, RawTimestamp};
use crate::timestamps::TimestampKind;
use crate::utils::clean_text;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

static HEADLINE: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("static selector"));
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("static selector"));

pub struct BreakingFragmentAdapter {
    name: String,
    url: String,
    marker: String,
    teaser: Selector,
    header: Selector,
    article: Selector,
    byline: Selector,
    dateline: Selector,
    fetcher: HttpFetcher,
}

impl BreakingFragmentAdapter {
    pub fn new(config: &BreakingFragmentConfig, fetcher: HttpFetcher) -> Result<Self, SourceError> {
        Ok(Self {
            name: config.name.clone(),
            url: config.url.clone(),
            marker: config.marker.to_uppercase(),
            teaser: selector(&config.teaser_selector)?,
            header: selector(&config.header_selector)?,
            article: selector(&config.article_selector)?,
            byline: selector(&config.byline_selector)?,
            dateline: selector(&config.dateline_selector)?,
            fetcher,
        })
    }

    /// Return the article link when the home page teaser is flagged as breaking.
    pub fn find_breaking_link(&self, body: &str, base: &Url) -> Option<Url> {
        let document = Html::parse_document(body);
        let teaser = document.select(&self.teaser).next()?;
        let header = teaser.select(&self.header).next()?;

        if !element_text(header).to_uppercase().contains(&self.marker) {
            debug!(source = %self.name, "Teaser is not flagged as breaking");
            return None;
        }

        let href = teaser.select(&LINK).next()?.value().attr("href")?;
        base.join(href).ok()
    }

    /// Read the breaking item from the full article page.
    pub fn parse_article(&self, body: &str, url: &Url) -> Option<RawItem> {
        let document = Html::parse_document(body);
        let article = document.select(&self.article).next()?;

        let headline = element_text(article.select(&HEADLINE).next()?);
        if headline.is_empty() {
            return None;
        }

        let dateline = element_text(article.select(&self.dateline).next()?);
        let dateline = dateline.trim_start_matches("Published").trim().to_string();
        if dateline.is_empty() {
            return None;
        }

        let byline = article
            .select(&self.byline)
            .next()
            .map(element_text)
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| self.name.clone());

        Some(RawItem {
            headline: Some(headline),
            time: Some(RawTimestamp::new(dateline, TimestampKind::Absolute)),
            source: Some(byline),
            source_url: Some(url.to_string()),
            story: None,
            breaking: true,
        })
    }

    #[instrument(level = "info", skip_all, fields(source = %self.name, url = %self.url))]
    async fn try_fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        let home = self.fetcher.get(&self.url).await?;
        let Some(link) = self.find_breaking_link(&home.body, &home.url) else {
            return Ok(Vec::new());
        };

        info!(%link, "Breaking teaser found; following link");
        let article = self.fetcher.get(link.as_str()).await?;
        Ok(self
            .parse_article(&article.body, &link)
            .into_iter()
            .collect())
    }
}

impl SourceAdapter for BreakingFragmentAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> FetchOutcome {
        self.try_fetch().await.into()
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedConfig;
    use crate::config::SourceConfig;
    use std::time::Duration;

    fn adapter() -> BreakingFragmentAdapter {
        let config = FeedConfig::default()
            .breaking
            .into_iter()
            .find_map(|c| match c {
                SourceConfig::BreakingFragment(c) => Some(c),
                _ => None,
            })
            .unwrap();
        BreakingFragmentAdapter::new(&config, HttpFetcher::new(Duration::from_secs(1)).unwrap())
            .unwrap()
    }

    #[test]
    fn test_find_breaking_link_requires_marker() {
        let base = Url::parse("https://portal.test/").unwrap();
        let flagged = r#"<div class="teaser">
              <h2 class="subhead-lead white-font">Breaking News</h2>
              <a href="/news/2025/1/15/quake.html">Quake</a>
            </div>"#;
        let plain = r#"<div class="teaser">
              <h2 class="subhead-lead white-font">Top Story</h2>
              <a href="/news/x.html">X</a>
            </div>"#;

        let a = adapter();
        assert_eq!(
            a.find_breaking_link(flagged, &base).map(|u| u.to_string()),
            Some("https://portal.test/news/2025/1/15/quake.html".to_string())
        );
        assert!(a.find_breaking_link(plain, &base).is_none());
        assert!(a.find_breaking_link("<html></html>", &base).is_none());
    }

    #[test]
    fn test_parse_article_extracts_fields() {
        let url = Url::parse("https://portal.test/news/2025/1/15/quake.html").unwrap();
        let body = r#"<article>
              <h1> Magnitude 6.1 quake jolts Luzon </h1>
              <div class="author-byline">By Juan Dela Cruz, Reporter</div>
              <div class="dateLine">Published Jan 15, 2025 9:05:00 AM</div>
            </article>"#;
        let item = adapter().parse_article(body, &url).unwrap();
        assert_eq!(item.headline.as_deref(), Some("Magnitude 6.1 quake jolts Luzon"));
        assert_eq!(item.source.as_deref(), Some("By Juan Dela Cruz, Reporter"));
        assert_eq!(
            item.time,
            Some(RawTimestamp::new("Jan 15, 2025 9:05:00 AM", TimestampKind::Absolute))
        );
        assert_eq!(item.source_url.as_deref(), Some(url.as_str()));
        assert!(item.breaking);
    }

    #[test]
    fn test_parse_article_missing_parts_yield_nothing() {
        let url = Url::parse("https://portal.test/a").unwrap();
        let no_dateline = r#"<article><h1>Headline only</h1></article>"#;
        let no_headline = r#"<article><div class="dateLine">Published Jan 15, 2025 9:05:00 AM</div></article>"#;
        let a = adapter();
        assert!(a.parse_article(no_dateline, &url).is_none());
        assert!(a.parse_article(no_headline, &url).is_none());
        assert!(a.parse_article("<div>nothing</div>", &url).is_none());
    }

    #[test]
    fn test_parse_article_without_byline_uses_outlet() {
        let url = Url::parse("https://portal.test/a").unwrap();
        let body = r#"<article><h1>Flash flood</h1><div class="dateLine">Published 5 mins ago</div></article>"#;
        let item = adapter().parse_article(body, &url).unwrap();
        assert_eq!(item.source.as_deref(), Some("CNN Philippines"));
    }
}
