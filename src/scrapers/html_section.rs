//! Listing-page scraper for a portal's "latest news" section.
//!
//! The page carries one element per story (by default `article.media`).
//! Inside each element the adapter expects:
//!
//! - a headline anchor (`h4 a`) whose `href` links to the full story
//! - paragraphs (`p`): the first holds a relative timestamp such as
//!   `"3 hours ago"`, the second the summary
//!
//! Relative links resolve against the final URL of the listing page.

use super::{FetchOutcome, SourceAdapter, SourceError, selector};
use crate::config::HtmlSectionConfig;
use crate::fetch::HttpFetcher;
use crate::models::{RawItem, RawTimestamp};
use crate::timestamps::TimestampKind;
use crate::utils::clean_text;
use itertools::Itertools;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

pub struct HtmlSectionAdapter {
    name: String,
    url: String,
    item: Selector,
    headline: Selector,
    paragraph: Selector,
    fetcher: HttpFetcher,
}

impl HtmlSectionAdapter {
    pub fn new(config: &HtmlSectionConfig, fetcher: HttpFetcher) -> Result<Self, SourceError> {
        Ok(Self {
            name: config.name.clone(),
            url: config.url.clone(),
            item: selector(&config.item_selector)?,
            headline: selector(&config.headline_selector)?,
            paragraph: selector(&config.paragraph_selector)?,
            fetcher,
        })
    }

    /// Extract one raw item per matched listing element.
    ///
    /// Elements without a headline anchor are skipped. A page with no
    /// matching element at all is reported as a structure failure.
    pub fn parse_section(&self, body: &str, base: &Url) -> Result<Vec<RawItem>, SourceError> {
        let document = Html::parse_document(body);
        let mut matched = 0usize;
        let mut items = Vec::new();

        for element in document.select(&self.item) {
            matched += 1;
            let Some(anchor) = element.select(&self.headline).next() else {
                debug!(source = %self.name, "Listing element without headline anchor");
                continue;
            };

            let headline = clean_text(&anchor.text().join(" "));
            let source_url = anchor
                .value()
                .attr("href")
                .and_then(|href| base.join(href).ok())
                .map(|u| u.to_string());

            let mut paragraphs = element
                .select(&self.paragraph)
                .map(|p| clean_text(&p.text().join(" ")));
            let time = paragraphs
                .next()
                .filter(|t| !t.is_empty())
                .map(|t| RawTimestamp::new(t, TimestampKind::Relative));
            let story = paragraphs.next();

            items.push(RawItem {
                headline: Some(headline),
                time,
                source: Some(self.name.clone()),
                source_url,
                story,
                breaking: false,
            });
        }

        if matched == 0 {
            return Err(SourceError::Structure(format!(
                "no listing elements found on {}",
                base
            )));
        }
        Ok(items)
    }

    #[instrument(level = "info", skip_all, fields(source = %self.name, url = %self.url))]
    async fn try_fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        let page = self.fetcher.get(&self.url).await?;
        let items = self.parse_section(&page.body, &page.url)?;
        info!(count = items.len(), source = %self.name, "Parsed listing page");
        Ok(items)
    }
}

impl SourceAdapter for HtmlSectionAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> FetchOutcome {
        self.try_fetch().await.into()
    }
}
