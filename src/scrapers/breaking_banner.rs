//! Scrolling breaking-news banner on the portal home page.
//!
//! The banner container holds one link per breaking headline, separated by
//! `" / "` dividers. Links carry no timestamps, so items are stamped "now".
//! An absent banner just means there is no breaking news.

use super::{FetchOutcome, SourceAdapter, SourceError, selector};
use crate::config::BreakingBannerConfig;
use crate::fetch::HttpFetcher;
use crate::models::RawItem;
use crate::utils::clean_text;
use itertools::Itertools;
use scraper::{Html, Selector};
use tracing::{debug, instrument};

pub struct BreakingBannerAdapter {
    name: String,
    url: String,
    container: Selector,
    link: Selector,
    fetcher: HttpFetcher,
}

impl BreakingBannerAdapter {
    pub fn new(config: &BreakingBannerConfig, fetcher: HttpFetcher) -> Result<Self, SourceError> {
        Ok(Self {
            name: config.name.clone(),
            url: config.url.clone(),
            container: selector(&config.container_selector)?,
            link: selector(&config.link_selector)?,
            fetcher,
        })
    }

    /// One breaking item per banner link.
    pub fn parse_banner(&self, body: &str) -> Vec<RawItem> {
        let document = Html::parse_document(body);
        document
            .select(&self.container)
            .flat_map(|banner| banner.select(&self.link))
            .map(|link| clean_text(&link.text().join(" ").replace(" / ", " ")))
            .filter(|headline| !headline.is_empty())
            .map(|headline| RawItem {
                headline: Some(headline),
                time: None,
                source: Some(self.name.clone()),
                source_url: Some(self.url.clone()),
                story: None,
                breaking: true,
            })
            .collect()
    }

    #[instrument(level = "info", skip_all, fields(source = %self.name, url = %self.url))]
    async fn try_fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        let page = self.fetcher.get(&self.url).await?;
        let items = self.parse_banner(&page.body);
        debug!(count = items.len(), "Parsed breaking banner");
        Ok(items)
    }
}

impl SourceAdapter for BreakingBannerAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> FetchOutcome {
        self.try_fetch().await.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn adapter() -> BreakingBannerAdapter {
        let config = BreakingBannerConfig {
            name: "Portal".to_string(),
            url: "https://portal.test".to_string(),
            container_selector: "div.breaking-news-content".to_string(),
            link_selector: "a.fancybox".to_string(),
        };
        BreakingBannerAdapter::new(&config, HttpFetcher::new(Duration::from_secs(1)).unwrap())
            .unwrap()
    }

    #[test]
    fn test_parse_banner_links() {
        let body = r##"<div class="breaking-news-content runtext-container">
              <a class="fancybox" href="#b1">Palace suspends classes / </a>
              <a class="fancybox" href="#b2"> / Storm signal raised</a>
              <a class="fancybox" href="#b3"> / </a>
              <a class="other" href="#x">Not breaking</a>
            </div>"##;
        let items = adapter().parse_banner(body);
        let headlines: Vec<_> = items.iter().filter_map(|i| i.headline.as_deref()).collect();
        assert_eq!(headlines, vec!["Palace suspends classes", "Storm signal raised"]);
        assert!(items.iter().all(|i| i.breaking));
        assert!(
            items
                .iter()
                .all(|i| i.source_url.as_deref() == Some("https://portal.test"))
        );
    }

    #[test]
    fn test_missing_banner_is_empty() {
        assert!(adapter().parse_banner("<html><body></body></html>").is_empty());
    }
}
