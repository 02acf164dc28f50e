//! The owned aggregation state shared by the foreground cycle and the
//! background breaking-news poller.
//!
//! Feed, breaking subset, save counter and current day sit behind one
//! async mutex. Every merge, replacement and persist decision is taken
//! while holding it, so no reader sees a half-replaced breaking subset.

use crate::cache::DayCache;
use crate::merge::{Feed, MergeReport};
use crate::models::{CastItem, Lane, NewsItem, RawItem};
use crate::query;
use crate::scrapers::{self, SourceAdapter};
use crate::utils::truncate_for_log;
use chrono::{DateTime, Local, NaiveDate};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

#[derive(Debug)]
struct FeedState {
    feed: Feed,
    /// Feed size at the last successful save. `None` until the first one.
    saved_count: Option<usize>,
    day: NaiveDate,
}

impl FeedState {
    /// Start a fresh feed when the calendar day changed.
    fn roll(&mut self, today: NaiveDate) -> bool {
        if self.day == today {
            return false;
        }
        info!(from = %self.day, to = %today, "New day; clearing feed");
        self.feed = Feed::default();
        self.saved_count = None;
        self.day = today;
        true
    }
}

pub struct Aggregator {
    state: Mutex<FeedState>,
    cache: DayCache,
}

impl Aggregator {
    pub fn new(cache: DayCache, today: NaiveDate) -> Self {
        Self {
            state: Mutex::new(FeedState {
                feed: Feed::default(),
                saved_count: None,
                day: today,
            }),
            cache,
        }
    }

    /// Map raw candidates and merge them in one locked step.
    pub async fn ingest(&self, raw: Vec<RawItem>, lane: Lane, now: DateTime<Local>) -> MergeReport {
        let candidates: Vec<NewsItem> = raw
            .into_iter()
            .filter_map(|r| NewsItem::from_raw(r, now))
            .collect();

        let report = self
            .state
            .lock()
            .await
            .feed
            .merge(candidates, lane, now.date_naive());
        for added in &report.added {
            debug!(?lane, headline = %truncate_for_log(&added.headline, 120), "Added headline");
        }
        info!(
            ?lane,
            added = report.added.len(),
            rejected = report.rejected,
            breaking_replaced = report.breaking_replaced,
            "Merged candidates"
        );
        report
    }

    /// Poll `adapters` and merge whatever they produce into `lane`.
    pub async fn poll<A: SourceAdapter>(
        &self,
        adapters: &[A],
        lane: Lane,
        fetch_timeout: Duration,
    ) -> MergeReport {
        let raw = scrapers::collect(adapters, fetch_timeout).await;
        self.ingest(raw, lane, Local::now()).await
    }

    /// Roll to `now`'s day and seed an empty feed from its snapshot.
    ///
    /// Both steps run under one lock acquisition, so a concurrent merge
    /// cannot slip in between the rollover and the emptiness check. Returns
    /// how many cached items were loaded.
    #[instrument(level = "info", skip_all)]
    pub async fn start_day(&self, now: DateTime<Local>) -> usize {
        let mut state = self.state.lock().await;
        state.roll(now.date_naive());
        if !state.feed.is_empty() {
            return 0;
        }
        let path = self.cache.path_for(state.day);
        let cached = self.cache.load(&path, now).await;
        let day = state.day;
        let report = state.feed.merge(cached, Lane::Latest, day);
        let loaded = report.added.len();
        if loaded > 0 {
            state.saved_count = Some(loaded);
        }
        loaded
    }

    /// Persist the ordered feed when its size changed since the last save.
    ///
    /// The compare-and-mark happens under the lock; the write does not. A
    /// failed write is logged and forgets the mark so the next cycle retries.
    #[instrument(level = "info", skip_all)]
    pub async fn save_if_changed(&self, now: DateTime<Local>) -> bool {
        let (path, ordered, count, previous) = {
            let mut state = self.state.lock().await;
            let count = state.feed.len();
            if state.saved_count == Some(count) {
                debug!(count, "Feed unchanged; skipping save");
                return false;
            }
            let previous = state.saved_count.replace(count);
            let ordered = query::order_feed(&state.feed.news, now.date_naive());
            (self.cache.path_for(state.day), ordered, count, previous)
        };

        match self.cache.save(&path, &ordered).await {
            Ok(()) => true,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to write news snapshot; will retry next cycle");
                let mut state = self.state.lock().await;
                if state.saved_count == Some(count) {
                    state.saved_count = previous;
                }
                false
            }
        }
    }

    /// One foreground cycle: day start and cold load, breaking merge, latest merge, save.
    #[instrument(level = "info", skip_all, fields(latest = latest.len(), breaking = breaking.len()))]
    pub async fn refresh<A: SourceAdapter>(
        &self,
        latest: &[A],
        breaking: &[A],
        fetch_timeout: Duration,
    ) {
        self.start_day(Local::now()).await;
        self.poll(breaking, Lane::Breaking, fetch_timeout).await;
        self.poll(latest, Lane::Latest, fetch_timeout).await;
        self.save_if_changed(Local::now()).await;
    }

    pub async fn ordered_feed(&self, now: DateTime<Local>) -> Vec<NewsItem> {
        let state = self.state.lock().await;
        query::order_feed(&state.feed.news, now.date_naive())
    }

    pub async fn cast(&self, filter: Option<&str>, now: DateTime<Local>) -> Vec<CastItem> {
        let ordered = self.ordered_feed(now).await;
        query::cast(&ordered, filter, now)
    }

    pub async fn cast_breaking(&self, on_demand: bool, now: DateTime<Local>) -> Vec<CastItem> {
        let state = self.state.lock().await;
        let ordered = query::order_feed(&state.feed.news, now.date_naive());
        query::cast_breaking(&state.feed.breaking, &ordered, on_demand, now)
    }

    pub async fn count(&self) -> usize {
        self.state.lock().await.feed.len()
    }

    pub async fn is_new_breaking_news(&self) -> bool {
        !self.state.lock().await.feed.breaking.is_empty()
    }

    pub async fn has_latest_news(&self) -> bool {
        !self.state.lock().await.feed.is_empty()
    }
}
