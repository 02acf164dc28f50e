//! Per-day JSON snapshot of the feed.
//!
//! # Output Structure
//!
//! ```text
//! news_dir/
//! └── News/
//!     ├── News-Tuesday, 14 Jan 2025.json
//!     └── News-Wednesday, 15 Jan 2025.json
//! ```
//!
//! Each file is `{"news": [...]}` pretty-printed with a four-space indent
//! and sorted keys. Loading never fails: a missing file is an empty feed,
//! and a corrupt one is logged and treated the same way.

use crate::models::{CachedNewsItem, NewsCache, NewsItem};
use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

const DAY_FORMAT: &str = "%A, %d %b %Y";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache json invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where snapshots live and which file is used for a given day.
#[derive(Debug, Clone)]
pub struct DayCache {
    news_dir: PathBuf,
    fixed_path: Option<PathBuf>,
}

impl DayCache {
    pub fn new(news_dir: impl Into<PathBuf>, fixed_path: Option<PathBuf>) -> Self {
        Self {
            news_dir: news_dir.into(),
            fixed_path,
        }
    }

    /// `{news_dir}/News/News-{Weekday, DD Mon YYYY}.json`, unless a fixed path was configured.
    pub fn path_for(&self, day: NaiveDate) -> PathBuf {
        match &self.fixed_path {
            Some(path) => path.clone(),
            None => self
                .news_dir
                .join("News")
                .join(format!("News-{}.json", day.format(DAY_FORMAT))),
        }
    }

    /// Today's items from the snapshot at `path`.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(&self, path: &Path, now: DateTime<Local>) -> Vec<NewsItem> {
        match read_snapshot(path).await {
            Ok(cache) => {
                let total = cache.news.len();
                let today = now.date_naive();
                let items: Vec<NewsItem> = cache
                    .news
                    .into_iter()
                    .filter_map(|cached| NewsItem::from_cached(cached, now))
                    .filter(|item| item.timestamp.date_naive() == today)
                    .collect();
                info!(total, kept = items.len(), "Loaded cached news");
                items
            }
            Err(CacheError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                debug!("No snapshot for today yet");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable snapshot");
                Vec::new()
            }
        }
    }

    /// Write `items` (already in query order) to `path`, creating parent directories.
    #[instrument(level = "info", skip_all, fields(path = %path.display(), count = items.len()))]
    pub async fn save(&self, path: &Path, items: &[NewsItem]) -> Result<(), CacheError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let snapshot = NewsCache {
            news: items.iter().map(CachedNewsItem::from).collect(),
        };
        fs::write(path, to_pretty_json(&snapshot)?).await?;
        info!("Wrote news snapshot");
        Ok(())
    }
}

async fn read_snapshot(path: &Path) -> Result<NewsCache, CacheError> {
    let text = fs::read_to_string(path).await?;
    if text.trim().is_empty() {
        return Ok(NewsCache::default());
    }
    Ok(serde_json::from_str(&text)?)
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    Ok(buf)
}
