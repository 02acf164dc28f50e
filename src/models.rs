//! Data models for news items and their cached and presented forms.
//!
//! This module defines the core data structures used throughout the application:
//! - [`RawItem`]: Loosely structured candidate as extracted by a source adapter
//! - [`NewsItem`]: Canonical, validated item held in the running feed
//! - [`NewsCache`] / [`CachedNewsItem`]: On-disk shape of the day snapshot
//! - [`CastItem`]: Presentation-ready projection of a [`NewsItem`]
//!
//! The cache wire format keeps the historical field names, including the
//! literal space in `"source url"`, so older snapshots keep loading.

use crate::timestamps::{self, TimestampKind};
use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Which lane a batch of candidates was collected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    /// Regular "latest news" listing and feeds.
    Latest,
    /// Breaking-news banners and teasers.
    Breaking,
}

/// An unnormalized timestamp together with the way it should be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTimestamp {
    pub text: String,
    pub kind: TimestampKind,
}

impl RawTimestamp {
    pub fn new(text: impl Into<String>, kind: TimestampKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// A candidate item as extracted by a source adapter.
///
/// Every field is optional; validation happens in [`NewsItem::from_raw`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub headline: Option<String>,
    pub time: Option<RawTimestamp>,
    pub source: Option<String>,
    pub source_url: Option<String>,
    pub story: Option<String>,
    pub breaking: bool,
}

/// A normalized news item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsItem {
    pub is_breaking: bool,
    pub headline: String,
    pub timestamp: DateTime<Local>,
    pub source_name: String,
    pub source_url: String,
    pub summary: String,
}

impl NewsItem {
    /// Map a raw candidate into a canonical item, or `None` when it has no headline.
    ///
    /// Double quotes and backticks are stripped from headline and summary.
    /// A missing or unreadable timestamp becomes `now`.
    pub fn from_raw(raw: RawItem, now: DateTime<Local>) -> Option<Self> {
        let headline = strip_quotes(raw.headline.as_deref().unwrap_or_default());
        if headline.is_empty() {
            return None;
        }

        let timestamp = raw
            .time
            .map(|t| timestamps::to_canonical_at(&t.text, t.kind, now))
            .unwrap_or(now);

        Some(Self {
            is_breaking: raw.breaking,
            headline,
            timestamp,
            source_name: raw.source.unwrap_or_default().trim().to_string(),
            source_url: raw.source_url.unwrap_or_default().trim().to_string(),
            summary: strip_quotes(raw.story.as_deref().unwrap_or_default()),
        })
    }

    /// Rebuild an item from its cached form, coercing a bad timestamp to `now`.
    pub fn from_cached(cached: CachedNewsItem, now: DateTime<Local>) -> Option<Self> {
        let headline = cached.headline.trim().to_string();
        if headline.is_empty() {
            return None;
        }
        Some(Self {
            is_breaking: cached.breaking_news,
            headline,
            timestamp: timestamps::to_canonical_at(&cached.time, TimestampKind::Absolute, now),
            source_name: cached.source,
            source_url: cached.source_url,
            summary: cached.story,
        })
    }

    /// The words the keyword filter matches against: headline words then source words.
    pub fn keywords(&self) -> Vec<String> {
        self.headline
            .split(' ')
            .chain(self.source_name.split(' '))
            .map(|w| w.trim().to_lowercase())
            .collect()
    }
}

fn strip_quotes(s: &str) -> String {
    s.replace(['"', '`'], "").trim().to_string()
}

/// The day snapshot document: `{"news": [...]}`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct NewsCache {
    #[serde(default)]
    pub news: Vec<CachedNewsItem>,
}

/// One cached item. Fields are declared in sorted key order so the
/// serialized JSON is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CachedNewsItem {
    #[serde(
        default,
        deserialize_with = "bool_or_string",
        serialize_with = "bool_as_string"
    )]
    pub breaking_news: bool,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub source: String,
    #[serde(rename = "source url", default)]
    pub source_url: String,
    #[serde(default)]
    pub story: String,
    #[serde(default)]
    pub time: String,
}

impl From<&NewsItem> for CachedNewsItem {
    fn from(item: &NewsItem) -> Self {
        Self {
            breaking_news: item.is_breaking,
            headline: item.headline.clone(),
            source: item.source_name.clone(),
            source_url: item.source_url.clone(),
            story: item.summary.clone(),
            time: timestamps::format(&item.timestamp),
        }
    }
}

/// Older snapshots store the flag as `"true"`/`"false"` strings.
fn bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => s.trim().eq_ignore_ascii_case("true"),
    })
}

fn bool_as_string<S>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(if *flag { "true" } else { "false" })
}

/// A presentation-ready projection of a [`NewsItem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastItem {
    pub headline: String,
    /// `"From <source> (<relative time>).\n\n<headline>."`
    pub report: String,
    pub source_url: String,
    pub is_breaking: bool,
}
