//! Read-side projections of the feed.

use crate::models::{CastItem, NewsItem};
use crate::timestamps;
use chrono::{DateTime, Local, NaiveDate};
use std::collections::HashSet;

/// Today's items, most recent first.
///
/// The sort is stable so items sharing a timestamp keep insertion order.
/// Exact (case-insensitive) repeats are dropped, first one wins.
pub fn order_feed(items: &[NewsItem], today: NaiveDate) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    let mut ordered: Vec<NewsItem> = items
        .iter()
        .filter(|item| item.timestamp.date_naive() == today)
        .filter(|item| seen.insert(item.headline.to_lowercase()))
        .cloned()
        .collect();
    ordered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    ordered
}

/// Keyword filter.
///
/// A multi-word filter must appear as a phrase in the space-joined words;
/// a single word must equal one of the words exactly.
pub fn is_match(filter: &str, words: &[String]) -> bool {
    let filter = filter.trim().to_lowercase();
    if filter.split_whitespace().count() > 1 {
        words.join(" ").contains(&filter)
    } else {
        words.iter().any(|w| *w == filter)
    }
}

/// Project one item for presentation.
///
/// The report reads `From <source> (<age>).\n\n<headline>.`, without the
/// `From ` when the source is already a byline (`By ...`).
pub fn cast_item(item: &NewsItem, now: DateTime<Local>) -> CastItem {
    let age = timestamps::to_display_at(&item.timestamp, now);
    let report = if item.source_name.starts_with("By ") {
        format!("{} ({}).\n\n{}.", item.source_name, age, item.headline)
    } else {
        format!("From {} ({}).\n\n{}.", item.source_name, age, item.headline)
    };
    CastItem {
        headline: item.headline.clone(),
        report,
        source_url: item.source_url.clone(),
        is_breaking: item.is_breaking,
    }
}

/// Cast every item in `ordered`, keeping those matching `filter` when one is given.
pub fn cast(ordered: &[NewsItem], filter: Option<&str>, now: DateTime<Local>) -> Vec<CastItem> {
    let filter = filter.map(str::trim).filter(|f| !f.is_empty());
    ordered
        .iter()
        .filter(|item| filter.is_none_or(|f| is_match(f, &item.keywords())))
        .map(|item| cast_item(item, now))
        .collect()
}

/// Cast the breaking lane.
///
/// Normally that is the latest breaking wave. `on_demand` instead takes
/// every breaking-flagged item of the ordered feed.
pub fn cast_breaking(
    wave: &[NewsItem],
    ordered: &[NewsItem],
    on_demand: bool,
    now: DateTime<Local>,
) -> Vec<CastItem> {
    if on_demand {
        ordered
            .iter()
            .filter(|item| item.is_breaking)
            .map(|item| cast_item(item, now))
            .collect()
    } else {
        wave.iter().map(|item| cast_item(item, now)).collect()
    }
}
