//! Deduplicating merge of candidate items into the running feed.
//!
//! Sources scraping the same story rarely agree on punctuation or length
//! ("Typhoon hits region" vs "Typhoon hits region - update"), so two
//! headlines are duplicates when either one, trimmed and lowercased,
//! contains the other. The feed never holds two such headlines.
//!
//! The breaking subset always mirrors the latest breaking wave: a batch
//! that adds at least one breaking item replaces it, a batch that adds
//! nothing leaves it alone. Breaking candidates dated on another day are
//! dropped before that rule applies.

use crate::models::{Lane, NewsItem};
use chrono::NaiveDate;
use tracing::debug;

/// The running feed and its breaking subset.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    /// Every item for the current day, in discovery order.
    pub news: Vec<NewsItem>,
    /// The latest breaking wave. Every entry is also present in `news`.
    pub breaking: Vec<NewsItem>,
}

/// What a merge changed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub added: Vec<NewsItem>,
    pub rejected: usize,
    pub breaking_replaced: bool,
}

/// Symmetric, case-insensitive substring containment of two headlines.
///
/// Empty headlines never match anything.
pub fn is_duplicate(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

impl Feed {
    pub fn len(&self) -> usize {
        self.news.len()
    }

    pub fn is_empty(&self) -> bool {
        self.news.is_empty()
    }

    /// Whether `headline` duplicates anything in the feed or the breaking subset.
    pub fn contains_headline(&self, headline: &str) -> bool {
        self.news
            .iter()
            .chain(self.breaking.iter())
            .any(|existing| is_duplicate(&existing.headline, headline))
    }

    /// Fold `candidates` into the feed in order.
    ///
    /// Candidates without a headline are dropped silently. On the breaking
    /// lane candidates not dated `today` are dropped, and accepted items are
    /// flagged `is_breaking` and, when there is at least one, become the new
    /// breaking subset.
    pub fn merge(&mut self, candidates: Vec<NewsItem>, lane: Lane, today: NaiveDate) -> MergeReport {
        let mut accepted: Vec<NewsItem> = Vec::new();
        let mut rejected = 0usize;

        for mut candidate in candidates {
            if candidate.headline.trim().is_empty() {
                rejected += 1;
                continue;
            }
            if lane == Lane::Breaking && candidate.timestamp.date_naive() != today {
                debug!(headline = %candidate.headline, "Breaking item from another day dropped");
                rejected += 1;
                continue;
            }
            let seen = self.contains_headline(&candidate.headline)
                || accepted
                    .iter()
                    .any(|a| is_duplicate(&a.headline, &candidate.headline));
            if seen {
                debug!(headline = %candidate.headline, "Duplicate headline dropped");
                rejected += 1;
                continue;
            }
            if lane == Lane::Breaking {
                candidate.is_breaking = true;
            }
            accepted.push(candidate);
        }

        let breaking_replaced = lane == Lane::Breaking && !accepted.is_empty();
        if breaking_replaced {
            self.breaking = accepted.clone();
        }
        self.news.extend(accepted.iter().cloned());

        MergeReport {
            added: accepted,
            rejected,
            breaking_replaced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Local, TimeZone};

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
    }

    fn today() -> NaiveDate {
        now().date_naive()
    }

    fn item(headline: &str, source: &str) -> NewsItem {
        NewsItem {
            is_breaking: false,
            headline: headline.to_string(),
            timestamp: now(),
            source_name: source.to_string(),
            source_url: String::new(),
            summary: String::new(),
        }
    }

    #[test]
    fn test_is_duplicate_is_symmetric() {
        assert!(is_duplicate("Typhoon hits region", "typhoon HITS region - update"));
        assert!(is_duplicate("typhoon HITS region - update", "Typhoon hits region"));
        assert!(is_duplicate("  Same  ", "same"));
        assert!(!is_duplicate("Typhoon hits region", "Flood hits region"));
        assert!(!is_duplicate("", "anything"));
    }

    #[test]
    fn test_substring_dedup_scenario() {
        let mut feed = Feed::default();
        let report = feed.merge(vec![item("Typhoon hits region", "Outlet A")], Lane::Latest, today());
        assert_eq!(report.added.len(), 1);
        assert_eq!(feed.len(), 1);

        let mut update = item("Typhoon hits region - update", "Outlet B");
        update.timestamp = now() + Duration::minutes(1);
        let report = feed.merge(vec![update], Lane::Latest, today());
        assert!(report.added.is_empty());
        assert_eq!(report.rejected, 1);
        assert_eq!(feed.len(), 1);
        assert_eq!(feed.news[0].source_name, "Outlet A");
    }

    #[test]
    fn test_dedup_either_order() {
        for (first, second) in [("Short", "A short story"), ("A short story", "Short")] {
            let mut feed = Feed::default();
            feed.merge(vec![item(first, "")], Lane::Latest, today());
            feed.merge(vec![item(second, "")], Lane::Latest, today());
            assert_eq!(feed.len(), 1);
        }
    }

    #[test]
    fn test_dedup_within_batch_keeps_first() {
        let mut feed = Feed::default();
        let report = feed.merge(
            vec![item("Rains flood Manila", "A"), item("rains flood manila", "B"), item("Other", "C")],
            Lane::Latest,
            today(),
        );
        assert_eq!(report.added.len(), 2);
        assert_eq!(feed.news[0].source_name, "A");
        assert_eq!(feed.news[1].headline, "Other");
    }

    #[test]
    fn test_empty_headline_dropped() {
        let mut feed = Feed::default();
        let report = feed.merge(vec![item("   ", ""), item("Real", "")], Lane::Latest, today());
        assert_eq!(report.rejected, 1);
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn test_breaking_batch_replaces_subset() {
        let mut feed = Feed::default();
        feed.merge(vec![item("Quake jolts Luzon", "X")], Lane::Breaking, today());
        assert_eq!(feed.breaking.len(), 1);
        assert!(feed.breaking[0].is_breaking);

        let report = feed.merge(
            vec![item("Classes suspended", "X"), item("Storm signal raised", "X")],
            Lane::Breaking,
            today(),
        );
        assert!(report.breaking_replaced);
        let headlines: Vec<_> = feed.breaking.iter().map(|b| b.headline.as_str()).collect();
        assert_eq!(headlines, vec!["Classes suspended", "Storm signal raised"]);
        assert_eq!(feed.len(), 3);
        assert!(
            feed.breaking
                .iter()
                .all(|b| feed.news.iter().any(|n| n == b))
        );
    }

    #[test]
    fn test_empty_breaking_batch_keeps_subset() {
        let mut feed = Feed::default();
        feed.merge(vec![item("Quake jolts Luzon", "X")], Lane::Breaking, today());
        let before = feed.breaking.clone();

        let report = feed.merge(vec![], Lane::Breaking, today());
        assert!(!report.breaking_replaced);
        assert_eq!(feed.breaking, before);

        // A batch made only of repeats adds nothing, so the subset also stays.
        let report = feed.merge(vec![item("QUAKE JOLTS LUZON", "Y")], Lane::Breaking, today());
        assert!(!report.breaking_replaced);
        assert_eq!(feed.breaking, before);
    }

    #[test]
    fn test_latest_lane_never_touches_subset() {
        let mut feed = Feed::default();
        feed.merge(vec![item("Quake jolts Luzon", "X")], Lane::Breaking, today());
        let report = feed.merge(vec![item("Senate session", "Y")], Lane::Latest, today());
        assert!(!report.breaking_replaced);
        assert_eq!(feed.breaking.len(), 1);
        assert!(!feed.news[1].is_breaking);
    }

    #[test]
    fn test_candidate_matching_breaking_subset_is_rejected() {
        let mut feed = Feed::default();
        feed.breaking.push(item("Quake jolts Luzon", "X"));
        let report = feed.merge(vec![item("Quake jolts Luzon again", "Y")], Lane::Latest, today());
        assert!(report.added.is_empty());
    }

    #[test]
    fn test_breaking_from_another_day_is_dropped() {
        let mut feed = Feed::default();
        feed.merge(vec![item("Quake jolts Luzon", "X")], Lane::Breaking, today());

        let mut stale = item("Old teaser story", "X");
        stale.timestamp = now() - Duration::days(1);
        let report = feed.merge(vec![stale.clone()], Lane::Breaking, today());
        assert!(!report.breaking_replaced);
        assert_eq!(report.rejected, 1);
        assert_eq!(feed.breaking[0].headline, "Quake jolts Luzon");
        assert_eq!(feed.len(), 1);

        // The same item on the latest lane is kept; day scoping happens at query time.
        let report = feed.merge(vec![stale], Lane::Latest, today());
        assert_eq!(report.added.len(), 1);
    }
}
