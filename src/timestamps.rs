//! Timestamp normalization between upstream phrases and the canonical local time.
//!
//! Every timestamp that enters the feed goes through [`to_canonical_at`], which
//! understands three upstream shapes:
//!
//! - **Relative** phrases scraped from portals (`"3 hours ago"`, `"about Just now"`)
//! - **Absolute** strings in the portal's own layout, possibly with
//!   Filipino month abbreviations (see [`translate_locale_months`])
//! - **Feed** timestamps (RFC 2822 / RFC 3339) that always carry a UTC marker
//!
//! The inverse direction, [`to_display_at`], renders a canonical time as
//! `"about N hours ago"` and [`format`] renders the absolute
//! `"Monday, 05 Jan 2025 03:04 PM"` layout used in the cache file.
//!
//! Nothing here returns an error. An unparsable timestamp becomes "now".

use chrono::{DateTime, Datelike, Duration, Local, NaiveDateTime, TimeZone, Timelike, Utc};
use tracing::debug;

/// Layout of the canonical timestamp in the cache file and reports.
pub const CANONICAL_FORMAT: &str = "%A, %d %b %Y %I:%M %p";

/// Sentinel phrase portals use for items published this minute.
pub const JUST_NOW: &str = "about Just now";

/// Filipino month abbreviations mapped to the English set chrono parses.
const LOCALE_MONTHS: [(&str, &str); 9] = [
    ("Ene", "Jan"),
    ("Peb", "Feb"),
    ("Abr", "Apr"),
    ("Hun", "Jun"),
    ("Hul", "Jul"),
    ("Ago", "Aug"),
    ("Set", "Sep"),
    ("Nob", "Nov"),
    ("Dis", "Dec"),
];

/// Absolute layouts tried in order after month translation.
const ABSOLUTE_FORMATS: [&str; 7] = [
    CANONICAL_FORMAT,
    "%b %d, %Y %I:%M:%S %p",
    "%b %d, %Y %I:%M %p",
    "%d %b %Y %I:%M %p",
    "%d %b %Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// How an upstream timestamp string should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampKind {
    /// `"5 mins ago"`, `"an hour ago"`, `"2 days ago"`.
    Relative,
    /// A wall-clock string in the local zone.
    Absolute,
    /// A feed-native timestamp with an explicit UTC marker.
    Feed,
}

/// Normalize `raw` relative to `now`, falling back to `now` on any failure.
pub fn to_canonical_at(raw: &str, kind: TimestampKind, now: DateTime<Local>) -> DateTime<Local> {
    let raw = raw.trim();
    if raw.is_empty() {
        return now;
    }

    let parsed = match kind {
        TimestampKind::Relative => Some(parse_relative(raw, now)),
        TimestampKind::Absolute => parse_absolute(raw).or_else(|| {
            let lower = raw.to_lowercase();
            (lower.contains("ago") || lower.contains("just now")).then(|| parse_relative(raw, now))
        }),
        TimestampKind::Feed => parse_feed(raw),
    };

    parsed.unwrap_or_else(|| {
        debug!(raw, ?kind, "Unrecognized timestamp; using now");
        now
    })
}

/// Render `canonical` as a human "N units ago" phrase measured from `now`.
///
/// Buckets floor rather than round, so 90 minutes is `"about 1 hour ago"`.
/// Times in the future render as [`JUST_NOW`].
pub fn to_display_at(canonical: &DateTime<Local>, now: DateTime<Local>) -> String {
    let diff = now.signed_duration_since(*canonical);
    if diff < Duration::zero() {
        return JUST_NOW.to_string();
    }

    let days = diff.num_days();
    let hours = diff.num_hours();
    let mins = diff.num_minutes();

    if days > 0 {
        format!("about {} day{} ago", days, plural(days))
    } else if hours > 0 {
        format!("about {} hour{} ago", hours, plural(hours))
    } else if mins > 0 {
        format!("about {} min{} ago", mins, plural(mins))
    } else {
        JUST_NOW.to_string()
    }
}

/// Render `canonical` in [`CANONICAL_FORMAT`].
pub fn format(canonical: &DateTime<Local>) -> String {
    canonical.format(CANONICAL_FORMAT).to_string()
}

/// Replace locale month abbreviations with the canonical English ones.
///
/// Only whole words are translated, so `"Agosto"` or `"Setyembre"` are left alone.
pub fn translate_locale_months(raw: &str) -> String {
    raw.split(' ')
        .map(|word| {
            let core = word.trim_end_matches(|c: char| c == ',' || c == '.');
            match LOCALE_MONTHS.iter().find(|(from, _)| *from == core) {
                Some((_, to)) => word.replacen(core, to, 1),
                None => word.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn plural(n: i64) -> &'static str {
    if n > 1 { "s" } else { "" }
}

fn parse_relative(raw: &str, now: DateTime<Local>) -> DateTime<Local> {
    let lower = raw.to_lowercase();
    if lower.contains("just now") {
        return now;
    }

    let value: i64 = raw
        .split_whitespace()
        .find(|token| token.chars().all(|c| c.is_ascii_digit()))
        .and_then(|token| token.parse().ok())
        .unwrap_or(0);

    let yesterday_boundary = now - Duration::hours(23) - Duration::minutes(59);

    if lower.contains("min") {
        if value <= 0 { now } else { now - Duration::minutes(value) }
    } else if lower.contains("hour") {
        if value <= 0 {
            now - Duration::minutes(59)
        } else {
            now - Duration::hours(value)
        }
    } else {
        let day = i64::from(now.day());
        if value <= 0 || day - value < 1 {
            return yesterday_boundary;
        }
        now.date_naive()
            .with_day((day - value) as u32)
            .and_then(|date| date.and_hms_opt(now.hour(), now.minute(), 0))
            .and_then(|naive| Local.from_local_datetime(&naive).earliest())
            .unwrap_or(yesterday_boundary)
    }
}

fn parse_absolute(raw: &str) -> Option<DateTime<Local>> {
    let text = raw.strip_prefix("Published").unwrap_or(raw).trim();
    let text = translate_locale_months(text);

    ABSOLUTE_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(&text, fmt)
            .ok()
            .and_then(|naive| Local.from_local_datetime(&naive).earliest())
    })
}

fn parse_feed(raw: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Local));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }
    // Some feeds spell the zone as a bare "GMT"/"UTC" token chrono won't take.
    let stripped = raw
        .strip_suffix("GMT")
        .or_else(|| raw.strip_suffix("UTC"))?
        .trim();
    NaiveDateTime::parse_from_str(stripped, "%a, %d %b %Y %H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive).with_timezone(&Local))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_relative_minutes() {
        let now = at(2025, 1, 15, 12, 30);
        assert_eq!(
            to_canonical_at("5 mins ago", TimestampKind::Relative, now),
            at(2025, 1, 15, 12, 25)
        );
        assert_eq!(to_canonical_at("0 mins ago", TimestampKind::Relative, now), now);
    }

    #[test]
    fn test_relative_hours() {
        let now = at(2025, 1, 15, 12, 30);
        assert_eq!(
            to_canonical_at("3 hours ago", TimestampKind::Relative, now),
            at(2025, 1, 15, 9, 30)
        );
        assert_eq!(
            to_canonical_at("an hour ago", TimestampKind::Relative, now),
            at(2025, 1, 15, 11, 31)
        );
    }

    #[test]
    fn test_relative_days() {
        let now = at(2025, 1, 15, 12, 30);
        assert_eq!(
            to_canonical_at("2 days ago", TimestampKind::Relative, now),
            at(2025, 1, 13, 12, 30)
        );
        assert_eq!(
            to_canonical_at("a day ago", TimestampKind::Relative, now),
            at(2025, 1, 14, 12, 31)
        );
    }

    #[test]
    fn test_relative_days_underflow_clamps() {
        let now = at(2025, 3, 2, 8, 0);
        assert_eq!(
            to_canonical_at("5 days ago", TimestampKind::Relative, now),
            at(2025, 3, 1, 8, 1)
        );
    }

    #[test]
    fn test_just_now_round_trip() {
        let now = at(2025, 1, 15, 12, 30);
        let ts = to_canonical_at("about Just now", TimestampKind::Relative, now);
        assert_eq!(ts, now);
        assert_eq!(to_display_at(&ts, now), JUST_NOW);
    }

    #[test]
    fn test_display_floors_hours() {
        let now = at(2025, 1, 15, 12, 30);
        let ts = now - Duration::minutes(90);
        assert_eq!(to_display_at(&ts, now), "about 1 hour ago");
    }

    #[test]
    fn test_display_buckets() {
        let now = at(2025, 1, 15, 12, 30);
        assert_eq!(to_display_at(&(now - Duration::minutes(1)), now), "about 1 min ago");
        assert_eq!(to_display_at(&(now - Duration::minutes(7)), now), "about 7 mins ago");
        assert_eq!(to_display_at(&(now - Duration::hours(5)), now), "about 5 hours ago");
        assert_eq!(to_display_at(&(now - Duration::days(2)), now), "about 2 days ago");
        assert_eq!(to_display_at(&(now + Duration::minutes(3)), now), JUST_NOW);
    }

    #[test]
    fn test_absolute_canonical_and_locale() {
        let now = at(2025, 1, 15, 12, 30);
        assert_eq!(
            to_canonical_at("Monday, 06 Jan 2025 03:04 PM", TimestampKind::Absolute, now),
            at(2025, 1, 6, 15, 4)
        );
        assert_eq!(
            to_canonical_at("Published Ago 14, 2025 9:05:00 AM", TimestampKind::Absolute, now),
            at(2025, 8, 14, 9, 5)
        );
        assert_eq!(
            to_canonical_at("12 Dis 2024 18:45", TimestampKind::Absolute, now),
            at(2024, 12, 12, 18, 45)
        );
    }

    #[test]
    fn test_absolute_falls_back_to_relative_then_now() {
        let now = at(2025, 1, 15, 12, 30);
        assert_eq!(
            to_canonical_at("Published 10 mins ago", TimestampKind::Absolute, now),
            at(2025, 1, 15, 12, 20)
        );
        assert_eq!(to_canonical_at("sometime", TimestampKind::Absolute, now), now);
        assert_eq!(to_canonical_at("", TimestampKind::Feed, now), now);
    }

    #[test]
    fn test_feed_timestamps_are_utc() {
        let now = at(2025, 1, 15, 12, 30);
        let expected = Utc
            .with_ymd_and_hms(2025, 1, 15, 4, 0, 0)
            .unwrap()
            .with_timezone(&Local);
        assert_eq!(
            to_canonical_at("Wed, 15 Jan 2025 04:00:00 GMT", TimestampKind::Feed, now),
            expected
        );
        assert_eq!(
            to_canonical_at("2025-01-15T04:00:00Z", TimestampKind::Feed, now),
            expected
        );
        assert_eq!(to_canonical_at("not a date", TimestampKind::Feed, now), now);
    }

    #[test]
    fn test_translate_locale_months_whole_words_only() {
        assert_eq!(translate_locale_months("14 Hun 2025"), "14 Jun 2025");
        assert_eq!(translate_locale_months("Nob 3, 2025"), "Nov 3, 2025");
        assert_eq!(translate_locale_months("Agosto 3"), "Agosto 3");
    }

    #[test]
    fn test_format_reads_back() {
        let now = at(2025, 1, 6, 18, 4);
        let ts = at(2025, 1, 6, 15, 4);
        assert_eq!(format(&ts), "Monday, 06 Jan 2025 03:04 PM");
        let back = to_canonical_at(&format(&ts), TimestampKind::Absolute, now);
        assert_eq!(to_display_at(&back, now), "about 3 hours ago");
    }
}
