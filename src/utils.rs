//! Utility functions for text cleanup, log shortening, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Scraped text cleanup (non-breaking spaces, decorative punctuation)
//! - HTML fragment to plain text reduction
//! - String truncation for logging
//! - File system validation for the cache directory

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Bullets, arrows, stars and similar ornaments portals sprinkle into headlines.
static DECORATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\u{2022}\u{2023}\u{2043}\u{25A0}-\u{25FF}\u{2580}-\u{259F}\u{2605}\u{2606}\u{2713}\u{2714}\u{27A4}\u{00B7}\u{00AB}\u{00BB}\u{2039}\u{203A}]")
        .expect("static regex")
});

/// Clean text extracted from HTML or feeds.
///
/// Non-breaking spaces become plain spaces, typographic quotes and dashes
/// become ASCII, ornaments are dropped and whitespace runs collapse to one
/// space.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_text("\u{a0}Hello\u{a0}\u{2022} world "), "Hello world");
/// ```
pub fn clean_text(s: &str) -> String {
    let replaced = s
        .replace(['\u{a0}', '\u{2007}', '\u{202f}'], " ")
        .replace(['\u{201C}', '\u{201D}', '\u{201E}'], "\"")
        .replace(['\u{2018}', '\u{2019}', '\u{201A}'], "'")
        .replace(['\u{2013}', '\u{2014}'], "-")
        .replace('\u{2026}', "...");
    DECORATIVE
        .replace_all(&replaced, "")
        .split_whitespace()
        .join(" ")
}

/// Reduce an HTML fragment (such as a feed description) to cleaned text.
pub fn html_to_text(fragment: &str) -> String {
    let html = Html::parse_fragment(fragment);
    clean_text(&html.root_element().text().join(" "))
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes, on a character
/// boundary, with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Cache directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
