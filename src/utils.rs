//! Utility functions for date parsing, log truncation, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Lenient publication date parsing for the representative selector
//! - String truncation for logging raw LLM responses
//! - File system validation for the output directory

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a date-like string into a UTC timestamp.
///
/// Accepted forms, tried in order:
/// - RFC 3339 / ISO-8601 with offset (`2024-06-06T10:00:00Z`)
/// - RFC 2822, as found in RSS feeds (`Thu, 06 Jun 2024 10:00:00 GMT`)
/// - Naive date-times (`2024-06-06 10:00:00`), assumed UTC
/// - Plain dates (`2024-06-06`), at midnight UTC
///
/// # Returns
///
/// `None` when nothing matches. Callers decide what an unknown date means.
pub fn parse_pub_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes, backing off to the nearest
/// char boundary, with an ellipsis and the dropped byte count appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
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
/// Creates the directory if it doesn't exist, then writes and removes a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Sync std fs keeps the error surface small
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        // 'á' occupies bytes 4..6, so byte 5 falls inside it
        let result = truncate_for_log("Ceará ação", 5);
        assert!(result.starts_with("Cear…"));
        assert!(result.ends_with("bytes)"));
    }

    #[test]
    fn test_parse_pub_date_rfc3339() {
        let dt = parse_pub_date("2024-06-06T10:30:00-03:00").unwrap();
        assert_eq!(dt.hour(), 13);
        assert_eq!(dt.day(), 6);
    }

    #[test]
    fn test_parse_pub_date_rfc2822() {
        let dt = parse_pub_date("Thu, 06 Jun 2024 10:00:00 GMT").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 6);
    }

    #[test]
    fn test_parse_pub_date_naive_forms() {
        assert!(parse_pub_date("2024-06-06 10:00:00").is_some());
        let date_only = parse_pub_date("2024-01-02").unwrap();
        assert_eq!(date_only.hour(), 0);
        assert_eq!(date_only.day(), 2);
    }

    #[test]
    fn test_parse_pub_date_garbage() {
        assert_eq!(parse_pub_date("06 Jun"), None);
        assert_eq!(parse_pub_date(""), None);
        assert_eq!(parse_pub_date("yesterday"), None);
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_directory() {
        let dir = std::env::temp_dir().join(format!("news_dedup_probe_{}", std::process::id()));
        ensure_writable_dir(&dir).await.unwrap();
        assert!(dir.is_dir());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
