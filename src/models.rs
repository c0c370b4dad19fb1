//! Data models for news items flowing through the dedup pipeline.
//!
//! This module defines the core data structures used throughout the application:
//! - [`NewsItem`]: An upstream news item (title, summary, source, url, pubDate)
//! - [`PubDate`]: A publication date as either text or epoch seconds
//! - [`BatchEntry`]: The reduced record sent to the duplicate classifier
//! - [`Judgment`]: A single duplicate/non-duplicate verdict for one batch entry
//!
//! The wire format uses camelCase (`pubDate`) to match the JSON produced by the
//! upstream classification stage and the JSON echoed back by the LLM.

use crate::utils::parse_pub_date;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A news item as produced by the upstream summarization stage.
///
/// The dedup core only reads these fields. Anything else the upstream stage
/// attached (`class`, `category`, ...) is kept in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NewsItem {
    /// The headline.
    pub title: String,
    /// A short summary of the article, possibly empty.
    #[serde(default)]
    pub summary: String,
    /// The publishing outlet.
    #[serde(default)]
    pub source: String,
    /// Link to the article.
    #[serde(default)]
    pub url: String,
    /// Publication date in whatever form upstream produced it.
    #[serde(rename = "pubDate", default, skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<PubDate>,
    /// Upstream fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewsItem {
    /// Publication time as Unix seconds, or `None` when absent or unparsable.
    pub fn timestamp(&self) -> Option<i64> {
        match self.pub_date.as_ref()? {
            PubDate::Epoch(secs) => Some(*secs),
            PubDate::Text(text) => parse_pub_date(text).map(|dt| dt.timestamp()),
        }
    }
}

/// A publication date, either date-like text or integer epoch seconds.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PubDate {
    Epoch(i64),
    Text(String),
}

impl PubDate {
    pub fn as_text(&self) -> String {
        match self {
            PubDate::Epoch(secs) => secs.to_string(),
            PubDate::Text(text) => text.clone(),
        }
    }
}

impl From<&str> for PubDate {
    fn from(text: &str) -> Self {
        PubDate::Text(text.to_string())
    }
}

/// The reduced view of a [`NewsItem`] sent to the classifier.
///
/// `id` is the item's position inside its batch and is meaningless outside it.
#[allow(non_snake_case)]
#[derive(Debug, Serialize)]
pub struct BatchEntry<'a> {
    pub id: usize,
    pub title: &'a str,
    pub summary: &'a str,
    pub source: &'a str,
    pub pubDate: String,
}

impl<'a> BatchEntry<'a> {
    pub fn new(id: usize, item: &'a NewsItem) -> Self {
        Self {
            id,
            title: &item.title,
            summary: &item.summary,
            source: &item.source,
            pubDate: item
                .pub_date
                .as_ref()
                .map(PubDate::as_text)
                .unwrap_or_default(),
        }
    }
}

/// One validated verdict from the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Judgment {
    /// Position of the judged item within its batch.
    pub local_id: usize,
    /// Whether the item repeats a story seen earlier in the same batch.
    pub is_duplicate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_news_item_deserialization_keeps_extra_fields() {
        let json = r#"{
            "title": "TikTok to build data center",
            "summary": "A summary",
            "source": "Canal Solar",
            "url": "https://example.com/1",
            "pubDate": "2024-06-06T10:00:00Z",
            "class": "relevant",
            "category": "clientes"
        }"#;

        let item: NewsItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.title, "TikTok to build data center");
        assert_eq!(item.pub_date, Some(PubDate::from("2024-06-06T10:00:00Z")));
        assert_eq!(item.extra.get("category"), Some(&Value::from("clientes")));

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["class"], "relevant");
        assert_eq!(back["pubDate"], "2024-06-06T10:00:00Z");
    }

    #[test]
    fn test_news_item_missing_optional_fields() {
        let item: NewsItem = serde_json::from_str(r#"{"title": "Only a title"}"#).unwrap();
        assert_eq!(item.summary, "");
        assert_eq!(item.pub_date, None);
        assert_eq!(item.timestamp(), None);
    }

    #[test]
    fn test_pub_date_epoch() {
        let item: NewsItem =
            serde_json::from_str(r#"{"title": "t", "pubDate": 1717668000}"#).unwrap();
        assert_eq!(item.pub_date, Some(PubDate::Epoch(1717668000)));
        assert_eq!(item.timestamp(), Some(1717668000));
    }

    #[test]
    fn test_timestamp_orders_dates() {
        let older: NewsItem =
            serde_json::from_str(r#"{"title": "a", "pubDate": "2024-01-01"}"#).unwrap();
        let newer: NewsItem =
            serde_json::from_str(r#"{"title": "b", "pubDate": "2024-01-02"}"#).unwrap();
        assert!(newer.timestamp().unwrap() > older.timestamp().unwrap());
    }

    #[test]
    fn test_batch_entry_serialization() {
        let item: NewsItem = serde_json::from_str(
            r#"{"title": "Título", "summary": "s", "source": "src", "url": "u", "pubDate": "06 Jun"}"#,
        )
        .unwrap();
        let entry = BatchEntry::new(3, &item);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["title"], "Título");
        assert_eq!(json["pubDate"], "06 Jun");
        assert!(json.get("url").is_none());
    }
}
