//! Exact URL pre-pass run before semantic dedup.
//!
//! Search queries overlap, so the same link often arrives several times.
//! Collapsing those here is free and keeps them out of LLM batches.

use super::select::select_best;
use crate::models::NewsItem;
use itertools::Itertools;
use tracing::{debug, info, instrument};
use url::Url;

/// Comparison key for a URL: fragment dropped, scheme and host lowercased.
///
/// Returns `None` for blank URLs so they never group together.
pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_fragment(None);
            Some(url.to_string())
        }
        Err(_) => Some(trimmed.to_string()),
    }
}

/// Collapse items sharing a URL into one representative each.
///
/// The representative is chosen by [`select_best`] and takes the position of
/// the group's first occurrence. Items without a URL pass through.
#[instrument(level = "info", skip_all, fields(input = items.len()))]
pub fn dedup_by_url(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let input = items.len();
    let groups = items
        .iter()
        .enumerate()
        .into_group_map_by(|(idx, item)| normalize_url(&item.url).ok_or(*idx));

    let mut placements: Vec<(usize, usize)> = groups
        .into_values()
        .map(|members| {
            let first = members[0].0;
            let winner = select_best(members.iter().map(|(_, item)| *item))
                .map_or(first, |best| members[best].0);
            if members.len() > 1 {
                debug!(first, winner, copies = members.len(), "Collapsed repeated URL");
            }
            (first, winner)
        })
        .collect();
    placements.sort_unstable_by_key(|(first, _)| *first);

    let mut slots = items.into_iter().map(Some).collect_vec();
    let unique = placements
        .into_iter()
        .filter_map(|(_, winner)| slots[winner].take())
        .collect_vec();

    info!(input, unique = unique.len(), "URL pre-pass complete");
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PubDate;
    use serde_json::Map;

    fn item(title: &str, url: &str, pub_date: &str) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            summary: String::new(),
            source: "src".to_string(),
            url: url.to_string(),
            pub_date: Some(PubDate::from(pub_date)),
            extra: Map::new(),
        }
    }

    fn titles(items: &[NewsItem]) -> Vec<&str> {
        items.iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("HTTPS://Example.COM/a#section"),
            Some("https://example.com/a".to_string())
        );
        assert_eq!(normalize_url("  not a url "), Some("not a url".to_string()));
        assert_eq!(normalize_url("   "), None);
    }

    #[test]
    fn test_dedup_by_url_keeps_order() {
        let items = vec![
            item("a", "https://x.com/1", "2024-01-01"),
            item("b", "https://x.com/2", "2024-01-01"),
            item("a-again", "https://x.com/1#top", "2024-01-01"),
            item("c", "https://x.com/3", "2024-01-01"),
        ];
        let unique = dedup_by_url(items);
        assert_eq!(titles(&unique), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_dedup_by_url_prefers_best_copy_at_first_position() {
        let items = vec![
            item("old", "https://x.com/1", "2024-01-01"),
            item("other", "https://x.com/2", "2024-01-01"),
            item("new", "https://x.com/1", "2024-01-05"),
        ];
        let unique = dedup_by_url(items);
        assert_eq!(titles(&unique), vec!["new", "other"]);
    }

    #[test]
    fn test_blank_urls_never_collapse() {
        let items = vec![
            item("a", "", "2024-01-01"),
            item("b", "", "2024-01-01"),
        ];
        assert_eq!(titles(&dedup_by_url(items)), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(dedup_by_url(Vec::new()).is_empty());
    }
}
