//! Picking one representative out of a cluster of duplicate items.

use crate::models::NewsItem;

/// Ranking key, compared lexicographically: newest date, then longest
/// summary, then longest title. Unknown dates rank below every real one.
fn rank(item: &NewsItem) -> (i64, usize, usize) {
    (
        item.timestamp().unwrap_or(i64::MIN),
        item.summary.chars().count(),
        item.title.chars().count(),
    )
}

/// Index of the best item in `cluster`, or `None` if the cluster is empty.
///
/// Remaining ties go to the earliest item.
pub fn select_best<'a, I>(cluster: I) -> Option<usize>
where
    I: IntoIterator<Item = &'a NewsItem>,
{
    let mut best: Option<(usize, (i64, usize, usize))> = None;
    for (idx, item) in cluster.into_iter().enumerate() {
        let score = rank(item);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PubDate;
    use serde_json::Map;

    fn item(pub_date: &str, summary: &str, title: &str) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            summary: summary.to_string(),
            source: "src".to_string(),
            url: String::new(),
            pub_date: Some(PubDate::from(pub_date)),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_later_date_wins() {
        let cluster = vec![
            item("2024-01-01", "short", "A"),
            item("2024-01-02", "x", "B"),
        ];
        assert_eq!(select_best(&cluster), Some(1));
    }

    #[test]
    fn test_equal_dates_fall_through_to_title() {
        let cluster = vec![
            item("2024-01-01", "aaaa", "short"),
            item("2024-01-01", "aaaa", "longer title"),
        ];
        assert_eq!(select_best(&cluster), Some(1));
    }

    #[test]
    fn test_equal_dates_longer_summary_wins() {
        let cluster = vec![
            item("2024-01-01", "a much longer summary", "t"),
            item("2024-01-01", "short", "a much longer title"),
        ];
        assert_eq!(select_best(&cluster), Some(0));
    }

    #[test]
    fn test_unparsable_date_ranks_lowest() {
        let cluster = vec![
            item("06 Jun", "a very long and detailed summary", "long title here"),
            item("1970-01-01", "", ""),
        ];
        assert_eq!(select_best(&cluster), Some(1));
    }

    #[test]
    fn test_full_tie_keeps_first() {
        let cluster = vec![
            item("2024-01-01", "same", "same"),
            item("2024-01-01", "same", "same"),
            item("garbage", "same", "same"),
        ];
        assert_eq!(select_best(&cluster), Some(0));
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // "ação" is 4 chars but 6 bytes
        let cluster = vec![
            item("2024-01-01", "s", "ação"),
            item("2024-01-01", "s", "abcde"),
        ];
        assert_eq!(select_best(&cluster), Some(1));
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(select_best(&Vec::<NewsItem>::new()), None);
        assert_eq!(select_best(&[item("x", "", "")]), Some(0));
    }
}
