//! JSON clippings files.
//!
//! The upstream stage writes a JSON array of news items; this module reads
//! that array and writes the retained subset back in the same shape. Fields
//! the dedup pass does not interpret are carried through untouched.

use crate::models::NewsItem;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Read a JSON array of [`NewsItem`]s.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_items(path: &Path) -> Result<Vec<NewsItem>, Box<dyn Error>> {
    let raw = fs::read_to_string(path).await?;
    let items: Vec<NewsItem> = serde_json::from_str(&raw)?;
    info!(count = items.len(), "Loaded news items");
    Ok(items)
}

/// Write `items` as pretty JSON to `path`, creating parent directories.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = items.len()))]
pub async fn write_items(items: &[NewsItem], path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(items)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!("Wrote deduplicated clippings");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("news_dedup_{}_{}", std::process::id(), name))
    }

    #[tokio::test]
    async fn test_round_trip_preserves_extra_fields() {
        let dir = scratch("roundtrip");
        let input = dir.join("clippings.json");
        let output = dir.join("nested/out.json");
        fs::create_dir_all(&dir).await.unwrap();
        fs::write(
            &input,
            r#"[{"title": "A", "summary": "s", "source": "S", "url": "https://a", "pubDate": "06 Jun", "category": "clientes"}]"#,
        )
        .await
        .unwrap();

        let items = read_items(&input).await.unwrap();
        write_items(&items, &output).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).await.unwrap()).unwrap();
        assert_eq!(written[0]["category"], "clientes");
        assert_eq!(written[0]["pubDate"], "06 Jun");
        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_read_items_rejects_non_array() {
        let dir = scratch("nonarray");
        fs::create_dir_all(&dir).await.unwrap();
        let input = dir.join("bad.json");
        fs::write(&input, r#"{"title": "A"}"#).await.unwrap();
        assert!(read_items(&input).await.is_err());
        let _ = fs::remove_dir_all(&dir).await;
    }
}
