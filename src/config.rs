//! Tuning knobs for the dedup pass.
//!
//! Loaded from an optional YAML file. Every field has a default, so an empty
//! file (or no file at all) yields [`DedupConfig::default`].
//!
//! ```yaml
//! single_batch_limit: 25
//! batch_size: 15
//! overlap: 3
//! call_timeout_secs: 120
//! max_retries: 5
//! retry_base_delay_ms: 1000
//! concurrent_batches: 1
//! ```

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Inputs up to this length are classified in a single request.
    pub single_batch_limit: usize,
    /// Size of each overlapping window once the input exceeds `single_batch_limit`.
    pub batch_size: usize,
    /// Items shared by consecutive windows.
    pub overlap: usize,
    /// Upper bound on one classifier call, retries included.
    pub call_timeout_secs: u64,
    pub max_retries: usize,
    pub retry_base_delay_ms: u64,
    /// How many batch requests may be in flight at once.
    pub concurrent_batches: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            single_batch_limit: 25,
            batch_size: 15,
            overlap: 3,
            call_timeout_secs: 120,
            max_retries: 5,
            retry_base_delay_ms: 1000,
            concurrent_batches: 1,
        }
    }
}

impl DedupConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// Reject settings that would stall or loop the partitioner.
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".into());
        }
        if self.overlap >= self.batch_size {
            return Err(format!(
                "overlap ({}) must be smaller than batch_size ({})",
                self.overlap, self.batch_size
            )
            .into());
        }
        if self.concurrent_batches == 0 {
            return Err("concurrent_batches must be at least 1".into());
        }
        Ok(())
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, Box<dyn Error>> {
        // serde_yaml turns an empty document into unit, not an empty map
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: DedupConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or fall back to defaults when no path is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&Path>) -> Result<Self, Box<dyn Error>> {
        let Some(path) = path else {
            info!("No dedup config given; using defaults");
            return Ok(Self::default());
        };
        let yaml = fs::read_to_string(path).await?;
        let config = Self::from_yaml(&yaml)?;
        info!(?config, "Loaded dedup config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DedupConfig::default();
        assert_eq!(config.single_batch_limit, 25);
        assert_eq!(config.batch_size, 15);
        assert_eq!(config.overlap, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = DedupConfig::from_yaml("batch_size: 10\noverlap: 2\n").unwrap();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.overlap, 2);
        assert_eq!(config.single_batch_limit, 25);
        assert_eq!(config.call_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_empty_yaml() {
        assert_eq!(DedupConfig::from_yaml("").unwrap(), DedupConfig::default());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_batch() {
        let err = DedupConfig::from_yaml("batch_size: 3\noverlap: 3\n").unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        assert!(DedupConfig::from_yaml("batch_size: 0\noverlap: 0\n").is_err());
        assert!(DedupConfig::from_yaml("concurrent_batches: 0\n").is_err());
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        assert!(DedupConfig::from_yaml("batch_size: many\n").is_err());
    }

    #[tokio::test]
    async fn test_load_without_path() {
        let config = DedupConfig::load(None).await.unwrap();
        assert_eq!(config, DedupConfig::default());
    }
}
