//! # News Dedup
//!
//! Removes duplicate coverage of the same story from a batch of summarized
//! news items. Items are compared by an LLM in batches, and every failure
//! degrades to keeping items rather than dropping them.
//!
//! ## Usage
//!
//! ```sh
//! news_dedup -i output/clippings.json -o output/clippings.dedup.json
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Loading**: Read the summarized items produced upstream
//! 2. **URL pre-pass**: Collapse items that share a link
//! 3. **Semantic dedup**: Ask the LLM which items repeat an earlier story, batch by batch
//! 4. **Output**: Write the retained items, in input order, as JSON

use awful_aj::{config_dir, template};
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod dedup;
mod models;
mod outputs;
mod utils;

use cli::Cli;
use config::DedupConfig;
use dedup::classifier::LlmBackend;
use outputs::json;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_dedup starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // Fail before spending tokens if the result cannot be written
    let output_dir = args
        .output
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    if let Err(e) = ensure_writable_dir(output_dir).await {
        error!(
            path = %output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let dedup_config = DedupConfig::load(args.dedup_config.as_deref()).await?;

    // ---- Load template & config ----
    let template = template::load_template(&args.template).await?;
    info!(template = %args.template, "Loaded template");
    let conf_file = match &args.config {
        Some(path) => path.clone(),
        None => config_dir()?.join("config.yaml"),
    };
    let config_path = conf_file
        .to_str()
        .ok_or("awful_aj config path is not valid UTF-8")?;
    let aj_config = awful_aj::config::load_config(config_path)
        .map_err(|e| format!("failed to load awful_aj config {config_path}: {e}"))?;
    info!(config_path, "Loaded configuration");

    // ---- Load items ----
    let items = json::read_items(&args.input).await?;
    let loaded = items.len();

    let items = if args.skip_url_dedup {
        items
    } else {
        dedup::urls::dedup_by_url(items)
    };
    let after_urls = items.len();

    // ---- Semantic dedup ----
    let backend = LlmBackend {
        config: aj_config,
        template,
        dedup: dedup_config.clone(),
    };
    let outcome = dedup::deduplicate(items, &backend, &dedup_config).await;

    // ---- Output ----
    json::write_items(&outcome.items, &args.output).await?;

    let elapsed = start_time.elapsed();
    info!(
        loaded,
        after_url_pass = after_urls,
        kept = outcome.report.kept,
        semantic_duplicates = outcome.report.dropped,
        failed_batches = outcome.report.failed_batches,
        ?elapsed,
        "Execution complete"
    );

    Ok(())
}
