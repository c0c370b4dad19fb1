//! Command-line interface definitions for News Dedup.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Optional settings can also come from environment variables.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the News Dedup application.
///
/// # Examples
///
/// ```sh
/// # Basic usage with required arguments
/// news_dedup -i output/clippings.json -o output/clippings.dedup.json
///
/// # With a custom awful_aj config and dedup tuning
/// news_dedup -i in.json -o out.json -c ~/aj/config.yaml -d dedup.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// JSON array of news items produced by the summarization stage
    #[arg(short, long)]
    pub input: PathBuf,

    /// Where to write the retained items
    #[arg(short, long)]
    pub output: PathBuf,

    /// Optional path to the awful_aj config.yaml file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Optional YAML file with batch size, overlap, timeout and retry settings
    #[arg(short, long, env = "NEWS_DEDUP_CONFIG")]
    pub dedup_config: Option<PathBuf>,

    /// awful_aj template holding the duplicate-detection system prompt
    #[arg(long, default_value = "news_dedup")]
    pub template: String,

    /// Skip collapsing items that share a URL
    #[arg(long)]
    pub skip_url_dedup: bool,
}
