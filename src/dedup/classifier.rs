//! Duplicate classification for a single batch.
//!
//! The LLM is an untrusted text oracle. [`classify_batch`] builds the request
//! for one batch, bounds the call with a timeout, runs the response through the
//! parser, and hands back a [`BatchOutcome`]. Raw response text never leaves
//! this module.

use super::parser::{ParsedResponse, ValidatedJudgments, parse_response, validate_records};
use crate::api::ask_with_backoff;
use crate::config::DedupConfig;
use crate::models::{BatchEntry, NewsItem};
use crate::utils::truncate_for_log;
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// Why a classifier call produced no text.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The backend failed, retries included.
    #[error("classifier call failed: {0}")]
    Call(String),

    /// The call did not finish within the configured bound.
    #[error("classifier call timed out after {0:?}")]
    Timeout(Duration),

    /// The batch could not be serialized into a request.
    #[error("could not build classifier request: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Result of classifying one batch.
#[derive(Debug)]
pub enum BatchOutcome {
    /// The response parsed; judgments are validated against the batch length.
    Judged(ValidatedJudgments),
    /// The response came back but no extraction strategy found judgments.
    ParseFailed,
    /// No usable response at all.
    CallFailed(ClassifyError),
}

/// Something that answers a duplicate-detection prompt with free-form text.
pub trait ClassifierBackend {
    async fn complete(&self, prompt: &str) -> Result<String, ClassifyError>;
}

/// Production backend: `awful_aj` with retry and backoff.
#[derive(Debug)]
pub struct LlmBackend {
    pub config: AwfulJadeConfig,
    pub template: ChatTemplate,
    pub dedup: DedupConfig,
}

impl ClassifierBackend for LlmBackend {
    async fn complete(&self, prompt: &str) -> Result<String, ClassifyError> {
        ask_with_backoff(&self.config, &self.template, &self.dedup, prompt)
            .await
            .map_err(|e| ClassifyError::Call(e.to_string()))
    }
}

/// Build the user message for a batch.
///
/// Items are numbered by their position in the batch; the model is told to
/// echo them back with a `duplicate` field.
pub fn build_prompt(items: &[NewsItem]) -> Result<String, serde_json::Error> {
    let entries: Vec<BatchEntry<'_>> = items
        .iter()
        .enumerate()
        .map(|(id, item)| BatchEntry::new(id, item))
        .collect();
    let articles_json = serde_json::to_string_pretty(&entries)?;
    Ok(format!(
        "Analyze these articles for duplicates:\n\n{articles_json}\n\n\
         Return JSON array with \"duplicate\" field added to each article:"
    ))
}

/// Classify one batch, degrading every failure into a tagged outcome.
#[instrument(level = "info", skip_all, fields(batch_len = items.len()))]
pub async fn classify_batch<B: ClassifierBackend>(
    backend: &B,
    items: &[NewsItem],
    call_timeout: Duration,
) -> BatchOutcome {
    let prompt = match build_prompt(items) {
        Ok(prompt) => prompt,
        Err(e) => return BatchOutcome::CallFailed(e.into()),
    };

    let t0 = Instant::now();
    let raw = match timeout(call_timeout, backend.complete(&prompt)).await {
        Ok(Ok(raw)) => raw,
        Ok(Err(e)) => {
            warn!(error = %e, "Classifier call failed");
            return BatchOutcome::CallFailed(e);
        }
        Err(_) => {
            warn!(?call_timeout, "Classifier call timed out");
            return BatchOutcome::CallFailed(ClassifyError::Timeout(call_timeout));
        }
    };
    debug!(
        elapsed_ms = t0.elapsed().as_millis(),
        preview = %truncate_for_log(&raw, 200),
        "Classifier responded"
    );

    match parse_response(&raw) {
        ParsedResponse::Records(records) => {
            let validated = validate_records(&records, items.len());
            info!(
                records = records.len(),
                judgments = validated.judgments.len(),
                invalid = validated.invalid,
                "Parsed duplicate judgments"
            );
            BatchOutcome::Judged(validated)
        }
        ParsedResponse::Unparsable => {
            warn!(
                response_preview = %truncate_for_log(&raw, 500),
                "Could not parse classifier response as JSON"
            );
            BatchOutcome::ParseFailed
        }
    }
}
