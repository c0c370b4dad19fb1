//! Semantic deduplication of news items.
//!
//! # Submodules
//!
//! - [`batch`]: Splits the input into classifier-sized, optionally overlapping batches
//! - [`classifier`]: Sends one batch to the LLM and returns a tagged outcome
//! - [`parser`]: Extracts judgment records from noisy LLM text
//! - [`select`]: Picks the best representative of a duplicate cluster
//! - [`urls`]: Exact URL pre-pass
//!
//! # Failure Policy
//!
//! Nothing in here aborts a run. A failed or unparsable batch keeps every item
//! it had not already resolved, and items no batch resolved are kept at the
//! end. Dropping a real story is worse than missing a duplicate.

pub mod batch;
pub mod classifier;
pub mod parser;
pub mod select;
pub mod urls;

use crate::config::DedupConfig;
use crate::models::NewsItem;
use crate::utils::truncate_for_log;
use batch::{Batch, partition};
use classifier::{BatchOutcome, ClassifierBackend, classify_batch};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// Final verdict for one global index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Kept,
    Dropped,
}

/// Global indices already decided during one run.
///
/// An index is resolved at most once; later batches that see it again through
/// the overlap window leave it alone.
#[derive(Debug, Default)]
pub struct ProcessedSet {
    resolved: BTreeMap<usize, Resolution>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a verdict. Returns `false` if `idx` was already resolved.
    pub fn resolve(&mut self, idx: usize, resolution: Resolution) -> bool {
        if self.resolved.contains_key(&idx) {
            return false;
        }
        self.resolved.insert(idx, resolution);
        true
    }

    pub fn get(&self, idx: usize) -> Option<Resolution> {
        self.resolved.get(&idx).copied()
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }
}

/// Counters for one dedup run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DedupReport {
    pub input: usize,
    pub kept: usize,
    pub dropped: usize,
    pub batches: usize,
    pub failed_batches: usize,
    pub invalid_judgments: usize,
    /// Items no batch judged; kept.
    pub unresolved: usize,
}

#[derive(Debug)]
pub struct DedupOutcome {
    /// Retained items in input order.
    pub items: Vec<NewsItem>,
    pub report: DedupReport,
}

/// Remove items that repeat a story already covered by an earlier item.
///
/// Inputs of zero or one item are returned as-is without calling the
/// classifier. Batch requests may run concurrently up to
/// `config.concurrent_batches`, but their results are merged one at a time in
/// partition order.
#[instrument(level = "info", skip_all, fields(items = items.len()))]
pub async fn deduplicate<B: ClassifierBackend>(
    items: Vec<NewsItem>,
    backend: &B,
    config: &DedupConfig,
) -> DedupOutcome {
    let input = items.len();
    if input <= 1 {
        return DedupOutcome {
            items,
            report: DedupReport {
                input,
                kept: input,
                ..DedupReport::default()
            },
        };
    }

    let batches = partition(input, config);
    info!(
        items = input,
        batches = batches.len(),
        mode = if batches.len() == 1 { "single" } else { "overlapping" },
        "Analyzing items for semantic duplicates"
    );

    let call_timeout = config.call_timeout();
    let outcomes: Vec<BatchOutcome> = stream::iter(&batches)
        .map(|batch| classify_batch(backend, &items[batch.range.clone()], call_timeout))
        .buffered(config.concurrent_batches.max(1))
        .collect()
        .await;

    let mut report = DedupReport {
        input,
        batches: batches.len(),
        ..DedupReport::default()
    };
    let mut processed = ProcessedSet::new();
    for (batch, outcome) in batches.iter().zip(outcomes) {
        merge_batch(batch, outcome, &items, &mut processed, &mut report);
    }

    debug!(resolved = processed.len(), "Batch sweep finished");
    let mut retained = Vec::with_capacity(input);
    for (idx, item) in items.into_iter().enumerate() {
        match processed.get(idx) {
            Some(Resolution::Dropped) => report.dropped += 1,
            Some(Resolution::Kept) => retained.push(item),
            None => {
                warn!(index = idx, title = %truncate_for_log(&item.title, 80), "No judgment for item; keeping it");
                report.unresolved += 1;
                retained.push(item);
            }
        }
    }
    report.kept = retained.len();

    info!(
        input = report.input,
        kept = report.kept,
        dropped = report.dropped,
        failed_batches = report.failed_batches,
        invalid_judgments = report.invalid_judgments,
        unresolved = report.unresolved,
        "Semantic deduplication complete"
    );
    DedupOutcome {
        items: retained,
        report,
    }
}

/// Fold one batch outcome into the run state.
fn merge_batch(
    batch: &Batch,
    outcome: BatchOutcome,
    items: &[NewsItem],
    processed: &mut ProcessedSet,
    report: &mut DedupReport,
) {
    let validated = match outcome {
        BatchOutcome::Judged(validated) => validated,
        BatchOutcome::ParseFailed => {
            keep_unresolved(batch, processed, report, "unparsable response");
            return;
        }
        BatchOutcome::CallFailed(e) => {
            keep_unresolved(batch, processed, report, &e.to_string());
            return;
        }
    };

    report.invalid_judgments += validated.invalid;
    let mut duplicates = 0;
    for judgment in validated.judgments {
        let Some(global) = batch.global_index(judgment.local_id) else {
            continue;
        };
        let resolution = if judgment.is_duplicate {
            Resolution::Dropped
        } else {
            Resolution::Kept
        };
        if !processed.resolve(global, resolution) {
            continue;
        }
        if judgment.is_duplicate {
            duplicates += 1;
            info!(
                index = global,
                title = %truncate_for_log(&items[global].title, 80),
                "Item marked as duplicate"
            );
        }
    }
    info!(batch = %batch.label(), duplicates, "Batch merged");
}

/// Fail-open path: every item in the batch not yet decided is kept.
fn keep_unresolved(
    batch: &Batch,
    processed: &mut ProcessedSet,
    report: &mut DedupReport,
    reason: &str,
) {
    report.failed_batches += 1;
    let newly_kept = batch
        .range
        .clone()
        .filter(|idx| processed.resolve(*idx, Resolution::Kept))
        .count();
    warn!(
        batch = %batch.label(),
        reason,
        newly_kept,
        "Batch failed; keeping every unresolved item in it"
    );
}
