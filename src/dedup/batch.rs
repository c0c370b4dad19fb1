//! Splitting an item sequence into classifier-sized batches.

use crate::config::DedupConfig;
use std::ops::Range;

/// A contiguous window of the input handed to the classifier in one request.
///
/// Local id `i` inside the batch maps to global index `range.start + i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub range: Range<usize>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Map a local id back to its global index, if it is inside this batch.
    pub fn global_index(&self, local_id: usize) -> Option<usize> {
        (local_id < self.len()).then(|| self.range.start + local_id)
    }

    /// Human-facing 1-based label, e.g. `articles 13-27`.
    pub fn label(&self) -> String {
        format!("articles {}-{}", self.range.start + 1, self.range.end)
    }
}

/// Partition `len` items into batches.
///
/// Up to `single_batch_limit` items go out as one batch. Longer inputs are cut
/// into windows of `batch_size` items, each starting `batch_size - overlap`
/// after the previous one, with the last window clipped to `len`.
pub fn partition(len: usize, config: &DedupConfig) -> Vec<Batch> {
    if len == 0 {
        return Vec::new();
    }
    if len <= config.single_batch_limit {
        return vec![Batch { range: 0..len }];
    }

    let step = config.batch_size.saturating_sub(config.overlap).max(1);
    (0..len)
        .step_by(step)
        .map(|start| Batch {
            range: start..(start + config.batch_size).min(len),
        })
        .collect()
}
