//! Background runs in envelope-block space
//!
//! The label sequence is padded with three background labels on each side so
//! recordings that start or end in silence still produce a run touching the
//! edge. Every background index is then widened by the two following
//! indices (a feature point spans two blocks, and the widening closes
//! one-point holes), and the contiguous stretches of the widened set become
//! [`BlockRun`]s.
//!
//! Block indices are relative to the unpadded envelope, so runs touching the
//! start begin at `-3` and runs touching the end reach past the last block.

use std::collections::BTreeSet;

/// Background labels added at each end of the label sequence
pub const EDGE_PADDING: usize = 3;

/// Indices following each background index that are also treated as background
const WIDENING: isize = 2;

/// Sound stretches shorter than this are absorbed into the background
pub const MIN_SOUND_GAP_SECONDS: f64 = 0.1;

/// Inclusive stretch of envelope blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRun {
    /// First block
    pub start: isize,
    /// Last block
    pub end: isize,
}

impl BlockRun {
    /// Number of blocks covered
    pub fn len(&self) -> usize {
        (self.end - self.start + 1).max(0) as usize
    }

    /// Whether the run covers no blocks
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// Background runs of a labeling
///
/// # Arguments
///
/// * `labels` - Cluster label per feature point
/// * `background` - Label of the background cluster
///
/// # Returns
///
/// Background runs in ascending order, non-overlapping and non-adjacent
pub fn background_runs(labels: &[i32], background: i32) -> Vec<BlockRun> {
    let pad = EDGE_PADDING as isize;
    let padded_len = labels.len() + 2 * EDGE_PADDING;

    let mut widened = BTreeSet::new();
    for padded_idx in 0..padded_len {
        let is_background = padded_idx < EDGE_PADDING
            || padded_idx >= EDGE_PADDING + labels.len()
            || labels[padded_idx - EDGE_PADDING] == background;
        if is_background {
            let idx = padded_idx as isize - pad;
            for k in 0..=WIDENING {
                widened.insert(idx + k);
            }
        }
    }

    let mut runs: Vec<BlockRun> = Vec::new();
    for idx in widened {
        match runs.last_mut() {
            Some(run) if run.end + 1 == idx => run.end = idx,
            _ => runs.push(BlockRun {
                start: idx,
                end: idx,
            }),
        }
    }
    runs
}

/// Merge background runs separated by short sound stretches
///
/// The gap between consecutive runs is `next.start - current.end` blocks.
/// Gaps under [`MIN_SOUND_GAP_SECONDS`] are treated as background: both
/// boundaries around them are dropped. Passes repeat until no gap is short,
/// so the result is stable under another call.
pub fn merge_short_gaps(runs: &[BlockRun], block_seconds: f64) -> Vec<BlockRun> {
    let mut current = runs.to_vec();
    loop {
        let merged = merge_pass(&current, block_seconds);
        if merged.len() == current.len() {
            return merged;
        }
        log::debug!(
            "Merged {} short sound gaps",
            current.len() - merged.len()
        );
        current = merged;
    }
}

fn merge_pass(runs: &[BlockRun], block_seconds: f64) -> Vec<BlockRun> {
    let mut merged: Vec<BlockRun> = Vec::with_capacity(runs.len());
    for &run in runs {
        match merged.last_mut() {
            Some(prev) if ((run.start - prev.end) as f64) * block_seconds < MIN_SOUND_GAP_SECONDS => {
                prev.end = run.end;
            }
            _ => merged.push(run),
        }
    }
    merged
}

/// Sound stretches lying strictly between consecutive background runs
pub fn sound_runs(background: &[BlockRun]) -> Vec<BlockRun> {
    background
        .windows(2)
        .map(|pair| BlockRun {
            start: pair[0].end + 1,
            end: pair[1].start - 1,
        })
        .filter(|run| !run.is_empty())
        .collect()
}
