//! Sample-accurate boundary refinement
//!
//! Each background run marks a silence that ends somewhere near its last
//! block. The refiner walks forward from late in the run until the signal's
//! short-term activity rises above the local noise floor for long enough.
//!
//! Algorithm, per background run:
//! 1. Convert the run to a sample zone and find the quietest sample step in
//!    it (the anchor)
//! 2. Estimate the noise floor from a reference window ending at the anchor:
//!    trimmed mean of absolute first differences, times `amp`
//! 3. Start 80 % into the run and slide a `win_size` kernel one sample at a
//!    time up to the scan origin of the next run
//! 4. Feed each kernel's trimmed mean to a [`HysteresisScan`]; on acceptance
//!    the boundary is where the accepted stretch began
//!
//! Runs that cannot be scanned are skipped, and scans that leave the signal
//! or reach the next run without acceptance are abandoned. Neither is an
//! error.

use super::baseline::{abs_diffs, argmin, trimmed_mean};
use super::scan::{HysteresisScan, ScanStep};
use crate::cancel::CancellationToken;
use crate::config::DetectionParams;
use crate::error::DetectionError;
use crate::features::segments::{BlockRun, EDGE_PADDING};

/// Fraction of a background run after which scanning begins
const SCAN_ORIGIN_FRACTION: f64 = 0.8;

/// Boundaries found by one refinement pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefineOutcome {
    /// Boundary sample indices in scan order
    pub boundaries: Vec<usize>,
    /// Runs skipped before scanning (out of range, too short, no baseline)
    pub skipped: usize,
    /// Scans that ended without accepting a boundary
    pub abandoned: usize,
}

/// Refine each background run into a boundary sample index
///
/// # Arguments
///
/// * `filtered` - Filtered signal in scan orientation
/// * `runs` - Background runs after gap merging, ascending
/// * `num_labels` - Number of labeled feature points
/// * `block_size` - Samples per envelope block
/// * `params` - Detection parameters for this side
/// * `cancel` - Polled once per run
///
/// # Errors
///
/// Returns `DetectionError::Cancelled` if the token is set
pub fn refine_boundaries(
    filtered: &[f64],
    runs: &[BlockRun],
    num_labels: usize,
    block_size: usize,
    params: &DetectionParams,
    cancel: &CancellationToken,
) -> Result<RefineOutcome, DetectionError> {
    let len = filtered.len() as isize;
    let bs = block_size as isize;
    let pad = EDGE_PADDING as isize;
    let mut outcome = RefineOutcome::default();
    let mut diffs = Vec::new();

    for (idx, run) in runs.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(DetectionError::Cancelled);
        }

        if run.end <= -pad || run.start >= num_labels as isize + pad {
            outcome.skipped += 1;
            continue;
        }

        let start = run.start.max(0);
        let zone_start = start * bs;
        let zone_end = run.end * bs;
        if zone_end > len || zone_end < zone_start + 2 {
            outcome.skipped += 1;
            continue;
        }

        abs_diffs(filtered, (zone_start + 1) as usize, zone_end as usize, &mut diffs);
        let mut anchor = match argmin(&diffs) {
            Some(offset) => zone_start + offset as isize,
            None => {
                outcome.skipped += 1;
                continue;
            }
        };

        let ref_len = params.ref_len as isize;
        let ref_start = (anchor - ref_len).max(0);
        if anchor == 0 {
            anchor = ref_start + ref_len;
        }
        if anchor > len {
            outcome.skipped += 1;
            continue;
        }

        abs_diffs(filtered, (ref_start + 1) as usize, anchor as usize, &mut diffs);
        let threshold = match trimmed_mean(&mut diffs, params.ratio) {
            Some(floor) => floor * params.amp,
            None => {
                outcome.skipped += 1;
                continue;
            }
        };

        let origin = scan_origin(run, bs).max(anchor);
        let limit = runs
            .get(idx + 1)
            .map(|next| scan_origin(next, bs))
            .unwrap_or(len);

        match scan(filtered, origin, limit, threshold, params, &mut diffs) {
            Some(boundary) => outcome.boundaries.push(boundary),
            None => outcome.abandoned += 1,
        }
    }

    log::debug!(
        "Refined {} boundaries ({} runs skipped, {} scans abandoned)",
        outcome.boundaries.len(),
        outcome.skipped,
        outcome.abandoned
    );

    Ok(outcome)
}

/// Sample where scanning of a run begins
fn scan_origin(run: &BlockRun, bs: isize) -> isize {
    let start = run.start.max(0);
    let zone_start = (start * bs) as f64;
    let zone_len = ((run.end - start) * bs) as f64;
    (zone_start + zone_len * SCAN_ORIGIN_FRACTION) as isize
}

/// Slide the kernel over `origin..=limit` until a boundary is accepted
fn scan(
    filtered: &[f64],
    origin: isize,
    limit: isize,
    threshold: f64,
    params: &DetectionParams,
    window: &mut Vec<f64>,
) -> Option<usize> {
    let len = filtered.len() as isize;
    let win = params.win_size as isize;
    let mut hysteresis = HysteresisScan::new(params.num_valid, params.penalty);

    let mut pos = origin;
    while pos <= limit {
        let lo = pos - win;
        if lo < 1 || pos > len {
            return None;
        }

        abs_diffs(filtered, lo as usize, pos as usize, window);
        let activity = trimmed_mean(window, params.ratio)?;

        if let ScanStep::Accepted { span } = hysteresis.push(activity > threshold) {
            return Some((pos - span as isize).max(0) as usize);
        }
        pos += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DetectionParams {
        DetectionParams {
            amp: 1.5,
            cutoff0: 200.0,
            cutoff1: 4000.0,
            num_valid: 10,
            win_size: 20,
            ratio: 0.9,
            penalty: 10.0,
            ref_len: 200,
            eps_ratio: 0.02,
        }
    }

    /// Alternating low-level signal that turns loud at `onset`
    fn step_signal(len: usize, onset: usize) -> Vec<f64> {
        (0..len)
            .map(|i| {
                let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                if i >= onset {
                    sign * 100.0
                } else {
                    sign * (1.0 + (i % 7) as f64 * 0.1)
                }
            })
            .collect()
    }

    #[test]
    fn test_finds_step_onset() {
        // 10-sample blocks; background covers blocks -3..=50, sound starts at 520
        let filtered = step_signal(1000, 520);
        let runs = vec![BlockRun { start: -3, end: 50 }];
        let outcome =
            refine_boundaries(&filtered, &runs, 99, 10, &params(), &CancellationToken::new())
                .unwrap();

        assert_eq!(outcome.boundaries.len(), 1);
        let boundary = outcome.boundaries[0];
        // The kernel reports activity once most of it overlaps the loud part
        assert!((520..=540).contains(&boundary), "boundary {}", boundary);
    }

    #[test]
    fn test_quiet_signal_is_abandoned() {
        let filtered = step_signal(1000, 2000);
        let runs = vec![BlockRun { start: -3, end: 50 }];
        let outcome =
            refine_boundaries(&filtered, &runs, 99, 10, &params(), &CancellationToken::new())
                .unwrap();

        assert!(outcome.boundaries.is_empty());
        assert_eq!(outcome.abandoned, 1);
    }

    #[test]
    fn test_out_of_range_runs_are_skipped() {
        let filtered = step_signal(1000, 520);
        let runs = vec![
            BlockRun { start: -6, end: -3 },
            BlockRun { start: 95, end: 104 },
        ];
        let outcome =
            refine_boundaries(&filtered, &runs, 99, 10, &params(), &CancellationToken::new())
                .unwrap();

        assert!(outcome.boundaries.is_empty());
        assert_eq!(outcome.skipped, 2);
    }

    #[test]
    fn test_cancelled_before_first_run() {
        let filtered = step_signal(1000, 520);
        let runs = vec![BlockRun { start: -3, end: 50 }];
        let token = CancellationToken::new();
        token.cancel();

        let result = refine_boundaries(&filtered, &runs, 99, 10, &params(), &token);
        assert_eq!(result, Err(DetectionError::Cancelled));
    }

    #[test]
    fn test_anchor_at_first_sample_moves_baseline_window() {
        // The zone's quietest step is the very first one, so the anchor lands
        // on sample 0 and the baseline window must be moved to [0, ref_len]
        let filtered: Vec<f64> = (0..1000)
            .map(|i| {
                let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                if i < 2 {
                    0.0
                } else if i < 600 {
                    sign
                } else {
                    sign * 100.0
                }
            })
            .collect();
        let runs = vec![BlockRun { start: -3, end: 50 }];
        let outcome =
            refine_boundaries(&filtered, &runs, 99, 10, &params(), &CancellationToken::new())
                .unwrap();

        assert_eq!(
            outcome,
            RefineOutcome {
                boundaries: vec![602],
                skipped: 0,
                abandoned: 0,
            }
        );
    }

    #[test]
    fn test_scan_origin_is_eighty_percent_into_run() {
        let run = BlockRun { start: -3, end: 50 };
        assert_eq!(scan_origin(&run, 10), 400);

        let run = BlockRun { start: 10, end: 20 };
        assert_eq!(scan_origin(&run, 10), 180);
    }
}
