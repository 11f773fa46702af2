//! Parallel detection over many recordings
//!
//! Jobs are independent: each owns its signal and runs both sides on a
//! dedicated rayon pool. A failing job is reported in its own outcome and
//! never aborts the others.
//!
//! # Example
//!
//! ```no_run
//! use boundary_dsp::batch::{default_jobs, detect_batch, BatchJob};
//! use boundary_dsp::{io::decode_file, CancellationToken, DetectorConfig, ParamSet};
//!
//! let jobs = vec![BatchJob::new("a.wav", decode_file("a.wav")?)];
//! let outcomes = detect_batch(
//!     jobs,
//!     &ParamSet::default(),
//!     &DetectorConfig::default(),
//!     default_jobs(),
//!     &CancellationToken::new(),
//! )?;
//! for outcome in &outcomes {
//!     println!("{}: {:?}", outcome.name, outcome.onsets);
//! }
//! # Ok::<(), boundary_dsp::DetectionError>(())
//! ```

use crate::analysis::result::DetectionResult;
use crate::cancel::CancellationToken;
use crate::config::{DetectorConfig, ParamSet, Side};
use crate::error::DetectionError;
use crate::io::Signal;
use rayon::prelude::*;

/// One recording to process
#[derive(Debug, Clone)]
pub struct BatchJob {
    /// Caller-chosen identifier, usually the file path
    pub name: String,
    /// Recording
    pub signal: Signal,
}

impl BatchJob {
    /// New job
    pub fn new(name: impl Into<String>, signal: Signal) -> Self {
        Self {
            name: name.into(),
            signal,
        }
    }
}

/// Per-job results for both sides
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Identifier from the job
    pub name: String,
    /// Onset detection result
    pub onsets: Result<DetectionResult, DetectionError>,
    /// Offset detection result
    pub offsets: Result<DetectionResult, DetectionError>,
}

impl BatchOutcome {
    /// Whether both sides succeeded
    pub fn is_ok(&self) -> bool {
        self.onsets.is_ok() && self.offsets.is_ok()
    }
}

/// Default worker count: available parallelism minus one, at least one
pub fn default_jobs() -> usize {
    let n = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

/// Run onset and offset detection for every job in parallel
///
/// # Arguments
///
/// * `jobs` - Recordings to process
/// * `params` - Parameters shared by all jobs
/// * `config` - Detector configuration shared by all jobs
/// * `threads` - Worker count (values below 1 are raised to 1)
/// * `cancel` - Shared token; cancelled jobs report `DetectionError::Cancelled`
///
/// # Returns
///
/// One outcome per job, in input order
///
/// # Errors
///
/// Returns `DetectionError::ProcessingError` if the thread pool cannot be built
pub fn detect_batch(
    jobs: Vec<BatchJob>,
    params: &ParamSet,
    config: &DetectorConfig,
    threads: usize,
    cancel: &CancellationToken,
) -> Result<Vec<BatchOutcome>, DetectionError> {
    let threads = std::cmp::max(1, threads);
    log::debug!("Batch: {} jobs on {} threads", jobs.len(), threads);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| {
            DetectionError::ProcessingError(format!("Failed to build thread pool: {}", e))
        })?;

    let outcomes: Vec<BatchOutcome> = pool.install(|| {
        jobs.into_par_iter()
            .map(|job| {
                let detect = |side| {
                    crate::detect_boundaries_with_config(
                        &job.signal.samples,
                        job.signal.sample_rate,
                        params,
                        side,
                        config,
                        cancel,
                    )
                };
                let onsets = detect(Side::Onset);
                let offsets = detect(Side::Offset);

                if let Err(e) = onsets.as_ref().and(offsets.as_ref()) {
                    log::warn!("Job {} failed: {}", job.name, e);
                }

                BatchOutcome {
                    name: job.name,
                    onsets,
                    offsets,
                }
            })
            .collect()
    });

    Ok(outcomes)
}
