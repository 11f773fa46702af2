//! # Boundary DSP
//!
//! Offline speech boundary detection for annotation workflows: locates the
//! sample-accurate onsets (silence to speech) and offsets (speech to silence)
//! of utterances in a mono recording.
//!
//! ## Features
//!
//! - **Coarse segmentation**: density clustering of a 25 ms block-max envelope
//!   separates background from activity without a fixed level threshold
//! - **Fine refinement**: a trimmed-mean activity scan with hysteresis places
//!   each boundary to the sample
//! - **VAD mode**: one parameter set for both sides, paired into intervals
//! - **Batch processing**: independent recordings on a rayon thread pool
//!
//! ## Quick Start
//!
//! ```no_run
//! use boundary_dsp::{detect_boundaries, ParamSet, Side};
//!
//! // Mono 16-bit PCM
//! let samples: Vec<i16> = vec![]; // Your audio data
//! let sample_rate = 16000;
//!
//! let params = ParamSet::default();
//! let onsets = detect_boundaries(&samples, sample_rate, &params, Side::Onset)?;
//! let offsets = detect_boundaries(&samples, sample_rate, &params, Side::Offset)?;
//!
//! println!("Onsets: {:?}", onsets.times);
//! println!("Offsets: {:?}", offsets.times);
//! # Ok::<(), boundary_dsp::DetectionError>(())
//! ```
//!
//! ## Architecture
//!
//! The detection pipeline follows this flow:
//!
//! ```text
//! PCM → Filter → Envelope → Clustering → Background runs → Refinement → Seconds
//! ```
//!
//! Offsets run the same pipeline on the time-reversed filtered signal, so
//! every stage searches forward from silence into sound.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod batch;
pub mod cancel;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;

// Re-export main types
pub use analysis::intervals::SpeechInterval;
pub use analysis::metadata::{DetectionFlag, DetectionMetadata};
pub use analysis::result::DetectionResult;
pub use cancel::CancellationToken;
pub use config::{
    ClusterStrategy, DetectionMode, DetectionParams, DetectorConfig, ParamSet, Side,
};
pub use error::DetectionError;
pub use io::Signal;

use analysis::intervals::pair_intervals;
use analysis::result::indices_to_seconds;
use features::boundary::refine_boundaries;
use features::clustering::{
    absorb_quiet_points, clusterer_for, eps_for, min_samples, select_background, ClusterError,
};
use features::segments::{background_runs, merge_short_gaps, sound_runs, BlockRun};
use io::signal::{duration_seconds, sample_range};
use preprocessing::envelope::{block_size, Envelope};
use preprocessing::filter::{filter_signal, min_input_len, FilterSpec};
use std::time::Instant;

/// Detect boundaries on one side of a recording
///
/// Uses the default [`DetectorConfig`] and cannot be cancelled.
///
/// # Arguments
///
/// * `samples` - Mono 16-bit PCM samples
/// * `sample_rate` - Sample rate in Hz (at least 40)
/// * `params` - Onset and offset parameters; only `side`'s set is used
/// * `side` - Which boundary to locate
///
/// # Returns
///
/// `DetectionResult` with strictly increasing boundary times in seconds
///
/// # Errors
///
/// Returns `DetectionError` if the input or parameters are invalid
///
/// # Example
///
/// ```no_run
/// use boundary_dsp::{detect_boundaries, ParamSet, Side};
///
/// let samples = vec![0i16; 16000 * 5]; // 5 seconds of silence
/// let result = detect_boundaries(&samples, 16000, &ParamSet::default(), Side::Onset)?;
/// assert!(result.times.is_empty());
/// # Ok::<(), boundary_dsp::DetectionError>(())
/// ```
pub fn detect_boundaries(
    samples: &[i16],
    sample_rate: u32,
    params: &ParamSet,
    side: Side,
) -> Result<DetectionResult, DetectionError> {
    detect_boundaries_with_config(
        samples,
        sample_rate,
        params,
        side,
        &DetectorConfig::default(),
        &CancellationToken::new(),
    )
}

/// Detect boundaries with an explicit configuration and cancellation token
///
/// The token is polled before clustering and once per background run during
/// refinement.
///
/// # Errors
///
/// Returns `DetectionError::InvalidInput` or `DetectionError::InvalidParameter`
/// for malformed input, and `DetectionError::Cancelled` if the token is set
pub fn detect_boundaries_with_config(
    samples: &[i16],
    sample_rate: u32,
    params: &ParamSet,
    side: Side,
    config: &DetectorConfig,
    cancel: &CancellationToken,
) -> Result<DetectionResult, DetectionError> {
    let start_time = Instant::now();

    log::debug!(
        "Starting {} detection: {} samples at {} Hz",
        side.name(),
        samples.len(),
        sample_rate
    );

    if sample_rate == 0 {
        return Err(DetectionError::InvalidInput("Invalid sample rate".to_string()));
    }

    let side_params = params.effective(side, config.mode);
    side_params.validate()?;
    let block_size = block_size(sample_rate)?;

    let clusterer = clusterer_for(config.cluster_strategy);
    let mut metadata = DetectionMetadata {
        sample_rate,
        duration_seconds: duration_seconds(samples.len(), sample_rate),
        block_size,
        cluster_strategy: clusterer.name().to_string(),
        ..Default::default()
    };

    // 1. Filtering
    let required = (2 * block_size).max(min_input_len());
    if samples.len() < required {
        log::warn!(
            "Input of {} samples is shorter than the {} required, no boundaries",
            samples.len(),
            required
        );
        return Ok(flagged_empty(side, metadata, DetectionFlag::InputTooShort, start_time));
    }

    let spec = FilterSpec::from_params(&side_params);
    if spec.high_cutoff_clamped(sample_rate) {
        metadata.flags.push(DetectionFlag::BandClamped);
    }
    let mut filtered = filter_signal(samples, spec, sample_rate)?;
    if side == Side::Offset {
        filtered.reverse();
    }

    // 2. Envelope and feature points
    let envelope = Envelope::from_filtered(&filtered, block_size, sample_rate);
    let points = envelope.feature_points();
    let eps = match eps_for(&envelope, side_params.eps_ratio) {
        Some(eps) => eps,
        None => {
            return Ok(flagged_empty(side, metadata, DetectionFlag::InputTooShort, start_time));
        }
    };
    let min_samples = min_samples(block_size, sample_rate);
    metadata.eps = eps;
    metadata.min_samples = min_samples;

    log::debug!(
        "Clustering {} points: eps={:.4}, min_samples={}, strategy={}",
        points.len(),
        eps,
        min_samples,
        clusterer.name()
    );

    if cancel.is_cancelled() {
        return Err(DetectionError::Cancelled);
    }

    // 3. Density clustering
    let labeling = match clusterer.cluster(&points, eps, min_samples) {
        Ok(labeling) => labeling,
        Err(e) => return Ok(clustering_failed(side, &e, metadata, start_time)),
    };
    metadata.num_clusters = labeling.num_clusters;

    let background = match select_background(&points, &labeling) {
        Some(label) => label,
        None => {
            log::debug!("No density cluster found, no background");
            return Ok(flagged_empty(side, metadata, DetectionFlag::NoBackground, start_time));
        }
    };
    metadata.background_label = Some(background);

    let mut labels = labeling.labels;
    metadata.absorbed_points = absorb_quiet_points(&points, &mut labels, background);

    log::debug!(
        "{} clusters, background label {}, {} quiet points absorbed",
        labeling.num_clusters,
        background,
        metadata.absorbed_points
    );

    // 4. Background runs
    let runs = merge_short_gaps(&background_runs(&labels, background), envelope.block_seconds);
    metadata.sound_runs = sound_runs(&runs)
        .iter()
        .map(|run| run_seconds(run, block_size, filtered.len(), sample_rate, side))
        .collect();
    metadata.transitions_examined = runs.len();

    log::debug!(
        "{} background runs, {} sound runs",
        runs.len(),
        metadata.sound_runs.len()
    );

    // 5. Refinement
    let outcome = refine_boundaries(
        &filtered,
        &runs,
        labels.len(),
        block_size,
        &side_params,
        cancel,
    )?;
    metadata.transitions_skipped = outcome.skipped;
    metadata.transitions_abandoned = outcome.abandoned;

    let indices: Vec<usize> = match side {
        Side::Onset => outcome.boundaries,
        Side::Offset => outcome
            .boundaries
            .into_iter()
            .map(|b| filtered.len() - b)
            .collect(),
    };

    Ok(finish(
        side,
        indices_to_seconds(indices, sample_rate),
        metadata,
        start_time,
    ))
}

/// Detect boundaries inside a time range of a recording
///
/// The range is cut out (to whole milliseconds, clamped to the recording),
/// detection runs on the slice, boundaries closer than
/// `config.range_edge_margin_s` to either edge of the slice are discarded,
/// and the rest are shifted back to absolute time.
///
/// # Errors
///
/// Returns `DetectionError::InvalidInput` for an empty or inverted range, and
/// any error of [`detect_boundaries_with_config`]
pub fn detect_boundaries_in_range(
    samples: &[i16],
    sample_rate: u32,
    params: &ParamSet,
    side: Side,
    config: &DetectorConfig,
    start_s: f64,
    end_s: f64,
) -> Result<DetectionResult, DetectionError> {
    let (lo, hi) = sample_range(samples.len(), sample_rate, start_s, end_s)?;
    let slice = &samples[lo..hi];
    let slice_duration = duration_seconds(slice.len(), sample_rate);
    let offset_s = lo as f64 / sample_rate as f64;
    let margin = config.range_edge_margin_s;

    log::debug!(
        "Range detection over {:.3}-{:.3} s (margin {:.1} s)",
        offset_s,
        offset_s + slice_duration,
        margin
    );

    let mut result = detect_boundaries_with_config(
        slice,
        sample_rate,
        params,
        side,
        config,
        &CancellationToken::new(),
    )?;

    let found = result.times.len();
    result.times = result
        .times
        .into_iter()
        .filter(|&t| t >= margin && t <= slice_duration - margin)
        .map(|t| t + offset_s)
        .collect();
    if result.times.len() < found {
        log::debug!(
            "Discarded {} boundaries near the range edges",
            found - result.times.len()
        );
    }

    for run in &mut result.metadata.sound_runs {
        run.0 += offset_s;
        run.1 += offset_s;
    }
    result.metadata.duration_seconds = duration_seconds(samples.len(), sample_rate);

    Ok(result)
}

/// Detect speech intervals in VAD mode
///
/// Both sides run with the onset parameters (VAD overrides applied), and each
/// onset is paired with the first later offset.
///
/// # Errors
///
/// Returns `DetectionError` if either side fails
///
/// # Example
///
/// ```no_run
/// use boundary_dsp::{detect_intervals, ParamSet};
///
/// let samples = vec![0i16; 16000 * 5];
/// for interval in detect_intervals(&samples, 16000, &ParamSet::default())? {
///     println!("{:.3} - {:.3}", interval.start, interval.end);
/// }
/// # Ok::<(), boundary_dsp::DetectionError>(())
/// ```
pub fn detect_intervals(
    samples: &[i16],
    sample_rate: u32,
    params: &ParamSet,
) -> Result<Vec<SpeechInterval>, DetectionError> {
    detect_intervals_with_config(
        samples,
        sample_rate,
        params,
        &DetectorConfig::default(),
        &CancellationToken::new(),
    )
}

/// [`detect_intervals`] with an explicit configuration and cancellation token
///
/// The configured mode is ignored; intervals are always detected in VAD mode.
pub fn detect_intervals_with_config(
    samples: &[i16],
    sample_rate: u32,
    params: &ParamSet,
    config: &DetectorConfig,
    cancel: &CancellationToken,
) -> Result<Vec<SpeechInterval>, DetectionError> {
    let config = DetectorConfig {
        mode: DetectionMode::Vad,
        ..config.clone()
    };
    let onsets =
        detect_boundaries_with_config(samples, sample_rate, params, Side::Onset, &config, cancel)?;
    let offsets =
        detect_boundaries_with_config(samples, sample_rate, params, Side::Offset, &config, cancel)?;

    let intervals = pair_intervals(&onsets.times, &offsets.times);
    log::debug!(
        "Paired {} onsets and {} offsets into {} intervals",
        onsets.len(),
        offsets.len(),
        intervals.len()
    );
    Ok(intervals)
}

fn finish(
    side: Side,
    times: Vec<f64>,
    mut metadata: DetectionMetadata,
    start_time: Instant,
) -> DetectionResult {
    metadata.processing_time_ms = start_time.elapsed().as_secs_f64() * 1000.0;
    log::debug!(
        "{} detection found {} boundaries in {:.1} ms",
        side.name(),
        times.len(),
        metadata.processing_time_ms
    );
    DetectionResult {
        side,
        times,
        metadata,
    }
}

/// Empty result for a call that stopped early, with the reason flagged
fn flagged_empty(
    side: Side,
    mut metadata: DetectionMetadata,
    flag: DetectionFlag,
    start_time: Instant,
) -> DetectionResult {
    metadata.flags.push(flag);
    metadata.processing_time_ms = start_time.elapsed().as_secs_f64() * 1000.0;
    log::debug!("{} detection stopped early: {:?}", side.name(), flag);
    DetectionResult::empty(side, metadata)
}

/// Clustering failures are recovered as "no boundaries" rather than surfaced
fn clustering_failed(
    side: Side,
    error: &ClusterError,
    metadata: DetectionMetadata,
    start_time: Instant,
) -> DetectionResult {
    log::warn!("Clustering failed ({}), no boundaries", error);
    flagged_empty(side, metadata, DetectionFlag::ClusteringOutOfMemory, start_time)
}

/// Sound run in seconds of the unreversed recording
fn run_seconds(
    run: &BlockRun,
    block_size: usize,
    filtered_len: usize,
    sample_rate: u32,
    side: Side,
) -> (f64, f64) {
    let len = filtered_len as isize;
    let bs = block_size as isize;
    let lo = (run.start * bs).clamp(0, len);
    let hi = ((run.end + 1) * bs).clamp(0, len);
    let (lo, hi) = match side {
        Side::Onset => (lo, hi),
        Side::Offset => (len - hi, len - lo),
    };
    let sr = sample_rate as f64;
    (lo as f64 / sr, hi as f64 / sr)
}
