//! Detection metadata structures

use serde::{Deserialize, Serialize};

/// Conditions worth surfacing alongside a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionFlag {
    /// Input was shorter than the filter or envelope can process
    InputTooShort,
    /// The high cutoff was clamped below Nyquist
    BandClamped,
    /// Clustering could not allocate its working memory
    ClusteringOutOfMemory,
    /// No density cluster was found, so no background could be identified
    NoBackground,
}

/// Pipeline diagnostics for one detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionMetadata {
    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Recording duration in seconds
    pub duration_seconds: f64,

    /// Samples per envelope block
    pub block_size: usize,

    /// Clustering radius
    pub eps: f64,

    /// Core-point neighborhood size
    pub min_samples: usize,

    /// Clustering implementation used
    pub cluster_strategy: String,

    /// Number of density clusters
    pub num_clusters: usize,

    /// Label of the background cluster, if any
    pub background_label: Option<i32>,

    /// Points relabelled into the background by quiet-point absorption
    pub absorbed_points: usize,

    /// Coarse sound stretches `(start, end)` in seconds
    pub sound_runs: Vec<(f64, f64)>,

    /// Background runs handed to the refiner
    pub transitions_examined: usize,

    /// Runs skipped before scanning
    pub transitions_skipped: usize,

    /// Scans that ended without a boundary
    pub transitions_abandoned: usize,

    /// Processing time in milliseconds
    pub processing_time_ms: f64,

    /// Algorithm version
    pub algorithm_version: String,

    /// Conditions encountered
    pub flags: Vec<DetectionFlag>,
}

impl Default for DetectionMetadata {
    fn default() -> Self {
        Self {
            sample_rate: 0,
            duration_seconds: 0.0,
            block_size: 0,
            eps: 0.0,
            min_samples: 0,
            cluster_strategy: String::new(),
            num_clusters: 0,
            background_label: None,
            absorbed_points: 0,
            sound_runs: Vec::new(),
            transitions_examined: 0,
            transitions_skipped: 0,
            transitions_abandoned: 0,
            processing_time_ms: 0.0,
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            flags: Vec::new(),
        }
    }
}
