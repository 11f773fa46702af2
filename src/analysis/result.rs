//! Detection result types

use super::metadata::DetectionMetadata;
use crate::config::Side;
use serde::{Deserialize, Serialize};

/// Boundaries found on one side of a recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Side that was searched
    pub side: Side,

    /// Boundary times in seconds, strictly increasing
    pub times: Vec<f64>,

    /// Pipeline diagnostics
    pub metadata: DetectionMetadata,
}

impl DetectionResult {
    /// Result with no boundaries
    pub fn empty(side: Side, metadata: DetectionMetadata) -> Self {
        Self {
            side,
            times: Vec::new(),
            metadata,
        }
    }

    /// Number of boundaries
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether no boundary was found
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Convert boundary sample indices to sorted, de-duplicated seconds
pub fn indices_to_seconds(mut indices: Vec<usize>, sample_rate: u32) -> Vec<f64> {
    indices.sort_unstable();
    indices.dedup();
    indices
        .into_iter()
        .map(|i| i as f64 / sample_rate as f64)
        .collect()
}
