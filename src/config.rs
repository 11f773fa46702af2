//! Configuration parameters for boundary detection

use crate::error::DetectionError;
use serde::{Deserialize, Serialize};

/// Which boundary of an utterance to locate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Speech begins
    Onset,
    /// Speech ends
    Offset,
}

impl Side {
    /// Lowercase name, as used in parameter files and annotation tiers
    pub fn name(&self) -> &'static str {
        match self {
            Side::Onset => "onset",
            Side::Offset => "offset",
        }
    }
}

/// Tuning parameters for one side of the detector
///
/// Field names follow the parameter files of the annotation tool, so a
/// serialized `ParamSet` can be shared with it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DetectionParams {
    /// Threshold multiplier applied to the baseline noise floor
    pub amp: f64,

    /// Low cutoff in Hz (0 selects a low-pass filter)
    pub cutoff0: f64,

    /// High cutoff in Hz (clamped below Nyquist)
    pub cutoff1: f64,

    /// Net number of active frames required to accept a boundary
    #[serde(rename = "numValid")]
    pub num_valid: u32,

    /// Kernel length in samples for the scan window
    pub win_size: usize,

    /// Fraction of the smallest differences kept by the trimmed mean, in (0, 1]
    pub ratio: f64,

    /// Weight of an inactive frame against the accumulated evidence
    pub penalty: f64,

    /// Length in samples of the baseline reference window
    pub ref_len: usize,

    /// Clustering radius as a fraction of the 80th-percentile envelope value
    pub eps_ratio: f64,
}

impl DetectionParams {
    /// Tuned defaults for onset detection
    pub fn onset_default() -> Self {
        Self {
            amp: 1.47,
            cutoff0: 60.0,
            cutoff1: 10800.0,
            num_valid: 475,
            win_size: 152,
            ratio: 0.97,
            penalty: 14.7,
            ref_len: 1000,
            eps_ratio: 0.02,
        }
    }

    /// Tuned defaults for offset detection
    pub fn offset_default() -> Self {
        Self {
            amp: 1.94,
            cutoff0: 200.0,
            cutoff1: 10200.0,
            num_valid: 3335,
            win_size: 102,
            ratio: 0.87,
            penalty: 10.8,
            ref_len: 1000,
            eps_ratio: 0.015,
        }
    }

    /// Copy with the four fields pinned by VAD mode
    pub fn with_vad_overrides(self) -> Self {
        Self {
            ratio: 0.9,
            win_size: 50,
            ref_len: 250,
            penalty: 10.0,
            ..self
        }
    }

    /// Check every field against its domain
    ///
    /// Cutoffs are only checked for ordering here; the Nyquist relation
    /// depends on the sample rate and is handled by the filter.
    ///
    /// # Errors
    ///
    /// Returns `DetectionError::InvalidParameter` naming the first offending field
    pub fn validate(&self) -> Result<(), DetectionError> {
        fn invalid(msg: String) -> Result<(), DetectionError> {
            Err(DetectionError::InvalidParameter(msg))
        }

        if !self.amp.is_finite() || self.amp <= 0.0 {
            return invalid(format!("amp must be a positive number, got {}", self.amp));
        }
        if !self.cutoff0.is_finite() || self.cutoff0 < 0.0 {
            return invalid(format!("cutoff0 must be >= 0 Hz, got {}", self.cutoff0));
        }
        if !self.cutoff1.is_finite() || self.cutoff1 <= self.cutoff0 {
            return invalid(format!(
                "cutoff1 must be greater than cutoff0 ({} Hz), got {}",
                self.cutoff0, self.cutoff1
            ));
        }
        if self.num_valid == 0 {
            return invalid("numValid must be at least 1".to_string());
        }
        if self.win_size == 0 {
            return invalid("win_size must be at least 1 sample".to_string());
        }
        if !(self.ratio > 0.0 && self.ratio <= 1.0) {
            return invalid(format!("ratio must be in (0, 1], got {}", self.ratio));
        }
        if trimmed_len(self.win_size, self.ratio) == 0 {
            return invalid(format!(
                "win_size {} with ratio {} keeps no samples",
                self.win_size, self.ratio
            ));
        }
        if !self.penalty.is_finite() || self.penalty < 0.0 {
            return invalid(format!("penalty must be >= 0, got {}", self.penalty));
        }
        if self.ref_len < 2 {
            return invalid(format!("ref_len must be at least 2 samples, got {}", self.ref_len));
        }
        if !self.eps_ratio.is_finite() || self.eps_ratio <= 0.0 {
            return invalid(format!("eps_ratio must be positive, got {}", self.eps_ratio));
        }
        Ok(())
    }
}

/// Number of values a trimmed mean keeps out of `len` at `ratio`
pub(crate) fn trimmed_len(len: usize, ratio: f64) -> usize {
    (len as f64 * ratio) as usize
}

/// Onset and offset parameters, as stored by the annotation tool
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamSet {
    /// Parameters used when locating onsets
    pub onset: DetectionParams,
    /// Parameters used when locating offsets
    pub offset: DetectionParams,
}

impl ParamSet {
    /// Parameters for the requested side
    pub fn for_side(&self, side: Side) -> &DetectionParams {
        match side {
            Side::Onset => &self.onset,
            Side::Offset => &self.offset,
        }
    }

    /// Effective parameters for `side` under the given mode
    ///
    /// In VAD mode the onset set drives both sides, with fixed kernel and
    /// penalty settings.
    pub fn effective(&self, side: Side, mode: DetectionMode) -> DetectionParams {
        match mode {
            DetectionMode::General => *self.for_side(side),
            DetectionMode::Vad => self.onset.with_vad_overrides(),
        }
    }

    /// Validate both sides
    pub fn validate(&self) -> Result<(), DetectionError> {
        self.onset.validate()?;
        self.offset.validate()
    }
}

impl Default for ParamSet {
    fn default() -> Self {
        Self {
            onset: DetectionParams::onset_default(),
            offset: DetectionParams::offset_default(),
        }
    }
}

/// Detection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    /// Independent onset and offset parameter sets
    #[default]
    General,
    /// Voice-activity mode: one parameter set, intervals as output
    Vad,
}

/// Density clustering implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterStrategy {
    /// k-d tree neighbor queries (O(n log n) for typical envelopes)
    #[default]
    KdTree,
    /// Dense pairwise distance matrix (O(n²) memory, small inputs only)
    Dense,
}

/// Detector configuration outside the per-side tuning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Clustering implementation (default: k-d tree)
    pub cluster_strategy: ClusterStrategy,

    /// Detection mode (default: General)
    pub mode: DetectionMode,

    /// Boundaries closer than this to either edge of a time-range slice are
    /// discarded (default: 5.0 seconds)
    pub range_edge_margin_s: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            cluster_strategy: ClusterStrategy::KdTree,
            mode: DetectionMode::General,
            range_edge_margin_s: 5.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ParamSet::default().validate().is_ok());
        assert!(DetectionParams::onset_default().with_vad_overrides().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_malformed_fields() {
        let base = DetectionParams::onset_default();

        let cases = [
            DetectionParams { ratio: -0.5, ..base },
            DetectionParams { ratio: 1.5, ..base },
            DetectionParams { win_size: 0, ..base },
            DetectionParams { win_size: 1, ratio: 0.5, ..base },
            DetectionParams { num_valid: 0, ..base },
            DetectionParams { amp: 0.0, ..base },
            DetectionParams { amp: f64::NAN, ..base },
            DetectionParams { cutoff0: 500.0, cutoff1: 400.0, ..base },
            DetectionParams { penalty: -1.0, ..base },
            DetectionParams { ref_len: 1, ..base },
            DetectionParams { eps_ratio: 0.0, ..base },
        ];

        for params in cases {
            let result = params.validate();
            assert!(
                matches!(result, Err(DetectionError::InvalidParameter(_))),
                "expected rejection for {:?}",
                params
            );
        }
    }

    #[test]
    fn test_vad_mode_uses_onset_params_for_both_sides() {
        let params = ParamSet::default();
        let onset = params.effective(Side::Onset, DetectionMode::Vad);
        let offset = params.effective(Side::Offset, DetectionMode::Vad);

        assert_eq!(onset, offset);
        assert_eq!(offset.amp, params.onset.amp);
        assert_eq!(offset.win_size, 50);
        assert_eq!(offset.ref_len, 250);
        assert!((offset.ratio - 0.9).abs() < 1e-12);
        assert!((offset.penalty - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_general_mode_selects_side() {
        let params = ParamSet::default();
        assert_eq!(params.effective(Side::Offset, DetectionMode::General), params.offset);
        assert_eq!(params.effective(Side::Onset, DetectionMode::General), params.onset);
    }

    #[test]
    fn test_trimmed_len_truncates() {
        assert_eq!(trimmed_len(152, 0.97), 147);
        assert_eq!(trimmed_len(10, 0.09), 0);
        assert_eq!(trimmed_len(50, 1.0), 50);
    }
}
