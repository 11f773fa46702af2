//! Block-max envelope and the 2-D feature points derived from it
//!
//! The envelope splits the filtered signal into non-overlapping blocks of
//! `sample_rate / 40` samples (about 25 ms) and keeps the maximum of each
//! block. The signed maximum is used, not RMS, so short transients survive the
//! downsampling. Remainder samples past the last full block are dropped.

use crate::error::DetectionError;

/// Envelope blocks per second
pub const BLOCKS_PER_SECOND: u32 = 40;

/// Block size in samples for a sample rate
///
/// # Errors
///
/// Returns `DetectionError::InvalidInput` if the rate is below one sample per block
pub fn block_size(sample_rate: u32) -> Result<usize, DetectionError> {
    let size = (sample_rate / BLOCKS_PER_SECOND) as usize;
    if size == 0 {
        return Err(DetectionError::InvalidInput(format!(
            "Sample rate {} Hz is too low for {} blocks per second",
            sample_rate, BLOCKS_PER_SECOND
        )));
    }
    Ok(size)
}

/// Coarse per-block summary of the filtered signal
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Per-block maxima
    pub values: Vec<f64>,
    /// Samples per block
    pub block_size: usize,
    /// Duration of one block in seconds
    pub block_seconds: f64,
}

impl Envelope {
    /// Downsample a filtered signal by block maxima
    pub fn from_filtered(filtered: &[f64], block_size: usize, sample_rate: u32) -> Self {
        let values: Vec<f64> = filtered
            .chunks_exact(block_size)
            .map(|block| block.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .collect();

        log::debug!(
            "Envelope: {} blocks of {} samples ({} remainder samples dropped)",
            values.len(),
            block_size,
            filtered.len() % block_size
        );

        Self {
            values,
            block_size,
            block_seconds: block_size as f64 / sample_rate as f64,
        }
    }

    /// Number of blocks
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the envelope holds no blocks
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consecutive-pair feature points `(e[i], e[i + 1])`
    pub fn feature_points(&self) -> Vec<[f64; 2]> {
        self.values.windows(2).map(|w| [w[0], w[1]]).collect()
    }

    /// Largest value among the lowest 80 % of blocks
    ///
    /// Loud outliers in the top 20 % do not move the clustering radius.
    /// Returns `None` when fewer than two blocks exist.
    pub fn robust_peak(&self) -> Option<f64> {
        let keep = (0.8 * self.values.len() as f64) as usize;
        if keep == 0 {
            return None;
        }
        let mut sorted = self.values.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        sorted[..keep].iter().copied().reduce(f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_size_is_25ms() {
        assert_eq!(block_size(16000).unwrap(), 400);
        assert_eq!(block_size(44100).unwrap(), 1102);
        assert_eq!(block_size(48000).unwrap(), 1200);
        assert!(block_size(39).is_err());
    }

    #[test]
    fn test_block_max_drops_remainder() {
        let filtered = vec![1.0, -3.0, 2.0, -5.0, -4.0, -6.0, 9.0];
        let env = Envelope::from_filtered(&filtered, 3, 120);

        // Signed maximum, not magnitude
        assert_eq!(env.values, vec![2.0, -4.0]);
        assert!((env.block_seconds - 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_feature_points_pair_neighbours() {
        let env = Envelope {
            values: vec![1.0, 2.0, 3.0],
            block_size: 1,
            block_seconds: 0.025,
        };
        assert_eq!(env.feature_points(), vec![[1.0, 2.0], [2.0, 3.0]]);
    }

    #[test]
    fn test_robust_peak_excludes_top_fifth() {
        let env = Envelope {
            values: vec![5.0, 1.0, 4.0, 2.0, 3.0, 100.0, 6.0, 7.0, 8.0, 90.0],
            block_size: 1,
            block_seconds: 0.025,
        };
        assert_eq!(env.robust_peak(), Some(8.0));

        let single = Envelope {
            values: vec![1.0],
            block_size: 1,
            block_seconds: 0.025,
        };
        assert_eq!(single.robust_peak(), None);
    }
}
