//! In-memory PCM signal

use crate::error::DetectionError;

/// Mono 16-bit PCM recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    /// Samples
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl Signal {
    /// Wrap samples recorded at `sample_rate`
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        duration_seconds(self.samples.len(), self.sample_rate)
    }

    /// Samples between two times, clamped to the recording
    ///
    /// See [`sample_range`].
    pub fn slice_seconds(&self, start_s: f64, end_s: f64) -> Result<&[i16], DetectionError> {
        let (lo, hi) = sample_range(self.samples.len(), self.sample_rate, start_s, end_s)?;
        Ok(&self.samples[lo..hi])
    }
}

/// Duration of `len` samples in seconds
pub fn duration_seconds(len: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    len as f64 / sample_rate as f64
}

/// Sample index range covering `[start_s, end_s)`
///
/// Times are truncated to whole milliseconds before conversion, and both ends
/// are clamped to `len`.
///
/// # Errors
///
/// Returns `DetectionError::InvalidInput` if a time is negative or not finite,
/// if `end_s <= start_s`, or if the sample rate is zero
pub fn sample_range(
    len: usize,
    sample_rate: u32,
    start_s: f64,
    end_s: f64,
) -> Result<(usize, usize), DetectionError> {
    if sample_rate == 0 {
        return Err(DetectionError::InvalidInput("Invalid sample rate".to_string()));
    }
    if !start_s.is_finite() || !end_s.is_finite() || start_s < 0.0 {
        return Err(DetectionError::InvalidInput(format!(
            "Invalid time range {}..{} s",
            start_s, end_s
        )));
    }
    if end_s <= start_s {
        return Err(DetectionError::InvalidInput(format!(
            "Range end {} s must be after start {} s",
            end_s, start_s
        )));
    }

    let to_index = |seconds: f64| {
        let ms = (seconds * 1000.0).floor() as u64;
        let idx = ms.saturating_mul(sample_rate as u64) / 1000;
        (idx.min(len as u64)) as usize
    };
    Ok((to_index(start_s), to_index(end_s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration() {
        let signal = Signal::new(vec![0; 24000], 16000);
        assert!((signal.duration_seconds() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_slice_seconds_clamps() {
        let signal = Signal::new((0..16000).map(|i| (i % 100) as i16).collect(), 16000);

        let slice = signal.slice_seconds(0.25, 0.5).unwrap();
        assert_eq!(slice.len(), 4000);
        assert_eq!(slice[0], signal.samples[4000]);

        let tail = signal.slice_seconds(0.75, 10.0).unwrap();
        assert_eq!(tail.len(), 4000);
    }

    #[test]
    fn test_invalid_ranges_rejected() {
        assert!(sample_range(100, 16000, 1.0, 0.5).is_err());
        assert!(sample_range(100, 16000, -1.0, 0.5).is_err());
        assert!(sample_range(100, 16000, 0.0, f64::NAN).is_err());
        assert!(sample_range(100, 0, 0.0, 1.0).is_err());
    }
}
