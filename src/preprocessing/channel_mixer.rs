//! Channel selection for multi-channel recordings
//!
//! The detector analyses one channel only. Recordings with more channels keep
//! channel 0; nothing is mixed down.

use crate::error::DetectionError;

/// Extract the first channel from interleaved PCM
///
/// # Arguments
///
/// * `interleaved` - Interleaved samples, `channels` per frame
/// * `channels` - Number of channels
///
/// # Returns
///
/// Samples of channel 0, one per complete frame
pub fn first_channel<T: Copy>(interleaved: &[T], channels: usize) -> Result<Vec<T>, DetectionError> {
    if channels == 0 {
        return Err(DetectionError::InvalidInput(
            "Channel count must be > 0".to_string(),
        ));
    }
    if channels > 1 {
        log::debug!("Keeping channel 0 of {}", channels);
    }
    Ok(interleaved.chunks_exact(channels).map(|frame| frame[0]).collect())
}
