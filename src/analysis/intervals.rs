//! Pairing onsets and offsets into speech intervals

use serde::{Deserialize, Serialize};

/// Stretch of detected speech
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeechInterval {
    /// Onset time in seconds
    pub start: f64,
    /// Offset time in seconds
    pub end: f64,
}

impl SpeechInterval {
    /// Interval length in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Pair each onset with the first offset after it
///
/// Both inputs must be ascending. Onsets that fall inside an interval already
/// formed are skipped, as are offsets with no onset before them, so the
/// output is ordered and non-overlapping.
pub fn pair_intervals(onsets: &[f64], offsets: &[f64]) -> Vec<SpeechInterval> {
    let mut intervals = Vec::new();
    let mut next_offset = 0;
    let mut last_end = f64::NEG_INFINITY;

    for &start in onsets {
        if start < last_end {
            continue;
        }
        while next_offset < offsets.len() && offsets[next_offset] <= start {
            next_offset += 1;
        }
        let Some(&end) = offsets.get(next_offset) else {
            break;
        };
        intervals.push(SpeechInterval { start, end });
        last_end = end;
        next_offset += 1;
    }
    intervals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_pairs() {
        let intervals = pair_intervals(&[0.5, 1.8], &[1.0, 2.4]);
        assert_eq!(
            intervals,
            vec![
                SpeechInterval { start: 0.5, end: 1.0 },
                SpeechInterval { start: 1.8, end: 2.4 },
            ]
        );
        assert!((intervals[1].duration() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_unpaired_boundaries_dropped() {
        // Leading offset and trailing onset have no partner
        let intervals = pair_intervals(&[0.5, 3.0], &[0.2, 1.0]);
        assert_eq!(intervals, vec![SpeechInterval { start: 0.5, end: 1.0 }]);
    }

    #[test]
    fn test_nested_onset_skipped() {
        let intervals = pair_intervals(&[0.5, 0.7, 2.0], &[1.0, 2.5]);
        assert_eq!(
            intervals,
            vec![
                SpeechInterval { start: 0.5, end: 1.0 },
                SpeechInterval { start: 2.0, end: 2.5 },
            ]
        );
    }

    #[test]
    fn test_empty_inputs() {
        assert!(pair_intervals(&[], &[1.0]).is_empty());
        assert!(pair_intervals(&[1.0], &[]).is_empty());
    }
}
