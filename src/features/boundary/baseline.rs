//! Trimmed-mean statistics over first differences of the filtered signal

use crate::config::trimmed_len;

/// Absolute first differences `|f[k] - f[k - 1]|` for `k` in `lo..hi`
///
/// `out` is cleared first. Requires `1 <= lo` and `hi <= filtered.len()`.
pub fn abs_diffs(filtered: &[f64], lo: usize, hi: usize, out: &mut Vec<f64>) {
    out.clear();
    if lo >= hi {
        return;
    }
    out.extend(filtered[lo - 1..hi].windows(2).map(|w| (w[1] - w[0]).abs()));
}

/// Mean of the smallest `floor(len * ratio)` values
///
/// Reorders `values` in place. Returns `None` when nothing is kept.
pub fn trimmed_mean(values: &mut [f64], ratio: f64) -> Option<f64> {
    let keep = trimmed_len(values.len(), ratio);
    if keep == 0 {
        return None;
    }
    if keep < values.len() {
        values.select_nth_unstable_by(keep - 1, |a, b| {
            a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)
        });
    }
    Some(values[..keep].iter().sum::<f64>() / keep as f64)
}

/// Offset of the first smallest value
pub fn argmin(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v >= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
