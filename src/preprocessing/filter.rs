//! Zero-phase Butterworth filtering
//!
//! Designs a digital Butterworth filter from its analog prototype via the
//! bilinear transform, then applies it forward and backward so the output has
//! no phase shift. Band-pass when a low cutoff is given, low-pass otherwise.
//!
//! Algorithm:
//! 1. Analog low-pass prototype poles on the unit circle
//! 2. Pre-warp the cutoffs and transform to low-pass or band-pass
//! 3. Bilinear transform to the z-plane, expand to transfer-function form
//! 4. Forward/backward filtering with odd-extension padding and steady-state
//!    initial conditions
//!
//! # Example
//!
//! ```
//! use boundary_dsp::preprocessing::filter::{filter_signal, FilterSpec};
//!
//! let samples = vec![0i16; 16000];
//! let spec = FilterSpec { low_cutoff_hz: 200.0, high_cutoff_hz: 4000.0 };
//! let filtered = filter_signal(&samples, spec, 16000)?;
//! assert_eq!(filtered.len(), samples.len());
//! # Ok::<(), boundary_dsp::DetectionError>(())
//! ```

use crate::config::DetectionParams;
use crate::error::DetectionError;
use rustfft::num_complex::Complex;
use std::f64::consts::PI;

type C64 = Complex<f64>;

/// Butterworth order used by the detector
pub const FILTER_ORDER: usize = 4;

/// Normalized cutoffs are kept strictly below Nyquist
const MAX_NORMALIZED_CUTOFF: f64 = 0.99;

/// Bilinear transform constant (`2 * fs` with frequencies normalized to fs = 2)
const BILINEAR_FS2: f64 = 4.0;

/// Pass band of the detector's filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    /// Low cutoff in Hz (0 selects low-pass only)
    pub low_cutoff_hz: f64,
    /// High cutoff in Hz
    pub high_cutoff_hz: f64,
}

impl FilterSpec {
    /// Band taken from a side's tuning parameters
    pub fn from_params(params: &DetectionParams) -> Self {
        Self {
            low_cutoff_hz: params.cutoff0,
            high_cutoff_hz: params.cutoff1,
        }
    }

    /// Whether the high cutoff will be clamped below Nyquist at this rate
    pub fn high_cutoff_clamped(&self, sample_rate: u32) -> bool {
        self.high_cutoff_hz / (sample_rate as f64 / 2.0) >= MAX_NORMALIZED_CUTOFF
    }
}

/// Transfer-function coefficients, `a[0] == 1`
#[derive(Debug, Clone, PartialEq)]
pub struct IirCoefficients {
    /// Numerator
    pub b: Vec<f64>,
    /// Denominator
    pub a: Vec<f64>,
}

impl IirCoefficients {
    /// Padding used by [`filtfilt`] at each end
    pub fn pad_len(&self) -> usize {
        3 * self.a.len().max(self.b.len())
    }
}

/// Shortest input [`filter_signal`] accepts
pub fn min_input_len() -> usize {
    // b and a both have 2 * order + 1 taps for the band-pass design
    3 * (2 * FILTER_ORDER + 1) + 1
}

/// Design a digital Butterworth filter
///
/// A high cutoff at or above Nyquist is clamped to 0.99 of Nyquist and logged;
/// it never fails.
///
/// # Errors
///
/// Returns `DetectionError::InvalidParameter` if the low cutoff is at or above
/// the (clamped) high cutoff, or the sample rate is zero.
pub fn butterworth(
    order: usize,
    spec: FilterSpec,
    sample_rate: u32,
) -> Result<IirCoefficients, DetectionError> {
    if sample_rate == 0 {
        return Err(DetectionError::InvalidInput("Invalid sample rate".to_string()));
    }
    if order == 0 {
        return Err(DetectionError::InvalidParameter(
            "Filter order must be > 0".to_string(),
        ));
    }

    let nyquist = sample_rate as f64 / 2.0;
    let low = spec.low_cutoff_hz / nyquist;
    let mut high = spec.high_cutoff_hz / nyquist;

    if spec.high_cutoff_clamped(sample_rate) {
        log::warn!(
            "High cutoff {:.1} Hz is not below Nyquist ({:.1} Hz), clamping to {:.1} Hz",
            spec.high_cutoff_hz,
            nyquist,
            MAX_NORMALIZED_CUTOFF * nyquist
        );
        high = MAX_NORMALIZED_CUTOFF;
    }

    if low < 0.0 || low >= high {
        return Err(DetectionError::InvalidParameter(format!(
            "Low cutoff {:.1} Hz must be below the usable high cutoff {:.1} Hz",
            spec.low_cutoff_hz,
            high * nyquist
        )));
    }

    // Analog prototype: poles evenly spaced on the left half of the unit circle
    let prototype: Vec<C64> = (0..order)
        .map(|k| {
            let m = 2.0 * k as f64 - (order as f64 - 1.0);
            -C64::from_polar(1.0, PI * m / (2.0 * order as f64))
        })
        .collect();

    let warp = |w: f64| BILINEAR_FS2 * (PI * w / 2.0).tan();

    let (zeros, poles, gain) = if low == 0.0 {
        let wo = warp(high);
        let poles: Vec<C64> = prototype.iter().map(|&p| p * wo).collect();
        (Vec::new(), poles, wo.powi(order as i32))
    } else {
        let w1 = warp(low);
        let w2 = warp(high);
        let bw = w2 - w1;
        let wo = (w1 * w2).sqrt();

        let mut poles = Vec::with_capacity(2 * order);
        let scaled: Vec<C64> = prototype.iter().map(|&p| p * (bw / 2.0)).collect();
        for &p in &scaled {
            poles.push(p + (p * p - wo * wo).sqrt());
        }
        for &p in &scaled {
            poles.push(p - (p * p - wo * wo).sqrt());
        }
        (vec![C64::new(0.0, 0.0); order], poles, bw.powi(order as i32))
    };

    // Bilinear transform
    let fs2 = C64::new(BILINEAR_FS2, 0.0);
    let num: C64 = zeros.iter().map(|&z| fs2 - z).product();
    let den: C64 = poles.iter().map(|&p| fs2 - p).product();
    let gain = gain * (num / den).re;

    let mut digital_zeros: Vec<C64> = zeros.iter().map(|&z| (fs2 + z) / (fs2 - z)).collect();
    digital_zeros.resize(poles.len(), C64::new(-1.0, 0.0));
    let digital_poles: Vec<C64> = poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();

    let b = poly(&digital_zeros).iter().map(|c| gain * c.re).collect();
    let a = poly(&digital_poles).iter().map(|c| c.re).collect();

    Ok(IirCoefficients { b, a })
}

/// Expand roots into monic polynomial coefficients, highest power first
fn poly(roots: &[C64]) -> Vec<C64> {
    let mut coeffs = vec![C64::new(1.0, 0.0)];
    for &root in roots {
        let mut next = vec![C64::new(0.0, 0.0); coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c * root;
        }
        coeffs = next;
    }
    coeffs
}

/// Direct form II transposed filter with initial state `zi`
pub fn lfilter(coeffs: &IirCoefficients, x: &[f64], zi: &[f64]) -> Vec<f64> {
    let b = &coeffs.b;
    let a = &coeffs.a;
    let n = a.len();
    let mut z = zi.to_vec();
    let mut y = Vec::with_capacity(x.len());

    if n < 2 {
        return x.iter().map(|&v| b[0] * v).collect();
    }

    for &xv in x {
        let yv = b[0] * xv + z[0];
        for i in 0..n - 2 {
            z[i] = b[i + 1] * xv + z[i + 1] - a[i + 1] * yv;
        }
        z[n - 2] = b[n - 1] * xv - a[n - 1] * yv;
        y.push(yv);
    }

    y
}

/// Steady-state initial conditions for a unit step input
///
/// Solves `(I - Aᵀ) zi = b[1..] - a[1..] * b[0]` where `A` is the companion
/// matrix of `a`.
pub fn lfilter_zi(coeffs: &IirCoefficients) -> Result<Vec<f64>, DetectionError> {
    let b = &coeffs.b;
    let a = &coeffs.a;
    let m = a.len().saturating_sub(1);

    let mut matrix = vec![vec![0.0f64; m + 1]; m];
    for i in 0..m {
        matrix[i][i] += 1.0;
        matrix[i][0] += a[i + 1];
        if i + 1 < m {
            matrix[i][i + 1] -= 1.0;
        }
        matrix[i][m] = b[i + 1] - a[i + 1] * b[0];
    }

    // Gauss-Jordan with partial pivoting
    for col in 0..m {
        let pivot = (col..m)
            .max_by(|&r1, &r2| {
                matrix[r1][col]
                    .abs()
                    .partial_cmp(&matrix[r2][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        if matrix[pivot][col].abs() < 1e-300 {
            return Err(DetectionError::ProcessingError(
                "Singular system while computing filter initial conditions".to_string(),
            ));
        }
        matrix.swap(col, pivot);

        for row in 0..m {
            if row != col {
                let factor = matrix[row][col] / matrix[col][col];
                if factor != 0.0 {
                    for k in col..=m {
                        matrix[row][k] -= factor * matrix[col][k];
                    }
                }
            }
        }
    }

    Ok((0..m).map(|i| matrix[i][m] / matrix[i][i]).collect())
}

/// Zero-phase forward/backward filtering
///
/// The input is extended at both ends by odd reflection about its end points
/// before filtering, and both passes start from steady-state conditions
/// scaled to the first sample they see.
///
/// # Errors
///
/// Returns `DetectionError::InvalidInput` if `x` is not longer than the
/// padding.
pub fn filtfilt(coeffs: &IirCoefficients, x: &[f64]) -> Result<Vec<f64>, DetectionError> {
    let pad = coeffs.pad_len();
    let n = x.len();
    if n <= pad {
        return Err(DetectionError::InvalidInput(format!(
            "Signal of {} samples is too short for zero-phase filtering (need > {})",
            n, pad
        )));
    }

    let mut ext = Vec::with_capacity(n + 2 * pad);
    ext.extend((1..=pad).rev().map(|i| 2.0 * x[0] - x[i]));
    ext.extend_from_slice(x);
    ext.extend((0..pad).map(|i| 2.0 * x[n - 1] - x[n - 2 - i]));

    let zi = lfilter_zi(coeffs)?;

    let init: Vec<f64> = zi.iter().map(|z| z * ext[0]).collect();
    let mut y = lfilter(coeffs, &ext, &init);

    y.reverse();
    let init: Vec<f64> = zi.iter().map(|z| z * y[0]).collect();
    let mut y = lfilter(coeffs, &y, &init);
    y.reverse();

    Ok(y[pad..pad + n].to_vec())
}

/// Filter 16-bit PCM with a zero-phase 4th-order Butterworth filter
///
/// # Arguments
///
/// * `samples` - Mono PCM samples
/// * `spec` - Pass band (low cutoff 0 selects low-pass)
/// * `sample_rate` - Sample rate in Hz
///
/// # Returns
///
/// Filtered signal, same length as `samples`
pub fn filter_signal(
    samples: &[i16],
    spec: FilterSpec,
    sample_rate: u32,
) -> Result<Vec<f64>, DetectionError> {
    let coeffs = butterworth(FILTER_ORDER, spec, sample_rate)?;
    log::debug!(
        "Filtering {} samples at {} Hz, band {:.1}-{:.1} Hz",
        samples.len(),
        sample_rate,
        spec.low_cutoff_hz,
        spec.high_cutoff_hz
    );

    let x: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
    filtfilt(&coeffs, &x)
}
