//! Hysteresis accumulator for the boundary scan
//!
//! Each scanned frame is either active (its trimmed-mean activity exceeds the
//! threshold) or inactive. The accumulator tracks the net evidence
//! `valid - bad * penalty`:
//! - net evidence at or below zero discards everything collected so far
//! - net evidence reaching `num_valid` accepts a boundary
//!
//! A heavy penalty makes a few inactive frames cancel a long active stretch,
//! so brief bursts do not trigger a boundary.

/// Outcome of feeding one frame to the accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStep {
    /// Evidence is positive but below the acceptance level
    Pending,
    /// Evidence dropped to zero or below; counters were cleared
    Reset,
    /// Evidence reached the acceptance level
    Accepted {
        /// Frames counted since the last reset, including this one
        span: u32,
    },
}

/// Active/inactive frame counter with reset and acceptance levels
#[derive(Debug, Clone)]
pub struct HysteresisScan {
    valid: u32,
    bad: u32,
    penalty: f64,
    num_valid: u32,
}

impl HysteresisScan {
    /// New accumulator with cleared counters
    pub fn new(num_valid: u32, penalty: f64) -> Self {
        Self {
            valid: 0,
            bad: 0,
            penalty,
            num_valid,
        }
    }

    /// Net evidence `valid - bad * penalty`
    pub fn net(&self) -> f64 {
        self.valid as f64 - self.bad as f64 * self.penalty
    }

    /// Feed one frame
    pub fn push(&mut self, active: bool) -> ScanStep {
        if active {
            self.valid += 1;
        } else {
            self.bad += 1;
        }

        let net = self.net();
        if net <= 0.0 {
            self.valid = 0;
            self.bad = 0;
            ScanStep::Reset
        } else if net >= self.num_valid as f64 {
            ScanStep::Accepted {
                span: self.valid + self.bad,
            }
        } else {
            ScanStep::Pending
        }
    }
}
