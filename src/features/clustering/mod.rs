//! Density clustering of envelope feature points
//!
//! Separates background (silence) from active regions with DBSCAN under the
//! Manhattan metric. Two interchangeable strategies sit behind [`Clusterer`]:
//! - [`KdTreeDbscan`]: neighbor queries on a 2-D k-d tree (default)
//! - [`DenseDbscan`]: full pairwise distance matrix, for small inputs and
//!   cross-checking
//!
//! Both produce identical labelings for the same input.
//!
//! After clustering, the background cluster is the one whose members come
//! closest to the origin, and every point no farther from the origin than the
//! background's mean squared norm is absorbed into it.

pub mod dbscan;
pub mod kdtree;

pub use dbscan::{DenseDbscan, KdTreeDbscan};

use crate::config::ClusterStrategy;
use crate::preprocessing::envelope::Envelope;
use std::fmt;

/// Label of points reachable from no core point
pub const NOISE: i32 = -1;

/// Minimum neighborhood duration in seconds for a core point
const MIN_CORE_SECONDS: f64 = 0.3;

/// Cluster assignment for each feature point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labeling {
    /// Cluster id per point, [`NOISE`] for unassigned points
    pub labels: Vec<i32>,
    /// Number of clusters found (ids are `0..num_clusters`)
    pub num_clusters: usize,
}

/// Clustering failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterError {
    /// Working memory for the given number of points could not be allocated
    OutOfMemory {
        /// Number of feature points
        points: usize,
    },
}

impl fmt::Display for ClusterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterError::OutOfMemory { points } => {
                write!(f, "not enough memory to cluster {} points", points)
            }
        }
    }
}

impl std::error::Error for ClusterError {}

/// DBSCAN capability shared by both strategies
pub trait Clusterer: Send + Sync {
    /// Label `points`; a point is core with at least `min_samples` points
    /// (itself included) within Manhattan distance `eps`
    fn cluster(
        &self,
        points: &[[f64; 2]],
        eps: f64,
        min_samples: usize,
    ) -> Result<Labeling, ClusterError>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Clusterer for a configured strategy
pub fn clusterer_for(strategy: ClusterStrategy) -> Box<dyn Clusterer> {
    match strategy {
        ClusterStrategy::KdTree => Box::new(KdTreeDbscan),
        ClusterStrategy::Dense => Box::new(DenseDbscan),
    }
}

/// Core-point threshold: envelope blocks spanning 0.3 s
///
/// Reduces to 12 for every sample rate that is a multiple of 40 Hz.
pub fn min_samples(block_size: usize, sample_rate: u32) -> usize {
    (MIN_CORE_SECONDS * sample_rate as f64 / block_size as f64).ceil() as usize
}

/// Clustering radius: a fraction of the 80th-percentile envelope value
pub fn eps_for(envelope: &Envelope, eps_ratio: f64) -> Option<f64> {
    envelope.robust_peak().map(|peak| eps_ratio * peak)
}

#[inline]
pub(crate) fn manhattan(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    (a[0] - b[0]).abs() + (a[1] - b[1]).abs()
}

/// Cluster whose members reach closest to the origin
///
/// Closeness is the minimum coordinate sum over the cluster's members; ties
/// keep the lower id. Returns `None` when no cluster was found.
pub fn select_background(points: &[[f64; 2]], labeling: &Labeling) -> Option<i32> {
    let mut best_sum = vec![f64::INFINITY; labeling.num_clusters];
    for (point, &label) in points.iter().zip(&labeling.labels) {
        if label >= 0 {
            let slot = &mut best_sum[label as usize];
            *slot = slot.min(point[0] + point[1]);
        }
    }

    let mut background: Option<(i32, f64)> = None;
    for (label, &sum) in best_sum.iter().enumerate() {
        if !sum.is_finite() {
            continue;
        }
        match background {
            Some((_, best)) if sum >= best => {}
            _ => background = Some((label as i32, sum)),
        }
    }
    background.map(|(label, _)| label)
}

/// Relabel quiet points into the background cluster
///
/// Every point whose squared distance from the origin does not exceed the
/// mean squared distance of the background's members joins the background.
///
/// # Returns
///
/// Number of points whose label changed
pub fn absorb_quiet_points(points: &[[f64; 2]], labels: &mut [i32], background: i32) -> usize {
    let norm_sq = |p: &[f64; 2]| p[0] * p[0] + p[1] * p[1];

    let (sum, count) = points
        .iter()
        .zip(labels.iter())
        .filter(|&(_, &label)| label == background)
        .fold((0.0f64, 0usize), |(sum, count), (p, _)| (sum + norm_sq(p), count + 1));

    if count == 0 {
        return 0;
    }
    let mean = sum / count as f64;

    let mut changed = 0;
    for (point, label) in points.iter().zip(labels.iter_mut()) {
        if *label != background && norm_sq(point) <= mean {
            *label = background;
            changed += 1;
        }
    }
    changed
}
