//! DBSCAN over a pluggable neighborhood query
//!
//! Algorithm:
//! 1. Count each point's neighbors (itself included); points with at least
//!    `min_samples` are core points
//! 2. Visit points in index order; each unlabeled core point seeds a new
//!    cluster
//! 3. Grow the cluster breadth-first: neighbors of core members join it,
//!    and core neighbors are expanded in turn
//! 4. Points never reached stay noise
//!
//! Neighbor lists are walked in ascending index order, so border points
//! reachable from two clusters go to the one seeded first regardless of the
//! query strategy.

use super::kdtree::KdTree;
use super::{manhattan, ClusterError, Clusterer, Labeling, NOISE};
use std::collections::VecDeque;

/// Neighborhood lookups consumed by the cluster expansion
trait Neighborhood {
    /// Number of points within eps of `i`, including `i`
    fn count(&self, i: usize) -> usize;

    /// Indices within eps of `i`, ascending, written into `out`
    fn neighbors(&self, i: usize, out: &mut Vec<usize>);
}

/// DBSCAN with a precomputed pairwise distance matrix
///
/// Needs `n * n` distances up front. When that allocation fails the call
/// returns [`ClusterError::OutOfMemory`] instead of aborting.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseDbscan;

/// DBSCAN with on-demand k-d tree range queries
///
/// Linear memory; the default for long recordings.
#[derive(Debug, Clone, Copy, Default)]
pub struct KdTreeDbscan;

struct DenseNeighborhood {
    n: usize,
    eps: f64,
    distances: Vec<f64>,
}

impl DenseNeighborhood {
    fn new(points: &[[f64; 2]], eps: f64) -> Result<Self, ClusterError> {
        let n = points.len();
        let cells = n
            .checked_mul(n)
            .ok_or(ClusterError::OutOfMemory { points: n })?;

        let mut distances = Vec::new();
        distances
            .try_reserve_exact(cells)
            .map_err(|_| ClusterError::OutOfMemory { points: n })?;

        for a in points {
            distances.extend(points.iter().map(|b| manhattan(a, b)));
        }

        Ok(Self { n, eps, distances })
    }

    fn row(&self, i: usize) -> &[f64] {
        &self.distances[i * self.n..(i + 1) * self.n]
    }
}

impl Neighborhood for DenseNeighborhood {
    fn count(&self, i: usize) -> usize {
        self.row(i).iter().filter(|&&d| d <= self.eps).count()
    }

    fn neighbors(&self, i: usize, out: &mut Vec<usize>) {
        out.clear();
        out.extend(
            self.row(i)
                .iter()
                .enumerate()
                .filter(|&(_, &d)| d <= self.eps)
                .map(|(j, _)| j),
        );
    }
}

struct TreeNeighborhood<'a> {
    tree: KdTree<'a>,
    eps: f64,
}

impl Neighborhood for TreeNeighborhood<'_> {
    fn count(&self, i: usize) -> usize {
        self.tree.count_within(i, self.eps)
    }

    fn neighbors(&self, i: usize, out: &mut Vec<usize>) {
        self.tree.within(i, self.eps, out);
    }
}

fn expand<N: Neighborhood>(hood: &N, n: usize, min_samples: usize) -> Labeling {
    let core: Vec<bool> = (0..n).map(|i| hood.count(i) >= min_samples).collect();

    let mut labels = vec![NOISE; n];
    let mut num_clusters = 0usize;
    let mut queue = VecDeque::new();
    let mut buffer = Vec::new();

    for seed in 0..n {
        if !core[seed] || labels[seed] != NOISE {
            continue;
        }
        let cluster = num_clusters as i32;
        num_clusters += 1;

        labels[seed] = cluster;
        queue.push_back(seed);

        while let Some(current) = queue.pop_front() {
            hood.neighbors(current, &mut buffer);
            for &j in &buffer {
                if labels[j] != NOISE {
                    continue;
                }
                labels[j] = cluster;
                if core[j] {
                    queue.push_back(j);
                }
            }
        }
    }

    Labeling {
        labels,
        num_clusters,
    }
}

impl Clusterer for DenseDbscan {
    fn cluster(
        &self,
        points: &[[f64; 2]],
        eps: f64,
        min_samples: usize,
    ) -> Result<Labeling, ClusterError> {
        let hood = DenseNeighborhood::new(points, eps)?;
        Ok(expand(&hood, points.len(), min_samples))
    }

    fn name(&self) -> &'static str {
        "dense"
    }
}

impl Clusterer for KdTreeDbscan {
    fn cluster(
        &self,
        points: &[[f64; 2]],
        eps: f64,
        min_samples: usize,
    ) -> Result<Labeling, ClusterError> {
        let hood = TreeNeighborhood {
            tree: KdTree::build(points),
            eps,
        };
        Ok(expand(&hood, points.len(), min_samples))
    }

    fn name(&self) -> &'static str {
        "kd-tree"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two tight blobs plus an isolated outlier
    fn two_blobs() -> Vec<[f64; 2]> {
        let mut points = Vec::new();
        for i in 0..6 {
            points.push([0.1 * i as f64, 0.0]);
        }
        for i in 0..6 {
            points.push([10.0 + 0.1 * i as f64, 10.0]);
        }
        points.push([50.0, -50.0]);
        points
    }

    fn lcg_points(n: usize, seed: u64) -> Vec<[f64; 2]> {
        let mut state = seed;
        let mut next = move || {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as f64 / (1u64 << 31) as f64
        };
        (0..n)
            .map(|i| {
                // Three bands of density so clusters, borders and noise all occur
                let offset = (i % 3) as f64 * 4.0;
                [offset + next() * (1.0 + offset), next() * 3.0]
            })
            .collect()
    }

    #[test]
    fn test_two_blobs_and_noise() {
        let points = two_blobs();
        let labeling = KdTreeDbscan.cluster(&points, 0.25, 3).unwrap();

        assert_eq!(labeling.num_clusters, 2);
        assert!(labeling.labels[..6].iter().all(|&l| l == 0));
        assert!(labeling.labels[6..12].iter().all(|&l| l == 1));
        assert_eq!(labeling.labels[12], NOISE);
    }

    #[test]
    fn test_count_includes_self() {
        // Two points: each has two neighbors counting itself
        let points = vec![[0.0, 0.0], [0.5, 0.0]];
        let labeling = DenseDbscan.cluster(&points, 1.0, 2).unwrap();
        assert_eq!(labeling.labels, vec![0, 0]);

        let labeling = DenseDbscan.cluster(&points, 1.0, 3).unwrap();
        assert_eq!(labeling.labels, vec![NOISE, NOISE]);
        assert_eq!(labeling.num_clusters, 0);
    }

    #[test]
    fn test_manhattan_metric() {
        // L1 distance 1.4 but Euclidean ~1.0
        let points = vec![[0.0, 0.0], [0.7, 0.7]];
        let labeling = KdTreeDbscan.cluster(&points, 1.2, 2).unwrap();
        assert_eq!(labeling.labels, vec![NOISE, NOISE]);

        let labeling = KdTreeDbscan.cluster(&points, 1.4, 2).unwrap();
        assert_eq!(labeling.labels, vec![0, 0]);
    }

    #[test]
    fn test_chain_links_through_core_points() {
        // Interior points are core; the two ends are border points
        let points = vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [2.0, 0.0],
            [3.0, 0.0],
            [4.0, 0.0],
            [5.0, 0.0],
            [6.0, 0.0],
        ];
        let labeling = DenseDbscan.cluster(&points, 1.0, 3).unwrap();
        assert_eq!(labeling.num_clusters, 1);
        assert!(labeling.labels.iter().all(|&l| l == 0));
    }

    #[test]
    fn test_strategies_agree() {
        for seed in [1u64, 7, 42] {
            let points = lcg_points(400, seed);
            for (eps, min_samples) in [(0.3, 4), (0.6, 12), (1.5, 30)] {
                let dense = DenseDbscan.cluster(&points, eps, min_samples).unwrap();
                let tree = KdTreeDbscan.cluster(&points, eps, min_samples).unwrap();
                assert_eq!(dense, tree, "seed {} eps {} min {}", seed, eps, min_samples);
            }
        }
    }

    #[test]
    fn test_identical_points_with_zero_eps() {
        let points = vec![[0.0, 0.0]; 30];
        let labeling = KdTreeDbscan.cluster(&points, 0.0, 12).unwrap();
        assert_eq!(labeling.num_clusters, 1);
        assert!(labeling.labels.iter().all(|&l| l == 0));
    }

    #[test]
    fn test_empty_input() {
        let labeling = DenseDbscan.cluster(&[], 1.0, 3).unwrap();
        assert!(labeling.labels.is_empty());
        assert_eq!(labeling.num_clusters, 0);
    }
}
