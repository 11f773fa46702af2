//! Two-dimensional k-d tree with Manhattan range queries
//!
//! The tree is implicit: a permutation of point indices where each subrange
//! `[lo, hi)` is split at its midpoint on alternating axes. Building costs
//! O(n log n); memory is one index per point.

use super::manhattan;
use std::cmp::Ordering;

/// Static k-d tree over borrowed points
#[derive(Debug)]
pub struct KdTree<'a> {
    points: &'a [[f64; 2]],
    order: Vec<usize>,
}

impl<'a> KdTree<'a> {
    /// Build a tree over `points`
    pub fn build(points: &'a [[f64; 2]]) -> Self {
        let mut order: Vec<usize> = (0..points.len()).collect();
        split(points, &mut order, 0);
        Self { points, order }
    }

    /// Number of indexed points
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the tree is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Indices of all points within Manhattan distance `eps` of point `query`
    ///
    /// `out` is cleared first and filled in ascending index order; the query
    /// point itself is included.
    pub fn within(&self, query: usize, eps: f64, out: &mut Vec<usize>) {
        out.clear();
        let q = self.points[query];
        self.search(&q, eps, 0, self.order.len(), 0, out);
        out.sort_unstable();
    }

    /// Number of points within Manhattan distance `eps` of point `query`
    pub fn count_within(&self, query: usize, eps: f64) -> usize {
        let q = self.points[query];
        let mut count = 0;
        self.visit(&q, eps, 0, self.order.len(), 0, &mut |_| count += 1);
        count
    }

    fn search(&self, q: &[f64; 2], eps: f64, lo: usize, hi: usize, depth: usize, out: &mut Vec<usize>) {
        self.visit(q, eps, lo, hi, depth, &mut |idx| out.push(idx));
    }

    fn visit<F: FnMut(usize)>(
        &self,
        q: &[f64; 2],
        eps: f64,
        lo: usize,
        hi: usize,
        depth: usize,
        hit: &mut F,
    ) {
        if lo >= hi {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        let idx = self.order[mid];
        let p = &self.points[idx];
        if manhattan(p, q) <= eps {
            hit(idx);
        }

        // Per-axis distance never exceeds the L1 distance, so a side can be
        // pruned once the splitting plane is farther than eps
        let axis = depth % 2;
        let diff = q[axis] - p[axis];
        if diff <= eps {
            self.visit(q, eps, lo, mid, depth + 1, hit);
        }
        if diff >= -eps {
            self.visit(q, eps, mid + 1, hi, depth + 1, hit);
        }
    }
}

fn split(points: &[[f64; 2]], order: &mut [usize], depth: usize) {
    if order.len() <= 1 {
        return;
    }
    let axis = depth % 2;
    let mid = order.len() / 2;
    order.select_nth_unstable_by(mid, |&a, &b| {
        points[a][axis]
            .partial_cmp(&points[b][axis])
            .unwrap_or(Ordering::Equal)
    });
    let (left, right) = order.split_at_mut(mid);
    split(points, left, depth + 1);
    split(points, &mut right[1..], depth + 1);
}
