//! Policies deciding when a bucket is subdivided and along which hyperplane.

use std::fmt::Debug;

use crate::point::Point;
use crate::r#type::IndexableNum;

/// Default maximum number of points held by a leaf.
pub const DEFAULT_MAX_LEAF_SIZE: usize = 1;

/// The hyperplane partitioning an internal node: points with `coord[axis] <= pivot` belong to
/// the negative child, all others to the positive child.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split<N: IndexableNum> {
    /// The axis the hyperplane is perpendicular to.
    pub axis: usize,
    /// The coordinate of the hyperplane along `axis`.
    pub pivot: N,
}

impl<N: IndexableNum> Split<N> {
    /// Create a new split descriptor.
    pub fn new(axis: usize, pivot: N) -> Self {
        Self { axis, pivot }
    }

    /// Whether a coordinate sequence falls in the negative half space.
    #[inline]
    pub fn is_negative(&self, coords: &[N]) -> bool {
        coords[self.axis] <= self.pivot
    }

    /// Squared perpendicular distance from `coords` to the hyperplane.
    #[inline]
    pub fn plane_sq_dist(&self, coords: &[N]) -> N {
        let d = coords[self.axis] - self.pivot;
        d * d
    }
}

/// Decides whether a bucket needs to be split, and if so where.
///
/// Any implementation can be handed to
/// [`KDTreeBuilder::with_split_policy`][crate::kdtree::KDTreeBuilder::with_split_policy].
pub trait SplitPolicy<N: IndexableNum>: Debug + Send + Sync {
    /// Whether a bucket of `bucket_size` points at depth `level` should be subdivided.
    fn needs_split(&self, bucket_size: usize, level: usize) -> bool;

    /// Choose the splitting hyperplane for a non-empty bucket at depth `level`.
    ///
    /// Returns `None` when no axis separates the points, i.e. every point is identical. The node
    /// is then kept as a leaf regardless of its size.
    fn choose_split(&self, points: &[Point<N>], level: usize) -> Option<Split<N>>;
}

/// Splits at the midpoint of the axis with the widest span.
///
/// Ties between axes of equal span go to the lowest axis.
#[derive(Debug, Clone, Copy)]
pub struct MidpointSplit {
    max_leaf_size: usize,
}

impl MidpointSplit {
    /// Create a policy that splits any bucket larger than `max_leaf_size`.
    pub fn new(max_leaf_size: usize) -> Self {
        assert!(max_leaf_size >= 1, "max_leaf_size must be at least 1");
        Self { max_leaf_size }
    }

    /// The largest bucket left unsplit.
    pub fn max_leaf_size(&self) -> usize {
        self.max_leaf_size
    }
}

impl Default for MidpointSplit {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LEAF_SIZE)
    }
}

impl<N: IndexableNum> SplitPolicy<N> for MidpointSplit {
    fn needs_split(&self, bucket_size: usize, _level: usize) -> bool {
        bucket_size > self.max_leaf_size
    }

    fn choose_split(&self, points: &[Point<N>], _level: usize) -> Option<Split<N>> {
        let (min, max) = axis_bounds(points)?;

        let mut best: Option<Split<N>> = None;
        let mut best_span = N::zero();
        for (axis, (&lo, &hi)) in min.iter().zip(&max).enumerate() {
            let span = hi - lo;
            if span > best_span {
                best_span = span;
                best = Some(Split::new(axis, N::midpoint_between(lo, hi)));
            }
        }
        best
    }
}

/// Cycles the split axis with depth (`level % dims`) and splits at the midpoint of that axis.
///
/// When the cycled axis has no extent the widest axis is used instead, so the policy only gives
/// up on buckets of identical points.
#[derive(Debug, Clone, Copy)]
pub struct RoundRobinSplit {
    max_leaf_size: usize,
}

impl RoundRobinSplit {
    /// Create a policy that splits any bucket larger than `max_leaf_size`.
    pub fn new(max_leaf_size: usize) -> Self {
        assert!(max_leaf_size >= 1, "max_leaf_size must be at least 1");
        Self { max_leaf_size }
    }
}

impl Default for RoundRobinSplit {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LEAF_SIZE)
    }
}

impl<N: IndexableNum> SplitPolicy<N> for RoundRobinSplit {
    fn needs_split(&self, bucket_size: usize, _level: usize) -> bool {
        bucket_size > self.max_leaf_size
    }

    fn choose_split(&self, points: &[Point<N>], level: usize) -> Option<Split<N>> {
        let (min, max) = axis_bounds(points)?;
        let axis = level % min.len();
        if max[axis] > min[axis] {
            return Some(Split::new(axis, N::midpoint_between(min[axis], max[axis])));
        }
        MidpointSplit::new(self.max_leaf_size).choose_split(points, level)
    }
}

/// Per-axis minimum and maximum over a bucket. `None` for an empty bucket.
fn axis_bounds<N: IndexableNum>(points: &[Point<N>]) -> Option<(Vec<N>, Vec<N>)> {
    let (first, rest) = points.split_first()?;
    let mut min = first.coords().to_vec();
    let mut max = first.coords().to_vec();
    for point in rest {
        for (axis, &value) in point.coords().iter().enumerate() {
            if value < min[axis] {
                min[axis] = value;
            }
            if value > max[axis] {
                max[axis] = value;
            }
        }
    }
    Some((min, max))
}
