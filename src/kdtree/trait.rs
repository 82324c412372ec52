use geo_traits::CoordTrait;
#[cfg(feature = "rayon")]
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tinyvec::TinyVec;

use crate::error::{KdIndexError, Result};
use crate::kdtree::traversal::NodeRef;
use crate::kdtree::KDTree;
use crate::point::{check_dims, coord_to_vec, sq_dist_unchecked, Point};
use crate::r#type::IndexableNum;

/// The answer to a nearest-neighbor query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<'a, N: IndexableNum> {
    /// The closest point found.
    pub point: &'a Point<N>,
    /// Squared Euclidean distance from the query to `point`.
    pub dist_squared: N,
    /// How many nodes had their bucket scanned to answer the query.
    pub nodes_visited: usize,
}

/// A trait for searching and accessing data out of a KDTree.
pub trait KDTreeIndex<N: IndexableNum>: Sized {
    /// The number of coordinates of every point in this tree.
    fn dims(&self) -> usize;

    /// Access the root node of the tree. `None` for a tree that was never built or loaded.
    fn root(&self) -> Option<NodeRef<'_, N>>;

    /// The point closest to `query` under squared Euclidean distance.
    ///
    /// When several points share the minimal distance, the first one reached wins.
    fn nearest(&self, query: &[N]) -> Result<&Point<N>> {
        self.nearest_neighbor(query).map(|neighbor| neighbor.point)
    }

    /// A point close to `query`, found by following the single root-to-leaf path the query falls
    /// into.
    ///
    /// The result is never closer than the one from [`nearest`][Self::nearest], and can be
    /// farther when the true nearest neighbor lies just across a splitting plane.
    fn nearest_approx(&self, query: &[N]) -> Result<&Point<N>> {
        self.nearest_neighbor_approx(query).map(|neighbor| neighbor.point)
    }

    /// The point closest to a [`CoordTrait`] query.
    fn nearest_coord(&self, coord: &impl CoordTrait<T = N>) -> Result<&Point<N>> {
        self.nearest(&coord_to_vec(coord))
    }

    /// Exact nearest-neighbor search, reporting the distance and search cost.
    ///
    /// Branch and bound: the child containing the query is searched first, and its sibling only
    /// if the splitting plane is closer than the best point found so far.
    fn nearest_neighbor(&self, query: &[N]) -> Result<Neighbor<'_, N>> {
        check_dims(self.dims(), query.len())?;
        let root = self.root().ok_or(KdIndexError::EmptyTree)?;

        let mut best: Option<&Point<N>> = None;
        let mut best_dist = N::infinity();
        let mut nodes_visited = 0;

        // Each entry carries the squared distance from the query to the plane bounding that
        // subtree; the child containing the query is always searched.
        let mut stack: TinyVec<[Option<(NodeRef<'_, N>, N)>; 32]> = TinyVec::new();
        stack.push(Some((root, N::neg_infinity())));

        while let Some((node, bound)) = stack.pop().flatten() {
            if bound >= best_dist {
                continue;
            }
            nodes_visited += 1;

            for point in node.points() {
                let d = sq_dist_unchecked(point.coords(), query);
                // the first candidate is kept even if its distance overflowed
                if best.is_none() || d < best_dist {
                    best_dist = d;
                    best = Some(point);
                }
            }

            if let Some((split, near, far)) = node.containing_child(query) {
                // Note: pushed in reverse order of visiting
                stack.push(Some((far, split.plane_sq_dist(query))));
                stack.push(Some((near, N::neg_infinity())));
            }
        }

        let point = best.ok_or(KdIndexError::EmptyTree)?;
        Ok(Neighbor {
            point,
            dist_squared: best_dist,
            nodes_visited,
        })
    }

    /// Approximate nearest-neighbor search, reporting the distance and search cost.
    ///
    /// Visits at most `depth + 1` nodes.
    fn nearest_neighbor_approx(&self, query: &[N]) -> Result<Neighbor<'_, N>> {
        check_dims(self.dims(), query.len())?;
        let mut next = self.root();
        if next.is_none() {
            return Err(KdIndexError::EmptyTree);
        }

        let mut best: Option<&Point<N>> = None;
        let mut best_dist = N::infinity();
        let mut nodes_visited = 0;

        while let Some(node) = next {
            nodes_visited += 1;
            for point in node.points() {
                let d = sq_dist_unchecked(point.coords(), query);
                if best.is_none() || d < best_dist {
                    best_dist = d;
                    best = Some(point);
                }
            }
            next = node.containing_child(query).map(|(_, near, _)| near);
        }

        let point = best.ok_or(KdIndexError::EmptyTree)?;
        Ok(Neighbor {
            point,
            dist_squared: best_dist,
            nodes_visited,
        })
    }

    /// Search the index for items within a given radius.
    ///
    /// - query: coordinates of the query point
    /// - r: radius
    ///
    /// Returns origin indices of found items
    fn within(&self, query: &[N], r: N) -> Result<Vec<u32>> {
        check_dims(self.dims(), query.len())?;
        let mut result = vec![];
        let Some(root) = self.root() else {
            return Ok(result);
        };
        let r2 = r * r;

        let mut stack: TinyVec<[Option<NodeRef<'_, N>>; 32]> = TinyVec::new();
        stack.push(Some(root));

        while let Some(node) = stack.pop().flatten() {
            for point in node.points() {
                if sq_dist_unchecked(point.coords(), query) <= r2 {
                    result.push(point.index());
                }
            }

            if let Some((split, near, far)) = node.containing_child(query) {
                // queue the far half only if the ball crosses the plane
                if split.plane_sq_dist(query) <= r2 {
                    stack.push(Some(far));
                }
                stack.push(Some(near));
            }
        }

        Ok(result)
    }

    /// Search the index for items within an axis-aligned box, bounds included.
    ///
    /// Returns origin indices of found items
    fn range(&self, min: &[N], max: &[N]) -> Result<Vec<u32>> {
        check_dims(self.dims(), min.len())?;
        check_dims(self.dims(), max.len())?;
        let mut result = vec![];
        let Some(root) = self.root() else {
            return Ok(result);
        };

        let mut stack: TinyVec<[Option<NodeRef<'_, N>>; 32]> = TinyVec::new();
        stack.push(Some(root));

        while let Some(node) = stack.pop().flatten() {
            for point in node.points() {
                let inside = point
                    .coords()
                    .iter()
                    .zip(min.iter().zip(max))
                    .all(|(c, (lo, hi))| c >= lo && c <= hi);
                if inside {
                    result.push(point.index());
                }
            }

            if let (Some(split), Some((neg, pos))) = (node.split(), node.children()) {
                if max[split.axis] > split.pivot {
                    stack.push(Some(pos));
                }
                if min[split.axis] <= split.pivot {
                    stack.push(Some(neg));
                }
            }
        }

        Ok(result)
    }

    /// Answer a batch of exact nearest-neighbor queries in parallel, returning the origin index
    /// of each nearest point.
    #[cfg(feature = "rayon")]
    fn nearest_many(&self, queries: &[Vec<N>]) -> Vec<Result<u32>>
    where
        Self: Sync,
    {
        queries
            .par_iter()
            .map(|query| self.nearest(query).map(Point::index))
            .collect()
    }
}

impl<N: IndexableNum> KDTreeIndex<N> for KDTree<N> {
    fn dims(&self) -> usize {
        self.dims
    }

    fn root(&self) -> Option<NodeRef<'_, N>> {
        self.root.as_ref().map(NodeRef::new)
    }
}
