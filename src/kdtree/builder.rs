use log::{debug, trace, warn};

use crate::error::Result;
use crate::kdtree::node::Node;
use crate::kdtree::split::{MidpointSplit, Split, SplitPolicy};
use crate::kdtree::KDTree;
use crate::point::{check_dims, Point};
use crate::r#type::IndexableNum;

/// A builder to create a [`KDTree`].
///
/// ```
/// use kd_index::kdtree::{KDTreeBuilder, KDTreeIndex};
///
/// let mut builder = KDTreeBuilder::<f64>::new(2).with_max_leaf_size(1);
/// builder.add(&[0., 0.]).unwrap();
/// builder.add(&[10., 0.]).unwrap();
/// builder.add(&[0., 10.]).unwrap();
/// builder.add(&[10., 10.]).unwrap();
/// let tree = builder.finish();
///
/// assert_eq!(tree.nearest(&[1., 1.]).unwrap().index(), 0);
/// ```
#[derive(Debug)]
pub struct KDTreeBuilder<N: IndexableNum> {
    dims: usize,
    points: Vec<Point<N>>,
    next_index: u32,
    policy: Box<dyn SplitPolicy<N>>,
}

impl<N: IndexableNum> KDTreeBuilder<N> {
    /// Create a new builder for points with `dims` coordinates, using the default split policy.
    pub fn new(dims: usize) -> Self {
        Self::with_capacity(dims, 0)
    }

    /// Create a new builder with room for `num_items` points.
    pub fn with_capacity(dims: usize, num_items: usize) -> Self {
        assert!(dims > 0, "a tree needs at least one dimension");
        Self {
            dims,
            points: Vec::with_capacity(num_items),
            next_index: 0,
            policy: Box::<MidpointSplit>::default(),
        }
    }

    /// Use the widest-axis midpoint policy, splitting buckets larger than `max_leaf_size`.
    pub fn with_max_leaf_size(self, max_leaf_size: usize) -> Self {
        self.with_split_policy(MidpointSplit::new(max_leaf_size))
    }

    /// Replace the split policy used by [`finish`][Self::finish].
    pub fn with_split_policy(mut self, policy: impl SplitPolicy<N> + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// The number of coordinates of every point in this tree.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// The number of points added so far.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no point has been added yet.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a point to the index, returning the origin index assigned to it.
    ///
    /// Indices are assigned in insertion order, starting at zero.
    pub fn add(&mut self, coords: &[N]) -> Result<u32> {
        check_dims(self.dims, coords.len())?;
        let index = self.next_index;
        self.points.push(Point::new(coords, index));
        self.next_index += 1;
        Ok(index)
    }

    /// Add a point that already carries its origin index.
    ///
    /// Later calls to [`add`][Self::add] continue numbering after the largest index seen.
    pub fn add_point(&mut self, point: Point<N>) -> Result<()> {
        check_dims(self.dims, point.dims())?;
        self.next_index = self.next_index.max(point.index().saturating_add(1));
        self.points.push(point);
        Ok(())
    }

    /// Consume this builder, partitioning every point into a tree ready for queries.
    pub fn finish(self) -> KDTree<N> {
        let Self {
            dims,
            points,
            policy,
            ..
        } = self;

        let num_items = points.len();
        let mut next_handle = 0;
        let mut root = Node::new_leaf(next_handle, 0, points);
        next_handle += 1;

        partition(&mut root, dims, policy.as_ref(), &mut next_handle);

        let tree = KDTree {
            root: Some(root),
            dims,
            num_items,
            next_handle,
        };
        debug!(
            "built {}-d {} tree: {} items, {} nodes, depth {}",
            dims,
            N::TYPE_NAME,
            num_items,
            tree.num_nodes(),
            tree.depth()
        );
        tree
    }
}

/// Split `root` and its descendants until the policy is satisfied.
///
/// Nodes are processed depth first, negative child before positive, so handles are handed out in
/// the same order as a recursive partition would.
fn partition<N: IndexableNum>(
    root: &mut Node<N>,
    dims: usize,
    policy: &dyn SplitPolicy<N>,
    next_handle: &mut u32,
) {
    // Each node carries how many splits in a row its bucket went through unchanged.
    let mut stack: Vec<(&mut Node<N>, usize)> = vec![(root, 0)];

    while let Some((node, stalled)) = stack.pop() {
        if !policy.needs_split(node.points.len(), node.level) {
            continue;
        }

        // no separating axis: every point in the bucket is identical
        let Some(split) = policy.choose_split(&node.points, node.level) else {
            trace!(
                "node {} keeps {} coincident points",
                node.handle,
                node.points.len()
            );
            continue;
        };

        let stalled = if split.axis < dims && !node.separates(&split) {
            stalled + 1
        } else {
            0
        };
        if stalled > 0 && never_separates(node, split, stalled, dims, policy) {
            warn!(
                "node {} left as a leaf: {} points never separate on axis {} at {}",
                node.handle,
                node.points.len(),
                split.axis,
                split.pivot
            );
            continue;
        }

        if let Err(err) = node.split_into_children(split, dims, next_handle) {
            warn!("node {} left as a leaf: {}", node.handle, err);
            continue;
        }
        trace!(
            "node {} split on axis {} at {}",
            node.handle,
            split.axis,
            split.pivot
        );

        if let Some((neg, pos)) = node.children.as_deref_mut() {
            // only the child that received the bucket carries the count on
            let pos_stalled = if pos.points.is_empty() { 0 } else { stalled };
            let neg_stalled = if neg.points.is_empty() { 0 } else { stalled };
            stack.push((pos, pos_stalled));
            stack.push((neg, neg_stalled));
        }
    }
}

/// Whether a one-sided `split` of `node` starts a chain of splits that never shrinks the bucket.
///
/// That is the case when the child receiving the whole bucket would choose the very same split,
/// or when the bucket already went through `dims` one-sided splits in a row.
fn never_separates<N: IndexableNum>(
    node: &Node<N>,
    split: Split<N>,
    stalled: usize,
    dims: usize,
    policy: &dyn SplitPolicy<N>,
) -> bool {
    if stalled > dims {
        return true;
    }
    let child_level = node.level + 1;
    policy.needs_split(node.points.len(), child_level)
        && policy.choose_split(&node.points, child_level) == Some(split)
}

impl<N: IndexableNum> KDTree<N> {
    /// Build a tree over `points` with the default split policy.
    ///
    /// Every point must have `dims` coordinates. Origin indices are kept as given.
    pub fn build(dims: usize, points: impl IntoIterator<Item = Point<N>>) -> Result<Self> {
        let mut builder = KDTreeBuilder::new(dims);
        for point in points {
            builder.add_point(point)?;
        }
        Ok(builder.finish())
    }
}
