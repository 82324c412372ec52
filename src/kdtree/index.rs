use crate::kdtree::node::Node;
use crate::kdtree::traversal::NodeRef;
use crate::point::Point;
use crate::r#type::IndexableNum;

/// An immutable kd-tree over N-dimensional points.
///
/// Usually this will be created from scratch via [`KDTreeBuilder`][crate::kdtree::KDTreeBuilder]
/// or loaded from its text form with [`KDTree::read_from`].
#[derive(Debug, Clone, PartialEq)]
pub struct KDTree<N: IndexableNum> {
    pub(crate) root: Option<Node<N>>,
    pub(crate) dims: usize,
    pub(crate) num_items: usize,
    /// Handle given to the next node created in this tree.
    pub(crate) next_handle: u32,
}

impl<N: IndexableNum> KDTree<N> {
    /// A tree without a root. Every nearest-neighbor query on it fails with
    /// [`EmptyTree`][crate::KdIndexError::EmptyTree].
    pub fn new(dims: usize) -> Self {
        assert!(dims > 0, "a tree needs at least one dimension");
        Self {
            root: None,
            dims,
            num_items: 0,
            next_handle: 0,
        }
    }

    /// The number of coordinates of every point in this tree.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// The number of points stored in this tree.
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// Whether this tree holds no points.
    pub fn is_empty(&self) -> bool {
        self.num_items == 0
    }

    /// Access the root node of the tree for manual traversal.
    pub fn root(&self) -> Option<NodeRef<'_, N>> {
        self.root.as_ref().map(NodeRef::new)
    }

    /// The number of nodes in this tree, both leaves and internal nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes().count()
    }

    /// The level of the deepest node. A tree made of a single leaf has depth 0.
    pub fn depth(&self) -> usize {
        self.nodes().map(|node| node.level()).max().unwrap_or(0)
    }

    /// All leaves of this tree, negative subtrees first.
    pub fn leaves(&self) -> impl Iterator<Item = NodeRef<'_, N>> {
        self.nodes().filter(|node| node.is_leaf())
    }

    /// All points of this tree, in leaf order.
    pub fn points(&self) -> impl Iterator<Item = &Point<N>> {
        self.leaves().flat_map(|leaf| leaf.points().iter())
    }

    /// All nodes of this tree in depth-first pre-order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeRef<'_, N>> {
        let mut stack: Vec<NodeRef<'_, N>> = self.root().into_iter().collect();
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            if let Some((neg, pos)) = node.children() {
                stack.push(pos);
                stack.push(neg);
            }
            Some(node)
        })
    }
}
