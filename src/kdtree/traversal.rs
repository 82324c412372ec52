//! Utilities to traverse the KDTree structure.

use crate::kdtree::node::Node;
use crate::kdtree::split::Split;
use crate::point::Point;
use crate::r#type::IndexableNum;

/// A read-only view onto a node of a [`KDTree`][crate::kdtree::KDTree].
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a, N: IndexableNum> {
    node: &'a Node<N>,
}

impl<'a, N: IndexableNum> NodeRef<'a, N> {
    pub(crate) fn new(node: &'a Node<N>) -> Self {
        Self { node }
    }

    /// Display handle of this node, unique within its tree.
    pub fn handle(&self) -> u32 {
        self.node.handle
    }

    /// Depth of this node. The root is at level 0.
    pub fn level(&self) -> usize {
        self.node.level
    }

    /// Returns `true` if this is a leaf node without children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.node.is_leaf()
    }

    /// Returns `true` if this is an intermediate node with children.
    #[inline]
    pub fn is_parent(&self) -> bool {
        !self.is_leaf()
    }

    /// The hyperplane separating the children of this node. `None` on leaves.
    pub fn split(&self) -> Option<Split<N>> {
        self.node.split
    }

    /// The bucket of points stored directly at this node. Always empty on internal nodes.
    pub fn points(&self) -> &'a [Point<N>] {
        &self.node.points
    }

    /// The negative and positive children of this node. `None` on leaves.
    pub fn children(&self) -> Option<(NodeRef<'a, N>, NodeRef<'a, N>)> {
        self.node
            .children
            .as_deref()
            .map(|(neg, pos)| (NodeRef::new(neg), NodeRef::new(pos)))
    }

    /// The child holding points with `coord[axis] <= pivot`.
    pub fn negative_child(&self) -> Option<NodeRef<'a, N>> {
        self.children().map(|(neg, _)| neg)
    }

    /// The child holding points with `coord[axis] > pivot`.
    pub fn positive_child(&self) -> Option<NodeRef<'a, N>> {
        self.children().map(|(_, pos)| pos)
    }

    /// The split, the child whose half space contains `coords`, and its sibling.
    #[inline]
    pub(crate) fn containing_child(
        &self,
        coords: &[N],
    ) -> Option<(Split<N>, NodeRef<'a, N>, NodeRef<'a, N>)> {
        self.node
            .containing_child(coords)
            .map(|(split, near, far)| (*split, NodeRef::new(near), NodeRef::new(far)))
    }
}
