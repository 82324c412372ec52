use crate::error::{KdIndexError, Result};
use crate::kdtree::split::Split;
use crate::point::Point;
use crate::r#type::IndexableNum;

/// A node of the tree.
///
/// A node is either a leaf holding a bucket of points, or an internal node holding a split and
/// exactly two children. Internal nodes hold no points of their own once the build is complete.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Node<N: IndexableNum> {
    pub(crate) points: Vec<Point<N>>,
    pub(crate) split: Option<Split<N>>,
    /// Negative then positive child.
    pub(crate) children: Option<Box<(Node<N>, Node<N>)>>,
    pub(crate) level: usize,
    pub(crate) handle: u32,
}

impl<N: IndexableNum> Node<N> {
    pub(crate) fn new_leaf(handle: u32, level: usize, points: Vec<Point<N>>) -> Self {
        Self {
            points,
            split: None,
            children: None,
            level,
            handle,
        }
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Child containing `coords`, followed by its sibling.
    #[inline]
    pub(crate) fn containing_child(&self, coords: &[N]) -> Option<(&Split<N>, &Node<N>, &Node<N>)> {
        let split = self.split.as_ref()?;
        let (neg, pos) = self.children.as_deref()?;
        if split.is_negative(coords) {
            Some((split, neg, pos))
        } else {
            Some((split, pos, neg))
        }
    }

    /// Whether `split` sends points of this bucket to both children.
    pub(crate) fn separates(&self, split: &Split<N>) -> bool {
        let num_negative = self
            .points
            .iter()
            .filter(|p| split.is_negative(p.coords()))
            .count();
        num_negative > 0 && num_negative < self.points.len()
    }

    /// Move every point of this node's bucket into two new children, routing by `split`.
    ///
    /// Both children are created even when one of them receives no points. Fails without
    /// touching the node if the split axis is out of range.
    pub(crate) fn split_into_children(
        &mut self,
        split: Split<N>,
        dims: usize,
        next_handle: &mut u32,
    ) -> Result<()> {
        if split.axis >= dims {
            return Err(KdIndexError::InvalidSplit(format!(
                "axis {} out of range for {} dimensions",
                split.axis, dims
            )));
        }

        let (neg_points, pos_points): (Vec<_>, Vec<_>) = std::mem::take(&mut self.points)
            .into_iter()
            .partition(|p| split.is_negative(p.coords()));

        let neg = Node::new_leaf(*next_handle, self.level + 1, neg_points);
        let pos = Node::new_leaf(*next_handle + 1, self.level + 1, pos_points);
        *next_handle += 2;

        self.split = Some(split);
        self.children = Some(Box::new((neg, pos)));
        Ok(())
    }
}

impl<N: IndexableNum> Drop for Node<N> {
    // Unlink descendants iteratively; skewed trees can be deeper than the call stack allows.
    fn drop(&mut self) {
        let mut stack: Vec<Box<(Node<N>, Node<N>)>> = self.children.take().into_iter().collect();
        while let Some(mut children) = stack.pop() {
            stack.extend(children.0.children.take());
            stack.extend(children.1.children.take());
        }
    }
}
