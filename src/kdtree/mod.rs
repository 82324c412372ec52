//! An implementation of an N-dimensional K-D Tree with exact and approximate nearest-neighbor
//! search and a text persistence format.

#![warn(missing_docs)]

mod builder;
mod codec;
mod index;
mod node;
pub mod split;
mod r#trait;
mod traversal;

pub use builder::KDTreeBuilder;
pub use index::KDTree;
pub use r#trait::{KDTreeIndex, Neighbor};
pub use split::{MidpointSplit, RoundRobinSplit, Split, SplitPolicy};
pub use traversal::NodeRef;
