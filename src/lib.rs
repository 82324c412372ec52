#![doc = include_str!("../README.md")]

mod error;
pub mod kdtree;
mod point;
mod r#type;

pub use error::{KdIndexError, Result};
pub use point::{sq_dist, Point};
pub use r#type::IndexableNum;

#[cfg(test)]
pub(crate) mod test;
