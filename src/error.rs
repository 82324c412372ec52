use std::fmt::Debug;
use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
pub enum KdIndexError {
    /// Two coordinate sequences of different length were compared, or a point of the wrong
    /// dimension was handed to a tree.
    #[error("Dimension mismatch: expected {expected} coordinates, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A split naming an axis the points do not have. Only ever produced inside the build, where
    /// it turns the node into a leaf.
    #[error("Invalid split: {0}")]
    InvalidSplit(String),

    /// A serialized tree stream that does not follow the text grammar.
    #[error("Format error on line {line}: {message}")]
    Format { line: usize, message: String },

    /// A nearest-neighbor query against a tree that holds no points.
    #[error("Nearest-neighbor query on an empty tree")]
    EmptyTree,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KdIndexError>;
