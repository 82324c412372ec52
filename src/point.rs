//! Points and the squared Euclidean distance primitives shared by every query.

use geo_traits::{CoordTrait, Dimensions};

use crate::error::{KdIndexError, Result};
use crate::r#type::IndexableNum;

/// An N-dimensional coordinate tuple tagged with the index it was assigned when it was added to
/// a tree.
///
/// The origin index is carried along unchanged through every split and through serialization.
/// It plays no role in any geometric computation.
#[derive(Debug, Clone, PartialEq)]
pub struct Point<N: IndexableNum> {
    coords: Vec<N>,
    index: u32,
}

impl<N: IndexableNum> Point<N> {
    /// Create a new point from its coordinates and origin index.
    pub fn new(coords: impl Into<Vec<N>>, index: u32) -> Self {
        Self {
            coords: coords.into(),
            index,
        }
    }

    /// The coordinates of this point.
    #[inline]
    pub fn coords(&self) -> &[N] {
        &self.coords
    }

    /// The origin index of this point.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The number of coordinates of this point.
    #[inline]
    pub fn dims(&self) -> usize {
        self.coords.len()
    }

    /// Squared Euclidean distance from this point to `other`.
    #[inline]
    pub fn sq_dist(&self, other: &[N]) -> Result<N> {
        sq_dist(&self.coords, other)
    }

    /// Consume the point, returning its coordinates and origin index.
    pub fn into_parts(self) -> (Vec<N>, u32) {
        (self.coords, self.index)
    }
}

/// Squared Euclidean distance between two coordinate sequences of equal length.
#[inline]
pub fn sq_dist<N: IndexableNum>(a: &[N], b: &[N]) -> Result<N> {
    check_dims(a.len(), b.len())?;
    Ok(sq_dist_unchecked(a, b))
}

/// Squared Euclidean distance without the length check. Callers validate the query dimension
/// once, before a traversal starts.
#[inline]
pub(crate) fn sq_dist_unchecked<N: IndexableNum>(a: &[N], b: &[N]) -> N {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).fold(N::zero(), |sum, (&ai, &bi)| {
        let d = ai - bi;
        sum + d * d
    })
}

#[inline]
pub(crate) fn check_dims(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(KdIndexError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

impl<N: IndexableNum> CoordTrait for Point<N> {
    type T = N;

    fn dim(&self) -> Dimensions {
        match self.coords.len() {
            2 => Dimensions::Xy,
            3 => Dimensions::Xyz,
            n => Dimensions::Unknown(n),
        }
    }

    fn x(&self) -> Self::T {
        self.coords[0]
    }

    fn y(&self) -> Self::T {
        self.coords[1]
    }

    fn nth_or_panic(&self, n: usize) -> Self::T {
        match self.coords.get(n) {
            Some(value) => *value,
            None => panic!("Invalid index of coord"),
        }
    }
}

/// Collect the coordinates of any [`CoordTrait`] into a vector.
pub(crate) fn coord_to_vec<N: IndexableNum>(coord: &impl CoordTrait<T = N>) -> Vec<N> {
    (0..coord.dim().size()).map(|i| coord.nth_or_panic(i)).collect()
}
