use std::fmt::{Debug, Display};
use std::str::FromStr;

use num_traits::Float;

/// A trait for types that can be used for indexed coordinates.
///
/// This trait is sealed and cannot be implemented for external types. Split pivots are midpoints
/// between two coordinates and the text format relies on lossless round-trip printing, so only
/// the primitive floating point types are supported.
pub trait IndexableNum:
    private::Sealed + Float + Debug + Display + FromStr + Send + Sync + 'static
{
    /// Human readable name of the type, used in log and error messages.
    const TYPE_NAME: &'static str;

    /// Half of the sum of two values.
    ///
    /// Stays finite for finite inputs, even when their sum would overflow.
    #[inline]
    fn midpoint_between(a: Self, b: Self) -> Self {
        let two = Self::one() + Self::one();
        let mid = (a + b) / two;
        if mid.is_finite() {
            mid
        } else {
            a / two + b / two
        }
    }
}

impl IndexableNum for f32 {
    const TYPE_NAME: &'static str = "f32";
}

impl IndexableNum for f64 {
    const TYPE_NAME: &'static str = "f64";
}

// https://rust-lang.github.io/api-guidelines/future-proofing.html#sealed-traits-protect-against-downstream-implementations-c-sealed
mod private {
    pub trait Sealed {}

    impl Sealed for f32 {}
    impl Sealed for f64 {}
}
