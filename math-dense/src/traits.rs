//! Scalar trait for the dense kernel
//!
//! Every kernel in this crate is written once, generic over [`RealField`],
//! instead of being duplicated per floating-point type.

use num_traits::{Float, FloatConst, FromPrimitive, NumAssign, ToPrimitive};
use std::fmt::Debug;
use std::iter::Sum;

/// Trait for real scalar types the kernel operates on.
///
/// # Implementations
///
/// Provided for:
/// - `f64` (the reference precision)
/// - `f32` (structurally identical, looser tolerances)
pub trait RealField:
    Float
    + FloatConst
    + NumAssign
    + FromPrimitive
    + ToPrimitive
    + Sum
    + Default
    + Send
    + Sync
    + Debug
    + 'static
{
    /// Relative tolerance below which a value is negligible next to another.
    ///
    /// Roughly the number of significant decimal digits of the type: `1e-15`
    /// for `f64`.
    fn negligible_tolerance() -> Self;

    /// Relative comparison `|a - b| < max_error * max(|a|, |b|)`.
    ///
    /// Values at or below the smallest positive normal are compared
    /// absolutely, infinities only compare equal to themselves and NaN never
    /// compares equal.
    fn almost_equal_relative(self, other: Self, max_error: Self) -> bool {
        if self.is_infinite() || other.is_infinite() {
            return self == other;
        }
        if self.is_nan() || other.is_nan() {
            return false;
        }

        let diff = (self - other).abs();
        let tiny = Self::min_positive_value();
        if self.abs() < tiny || other.abs() < tiny {
            return diff < max_error;
        }

        diff < max_error * self.abs().max(other.abs())
    }

    /// Whether `value` vanishes when added to `reference`.
    #[inline]
    fn is_negligible(value: Self, reference: Self) -> bool {
        (reference + value.abs()).almost_equal_relative(reference, Self::negligible_tolerance())
    }

    /// `|self|` carrying the sign of `sign` (Fortran `SIGN`).
    #[inline]
    fn with_sign_of(self, sign: Self) -> Self {
        if sign < Self::zero() {
            -self.abs()
        } else {
            self.abs()
        }
    }

    /// Lossless conversion of a small count, used for constants.
    #[inline]
    fn from_count(n: usize) -> Self {
        Self::from_usize(n).unwrap_or_else(Self::nan)
    }
}

impl RealField for f64 {
    #[inline]
    fn negligible_tolerance() -> Self {
        1e-15
    }
}

impl RealField for f32 {
    #[inline]
    fn negligible_tolerance() -> Self {
        1e-6
    }
}
