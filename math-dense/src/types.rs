//! Small enums shared by the kernel entry points

use serde::{Deserialize, Serialize};

/// Whether an operand enters a product as stored or transposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Transpose {
    /// Use the operand as stored
    #[default]
    DontTranspose,
    /// Use the transpose of the operand
    Transpose,
    /// Use the conjugate transpose; identical to `Transpose` for real data
    ConjugateTranspose,
}

impl Transpose {
    /// Returns `true` unless this is [`Transpose::DontTranspose`].
    #[inline]
    pub fn is_transposed(self) -> bool {
        !matches!(self, Transpose::DontTranspose)
    }

    /// Shape of `op(X)` for a stored `rows x cols` operand.
    #[inline]
    pub fn apply(self, rows: usize, cols: usize) -> (usize, usize) {
        if self.is_transposed() {
            (cols, rows)
        } else {
            (rows, cols)
        }
    }
}

/// Matrix norms computed by [`crate::norm::matrix_norm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Norm {
    /// Maximum absolute column sum
    OneNorm,
    /// Maximum absolute row sum
    InfinityNorm,
    /// Square root of the sum of squared entries
    FrobeniusNorm,
    /// Largest absolute entry
    LargestAbsoluteValue,
}

/// Which QR factorization a solve consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QrMethod {
    /// Q is `rows x rows`, R is `rows x cols`
    #[default]
    Full,
    /// Q is `rows x cols`, R is `cols x cols`
    Thin,
}
