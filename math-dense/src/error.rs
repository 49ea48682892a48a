//! Error types for the dense kernel.
//!
//! Every operation validates its arguments before touching any buffer, so a
//! precondition error always leaves the caller's data untouched. Domain and
//! convergence errors are raised mid-computation; the buffers being factored
//! are then in an unspecified state and must be discarded.

use thiserror::Error;

/// Errors that can occur in kernel operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    /// A buffer does not have the length implied by the declared shape.
    #[error("array `{name}` has length {got}, expected {expected}")]
    ArrayLength {
        /// Argument name
        name: &'static str,
        /// Length implied by the declared dimensions
        expected: usize,
        /// Actual buffer length
        got: usize,
    },

    /// Operand shapes are incompatible for the requested operation.
    #[error(
        "dimension mismatch in {operation}: {}x{} and {}x{}",
        .left.0, .left.1, .right.0, .right.1
    )]
    DimensionMismatch {
        /// Operation being performed
        operation: &'static str,
        /// Shape of the left operand (after transposition)
        left: (usize, usize),
        /// Shape of the right operand (after transposition)
        right: (usize, usize),
    },

    /// The operation requires at least as many rows as columns.
    #[error("matrix has fewer rows ({rows}) than columns ({cols})")]
    RowsLessThanColumns {
        /// Row count
        rows: usize,
        /// Column count
        cols: usize,
    },

    /// A pivot entry points outside the factored matrix.
    #[error("pivot[{index}] = {value} is out of range for order {order}")]
    PivotOutOfRange {
        /// Position in the pivot vector
        index: usize,
        /// Offending row index
        value: usize,
        /// Matrix order
        order: usize,
    },

    /// The caller-provided work buffer is too small.
    ///
    /// When the buffer was non-empty, `work[0]` now holds `required`.
    #[error("work array too small: {got} elements given, {required} required")]
    WorkArrayTooSmall {
        /// Minimum number of elements
        required: usize,
        /// Number of elements provided
        got: usize,
    },

    /// A row or column index lies outside the range it must address.
    #[error("`{name}` = {index} is out of range (bound {bound})")]
    IndexOutOfRange {
        /// Argument name
        name: &'static str,
        /// Offending index
        index: usize,
        /// Exclusive upper bound
        bound: usize,
    },

    /// Two arguments that must be distinct buffers are the same buffer.
    #[error("`{first}` and `{second}` must not be the same buffer")]
    InvalidAliasing {
        /// First argument name
        first: &'static str,
        /// Second argument name
        second: &'static str,
    },

    /// Cholesky found a non-positive pivot.
    #[error("matrix is not positive definite (pivot {column} is not positive)")]
    NotPositiveDefinite {
        /// Column at which the factorization broke down
        column: usize,
    },

    /// The SVD iteration exceeded its sweep limit.
    #[error("singular value decomposition did not converge after {iterations} iterations")]
    NonConvergence {
        /// Number of sweeps performed on the last active block
        iterations: usize,
    },
}

/// A specialized `Result` type for kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;

impl KernelError {
    /// Returns `true` for argument errors detected before any mutation.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            KernelError::ArrayLength { .. }
                | KernelError::DimensionMismatch { .. }
                | KernelError::RowsLessThanColumns { .. }
                | KernelError::PivotOutOfRange { .. }
                | KernelError::WorkArrayTooSmall { .. }
                | KernelError::IndexOutOfRange { .. }
                | KernelError::InvalidAliasing { .. }
        )
    }

    /// Returns `true` if the input violated a mathematical assumption.
    pub fn is_domain_error(&self) -> bool {
        matches!(self, KernelError::NotPositiveDefinite { .. })
    }

    /// Returns `true` if an iterative phase failed to converge.
    pub fn is_convergence_error(&self) -> bool {
        matches!(self, KernelError::NonConvergence { .. })
    }

    /// Required work size carried by a [`KernelError::WorkArrayTooSmall`].
    pub fn required_work_size(&self) -> Option<usize> {
        match self {
            KernelError::WorkArrayTooSmall { required, .. } => Some(*required),
            _ => None,
        }
    }
}
