//! Dense linear-algebra kernel
//!
//! This crate provides the classical BLAS/LAPACK primitives as pure Rust over
//! flat column-major buffers, generic over the real scalar type.
//!
//! # Features
//!
//! - **Vector operations**: AXPY, scaling, dot product, elementwise arithmetic
//! - **Matrix multiply**: `C = alpha * op(A) * op(B) + beta * C` with a
//!   cache-oblivious recursive kernel
//! - **Factorizations**: LU with partial pivoting, Cholesky, Householder QR
//!   (full and thin), SVD
//! - **Solves**: from each factorization, including least squares
//! - **Norms**: one, infinity, Frobenius and max-abs
//! - **Parallelism**: rayon fork-join above configurable thresholds
//!   (`rayon` feature, on by default)
//!
//! # Layout
//!
//! An `m x n` matrix is a slice of `m * n` elements with `(i, j)` at
//! `j * m + i`. Shapes are passed explicitly and checked on entry.
//! Operations that need scratch space have a `*_with_work` form following a
//! work-query protocol: a too-small buffer gets the required size written to
//! `work[0]` and the call fails with [`KernelError::WorkArrayTooSmall`].
//!
//! # Example
//!
//! ```
//! use math_audio_dense::{lu_solve, Result};
//!
//! fn main() -> Result<()> {
//!     // [[2, 1], [1, 3]] x = [3, 5]
//!     let a = [2.0, 1.0, 1.0, 3.0];
//!     let mut b = [3.0_f64, 5.0];
//!     lu_solve(1, &a, 2, &mut b)?;
//!     assert!((b[0] - 0.8).abs() < 1e-12);
//!     assert!((b[1] - 1.4).abs() < 1e-12);
//!     Ok(())
//! }
//! ```

pub mod blas_helpers;
mod checks;
pub mod config;
pub mod direct;
pub mod error;
pub mod gemm;
pub mod norm;
pub mod parallel;
pub mod provider;
pub mod traits;
pub mod types;

// Re-export main types
pub use config::Control;
pub use error::{KernelError, Result};
pub use parallel::Parallelism;
pub use provider::{LinearAlgebraProvider, ManagedProvider};
pub use traits::RealField;
pub use types::{Norm, QrMethod, Transpose};

// Re-export vector operations
pub use blas_helpers::{
    add_arrays, add_arrays_in_place, add_vector_to_scaled_vector,
    add_vector_to_scaled_vector_in_place, dot_product, point_wise_divide_arrays,
    point_wise_divide_arrays_in_place, point_wise_multiply_arrays,
    point_wise_multiply_arrays_in_place, point_wise_power_arrays, point_wise_power_arrays_in_place,
    scale_array, scale_array_in_place, subtract_arrays, subtract_arrays_in_place,
};

// Re-export matrix operations
pub use gemm::{matrix_multiply, matrix_multiply_with_block, matrix_multiply_with_update};
pub use norm::{matrix_norm, matrix_norm_with_work, matrix_norm_work_size};

// Re-export factorizations
pub use direct::{
    cholesky_factor, cholesky_solve, cholesky_solve_factored, lu_determinant, lu_factor,
    lu_inverse, lu_inverse_factored, lu_inverse_factored_with_work, lu_inverse_with_work,
    lu_inverse_work_size, lu_solve, lu_solve_factored, lu_solve_factored_transposed,
    lu_solve_transposed, qr_factor, qr_factor_with_work, qr_factor_work_size, qr_solve,
    qr_solve_factored, qr_solve_with_work, qr_solve_work_size, singular_value_decomposition,
    singular_value_decomposition_with_work, svd_condition_number, svd_rank, svd_solve,
    svd_solve_factored, svd_work_size, thin_qr_factor, thin_qr_factor_with_work,
};
