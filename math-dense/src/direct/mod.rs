//! Dense factorizations and the solves built on them
//!
//! - [`lu`]: LU decomposition with partial pivoting, inverse, determinant
//! - [`cholesky`]: `L * L^T` for symmetric positive definite matrices
//! - [`qr`]: Householder QR (full and thin), least-squares solves
//! - [`svd`]: Golub-Kahan SVD, minimum-norm least-squares solves

pub mod cholesky;
pub mod lu;
pub mod qr;
pub mod svd;

pub use cholesky::{cholesky_factor, cholesky_solve, cholesky_solve_factored};
pub use lu::{
    lu_determinant, lu_factor, lu_inverse, lu_inverse_factored, lu_inverse_factored_with_work,
    lu_inverse_with_work, lu_inverse_work_size, lu_solve, lu_solve_factored,
    lu_solve_factored_transposed, lu_solve_transposed,
};
pub use qr::{
    compute_qr, generate_column, qr_factor, qr_factor_with_work, qr_factor_work_size, qr_solve,
    qr_solve_factored, qr_solve_with_work, qr_solve_work_size, thin_qr_factor,
    thin_qr_factor_with_work,
};
pub use svd::{
    singular_value_decomposition, singular_value_decomposition_with_work, svd_condition_number,
    svd_rank, svd_solve, svd_solve_factored, svd_work_size,
};
