//! Provider interface
//!
//! Front-ends program against [`LinearAlgebraProvider`] so that the pure
//! kernel in this crate and any native-backed implementation are
//! interchangeable. Every method has the argument order, buffer layout and
//! error contract of the free function of the same name, including the
//! `*_with_work` forms and their work-size queries.

use crate::error::Result;
use crate::parallel::Parallelism;
use crate::traits::RealField;
use crate::types::{Norm, QrMethod, Transpose};
use crate::{blas_helpers, direct, gemm, norm};

/// Dense linear-algebra operations over column-major buffers.
#[allow(clippy::too_many_arguments)]
pub trait LinearAlgebraProvider<T: RealField>: Send + Sync {
    // Vector operations

    /// `result = y + alpha * x`
    fn add_vector_to_scaled_vector(
        &self,
        y: &[T],
        alpha: T,
        x: &[T],
        result: &mut [T],
    ) -> Result<()>;

    /// `y = y + alpha * x`
    fn add_vector_to_scaled_vector_in_place(&self, y: &mut [T], alpha: T, x: &[T]) -> Result<()>;

    /// `result = alpha * x`
    fn scale_array(&self, alpha: T, x: &[T], result: &mut [T]) -> Result<()>;

    /// `x = alpha * x`
    fn scale_array_in_place(&self, alpha: T, x: &mut [T]) -> Result<()>;

    /// `Σ x[i] * y[i]`
    fn dot_product(&self, x: &[T], y: &[T]) -> Result<T>;

    /// `result = x + y`
    fn add_arrays(&self, x: &[T], y: &[T], result: &mut [T]) -> Result<()>;

    /// `x = x + y`
    fn add_arrays_in_place(&self, x: &mut [T], y: &[T]) -> Result<()>;

    /// `result = x - y`
    fn subtract_arrays(&self, x: &[T], y: &[T], result: &mut [T]) -> Result<()>;

    /// `x = x - y`
    fn subtract_arrays_in_place(&self, x: &mut [T], y: &[T]) -> Result<()>;

    /// `result[i] = x[i] * y[i]`
    fn point_wise_multiply_arrays(&self, x: &[T], y: &[T], result: &mut [T]) -> Result<()>;

    /// `x[i] = x[i] * y[i]`
    fn point_wise_multiply_arrays_in_place(&self, x: &mut [T], y: &[T]) -> Result<()>;

    /// `result[i] = x[i] / y[i]`
    fn point_wise_divide_arrays(&self, x: &[T], y: &[T], result: &mut [T]) -> Result<()>;

    /// `x[i] = x[i] / y[i]`
    fn point_wise_divide_arrays_in_place(&self, x: &mut [T], y: &[T]) -> Result<()>;

    /// `result[i] = x[i] ^ y[i]`
    fn point_wise_power_arrays(&self, x: &[T], y: &[T], result: &mut [T]) -> Result<()>;

    /// `x[i] = x[i] ^ y[i]`
    fn point_wise_power_arrays_in_place(&self, x: &mut [T], y: &[T]) -> Result<()>;

    // Matrix norms and products

    /// Minimum `work` length for [`LinearAlgebraProvider::matrix_norm_with_work`]
    fn matrix_norm_work_size(&self, norm: Norm, rows: usize) -> usize;

    /// Matrix norm of a `rows x cols` matrix
    fn matrix_norm(&self, norm: Norm, rows: usize, cols: usize, a: &[T]) -> Result<T>;

    /// Matrix norm with caller-provided scratch
    fn matrix_norm_with_work(
        &self,
        norm: Norm,
        rows: usize,
        cols: usize,
        a: &[T],
        work: &mut [T],
    ) -> Result<T>;

    /// `C = A * B`
    fn matrix_multiply(
        &self,
        a: &[T],
        rows_a: usize,
        cols_a: usize,
        b: &[T],
        rows_b: usize,
        cols_b: usize,
        c: &mut [T],
    ) -> Result<()>;

    /// `C = alpha * op(A) * op(B) + beta * C`
    fn matrix_multiply_with_update(
        &self,
        transpose_a: Transpose,
        transpose_b: Transpose,
        alpha: T,
        a: &[T],
        rows_a: usize,
        cols_a: usize,
        b: &[T],
        rows_b: usize,
        cols_b: usize,
        beta: T,
        c: &mut [T],
    ) -> Result<()>;

    /// Update form with an explicit recursion threshold and worker budget
    fn matrix_multiply_with_block(
        &self,
        transpose_a: Transpose,
        transpose_b: Transpose,
        alpha: T,
        a: &[T],
        rows_a: usize,
        cols_a: usize,
        b: &[T],
        rows_b: usize,
        cols_b: usize,
        beta: T,
        c: &mut [T],
        block: usize,
        parallelism: Parallelism,
    ) -> Result<()>;

    // LU

    /// Minimum `work` length for the LU inverse
    fn lu_inverse_work_size(&self, order: usize) -> usize;

    /// In-place LU factorization with partial pivoting
    fn lu_factor(&self, a: &mut [T], order: usize, pivot: &mut [usize]) -> Result<()>;

    /// Invert `a` in place
    fn lu_inverse(&self, a: &mut [T], order: usize) -> Result<()>;

    fn lu_inverse_with_work(&self, a: &mut [T], order: usize, work: &mut [T]) -> Result<()>;

    /// Inverse from an LU factorization
    fn lu_inverse_factored(&self, a: &mut [T], order: usize, pivot: &[usize]) -> Result<()>;

    fn lu_inverse_factored_with_work(
        &self,
        a: &mut [T],
        order: usize,
        pivot: &[usize],
        work: &mut [T],
    ) -> Result<()>;

    /// Solve `A * X = B` through a copy of `a`
    fn lu_solve(&self, columns_b: usize, a: &[T], order: usize, b: &mut [T]) -> Result<()>;

    /// Solve `A^T * X = B` through a copy of `a`
    fn lu_solve_transposed(
        &self,
        columns_b: usize,
        a: &[T],
        order: usize,
        b: &mut [T],
    ) -> Result<()>;

    /// Solve `A * X = B` from an LU factorization
    fn lu_solve_factored(
        &self,
        columns_b: usize,
        a: &[T],
        order: usize,
        pivot: &[usize],
        b: &mut [T],
    ) -> Result<()>;

    /// Solve `A^T * X = B` from an LU factorization
    fn lu_solve_factored_transposed(
        &self,
        columns_b: usize,
        a: &[T],
        order: usize,
        pivot: &[usize],
        b: &mut [T],
    ) -> Result<()>;

    /// Determinant from an LU factorization
    fn lu_determinant(&self, a: &[T], order: usize, pivot: &[usize]) -> Result<T>;

    // Cholesky

    /// In-place Cholesky factorization
    fn cholesky_factor(&self, a: &mut [T], order: usize) -> Result<()>;

    fn cholesky_solve(&self, a: &[T], order: usize, b: &mut [T], columns_b: usize) -> Result<()>;

    fn cholesky_solve_factored(
        &self,
        a: &[T],
        order: usize,
        b: &mut [T],
        columns_b: usize,
    ) -> Result<()>;

    // QR

    /// Minimum `work` length for the QR factorizations
    fn qr_factor_work_size(&self, rows: usize, cols: usize) -> usize;

    /// Build the Householder reflector for one column
    fn generate_column(
        &self,
        work: &mut [T],
        r: &mut [T],
        rows: usize,
        row: usize,
        column: usize,
    ) -> Result<()>;

    /// Apply a stored Householder reflector to a column range
    fn compute_qr(
        &self,
        work: &[T],
        work_index: usize,
        a: &mut [T],
        row_start: usize,
        row_count: usize,
        column_start: usize,
        column_end: usize,
        parallelism: Parallelism,
    ) -> Result<()>;

    /// Full QR factorization
    fn qr_factor(&self, r: &mut [T], rows: usize, cols: usize, q: &mut [T]) -> Result<()>;

    fn qr_factor_with_work(
        &self,
        r: &mut [T],
        rows: usize,
        cols: usize,
        q: &mut [T],
        work: &mut [T],
    ) -> Result<()>;

    /// Thin QR factorization
    fn thin_qr_factor(&self, a: &mut [T], rows: usize, cols: usize, r: &mut [T]) -> Result<()>;

    fn thin_qr_factor_with_work(
        &self,
        a: &mut [T],
        rows: usize,
        cols: usize,
        r: &mut [T],
        work: &mut [T],
    ) -> Result<()>;

    /// Minimum `work` length for the QR solve
    fn qr_solve_work_size(&self, rows: usize, cols: usize) -> usize;

    /// Least-squares solve through a copy of `a`
    fn qr_solve(
        &self,
        a: &[T],
        rows: usize,
        cols: usize,
        b: &[T],
        columns_b: usize,
        x: &mut [T],
        method: QrMethod,
    ) -> Result<()>;

    fn qr_solve_with_work(
        &self,
        a: &[T],
        rows: usize,
        cols: usize,
        b: &[T],
        columns_b: usize,
        x: &mut [T],
        work: &mut [T],
        method: QrMethod,
    ) -> Result<()>;

    /// Least-squares solve from a QR factorization
    fn qr_solve_factored(
        &self,
        q: &[T],
        r: &[T],
        rows: usize,
        cols: usize,
        b: &[T],
        columns_b: usize,
        x: &mut [T],
        method: QrMethod,
    ) -> Result<()>;

    // SVD

    /// Minimum `work` length for the SVD
    fn svd_work_size(&self, rows: usize, cols: usize, compute_vectors: bool) -> usize;

    /// Singular value decomposition
    fn singular_value_decomposition(
        &self,
        compute_vectors: bool,
        a: &mut [T],
        rows: usize,
        cols: usize,
        s: &mut [T],
        u: &mut [T],
        vt: &mut [T],
    ) -> Result<()>;

    fn singular_value_decomposition_with_work(
        &self,
        compute_vectors: bool,
        a: &mut [T],
        rows: usize,
        cols: usize,
        s: &mut [T],
        u: &mut [T],
        vt: &mut [T],
        work: &mut [T],
    ) -> Result<()>;

    /// Minimum-norm least-squares solve through a copy of `a`
    fn svd_solve(
        &self,
        a: &[T],
        rows: usize,
        cols: usize,
        b: &[T],
        columns_b: usize,
        x: &mut [T],
    ) -> Result<()>;

    /// Minimum-norm least-squares solve from an SVD
    fn svd_solve_factored(
        &self,
        rows: usize,
        cols: usize,
        s: &[T],
        u: &[T],
        vt: &[T],
        b: &[T],
        columns_b: usize,
        x: &mut [T],
    ) -> Result<()>;

    /// Numerical rank of a singular value spectrum
    fn svd_rank(&self, s: &[T], rows: usize, cols: usize, tolerance: Option<T>) -> usize;

    /// 2-norm condition number of a singular value spectrum
    fn svd_condition_number(&self, s: &[T]) -> T;
}

/// Provider backed by the pure-Rust kernel of this crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManagedProvider;

#[allow(clippy::too_many_arguments)]
impl<T: RealField> LinearAlgebraProvider<T> for ManagedProvider {
    fn add_vector_to_scaled_vector(
        &self,
        y: &[T],
        alpha: T,
        x: &[T],
        result: &mut [T],
    ) -> Result<()> {
        blas_helpers::add_vector_to_scaled_vector(y, alpha, x, result)
    }

    fn add_vector_to_scaled_vector_in_place(&self, y: &mut [T], alpha: T, x: &[T]) -> Result<()> {
        blas_helpers::add_vector_to_scaled_vector_in_place(y, alpha, x)
    }

    fn scale_array(&self, alpha: T, x: &[T], result: &mut [T]) -> Result<()> {
        blas_helpers::scale_array(alpha, x, result)
    }

    fn scale_array_in_place(&self, alpha: T, x: &mut [T]) -> Result<()> {
        blas_helpers::scale_array_in_place(alpha, x)
    }

    fn dot_product(&self, x: &[T], y: &[T]) -> Result<T> {
        blas_helpers::dot_product(x, y)
    }

    fn add_arrays(&self, x: &[T], y: &[T], result: &mut [T]) -> Result<()> {
        blas_helpers::add_arrays(x, y, result)
    }

    fn add_arrays_in_place(&self, x: &mut [T], y: &[T]) -> Result<()> {
        blas_helpers::add_arrays_in_place(x, y)
    }

    fn subtract_arrays(&self, x: &[T], y: &[T], result: &mut [T]) -> Result<()> {
        blas_helpers::subtract_arrays(x, y, result)
    }

    fn subtract_arrays_in_place(&self, x: &mut [T], y: &[T]) -> Result<()> {
        blas_helpers::subtract_arrays_in_place(x, y)
    }

    fn point_wise_multiply_arrays(&self, x: &[T], y: &[T], result: &mut [T]) -> Result<()> {
        blas_helpers::point_wise_multiply_arrays(x, y, result)
    }

    fn point_wise_multiply_arrays_in_place(&self, x: &mut [T], y: &[T]) -> Result<()> {
        blas_helpers::point_wise_multiply_arrays_in_place(x, y)
    }

    fn point_wise_divide_arrays(&self, x: &[T], y: &[T], result: &mut [T]) -> Result<()> {
        blas_helpers::point_wise_divide_arrays(x, y, result)
    }

    fn point_wise_divide_arrays_in_place(&self, x: &mut [T], y: &[T]) -> Result<()> {
        blas_helpers::point_wise_divide_arrays_in_place(x, y)
    }

    fn point_wise_power_arrays(&self, x: &[T], y: &[T], result: &mut [T]) -> Result<()> {
        blas_helpers::point_wise_power_arrays(x, y, result)
    }

    fn point_wise_power_arrays_in_place(&self, x: &mut [T], y: &[T]) -> Result<()> {
        blas_helpers::point_wise_power_arrays_in_place(x, y)
    }

    fn matrix_norm_work_size(&self, norm: Norm, rows: usize) -> usize {
        norm::matrix_norm_work_size(norm, rows)
    }

    fn matrix_norm(&self, norm: Norm, rows: usize, cols: usize, a: &[T]) -> Result<T> {
        norm::matrix_norm(norm, rows, cols, a)
    }

    fn matrix_norm_with_work(
        &self,
        norm: Norm,
        rows: usize,
        cols: usize,
        a: &[T],
        work: &mut [T],
    ) -> Result<T> {
        norm::matrix_norm_with_work(norm, rows, cols, a, work)
    }

    fn matrix_multiply(
        &self,
        a: &[T],
        rows_a: usize,
        cols_a: usize,
        b: &[T],
        rows_b: usize,
        cols_b: usize,
        c: &mut [T],
    ) -> Result<()> {
        gemm::matrix_multiply(a, rows_a, cols_a, b, rows_b, cols_b, c)
    }

    fn matrix_multiply_with_update(
        &self,
        transpose_a: Transpose,
        transpose_b: Transpose,
        alpha: T,
        a: &[T],
        rows_a: usize,
        cols_a: usize,
        b: &[T],
        rows_b: usize,
        cols_b: usize,
        beta: T,
        c: &mut [T],
    ) -> Result<()> {
        gemm::matrix_multiply_with_update(
            transpose_a,
            transpose_b,
            alpha,
            a,
            rows_a,
            cols_a,
            b,
            rows_b,
            cols_b,
            beta,
            c,
        )
    }

    fn matrix_multiply_with_block(
        &self,
        transpose_a: Transpose,
        transpose_b: Transpose,
        alpha: T,
        a: &[T],
        rows_a: usize,
        cols_a: usize,
        b: &[T],
        rows_b: usize,
        cols_b: usize,
        beta: T,
        c: &mut [T],
        block: usize,
        parallelism: Parallelism,
    ) -> Result<()> {
        gemm::matrix_multiply_with_block(
            transpose_a,
            transpose_b,
            alpha,
            a,
            rows_a,
            cols_a,
            b,
            rows_b,
            cols_b,
            beta,
            c,
            block,
            parallelism,
        )
    }

    fn lu_inverse_work_size(&self, order: usize) -> usize {
        direct::lu_inverse_work_size(order)
    }

    fn lu_factor(&self, a: &mut [T], order: usize, pivot: &mut [usize]) -> Result<()> {
        direct::lu_factor(a, order, pivot)
    }

    fn lu_inverse(&self, a: &mut [T], order: usize) -> Result<()> {
        direct::lu_inverse(a, order)
    }

    fn lu_inverse_with_work(&self, a: &mut [T], order: usize, work: &mut [T]) -> Result<()> {
        direct::lu_inverse_with_work(a, order, work)
    }

    fn lu_inverse_factored(&self, a: &mut [T], order: usize, pivot: &[usize]) -> Result<()> {
        direct::lu_inverse_factored(a, order, pivot)
    }

    fn lu_inverse_factored_with_work(
        &self,
        a: &mut [T],
        order: usize,
        pivot: &[usize],
        work: &mut [T],
    ) -> Result<()> {
        direct::lu_inverse_factored_with_work(a, order, pivot, work)
    }

    fn lu_solve(&self, columns_b: usize, a: &[T], order: usize, b: &mut [T]) -> Result<()> {
        direct::lu_solve(columns_b, a, order, b)
    }

    fn lu_solve_transposed(
        &self,
        columns_b: usize,
        a: &[T],
        order: usize,
        b: &mut [T],
    ) -> Result<()> {
        direct::lu_solve_transposed(columns_b, a, order, b)
    }

    fn lu_solve_factored(
        &self,
        columns_b: usize,
        a: &[T],
        order: usize,
        pivot: &[usize],
        b: &mut [T],
    ) -> Result<()> {
        direct::lu_solve_factored(columns_b, a, order, pivot, b)
    }

    fn lu_solve_factored_transposed(
        &self,
        columns_b: usize,
        a: &[T],
        order: usize,
        pivot: &[usize],
        b: &mut [T],
    ) -> Result<()> {
        direct::lu_solve_factored_transposed(columns_b, a, order, pivot, b)
    }

    fn lu_determinant(&self, a: &[T], order: usize, pivot: &[usize]) -> Result<T> {
        direct::lu_determinant(a, order, pivot)
    }

    fn cholesky_factor(&self, a: &mut [T], order: usize) -> Result<()> {
        direct::cholesky_factor(a, order)
    }

    fn cholesky_solve(&self, a: &[T], order: usize, b: &mut [T], columns_b: usize) -> Result<()> {
        direct::cholesky_solve(a, order, b, columns_b)
    }

    fn cholesky_solve_factored(
        &self,
        a: &[T],
        order: usize,
        b: &mut [T],
        columns_b: usize,
    ) -> Result<()> {
        direct::cholesky_solve_factored(a, order, b, columns_b)
    }

    fn qr_factor_work_size(&self, rows: usize, cols: usize) -> usize {
        direct::qr_factor_work_size(rows, cols)
    }

    fn generate_column(
        &self,
        work: &mut [T],
        r: &mut [T],
        rows: usize,
        row: usize,
        column: usize,
    ) -> Result<()> {
        direct::generate_column(work, r, rows, row, column)
    }

    fn compute_qr(
        &self,
        work: &[T],
        work_index: usize,
        a: &mut [T],
        row_start: usize,
        row_count: usize,
        column_start: usize,
        column_end: usize,
        parallelism: Parallelism,
    ) -> Result<()> {
        direct::compute_qr(
            work,
            work_index,
            a,
            row_start,
            row_count,
            column_start,
            column_end,
            parallelism,
        )
    }

    fn qr_factor(&self, r: &mut [T], rows: usize, cols: usize, q: &mut [T]) -> Result<()> {
        direct::qr_factor(r, rows, cols, q)
    }

    fn qr_factor_with_work(
        &self,
        r: &mut [T],
        rows: usize,
        cols: usize,
        q: &mut [T],
        work: &mut [T],
    ) -> Result<()> {
        direct::qr_factor_with_work(r, rows, cols, q, work)
    }

    fn thin_qr_factor(&self, a: &mut [T], rows: usize, cols: usize, r: &mut [T]) -> Result<()> {
        direct::thin_qr_factor(a, rows, cols, r)
    }

    fn thin_qr_factor_with_work(
        &self,
        a: &mut [T],
        rows: usize,
        cols: usize,
        r: &mut [T],
        work: &mut [T],
    ) -> Result<()> {
        direct::thin_qr_factor_with_work(a, rows, cols, r, work)
    }

    fn qr_solve_work_size(&self, rows: usize, cols: usize) -> usize {
        direct::qr_solve_work_size(rows, cols)
    }

    fn qr_solve(
        &self,
        a: &[T],
        rows: usize,
        cols: usize,
        b: &[T],
        columns_b: usize,
        x: &mut [T],
        method: QrMethod,
    ) -> Result<()> {
        direct::qr_solve(a, rows, cols, b, columns_b, x, method)
    }

    fn qr_solve_with_work(
        &self,
        a: &[T],
        rows: usize,
        cols: usize,
        b: &[T],
        columns_b: usize,
        x: &mut [T],
        work: &mut [T],
        method: QrMethod,
    ) -> Result<()> {
        direct::qr_solve_with_work(a, rows, cols, b, columns_b, x, work, method)
    }

    fn qr_solve_factored(
        &self,
        q: &[T],
        r: &[T],
        rows: usize,
        cols: usize,
        b: &[T],
        columns_b: usize,
        x: &mut [T],
        method: QrMethod,
    ) -> Result<()> {
        direct::qr_solve_factored(q, r, rows, cols, b, columns_b, x, method)
    }

    fn svd_work_size(&self, rows: usize, cols: usize, compute_vectors: bool) -> usize {
        direct::svd_work_size(rows, cols, compute_vectors)
    }

    fn singular_value_decomposition(
        &self,
        compute_vectors: bool,
        a: &mut [T],
        rows: usize,
        cols: usize,
        s: &mut [T],
        u: &mut [T],
        vt: &mut [T],
    ) -> Result<()> {
        direct::singular_value_decomposition(compute_vectors, a, rows, cols, s, u, vt)
    }

    fn singular_value_decomposition_with_work(
        &self,
        compute_vectors: bool,
        a: &mut [T],
        rows: usize,
        cols: usize,
        s: &mut [T],
        u: &mut [T],
        vt: &mut [T],
        work: &mut [T],
    ) -> Result<()> {
        direct::singular_value_decomposition_with_work(
            compute_vectors,
            a,
            rows,
            cols,
            s,
            u,
            vt,
            work,
        )
    }

    fn svd_solve(
        &self,
        a: &[T],
        rows: usize,
        cols: usize,
        b: &[T],
        columns_b: usize,
        x: &mut [T],
    ) -> Result<()> {
        direct::svd_solve(a, rows, cols, b, columns_b, x)
    }

    fn svd_solve_factored(
        &self,
        rows: usize,
        cols: usize,
        s: &[T],
        u: &[T],
        vt: &[T],
        b: &[T],
        columns_b: usize,
        x: &mut [T],
    ) -> Result<()> {
        direct::svd_solve_factored(rows, cols, s, u, vt, b, columns_b, x)
    }

    fn svd_rank(&self, s: &[T], rows: usize, cols: usize, tolerance: Option<T>) -> usize {
        direct::svd_rank(s, rows, cols, tolerance)
    }

    fn svd_condition_number(&self, s: &[T]) -> T {
        direct::svd_condition_number(s)
    }
}
