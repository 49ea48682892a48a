//! Matrix multiplication
//!
//! `C = alpha * op(A) * op(B) + beta * C` on column-major buffers, computed by
//! a cache-oblivious recursion that halves the problem along `m`, `n` and `k`
//! until it is small enough for a direct loop. Only the outermost level runs
//! in parallel: its first `k` half is four independent quadrant products,
//! then the second `k` half is another four. Every nested level is
//! sequential within its task.
//!
//! Operands are borrowed as `ndarray` views in Fortran order; `op(X)` is the
//! view with reversed axes, so transposition never copies.

use crate::checks::check_shape;
use crate::config::Control;
use crate::error::{KernelError, Result};
use crate::parallel::{self, Parallelism};
use crate::traits::RealField;
use crate::types::Transpose;
use ndarray::{ArrayView2, ArrayViewMut2, Axis, ShapeBuilder, Zip};

/// `C = A * B` for column-major `A` (`rows_a x cols_a`) and `B`
/// (`rows_b x cols_b`).
pub fn matrix_multiply<T: RealField>(
    a: &[T],
    rows_a: usize,
    cols_a: usize,
    b: &[T],
    rows_b: usize,
    cols_b: usize,
    c: &mut [T],
) -> Result<()> {
    matrix_multiply_with_update(
        Transpose::DontTranspose,
        Transpose::DontTranspose,
        T::one(),
        a,
        rows_a,
        cols_a,
        b,
        rows_b,
        cols_b,
        T::zero(),
        c,
    )
}

/// `C = alpha * op(A) * op(B) + beta * C`
///
/// `rows_*`/`cols_*` describe the operands as stored. `C` must hold
/// `op(A).rows * op(B).cols` elements.
///
/// # Errors
///
/// [`KernelError::DimensionMismatch`] when the inner dimensions of `op(A)` and
/// `op(B)` differ, [`KernelError::ArrayLength`] when a buffer does not match
/// its shape. Nothing is written on error.
#[allow(clippy::too_many_arguments)]
pub fn matrix_multiply_with_update<T: RealField>(
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
    let control = Control::global();
    matrix_multiply_with_block(
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
        control.parallelize_order,
        control.parallelism(),
    )
}

/// [`matrix_multiply_with_update`] with an explicit recursion threshold and
/// worker budget.
///
/// The recursion stops once `m + n <= block`; the product does not depend on
/// either argument beyond floating-point summation order.
#[allow(clippy::too_many_arguments)]
pub fn matrix_multiply_with_block<T: RealField>(
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
    check_shape("a", a.len(), rows_a, cols_a)?;
    check_shape("b", b.len(), rows_b, cols_b)?;
    let (m, n, k) = product_shape(transpose_a, transpose_b, rows_a, cols_a, rows_b, cols_b)?;
    check_shape("c", c.len(), m, n)?;

    if alpha.is_zero() && beta.is_zero() {
        c.fill(T::zero());
        return Ok(());
    }

    if alpha.is_zero() || m == 0 || n == 0 || k == 0 {
        scale_output(c, beta);
        return Ok(());
    }

    let a = operand("a", a, rows_a, cols_a, transpose_a)?;
    let b = operand("b", b, rows_b, cols_b, transpose_b)?;
    let c_len = c.len();
    let mut c = ArrayViewMut2::from_shape((m, n).f(), c).map_err(|_| KernelError::ArrayLength {
        name: "c",
        expected: m * n,
        got: c_len,
    })?;

    if beta.is_zero() {
        c.fill(T::zero());
    } else if beta != T::one() {
        c.mapv_inplace(|value| value * beta);
    }

    multiply_outermost(alpha, a, b, c, block, parallelism);
    Ok(())
}

/// `(m, n, k)` of `op(A) * op(B)`.
fn product_shape(
    transpose_a: Transpose,
    transpose_b: Transpose,
    rows_a: usize,
    cols_a: usize,
    rows_b: usize,
    cols_b: usize,
) -> Result<(usize, usize, usize)> {
    let (m, ka) = transpose_a.apply(rows_a, cols_a);
    let (kb, n) = transpose_b.apply(rows_b, cols_b);
    if ka != kb {
        return Err(KernelError::DimensionMismatch {
            operation: "matrix multiply",
            left: (m, ka),
            right: (kb, n),
        });
    }
    Ok((m, n, ka))
}

/// `C *= beta`, clearing instead of multiplying when `beta == 0`.
fn scale_output<T: RealField>(c: &mut [T], beta: T) {
    if beta.is_zero() {
        c.fill(T::zero());
    } else if beta != T::one() {
        for value in c.iter_mut() {
            *value *= beta;
        }
    }
}

/// Column-major view of a validated operand, transposed when requested.
fn operand<'a, T>(
    name: &'static str,
    data: &'a [T],
    rows: usize,
    cols: usize,
    transpose: Transpose,
) -> Result<ArrayView2<'a, T>> {
    let view = ArrayView2::from_shape((rows, cols).f(), data).map_err(|_| {
        KernelError::ArrayLength {
            name,
            expected: rows.saturating_mul(cols),
            got: data.len(),
        }
    })?;
    Ok(if transpose.is_transposed() { view.reversed_axes() } else { view })
}

#[inline]
fn is_base_case(m: usize, n: usize, k: usize, block: usize) -> bool {
    m.saturating_add(n) <= block || m == 1 || n == 1 || k == 1
}

/// Split a view into its `[11, 12, 21, 22]` blocks at (`row`, `col`).
fn quarter<T>(x: ArrayView2<'_, T>, row: usize, col: usize) -> [ArrayView2<'_, T>; 4] {
    let (top, bottom) = x.split_at(Axis(0), row);
    let (x11, x12) = top.split_at(Axis(1), col);
    let (x21, x22) = bottom.split_at(Axis(1), col);
    [x11, x12, x21, x22]
}

fn quarter_mut<T>(x: ArrayViewMut2<'_, T>, row: usize, col: usize) -> [ArrayViewMut2<'_, T>; 4] {
    let (top, bottom) = x.split_at(Axis(0), row);
    let (x11, x12) = top.split_at(Axis(1), col);
    let (x21, x22) = bottom.split_at(Axis(1), col);
    [x11, x12, x21, x22]
}

fn multiply_outermost<T: RealField>(
    alpha: T,
    a: ArrayView2<'_, T>,
    b: ArrayView2<'_, T>,
    c: ArrayViewMut2<'_, T>,
    block: usize,
    parallelism: Parallelism,
) {
    let (m, n, k) = (c.nrows(), c.ncols(), a.ncols());
    if !parallelism.is_parallel() || is_base_case(m, n, k, block) {
        multiply_recursive(alpha, a, b, c, block);
        return;
    }

    let [a11, a12, a21, a22] = quarter(a, m / 2, k / 2);
    let [b11, b12, b21, b22] = quarter(b, k / 2, n / 2);
    let [mut c11, mut c12, mut c21, mut c22] = quarter_mut(c, m / 2, n / 2);

    // the two k halves accumulate into the same quadrants
    parallel::invoke4(
        || multiply_recursive(alpha, a11, b11, c11.view_mut(), block),
        || multiply_recursive(alpha, a11, b12, c12.view_mut(), block),
        || multiply_recursive(alpha, a21, b11, c21.view_mut(), block),
        || multiply_recursive(alpha, a21, b12, c22.view_mut(), block),
        parallelism,
    );
    parallel::invoke4(
        || multiply_recursive(alpha, a12, b21, c11, block),
        || multiply_recursive(alpha, a12, b22, c12, block),
        || multiply_recursive(alpha, a22, b21, c21, block),
        || multiply_recursive(alpha, a22, b22, c22, block),
        parallelism,
    );
}

fn multiply_recursive<T: RealField>(
    alpha: T,
    a: ArrayView2<'_, T>,
    b: ArrayView2<'_, T>,
    c: ArrayViewMut2<'_, T>,
    block: usize,
) {
    let (m, n, k) = (c.nrows(), c.ncols(), a.ncols());
    if is_base_case(m, n, k, block) {
        multiply_direct(alpha, a, b, c);
        return;
    }

    let [a11, a12, a21, a22] = quarter(a, m / 2, k / 2);
    let [b11, b12, b21, b22] = quarter(b, k / 2, n / 2);
    let [mut c11, mut c12, mut c21, mut c22] = quarter_mut(c, m / 2, n / 2);

    multiply_recursive(alpha, a11, b11, c11.view_mut(), block);
    multiply_recursive(alpha, a12, b21, c11, block);
    multiply_recursive(alpha, a11, b12, c12.view_mut(), block);
    multiply_recursive(alpha, a12, b22, c12, block);
    multiply_recursive(alpha, a21, b11, c21.view_mut(), block);
    multiply_recursive(alpha, a22, b21, c21, block);
    multiply_recursive(alpha, a21, b12, c22.view_mut(), block);
    multiply_recursive(alpha, a22, b22, c22, block);
}

/// `C += alpha * A * B` by columns of `C`.
fn multiply_direct<T: RealField>(
    alpha: T,
    a: ArrayView2<'_, T>,
    b: ArrayView2<'_, T>,
    mut c: ArrayViewMut2<'_, T>,
) {
    for (mut c_col, b_col) in c.columns_mut().into_iter().zip(b.columns()) {
        for (a_col, &b_pj) in a.columns().into_iter().zip(b_col.iter()) {
            let scale = alpha * b_pj;
            Zip::from(&mut c_col)
                .and(&a_col)
                .for_each(|ci, &a_ip| *ci += a_ip * scale);
        }
    }
}
