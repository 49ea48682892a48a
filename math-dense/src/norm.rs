//! Matrix norms

use crate::checks::{check_shape, check_work, checked_size, report_work_size};
use crate::error::Result;
use crate::gemm::matrix_multiply_with_update;
use crate::traits::RealField;
use crate::types::{Norm, Transpose};

/// Minimum `work` length for [`matrix_norm_with_work`].
pub fn matrix_norm_work_size(norm: Norm, rows: usize) -> usize {
    match norm {
        Norm::InfinityNorm => rows,
        _ => 0,
    }
}

/// Norm of a column-major `rows x cols` matrix.
pub fn matrix_norm<T: RealField>(norm: Norm, rows: usize, cols: usize, a: &[T]) -> Result<T> {
    check_shape("a", a.len(), rows, cols)?;
    if a.is_empty() {
        return Ok(T::zero());
    }
    let mut work = vec![T::zero(); matrix_norm_work_size(norm, rows)];
    matrix_norm_with_work(norm, rows, cols, a, &mut work)
}

/// [`matrix_norm`] with caller-provided scratch for the row sums of the
/// infinity norm.
pub fn matrix_norm_with_work<T: RealField>(
    norm: Norm,
    rows: usize,
    cols: usize,
    a: &[T],
    work: &mut [T],
) -> Result<T> {
    check_shape("a", a.len(), rows, cols)?;
    let required = matrix_norm_work_size(norm, rows);
    check_work(work, required)?;

    if rows == 0 || cols == 0 {
        return Ok(T::zero());
    }

    let value = match norm {
        Norm::OneNorm => a
            .chunks_exact(rows)
            .map(|column| column.iter().map(|v| v.abs()).sum::<T>())
            .fold(T::zero(), nan_max),
        Norm::InfinityNorm => {
            let row_sums = &mut work[..rows];
            row_sums.fill(T::zero());
            for column in a.chunks_exact(rows) {
                for (sum, v) in row_sums.iter_mut().zip(column) {
                    *sum += v.abs();
                }
            }
            let value = row_sums.iter().copied().fold(T::zero(), nan_max);
            report_work_size(work, required);
            value
        }
        Norm::FrobeniusNorm => {
            let mut aat = vec![T::zero(); checked_size("aat", rows, rows)?];
            matrix_multiply_with_update(
                Transpose::DontTranspose,
                Transpose::Transpose,
                T::one(),
                a,
                rows,
                cols,
                a,
                rows,
                cols,
                T::zero(),
                &mut aat,
            )?;
            (0..rows).map(|i| aat[i * rows + i]).sum::<T>().sqrt()
        }
        Norm::LargestAbsoluteValue => a.iter().map(|v| v.abs()).fold(T::zero(), nan_max),
    };
    Ok(value)
}

/// `max` that keeps a NaN operand instead of discarding it.
#[inline]
fn nan_max<T: RealField>(a: T, b: T) -> T {
    if a.is_nan() || b.is_nan() { T::nan() } else { a.max(b) }
}
