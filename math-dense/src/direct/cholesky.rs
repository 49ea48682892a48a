//! Cholesky factorization `A = L * L^T` for symmetric positive definite
//! matrices.
//!
//! Only the lower triangle of the input is read. After factoring, the buffer
//! holds `L` with an explicitly zeroed upper triangle.

use crate::checks::check_shape;
use crate::config::Control;
use crate::error::{KernelError, Result};
use crate::parallel::{self, Parallelism};
use crate::traits::RealField;

/// Factor `a` in place.
///
/// # Errors
///
/// [`KernelError::NotPositiveDefinite`] at the first column whose reduced
/// diagonal is not strictly positive. The buffer is then partially factored
/// and must be discarded.
pub fn cholesky_factor<T: RealField>(a: &mut [T], order: usize) -> Result<()> {
    check_shape("a", a.len(), order, order)?;
    if order == 0 {
        return Ok(());
    }

    log::debug!("Cholesky factorization of order {order}");

    let control = Control::global();
    let parallelism = control.parallelism();
    let mut multipliers = vec![T::zero(); order];

    for ij in 0..order {
        let col_start = ij * order;
        let diagonal = a[col_start + ij];
        if !(diagonal > T::zero()) {
            log::warn!("Cholesky breakdown at column {ij}: pivot {diagonal:?}");
            return Err(KernelError::NotPositiveDefinite { column: ij });
        }

        let diagonal = diagonal.sqrt();
        a[col_start + ij] = diagonal;
        multipliers[ij] = diagonal;
        for i in (ij + 1)..order {
            a[col_start + i] /= diagonal;
            multipliers[i] = a[col_start + i];
        }

        let trailing = &mut a[col_start + order..];
        cholesky_step(
            trailing,
            order,
            ij + 1,
            &multipliers,
            control.cholesky_split_columns,
            parallelism,
        );

        for i in (ij + 1)..order {
            a[i * order + ij] = T::zero();
        }
    }

    Ok(())
}

/// Outer-product update of the trailing columns, starting at `first_column`.
fn cholesky_step<T: RealField>(
    columns: &mut [T],
    order: usize,
    first_column: usize,
    multipliers: &[T],
    split_columns: usize,
    parallelism: Parallelism,
) {
    let column_count = columns.len() / order;

    if parallelism.is_parallel() && column_count > split_columns.max(1) {
        let half = column_count / 2;
        let (left, right) = columns.split_at_mut(half * order);
        parallel::join(
            |p| cholesky_step(left, order, first_column, multipliers, split_columns, p),
            |p| cholesky_step(right, order, first_column + half, multipliers, split_columns, p),
            parallelism,
        );
        return;
    }

    for (offset, column) in columns.chunks_exact_mut(order).enumerate() {
        let j = first_column + offset;
        let factor = multipliers[j];
        for i in j..order {
            column[i] -= multipliers[i] * factor;
        }
    }
}

/// Solve `A * X = B` from a factor produced by [`cholesky_factor`].
pub fn cholesky_solve_factored<T: RealField>(
    a: &[T],
    order: usize,
    b: &mut [T],
    columns_b: usize,
) -> Result<()> {
    check_shape("a", a.len(), order, order)?;
    check_shape("b", b.len(), order, columns_b)?;

    let size = order.saturating_mul(order).saturating_mul(columns_b);
    let parallel = columns_b > 1 && Control::global().worth_parallelizing(size);
    parallel::for_each_column_mut(b, order, parallel, |_, x| {
        // L y = b
        for k in 0..order {
            let l_col = &a[k * order..(k + 1) * order];
            x[k] /= l_col[k];
            let xk = x[k];
            for i in (k + 1)..order {
                x[i] -= xk * l_col[i];
            }
        }
        // L^T x = y
        for k in (0..order).rev() {
            let l_col = &a[k * order..(k + 1) * order];
            let mut sum = x[k];
            for i in (k + 1)..order {
                sum -= l_col[i] * x[i];
            }
            x[k] = sum / l_col[k];
        }
    });
    Ok(())
}

/// Factor a copy of `a` and solve `A * X = B`; `a` is left untouched.
pub fn cholesky_solve<T: RealField>(
    a: &[T],
    order: usize,
    b: &mut [T],
    columns_b: usize,
) -> Result<()> {
    check_shape("a", a.len(), order, order)?;
    check_shape("b", b.len(), order, columns_b)?;

    let mut factor = a.to_vec();
    cholesky_factor(&mut factor, order)?;
    cholesky_solve_factored(&factor, order, b, columns_b)
}
