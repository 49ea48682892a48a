//! Householder QR factorization
//!
//! Reflectors `H = I - u * u^T` with `u^T * u = 2` are stored in the work
//! buffer, one per eliminated column at offset `column * rows`. Q is
//! assembled afterwards by applying the reflectors in reverse order to
//! (a slice of) the identity.
//!
//! Both factorizations leave R with a non-negative diagonal.

use crate::blas_helpers::{dot, vector_norm};
use crate::checks::{
    check_index, check_shape, check_work, checked_size, ensure_distinct, report_work_size,
};
use crate::config::Control;
use crate::error::{KernelError, Result};
use crate::parallel::{self, Parallelism};
use crate::traits::RealField;
use crate::types::QrMethod;
use std::ops::Range;

/// Minimum `work` length for [`qr_factor_with_work`] and
/// [`thin_qr_factor_with_work`].
pub fn qr_factor_work_size(rows: usize, cols: usize) -> usize {
    rows.saturating_mul(rows.min(cols))
}

/// Minimum `work` length for [`qr_solve_with_work`].
pub fn qr_solve_work_size(rows: usize, cols: usize) -> usize {
    rows.saturating_mul(cols)
}

/// Build the reflector that annihilates `r[row + 1.., column]`.
///
/// The sub-column moves into `work[column * rows..]` and is replaced by
/// `R[row, column]` and zeros. A zero or single-element sub-column gets the
/// reflector `sqrt(2) * e_1`, which just flips the sign of that entry.
///
/// # Errors
///
/// [`KernelError::IndexOutOfRange`] when `row` or `column` does not address
/// `r`, [`KernelError::WorkArrayTooSmall`] when `work` cannot hold the
/// reflector. `work[0]` is not written, since it may hold an earlier
/// reflector.
pub fn generate_column<T: RealField>(
    work: &mut [T],
    r: &mut [T],
    rows: usize,
    row: usize,
    column: usize,
) -> Result<()> {
    check_index("row", row, rows)?;
    check_index("column", column, r.len() / rows)?;
    let base = column * rows;
    let required = base + rows - row;
    if work.len() < required {
        return Err(KernelError::WorkArrayTooSmall {
            required,
            got: work.len(),
        });
    }

    let u = &mut work[base..required];
    let x = &mut r[base + row..base + rows];

    u.copy_from_slice(x);
    x.fill(T::zero());

    let norm = vector_norm(u);
    if row == rows - 1 || norm.is_zero() {
        x[0] = -u[0];
        u[0] = T::SQRT_2();
        return Ok(());
    }

    let mut scale = T::one() / norm;
    if u[0] < T::zero() {
        scale = -scale;
    }
    x[0] = -T::one() / scale;

    for value in u.iter_mut() {
        *value *= scale;
    }
    u[0] += T::one();

    let s = (T::one() / u[0]).sqrt();
    for value in u.iter_mut() {
        *value *= s;
    }
    Ok(())
}

/// Apply reflector `work_index` to columns `column_start..column_end` of the
/// column-major `a` with `row_count` rows, touching rows `row_start..`.
///
/// An empty column or row range is a no-op.
///
/// # Errors
///
/// [`KernelError::IndexOutOfRange`] when `column_end` lies beyond `a`,
/// [`KernelError::WorkArrayTooSmall`] when `work` does not hold reflector
/// `work_index`.
#[allow(clippy::too_many_arguments)]
pub fn compute_qr<T: RealField>(
    work: &[T],
    work_index: usize,
    a: &mut [T],
    row_start: usize,
    row_count: usize,
    column_start: usize,
    column_end: usize,
    parallelism: Parallelism,
) -> Result<()> {
    if column_start >= column_end || row_start >= row_count {
        return Ok(());
    }
    check_index("column_end", column_end, a.len() / row_count + 1)?;
    let required = work_index
        .checked_mul(row_count)
        .and_then(|base| base.checked_add(row_count - row_start))
        .unwrap_or(usize::MAX);
    if work.len() < required {
        return Err(KernelError::WorkArrayTooSmall {
            required,
            got: work.len(),
        });
    }

    let split = Control::global().qr_split_columns;
    reflect(
        work,
        work_index,
        a,
        row_count,
        row_start,
        column_start..column_end,
        split,
        parallelism,
    );
    Ok(())
}

/// Unchecked [`compute_qr`] with the split width already resolved.
#[allow(clippy::too_many_arguments)]
fn reflect<T: RealField>(
    work: &[T],
    index: usize,
    a: &mut [T],
    rows: usize,
    row_start: usize,
    columns: Range<usize>,
    split_columns: usize,
    parallelism: Parallelism,
) {
    if columns.is_empty() || row_start >= rows {
        return;
    }
    let base = index * rows;
    let u = &work[base..base + rows - row_start];
    let columns = &mut a[columns.start * rows..columns.end * rows];
    apply_reflector(u, columns, rows, row_start, split_columns, parallelism);
}

fn apply_reflector<T: RealField>(
    u: &[T],
    columns: &mut [T],
    rows: usize,
    row_start: usize,
    split_columns: usize,
    parallelism: Parallelism,
) {
    let column_count = columns.len() / rows;

    if parallelism.is_parallel() && column_count > split_columns.max(1) {
        let half = column_count / 2;
        let (left, right) = columns.split_at_mut(half * rows);
        parallel::join(
            |p| apply_reflector(u, left, rows, row_start, split_columns, p),
            |p| apply_reflector(u, right, rows, row_start, split_columns, p),
            parallelism,
        );
        return;
    }

    for column in columns.chunks_exact_mut(rows) {
        let tail = &mut column[row_start..];
        let scale = dot(u, tail);
        for (value, &ui) in tail.iter_mut().zip(u) {
            *value -= ui * scale;
        }
    }
}

/// Flip row `i` of R and column `i` of Q wherever `R[i, i] < 0`.
fn normalize_signs<T: RealField>(
    r: &mut [T],
    r_rows: usize,
    r_cols: usize,
    q: &mut [T],
    q_rows: usize,
    count: usize,
) {
    for i in 0..count {
        if r[i * r_rows + i] < T::zero() {
            for j in i..r_cols {
                r[j * r_rows + i] = -r[j * r_rows + i];
            }
            for value in &mut q[i * q_rows..(i + 1) * q_rows] {
                *value = -*value;
            }
        }
    }
}

/// Full QR factorization.
///
/// `r` (`rows x cols`) is overwritten with R and `q` (`rows x rows`) with Q.
pub fn qr_factor<T: RealField>(r: &mut [T], rows: usize, cols: usize, q: &mut [T]) -> Result<()> {
    check_shape("r", r.len(), rows, cols)?;
    check_shape("q", q.len(), rows, rows)?;
    let mut work = vec![T::zero(); qr_factor_work_size(rows, cols)];
    qr_factor_with_work(r, rows, cols, q, &mut work)
}

/// [`qr_factor`] with caller-provided reflector storage.
pub fn qr_factor_with_work<T: RealField>(
    r: &mut [T],
    rows: usize,
    cols: usize,
    q: &mut [T],
    work: &mut [T],
) -> Result<()> {
    check_shape("r", r.len(), rows, cols)?;
    check_shape("q", q.len(), rows, rows)?;
    let required = qr_factor_work_size(rows, cols);
    check_work(work, required)?;

    log::debug!("QR factorization of {rows}x{cols}");

    let control = Control::global();
    let (split, parallelism) = (control.qr_split_columns, control.parallelism());
    let min_mn = rows.min(cols);

    q.fill(T::zero());
    for i in 0..rows {
        q[i * rows + i] = T::one();
    }

    for i in 0..min_mn {
        generate_column(work, r, rows, i, i)?;
        reflect(work, i, r, rows, i, i + 1..cols, split, parallelism);
    }

    for i in (0..min_mn).rev() {
        reflect(work, i, q, rows, i, i..rows, split, parallelism);
    }

    normalize_signs(r, rows, cols, q, rows, min_mn);
    report_work_size(work, required);
    Ok(())
}

/// Thin QR factorization for `rows >= cols`.
///
/// `a` (`rows x cols`) is overwritten with the thin Q and `r` (`cols x cols`)
/// with R.
pub fn thin_qr_factor<T: RealField>(
    a: &mut [T],
    rows: usize,
    cols: usize,
    r: &mut [T],
) -> Result<()> {
    if rows < cols {
        return Err(KernelError::RowsLessThanColumns { rows, cols });
    }
    check_shape("a", a.len(), rows, cols)?;
    check_shape("r", r.len(), cols, cols)?;
    let mut work = vec![T::zero(); qr_factor_work_size(rows, cols)];
    thin_qr_factor_with_work(a, rows, cols, r, &mut work)
}

/// [`thin_qr_factor`] with caller-provided reflector storage.
pub fn thin_qr_factor_with_work<T: RealField>(
    a: &mut [T],
    rows: usize,
    cols: usize,
    r: &mut [T],
    work: &mut [T],
) -> Result<()> {
    if rows < cols {
        return Err(KernelError::RowsLessThanColumns { rows, cols });
    }
    check_shape("a", a.len(), rows, cols)?;
    check_shape("r", r.len(), cols, cols)?;
    let required = qr_factor_work_size(rows, cols);
    check_work(work, required)?;

    log::debug!("thin QR factorization of {rows}x{cols}");

    let control = Control::global();
    let (split, parallelism) = (control.qr_split_columns, control.parallelism());

    for i in 0..cols {
        generate_column(work, a, rows, i, i)?;
        reflect(work, i, a, rows, i, i + 1..cols, split, parallelism);
    }

    for j in 0..cols {
        r[j * cols..(j + 1) * cols].copy_from_slice(&a[j * rows..j * rows + cols]);
    }

    a.fill(T::zero());
    for i in 0..cols {
        a[i * rows + i] = T::one();
    }

    for i in (0..cols).rev() {
        reflect(work, i, a, rows, i, i..cols, split, parallelism);
    }

    normalize_signs(r, cols, cols, a, rows, cols);
    report_work_size(work, required);
    Ok(())
}

/// Least-squares solve from a QR factorization.
///
/// With [`QrMethod::Full`], `q` is `rows x rows` and `r` is `rows x cols`;
/// with [`QrMethod::Thin`], `q` is `rows x cols` and `r` is `cols x cols`.
/// `x` receives the `cols x columns_b` solution.
#[allow(clippy::too_many_arguments)]
pub fn qr_solve_factored<T: RealField>(
    q: &[T],
    r: &[T],
    rows: usize,
    cols: usize,
    b: &[T],
    columns_b: usize,
    x: &mut [T],
    method: QrMethod,
) -> Result<()> {
    if rows < cols {
        return Err(KernelError::RowsLessThanColumns { rows, cols });
    }
    let r_rows = match method {
        QrMethod::Full => {
            check_shape("q", q.len(), rows, rows)?;
            check_shape("r", r.len(), rows, cols)?;
            rows
        }
        QrMethod::Thin => {
            check_shape("q", q.len(), rows, cols)?;
            check_shape("r", r.len(), cols, cols)?;
            cols
        }
    };
    check_shape("b", b.len(), rows, columns_b)?;
    check_shape("x", x.len(), cols, columns_b)?;
    ensure_distinct("q", q, "b", b)?;
    ensure_distinct("r", r, "b", b)?;

    let size = rows.saturating_mul(cols).saturating_mul(columns_b);
    let parallel = columns_b > 1 && Control::global().worth_parallelizing(size);
    parallel::for_each_column_mut(x, cols, parallel, |column, xk| {
        let bk = &b[column * rows..(column + 1) * rows];

        // first `cols` entries of Q^T b
        for (i, value) in xk.iter_mut().enumerate() {
            *value = dot(&q[i * rows..(i + 1) * rows], bk);
        }

        // R x = Q^T b
        for k in (0..cols).rev() {
            let r_col = &r[k * r_rows..k * r_rows + cols];
            xk[k] /= r_col[k];
            let xkk = xk[k];
            for i in 0..k {
                xk[i] -= xkk * r_col[i];
            }
        }
    });
    Ok(())
}

/// Factor a copy of `a` and solve in the least-squares sense.
#[allow(clippy::too_many_arguments)]
pub fn qr_solve<T: RealField>(
    a: &[T],
    rows: usize,
    cols: usize,
    b: &[T],
    columns_b: usize,
    x: &mut [T],
    method: QrMethod,
) -> Result<()> {
    if rows < cols {
        return Err(KernelError::RowsLessThanColumns { rows, cols });
    }
    check_shape("a", a.len(), rows, cols)?;
    check_shape("b", b.len(), rows, columns_b)?;
    check_shape("x", x.len(), cols, columns_b)?;
    let mut work = vec![T::zero(); qr_solve_work_size(rows, cols)];
    qr_solve_with_work(a, rows, cols, b, columns_b, x, &mut work, method)
}

/// [`qr_solve`] with caller-provided reflector storage.
#[allow(clippy::too_many_arguments)]
pub fn qr_solve_with_work<T: RealField>(
    a: &[T],
    rows: usize,
    cols: usize,
    b: &[T],
    columns_b: usize,
    x: &mut [T],
    work: &mut [T],
    method: QrMethod,
) -> Result<()> {
    if rows < cols {
        return Err(KernelError::RowsLessThanColumns { rows, cols });
    }
    check_shape("a", a.len(), rows, cols)?;
    check_shape("b", b.len(), rows, columns_b)?;
    check_shape("x", x.len(), cols, columns_b)?;
    check_work(work, qr_solve_work_size(rows, cols))?;

    match method {
        QrMethod::Full => {
            let mut r = a.to_vec();
            let mut q = vec![T::zero(); checked_size("q", rows, rows)?];
            qr_factor_with_work(&mut r, rows, cols, &mut q, work)?;
            qr_solve_factored(&q, &r, rows, cols, b, columns_b, x, method)
        }
        QrMethod::Thin => {
            let mut q = a.to_vec();
            let mut r = vec![T::zero(); cols * cols];
            thin_qr_factor_with_work(&mut q, rows, cols, &mut r, work)?;
            qr_solve_factored(&q, &r, rows, cols, b, columns_b, x, method)
        }
    }
}
