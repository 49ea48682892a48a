//! Singular value decomposition `A = U * diag(s) * V^T`
//!
//! Golub-Kahan bidiagonalization by alternating column and row Householder
//! transforms, followed by implicitly shifted QR sweeps on the bidiagonal
//! until every super-diagonal entry is negligible. Singular values come out
//! non-negative and in descending order.
//!
//! Work layout (`rows + cols + min(rows + 1, cols)`, plus `cols * cols` for
//! vectors): row scratch, super-diagonal `e`, diagonal `s`, then V.

use crate::blas_helpers::{axpy, dot, vector_norm};
use crate::checks::{
    check_length, check_shape, check_work, checked_size, ensure_distinct, report_work_size,
};
use crate::config::Control;
use crate::error::{KernelError, Result};
use crate::parallel;
use crate::traits::RealField;

/// Minimum `work` length for [`singular_value_decomposition_with_work`].
pub fn svd_work_size(rows: usize, cols: usize, compute_vectors: bool) -> usize {
    let vectors = if compute_vectors { cols.saturating_mul(cols) } else { 0 };
    rows.saturating_add(cols)
        .saturating_add(rows.saturating_add(1).min(cols))
        .saturating_add(vectors)
}

/// Decompose `a` (`rows x cols`, destroyed).
///
/// `s` receives the `min(rows, cols)` singular values. When
/// `compute_vectors` is set, `u` (`rows x rows`) and `vt` (`cols x cols`) are
/// overwritten with the singular vectors; otherwise they are left untouched.
#[allow(clippy::too_many_arguments)]
pub fn singular_value_decomposition<T: RealField>(
    compute_vectors: bool,
    a: &mut [T],
    rows: usize,
    cols: usize,
    s: &mut [T],
    u: &mut [T],
    vt: &mut [T],
) -> Result<()> {
    check_shape("a", a.len(), rows, cols)?;
    check_length("s", s.len(), rows.min(cols))?;
    check_shape("u", u.len(), rows, rows)?;
    check_shape("vt", vt.len(), cols, cols)?;
    let mut work = vec![T::zero(); svd_work_size(rows, cols, compute_vectors)];
    singular_value_decomposition_with_work(compute_vectors, a, rows, cols, s, u, vt, &mut work)
}

/// [`singular_value_decomposition`] with caller-provided scratch.
#[allow(clippy::too_many_arguments)]
pub fn singular_value_decomposition_with_work<T: RealField>(
    compute_vectors: bool,
    a: &mut [T],
    rows: usize,
    cols: usize,
    s: &mut [T],
    u: &mut [T],
    vt: &mut [T],
    work: &mut [T],
) -> Result<()> {
    check_shape("a", a.len(), rows, cols)?;
    check_length("s", s.len(), rows.min(cols))?;
    check_shape("u", u.len(), rows, rows)?;
    check_shape("vt", vt.len(), cols, cols)?;
    let required = svd_work_size(rows, cols, compute_vectors);
    check_work(work, required)?;

    log::debug!("SVD of {rows}x{cols} (vectors: {compute_vectors})");

    if rows == 0 || cols == 0 {
        if compute_vectors {
            set_identity(u, rows);
            set_identity(vt, cols);
        }
        report_work_size(work, required);
        return Ok(());
    }

    let (row_work, rest) = work[..required].split_at_mut(rows);
    let (e, rest) = rest.split_at_mut(cols);
    let (diagonal, v) = rest.split_at_mut((rows + 1).min(cols));
    row_work.fill(T::zero());
    e.fill(T::zero());
    diagonal.fill(T::zero());
    v.fill(T::zero());

    let mut bidiagonal = Bidiagonal {
        rows,
        cols,
        s: diagonal,
        e,
        u,
        v,
        vectors: compute_vectors,
    };

    bidiagonal.reduce(a, row_work);
    bidiagonal.iterate(Control::global().svd_max_iterations)?;

    if compute_vectors {
        for i in 0..cols {
            for j in 0..cols {
                vt[j * cols + i] = bidiagonal.v[i * cols + j];
            }
        }
    }
    let count = s.len();
    s.copy_from_slice(&bidiagonal.s[..count]);

    report_work_size(work, required);
    Ok(())
}

/// Bidiagonal form under iteration, with its accumulated transforms.
struct Bidiagonal<'a, T> {
    rows: usize,
    cols: usize,
    /// Diagonal, `min(rows + 1, cols)` entries
    s: &'a mut [T],
    /// Super-diagonal, `cols` entries
    e: &'a mut [T],
    /// Left vectors, `rows x rows`
    u: &'a mut [T],
    /// Right vectors, `cols x cols`
    v: &'a mut [T],
    vectors: bool,
}

enum Step {
    /// `s[m - 1]` is negligible: chase `e[m - 2]` out through V
    Deflate,
    /// `s[start - 1]` is negligible: chase `e[start - 1]` out through U
    Split,
    /// One shifted QR sweep on the unreduced block
    Sweep,
    /// `e[m - 2]` is negligible: `s[m - 1]` has converged
    Converged,
}

impl<T: RealField> Bidiagonal<'_, T> {
    /// Reduce `a` to bidiagonal form, then expand the stored reflectors into
    /// U and V.
    fn reduce(&mut self, a: &mut [T], row_work: &mut [T]) {
        let (rows, cols) = (self.rows, self.cols);
        let nct = (rows - 1).min(cols);
        let nrt = cols.saturating_sub(2).min(rows);

        for l in 0..nct.max(nrt) {
            let lp1 = l + 1;

            if l < nct {
                let column = &mut a[l * rows + l..(l + 1) * rows];
                let mut norm = vector_norm(column);
                if !norm.is_zero() {
                    if !column[0].is_zero() {
                        norm = norm.with_sign_of(column[0]);
                    }
                    let inverse = T::one() / norm;
                    for value in column.iter_mut() {
                        *value *= inverse;
                    }
                    column[0] += T::one();
                }
                self.s[l] = -norm;
            }

            for j in lp1..cols {
                if l < nct && !self.s[l].is_zero() {
                    let (left, right) = a.split_at_mut(j * rows);
                    let reflector = &left[l * rows + l..(l + 1) * rows];
                    let target = &mut right[l..rows];
                    let t = -dot(reflector, target) / reflector[0];
                    axpy(t, reflector, target);
                }
                self.e[j] = a[j * rows + l];
            }

            if self.vectors && l < nct {
                let column = l * rows + l..(l + 1) * rows;
                self.u[column.clone()].copy_from_slice(&a[column]);
            }

            if l < nrt {
                let tail = &mut self.e[lp1..cols];
                let mut norm = vector_norm(tail);
                if !norm.is_zero() {
                    if !tail[0].is_zero() {
                        norm = norm.with_sign_of(tail[0]);
                    }
                    let inverse = T::one() / norm;
                    for value in tail.iter_mut() {
                        *value *= inverse;
                    }
                    tail[0] += T::one();
                }
                self.e[l] = -norm;

                if lp1 < rows && !self.e[l].is_zero() {
                    row_work[lp1..rows].fill(T::zero());
                    for j in lp1..cols {
                        let column = &a[j * rows + lp1..(j + 1) * rows];
                        axpy(self.e[j], column, &mut row_work[lp1..rows]);
                    }
                    for j in lp1..cols {
                        let t = -self.e[j] / self.e[lp1];
                        axpy(t, &row_work[lp1..rows], &mut a[j * rows + lp1..(j + 1) * rows]);
                    }
                }

                if self.vectors {
                    self.v[l * cols + lp1..(l + 1) * cols].copy_from_slice(&self.e[lp1..cols]);
                }
            }
        }

        let m = self.s.len();
        if nct < cols {
            self.s[nct] = a[nct * rows + nct];
        }
        if rows < m {
            self.s[m - 1] = T::zero();
        }
        if nrt + 1 < m {
            self.e[nrt] = a[(m - 1) * rows + nrt];
        }
        self.e[m - 1] = T::zero();

        if self.vectors {
            self.generate_u(nct);
            self.generate_v(nrt);
        }
    }

    fn generate_u(&mut self, nct: usize) {
        let rows = self.rows;
        for j in nct..rows {
            let column = &mut self.u[j * rows..(j + 1) * rows];
            column.fill(T::zero());
            column[j] = T::one();
        }

        for l in (0..nct).rev() {
            if !self.s[l].is_zero() {
                for j in (l + 1)..rows {
                    let (left, right) = self.u.split_at_mut(j * rows);
                    let reflector = &left[l * rows + l..(l + 1) * rows];
                    let target = &mut right[l..rows];
                    let t = -dot(reflector, target) / reflector[0];
                    axpy(t, reflector, target);
                }
                let column = &mut self.u[l * rows..(l + 1) * rows];
                for value in &mut column[l..] {
                    *value = -*value;
                }
                column[l] += T::one();
                column[..l].fill(T::zero());
            } else {
                let column = &mut self.u[l * rows..(l + 1) * rows];
                column.fill(T::zero());
                column[l] = T::one();
            }
        }
    }

    fn generate_v(&mut self, nrt: usize) {
        let cols = self.cols;
        for l in (0..cols).rev() {
            let lp1 = l + 1;
            if l < nrt && !self.e[l].is_zero() {
                for j in lp1..cols {
                    let (left, right) = self.v.split_at_mut(j * cols);
                    let reflector = &left[l * cols + lp1..(l + 1) * cols];
                    let target = &mut right[lp1..cols];
                    let t = -dot(reflector, target) / reflector[0];
                    axpy(t, reflector, target);
                }
            }
            let column = &mut self.v[l * cols..(l + 1) * cols];
            column.fill(T::zero());
            column[l] = T::one();
        }
    }

    /// Drive the super-diagonal to zero.
    fn iterate(&mut self, max_iterations: usize) -> Result<()> {
        let total = self.s.len();
        let mut m = total;
        let mut iterations = 0;

        while m > 0 {
            if iterations >= max_iterations {
                log::warn!(
                    "SVD did not converge: {m} singular values left after {iterations} sweeps"
                );
                return Err(KernelError::NonConvergence { iterations });
            }

            let (step, start) = self.classify(m);
            match step {
                Step::Deflate => {
                    log::trace!("SVD deflate at {}", m - 1);
                    self.deflate(start, m);
                }
                Step::Split => {
                    log::trace!("SVD split at {}", start - 1);
                    self.split(start, m);
                }
                Step::Sweep => {
                    log::trace!("SVD sweep on {start}..{m}");
                    self.sweep(start, m);
                    iterations += 1;
                }
                Step::Converged => {
                    log::trace!("SVD value {} converged after {iterations} sweeps", m - 1);
                    self.order(start, total);
                    iterations = 0;
                    m -= 1;
                }
            }
        }
        Ok(())
    }

    /// Decide what to do with the active block `..m` and where it starts.
    fn classify(&mut self, m: usize) -> (Step, usize) {
        let (s, e) = (&mut *self.s, &mut *self.e);

        let mut start = 0;
        for l in (0..m - 1).rev() {
            let reference = s[l].abs() + s[l + 1].abs();
            if T::is_negligible(e[l], reference) {
                e[l] = T::zero();
                start = l + 1;
                break;
            }
        }

        if start == m - 1 {
            return (Step::Converged, start);
        }

        for ls in (start..m).rev() {
            let mut reference = T::zero();
            if ls != m - 1 {
                reference += e[ls].abs();
            }
            if ls != start {
                reference += e[ls - 1].abs();
            }
            if T::is_negligible(s[ls], reference) {
                s[ls] = T::zero();
                return if ls == m - 1 {
                    (Step::Deflate, start)
                } else {
                    (Step::Split, ls + 1)
                };
            }
        }

        (Step::Sweep, start)
    }

    fn deflate(&mut self, start: usize, m: usize) {
        let mut f = self.e[m - 2];
        self.e[m - 2] = T::zero();
        for k in (start..m - 1).rev() {
            let (cs, sn) = rotg(&mut self.s[k], &mut f);
            if k != start {
                f = -sn * self.e[k - 1];
                self.e[k - 1] *= cs;
            }
            if self.vectors {
                rotate_columns(self.v, self.cols, k, m - 1, cs, sn);
            }
        }
    }

    fn split(&mut self, start: usize, m: usize) {
        let mut f = self.e[start - 1];
        self.e[start - 1] = T::zero();
        for k in start..m {
            let (cs, sn) = rotg(&mut self.s[k], &mut f);
            f = -sn * self.e[k];
            self.e[k] *= cs;
            if self.vectors && k < self.rows {
                rotate_columns(self.u, self.rows, k, start - 1, cs, sn);
            }
        }
    }

    fn sweep(&mut self, start: usize, m: usize) {
        let (s, e) = (&mut *self.s, &mut *self.e);

        let scale = s[m - 1]
            .abs()
            .max(s[m - 2].abs())
            .max(e[m - 2].abs())
            .max(s[start].abs())
            .max(e[start].abs());
        let sm = s[m - 1] / scale;
        let smm1 = s[m - 2] / scale;
        let emm1 = e[m - 2] / scale;
        let sl = s[start] / scale;
        let el = e[start] / scale;

        let two = T::one() + T::one();
        let b = ((smm1 + sm) * (smm1 - sm) + emm1 * emm1) / two;
        let c = (sm * emm1) * (sm * emm1);
        let mut shift = T::zero();
        if !b.is_zero() || !c.is_zero() {
            shift = (b * b + c).sqrt();
            if b < T::zero() {
                shift = -shift;
            }
            shift = c / (b + shift);
        }

        let mut f = (sl + sm) * (sl - sm) + shift;
        let mut g = sl * el;

        for k in start..m - 1 {
            let (cs, sn) = rotg(&mut f, &mut g);
            if k != start {
                e[k - 1] = f;
            }
            f = cs * s[k] + sn * e[k];
            e[k] = cs * e[k] - sn * s[k];
            g = sn * s[k + 1];
            s[k + 1] *= cs;
            if self.vectors {
                rotate_columns(self.v, self.cols, k, k + 1, cs, sn);
            }

            let (cs, sn) = rotg(&mut f, &mut g);
            s[k] = f;
            f = cs * e[k] + sn * s[k + 1];
            s[k + 1] = -sn * e[k] + cs * s[k + 1];
            g = sn * e[k + 1];
            e[k + 1] *= cs;
            if self.vectors && k + 1 < self.rows {
                rotate_columns(self.u, self.rows, k, k + 1, cs, sn);
            }
        }
        e[m - 2] = f;
    }

    /// Make the converged value non-negative and move it into descending
    /// position among the already-converged values.
    fn order(&mut self, mut l: usize, total: usize) {
        if self.s[l] < T::zero() {
            self.s[l] = -self.s[l];
            if self.vectors {
                for value in &mut self.v[l * self.cols..(l + 1) * self.cols] {
                    *value = -*value;
                }
            }
        } else if self.s[l].is_zero() {
            // -0.0
            self.s[l] = T::zero();
        }

        while l + 1 < total && self.s[l] < self.s[l + 1] {
            self.s.swap(l, l + 1);
            if self.vectors {
                if l + 1 < self.cols {
                    swap_columns(self.v, self.cols, l, l + 1);
                }
                if l + 1 < self.rows {
                    swap_columns(self.u, self.rows, l, l + 1);
                }
            }
            l += 1;
        }
    }
}

/// Construct a Givens rotation zeroing `b` (BLAS `drotg`).
///
/// On return `a` holds `r` and `b` holds the reconstruction value `z`.
fn rotg<T: RealField>(a: &mut T, b: &mut T) -> (T, T) {
    let roe = if a.abs() > b.abs() { *a } else { *b };
    let scale = a.abs() + b.abs();

    let (c, s, r, z);
    if scale.is_zero() {
        c = T::one();
        s = T::zero();
        r = T::zero();
        z = T::zero();
    } else {
        let sa = *a / scale;
        let sb = *b / scale;
        r = (scale * (sa * sa + sb * sb).sqrt()).with_sign_of(roe);
        c = *a / r;
        s = *b / r;
        z = if a.abs() > b.abs() {
            s
        } else if !c.is_zero() {
            T::one() / c
        } else {
            T::one()
        };
    }

    *a = r;
    *b = z;
    (c, s)
}

/// Borrow columns `j` and `k` (distinct) of a matrix with `rows` rows.
fn column_pair<T>(data: &mut [T], rows: usize, j: usize, k: usize) -> (&mut [T], &mut [T]) {
    debug_assert_ne!(j, k);
    let (low, high) = (j.min(k), j.max(k));
    let (left, right) = data.split_at_mut(high * rows);
    let first = &mut left[low * rows..(low + 1) * rows];
    let second = &mut right[..rows];
    if j < k { (first, second) } else { (second, first) }
}

/// `(x, y) <- (c*x + s*y, c*y - s*x)` on columns `j` and `k`.
fn rotate_columns<T: RealField>(data: &mut [T], rows: usize, j: usize, k: usize, c: T, s: T) {
    let (x, y) = column_pair(data, rows, j, k);
    for (xi, yi) in x.iter_mut().zip(y.iter_mut()) {
        let t = c * *xi + s * *yi;
        *yi = c * *yi - s * *xi;
        *xi = t;
    }
}

fn swap_columns<T>(data: &mut [T], rows: usize, j: usize, k: usize) {
    let (x, y) = column_pair(data, rows, j, k);
    x.swap_with_slice(y);
}

fn set_identity<T: RealField>(data: &mut [T], order: usize) {
    data.fill(T::zero());
    for i in 0..order {
        data[i * order + i] = T::one();
    }
}

/// Least-squares solve `x = V * diag(1/s) * U^T * b` from a decomposition.
///
/// Only the leading `min(rows, cols)` singular triplets are used; the other
/// components of the solution are zero. Zero singular values are divided by
/// as they are.
#[allow(clippy::too_many_arguments)]
pub fn svd_solve_factored<T: RealField>(
    rows: usize,
    cols: usize,
    s: &[T],
    u: &[T],
    vt: &[T],
    b: &[T],
    columns_b: usize,
    x: &mut [T],
) -> Result<()> {
    let min_mn = rows.min(cols);
    check_length("s", s.len(), min_mn)?;
    check_shape("u", u.len(), rows, rows)?;
    check_shape("vt", vt.len(), cols, cols)?;
    check_shape("b", b.len(), rows, columns_b)?;
    check_shape("x", x.len(), cols, columns_b)?;
    ensure_distinct("u", u, "b", b)?;
    ensure_distinct("vt", vt, "b", b)?;

    let size = rows.saturating_mul(cols).saturating_mul(columns_b);
    let parallel = columns_b > 1 && Control::global().worth_parallelizing(size);
    parallel::for_each_column_mut(x, cols, parallel, |column, xk| {
        let bk = &b[column * rows..(column + 1) * rows];
        let projected: Vec<T> = (0..min_mn)
            .map(|j| dot(&u[j * rows..(j + 1) * rows], bk) / s[j])
            .collect();
        for (j, value) in xk.iter_mut().enumerate() {
            *value = dot(&vt[j * cols..j * cols + min_mn], &projected);
        }
    });
    Ok(())
}

/// Decompose a copy of `a` and solve in the least-squares sense.
pub fn svd_solve<T: RealField>(
    a: &[T],
    rows: usize,
    cols: usize,
    b: &[T],
    columns_b: usize,
    x: &mut [T],
) -> Result<()> {
    check_shape("a", a.len(), rows, cols)?;
    check_shape("b", b.len(), rows, columns_b)?;
    check_shape("x", x.len(), cols, columns_b)?;

    let mut factor = a.to_vec();
    let mut s = vec![T::zero(); rows.min(cols)];
    let mut u = vec![T::zero(); checked_size("u", rows, rows)?];
    let mut vt = vec![T::zero(); checked_size("vt", cols, cols)?];
    singular_value_decomposition(true, &mut factor, rows, cols, &mut s, &mut u, &mut vt)?;
    svd_solve_factored(rows, cols, &s, &u, &vt, b, columns_b, x)
}

/// Numerical rank: the number of singular values above `tolerance`.
///
/// Without an explicit tolerance, `max(rows, cols) * max(s) * epsilon` is
/// used.
pub fn svd_rank<T: RealField>(s: &[T], rows: usize, cols: usize, tolerance: Option<T>) -> usize {
    let tolerance = tolerance.unwrap_or_else(|| {
        let largest = s.iter().copied().fold(T::zero(), T::max);
        T::from_count(rows.max(cols)) * largest * T::epsilon()
    });
    s.iter().filter(|&&value| value > tolerance).count()
}

/// 2-norm condition number `max(s) / min(s)`.
///
/// Infinite for a rank-deficient spectrum, NaN for an empty one.
pub fn svd_condition_number<T: RealField>(s: &[T]) -> T {
    if s.is_empty() {
        return T::nan();
    }
    let largest = s.iter().copied().fold(T::zero(), T::max);
    let smallest = s.iter().copied().fold(T::infinity(), T::min);
    largest / smallest
}
