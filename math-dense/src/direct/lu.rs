//! LU decomposition with partial pivoting
//!
//! The factored buffer holds the unit lower-triangular `L` below the
//! diagonal and `U` on and above it, so that `P * A = L * U`. The pivot
//! vector records the row interchanges in the order they were applied:
//! `pivot[j] = p` means rows `j` and `p` were swapped at step `j`.
//!
//! Solves run column by column over the right-hand side, in parallel when
//! the workload is large enough.

use crate::checks::{check_length, check_pivots, check_shape, check_work, report_work_size};
use crate::config::Control;
use crate::error::Result;
use crate::parallel;
use crate::traits::RealField;

/// Minimum `work` length for the inverse routines.
pub fn lu_inverse_work_size(order: usize) -> usize {
    order.saturating_mul(order)
}

/// Factor the `order x order` matrix `a` in place.
///
/// Columns are eliminated left to right: each column is first updated with
/// the already-eliminated columns, then the first entry of largest magnitude
/// on or below the diagonal is swapped into place.
///
/// An exactly singular matrix is not an error; it produces a zero on the
/// diagonal of `U` which later solves will divide by.
pub fn lu_factor<T: RealField>(a: &mut [T], order: usize, pivot: &mut [usize]) -> Result<()> {
    check_shape("a", a.len(), order, order)?;
    check_length("pivot", pivot.len(), order)?;

    log::debug!("LU factorization of order {order}");

    for (i, p) in pivot.iter_mut().enumerate() {
        *p = i;
    }

    let mut column = vec![T::zero(); order];
    for j in 0..order {
        let col_start = j * order;
        column.copy_from_slice(&a[col_start..col_start + order]);

        for i in 0..order {
            let mut sum = T::zero();
            for k in 0..i.min(j) {
                sum += a[k * order + i] * column[k];
            }
            column[i] -= sum;
            a[col_start + i] = column[i];
        }

        let mut p = j;
        for i in (j + 1)..order {
            if column[i].abs() > column[p].abs() {
                p = i;
            }
        }

        if p != j {
            for k in 0..order {
                a.swap(k * order + p, k * order + j);
            }
        }
        pivot[j] = p;

        let diagonal = a[col_start + j];
        if !diagonal.is_zero() {
            for value in &mut a[col_start + j + 1..col_start + order] {
                *value /= diagonal;
            }
        }
    }

    Ok(())
}

/// Solve `A * X = B` from a factorization produced by [`lu_factor`].
///
/// `b` holds `columns_b` right-hand sides and is overwritten with `X`.
pub fn lu_solve_factored<T: RealField>(
    columns_b: usize,
    a: &[T],
    order: usize,
    pivot: &[usize],
    b: &mut [T],
) -> Result<()> {
    check_shape("a", a.len(), order, order)?;
    check_pivots(pivot, order)?;
    check_shape("b", b.len(), order, columns_b)?;

    let size = order.saturating_mul(order).saturating_mul(columns_b);
    let parallel = columns_b > 1 && Control::global().worth_parallelizing(size);
    parallel::for_each_column_mut(b, order, parallel, |_, x| {
        solve_column(a, order, pivot, x);
    });
    Ok(())
}

/// Solve `A^T * X = B` from a factorization produced by [`lu_factor`].
pub fn lu_solve_factored_transposed<T: RealField>(
    columns_b: usize,
    a: &[T],
    order: usize,
    pivot: &[usize],
    b: &mut [T],
) -> Result<()> {
    check_shape("a", a.len(), order, order)?;
    check_pivots(pivot, order)?;
    check_shape("b", b.len(), order, columns_b)?;

    // Column access on the transposed factor keeps both sweeps contiguous.
    let mut transposed = vec![T::zero(); order * order];
    for j in 0..order {
        for i in 0..order {
            transposed[i * order + j] = a[j * order + i];
        }
    }

    let size = order.saturating_mul(order).saturating_mul(columns_b);
    let parallel = columns_b > 1 && Control::global().worth_parallelizing(size);
    parallel::for_each_column_mut(b, order, parallel, |_, x| {
        solve_transposed_column(&transposed, order, pivot, x);
    });
    Ok(())
}

/// Factor a copy of `a` and solve `A * X = B`; `a` is left untouched.
pub fn lu_solve<T: RealField>(columns_b: usize, a: &[T], order: usize, b: &mut [T]) -> Result<()> {
    check_shape("a", a.len(), order, order)?;
    check_shape("b", b.len(), order, columns_b)?;

    let mut factor = a.to_vec();
    let mut pivot = vec![0; order];
    lu_factor(&mut factor, order, &mut pivot)?;
    lu_solve_factored(columns_b, &factor, order, &pivot, b)
}

/// Factor a copy of `a` and solve `A^T * X = B`.
pub fn lu_solve_transposed<T: RealField>(
    columns_b: usize,
    a: &[T],
    order: usize,
    b: &mut [T],
) -> Result<()> {
    check_shape("a", a.len(), order, order)?;
    check_shape("b", b.len(), order, columns_b)?;

    let mut factor = a.to_vec();
    let mut pivot = vec![0; order];
    lu_factor(&mut factor, order, &mut pivot)?;
    lu_solve_factored_transposed(columns_b, &factor, order, &pivot, b)
}

/// Replace a factored buffer with the inverse of the original matrix.
pub fn lu_inverse_factored<T: RealField>(a: &mut [T], order: usize, pivot: &[usize]) -> Result<()> {
    check_shape("a", a.len(), order, order)?;
    let mut work = vec![T::zero(); lu_inverse_work_size(order)];
    lu_inverse_factored_with_work(a, order, pivot, &mut work)
}

/// [`lu_inverse_factored`] with caller-provided scratch of at least
/// `order * order` elements.
pub fn lu_inverse_factored_with_work<T: RealField>(
    a: &mut [T],
    order: usize,
    pivot: &[usize],
    work: &mut [T],
) -> Result<()> {
    check_shape("a", a.len(), order, order)?;
    check_pivots(pivot, order)?;
    let required = lu_inverse_work_size(order);
    check_work(work, required)?;

    let inverse = &mut work[..required];
    inverse.fill(T::zero());
    for i in 0..order {
        inverse[i * order + i] = T::one();
    }

    lu_solve_factored(order, a, order, pivot, inverse)?;
    a.copy_from_slice(inverse);

    report_work_size(work, required);
    Ok(())
}

/// Invert `a` in place.
pub fn lu_inverse<T: RealField>(a: &mut [T], order: usize) -> Result<()> {
    check_shape("a", a.len(), order, order)?;
    let mut work = vec![T::zero(); lu_inverse_work_size(order)];
    lu_inverse_with_work(a, order, &mut work)
}

/// [`lu_inverse`] with caller-provided scratch of at least `order * order`
/// elements.
pub fn lu_inverse_with_work<T: RealField>(a: &mut [T], order: usize, work: &mut [T]) -> Result<()> {
    check_shape("a", a.len(), order, order)?;
    check_work(work, lu_inverse_work_size(order))?;

    let mut pivot = vec![0; order];
    lu_factor(a, order, &mut pivot)?;
    lu_inverse_factored_with_work(a, order, &pivot, work)
}

/// Determinant of the original matrix from its factorization.
pub fn lu_determinant<T: RealField>(a: &[T], order: usize, pivot: &[usize]) -> Result<T> {
    check_shape("a", a.len(), order, order)?;
    check_pivots(pivot, order)?;

    let mut det = T::one();
    for (i, &p) in pivot.iter().enumerate() {
        if p != i {
            det = -det;
        }
        det *= a[i * order + i];
    }
    Ok(det)
}

fn solve_column<T: RealField>(a: &[T], order: usize, pivot: &[usize], x: &mut [T]) {
    for (i, &p) in pivot.iter().enumerate() {
        if p != i {
            x.swap(i, p);
        }
    }

    // L y = P b (unit diagonal)
    for k in 0..order {
        let xk = x[k];
        let l_col = &a[k * order..(k + 1) * order];
        for i in (k + 1)..order {
            x[i] -= xk * l_col[i];
        }
    }

    // U x = y
    for k in (0..order).rev() {
        let u_col = &a[k * order..(k + 1) * order];
        x[k] /= u_col[k];
        let xk = x[k];
        for i in 0..k {
            x[i] -= xk * u_col[i];
        }
    }
}

/// `transposed` holds `U^T` on and below its diagonal and `L^T` above it.
fn solve_transposed_column<T: RealField>(
    transposed: &[T],
    order: usize,
    pivot: &[usize],
    x: &mut [T],
) {
    // U^T z = b
    for k in 0..order {
        let col = &transposed[k * order..(k + 1) * order];
        x[k] /= col[k];
        let xk = x[k];
        for i in (k + 1)..order {
            x[i] -= xk * col[i];
        }
    }

    // L^T w = z (unit diagonal)
    for k in (0..order).rev() {
        let col = &transposed[k * order..(k + 1) * order];
        let xk = x[k];
        for i in 0..k {
            x[i] -= xk * col[i];
        }
    }

    for (i, &p) in pivot.iter().enumerate().rev() {
        if p != i {
            x.swap(i, p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KernelError;
    use approx::assert_relative_eq;

    // [[2, 1, 1], [4, -6, 0], [-2, 7, 2]]
    const A: [f64; 9] = [2.0, 4.0, -2.0, 1.0, -6.0, 7.0, 1.0, 0.0, 2.0];

    fn multiply(a: &[f64], x: &[f64], n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (0..n).map(|j| a[j * n + i] * x[j]).sum())
            .collect()
    }

    #[test]
    fn test_lu_solve_real() {
        let mut b = [5.0, -2.0, 9.0];
        lu_solve(1, &A, 3, &mut b).unwrap();
        assert_relative_eq!(b[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(b[1], 1.0, epsilon = 1e-10);
        assert_relative_eq!(b[2], 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_lu_reconstructs_permuted_matrix() {
        let n = 3;
        let mut lu = A;
        let mut pivot = [0; 3];
        lu_factor(&mut lu, n, &mut pivot).unwrap();

        // largest entry of column 0 is 4 in row 1
        assert_eq!(pivot[0], 1);

        let mut pa = A.to_vec();
        for (i, &p) in pivot.iter().enumerate() {
            for j in 0..n {
                pa.swap(j * n + i, j * n + p);
            }
        }

        for i in 0..n {
            for j in 0..n {
                let mut sum = 0.0;
                for k in 0..n {
                    let l = if i == k {
                        1.0
                    } else if i > k {
                        lu[k * n + i]
                    } else {
                        0.0
                    };
                    let u = if k <= j { lu[j * n + k] } else { 0.0 };
                    sum += l * u;
                }
                assert_relative_eq!(sum, pa[j * n + i], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_lu_identity() {
        let mut a = [1.0, 0.0, 0.0, 1.0];
        let mut pivot = [9; 2];
        lu_factor(&mut a, 2, &mut pivot).unwrap();
        assert_eq!(a, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(pivot, [0, 1]);
    }

    #[test]
    fn test_pivot_tie_takes_first_row() {
        // column 0 is [1, -1]: equal magnitudes keep row 0
        let mut a = [1.0, -1.0, 2.0, 3.0];
        let mut pivot = [0; 2];
        lu_factor(&mut a, 2, &mut pivot).unwrap();
        assert_eq!(pivot[0], 0);
    }

    #[test]
    fn test_lu_singular_is_not_an_error() {
        let mut a = [1.0, 2.0, 2.0, 4.0];
        let mut pivot = [0; 2];
        lu_factor(&mut a, 2, &mut pivot).unwrap();
        assert_eq!(a[3], 0.0);
        assert_eq!(lu_determinant(&a, 2, &pivot).unwrap(), 0.0);
    }

    #[test]
    fn test_lu_multiple_right_hand_sides() {
        let x = [1.0, 2.0, 3.0, -1.0, 0.5, 4.0];
        let mut b = multiply(&A, &x[..3], 3);
        b.extend(multiply(&A, &x[3..], 3));

        lu_solve(2, &A, 3, &mut b).unwrap();
        for (got, want) in b.iter().zip(&x) {
            assert_relative_eq!(*got, *want, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_lu_solve_transposed() {
        let n = 3;
        let mut at = [0.0; 9];
        for i in 0..n {
            for j in 0..n {
                at[i * n + j] = A[j * n + i];
            }
        }
        let x = [1.5, -2.0, 0.25];
        let mut b = multiply(&at, &x, n);

        lu_solve_transposed(1, &A, n, &mut b).unwrap();
        for (got, want) in b.iter().zip(&x) {
            assert_relative_eq!(*got, *want, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_lu_inverse() {
        let n = 3;
        let mut inverse = A;
        lu_inverse(&mut inverse, n).unwrap();

        for i in 0..n {
            for j in 0..n {
                let value: f64 = (0..n).map(|k| A[k * n + i] * inverse[j * n + k]).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(value, expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_lu_determinant() {
        let mut lu = A;
        let mut pivot = [0; 3];
        lu_factor(&mut lu, 3, &mut pivot).unwrap();
        // det = 2(-12 - 0) - 1(8 - 0) + 1(28 - 12) = -16
        assert_relative_eq!(lu_determinant(&lu, 3, &pivot).unwrap(), -16.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_work_query() {
        let mut a = A;
        let mut work = [0.0; 3];
        let err = lu_inverse_with_work(&mut a, 3, &mut work).unwrap_err();
        assert_eq!(err.required_work_size(), Some(9));
        assert_eq!(work[0], 9.0);
        assert_eq!(a, A);
    }

    #[test]
    fn test_pivot_validation() {
        let mut b = [1.0, 2.0];
        let err = lu_solve_factored(1, &[1.0, 0.0, 0.0, 1.0], 2, &[0, 5], &mut b).unwrap_err();
        assert_eq!(
            err,
            KernelError::PivotOutOfRange {
                index: 1,
                value: 5,
                order: 2
            }
        );
        assert_eq!(b, [1.0, 2.0]);
    }

    #[test]
    fn test_shape_validation() {
        let mut a = [1.0; 8];
        let mut pivot = [0; 3];
        assert!(matches!(
            lu_factor(&mut a, 3, &mut pivot),
            Err(KernelError::ArrayLength { name: "a", expected: 9, got: 8 })
        ));
    }

    #[test]
    fn test_wrapping_order_is_rejected() {
        // order * order wraps to a small number without a checked product
        let order = 1usize << (usize::BITS / 2);
        let mut a: [f64; 0] = [];
        let mut pivot: [usize; 0] = [];
        assert!(matches!(
            lu_factor(&mut a, order, &mut pivot),
            Err(KernelError::ArrayLength { name: "a", expected: usize::MAX, got: 0 })
        ));
        assert!(matches!(
            lu_inverse(&mut a, order),
            Err(KernelError::ArrayLength { name: "a", .. })
        ));
        assert_eq!(lu_inverse_work_size(order), usize::MAX);
    }
}
