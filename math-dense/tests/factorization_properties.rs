//! Property tests for the dense kernels on seeded random matrices
//!
//! Sizes are chosen to cross the default parallel thresholds so the
//! recursive and fork-join paths are exercised alongside the serial ones.
//! Products are checked against ndarray as an independent reference.

use approx::assert_relative_eq;
use math_audio_dense::{
    Control, KernelError, LinearAlgebraProvider, ManagedProvider, Norm, Parallelism, QrMethod,
    Transpose, cholesky_factor, cholesky_solve, dot_product, lu_determinant, lu_factor,
    lu_inverse, lu_solve, lu_solve_transposed, matrix_multiply, matrix_multiply_with_block,
    matrix_multiply_with_update, matrix_norm, qr_factor, qr_solve, singular_value_decomposition,
    svd_condition_number, svd_solve, thin_qr_factor,
};
use ndarray::{Array2, ShapeBuilder};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Column-major `rows x cols` matrix with entries in `[-1, 1)`
fn random_matrix(rng: &mut StdRng, rows: usize, cols: usize) -> Vec<f64> {
    (0..rows * cols).map(|_| rng.random_range(-1.0..1.0)).collect()
}

fn to_ndarray(data: &[f64], rows: usize, cols: usize) -> Array2<f64> {
    Array2::from_shape_vec((rows, cols).f(), data.to_vec()).unwrap()
}

fn max_abs_diff(data: &[f64], rows: usize, reference: &Array2<f64>) -> f64 {
    data.iter()
        .enumerate()
        .map(|(index, value)| (value - reference[[index % rows, index / rows]]).abs())
        .fold(0.0, f64::max)
}

/// Diagonally dominant matrix, safely invertible
fn well_conditioned(rng: &mut StdRng, order: usize) -> Vec<f64> {
    let mut a = random_matrix(rng, order, order);
    for i in 0..order {
        a[i * order + i] += order as f64;
    }
    a
}

/// `B * B^T + order * I`
fn symmetric_positive_definite(rng: &mut StdRng, order: usize) -> Vec<f64> {
    let b = to_ndarray(&random_matrix(rng, order, order), order, order);
    let mut a = b.dot(&b.t());
    for i in 0..order {
        a[[i, i]] += order as f64;
    }
    a.t().iter().copied().collect()
}

#[test]
fn test_gemm_matches_ndarray() {
    let mut rng = StdRng::seed_from_u64(7);
    for &(m, k, n) in &[(1, 1, 1), (3, 5, 2), (97, 83, 71), (130, 40, 150)] {
        let a = random_matrix(&mut rng, m, k);
        let b = random_matrix(&mut rng, k, n);
        let mut c = vec![0.0; m * n];
        matrix_multiply(&a, m, k, &b, k, n, &mut c).unwrap();

        let reference = to_ndarray(&a, m, k).dot(&to_ndarray(&b, k, n));
        assert!(max_abs_diff(&c, m, &reference) < 1e-12, "{m}x{k}x{n}");
    }
}

#[test]
fn test_gemm_transposed_update_matches_ndarray() {
    let mut rng = StdRng::seed_from_u64(11);
    let (m, k, n) = (45, 60, 38);
    // A stored as k x m, B stored as n x k
    let a = random_matrix(&mut rng, k, m);
    let b = random_matrix(&mut rng, n, k);
    let c0 = random_matrix(&mut rng, m, n);
    let mut c = c0.clone();

    matrix_multiply_with_update(
        Transpose::Transpose,
        Transpose::Transpose,
        2.0,
        &a,
        k,
        m,
        &b,
        n,
        k,
        -0.5,
        &mut c,
    )
    .unwrap();

    let product = to_ndarray(&a, k, m).t().dot(&to_ndarray(&b, n, k).t());
    let reference = product * 2.0 - to_ndarray(&c0, m, n) * 0.5;
    assert!(max_abs_diff(&c, m, &reference) < 1e-12);
}

#[test]
fn test_gemm_mixed_transposes_match_ndarray() {
    let mut rng = StdRng::seed_from_u64(17);
    let (m, k, n) = (70, 95, 66);

    // T,N: A stored k x m, B stored k x n
    let a = random_matrix(&mut rng, k, m);
    let b = random_matrix(&mut rng, k, n);
    let mut c = vec![f64::NAN; m * n];
    matrix_multiply_with_update(
        Transpose::Transpose,
        Transpose::DontTranspose,
        1.0,
        &a,
        k,
        m,
        &b,
        k,
        n,
        0.0,
        &mut c,
    )
    .unwrap();
    let reference = to_ndarray(&a, k, m).t().dot(&to_ndarray(&b, k, n));
    assert!(max_abs_diff(&c, m, &reference) < 1e-12);

    // N,T: A stored m x k, B stored n x k
    let a = random_matrix(&mut rng, m, k);
    let b = random_matrix(&mut rng, n, k);
    let c0 = random_matrix(&mut rng, m, n);
    let mut c = c0.clone();
    matrix_multiply_with_update(
        Transpose::DontTranspose,
        Transpose::Transpose,
        -1.5,
        &a,
        m,
        k,
        &b,
        n,
        k,
        1.0,
        &mut c,
    )
    .unwrap();
    let product = to_ndarray(&a, m, k).dot(&to_ndarray(&b, n, k).t());
    let reference = to_ndarray(&c0, m, n) - product * 1.5;
    assert!(max_abs_diff(&c, m, &reference) < 1e-12);
}

#[test]
fn test_gemm_transposed_dimension_mismatch() {
    let mut rng = StdRng::seed_from_u64(19);
    let a = random_matrix(&mut rng, 5, 4);
    let b = random_matrix(&mut rng, 4, 6);
    let mut c = vec![1.0; 24];

    // A^T is 4x5, so A^T * B needs B with 5 rows
    let err = matrix_multiply_with_update(
        Transpose::Transpose,
        Transpose::DontTranspose,
        1.0,
        &a,
        5,
        4,
        &b,
        4,
        6,
        0.0,
        &mut c,
    )
    .unwrap_err();
    assert!(err.is_precondition());
    assert!(matches!(
        err,
        KernelError::DimensionMismatch { left: (4, 5), right: (4, 6), .. }
    ));
    assert!(c.iter().all(|&v| v == 1.0));
}

#[test]
fn test_gemm_parallel_and_serial_agree() {
    let mut rng = StdRng::seed_from_u64(13);
    let (m, k, n) = (120, 90, 110);
    let a = random_matrix(&mut rng, m, k);
    let b = random_matrix(&mut rng, k, n);

    let mut serial = vec![0.0; m * n];
    let mut forked = vec![0.0; m * n];
    let runs = [(&mut serial, Parallelism::None), (&mut forked, Parallelism::Rayon(4))];
    for (c, parallelism) in runs {
        matrix_multiply_with_block(
            Transpose::DontTranspose,
            Transpose::DontTranspose,
            1.0,
            &a,
            m,
            k,
            &b,
            k,
            n,
            0.0,
            c,
            16,
            parallelism,
        )
        .unwrap();
    }

    // Each element is accumulated in the same order either way
    assert_eq!(serial, forked);
}

#[test]
fn test_lu_solve_and_inverse() {
    let mut rng = StdRng::seed_from_u64(17);
    let order = 80;
    let a = well_conditioned(&mut rng, order);
    let x_true = random_matrix(&mut rng, order, 3);

    let a_nd = to_ndarray(&a, order, order);
    let b_nd = a_nd.dot(&to_ndarray(&x_true, order, 3));
    let mut b: Vec<f64> = b_nd.t().iter().copied().collect();
    lu_solve(3, &a, order, &mut b).unwrap();
    for (value, expected) in b.iter().zip(&x_true) {
        assert_relative_eq!(*value, *expected, epsilon = 1e-10);
    }

    let mut inverse = a.clone();
    lu_inverse(&mut inverse, order).unwrap();
    let identity = a_nd.dot(&to_ndarray(&inverse, order, order));
    let flat: Vec<f64> = identity.t().iter().copied().collect();
    assert!(max_abs_diff(&flat, order, &Array2::eye(order)) < 1e-10);
}

#[test]
fn test_lu_transposed_solve() {
    let mut rng = StdRng::seed_from_u64(19);
    let order = 30;
    let a = well_conditioned(&mut rng, order);
    let x_true = random_matrix(&mut rng, order, 1);

    let b_nd = to_ndarray(&a, order, order).t().dot(&to_ndarray(&x_true, order, 1));
    let mut b: Vec<f64> = b_nd.iter().copied().collect();
    lu_solve_transposed(1, &a, order, &mut b).unwrap();
    for (value, expected) in b.iter().zip(&x_true) {
        assert_relative_eq!(*value, *expected, epsilon = 1e-10);
    }
}

#[test]
fn test_lu_determinant_of_triangular_product() {
    // det(L * U) = prod(diag(U)) when L is unit lower triangular
    let order = 5;
    let mut l = vec![0.0; order * order];
    let mut u = vec![0.0; order * order];
    for j in 0..order {
        for i in 0..order {
            if i > j {
                l[j * order + i] = 0.25 * (i + j) as f64;
            } else {
                u[j * order + i] = 1.0 + 0.5 * (i * j) as f64;
            }
        }
        l[j * order + j] = 1.0;
    }
    let mut a = vec![0.0; order * order];
    matrix_multiply(&l, order, order, &u, order, order, &mut a).unwrap();

    let expected: f64 = (0..order).map(|i| u[i * order + i]).product();
    let mut pivot = vec![0; order];
    lu_factor(&mut a, order, &mut pivot).unwrap();
    let det = lu_determinant(&a, order, &pivot).unwrap();
    assert_relative_eq!(det, expected, max_relative = 1e-10);
}

#[test]
fn test_cholesky_reconstructs_input() {
    let mut rng = StdRng::seed_from_u64(23);
    // Above the default column split so the recursive update runs
    let order = 230;
    let a = symmetric_positive_definite(&mut rng, order);
    let mut factor = a.clone();
    cholesky_factor(&mut factor, order).unwrap();

    for j in 0..order {
        for i in 0..j {
            assert_eq!(factor[j * order + i], 0.0);
        }
    }

    let l = to_ndarray(&factor, order, order);
    let reconstructed = l.dot(&l.t());
    let scale = matrix_norm(Norm::LargestAbsoluteValue, order, order, &a).unwrap();
    assert!(max_abs_diff(&a, order, &reconstructed) < 1e-12 * scale);
}

#[test]
fn test_cholesky_solve_matches_lu_solve() {
    let mut rng = StdRng::seed_from_u64(29);
    let order = 40;
    let a = symmetric_positive_definite(&mut rng, order);
    let b = random_matrix(&mut rng, order, 2);

    let mut via_cholesky = b.clone();
    cholesky_solve(&a, order, &mut via_cholesky, 2).unwrap();
    let mut via_lu = b;
    lu_solve(2, &a, order, &mut via_lu).unwrap();

    for (left, right) in via_cholesky.iter().zip(&via_lu) {
        assert_relative_eq!(*left, *right, epsilon = 1e-10);
    }
}

#[test]
fn test_qr_orthogonality_and_reconstruction() {
    let mut rng = StdRng::seed_from_u64(31);
    let (rows, cols) = (60, 35);
    let a = random_matrix(&mut rng, rows, cols);

    let mut r = a.clone();
    let mut q = vec![0.0; rows * rows];
    qr_factor(&mut r, rows, cols, &mut q).unwrap();

    let q_nd = to_ndarray(&q, rows, rows);
    let gram = q_nd.t().dot(&q_nd);
    let gram_data: Vec<f64> = gram.t().iter().copied().collect();
    assert!(max_abs_diff(&gram_data, rows, &Array2::eye(rows)) < 1e-12);

    for j in 0..cols {
        assert!(r[j * rows + j] >= 0.0);
        for i in j + 1..rows {
            assert!(r[j * rows + i].abs() < 1e-14);
        }
    }

    let reconstructed = q_nd.dot(&to_ndarray(&r, rows, cols));
    assert!(max_abs_diff(&a, rows, &reconstructed) < 1e-12);
}

#[test]
fn test_thin_qr_above_split_threshold() {
    let mut rng = StdRng::seed_from_u64(37);
    let (rows, cols) = (240, 210);
    let a = random_matrix(&mut rng, rows, cols);

    let mut q = a.clone();
    let mut r = vec![0.0; cols * cols];
    thin_qr_factor(&mut q, rows, cols, &mut r).unwrap();

    let reconstructed = to_ndarray(&q, rows, cols).dot(&to_ndarray(&r, cols, cols));
    assert!(max_abs_diff(&a, rows, &reconstructed) < 1e-11);
}

#[test]
fn test_least_squares_solvers_agree() {
    let mut rng = StdRng::seed_from_u64(41);
    let (rows, cols) = (50, 12);
    let a = random_matrix(&mut rng, rows, cols);
    let b = random_matrix(&mut rng, rows, 1);

    let mut full = vec![0.0; cols];
    qr_solve(&a, rows, cols, &b, 1, &mut full, QrMethod::Full).unwrap();
    let mut thin = vec![0.0; cols];
    qr_solve(&a, rows, cols, &b, 1, &mut thin, QrMethod::Thin).unwrap();
    let mut via_svd = vec![0.0; cols];
    svd_solve(&a, rows, cols, &b, 1, &mut via_svd).unwrap();

    for j in 0..cols {
        assert_relative_eq!(full[j], thin[j], epsilon = 1e-10);
        assert_relative_eq!(full[j], via_svd[j], epsilon = 1e-10);
    }

    // The residual is orthogonal to the column space
    let a_nd = to_ndarray(&a, rows, cols);
    let residual = to_ndarray(&b, rows, 1) - a_nd.dot(&to_ndarray(&full, cols, 1));
    let normal = a_nd.t().dot(&residual);
    assert!(normal.iter().all(|value| value.abs() < 1e-10));
}

#[test]
fn test_svd_properties() {
    let mut rng = StdRng::seed_from_u64(43);
    for &(rows, cols) in &[(25, 25), (40, 17), (13, 31)] {
        let a = random_matrix(&mut rng, rows, cols);
        let min_mn = rows.min(cols);

        let mut work = a.clone();
        let mut s = vec![0.0; min_mn];
        let mut u = vec![0.0; rows * rows];
        let mut vt = vec![0.0; cols * cols];
        singular_value_decomposition(true, &mut work, rows, cols, &mut s, &mut u, &mut vt).unwrap();

        assert!(s.windows(2).all(|pair| pair[0] >= pair[1]));
        assert!(s.iter().all(|&value| value >= 0.0));

        let u_nd = to_ndarray(&u, rows, rows);
        let vt_nd = to_ndarray(&vt, cols, cols);
        let u_gram: Vec<f64> = u_nd.t().dot(&u_nd).t().iter().copied().collect();
        let v_gram: Vec<f64> = vt_nd.dot(&vt_nd.t()).t().iter().copied().collect();
        assert!(max_abs_diff(&u_gram, rows, &Array2::eye(rows)) < 1e-12);
        assert!(max_abs_diff(&v_gram, cols, &Array2::eye(cols)) < 1e-12);

        let mut sigma = Array2::<f64>::zeros((rows, cols));
        for (i, &value) in s.iter().enumerate() {
            sigma[[i, i]] = value;
        }
        let reconstructed = u_nd.dot(&sigma).dot(&vt_nd);
        assert!(max_abs_diff(&a, rows, &reconstructed) < 1e-12, "{rows}x{cols}");

        // Largest singular value is the spectral norm, bounded by Frobenius
        let frobenius = matrix_norm(Norm::FrobeniusNorm, rows, cols, &a).unwrap();
        assert!(s[0] <= frobenius + 1e-12);
        let sum_sq: f64 = s.iter().map(|value| value * value).sum();
        assert_relative_eq!(sum_sq.sqrt(), frobenius, max_relative = 1e-12);
    }
}

#[test]
fn test_svd_condition_number_of_scaled_orthogonal() {
    // Q * diag(d) has singular values |d|
    let mut rng = StdRng::seed_from_u64(47);
    let order = 6;
    let mut r = random_matrix(&mut rng, order, order);
    let mut q = vec![0.0; order * order];
    qr_factor(&mut r, order, order, &mut q).unwrap();
    let diagonal = [8.0, 4.0, 2.0, 1.0, 0.5, 0.25];
    for (j, &d) in diagonal.iter().enumerate() {
        for value in &mut q[j * order..(j + 1) * order] {
            *value *= d;
        }
    }

    let mut s = vec![0.0; order];
    let mut u = vec![0.0; order * order];
    let mut vt = vec![0.0; order * order];
    singular_value_decomposition(false, &mut q, order, order, &mut s, &mut u, &mut vt).unwrap();
    for (value, expected) in s.iter().zip(diagonal) {
        assert_relative_eq!(*value, expected, max_relative = 1e-12);
    }
    assert_relative_eq!(svd_condition_number(&s), 32.0, max_relative = 1e-12);
}

#[test]
fn test_norms_match_ndarray() {
    let mut rng = StdRng::seed_from_u64(53);
    let (rows, cols) = (9, 14);
    let a = random_matrix(&mut rng, rows, cols);
    let a_nd = to_ndarray(&a, rows, cols);

    let one = a_nd.columns().into_iter().map(|c| c.mapv(f64::abs).sum()).fold(0.0, f64::max);
    let infinity = a_nd.rows().into_iter().map(|r| r.mapv(f64::abs).sum()).fold(0.0, f64::max);
    let frobenius = a_nd.mapv(|v| v * v).sum().sqrt();
    let largest = a_nd.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));

    let norm = |kind| matrix_norm(kind, rows, cols, &a).unwrap();
    assert_relative_eq!(norm(Norm::OneNorm), one, max_relative = 1e-14);
    assert_relative_eq!(norm(Norm::InfinityNorm), infinity, max_relative = 1e-14);
    assert_relative_eq!(norm(Norm::FrobeniusNorm), frobenius, max_relative = 1e-12);
    assert_eq!(norm(Norm::LargestAbsoluteValue), largest);
}

#[test]
fn test_dot_product_long_vector() {
    let x: Vec<f64> = (0..5000).map(|i| (i % 7) as f64).collect();
    let y: Vec<f64> = (0..5000).map(|i| (i % 3) as f64).collect();
    let expected: f64 = x.iter().zip(&y).map(|(a, b)| a * b).sum();
    // Small integers: every partial sum is exact
    assert_eq!(dot_product(&x, &y).unwrap(), expected);
}

#[test]
fn test_f32_factorizations() {
    let a: Vec<f32> = vec![4.0, 2.0, 2.0, 3.0];
    let mut b = vec![2.0_f32, 1.0];
    cholesky_solve(&a, 2, &mut b, 1).unwrap();
    assert_relative_eq!(b[0], 0.5, epsilon = 1e-6);
    assert_relative_eq!(b[1], 0.0, epsilon = 1e-6);

    let mut m = vec![3.0_f32, 0.0, 0.0, -2.0];
    let mut s = vec![0.0_f32; 2];
    let mut u = vec![0.0_f32; 4];
    let mut vt = vec![0.0_f32; 4];
    singular_value_decomposition(true, &mut m, 2, 2, &mut s, &mut u, &mut vt).unwrap();
    assert_relative_eq!(s[0], 3.0, epsilon = 1e-6);
    assert_relative_eq!(s[1], 2.0, epsilon = 1e-6);
}

#[test]
fn test_control_from_partial_json() {
    let json = r#"{"qr_split_columns": 32, "svd_max_iterations": 50}"#;
    let control: Control = serde_json::from_str(json).unwrap();
    assert_eq!(control.qr_split_columns, 32);
    assert_eq!(control.svd_max_iterations, 50);
    assert_eq!(control.parallelize_order, Control::default().parallelize_order);
}

#[test]
fn test_provider_trait_object() {
    let provider: Box<dyn LinearAlgebraProvider<f64>> = Box::new(ManagedProvider);
    let mut rng = StdRng::seed_from_u64(59);
    let order = 10;
    let a = well_conditioned(&mut rng, order);
    let b = random_matrix(&mut rng, order, 1);

    let mut via_provider = b.clone();
    provider.lu_solve(1, &a, order, &mut via_provider).unwrap();
    let mut direct = b;
    lu_solve(1, &a, order, &mut direct).unwrap();
    assert_eq!(via_provider, direct);
}
