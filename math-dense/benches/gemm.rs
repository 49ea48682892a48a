use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use math_audio_dense::{
    Parallelism, Transpose, cholesky_factor, lu_factor, matrix_multiply_with_block,
    singular_value_decomposition,
};

fn test_matrix(rows: usize, cols: usize) -> Vec<f64> {
    (0..rows * cols).map(|i| ((i * 37) % 101) as f64 / 101.0 - 0.5).collect()
}

fn bench_gemm(c: &mut Criterion) {
    let mut group = c.benchmark_group("gemm");
    for &n in &[64usize, 128, 256] {
        let a = test_matrix(n, n);
        let b = test_matrix(n, n);
        let mut out = vec![0.0; n * n];

        let budgets = [("serial", Parallelism::None), ("rayon", Parallelism::Rayon(0))];
        for (label, parallelism) in budgets {
            group.bench_with_input(BenchmarkId::new(label, n), &n, |bench, &n| {
                bench.iter(|| {
                    matrix_multiply_with_block(
                        Transpose::DontTranspose,
                        Transpose::DontTranspose,
                        1.0,
                        black_box(&a),
                        n,
                        n,
                        black_box(&b),
                        n,
                        n,
                        0.0,
                        &mut out,
                        64,
                        parallelism,
                    )
                    .unwrap();
                })
            });
        }
    }
    group.finish();
}

fn bench_factorizations(c: &mut Criterion) {
    let n = 128;
    let mut spd = vec![0.0; n * n];
    let base = test_matrix(n, n);
    for j in 0..n {
        for i in 0..n {
            spd[j * n + i] = base[i * n + j] + base[j * n + i];
        }
        spd[j * n + j] += 2.0 * n as f64;
    }

    c.bench_function("lu_factor_128", |bench| {
        let mut pivot = vec![0; n];
        bench.iter(|| {
            let mut a = spd.clone();
            lu_factor(black_box(&mut a), n, &mut pivot).unwrap();
        })
    });

    c.bench_function("cholesky_factor_128", |bench| {
        bench.iter(|| {
            let mut a = spd.clone();
            cholesky_factor(black_box(&mut a), n).unwrap();
        })
    });

    c.bench_function("svd_values_64", |bench| {
        let m = 64;
        let source = test_matrix(m, m);
        let mut s = vec![0.0; m];
        let mut u = vec![0.0; m * m];
        let mut vt = vec![0.0; m * m];
        bench.iter(|| {
            let mut a = source.clone();
            let a = black_box(&mut a);
            singular_value_decomposition(false, a, m, m, &mut s, &mut u, &mut vt).unwrap();
        })
    });
}

criterion_group!(benches, bench_gemm, bench_factorizations);
criterion_main!(benches);
