//! Parallel utilities with feature-gated implementations
//!
//! Fork-join primitives used by the kernels. With the `rayon` feature the work
//! runs on the global rayon pool; without it every primitive degrades to
//! sequential execution with identical results.
//!
//! Sibling tasks always receive disjoint mutable regions (split slices or
//! split `ndarray` views), so no primitive here needs locking.

use std::ops::Range;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Worker budget carried through recursive kernels.
///
/// `Rayon(0)` means "use every thread of the current pool".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parallelism {
    /// Run on the calling thread only
    None,
    /// Split across up to this many rayon workers
    Rayon(usize),
}

impl Parallelism {
    /// Number of workers this budget represents.
    pub fn degree(self) -> usize {
        match self {
            Parallelism::None => 1,
            Parallelism::Rayon(0) => available_threads(),
            Parallelism::Rayon(n) => n,
        }
    }

    /// Whether splitting work is worthwhile under this budget.
    #[inline]
    pub fn is_parallel(self) -> bool {
        is_parallel_available() && self.degree() > 1
    }
}

/// Check if parallel processing is available
#[cfg(feature = "rayon")]
pub fn is_parallel_available() -> bool {
    true
}

/// Check if parallel processing is available
#[cfg(not(feature = "rayon"))]
pub fn is_parallel_available() -> bool {
    false
}

/// Number of worker threads in the current pool
#[cfg(feature = "rayon")]
pub fn available_threads() -> usize {
    rayon::current_num_threads()
}

/// Number of worker threads (always 1 without rayon)
#[cfg(not(feature = "rayon"))]
pub fn available_threads() -> usize {
    1
}

/// Run two closures, in parallel when the budget allows.
///
/// Each side receives half of the budget so nested calls keep splitting
/// until it runs out.
pub fn join<A, B>(op_a: A, op_b: B, parallelism: Parallelism)
where
    A: FnOnce(Parallelism) + Send,
    B: FnOnce(Parallelism) + Send,
{
    #[cfg(feature = "rayon")]
    {
        let n_threads = parallelism.degree();
        if n_threads > 1 {
            let half = Parallelism::Rayon(n_threads - n_threads / 2);
            rayon::join(|| op_a(half), || op_b(half));
            return;
        }
    }

    #[cfg(not(feature = "rayon"))]
    let _ = parallelism;

    op_a(Parallelism::None);
    op_b(Parallelism::None);
}

/// Run four independent closures, in parallel when the budget allows.
///
/// The closures get no budget of their own and run sequentially inside
/// their task.
pub fn invoke4<A, B, C, D>(op_a: A, op_b: B, op_c: C, op_d: D, parallelism: Parallelism)
where
    A: FnOnce() + Send,
    B: FnOnce() + Send,
    C: FnOnce() + Send,
    D: FnOnce() + Send,
{
    join(
        |p| join(|_| op_a(), |_| op_b(), p),
        |p| join(|_| op_c(), |_| op_d(), p),
        parallelism,
    );
}

/// Apply `f(j, column)` to every `column_len`-sized chunk of a column-major
/// buffer, in parallel when `parallel` is set.
pub fn for_each_column_mut<T, F>(data: &mut [T], column_len: usize, parallel: bool, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    if column_len == 0 {
        return;
    }

    #[cfg(feature = "rayon")]
    {
        if parallel {
            data.par_chunks_mut(column_len)
                .enumerate()
                .for_each(|(j, column)| f(j, column));
            return;
        }
    }

    #[cfg(not(feature = "rayon"))]
    let _ = parallel;

    data.chunks_mut(column_len)
        .enumerate()
        .for_each(|(j, column)| f(j, column));
}

/// Parallel map with index
#[cfg(feature = "rayon")]
pub fn parallel_map_indexed<U, F>(count: usize, f: F) -> Vec<U>
where
    U: Send,
    F: Fn(usize) -> U + Sync + Send,
{
    (0..count).into_par_iter().map(f).collect()
}

/// Sequential map with index (fallback)
#[cfg(not(feature = "rayon"))]
pub fn parallel_map_indexed<U, F>(count: usize, f: F) -> Vec<U>
where
    F: Fn(usize) -> U,
{
    (0..count).map(f).collect()
}

/// Reduce `0..len` in fixed-size chunks.
///
/// Partial results are always combined in chunk order, so the result does not
/// depend on whether the chunks ran in parallel or on how many threads ran
/// them.
pub fn reduce_chunks<T, F, R>(
    len: usize,
    chunk: usize,
    parallel: bool,
    identity: T,
    map: F,
    reduce: R,
) -> T
where
    T: Send + Copy,
    F: Fn(Range<usize>) -> T + Sync + Send,
    R: Fn(T, T) -> T,
{
    let chunk = chunk.max(1);
    let n_chunks = len.div_ceil(chunk);
    let range_of = |c: usize| c * chunk..((c + 1) * chunk).min(len);

    let partials: Vec<T> = if parallel && n_chunks > 1 {
        parallel_map_indexed(n_chunks, |c| map(range_of(c)))
    } else {
        (0..n_chunks).map(|c| map(range_of(c))).collect()
    };

    partials.into_iter().fold(identity, reduce)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_map_indexed() {
        let result = parallel_map_indexed(5, |i| i * 2);
        assert_eq!(result, vec![0, 2, 4, 6, 8]);
    }

    #[test]
    fn test_join_runs_both_sides() {
        let mut left = 0;
        let mut right = 0;
        join(|_| left = 1, |_| right = 2, Parallelism::Rayon(0));
        assert_eq!((left, right), (1, 2));
    }

    #[test]
    fn test_invoke4_disjoint_writes() {
        let mut data = [0usize; 4];
        let (ab, cd) = data.split_at_mut(2);
        let (a, b) = ab.split_at_mut(1);
        let (c, d) = cd.split_at_mut(1);
        invoke4(
            || a[0] = 1,
            || b[0] = 2,
            || c[0] = 3,
            || d[0] = 4,
            Parallelism::Rayon(4),
        );
        assert_eq!(data, [1, 2, 3, 4]);
    }

    #[test]
    fn test_for_each_column_mut() {
        let mut data = vec![0usize; 12];
        for_each_column_mut(&mut data, 3, true, |j, column| {
            for (i, v) in column.iter_mut().enumerate() {
                *v = 10 * j + i;
            }
        });
        assert_eq!(data, vec![0, 1, 2, 10, 11, 12, 20, 21, 22, 30, 31, 32]);
    }

    #[test]
    fn test_reduce_chunks_is_order_stable() {
        let values: Vec<f64> = (0..1000).map(|i| 1.0 / (1.0 + i as f64)).collect();
        let sum = |parallel| {
            reduce_chunks(
                values.len(),
                64,
                parallel,
                0.0,
                |r| values[r].iter().sum::<f64>(),
                |acc, x| acc + x,
            )
        };
        assert_eq!(sum(true).to_bits(), sum(false).to_bits());
    }

    #[test]
    fn test_degree() {
        assert_eq!(Parallelism::None.degree(), 1);
        assert_eq!(Parallelism::Rayon(3).degree(), 3);
        assert!(Parallelism::Rayon(0).degree() >= 1);
        assert!(!Parallelism::None.is_parallel());
    }
}
