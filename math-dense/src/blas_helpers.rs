//! Level-1 vector operations
//!
//! AXPY, scaling, dot products and elementwise arithmetic over slices. Every
//! function validates lengths before writing. Vectors at least
//! [`Control::parallelize_elements`] long are processed with rayon when the
//! installed [`Control`] allows it; the result is identical either way.
//!
//! Binary operations come in two forms: `op(x, y, result)` writes a separate
//! output, `op_in_place(x, y)` overwrites `x`.

use crate::checks::check_length;
use crate::config::Control;
use crate::error::Result;
use crate::parallel;
use crate::traits::RealField;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Elements per partial sum in [`dot_product`].
const DOT_CHUNK: usize = 1024;

fn use_parallel(len: usize) -> bool {
    Control::global().worth_parallelizing(len)
}

/// `result[i] = f(x[i], y[i])`
fn zip_into<T, F>(x: &[T], y: &[T], result: &mut [T], f: F)
where
    T: RealField,
    F: Fn(T, T) -> T + Sync + Send,
{
    #[cfg(feature = "rayon")]
    {
        if use_parallel(result.len()) {
            result
                .par_iter_mut()
                .zip(x.par_iter().zip(y.par_iter()))
                .for_each(|(r, (&a, &b))| *r = f(a, b));
            return;
        }
    }

    for ((r, &a), &b) in result.iter_mut().zip(x).zip(y) {
        *r = f(a, b);
    }
}

/// `x[i] = f(x[i], y[i])`
fn zip_in_place<T, F>(x: &mut [T], y: &[T], f: F)
where
    T: RealField,
    F: Fn(T, T) -> T + Sync + Send,
{
    #[cfg(feature = "rayon")]
    {
        if use_parallel(x.len()) {
            x.par_iter_mut()
                .zip(y.par_iter())
                .for_each(|(a, &b)| *a = f(*a, b));
            return;
        }
    }

    for (a, &b) in x.iter_mut().zip(y) {
        *a = f(*a, b);
    }
}

/// `result[i] = f(x[i])`
fn map_into<T, F>(x: &[T], result: &mut [T], f: F)
where
    T: RealField,
    F: Fn(T) -> T + Sync + Send,
{
    #[cfg(feature = "rayon")]
    {
        if use_parallel(result.len()) {
            result
                .par_iter_mut()
                .zip(x.par_iter())
                .for_each(|(r, &a)| *r = f(a));
            return;
        }
    }

    for (r, &a) in result.iter_mut().zip(x) {
        *r = f(a);
    }
}

fn check_binary<T>(x: &[T], y: &[T]) -> Result<()> {
    check_length("y", y.len(), x.len())
}

fn check_binary_into<T>(x: &[T], y: &[T], result: &[T]) -> Result<()> {
    check_binary(x, y)?;
    check_length("result", result.len(), x.len())
}

/// `result = y + alpha * x`
pub fn add_vector_to_scaled_vector<T: RealField>(
    y: &[T],
    alpha: T,
    x: &[T],
    result: &mut [T],
) -> Result<()> {
    check_length("x", x.len(), y.len())?;
    check_length("result", result.len(), y.len())?;

    if alpha.is_zero() {
        result.copy_from_slice(y);
    } else if alpha == T::one() {
        zip_into(y, x, result, |a, b| a + b);
    } else {
        zip_into(y, x, result, |a, b| a + alpha * b);
    }
    Ok(())
}

/// `y = y + alpha * x`
pub fn add_vector_to_scaled_vector_in_place<T: RealField>(
    y: &mut [T],
    alpha: T,
    x: &[T],
) -> Result<()> {
    check_length("x", x.len(), y.len())?;

    if alpha.is_zero() {
        return Ok(());
    }
    if alpha == T::one() {
        zip_in_place(y, x, |a, b| a + b);
    } else {
        zip_in_place(y, x, |a, b| a + alpha * b);
    }
    Ok(())
}

/// `result = alpha * x`
///
/// `alpha == 0` clears `result` without reading `x`.
pub fn scale_array<T: RealField>(alpha: T, x: &[T], result: &mut [T]) -> Result<()> {
    check_length("result", result.len(), x.len())?;

    if alpha.is_zero() {
        result.fill(T::zero());
    } else if alpha == T::one() {
        result.copy_from_slice(x);
    } else {
        map_into(x, result, |a| alpha * a);
    }
    Ok(())
}

/// `x = alpha * x`
pub fn scale_array_in_place<T: RealField>(alpha: T, x: &mut [T]) -> Result<()> {
    if alpha.is_zero() {
        x.fill(T::zero());
    } else if alpha != T::one() {
        #[cfg(feature = "rayon")]
        {
            if use_parallel(x.len()) {
                x.par_iter_mut().for_each(|v| *v *= alpha);
                return Ok(());
            }
        }
        for v in x.iter_mut() {
            *v *= alpha;
        }
    }
    Ok(())
}

/// `Σ x[i] * y[i]`
///
/// Summed in fixed chunks of 1024 whose partial sums are added in order, so
/// the value is the same for every thread count.
pub fn dot_product<T: RealField>(x: &[T], y: &[T]) -> Result<T> {
    check_binary(x, y)?;
    Ok(parallel::reduce_chunks(
        x.len(),
        DOT_CHUNK,
        use_parallel(x.len()),
        T::zero(),
        |range| dot(&x[range.clone()], &y[range]),
        |acc, partial| acc + partial,
    ))
}

/// `result = x + y`
pub fn add_arrays<T: RealField>(x: &[T], y: &[T], result: &mut [T]) -> Result<()> {
    check_binary_into(x, y, result)?;
    zip_into(x, y, result, |a, b| a + b);
    Ok(())
}

/// `x = x + y`
pub fn add_arrays_in_place<T: RealField>(x: &mut [T], y: &[T]) -> Result<()> {
    check_binary(x, y)?;
    zip_in_place(x, y, |a, b| a + b);
    Ok(())
}

/// `result = x - y`
pub fn subtract_arrays<T: RealField>(x: &[T], y: &[T], result: &mut [T]) -> Result<()> {
    check_binary_into(x, y, result)?;
    zip_into(x, y, result, |a, b| a - b);
    Ok(())
}

/// `x = x - y`
pub fn subtract_arrays_in_place<T: RealField>(x: &mut [T], y: &[T]) -> Result<()> {
    check_binary(x, y)?;
    zip_in_place(x, y, |a, b| a - b);
    Ok(())
}

/// `result[i] = x[i] * y[i]`
pub fn point_wise_multiply_arrays<T: RealField>(x: &[T], y: &[T], result: &mut [T]) -> Result<()> {
    check_binary_into(x, y, result)?;
    zip_into(x, y, result, |a, b| a * b);
    Ok(())
}

/// `x[i] = x[i] * y[i]`
pub fn point_wise_multiply_arrays_in_place<T: RealField>(x: &mut [T], y: &[T]) -> Result<()> {
    check_binary(x, y)?;
    zip_in_place(x, y, |a, b| a * b);
    Ok(())
}

/// `result[i] = x[i] / y[i]`
///
/// Division by zero follows IEEE semantics.
pub fn point_wise_divide_arrays<T: RealField>(x: &[T], y: &[T], result: &mut [T]) -> Result<()> {
    check_binary_into(x, y, result)?;
    zip_into(x, y, result, |a, b| a / b);
    Ok(())
}

/// `x[i] = x[i] / y[i]`
pub fn point_wise_divide_arrays_in_place<T: RealField>(x: &mut [T], y: &[T]) -> Result<()> {
    check_binary(x, y)?;
    zip_in_place(x, y, |a, b| a / b);
    Ok(())
}

/// `result[i] = x[i] ^ y[i]`
pub fn point_wise_power_arrays<T: RealField>(x: &[T], y: &[T], result: &mut [T]) -> Result<()> {
    check_binary_into(x, y, result)?;
    zip_into(x, y, result, |a, b| a.powf(b));
    Ok(())
}

/// `x[i] = x[i] ^ y[i]`
pub fn point_wise_power_arrays_in_place<T: RealField>(x: &mut [T], y: &[T]) -> Result<()> {
    check_binary(x, y)?;
    zip_in_place(x, y, |a, b| a.powf(b));
    Ok(())
}

/// Unchecked sequential dot product used inside the factorizations.
///
/// Callers guarantee equal lengths; extra elements of the longer slice are
/// ignored.
#[inline]
pub(crate) fn dot<T: RealField>(x: &[T], y: &[T]) -> T {
    let mut sum = T::zero();
    for (&xi, &yi) in x.iter().zip(y) {
        sum += xi * yi;
    }
    sum
}

/// `y += alpha * x`, unchecked.
#[inline]
pub(crate) fn axpy<T: RealField>(alpha: T, x: &[T], y: &mut [T]) {
    for (&xi, yi) in x.iter().zip(y.iter_mut()) {
        *yi += alpha * xi;
    }
}

/// Euclidean norm `sqrt(sum x_i^2)`, accumulated as `scale * sqrt(ssq)` so
/// that neither overflow nor underflow occurs for representable results.
///
/// NaN anywhere gives NaN; otherwise an infinite entry gives infinity.
pub fn vector_norm<T: RealField>(x: &[T]) -> T {
    let mut scale = T::zero();
    let mut ssq = T::one();
    let mut infinite = false;
    for &value in x {
        if value.is_nan() {
            return T::nan();
        }
        if value.is_infinite() {
            infinite = true;
            continue;
        }
        if !value.is_zero() {
            let magnitude = value.abs();
            if scale < magnitude {
                let ratio = scale / magnitude;
                ssq = T::one() + ssq * ratio * ratio;
                scale = magnitude;
            } else {
                let ratio = magnitude / scale;
                ssq += ratio * ratio;
            }
        }
    }
    if infinite { T::infinity() } else { scale * ssq.sqrt() }
}
