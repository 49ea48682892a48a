//! Argument validation shared by every kernel entry point

use crate::error::{KernelError, Result};
use crate::traits::RealField;

/// Fail unless `len == expected`.
#[inline]
pub(crate) fn check_length(name: &'static str, len: usize, expected: usize) -> Result<()> {
    if len == expected {
        Ok(())
    } else {
        Err(KernelError::ArrayLength {
            name,
            expected,
            got: len,
        })
    }
}

/// Element count of a `rows x cols` matrix, failing instead of wrapping.
#[inline]
pub(crate) fn checked_size(name: &'static str, rows: usize, cols: usize) -> Result<usize> {
    rows.checked_mul(cols).ok_or(KernelError::ArrayLength {
        name,
        expected: usize::MAX,
        got: 0,
    })
}

/// Fail unless `len` is exactly `rows * cols`, without overflowing.
#[inline]
pub(crate) fn check_shape(name: &'static str, len: usize, rows: usize, cols: usize) -> Result<()> {
    match rows.checked_mul(cols) {
        Some(expected) => check_length(name, len, expected),
        None => Err(KernelError::ArrayLength {
            name,
            expected: usize::MAX,
            got: len,
        }),
    }
}

/// Fail unless `index < bound`.
#[inline]
pub(crate) fn check_index(name: &'static str, index: usize, bound: usize) -> Result<()> {
    if index < bound {
        Ok(())
    } else {
        Err(KernelError::IndexOutOfRange { name, index, bound })
    }
}

/// Fail unless every pivot entry addresses a row of an `order x order` matrix.
pub(crate) fn check_pivots(pivot: &[usize], order: usize) -> Result<()> {
    check_length("pivot", pivot.len(), order)?;
    match pivot.iter().enumerate().find(|&(_, &p)| p >= order) {
        Some((index, &value)) => Err(KernelError::PivotOutOfRange {
            index,
            value,
            order,
        }),
        None => Ok(()),
    }
}

/// Fail when two shared inputs are the very same buffer.
pub(crate) fn ensure_distinct<T>(
    first: &'static str,
    a: &[T],
    second: &'static str,
    b: &[T],
) -> Result<()> {
    if !a.is_empty() && a.len() == b.len() && std::ptr::eq(a.as_ptr(), b.as_ptr()) {
        return Err(KernelError::InvalidAliasing { first, second });
    }
    Ok(())
}

/// Work-query check: a short buffer gets `required` written to `work[0]`.
pub(crate) fn check_work<T: RealField>(work: &mut [T], required: usize) -> Result<()> {
    if work.len() < required {
        if let Some(first) = work.first_mut() {
            *first = T::from_count(required);
        }
        return Err(KernelError::WorkArrayTooSmall {
            required,
            got: work.len(),
        });
    }
    Ok(())
}

/// Report the minimum work size in `work[0]` after a successful call.
#[inline]
pub(crate) fn report_work_size<T: RealField>(work: &mut [T], required: usize) {
    if let Some(first) = work.first_mut() {
        *first = T::from_count(required);
    }
}
