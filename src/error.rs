//! Error types returned by callables and views.
//!
//! Both errors describe broken caller expectations rather than transient
//! conditions, so nothing in this crate retries after producing one.
//!
//! - [`UninitializedError`] is returned by the checked call forms
//!   ([`InplaceFn::try_call`], [`FnRef::try_call`], ...) when the callable is
//!   empty. The unchecked `call` forms panic with the same message instead.
//! - [`OutOfRangeError`] is returned by the checked accessors and slicing
//!   operations of [`PolySpan`] and [`PolySpanMut`].
//!
//! Capacity and alignment violations have no error type: a payload that does
//! not fit its holder is rejected at compile time.
//!
//! [`InplaceFn::try_call`]: crate::InplaceFn
//! [`FnRef::try_call`]: crate::FnRef
//! [`PolySpan`]: crate::PolySpan
//! [`PolySpanMut`]: crate::PolySpanMut

use derive_more::{Display, Error};

/// An empty callable was invoked.
///
/// # Examples
///
/// ```
/// use inplace::{FnRef, UninitializedError};
///
/// let empty = FnRef::<dyn Fn(u8) -> u8>::empty();
/// assert_eq!(empty.try_call(1), Err(UninitializedError));
/// assert_eq!(
///     UninitializedError.to_string(),
///     "invoked an uninitialized callable"
/// );
/// ```
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq, Hash)]
#[display("invoked an uninitialized callable")]
pub struct UninitializedError;

/// A position was outside of a view.
///
/// `index` is the offending position or count, and `len` is the length of the
/// view it was checked against.
///
/// # Examples
///
/// ```
/// use inplace::{OutOfRangeError, PolySpan};
///
/// let values = [1_u32, 2, 3];
/// let span = PolySpan::<u32>::new(&values);
/// assert_eq!(span.at(3), Err(OutOfRangeError { index: 3, len: 3 }));
/// ```
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq, Hash)]
#[display("index {index} is out of range for a view of length {len}")]
pub struct OutOfRangeError {
    /// The requested position or count.
    pub index: usize,
    /// The length of the view.
    pub len: usize,
}

impl OutOfRangeError {
    /// Creates the error and records it at `debug` level.
    #[inline]
    pub(crate) fn new(index: usize, len: usize) -> Self {
        tracing::debug!(index, len, "view access out of range");
        Self { index, len }
    }
}

/// Reports the invocation of an empty callable and panics.
///
/// This is the fatal path of the unchecked `call` forms.
#[cold]
#[track_caller]
pub(crate) fn uninitialized(callable: &'static str) -> ! {
    tracing::error!(callable, "{}", UninitializedError);
    panic!("{UninitializedError}")
}

/// Reports an out-of-range index and panics.
///
/// This is the fatal path of `Index` and `IndexMut`.
#[cold]
#[track_caller]
pub(crate) fn out_of_range(index: usize, len: usize) -> ! {
    panic!("{}", OutOfRangeError::new(index, len))
}

#[cfg(test)]
mod tests {
    use std::string::ToString;

    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            UninitializedError.to_string(),
            "invoked an uninitialized callable"
        );
        assert_eq!(
            OutOfRangeError { index: 4, len: 2 }.to_string(),
            "index 4 is out of range for a view of length 2"
        );
    }

    #[test]
    fn test_errors_are_core_errors() {
        fn assert_error<E: core::error::Error + Copy + Send + Sync + 'static>() {}

        assert_error::<UninitializedError>();
        assert_error::<OutOfRangeError>();
    }

    #[test]
    #[should_panic(expected = "invoked an uninitialized callable")]
    fn test_uninitialized_panics() {
        uninitialized("test");
    }

    #[test]
    #[should_panic(expected = "index 7 is out of range for a view of length 3")]
    fn test_out_of_range_panics() {
        out_of_range(7, 3);
    }
}
