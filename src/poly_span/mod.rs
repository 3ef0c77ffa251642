//! Strided views over arrays of derived types.
//!
//! A [`PolySpan<'a, Base>`] over `&'a [Derived]` yields `&Base` for every
//! element, stepping by `size_of::<Derived>()` instead of
//! `size_of::<Base>()`. Indexing a plain `&[Base]` that was produced by a
//! pointer cast would land in the middle of elements as soon as `Derived` is
//! larger than `Base`; a [`PolySpan`] cannot, because it keeps the stride of the
//! array it was built from.
//!
//! The element type `D` must implement [`Extends<Base>`], normally through the
//! [`extends!`](crate::extends) macro.
//!
//! The extent `E` is either [`DYNAMIC_EXTENT`], when the number of elements is
//! only known at runtime, or a fixed count that is part of the type. Views with
//! a fixed extent come from [`PolySpan::from_array`] and
//! [`PolySpan::first_const`] / [`PolySpan::last_const`].
//!
//! [`PolySpan<'a, Base>`]: PolySpan
//! [`Extends<Base>`]: crate::Extends

use core::{fmt, marker::PhantomData, ops::Index, ptr::NonNull};

use inplace_internals::RawStrided;

use crate::{
    Extends,
    error::{OutOfRangeError, out_of_range},
};

mod cursor;
mod iter;
mod span_mut;

pub use self::{
    cursor::Cursor,
    iter::{Iter, IterMut},
    span_mut::PolySpanMut,
};

/// The extent of a view whose length is only known at runtime.
pub const DYNAMIC_EXTENT: usize = usize::MAX;

/// A shared, strided view of elements that all begin with a `T`.
///
/// # Examples
///
/// ```
/// use inplace::{PolySpan, extends};
///
/// #[repr(C)]
/// struct Channel {
///     id: u8,
/// }
///
/// #[repr(C)]
/// struct AdcChannel {
///     channel: Channel,
///     gain: f32,
///     offset: f32,
/// }
///
/// extends!(AdcChannel => Channel, channel);
///
/// let channels = [
///     AdcChannel { channel: Channel { id: 1 }, gain: 1.0, offset: 0.0 },
///     AdcChannel { channel: Channel { id: 2 }, gain: 2.0, offset: 0.5 },
/// ];
///
/// let view = PolySpan::<Channel>::new(&channels);
/// assert_eq!(view.element_size(), size_of::<AdcChannel>());
/// assert_eq!(view.iter().map(|channel| channel.id).collect::<Vec<_>>(), [1, 2]);
/// assert!(view.at(2).is_err());
/// ```
pub struct PolySpan<'a, T, const E: usize = DYNAMIC_EXTENT> {
    raw: RawStrided<T>,
    _marker: PhantomData<&'a T>,
}

// SAFETY: A `PolySpan` only hands out `&T`, so it behaves like `&[T]`.
unsafe impl<T: Sync, const E: usize> Send for PolySpan<'_, T, E> {}

// SAFETY: See the `Send` implementation above.
unsafe impl<T: Sync, const E: usize> Sync for PolySpan<'_, T, E> {}

impl<'a, T> PolySpan<'a, T> {
    /// Creates a view over `slice`, with a stride of `size_of::<D>()`.
    ///
    /// Fails to compile if `D` is zero-sized.
    #[inline]
    pub fn new<D: Extends<T>>(slice: &'a [D]) -> Self {
        // SAFETY:
        // 1. The elements of `slice` are initialized and borrowed for `'a`
        // 2. `D: Extends<T>`, so every element begins with a valid `T`
        let raw = unsafe { RawStrided::new(NonNull::from(slice).cast::<D>(), slice.len()) };
        // SAFETY: `raw` covers exactly the elements of `slice`.
        unsafe { Self::from_raw(raw) }
    }

    /// Creates a view over `len` elements of type `D` starting at `ptr`.
    ///
    /// A null `ptr` is accepted when `len` is 0.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to `len` consecutive, initialized `D` values inside a
    ///    single allocation.
    /// 2. Those values are not mutated for `'a`, except through interior
    ///    mutability of `T`.
    #[inline]
    pub unsafe fn from_raw_parts<D: Extends<T>>(ptr: *const D, len: usize) -> Self {
        let ptr = match NonNull::new(ptr.cast_mut()) {
            Some(ptr) => ptr,
            None => {
                debug_assert_eq!(len, 0, "a null pointer can only describe an empty view");
                NonNull::dangling()
            }
        };
        // SAFETY:
        // 1. Guaranteed by the caller
        // 2. `D: Extends<T>`
        unsafe { Self::from_raw(RawStrided::new(ptr, len)) }
    }

    /// Creates a view over the elements of type `D` in `[begin, end)`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `begin` and `end` point into, or one past the end of, the same
    ///    array of initialized `D` values, with `begin <= end`.
    /// 2. Those values are not mutated for `'a`, except through interior
    ///    mutability of `T`.
    #[inline]
    pub unsafe fn from_ptr_range<D: Extends<T>>(begin: *const D, end: *const D) -> Self {
        // SAFETY: Both pointers belong to one array and `begin <= end`, as
        // guaranteed by the caller.
        let len = unsafe { end.offset_from_unsigned(begin) };
        // SAFETY: `[begin, end)` holds `len` initialized values that the caller
        // keeps unchanged for `'a`.
        unsafe { Self::from_raw_parts(begin, len) }
    }
}

impl<'a, T, const E: usize> PolySpan<'a, T, E> {
    /// Creates a view with a static extent over `array`.
    ///
    /// # Examples
    ///
    /// ```
    /// use inplace::PolySpan;
    ///
    /// let values = [1_u16, 2, 3];
    /// let view: PolySpan<'_, u16, 3> = PolySpan::from_array(&values);
    /// assert_eq!(view.extent(), Some(3));
    /// ```
    #[inline]
    pub fn from_array<D: Extends<T>>(array: &'a [D; E]) -> Self {
        // SAFETY:
        // 1. The elements of `array` are initialized and borrowed for `'a`
        // 2. `D: Extends<T>`, so every element begins with a valid `T`
        let raw = unsafe { RawStrided::new(NonNull::from(array).cast::<D>(), E) };
        // SAFETY: `raw` covers exactly the elements of `array`, and there are
        // `E` of them.
        unsafe { Self::from_raw(raw) }
    }

    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `raw` upholds the invariants of [`RawStrided::from_slice`] for `'a`,
    ///    with elements that are not mutated except through interior
    ///    mutability.
    /// 2. `E` is [`DYNAMIC_EXTENT`] or equal to `raw.len()`.
    #[inline]
    pub(crate) unsafe fn from_raw(raw: RawStrided<T>) -> Self {
        debug_assert!(E == DYNAMIC_EXTENT || E == raw.len());
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Returns the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the view has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the size in bytes of the source elements, which is the
    /// distance between consecutive elements.
    #[inline]
    pub fn element_size(&self) -> usize {
        self.raw.stride()
    }

    /// Returns the static extent, or `None` for a dynamic view.
    #[inline]
    pub fn extent(&self) -> Option<usize> {
        (E != DYNAMIC_EXTENT).then_some(E)
    }

    /// Returns the element at `index` without a bounds check.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `index < self.len()`.
    #[inline]
    pub unsafe fn get_unchecked(&self, index: usize) -> &'a T {
        debug_assert!(index < self.len());
        // SAFETY:
        // 1. `index < len` is guaranteed by the caller, so `index <= len`
        let ptr = unsafe { self.raw.element_ptr(index) };
        // SAFETY: The element is in bounds, begins with a valid `T` and is
        // borrowed for `'a`.
        unsafe { ptr.as_ref() }
    }

    /// Returns the element at `index`, or `None` if it is out of range.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&'a T> {
        if index < self.len() {
            // SAFETY: `index < len` was just checked.
            Some(unsafe { self.get_unchecked(index) })
        } else {
            None
        }
    }

    /// Returns the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `index >= self.len()`.
    #[inline]
    pub fn at(&self, index: usize) -> Result<&'a T, OutOfRangeError> {
        self.get(index)
            .ok_or_else(|| OutOfRangeError::new(index, self.len()))
    }

    /// Returns the first element, if any.
    #[inline]
    pub fn front(&self) -> Option<&'a T> {
        self.get(0)
    }

    /// Returns the last element, if any.
    #[inline]
    pub fn back(&self) -> Option<&'a T> {
        self.get(self.len().checked_sub(1)?)
    }

    /// Returns the elements starting at `pos`, at most `count` of them.
    ///
    /// `None` takes every element from `pos` on. A `count` that reaches past
    /// the end is clamped.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `pos > self.len()`. A `pos` equal to
    /// the length gives an empty view.
    pub fn subspan(
        &self,
        pos: usize,
        count: Option<usize>,
    ) -> Result<PolySpan<'a, T>, OutOfRangeError> {
        let len = self.len();
        if pos > len {
            return Err(OutOfRangeError::new(pos, len));
        }
        let rest = len - pos;
        let count = count.map_or(rest, |count| count.min(rest));
        // SAFETY: `pos + count <= pos + rest == len`.
        let raw = unsafe { self.raw.slice(pos, count) };
        // SAFETY: `raw` is a part of `self.raw`, and the result is dynamic.
        Ok(unsafe { PolySpan::from_raw(raw) })
    }

    /// Returns the first `count` elements.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `count > self.len()`.
    #[inline]
    pub fn first(&self, count: usize) -> Result<PolySpan<'a, T>, OutOfRangeError> {
        let raw = self.prefix(count)?;
        // SAFETY: `raw` is a part of `self.raw`, and the result is dynamic.
        Ok(unsafe { PolySpan::from_raw(raw) })
    }

    /// Returns the last `count` elements.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `count > self.len()`.
    #[inline]
    pub fn last(&self, count: usize) -> Result<PolySpan<'a, T>, OutOfRangeError> {
        let raw = self.suffix(count)?;
        // SAFETY: `raw` is a part of `self.raw`, and the result is dynamic.
        Ok(unsafe { PolySpan::from_raw(raw) })
    }

    /// Returns the first `N` elements as a view with a static extent.
    ///
    /// Fails to compile if this view has a static extent smaller than `N`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `N > self.len()`.
    #[inline]
    pub fn first_const<const N: usize>(&self) -> Result<PolySpan<'a, T, N>, OutOfRangeError> {
        const {
            assert!(
                E == DYNAMIC_EXTENT || N <= E,
                "the requested extent exceeds the extent of the view"
            );
        }
        let raw = self.prefix(N)?;
        // SAFETY: `raw` is a part of `self.raw` with exactly `N` elements.
        Ok(unsafe { PolySpan::from_raw(raw) })
    }

    /// Returns the last `N` elements as a view with a static extent.
    ///
    /// Fails to compile if this view has a static extent smaller than `N`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `N > self.len()`.
    #[inline]
    pub fn last_const<const N: usize>(&self) -> Result<PolySpan<'a, T, N>, OutOfRangeError> {
        const {
            assert!(
                E == DYNAMIC_EXTENT || N <= E,
                "the requested extent exceeds the extent of the view"
            );
        }
        let raw = self.suffix(N)?;
        // SAFETY: `raw` is a part of `self.raw` with exactly `N` elements.
        Ok(unsafe { PolySpan::from_raw(raw) })
    }

    fn prefix(&self, count: usize) -> Result<RawStrided<T>, OutOfRangeError> {
        if count > self.len() {
            return Err(OutOfRangeError::new(count, self.len()));
        }
        // SAFETY: `0 + count <= len` was just checked.
        Ok(unsafe { self.raw.slice(0, count) })
    }

    fn suffix(&self, count: usize) -> Result<RawStrided<T>, OutOfRangeError> {
        let len = self.len();
        if count > len {
            return Err(OutOfRangeError::new(count, len));
        }
        // SAFETY: `(len - count) + count == len`.
        Ok(unsafe { self.raw.slice(len - count, count) })
    }

    /// Returns `true` if both views start at the same address and have the
    /// same length and stride.
    ///
    /// Elements are not compared.
    #[inline]
    pub fn equal_view<const E2: usize>(&self, other: &PolySpan<'_, T, E2>) -> bool {
        self.raw.same_as(other.raw)
    }

    /// Returns an iterator over the elements.
    #[inline]
    pub fn iter(&self) -> Iter<'a, T> {
        // SAFETY: The elements of `raw` are borrowed for `'a`.
        unsafe { Iter::new(self.raw) }
    }

    /// Returns a cursor at the first element.
    #[inline]
    pub fn begin(&self) -> Cursor<'a, T> {
        // SAFETY: The elements of `raw` are borrowed for `'a`.
        unsafe { Cursor::new(self.raw, 0) }
    }

    /// Returns a cursor one past the last element.
    #[inline]
    pub fn end(&self) -> Cursor<'a, T> {
        // SAFETY: The elements of `raw` are borrowed for `'a`.
        unsafe { Cursor::new(self.raw, self.len().cast_signed()) }
    }

    /// Views the elements through `B`, a prefix of `T`. The stride is kept.
    #[inline]
    pub fn upcast<B>(self) -> PolySpan<'a, B, E>
    where
        T: Extends<B>,
    {
        // SAFETY:
        // 1. `T: Extends<B>`, and every element begins with a `T`
        let raw = unsafe { self.raw.cast::<B>() };
        // SAFETY: Same elements and length as `self`.
        unsafe { PolySpan::from_raw(raw) }
    }

    /// Forgets the static extent.
    #[inline]
    pub fn into_dynamic(self) -> PolySpan<'a, T> {
        // SAFETY: Same elements as `self`, and the result is dynamic.
        unsafe { PolySpan::from_raw(self.raw) }
    }
}

impl<T> Default for PolySpan<'_, T> {
    #[inline]
    fn default() -> Self {
        Self::new::<T>(&[])
    }
}

impl<T, const E: usize> Clone for PolySpan<'_, T, E> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, const E: usize> Copy for PolySpan<'_, T, E> {}

impl<T, const E: usize> Index<usize> for PolySpan<'_, T, E> {
    type Output = T;

    /// # Panics
    ///
    /// Panics with [`OutOfRangeError`] if `index >= self.len()`.
    #[inline]
    #[track_caller]
    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(element) => element,
            None => out_of_range(index, self.len()),
        }
    }
}

impl<'a, T, D: Extends<T>> From<&'a [D]> for PolySpan<'a, T> {
    #[inline]
    fn from(slice: &'a [D]) -> Self {
        Self::new(slice)
    }
}

impl<'a, T, D: Extends<T>, const N: usize> From<&'a [D; N]> for PolySpan<'a, T> {
    #[inline]
    fn from(array: &'a [D; N]) -> Self {
        Self::new(array.as_slice())
    }
}

impl<'a, T, const E: usize> IntoIterator for PolySpan<'a, T, E> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T, const E: usize> IntoIterator for &PolySpan<'a, T, E> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<T: fmt::Debug, const E: usize> fmt::Debug for PolySpan<'_, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C)]
    #[derive(Debug)]
    struct Base {
        id: u64,
    }

    #[repr(C)]
    struct Derived {
        base: Base,
        extra: [u64; 2],
    }

    crate::extends!(Derived => Base, base);

    fn derived(ids: [u64; 3]) -> [Derived; 3] {
        ids.map(|id| Derived {
            base: Base { id },
            extra: [id * 10, id * 100],
        })
    }

    #[test]
    fn test_poly_span_stride() {
        let elements = derived([1, 2, 3]);
        let span = PolySpan::<Base>::new(&elements);
        assert_eq!(span.len(), 3);
        assert_eq!(span.element_size(), 24);
        assert_eq!(span.extent(), None);
        assert_eq!(span[1].id, 2);
        assert!(core::ptr::eq(&span[2], &elements[2].base));
        assert_eq!(elements[2].extra, [30, 300]);
    }

    #[test]
    fn test_poly_span_checked_access() {
        let elements = derived([4, 5, 6]);
        let span = PolySpan::<Base>::new(&elements);
        assert_eq!(span.at(0).map(|base| base.id), Ok(4));
        assert_eq!(span.at(3).err(), Some(OutOfRangeError { index: 3, len: 3 }));
        assert!(span.get(3).is_none());
        assert_eq!(span.front().map(|base| base.id), Some(4));
        assert_eq!(span.back().map(|base| base.id), Some(6));

        let empty = PolySpan::<Base>::default();
        assert!(empty.is_empty());
        assert!(empty.front().is_none());
        assert!(empty.back().is_none());
    }

    #[test]
    #[should_panic(expected = "index 3 is out of range for a view of length 3")]
    fn test_poly_span_index_panics() {
        let elements = derived([1, 2, 3]);
        let span = PolySpan::<Base>::new(&elements);
        let _ = &span[3];
    }

    #[test]
    fn test_poly_span_subspan() {
        let elements = derived([1, 2, 3]);
        let span = PolySpan::<Base>::new(&elements);

        let tail = span.subspan(1, None).unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].id, 2);
        assert_eq!(tail.element_size(), 24);

        assert_eq!(span.subspan(1, Some(10)).unwrap().len(), 2);
        assert_eq!(span.subspan(0, Some(1)).unwrap().len(), 1);
        assert!(span.subspan(3, None).unwrap().is_empty());
        assert_eq!(
            span.subspan(4, None).err(),
            Some(OutOfRangeError { index: 4, len: 3 })
        );
    }

    #[test]
    fn test_poly_span_first_last() {
        let elements = derived([1, 2, 3]);
        let span = PolySpan::<Base>::new(&elements);

        assert_eq!(span.first(2).unwrap().back().map(|base| base.id), Some(2));
        assert_eq!(span.last(1).unwrap()[0].id, 3);
        assert!(span.first(4).is_err());
        assert!(span.last(4).is_err());

        let head = span.first_const::<2>().unwrap();
        assert_eq!(head.extent(), Some(2));
        assert_eq!(head[1].id, 2);
        let tail = span.last_const::<1>().unwrap();
        assert_eq!(tail[0].id, 3);
        assert!(span.first_const::<4>().is_err());
    }

    #[test]
    fn test_poly_span_static_extent() {
        let elements = derived([7, 8, 9]);
        let span: PolySpan<'_, Base, 3> = PolySpan::from_array(&elements);
        assert_eq!(span.extent(), Some(3));
        assert_eq!(span.len(), 3);

        let dynamic = span.into_dynamic();
        assert_eq!(dynamic.extent(), None);
        assert!(dynamic.equal_view(&span));
        assert!(span.first_const::<3>().is_ok());
    }

    #[test]
    fn test_poly_span_equal_view() {
        let elements = derived([1, 2, 3]);
        let span = PolySpan::<Base>::new(&elements);
        let same = PolySpan::<Base>::from(&elements);
        assert!(span.equal_view(&same));
        assert!(!span.equal_view(&span.first(2).unwrap()));
        assert!(!span.equal_view(&span.last(3).unwrap().subspan(1, None).unwrap()));

        let other = derived([1, 2, 3]);
        assert!(!span.equal_view(&PolySpan::new(&other)));
    }

    #[test]
    fn test_poly_span_raw_parts() {
        let elements = derived([1, 2, 3]);
        let range = elements.as_ptr_range();

        // SAFETY: `elements` outlives the view and is not mutated.
        let from_parts = unsafe { PolySpan::<Base>::from_raw_parts(range.start, 3) };
        // SAFETY: Both pointers delimit `elements`.
        let from_range = unsafe { PolySpan::<Base>::from_ptr_range(range.start, range.end) };
        assert!(from_parts.equal_view(&from_range));
        assert_eq!(from_range.element_size(), 24);

        // SAFETY: A null pointer with a length of 0 describes no elements.
        let empty = unsafe { PolySpan::<Base>::from_raw_parts(core::ptr::null::<Derived>(), 0) };
        assert!(empty.is_empty());
    }

    #[test]
    fn test_poly_span_upcast() {
        #[repr(C)]
        struct Extended {
            derived: Derived,
            flag: bool,
        }

        crate::extends!(Extended => Derived, derived);

        let elements = [Extended {
            derived: Derived {
                base: Base { id: 11 },
                extra: [0; 2],
            },
            flag: true,
        }];
        let span = PolySpan::<Derived>::new(&elements);
        let base = span.upcast::<Base>();
        assert_eq!(base.element_size(), size_of::<Extended>());
        assert_eq!(base[0].id, 11);
        assert!(elements[0].flag);
    }

    #[test]
    fn test_poly_span_debug() {
        let elements = derived([1, 2, 3]);
        let span = PolySpan::<Base>::new(&elements);
        assert_eq!(
            std::format!("{span:?}"),
            "[Base { id: 1 }, Base { id: 2 }, Base { id: 3 }]"
        );
    }
}
