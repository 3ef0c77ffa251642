use core::{
    fmt,
    marker::PhantomData,
    ops::{Index, IndexMut},
    ptr::NonNull,
};

use inplace_internals::RawStrided;

use super::{DYNAMIC_EXTENT, Iter, IterMut, PolySpan};
use crate::{
    Extends,
    error::{OutOfRangeError, out_of_range},
};

/// An exclusive, strided view of elements that all begin with a `T`.
///
/// Writing through a `&mut T` only touches the `T` prefix of each element, and
/// [`Extends`] guarantees that any valid `T` written there leaves the element
/// valid.
///
/// # Examples
///
/// ```
/// use inplace::{PolySpanMut, extends};
///
/// #[repr(C)]
/// struct Led {
///     on: bool,
/// }
///
/// #[repr(C)]
/// struct RgbLed {
///     led: Led,
///     rgb: [u8; 3],
/// }
///
/// extends!(RgbLed => Led, led);
///
/// let mut leds = [
///     RgbLed { led: Led { on: false }, rgb: [255, 0, 0] },
///     RgbLed { led: Led { on: false }, rgb: [0, 255, 0] },
/// ];
///
/// let mut view = PolySpanMut::<Led>::new(&mut leds);
/// view[1].on = true;
/// for led in view.iter_mut() {
///     led.on = !led.on;
/// }
/// assert!(leds[0].led.on && !leds[1].led.on);
/// assert_eq!(leds[1].rgb, [0, 255, 0]);
/// ```
pub struct PolySpanMut<'a, T, const E: usize = DYNAMIC_EXTENT> {
    raw: RawStrided<T>,
    _marker: PhantomData<&'a mut T>,
}

// SAFETY: A `PolySpanMut` behaves like `&mut [T]`.
unsafe impl<T: Send, const E: usize> Send for PolySpanMut<'_, T, E> {}

// SAFETY: Shared access only hands out `&T`.
unsafe impl<T: Sync, const E: usize> Sync for PolySpanMut<'_, T, E> {}

impl<'a, T> PolySpanMut<'a, T> {
    /// Creates a view over `slice`, with a stride of `size_of::<D>()`.
    ///
    /// Fails to compile if `D` is zero-sized.
    #[inline]
    pub fn new<D: Extends<T>>(slice: &'a mut [D]) -> Self {
        let len = slice.len();
        // SAFETY:
        // 1. The elements of `slice` are initialized and exclusively borrowed for
        //    `'a`
        // 2. `D: Extends<T>`, so every element begins with a valid `T`
        let raw = unsafe { RawStrided::new(NonNull::from(slice).cast::<D>(), len) };
        // SAFETY: `raw` covers exactly the elements of `slice`.
        unsafe { Self::from_raw(raw) }
    }

    /// Creates a view over `len` elements of type `D` starting at `ptr`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` is non-null and points to `len` consecutive, initialized `D`
    ///    values inside a single allocation.
    /// 2. Those values are not accessed other than through the view for `'a`.
    #[inline]
    pub unsafe fn from_raw_parts<D: Extends<T>>(ptr: *mut D, len: usize) -> Self {
        debug_assert!(!ptr.is_null());
        // SAFETY: `ptr` is non-null, as guaranteed by the caller.
        let ptr = unsafe { NonNull::new_unchecked(ptr) };
        // SAFETY:
        // 1. Guaranteed by the caller
        // 2. `D: Extends<T>`
        unsafe { Self::from_raw(RawStrided::new(ptr, len)) }
    }
}

impl<'a, T, const E: usize> PolySpanMut<'a, T, E> {
    /// Creates a view with a static extent over `array`.
    #[inline]
    pub fn from_array<D: Extends<T>>(array: &'a mut [D; E]) -> Self {
        // SAFETY:
        // 1. The elements of `array` are initialized and exclusively borrowed for
        //    `'a`
        // 2. `D: Extends<T>`, so every element begins with a valid `T`
        let raw = unsafe { RawStrided::new(NonNull::from(array).cast::<D>(), E) };
        // SAFETY: `raw` covers exactly the `E` elements of `array`.
        unsafe { Self::from_raw(raw) }
    }

    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `raw` upholds the invariants of [`RawStrided::from_slice`], with
    ///    elements exclusively borrowed for `'a`.
    /// 2. `E` is [`DYNAMIC_EXTENT`] or equal to `raw.len()`.
    #[inline]
    unsafe fn from_raw(raw: RawStrided<T>) -> Self {
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

    /// Returns the distance in bytes between consecutive elements.
    #[inline]
    pub fn element_size(&self) -> usize {
        self.raw.stride()
    }

    /// Returns the static extent, or `None` for a dynamic view.
    #[inline]
    pub fn extent(&self) -> Option<usize> {
        (E != DYNAMIC_EXTENT).then_some(E)
    }

    /// Borrows the elements as a shared view.
    #[inline]
    pub fn as_span(&self) -> PolySpan<'_, T, E> {
        // SAFETY: The elements are borrowed from `self` for the returned
        // lifetime, during which `self` cannot mutate them.
        unsafe { PolySpan::from_raw(self.raw) }
    }

    /// Reborrows the view for a shorter lifetime.
    #[inline]
    pub fn reborrow(&mut self) -> PolySpanMut<'_, T, E> {
        // SAFETY: The elements are exclusively borrowed from `self` for the
        // returned lifetime.
        unsafe { PolySpanMut::from_raw(self.raw) }
    }

    /// Returns the element at `index`, or `None` if it is out of range.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_span().get(index)
    }

    /// Returns the element at `index` mutably, or `None` if it is out of range.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len() {
            return None;
        }
        // SAFETY:
        // 1. `index < len` was just checked
        let mut ptr = unsafe { self.raw.element_ptr(index) };
        // SAFETY: The element is in bounds and exclusively borrowed through
        // `&mut self`.
        Some(unsafe { ptr.as_mut() })
    }

    /// Returns the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `index >= self.len()`.
    #[inline]
    pub fn at(&self, index: usize) -> Result<&T, OutOfRangeError> {
        self.get(index)
            .ok_or_else(|| OutOfRangeError::new(index, self.len()))
    }

    /// Returns the element at `index` mutably.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `index >= self.len()`.
    #[inline]
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, OutOfRangeError> {
        let len = self.len();
        self.get_mut(index)
            .ok_or_else(|| OutOfRangeError::new(index, len))
    }

    /// Returns an iterator over the elements.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        self.as_span().iter()
    }

    /// Returns an iterator over mutable references to the elements.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        // SAFETY: The elements are exclusively borrowed through `&mut self`.
        unsafe { IterMut::new(self.raw) }
    }

    /// Views the elements through `B`, a prefix of `T`. The stride is kept.
    #[inline]
    pub fn upcast<B>(self) -> PolySpanMut<'a, B, E>
    where
        T: Extends<B>,
    {
        // SAFETY:
        // 1. `T: Extends<B>`, and every element begins with a `T`
        let raw = unsafe { self.raw.cast::<B>() };
        // SAFETY: Same elements and length as `self`, and `T: Extends<B>`
        // makes every write of a valid `B` leave a valid `T`.
        unsafe { PolySpanMut::from_raw(raw) }
    }

    /// Forgets the static extent.
    #[inline]
    pub fn into_dynamic(self) -> PolySpanMut<'a, T> {
        // SAFETY: Same elements as `self`, and the result is dynamic.
        unsafe { PolySpanMut::from_raw(self.raw) }
    }
}

impl<T, const E: usize> Index<usize> for PolySpanMut<'_, T, E> {
    type Output = T;

    #[inline]
    #[track_caller]
    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(element) => element,
            None => out_of_range(index, self.len()),
        }
    }
}

impl<T, const E: usize> IndexMut<usize> for PolySpanMut<'_, T, E> {
    #[inline]
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len();
        match self.get_mut(index) {
            Some(element) => element,
            None => out_of_range(index, len),
        }
    }
}

impl<'a, T, const E: usize> From<PolySpanMut<'a, T, E>> for PolySpan<'a, T, E> {
    #[inline]
    fn from(span: PolySpanMut<'a, T, E>) -> Self {
        // SAFETY: The exclusive borrow for `'a` is given up for a shared one.
        unsafe { PolySpan::from_raw(span.raw) }
    }
}

impl<'a, T, D: Extends<T>> From<&'a mut [D]> for PolySpanMut<'a, T> {
    #[inline]
    fn from(slice: &'a mut [D]) -> Self {
        Self::new(slice)
    }
}

impl<'a, T, const E: usize> IntoIterator for PolySpanMut<'a, T, E> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    #[inline]
    fn into_iter(self) -> IterMut<'a, T> {
        // SAFETY: The exclusive borrow for `'a` moves into the iterator.
        unsafe { IterMut::new(self.raw) }
    }
}

impl<'s, T, const E: usize> IntoIterator for &'s mut PolySpanMut<'_, T, E> {
    type Item = &'s mut T;
    type IntoIter = IterMut<'s, T>;

    #[inline]
    fn into_iter(self) -> IterMut<'s, T> {
        self.iter_mut()
    }
}

impl<'s, T, const E: usize> IntoIterator for &'s PolySpanMut<'_, T, E> {
    type Item = &'s T;
    type IntoIter = Iter<'s, T>;

    #[inline]
    fn into_iter(self) -> Iter<'s, T> {
        self.iter()
    }
}

impl<T: fmt::Debug, const E: usize> fmt::Debug for PolySpanMut<'_, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
