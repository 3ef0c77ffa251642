//! Pointer, count and stride triples.
//!
//! A [`RawStrided<T>`] describes `len` elements starting at `ptr`, spaced
//! `stride` bytes apart. Each element starts with a `T`, but the element itself
//! may be larger than `T`. This is how an array of a larger type is traversed
//! through a smaller, layout-compatible prefix type without slicing.
//!
//! # Safety Invariant
//!
//! Every element address is computed by [`RawStrided::element_ptr`] or, for
//! positions that may lie outside the range, by
//! [`RawStrided::wrapping_element_ptr`]. No other code in this workspace does
//! arithmetic on element addresses.
//!
//! A [`RawStrided`] that was created by [`RawStrided::from_slice`] (or by
//! slicing such a value) upholds:
//!
//! 1. `ptr` points to the first of `len` elements of one allocation.
//! 2. `stride` is the size of the source element type, which is not zero.
//! 3. Each element begins with a valid, initialized `T`.
//!
//! [`RawStrided::new`] and [`RawStrided::cast`] hand those obligations to the
//! caller.

use core::{marker::PhantomData, mem::size_of, ptr::NonNull};

/// `len` elements of at least `T`, `stride` bytes apart.
///
/// This type does not carry a lifetime. Safe wrappers attach one and decide
/// whether the elements may be read or written.
pub struct RawStrided<T> {
    /// Address of the first element.
    ptr: NonNull<T>,
    /// Number of elements.
    len: usize,
    /// Distance in bytes between the starts of consecutive elements.
    stride: usize,
    /// Variance and auto traits follow a raw pointer to `T`.
    _marker: PhantomData<*const T>,
}

impl<T> Clone for RawStrided<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RawStrided<T> {}

impl<T> RawStrided<T> {
    /// Creates a [`RawStrided`] over the elements of `slice`, with a stride of
    /// `size_of::<T>()`.
    ///
    /// Fails to compile if `T` is zero-sized, as a zero stride would make all
    /// elements alias.
    #[inline]
    pub fn from_slice(slice: &[T]) -> Self {
        const {
            assert!(
                size_of::<T>() != 0,
                "cannot build a strided view over zero-sized elements"
            );
        }
        Self {
            ptr: NonNull::from(slice).cast::<T>(),
            len: slice.len(),
            stride: size_of::<T>(),
            _marker: PhantomData,
        }
    }

    /// Creates a [`RawStrided`] over elements of the type `D`, starting at
    /// `ptr`.
    ///
    /// Fails to compile if `D` is zero-sized.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to `len` consecutive, initialized `D` values inside a
    ///    single allocation, for as long as the result is used.
    /// 2. Every `D` begins with a valid `T`.
    #[inline]
    pub unsafe fn new<D>(ptr: NonNull<D>, len: usize) -> Self {
        const {
            assert!(
                size_of::<D>() != 0,
                "cannot build a strided view over zero-sized elements"
            );
        }
        Self {
            ptr: ptr.cast::<T>(),
            len,
            stride: size_of::<D>(),
            _marker: PhantomData,
        }
    }

    /// Reinterprets the elements as beginning with a `U`, keeping the stride.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. Every element begins with a valid `U`, meaning `U` is a
    ///    layout-compatible prefix of `T`.
    #[inline]
    pub unsafe fn cast<U>(self) -> RawStrided<U> {
        RawStrided {
            ptr: self.ptr.cast::<U>(),
            len: self.len,
            stride: self.stride,
            _marker: PhantomData,
        }
    }

    /// Returns the number of elements.
    #[inline]
    pub fn len(self) -> usize {
        self.len
    }

    /// Returns `true` if there are no elements.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Returns the distance in bytes between consecutive elements.
    #[inline]
    pub fn stride(self) -> usize {
        self.stride
    }

    /// Returns the address of the first element.
    #[inline]
    pub fn as_ptr(self) -> NonNull<T> {
        self.ptr
    }

    /// Returns the address of the element at `index`, which may be one past
    /// the last element.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `index <= self.len()`.
    #[inline]
    pub unsafe fn element_ptr(self, index: usize) -> NonNull<T> {
        debug_assert!(index <= self.len);

        // SAFETY:
        // 1. `index <= len` is guaranteed by the caller, so the offset stays within
        //    the elements of one allocation, or one byte past them. That offset
        //    cannot exceed `isize::MAX` or wrap around.
        unsafe { self.ptr.byte_add(index * self.stride) }
    }

    /// Returns the address `index` elements away from the first one, which may
    /// lie outside of the elements.
    ///
    /// The result must only be dereferenced after checking that it lies within
    /// the elements.
    #[inline]
    pub fn wrapping_element_ptr(self, index: isize) -> *const T {
        self.ptr
            .as_ptr()
            .cast_const()
            .wrapping_byte_offset(index.wrapping_mul(self.stride_isize()))
    }

    /// Returns the number of elements between `origin` and `ptr`.
    ///
    /// Both pointers should have been obtained from
    /// [`wrapping_element_ptr`](RawStrided::wrapping_element_ptr) of this
    /// value, so their distance is a multiple of the stride.
    #[inline]
    pub fn distance(self, origin: *const T, ptr: *const T) -> isize {
        let bytes = (ptr.addr().wrapping_sub(origin.addr())).cast_signed();
        bytes / self.stride_isize()
    }

    /// Returns `len` elements starting at `start`, keeping the stride.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `start + len <= self.len()`.
    #[inline]
    pub unsafe fn slice(self, start: usize, len: usize) -> Self {
        debug_assert!(start.checked_add(len).is_some_and(|end| end <= self.len));

        Self {
            // SAFETY:
            // 1. `start <= start + len <= self.len()` is guaranteed by the caller
            ptr: unsafe { self.element_ptr(start) },
            len,
            stride: self.stride,
            _marker: PhantomData,
        }
    }

    /// Returns `true` if both values describe the same elements, meaning the
    /// same address, count and stride.
    #[inline]
    pub fn same_as(self, other: Self) -> bool {
        self.ptr == other.ptr && self.len == other.len && self.stride == other.stride
    }

    /// Returns the stride as an `isize`.
    #[inline]
    fn stride_isize(self) -> isize {
        // A stride is the size of a type, and sizes never exceed `isize::MAX`.
        self.stride.cast_signed()
    }
}

impl<T> core::fmt::Debug for RawStrided<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RawStrided")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("stride", &self.stride)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C)]
    struct Base {
        id: u64,
    }

    #[repr(C)]
    struct Derived {
        base: Base,
        extra: [u64; 2],
    }

    fn derived(id: u64) -> Derived {
        Derived {
            base: Base { id },
            extra: [id * 10, id * 100],
        }
    }

    #[test]
    fn test_raw_strided_from_slice() {
        let values = [1_u16, 2, 3];
        let raw = RawStrided::from_slice(&values);
        assert_eq!(raw.len(), 3);
        assert_eq!(raw.stride(), 2);
        assert!(!raw.is_empty());
        assert_eq!(raw.as_ptr().as_ptr().cast_const(), values.as_ptr());
    }

    #[test]
    fn test_raw_strided_element_ptr_uses_stride() {
        let items = [derived(1), derived(2), derived(3)];
        // SAFETY: `Derived` is `repr(C)` and begins with a `Base`.
        let raw: RawStrided<Base> = unsafe { RawStrided::from_slice(&items).cast() };
        assert_eq!(raw.stride(), 24);

        let base = items.as_ptr().addr();
        for index in 0..=3 {
            // SAFETY: `index <= 3 == len`
            let ptr = unsafe { raw.element_ptr(index) };
            assert_eq!(ptr.as_ptr().addr(), base + index * 24);
        }

        // SAFETY: `1 < len`
        let second = unsafe { raw.element_ptr(1) };
        // SAFETY: The pointee is the `Base` of a live `Derived`.
        let second = unsafe { second.as_ref() };
        assert_eq!(second.id, 2);
    }

    #[test]
    fn test_raw_strided_wrapping_and_distance() {
        let items = [derived(1), derived(2), derived(3)];
        let raw = RawStrided::from_slice(&items);
        let origin = raw.wrapping_element_ptr(0);

        let end = raw.wrapping_element_ptr(3);
        assert_eq!(raw.distance(origin, end), 3);
        assert_eq!(raw.distance(end, origin), -3);

        let before = raw.wrapping_element_ptr(-1);
        assert_eq!(raw.distance(origin, before), -1);
        assert_eq!(origin.addr() - before.addr(), 24);
    }

    #[test]
    fn test_raw_strided_slice() {
        let items = [derived(1), derived(2), derived(3)];
        let raw = RawStrided::from_slice(&items);

        // SAFETY: `2 + 1 <= 3`
        let last = unsafe { raw.slice(2, 1) };
        assert_eq!(last.len(), 1);
        assert_eq!(last.stride(), raw.stride());
        assert_eq!(last.as_ptr().as_ptr().addr(), items.as_ptr().addr() + 48);

        // SAFETY: `3 + 0 <= 3`
        let empty = unsafe { raw.slice(3, 0) };
        assert!(empty.is_empty());
    }

    #[test]
    fn test_raw_strided_same_as() {
        let items = [derived(1), derived(2)];
        let raw = RawStrided::from_slice(&items);
        // SAFETY: `0 + 2 <= 2`
        let again = unsafe { raw.slice(0, 2) };
        // SAFETY: `0 + 1 <= 2`
        let shorter = unsafe { raw.slice(0, 1) };

        assert!(raw.same_as(again));
        assert!(!raw.same_as(shorter));
        assert_eq!(items[1].extra, [20, 200]);
    }
}
