use core::{fmt, iter::FusedIterator, marker::PhantomData};

use inplace_internals::RawStrided;

/// An iterator over the elements of a [`PolySpan`](crate::PolySpan).
pub struct Iter<'a, T> {
    raw: RawStrided<T>,
    /// Index of the next element yielded from the front.
    front: usize,
    /// One past the index of the next element yielded from the back.
    back: usize,
    _marker: PhantomData<&'a T>,
}

// SAFETY: `Iter` only hands out `&T`.
unsafe impl<T: Sync> Send for Iter<'_, T> {}

// SAFETY: See the `Send` implementation above.
unsafe impl<T: Sync> Sync for Iter<'_, T> {}

impl<'a, T> Iter<'a, T> {
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The elements of `raw` are valid and not mutated for `'a`, except
    ///    through interior mutability of `T`.
    #[inline]
    pub(super) unsafe fn new(raw: RawStrided<T>) -> Self {
        Self {
            raw,
            front: 0,
            back: raw.len(),
            _marker: PhantomData,
        }
    }

    #[inline]
    fn element(&self, index: usize) -> &'a T {
        debug_assert!(index < self.raw.len());
        // SAFETY:
        // 1. Only indices in `front..back`, which lie below `len`, are passed here
        let ptr = unsafe { self.raw.element_ptr(index) };
        // SAFETY: The element is in bounds and borrowed for `'a`.
        unsafe { ptr.as_ref() }
    }
}

impl<T> Clone for Iter<'_, T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            raw: self.raw,
            front: self.front,
            back: self.back,
            _marker: PhantomData,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        let element = self.element(self.front);
        self.front += 1;
        Some(element)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }

    #[inline]
    fn nth(&mut self, n: usize) -> Option<&'a T> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(self.element(self.back))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("raw", &self.raw)
            .field("front", &self.front)
            .field("back", &self.back)
            .finish()
    }
}

/// An iterator over mutable references to the elements of a
/// [`PolySpanMut`](crate::PolySpanMut).
pub struct IterMut<'a, T> {
    raw: RawStrided<T>,
    front: usize,
    back: usize,
    _marker: PhantomData<&'a mut T>,
}

// SAFETY: `IterMut` hands out `&mut T` to distinct elements, like
// `core::slice::IterMut`.
unsafe impl<T: Send> Send for IterMut<'_, T> {}

// SAFETY: Shared access to an `IterMut` gives no access to the elements.
unsafe impl<T: Sync> Sync for IterMut<'_, T> {}

impl<'a, T> IterMut<'a, T> {
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The elements of `raw` are valid and exclusively borrowed for `'a`.
    #[inline]
    pub(super) unsafe fn new(raw: RawStrided<T>) -> Self {
        Self {
            raw,
            front: 0,
            back: raw.len(),
            _marker: PhantomData,
        }
    }

    #[inline]
    fn element(&mut self, index: usize) -> &'a mut T {
        debug_assert!(index < self.raw.len());
        // SAFETY:
        // 1. Only indices in `front..back`, which lie below `len`, are passed here
        let mut ptr = unsafe { self.raw.element_ptr(index) };
        // SAFETY: The element is in bounds and exclusively borrowed for `'a`.
        // Every index is passed here at most once, so the returned references
        // never alias.
        unsafe { ptr.as_mut() }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        if self.front == self.back {
            return None;
        }
        let index = self.front;
        self.front += 1;
        Some(self.element(index))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T> DoubleEndedIterator for IterMut<'_, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        let index = self.back;
        Some(self.element(index))
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

impl<T> FusedIterator for IterMut<'_, T> {}

impl<T> fmt::Debug for IterMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut")
            .field("raw", &self.raw)
            .field("front", &self.front)
            .field("back", &self.back)
            .finish()
    }
}
