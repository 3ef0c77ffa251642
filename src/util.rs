use core::{marker::PhantomData, ptr::NonNull};

/// An exclusive borrow stored as a pointer, so that it can be copied into a
/// callable.
///
/// Copies alias the same `&'a mut T`. Whoever creates an [`ExclusivePtr`]
/// takes on the obligation that the pointee is only accessed through one copy
/// at a time.
pub(crate) struct ExclusivePtr<'a, T> {
    ptr: NonNull<T>,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> ExclusivePtr<'a, T> {
    #[inline]
    pub(crate) fn new(object: &'a mut T) -> Self {
        Self {
            ptr: NonNull::from(object),
            _marker: PhantomData,
        }
    }

    /// Reborrows the pointee.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. No other reference to the pointee is live while the returned
    ///    reference is.
    #[inline]
    pub(crate) unsafe fn as_mut<'b>(mut self) -> &'b mut T
    where
        'a: 'b,
    {
        // SAFETY:
        // 1. The pointer comes from a `&'a mut T` and `'a: 'b`, so it is valid,
        //    aligned and initialized for `'b`
        // 2. Exclusivity is guaranteed by the caller
        unsafe { self.ptr.as_mut() }
    }
}

impl<T> Clone for ExclusivePtr<'_, T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ExclusivePtr<'_, T> {}

// SAFETY: Moving the pointer to another thread moves the exclusive borrow,
// which is allowed when `T: Send`.
unsafe impl<T: Send> Send for ExclusivePtr<'_, T> {}

// SAFETY: Sharing the pointer only allows reaching the pointee through the
// unsafe `as_mut`, whose caller guarantees accesses never overlap. Each access
// is then equivalent to sending the exclusive borrow, which `T: Send` allows.
unsafe impl<T: Send> Sync for ExclusivePtr<'_, T> {}

impl<T> PartialEq for ExclusivePtr<'_, T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<T> Eq for ExclusivePtr<'_, T> {}

impl<T> core::fmt::Debug for ExclusivePtr<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Pointer::fmt(&self.ptr, f)
    }
}
