//! Type-erased in-place payload storage.
//!
//! This module encapsulates the fields of [`RawInplace`], ensuring they are only
//! visible within this module. This visibility restriction guarantees the
//! safety invariant: **when the vtable is `Some`, the buffer holds a live
//! payload of exactly the type the vtable was created for**.
//!
//! # Safety Invariant
//!
//! The vtable is only ever set right after a payload of the matching type has
//! been written into the buffer (in [`RawInplace::new`], or by the vtable's own
//! `move_to`/`clone_to` entries), and it is always reset to `None` before the
//! payload is dropped or relocated. A panic while dropping or cloning therefore
//! leaves the holder empty rather than pointing at a dead payload.
//!
//! # Capacity
//!
//! The memory type `M` only contributes its size and alignment. A payload of
//! type `T` may be written into the buffer only when `T` fits in `M` in both
//! respects. This is checked by inline `const` assertions, so a payload that
//! does not fit is rejected when the constructor is monomorphized.

use core::{
    cell::UnsafeCell,
    marker::PhantomData,
    mem::{MaybeUninit, align_of, size_of},
    ptr::NonNull,
};

use crate::{
    callable::vtable::CallableVtable,
    signature::{Callable, Signature},
    util::Erased,
};

/// Fixed-capacity storage holding at most one type-erased payload.
///
/// `I` is the invoker type of the signature the payload is called with, and
/// `M` is the memory type whose size and alignment bound the payload.
///
/// The payload lives in an [`UnsafeCell`] so that payloads with interior
/// mutability can be invoked through a shared reference. Its address is the
/// address of the buffer and is computed on demand; no pointer into the buffer
/// is stored, so moving a [`RawInplace`] never invalidates it.
///
/// [`RawInplace`] is neither `Send` nor `Sync`, because the payload type is not
/// known to it. Wrappers that know the payload is thread-safe (for instance
/// because the signature requires `Send + Sync`) may implement those traits.
pub struct RawInplace<I: 'static, M> {
    /// Dispatch table of the stored payload, or `None` when empty.
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. If this is `Some(vtable)`, `storage` holds a live, initialized
    ///    payload of the type that `vtable` was created for.
    /// 2. If this is `None`, `storage` holds no live payload.
    vtable: Option<&'static CallableVtable<I>>,

    /// Buffer holding the payload.
    storage: UnsafeCell<MaybeUninit<M>>,

    /// Opts out of the auto traits, since the payload type is erased.
    _marker: PhantomData<*const ()>,
}

impl<I: 'static, M> RawInplace<I, M> {
    /// Creates an empty [`RawInplace`].
    #[inline]
    pub const fn empty() -> Self {
        Self {
            vtable: None,
            storage: UnsafeCell::new(MaybeUninit::uninit()),
            _marker: PhantomData,
        }
    }

    /// Creates a new [`RawInplace`] holding `payload`, invoked with the
    /// signature `S`.
    ///
    /// Fails to compile if `T` is larger than `M` or more strictly aligned.
    #[inline]
    pub fn new<S, T>(payload: T) -> Self
    where
        I: Copy,
        S: Signature<Invoke = I> + ?Sized,
        T: Callable<S> + Clone,
    {
        const {
            assert!(
                size_of::<T>() <= size_of::<M>(),
                "the payload does not fit the capacity of the holder"
            );
            assert!(
                align_of::<T>() <= align_of::<M>(),
                "the payload is more strictly aligned than the holder"
            );
        }

        let mut this = Self::empty();
        let dst: *mut T = this.storage.get_mut().as_mut_ptr().cast::<T>();

        // SAFETY:
        // - `dst` is valid for writes of `T` and aligned for `T`, as the const
        //   assertions above proved that `T` fits in `M`
        // - The buffer is uninitialized, so nothing is leaked
        unsafe {
            dst.write(payload);
        }

        this.vtable = Some(CallableVtable::new::<S, T>());
        this
    }

    /// Returns `true` if no payload is stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vtable.is_none()
    }

    /// Returns the [`core::any::type_name`] of the stored payload, if any.
    #[inline]
    pub fn type_name(&self) -> Option<&'static str> {
        self.vtable.map(CallableVtable::type_name)
    }

    /// Drops the stored payload, if any, leaving `self` empty.
    #[inline]
    pub fn clear(&mut self) {
        if let Some(vtable) = self.vtable.take() {
            let ptr = self.payload_ptr_mut();

            // SAFETY:
            // 1. `vtable` was `Some`, so the buffer holds a live payload of the type
            //    `vtable` was created for
            // 2. The vtable has already been reset, so the payload is not used
            //    afterwards
            unsafe {
                vtable.drop(ptr);
            }
        }
    }

    /// Moves the payload out into a new holder of capacity `M2`, leaving
    /// `self` empty.
    ///
    /// The new holder keeps using the payload's own vtable, including its
    /// drop entry. Fails to compile if `M` does not fit in `M2`.
    #[inline]
    pub fn take_widened<M2>(&mut self) -> RawInplace<I, M2> {
        assert_widens::<M, M2>();

        let mut dst = RawInplace::<I, M2>::empty();
        if let Some(vtable) = self.vtable.take() {
            let src = self.payload_ptr_mut();
            let dst_ptr = dst.payload_ptr_mut();

            // SAFETY:
            // 1. `vtable` was `Some`, so `src` holds a live payload of its type
            // 2. `dst_ptr` is valid and aligned for that payload, since the payload
            //    fits in `M` which fits in `M2`
            // 3. The buffers belong to different holders and cannot overlap
            // 4. The vtable of `self` has been reset, so the source is treated as
            //    uninitialized afterwards
            unsafe {
                vtable.move_to(src, dst_ptr);
            }
            dst.vtable = Some(vtable);
        }
        dst
    }

    /// Moves the payload out into a new holder of the same capacity, leaving
    /// `self` empty.
    #[inline]
    pub fn take(&mut self) -> Self {
        self.take_widened::<M>()
    }

    /// Converts this holder into one of capacity `M2`.
    ///
    /// Fails to compile if `M` does not fit in `M2`.
    #[inline]
    pub fn widen<M2>(mut self) -> RawInplace<I, M2> {
        self.take_widened::<M2>()
    }

    /// Clones the payload into a new holder of capacity `M2`.
    ///
    /// Fails to compile if `M` does not fit in `M2`.
    #[inline]
    pub fn clone_widened<M2>(&self) -> RawInplace<I, M2> {
        assert_widens::<M, M2>();

        let mut dst = RawInplace::<I, M2>::empty();
        if let Some(vtable) = self.vtable {
            let src = self.payload_ptr();
            let dst_ptr = dst.payload_ptr_mut();

            // SAFETY:
            // 1. `vtable` is `Some`, so `src` holds a live payload of its type
            // 2. `dst_ptr` is valid and aligned for that payload, since the payload
            //    fits in `M` which fits in `M2`
            // 3. `dst` is empty, so nothing is leaked
            unsafe {
                vtable.clone_to(src, dst_ptr);
            }
            dst.vtable = Some(vtable);
        }
        dst
    }

    /// Returns a pointer to the buffer for shared access.
    #[inline]
    fn payload_ptr(&self) -> NonNull<Erased> {
        NonNull::from(&self.storage).cast::<Erased>()
    }

    /// Returns a pointer to the buffer for exclusive access.
    #[inline]
    fn payload_ptr_mut(&mut self) -> NonNull<Erased> {
        NonNull::from(self.storage.get_mut()).cast::<Erased>()
    }
}

impl<I: Copy + 'static, M> RawInplace<I, M> {
    /// Returns the invoker of the stored payload together with a pointer to
    /// the payload, or `None` when empty.
    ///
    /// The pointer may be passed to the invoker for as long as `self` is
    /// borrowed, which guarantees the payload is neither dropped nor moved in
    /// the meantime.
    #[inline]
    pub fn invoker(&self) -> Option<(I, NonNull<Erased>)> {
        let vtable = self.vtable?;
        Some((vtable.invoker(), self.payload_ptr()))
    }
}

/// Asserts at compile time that a payload fitting `M` also fits `M2`.
#[inline(always)]
const fn assert_widens<M, M2>() {
    const {
        assert!(
            size_of::<M>() <= size_of::<M2>(),
            "the destination holder is smaller than the source holder"
        );
        assert!(
            align_of::<M>() <= align_of::<M2>(),
            "the destination holder is less strictly aligned than the source holder"
        );
    }
}

impl<I: 'static, M> Clone for RawInplace<I, M> {
    #[inline]
    fn clone(&self) -> Self {
        self.clone_widened::<M>()
    }
}

impl<I: 'static, M> Drop for RawInplace<I, M> {
    #[inline]
    fn drop(&mut self) {
        if let Some(vtable) = self.vtable.take() {
            let ptr = self.payload_ptr_mut();

            // SAFETY:
            // 1. `vtable` was `Some`, so the buffer holds a live payload of its type
            // 2. We are in the drop function, so the payload is not used afterwards
            unsafe {
                vtable.drop(ptr);
            }
        }
    }
}
