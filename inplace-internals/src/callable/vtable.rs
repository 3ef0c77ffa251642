//! Vtable for type-erased callable payloads.
//!
//! This module contains the [`CallableVtable`] which enables invoking,
//! dropping, relocating and cloning a payload when its concrete type `T` has
//! been erased. The vtable stores function pointers that dispatch to the
//! correct typed implementations.
//!
//! This module encapsulates the fields of [`CallableVtable`] so they cannot be
//! accessed directly. This visibility restriction guarantees the safety
//! invariant: **the vtable's type parameter must match the actual payload type
//! stored in the buffer it is paired with**.
//!
//! # Safety Invariant
//!
//! This invariant is maintained because vtables are created as `&'static`
//! references via [`CallableVtable::new`], which pairs the function pointers
//! with a specific payload type `T` at compile time. All five entries are
//! filled in by the same `const` block, so a table is never partially
//! populated.

use core::{marker::PhantomData, mem::ManuallyDrop, ptr::NonNull};

use crate::{
    signature::{Callable, Signature},
    util::Erased,
};

/// Vtable for type-erased callable operations.
///
/// Contains function pointers for performing operations on a payload without
/// knowing its concrete type at compile time. There is exactly one vtable per
/// pair of signature and payload type, shared by every holder of that payload.
///
/// # Safety Invariant
///
/// The fields `invoke`, `drop`, `move_to` and `clone_to` are guaranteed to
/// point to the functions defined below (or to [`Callable::INVOKE`]),
/// instantiated with the payload type `T` that was used to create this
/// [`CallableVtable`].
pub struct CallableVtable<I: 'static> {
    /// Gets the [`core::any::type_name`] of the payload type.
    type_name: fn() -> &'static str,
    /// Invokes the payload. This is [`Callable::INVOKE`] of the payload type,
    /// stored without its signature so the table stays free of generic
    /// fields.
    invoke: unsafe fn(),
    /// Drops the payload in place, or `None` if the payload type does not need
    /// dropping.
    drop: Option<unsafe fn(NonNull<Erased>)>,
    /// Relocates the payload from the first pointer to the second.
    move_to: unsafe fn(NonNull<Erased>, NonNull<Erased>),
    /// Writes a clone of the payload at the first pointer to the second.
    clone_to: unsafe fn(NonNull<Erased>, NonNull<Erased>),
    /// Remembers the type `invoke` was erased from.
    _invoke: PhantomData<I>,
}

/// Reinterprets an invoker as a plain `unsafe fn()` and back.
union InvokeBits<I> {
    /// The invoker as its signature-specific pointer type.
    typed: ManuallyDrop<I>,
    /// The same pointer without its signature.
    erased: unsafe fn(),
}

impl<I: Copy> InvokeBits<I> {
    /// Strips the signature from an invoker.
    ///
    /// Fails to compile if `I` is not pointer-sized.
    const fn erase(invoke: I) -> unsafe fn() {
        const {
            assert!(
                size_of::<I>() == size_of::<unsafe fn()>(),
                "invokers are single function pointers"
            );
            assert!(align_of::<I>() == align_of::<unsafe fn()>());
        }
        let bits = Self {
            typed: ManuallyDrop::new(invoke),
        };
        // SAFETY: `Signature::Invoke` is always an `unsafe fn(NonNull<Erased>,
        // ..) -> R` pointer, which has the same size, alignment and validity as
        // `unsafe fn()` (checked above).
        unsafe { bits.erased }
    }

    /// Recovers an invoker stripped by [`InvokeBits::erase`].
    ///
    /// # Safety
    ///
    /// `erased` must have been produced by [`InvokeBits::erase`] for the same
    /// `I`.
    unsafe fn restore(erased: unsafe fn()) -> I {
        let bits = Self { erased };
        // SAFETY: Guaranteed by the caller, so the bits are a valid `I`.
        ManuallyDrop::into_inner(unsafe { bits.typed })
    }
}

impl<I: 'static> CallableVtable<I> {
    /// Creates a new [`CallableVtable`] for the payload type `T` invoked with
    /// the signature `S`.
    ///
    /// Whether the payload needs dropping is decided here, once per payload
    /// type, rather than on every destruction.
    #[inline]
    pub const fn new<S, T>() -> &'static Self
    where
        I: Copy,
        S: Signature<Invoke = I> + ?Sized,
        T: Callable<S> + Clone,
    {
        const {
            &Self {
                type_name: core::any::type_name::<T>,
                invoke: InvokeBits::<I>::erase(T::INVOKE),
                drop: if core::mem::needs_drop::<T>() {
                    Some(drop::<T>)
                } else {
                    None
                },
                move_to: move_to::<T>,
                clone_to: clone_to::<T>,
                _invoke: PhantomData,
            }
        }
    }

    /// Gets the [`core::any::type_name`] of the payload type that was used to
    /// create this [`CallableVtable`].
    #[inline]
    pub fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// Returns `true` if the payload type has drop glue.
    #[inline]
    pub fn needs_drop(&self) -> bool {
        self.drop.is_some()
    }

    /// Drops the payload pointed to by this pointer in place.
    ///
    /// Does nothing if the payload type does not need dropping.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The pointer points to a live, initialized payload of the type this
    ///    [`CallableVtable`] was created for.
    /// 2. The payload is not used after calling this method.
    #[inline]
    pub(super) unsafe fn drop(&self, ptr: NonNull<Erased>) {
        if let Some(drop) = self.drop {
            // SAFETY: We know that `self.drop` points to the function `drop::<T>`
            // below. That function's safety requirements are upheld:
            // 1. Guaranteed by the caller
            // 2. Guaranteed by the caller
            unsafe {
                drop(ptr);
            }
        }
    }

    /// Relocates the payload from `src` to `dst`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `src` points to a live, initialized payload of the type this
    ///    [`CallableVtable`] was created for.
    /// 2. `dst` is valid for writes of that payload type and suitably aligned.
    /// 3. `src` and `dst` do not overlap.
    /// 4. The payload at `src` is treated as uninitialized afterwards.
    #[inline]
    pub(super) unsafe fn move_to(&self, src: NonNull<Erased>, dst: NonNull<Erased>) {
        // SAFETY: We know that `self.move_to` points to the function `move_to::<T>`
        // below. That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        // 3. Guaranteed by the caller
        // 4. Guaranteed by the caller
        unsafe {
            (self.move_to)(src, dst);
        }
    }

    /// Writes a clone of the payload at `src` to `dst`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `src` points to a live, initialized payload of the type this
    ///    [`CallableVtable`] was created for.
    /// 2. `dst` is valid for writes of that payload type and suitably aligned.
    /// 3. `dst` does not hold a live value that would be leaked by the write.
    #[inline]
    pub(super) unsafe fn clone_to(&self, src: NonNull<Erased>, dst: NonNull<Erased>) {
        // SAFETY: We know that `self.clone_to` points to the function
        // `clone_to::<T>` below. That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        // 3. Guaranteed by the caller
        unsafe {
            (self.clone_to)(src, dst);
        }
    }
}

impl<I: Copy + 'static> CallableVtable<I> {
    /// Returns the invoker for the payload type.
    ///
    /// The returned function pointer is itself `unsafe` to call: it must only
    /// be called with a pointer to a live payload of the type this vtable was
    /// created for.
    #[inline]
    pub fn invoker(&self) -> I {
        // SAFETY: `self.invoke` was erased from `I` in `CallableVtable::new`.
        unsafe { InvokeBits::<I>::restore(self.invoke) }
    }
}

/// Drops the payload of type `T` pointed to by this pointer in place.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The pointer points to a live, initialized `T`.
/// 2. The `T` is not used after calling this method.
unsafe fn drop<T>(ptr: NonNull<Erased>) {
    let ptr: NonNull<T> = ptr.cast::<T>();
    // SAFETY:
    // 1. Guaranteed by the caller
    // 2. Guaranteed by the caller
    unsafe {
        ptr.drop_in_place();
    }
}

/// Relocates a `T` from `src` to `dst` with a bitwise copy.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `src` points to a live, initialized `T`.
/// 2. `dst` is valid for writes of `T` and aligned for `T`.
/// 3. `src` and `dst` do not overlap.
/// 4. The `T` at `src` is treated as uninitialized afterwards.
unsafe fn move_to<T>(src: NonNull<Erased>, dst: NonNull<Erased>) {
    // SAFETY:
    // 1. Guaranteed by the caller
    // 2. Guaranteed by the caller
    // 3. Guaranteed by the caller
    // 4. Guaranteed by the caller, so the bitwise copy does not duplicate
    //    ownership
    unsafe {
        src.cast::<T>().copy_to_nonoverlapping(dst.cast::<T>(), 1);
    }
}

/// Writes a clone of the `T` at `src` to `dst`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `src` points to a live, initialized `T`.
/// 2. `dst` is valid for writes of `T` and aligned for `T`.
/// 3. `dst` does not hold a live `T` that would be leaked by the write.
unsafe fn clone_to<T: Clone>(src: NonNull<Erased>, dst: NonNull<Erased>) {
    // SAFETY:
    // 1. Guaranteed by the caller
    let value: &T = unsafe { src.cast::<T>().as_ref() };
    let cloned = value.clone();

    // SAFETY:
    // 2. Guaranteed by the caller
    // 3. Guaranteed by the caller
    unsafe {
        dst.cast::<T>().write(cloned);
    }
}
