//! Non-owning, one-word callable targets.
//!
//! A [`RawTarget`] holds either a function pointer or a pointer to an object,
//! in the same word. It does not know which one it holds: the invoker stored
//! next to it (for instance by `FnRef` in the `inplace` crate) was chosen for
//! the construction path and knows how to read it.
//!
//! # Safety Invariant
//!
//! The pointer returned by [`RawTarget::as_payload`] points at a live value of
//! the type the target was created from: the function pointer type `F` for
//! [`RawTarget::from_fn`], or `&T` for [`RawTarget::from_object`]. Both fields
//! live at offset 0 of a `#[repr(C)]` union, so a pointer to the union is a
//! pointer to whichever field was written.

use core::{mem::size_of, ptr::NonNull};

use crate::util::Erased;

/// A function pointer of type `F`, or a pointer to an object.
///
/// Equality of two targets is the equality of their [`address`], which is the
/// function address or the object address.
///
/// [`address`]: RawTarget::address
#[derive(Clone, Copy)]
#[repr(C)]
pub union RawTarget<F: Copy + 'static> {
    /// The bound object, written by [`RawTarget::from_object`].
    object: NonNull<Erased>,
    /// The function, written by [`RawTarget::from_fn`].
    function: F,
    /// The address of either field, used for comparisons only.
    address: usize,
}

impl<F: Copy + 'static> RawTarget<F> {
    /// Creates a target that refers to nothing.
    ///
    /// Its [`address`](RawTarget::address) is 0, and it must not be passed to
    /// an invoker.
    #[inline]
    pub const fn null() -> Self {
        Self { address: 0 }
    }

    /// Creates a target that refers to a function.
    ///
    /// The payload pointer of the result points to an `F`.
    #[inline]
    pub const fn from_fn(function: F) -> Self {
        const {
            assert!(
                size_of::<F>() == size_of::<usize>(),
                "function targets must be exactly one word"
            );
        }
        Self { function }
    }

    /// Creates a target that refers to `object`.
    ///
    /// The payload pointer of the result points to a `&T`. The target does not
    /// borrow `object`: the caller must tie the target to the lifetime of the
    /// borrow.
    #[inline]
    pub fn from_object<T>(object: &T) -> Self {
        Self {
            object: NonNull::from(object).cast::<Erased>(),
        }
    }

    /// Returns the function or object address held by this target.
    #[inline]
    pub fn address(&self) -> usize {
        // SAFETY: Every constructor initializes at least one word of the union,
        // and both pointer fields are one word wide. Reading a pointer as an
        // integer is valid and only discards its provenance.
        unsafe { self.address }
    }

    /// Returns a pointer to the stored function pointer or object reference,
    /// suitable for the invoker chosen alongside this target.
    ///
    /// See the module-level safety invariant for what the pointee is.
    #[inline]
    pub fn as_payload(&self) -> NonNull<Erased> {
        NonNull::from(self).cast::<Erased>()
    }
}

impl<F: Copy + 'static> PartialEq for RawTarget<F> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl<F: Copy + 'static> Eq for RawTarget<F> {}

impl<F: Copy + 'static> core::fmt::Debug for RawTarget<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("RawTarget")
            .field(&format_args!("{:#x}", self.address()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{Callable, Signature};

    type Sig = dyn Fn(i32) -> i32;
    type FnPtr = <Sig as Signature>::FnPtr;

    fn negate(value: i32) -> i32 {
        -value
    }

    #[test]
    fn test_raw_target_null() {
        let target = RawTarget::<FnPtr>::null();
        assert_eq!(target.address(), 0);
        assert_eq!(target, RawTarget::null());
    }

    #[test]
    fn test_raw_target_function() {
        let target = RawTarget::<FnPtr>::from_fn(negate);
        let invoke = <FnPtr as Callable<Sig>>::INVOKE;

        // SAFETY: The target was created from a function pointer of type `FnPtr`.
        let result = unsafe { invoke(target.as_payload(), 4) };
        assert_eq!(result, -4);
        assert_eq!(target, RawTarget::from_fn(negate as FnPtr));
    }

    #[test]
    fn test_raw_target_object() {
        let offset = 3;
        let closure = move |value: i32| value + offset;
        let target = RawTarget::<FnPtr>::from_object(&closure);

        fn invoker_of<F: Fn(i32) -> i32 + 'static>(_closure: &F) -> <Sig as Signature>::Invoke {
            <&F as Callable<Sig>>::INVOKE
        }
        let invoke = invoker_of(&closure);

        // SAFETY: The target was created from a reference to `closure`, which is
        // still alive.
        let result = unsafe { invoke(target.as_payload(), 4) };
        assert_eq!(result, 7);
        assert_eq!(target.address(), &closure as *const _ as usize);
        assert_ne!(target, RawTarget::from_fn(negate as FnPtr));
    }
}
