//! Type-level description of call signatures.
//!
//! Rust has no variadic generics, so the signature of an erased callable is
//! written as a trait-object type such as `dyn Fn(u8, u16) -> u32 + 'a`. The
//! [`Signature`] trait maps that type to the concrete function pointer types
//! used by the rest of the crate, and [`Callable`] maps a concrete payload type
//! to the invoker stored in its vtable.
//!
//! Both traits are implemented by the `signatures!` macro below for arities 0
//! through 6, once for the plain `dyn Fn(..) -> R + 'a` flavour and once for
//! the thread-safe `dyn Fn(..) -> R + Send + Sync + 'a` flavour.
//!
//! # Safety Invariant
//!
//! The invoker returned by [`Callable::INVOKE`] for a payload type `F` must
//! only ever be called with a pointer to a live, initialized `F`. The invoker
//! itself cannot check this; it is upheld by [`RawInplace`], which only pairs a
//! vtable with the payload type it was created for.
//!
//! [`RawInplace`]: crate::callable::RawInplace

use core::ptr::NonNull;

use crate::util::Erased;

/// A call signature written as a `dyn Fn(..) -> R` type.
///
/// # Safety
///
/// Implementors must guarantee that:
///
/// 1. [`Invoke`](Signature::Invoke) is an `unsafe fn(NonNull<Erased>, A..) ->
///    R` pointer taking exactly the arguments of the signature.
/// 2. [`FnPtr`](Signature::FnPtr), [`Method`](Signature::Method) and
///    [`MethodMut`](Signature::MethodMut) are plain function pointer types
///    taking the arguments of the signature (preceded by the bound object for
///    the method forms) and returning [`Output`](Signature::Output).
pub unsafe trait Signature {
    /// The value returned by a call.
    type Output;

    /// Plain function pointer with this signature, `fn(A..) -> R`.
    type FnPtr: Copy + PartialEq + 'static;

    /// Type-erased invoker stored in vtables, `unsafe fn(NonNull<Erased>, A..)
    /// -> R`.
    type Invoke: Copy + PartialEq + 'static;

    /// Method taking the bound object by shared reference, `fn(&T, A..) -> R`.
    type Method<T>: Copy + PartialEq;

    /// Method taking the bound object by exclusive reference, `fn(&mut T, A..)
    /// -> R`.
    type MethodMut<T>: Copy + PartialEq;

    /// Number of arguments taken by a call.
    const ARITY: usize;
}

/// A payload type that can be invoked with the signature `S`.
///
/// This is implemented for every `F: Fn(A..) -> R` (and, for the thread-safe
/// signatures, every `F: Fn(A..) -> R + Send + Sync`), including function
/// pointers and shared references to closures.
///
/// # Safety
///
/// Implementors must guarantee that [`INVOKE`](Callable::INVOKE), when called
/// with a pointer to a live `Self`, invokes that `Self` and nothing else.
pub unsafe trait Callable<S: Signature + ?Sized>: Sized {
    /// Invoker that casts the erased pointer back to `Self` and calls it.
    const INVOKE: S::Invoke;
}

/// Implements [`Signature`] and [`Callable`] for each listed arity.
///
/// Each entry names the module-level invoker function that is generated for
/// that arity, followed by the argument list.
macro_rules! signatures {
    ($($invoke:ident($($arg:ident: $ty:ident),*);)*) => {
        $(
            /// Invokes the payload of type `F` pointed to by `payload`.
            ///
            /// # Safety
            ///
            /// The caller must ensure:
            ///
            /// 1. `payload` points to a live, initialized `F`.
            /// 2. No exclusive reference to that `F` exists for the duration of
            ///    the call.
            unsafe fn $invoke<F, R, $($ty,)*>(payload: NonNull<Erased>, $($arg: $ty,)*) -> R
            where
                F: Fn($($ty,)*) -> R,
            {
                // SAFETY:
                // 1. The pointee is a live `F`, guaranteed by the caller.
                // 2. Shared access is allowed, guaranteed by the caller.
                let payload: &F = unsafe { payload.cast::<F>().as_ref() };
                payload($($arg,)*)
            }

            signatures!(@impl $invoke [] ($($arg: $ty),*));
            signatures!(@impl $invoke [+ Send + Sync] ($($arg: $ty),*));
        )*
    };

    (@impl $invoke:ident [$($bounds:tt)*] ($($arg:ident: $ty:ident),*)) => {
        // SAFETY: All associated types are spelled out from the argument list of
        // this exact signature.
        unsafe impl<'a, R, $($ty,)*> Signature for dyn Fn($($ty,)*) -> R $($bounds)* + 'a
        where
            R: 'static,
            $($ty: 'static,)*
        {
            type Output = R;
            type FnPtr = fn($($ty,)*) -> R;
            type Invoke = unsafe fn(NonNull<Erased>, $($ty,)*) -> R;
            type Method<T> = fn(&T, $($ty,)*) -> R;
            type MethodMut<T> = fn(&mut T, $($ty,)*) -> R;

            const ARITY: usize = signatures!(@count $($ty)*);
        }

        // SAFETY: `$invoke::<F, ..>` casts the erased pointer back to `F` and
        // calls it, which is exactly the contract of `Callable::INVOKE`.
        unsafe impl<'a, F, R, $($ty,)*> Callable<dyn Fn($($ty,)*) -> R $($bounds)* + 'a> for F
        where
            F: Fn($($ty,)*) -> R $($bounds)* + 'a,
            R: 'static,
            $($ty: 'static,)*
        {
            const INVOKE: unsafe fn(NonNull<Erased>, $($ty,)*) -> R = $invoke::<F, R, $($ty,)*>;
        }
    };

    (@count) => { 0 };
    (@count $head:ident $($tail:ident)*) => { 1 + signatures!(@count $($tail)*) };
}

signatures! {
    invoke0();
    invoke1(a0: A0);
    invoke2(a0: A0, a1: A1);
    invoke3(a0: A0, a1: A1, a2: A2);
    invoke4(a0: A0, a1: A1, a2: A2, a3: A3);
    invoke5(a0: A0, a1: A1, a2: A2, a3: A3, a4: A4);
    invoke6(a0: A0, a1: A1, a2: A2, a3: A3, a4: A4, a5: A5);
}
