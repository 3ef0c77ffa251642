use core::{
    any::type_name,
    fmt,
    marker::PhantomData,
    mem::{align_of, size_of},
};

use inplace_internals::{Callable, RawInplace, Signature};

use crate::{
    error::{UninitializedError, uninitialized},
    util::ExclusivePtr,
};

/// An owned, type-erased callable stored inline, without allocation.
///
/// `S` is the signature, written as a trait-object type such as
/// `dyn Fn(u8) -> u32` or `dyn Fn(u8) -> u32 + Send + Sync`. Its lifetime
/// bound is the lifetime of what the payload may borrow. Up to six arguments
/// are supported, and argument and return types must be `'static`.
///
/// `M` is the memory type. Its size and alignment are the capacity and
/// alignment of the inline buffer: `[u64; 2]` holds payloads of up to 16 bytes
/// with an alignment of up to 8. The default holds two pointers, which is
/// enough for a function pointer or an object and method pair.
///
/// A payload that does not fit `M` is rejected at compile time:
///
/// ```compile_fail
/// use inplace::InplaceFn;
///
/// let big = [0_u64; 4];
/// let f = InplaceFn::<dyn Fn() -> u64, [u64; 2]>::new(move || big[0]);
/// ```
///
/// Closures passed to [`new`](InplaceFn::new) need their argument types
/// written out, since the signature is only known through a trait bound.
///
/// # Examples
///
/// ```
/// use inplace::InplaceFn;
///
/// let (a, b) = (3_i32, 4_i32);
/// let f = InplaceFn::<dyn Fn(i32) -> i32, [u64; 2]>::new(move |x: i32| a * x + b);
/// assert_eq!(f.call(2), 10);
///
/// let g = f.clone();
/// assert_eq!(g.call(2), f.call(2));
///
/// let empty = InplaceFn::<dyn Fn(i32) -> i32>::empty();
/// assert_eq!(empty.call_if(2), None);
/// assert_eq!(empty.call_or(|x| -x, 2), -2);
/// ```
pub struct InplaceFn<S: Signature + ?Sized, M = [usize; 2]> {
    raw: RawInplace<S::Invoke, M>,
    _signature: PhantomData<S>,
}

// SAFETY: Only payloads implementing `Callable<S>` can be stored. For a
// signature that is `Send + Sync`, this requires the payload to be
// `Send + Sync` as well.
unsafe impl<S: Signature + Send + Sync + ?Sized, M> Send for InplaceFn<S, M> {}

// SAFETY: See the `Send` implementation above. Shared access only invokes the
// payload through `Fn`, which a `Sync` payload allows.
unsafe impl<S: Signature + Send + Sync + ?Sized, M> Sync for InplaceFn<S, M> {}

impl<S: Signature + ?Sized, M> InplaceFn<S, M> {
    /// Creates an empty callable.
    #[inline]
    pub const fn empty() -> Self {
        Self {
            raw: RawInplace::empty(),
            _signature: PhantomData,
        }
    }

    /// Creates a callable holding `payload`.
    ///
    /// Fails to compile if `payload` is larger than `M` or more strictly
    /// aligned.
    #[inline]
    pub fn new<F>(payload: F) -> Self
    where
        F: Callable<S> + Clone,
    {
        Self {
            raw: RawInplace::new::<S, F>(payload),
            _signature: PhantomData,
        }
    }

    /// Creates a callable holding a function pointer.
    ///
    /// All callables holding a function pointer of the same signature share a
    /// single dispatch table.
    #[inline]
    pub fn from_fn(function: S::FnPtr) -> Self
    where
        S::FnPtr: Callable<S>,
    {
        Self::new(function)
    }

    /// Replaces the payload with `payload`.
    ///
    /// The previous payload is dropped before the new one is stored.
    #[inline]
    pub fn set<F>(&mut self, payload: F)
    where
        F: Callable<S> + Clone,
    {
        self.raw.clear();
        self.raw = RawInplace::new::<S, F>(payload);
    }

    /// Replaces the payload with a function pointer.
    #[inline]
    pub fn set_fn(&mut self, function: S::FnPtr)
    where
        S::FnPtr: Callable<S>,
    {
        self.set(function);
    }

    /// Returns `true` if a payload is stored.
    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.raw.is_empty()
    }

    /// Drops the payload, leaving the callable empty.
    #[inline]
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Moves the payload into a new callable, leaving this one empty.
    #[inline]
    pub fn take(&mut self) -> Self {
        Self {
            raw: self.raw.take(),
            _signature: PhantomData,
        }
    }

    /// Moves the payload into a new callable with capacity `M2`, leaving this
    /// one empty.
    ///
    /// Fails to compile if `M2` is smaller than `M` or less strictly aligned.
    #[inline]
    pub fn take_widened<M2>(&mut self) -> InplaceFn<S, M2> {
        trace_widening::<M, M2>(self.raw.type_name(), "move");
        InplaceFn {
            raw: self.raw.take_widened(),
            _signature: PhantomData,
        }
    }

    /// Converts this callable into one with capacity `M2`.
    ///
    /// Fails to compile if `M2` is smaller than `M` or less strictly aligned.
    #[inline]
    pub fn widen<M2>(mut self) -> InplaceFn<S, M2> {
        self.take_widened()
    }

    /// Clones the payload into a new callable with capacity `M2`.
    ///
    /// Fails to compile if `M2` is smaller than `M` or less strictly aligned.
    #[inline]
    pub fn clone_widened<M2>(&self) -> InplaceFn<S, M2> {
        trace_widening::<M, M2>(self.raw.type_name(), "clone");
        InplaceFn {
            raw: self.raw.clone_widened(),
            _signature: PhantomData,
        }
    }

    /// Returns the [`core::any::type_name`] of the payload, if any.
    #[inline]
    pub fn payload_type_name(&self) -> Option<&'static str> {
        self.raw.type_name()
    }
}

fn trace_widening<M, M2>(payload: Option<&'static str>, operation: &'static str) {
    tracing::trace!(
        operation,
        payload,
        from_size = size_of::<M>(),
        from_align = align_of::<M>(),
        to_size = size_of::<M2>(),
        to_align = align_of::<M2>(),
        "widening callable holder"
    );
}

impl<S: Signature + ?Sized, M> Default for InplaceFn<S, M> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<S: Signature + ?Sized, M> Clone for InplaceFn<S, M> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            _signature: PhantomData,
        }
    }
}

impl<S: Signature + ?Sized, M> fmt::Debug for InplaceFn<S, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InplaceFn")
            .field(&format_args!("{}", self.raw.type_name().unwrap_or("<empty>")))
            .finish()
    }
}

macro_rules! impl_inplace_fn {
    ($($arg:ident: $ty:ident),*) => {
        impl_inplace_fn!(@flavour [] [] [] ($($arg: $ty),*));
        impl_inplace_fn!(@flavour [+ Send + Sync] [+ Sync] [+ Send] ($($arg: $ty),*));
    };

    (@flavour [$($bounds:tt)*] [$($shared:tt)*] [$($exclusive:tt)*] ($($arg:ident: $ty:ident),*)) => {
        impl<'a, R: 'static, $($ty: 'static,)* M> InplaceFn<dyn Fn($($ty),*) -> R $($bounds)* + 'a, M> {
            /// Creates a callable that invokes `method` on `object`.
            ///
            /// The payload is the reference and the method pointer, so `M` must
            /// hold two pointers.
            #[inline]
            pub fn from_method<T>(object: &'a T, method: fn(&T, $($ty),*) -> R) -> Self
            where
                T: 'a $($shared)*,
            {
                Self::new(move |$($arg: $ty),*| method(object, $($arg),*))
            }

            /// Creates a callable that invokes `method` on the exclusively
            /// borrowed `object`.
            ///
            /// # Safety
            ///
            /// Copies of the returned callable (made by [`Clone`] or by the
            /// widening conversions) share the borrow. The caller must ensure
            /// that invocations of this callable and of its copies never
            /// overlap, including reentrant invocations from within `method`.
            #[inline]
            pub unsafe fn from_method_mut<T>(object: &'a mut T, method: fn(&mut T, $($ty),*) -> R) -> Self
            where
                T: 'a $($exclusive)*,
            {
                let object = ExclusivePtr::new(object);
                Self::new(move |$($arg: $ty),*| {
                    // SAFETY: Invocations never overlap, as guaranteed by the
                    // caller of `from_method_mut`.
                    let object = unsafe { object.as_mut() };
                    method(object, $($arg),*)
                })
            }

            /// Invokes the payload.
            ///
            /// # Panics
            ///
            /// Panics with [`UninitializedError`] if the callable is empty. Use
            /// [`try_call`](Self::try_call), [`call_if`](Self::call_if) or
            /// [`call_or`](Self::call_or) when that is an expected state.
            #[inline]
            #[track_caller]
            pub fn call(&self, $($arg: $ty),*) -> R {
                match self.raw.invoker() {
                    // SAFETY: The pointer comes from `invoker` and `self` stays
                    // borrowed for the duration of the call.
                    Some((invoke, payload)) => unsafe { invoke(payload, $($arg),*) },
                    None => uninitialized(type_name::<Self>()),
                }
            }

            /// Invokes the payload, or returns [`UninitializedError`] if the
            /// callable is empty.
            #[inline]
            pub fn try_call(&self, $($arg: $ty),*) -> Result<R, UninitializedError> {
                let (invoke, payload) = self.raw.invoker().ok_or(UninitializedError)?;
                // SAFETY: The pointer comes from `invoker` and `self` stays
                // borrowed for the duration of the call.
                Ok(unsafe { invoke(payload, $($arg),*) })
            }

            /// Invokes the payload if the callable is not empty.
            ///
            /// For signatures returning `()`, the result tells whether the
            /// payload was invoked.
            #[inline]
            pub fn call_if(&self, $($arg: $ty),*) -> Option<R> {
                self.try_call($($arg),*).ok()
            }

            /// Invokes the payload, or `alternative` if the callable is empty.
            ///
            /// Passing a function item selects the alternative at compile time,
            /// with no indirection.
            #[inline]
            pub fn call_or<G>(&self, alternative: G, $($arg: $ty),*) -> R
            where
                G: FnOnce($($ty),*) -> R,
            {
                match self.raw.invoker() {
                    // SAFETY: The pointer comes from `invoker` and `self` stays
                    // borrowed for the duration of the call.
                    Some((invoke, payload)) => unsafe { invoke(payload, $($arg),*) },
                    None => alternative($($arg),*),
                }
            }
        }
    };
}

for_each_arity!(impl_inplace_fn);

#[cfg(test)]
mod tests {
    use core::{
        cell::Cell,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    fn double(value: i32) -> i32 {
        value * 2
    }

    struct Accumulator {
        total: i32,
    }

    impl Accumulator {
        fn peek(&self, extra: i32) -> i32 {
            self.total + extra
        }

        fn add(&mut self, value: i32) -> i32 {
            self.total += value;
            self.total
        }
    }

    #[test]
    fn test_inplace_fn_empty() {
        let f = InplaceFn::<dyn Fn(i32) -> i32>::empty();
        assert!(!f.is_valid());
        assert_eq!(f.try_call(1), Err(UninitializedError));
        assert_eq!(f.call_if(1), None);
        assert_eq!(f.call_or(double, 5), 10);
        assert!(!InplaceFn::<dyn Fn()>::default().is_valid());
    }

    #[test]
    #[should_panic(expected = "invoked an uninitialized callable")]
    fn test_inplace_fn_call_empty_panics() {
        let f = InplaceFn::<dyn Fn(i32) -> i32>::empty();
        f.call(1);
    }

    #[test]
    fn test_inplace_fn_payload_kinds() {
        let from_fn = InplaceFn::<dyn Fn(i32) -> i32>::from_fn(double);
        assert_eq!(from_fn.call(4), double(4));

        let accumulator = Accumulator { total: 10 };
        let from_method =
            InplaceFn::<dyn Fn(i32) -> i32 + '_>::from_method(&accumulator, Accumulator::peek);
        assert_eq!(from_method.call(1), accumulator.peek(1));

        let offset = 7;
        let closure = move |value: i32| value - offset;
        let from_closure = InplaceFn::<dyn Fn(i32) -> i32>::new(closure);
        assert_eq!(from_closure.call(10), closure(10));
    }

    #[test]
    fn test_inplace_fn_method_mut() {
        let mut accumulator = Accumulator { total: 0 };
        {
            // SAFETY: Both copies are only invoked sequentially on this thread.
            let f = unsafe {
                InplaceFn::<dyn Fn(i32) -> i32 + '_>::from_method_mut(
                    &mut accumulator,
                    Accumulator::add,
                )
            };
            let copy = f.clone();
            assert_eq!(f.call(2), 2);
            assert_eq!(copy.call(3), 5);
            assert_eq!(f.call(0), 5);
        }
        assert_eq!(accumulator.total, 5);
    }

    #[test]
    fn test_inplace_fn_set_drops_previous() {
        static DROPS: AtomicUsize = AtomicUsize::new(0);

        #[derive(Clone)]
        struct Tracked;
        impl Drop for Tracked {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::Relaxed);
            }
        }

        let tracked = Tracked;
        let mut f = InplaceFn::<dyn Fn() -> u8>::new(move || {
            let _tracked = &tracked;
            1_u8
        });
        assert_eq!(f.call(), 1);

        f.set_fn(|| 2);
        assert_eq!(DROPS.load(Ordering::Relaxed), 1);
        assert_eq!(f.call(), 2);

        f.set(|| 3_u8);
        assert_eq!(f.call(), 3);
        f.clear();
        assert!(!f.is_valid());
        assert_eq!(DROPS.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_inplace_fn_take_and_widen() {
        let base = 100_u32;
        let mut f = InplaceFn::<dyn Fn(u32) -> u32, [u32; 1]>::new(move |value: u32| base + value);

        let moved = f.take();
        assert!(!f.is_valid());
        assert_eq!(moved.call(1), 101);

        let wide: InplaceFn<dyn Fn(u32) -> u32, [u64; 4]> = moved.widen();
        assert_eq!(wide.call(2), 102);

        let mut copy: InplaceFn<dyn Fn(u32) -> u32, [u64; 8]> = wide.clone_widened();
        assert_eq!(copy.call(3), 103);
        assert_eq!(wide.call(3), 103);

        let taken: InplaceFn<dyn Fn(u32) -> u32, [u64; 8]> = copy.take_widened();
        assert!(!copy.is_valid());
        assert_eq!(taken.call(4), 104);
    }

    #[test]
    fn test_inplace_fn_call_if_invokes_once() {
        let calls = Cell::new(0);
        let counter = &calls;
        let f = InplaceFn::<dyn Fn() + '_>::new(move || counter.set(counter.get() + 1));

        assert_eq!(f.call_if(), Some(()));
        assert_eq!(calls.get(), 1);

        let empty = InplaceFn::<dyn Fn() + '_>::empty();
        assert_eq!(empty.call_if(), None);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_inplace_fn_arities() {
        let zero = InplaceFn::<dyn Fn() -> u8>::new(|| 0_u8);
        let three = InplaceFn::<dyn Fn(u8, u8, u8) -> u8>::new(|a: u8, b: u8, c: u8| a + b + c);
        let six = InplaceFn::<dyn Fn(u8, u8, u8, u8, u8, u8) -> u8 + Send + Sync>::new(
            |a: u8, b: u8, c: u8, d: u8, e: u8, f: u8| a + b + c + d + e + f,
        );

        assert_eq!(zero.call(), 0);
        assert_eq!(three.call(1, 2, 3), 6);
        assert_eq!(six.call(1, 2, 3, 4, 5, 6), 21);
    }

    #[test]
    fn test_inplace_fn_debug() {
        let empty = InplaceFn::<dyn Fn() -> u8>::empty();
        assert_eq!(std::format!("{empty:?}"), "InplaceFn(<empty>)");

        let f = InplaceFn::<dyn Fn(i32) -> i32>::from_fn(double);
        assert_eq!(std::format!("{f:?}"), "InplaceFn(fn(i32) -> i32)");
    }
}
