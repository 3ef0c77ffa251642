use core::{any::type_name, fmt, marker::PhantomData};

use inplace_internals::{Callable, RawTarget, Signature};

use crate::error::{UninitializedError, uninitialized};

/// A non-owning reference to a function or to a borrowed closure.
///
/// An [`FnRef`] is two words: the function pointer or object pointer, and the
/// stub that knows how to call it. It is [`Copy`], and copying it never
/// touches the callee.
///
/// The lifetime bound of the signature `S` limits how long a borrowed closure
/// can be referenced. Function pointers need no borrow, so an
/// `FnRef<dyn Fn(u8) -> u8>` is `'static`.
///
/// Two [`FnRef`]s are equal when both are empty, or when they call the same
/// function or the same object the same way.
///
/// "The same way" is decided by comparing stub addresses. A stub is a generic
/// function instantiated per signature and callee type, and the compiler may
/// emit more than one copy of it. Equality is therefore only reliable between
/// [`FnRef`]s created in the same crate: copies always compare equal, but two
/// `from_fn(f)` values built in different crates may compare unequal.
///
/// # Examples
///
/// ```
/// use inplace::FnRef;
///
/// fn halve(value: u32) -> u32 {
///     value / 2
/// }
///
/// let by_fn = FnRef::<dyn Fn(u32) -> u32>::from_fn(halve);
/// assert_eq!(by_fn.call(10), 5);
/// assert_eq!(by_fn, FnRef::<dyn Fn(u32) -> u32>::from_fn(halve));
///
/// let offset = 3;
/// let closure = move |value: u32| value + offset;
/// let by_ref = FnRef::<dyn Fn(u32) -> u32 + '_>::from_ref(&closure);
/// assert_eq!(by_ref.call(10), 13);
/// ```
pub struct FnRef<S: Signature + ?Sized> {
    target: RawTarget<S::FnPtr>,
    /// The invoker chosen for the construction path, or `None` when empty.
    ///
    /// # Safety
    ///
    /// When this is `Some`, it was created together with `target` and reads
    /// the payload pointer of `target` as the type `target` was created from.
    stub: Option<S::Invoke>,
    _signature: PhantomData<S>,
}

// SAFETY: A `Send + Sync` signature requires borrowed closures to be `Sync`, so
// the reference held by `target` may be sent and shared. Function pointers are
// always `Send + Sync`.
unsafe impl<S: Signature + Send + Sync + ?Sized> Send for FnRef<S> {}

// SAFETY: See the `Send` implementation above.
unsafe impl<S: Signature + Send + Sync + ?Sized> Sync for FnRef<S> {}

impl<S: Signature + ?Sized> FnRef<S> {
    /// Creates an empty [`FnRef`].
    #[inline]
    pub const fn empty() -> Self {
        Self {
            target: RawTarget::null(),
            stub: None,
            _signature: PhantomData,
        }
    }

    /// Creates an [`FnRef`] that calls `function`.
    #[inline]
    pub fn from_fn(function: S::FnPtr) -> Self
    where
        S::FnPtr: Callable<S>,
    {
        Self {
            target: RawTarget::from_fn(function),
            stub: Some(<S::FnPtr as Callable<S>>::INVOKE),
            _signature: PhantomData,
        }
    }

    /// Creates an [`FnRef`] that calls the borrowed `callee`.
    ///
    /// The borrow must outlive the lifetime bound of `S`, which the bound
    /// `&'f F: Callable<S>` enforces.
    #[inline]
    pub fn from_ref<'f, F>(callee: &'f F) -> Self
    where
        &'f F: Callable<S>,
    {
        Self {
            target: RawTarget::from_object(callee),
            stub: Some(<&'f F as Callable<S>>::INVOKE),
            _signature: PhantomData,
        }
    }

    /// Returns `true` if this refers to a callee.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.stub.is_some()
    }
}

impl<S: Signature + ?Sized> Default for FnRef<S> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<S: Signature + ?Sized> Clone for FnRef<S> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: Signature + ?Sized> Copy for FnRef<S> {}

impl<S: Signature + ?Sized> PartialEq for FnRef<S> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        // Stub addresses are only stable within one crate
        self.stub == other.stub && self.target == other.target
    }
}

impl<S: Signature + ?Sized> Eq for FnRef<S> {}

impl<S: Signature + ?Sized> fmt::Debug for FnRef<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            f.debug_tuple("FnRef").field(&self.target).finish()
        } else {
            f.write_str("FnRef(<empty>)")
        }
    }
}

macro_rules! impl_fn_ref {
    ($($arg:ident: $ty:ident),*) => {
        impl_fn_ref!(@flavour [] ($($arg: $ty),*));
        impl_fn_ref!(@flavour [+ Send + Sync] ($($arg: $ty),*));
    };

    (@flavour [$($bounds:tt)*] ($($arg:ident: $ty:ident),*)) => {
        impl<'a, R: 'static, $($ty: 'static,)*> FnRef<dyn Fn($($ty),*) -> R $($bounds)* + 'a> {
            /// Calls the callee.
            ///
            /// # Panics
            ///
            /// Panics with [`UninitializedError`] if this [`FnRef`] is empty.
            #[inline]
            #[track_caller]
            pub fn call(&self, $($arg: $ty),*) -> R {
                match self.stub {
                    // SAFETY: `stub` was created together with `target`, and the
                    // callee outlives `self`.
                    Some(invoke) => unsafe { invoke(self.target.as_payload(), $($arg),*) },
                    None => uninitialized(type_name::<Self>()),
                }
            }

            /// Calls the callee, or returns [`UninitializedError`] if this
            /// [`FnRef`] is empty.
            #[inline]
            pub fn try_call(&self, $($arg: $ty),*) -> Result<R, UninitializedError> {
                let invoke = self.stub.ok_or(UninitializedError)?;
                // SAFETY: `stub` was created together with `target`, and the
                // callee outlives `self`.
                Ok(unsafe { invoke(self.target.as_payload(), $($arg),*) })
            }

            /// Calls the callee if this [`FnRef`] is not empty.
            #[inline]
            pub fn call_if(&self, $($arg: $ty),*) -> Option<R> {
                self.try_call($($arg),*).ok()
            }

            /// Calls the callee, or `alternative` if this [`FnRef`] is empty.
            #[inline]
            pub fn call_or<G>(&self, alternative: G, $($arg: $ty),*) -> R
            where
                G: FnOnce($($ty),*) -> R,
            {
                match self.stub {
                    // SAFETY: `stub` was created together with `target`, and the
                    // callee outlives `self`.
                    Some(invoke) => unsafe { invoke(self.target.as_payload(), $($arg),*) },
                    None => alternative($($arg),*),
                }
            }
        }
    };
}

for_each_arity!(impl_fn_ref);
