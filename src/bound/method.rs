use core::{any::type_name, fmt, marker::PhantomData};

use inplace_internals::Signature;

use crate::{
    error::{UninitializedError, uninitialized},
    util::ExclusivePtr,
};

/// A method bound to a shared reference to its object.
///
/// The signature `S` describes the call without the object: a
/// `MethodRef<'a, Motor, dyn Fn(u16) -> bool>` holds a `&'a Motor` and a
/// `fn(&Motor, u16) -> bool`. Both are copied along with the [`MethodRef`], so
/// every copy observes the same object.
///
/// Two [`MethodRef`]s are equal when both are empty, or when they hold the same
/// object address and the same method.
///
/// # Examples
///
/// ```
/// use core::cell::Cell;
///
/// use inplace::MethodRef;
///
/// struct Counter {
///     hits: Cell<u32>,
/// }
///
/// impl Counter {
///     fn hit(&self, weight: u32) -> u32 {
///         self.hits.set(self.hits.get() + weight);
///         self.hits.get()
///     }
/// }
///
/// let counter = Counter { hits: Cell::new(0) };
/// let hit = MethodRef::<Counter, dyn Fn(u32) -> u32>::new(&counter, Counter::hit);
/// let copy = hit;
///
/// assert_eq!(hit.call(2), 2);
/// assert_eq!(copy.call(3), 5);
/// assert_eq!(hit, copy);
/// ```
pub struct MethodRef<'a, T, S: Signature + ?Sized> {
    bound: Option<(&'a T, S::Method<T>)>,
    _signature: PhantomData<fn() -> PhantomData<S>>,
}

impl<'a, T, S: Signature + ?Sized> MethodRef<'a, T, S> {
    /// Creates an empty [`MethodRef`].
    #[inline]
    pub const fn empty() -> Self {
        Self {
            bound: None,
            _signature: PhantomData,
        }
    }

    /// Creates a [`MethodRef`] that calls `method` on `object`.
    #[inline]
    pub const fn new(object: &'a T, method: S::Method<T>) -> Self {
        Self {
            bound: Some((object, method)),
            _signature: PhantomData,
        }
    }

    /// Returns `true` if a method is bound.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.bound.is_some()
    }

    /// Returns the bound object, if any.
    #[inline]
    pub fn object(&self) -> Option<&'a T> {
        self.bound.map(|(object, _)| object)
    }
}

impl<T, S: Signature + ?Sized> Default for MethodRef<'_, T, S> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<T, S: Signature + ?Sized> Clone for MethodRef<'_, T, S> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, S: Signature + ?Sized> Copy for MethodRef<'_, T, S> {}

impl<T, S: Signature + ?Sized> PartialEq for MethodRef<'_, T, S> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self.bound, other.bound) {
            (None, None) => true,
            (Some((object, method)), Some((other_object, other_method))) => {
                core::ptr::eq(object, other_object) && method == other_method
            }
            _ => false,
        }
    }
}

impl<T, S: Signature + ?Sized> Eq for MethodRef<'_, T, S> {}

impl<T, S: Signature + ?Sized> fmt::Debug for MethodRef<'_, T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bound {
            Some((object, _)) => f
                .debug_struct("MethodRef")
                .field("object", &(object as *const T))
                .field("type", &type_name::<T>())
                .finish(),
            None => f.write_str("MethodRef(<empty>)"),
        }
    }
}

/// A method bound to an exclusive reference to its object.
///
/// This is the `&mut self` counterpart of [`MethodRef`]. Since copies share the
/// exclusive borrow, creating one is `unsafe`: the caller guarantees that
/// calls through the [`MethodMut`] and its copies never overlap.
///
/// # Examples
///
/// ```
/// use inplace::MethodMut;
///
/// struct Odometer {
///     metres: u64,
/// }
///
/// impl Odometer {
///     fn advance(&mut self, metres: u64) -> u64 {
///         self.metres += metres;
///         self.metres
///     }
/// }
///
/// let mut odometer = Odometer { metres: 0 };
/// {
///     // SAFETY: The callable is only used sequentially on this thread.
///     let advance = unsafe {
///         MethodMut::<Odometer, dyn Fn(u64) -> u64>::new(&mut odometer, Odometer::advance)
///     };
///     assert_eq!(advance.call(5), 5);
///     assert_eq!(advance.call(7), 12);
/// }
/// assert_eq!(odometer.metres, 12);
/// ```
pub struct MethodMut<'a, T, S: Signature + ?Sized> {
    bound: Option<(ExclusivePtr<'a, T>, S::MethodMut<T>)>,
    _signature: PhantomData<fn() -> PhantomData<S>>,
}

impl<'a, T, S: Signature + ?Sized> MethodMut<'a, T, S> {
    /// Creates an empty [`MethodMut`].
    #[inline]
    pub const fn empty() -> Self {
        Self {
            bound: None,
            _signature: PhantomData,
        }
    }

    /// Creates a [`MethodMut`] that calls `method` on `object`.
    ///
    /// # Safety
    ///
    /// The caller must ensure that calls through the returned [`MethodMut`]
    /// and through its copies never overlap, including reentrant calls from
    /// within `method`.
    #[inline]
    pub unsafe fn new(object: &'a mut T, method: S::MethodMut<T>) -> Self {
        Self {
            bound: Some((ExclusivePtr::new(object), method)),
            _signature: PhantomData,
        }
    }

    /// Returns `true` if a method is bound.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.bound.is_some()
    }
}

impl<T, S: Signature + ?Sized> Default for MethodMut<'_, T, S> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<T, S: Signature + ?Sized> Clone for MethodMut<'_, T, S> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, S: Signature + ?Sized> Copy for MethodMut<'_, T, S> {}

impl<T, S: Signature + ?Sized> PartialEq for MethodMut<'_, T, S> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.bound == other.bound
    }
}

impl<T, S: Signature + ?Sized> Eq for MethodMut<'_, T, S> {}

impl<T, S: Signature + ?Sized> fmt::Debug for MethodMut<'_, T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bound {
            Some((object, _)) => f
                .debug_struct("MethodMut")
                .field("object", &object)
                .field("type", &type_name::<T>())
                .finish(),
            None => f.write_str("MethodMut(<empty>)"),
        }
    }
}

macro_rules! impl_bound_methods {
    ($($arg:ident: $ty:ident),*) => {
        impl_bound_methods!(@flavour [] ($($arg: $ty),*));
        impl_bound_methods!(@flavour [+ Send + Sync] ($($arg: $ty),*));
    };

    (@flavour [$($bounds:tt)*] ($($arg:ident: $ty:ident),*)) => {
        impl<'a, 's, T, R: 'static, $($ty: 'static,)*> MethodRef<'a, T, dyn Fn($($ty),*) -> R $($bounds)* + 's> {
            /// Calls the method on the bound object.
            ///
            /// # Panics
            ///
            /// Panics with [`UninitializedError`] if no method is bound.
            #[inline]
            #[track_caller]
            pub fn call(&self, $($arg: $ty),*) -> R {
                match self.bound {
                    Some((object, method)) => method(object, $($arg),*),
                    None => uninitialized(type_name::<Self>()),
                }
            }

            /// Calls the method, or returns [`UninitializedError`] if no method
            /// is bound.
            #[inline]
            pub fn try_call(&self, $($arg: $ty),*) -> Result<R, UninitializedError> {
                let (object, method) = self.bound.ok_or(UninitializedError)?;
                Ok(method(object, $($arg),*))
            }

            /// Calls the method if one is bound.
            #[inline]
            pub fn call_if(&self, $($arg: $ty),*) -> Option<R> {
                self.try_call($($arg),*).ok()
            }

            /// Calls the method, or `alternative` if no method is bound.
            #[inline]
            pub fn call_or<G>(&self, alternative: G, $($arg: $ty),*) -> R
            where
                G: FnOnce($($ty),*) -> R,
            {
                match self.bound {
                    Some((object, method)) => method(object, $($arg),*),
                    None => alternative($($arg),*),
                }
            }
        }

        impl<'a, 's, T, R: 'static, $($ty: 'static,)*> MethodMut<'a, T, dyn Fn($($ty),*) -> R $($bounds)* + 's> {
            /// Calls the method on the bound object.
            ///
            /// # Panics
            ///
            /// Panics with [`UninitializedError`] if no method is bound.
            #[inline]
            #[track_caller]
            pub fn call(&self, $($arg: $ty),*) -> R {
                match self.bound {
                    Some((object, method)) => {
                        // SAFETY: Calls never overlap, as guaranteed by the caller of
                        // `MethodMut::new`.
                        let object = unsafe { object.as_mut() };
                        method(object, $($arg),*)
                    }
                    None => uninitialized(type_name::<Self>()),
                }
            }

            /// Calls the method, or returns [`UninitializedError`] if no method
            /// is bound.
            #[inline]
            pub fn try_call(&self, $($arg: $ty),*) -> Result<R, UninitializedError> {
                let (object, method) = self.bound.ok_or(UninitializedError)?;
                // SAFETY: Calls never overlap, as guaranteed by the caller of
                // `MethodMut::new`.
                let object = unsafe { object.as_mut() };
                Ok(method(object, $($arg),*))
            }

            /// Calls the method if one is bound.
            #[inline]
            pub fn call_if(&self, $($arg: $ty),*) -> Option<R> {
                self.try_call($($arg),*).ok()
            }

            /// Calls the method, or `alternative` if no method is bound.
            #[inline]
            pub fn call_or<G>(&self, alternative: G, $($arg: $ty),*) -> R
            where
                G: FnOnce($($ty),*) -> R,
            {
                match self.bound {
                    Some((object, method)) => {
                        // SAFETY: Calls never overlap, as guaranteed by the caller of
                        // `MethodMut::new`.
                        let object = unsafe { object.as_mut() };
                        method(object, $($arg),*)
                    }
                    None => alternative($($arg),*),
                }
            }
        }
    };
}

for_each_arity!(impl_bound_methods);

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;

    struct Gauge {
        level: Cell<i32>,
        total: i32,
    }

    impl Gauge {
        fn bump(&self, by: i32) -> i32 {
            self.level.set(self.level.get() + by);
            self.level.get()
        }

        fn peek(&self, _by: i32) -> i32 {
            self.level.get()
        }

        fn accumulate(&mut self, by: i32) -> i32 {
            self.total += by;
            self.total
        }
    }

    fn gauge() -> Gauge {
        Gauge {
            level: Cell::new(0),
            total: 0,
        }
    }

    type Sig = dyn Fn(i32) -> i32;

    #[test]
    fn test_method_ref_calls() {
        let gauge = gauge();
        let bump = MethodRef::<Gauge, Sig>::new(&gauge, Gauge::bump);
        assert!(bump.is_valid());
        assert_eq!(bump.call(2), 2);
        assert_eq!(bump.try_call(3), Ok(5));
        assert_eq!(bump.call_if(1), Some(6));
        assert_eq!(bump.call_or(|x: i32| -x, 1), 7);
        assert_eq!(gauge.level.get(), 7);
        assert!(core::ptr::eq(bump.object().unwrap(), &gauge));
    }

    #[test]
    fn test_method_ref_empty() {
        let empty = MethodRef::<Gauge, Sig>::empty();
        assert!(!empty.is_valid());
        assert_eq!(empty.try_call(1), Err(UninitializedError));
        assert_eq!(empty.call_if(1), None);
        assert_eq!(empty.call_or(|x: i32| x * 10, 4), 40);
        assert!(empty.object().is_none());
        assert_eq!(empty, MethodRef::default());
    }

    #[test]
    #[should_panic(expected = "invoked an uninitialized callable")]
    fn test_method_ref_call_empty_panics() {
        MethodRef::<Gauge, Sig>::empty().call(1);
    }

    #[test]
    fn test_method_ref_equality() {
        let first = gauge();
        let second = gauge();
        let bump = MethodRef::<Gauge, Sig>::new(&first, Gauge::bump);
        assert_eq!(bump, MethodRef::<Gauge, Sig>::new(&first, Gauge::bump));
        assert_ne!(bump, MethodRef::<Gauge, Sig>::new(&second, Gauge::bump));
        assert_ne!(bump, MethodRef::<Gauge, Sig>::new(&first, Gauge::peek));
        assert_ne!(bump, MethodRef::empty());
    }

    #[test]
    fn test_method_mut_calls() {
        let mut gauge = gauge();
        {
            // SAFETY: Calls happen sequentially on this thread.
            let accumulate = unsafe { MethodMut::<Gauge, Sig>::new(&mut gauge, Gauge::accumulate) };
            let copy = accumulate;
            assert_eq!(accumulate.call(4), 4);
            assert_eq!(copy.call(6), 10);
            assert_eq!(accumulate.try_call(1), Ok(11));
            assert_eq!(copy.call_if(1), Some(12));
            assert_eq!(accumulate.call_or(|x: i32| -x, 1), 13);
            assert_eq!(accumulate, copy);
        }
        assert_eq!(gauge.total, 13);
    }

    #[test]
    fn test_method_mut_empty() {
        let empty = MethodMut::<Gauge, Sig>::default();
        assert!(!empty.is_valid());
        assert_eq!(empty.try_call(1), Err(UninitializedError));
        assert_eq!(empty.call_or(|x: i32| x + 1, 1), 2);
        assert_eq!(std::format!("{empty:?}"), "MethodMut(<empty>)");
    }

    #[test]
    fn test_method_debug() {
        let gauge = gauge();
        assert_eq!(
            std::format!("{:?}", MethodRef::<Gauge, Sig>::empty()),
            "MethodRef(<empty>)"
        );
        let debug = std::format!("{:?}", MethodRef::<Gauge, Sig>::new(&gauge, Gauge::bump));
        assert!(debug.starts_with("MethodRef { object: 0x"));
        assert!(debug.contains("Gauge"));
    }
}
