//! The mutual-exclusion capability.
//!
//! Nothing in this crate locks on its own. Callers that share an
//! [`InplaceFn`](crate::InplaceFn) or the buffer behind a view between
//! threads or interrupt contexts serialize access with a [`Lockable`], which
//! is usually implemented over the primitive of the surrounding RTOS.
//! [`SpinLock`] is a portable implementation for targets without one.

use core::{fmt, marker::PhantomData};

/// A lock that is acquired and released explicitly, without a guard.
///
/// Prefer [`lock`] and [`try_lock`], which release through a [`LockGuard`].
pub trait Lockable {
    /// Blocks until the lock is held by the caller.
    fn acquire(&self);

    /// Acquires the lock if it is free. Returns `true` on success.
    fn try_acquire(&self) -> bool;

    /// Releases the lock.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The lock is held by the caller, through a successful
    ///    [`acquire`](Lockable::acquire) or
    ///    [`try_acquire`](Lockable::try_acquire) that was not released yet.
    unsafe fn release(&self);
}

impl<L: Lockable + ?Sized> Lockable for &L {
    #[inline]
    fn acquire(&self) {
        L::acquire(self);
    }

    #[inline]
    fn try_acquire(&self) -> bool {
        L::try_acquire(self)
    }

    #[inline]
    unsafe fn release(&self) {
        // SAFETY: Forwarded from the caller.
        unsafe { L::release(self) }
    }
}

/// A spinning lock without a protected value.
///
/// # Examples
///
/// ```
/// use inplace::sync::{Lockable, SpinLock, lock};
///
/// static BUS: SpinLock = SpinLock::new();
///
/// {
///     let _guard = lock(&BUS);
///     assert!(!BUS.try_acquire());
/// }
/// assert!(BUS.try_acquire());
/// // SAFETY: The lock was acquired just above.
/// unsafe { BUS.release() };
/// ```
pub struct SpinLock {
    inner: spin::Mutex<()>,
}

impl SpinLock {
    /// Creates an unlocked [`SpinLock`].
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {
            inner: spin::Mutex::new(()),
        }
    }

    /// Returns `true` if the lock is currently held.
    ///
    /// The answer may be outdated by the time it is read.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }
}

impl Default for SpinLock {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SpinLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinLock")
            .field("locked", &self.is_locked())
            .finish()
    }
}

impl Lockable for SpinLock {
    #[inline]
    fn acquire(&self) {
        // The lock stays held until `release`.
        core::mem::forget(self.inner.lock());
    }

    #[inline]
    fn try_acquire(&self) -> bool {
        self.inner.try_lock().map(core::mem::forget).is_some()
    }

    #[inline]
    unsafe fn release(&self) {
        // SAFETY: The caller holds the lock, whose guard was forgotten by
        // `acquire` or `try_acquire`.
        unsafe { self.inner.force_unlock() }
    }
}

/// Holds a [`Lockable`] and releases it when dropped.
///
/// The guard must be dropped on the thread that acquired the lock, so it is
/// neither [`Send`] nor [`Sync`].
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard<'a, L: Lockable + ?Sized> {
    lock: &'a L,
    _not_send: PhantomData<*const ()>,
}

impl<L: Lockable + ?Sized> Drop for LockGuard<'_, L> {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: The guard is only created after the lock was acquired, and
        // it releases exactly once.
        unsafe { self.lock.release() }
    }
}

impl<L: Lockable + ?Sized> fmt::Debug for LockGuard<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LockGuard")
    }
}

/// Acquires `lock`, blocking until it is available.
#[inline]
pub fn lock<L: Lockable + ?Sized>(lock: &L) -> LockGuard<'_, L> {
    lock.acquire();
    LockGuard {
        lock,
        _not_send: PhantomData,
    }
}

/// Acquires `lock` if it is free.
#[inline]
pub fn try_lock<L: Lockable + ?Sized>(lock: &L) -> Option<LockGuard<'_, L>> {
    if lock.try_acquire() {
        Some(LockGuard {
            lock,
            _not_send: PhantomData,
        })
    } else {
        tracing::trace!(lock = core::any::type_name::<L>(), "lock is contended");
        None
    }
}
