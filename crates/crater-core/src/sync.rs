//! Scoped exclusive access.
//!
//! [`Mutex`] owns its value; the only way to reach it is through a [`Guard`],
//! which releases the lock when it goes out of scope on every exit path
//! (early return, `?`, unwinding).

use std::fmt;
use std::ops::{Deref, DerefMut};

/// Exclusive-access wrapper around a single value.
///
/// Handles share a `Mutex` through an `Arc`; the wrapper itself is never
/// cloned. Locking does not poison: a panic while holding a guard leaves the
/// value as it was at the panic point.
pub struct Mutex<T> {
    inner: parking_lot::Mutex<T>,
}

/// Proof of exclusive access to the value inside a [`Mutex`].
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct Guard<'a, T> {
    inner: parking_lot::MutexGuard<'a, T>,
}

impl<T> Mutex<T> {
    /// Wrap an existing value.
    pub fn new(value: T) -> Self {
        Self {
            inner: parking_lot::Mutex::new(value),
        }
    }

    /// Build the value in place from a constructor closure.
    pub fn new_with(init: impl FnOnce() -> T) -> Self {
        Self::new(init())
    }

    /// Block until exclusive access is obtained.
    pub fn lock(&self) -> Guard<'_, T> {
        Guard {
            inner: self.inner.lock(),
        }
    }

    /// Obtain exclusive access only if nobody else holds it.
    pub fn try_lock(&self) -> Option<Guard<'_, T>> {
        self.inner.try_lock().map(|inner| Guard { inner })
    }

    /// Mutable access without locking; `&mut self` already proves exclusivity.
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T: Default> Default for Mutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Mutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_lock() {
            Some(guard) => f.debug_struct("Mutex").field("data", &*guard).finish(),
            None => f.debug_struct("Mutex").field("data", &"<locked>").finish(),
        }
    }
}

impl<T> Deref for Guard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> DerefMut for Guard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T: fmt::Debug> fmt::Debug for Guard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}
