//! Exclusive-access region standing in for the host's rendering context.
//!
//! Everything that touches staged or active resources, or the GPU, happens
//! inside [`Gate::enter`]. The gate is the only lock in the pipeline; decode
//! work never holds it.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Mutual-exclusion region around `T`.
#[derive(Debug, Default)]
pub struct Gate<T> {
    inner: Mutex<T>,
}

impl<T> Gate<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Enter the region. Leaving happens when the guard drops.
    ///
    /// A holder that panicked leaves the data as it was at the panic; the
    /// region stays usable.
    pub fn enter(&self) -> MutexGuard<'_, T> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            log::warn!("Gate was poisoned by a panicking holder, recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Run `f` inside the region.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.enter();
        f(&mut guard)
    }
}
