//! Sync primitives used throughout the detector, wrapped so the whole crate
//! can be exercised under `loom` in addition to running for real.
//!
//! Loom and parking_lot expose slightly different APIs (loom's locks are
//! poisonable, parking_lot's are not), so every lock the detector takes goes
//! through `Mutex`/`RwLock` here rather than either library directly.

#[cfg(loom)]
pub(crate) use loom::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
#[cfg(loom)]
pub(crate) use loom::sync::Arc;

#[cfg(not(loom))]
pub(crate) use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
#[cfg(not(loom))]
pub(crate) use std::sync::Arc;

#[cfg(loom)]
type InnerMutex<T> = loom::sync::Mutex<T>;
#[cfg(loom)]
pub(crate) type MutexGuard<'a, T> = loom::sync::MutexGuard<'a, T>;
#[cfg(not(loom))]
type InnerMutex<T> = parking_lot::Mutex<T>;
#[cfg(not(loom))]
pub(crate) type MutexGuard<'a, T> = parking_lot::MutexGuard<'a, T>;

#[derive(Default)]
pub(crate) struct Mutex<T> {
    inner: InnerMutex<T>,
}

impl<T> Mutex<T> {
    pub fn new(t: T) -> Mutex<T> {
        Mutex {
            inner: InnerMutex::new(t),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, T> {
        #[cfg(loom)]
        return self.inner.lock().unwrap();
        #[cfg(not(loom))]
        return self.inner.lock();
    }
}

#[cfg(loom)]
type InnerRwLock<T> = loom::sync::RwLock<T>;
#[cfg(loom)]
pub(crate) type RwLockReadGuard<'r, T> = loom::sync::RwLockReadGuard<'r, T>;
#[cfg(loom)]
pub(crate) type RwLockWriteGuard<'w, T> = loom::sync::RwLockWriteGuard<'w, T>;

#[cfg(not(loom))]
type InnerRwLock<T> = parking_lot::RwLock<T>;
#[cfg(not(loom))]
pub(crate) type RwLockReadGuard<'r, T> = parking_lot::RwLockReadGuard<'r, T>;
#[cfg(not(loom))]
pub(crate) type RwLockWriteGuard<'w, T> = parking_lot::RwLockWriteGuard<'w, T>;

#[derive(Default)]
pub(crate) struct RwLock<T> {
    inner: InnerRwLock<T>,
}

impl<T> RwLock<T> {
    pub fn new(t: T) -> RwLock<T> {
        RwLock {
            inner: InnerRwLock::new(t),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        #[cfg(loom)]
        return self.inner.read().unwrap();
        #[cfg(not(loom))]
        return self.inner.read();
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        #[cfg(loom)]
        return self.inner.write().unwrap();
        #[cfg(not(loom))]
        return self.inner.write();
    }
}
