//! Lock state: one [`LockState`] per lock address the host has told us
//! about, holding the vector clock the last unlocker published. Acquiring a
//! lock pulls that knowledge into the acquirer's own clock; releasing
//! publishes the releaser's current knowledge for the next acquirer.

use crate::concurrent_map::ShardedMap;
use crate::error::DetectorError;
use crate::thread_state::ThreadState;
use crate::types::{Arc, Mutex};
use crate::vc::VectorClock;

/// The host-supplied address of a lock object. Opaque; used only as a map
/// key.
pub type LockPtr = usize;

pub struct LockState {
    vc: Mutex<VectorClock>,
}

impl LockState {
    fn new() -> LockState {
        LockState {
            vc: Mutex::new(VectorClock::new()),
        }
    }
}

/// Registry of every lock the detector has seen acquired at least once.
/// Entries are created lazily on first acquire and live until process exit
/// (mirrors the data model: "Lifetime: until process exit").
pub struct LockRegistry {
    locks: ShardedMap<LockPtr, LockState>,
}

impl LockRegistry {
    pub fn new() -> LockRegistry {
        LockRegistry {
            locks: ShardedMap::new(),
        }
    }

    pub fn with_capacity_hint(capacity_hint: usize) -> LockRegistry {
        LockRegistry {
            locks: ShardedMap::with_capacity(16, capacity_hint),
        }
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// `acquire`: join the acquiring thread's clock with the lock's
    /// published clock. Lock order is always thread-vc then lock-vc, which
    /// this is the only place that needs both at once.
    pub fn acquire(&self, lock: LockPtr, thread: &Arc<ThreadState>) {
        thread.enter_sync_op();
        let lock_state = self.locks.get_or_insert_with(lock, LockState::new);

        let mut thread_vc = thread.vc().lock();
        let lock_vc = lock_state.vc.lock();
        thread_vc.join(&lock_vc);
    }

    /// `release`: publish the releasing thread's clock onto the lock, then
    /// advance the thread's own clock so work after the release is
    /// distinguishable from whatever was just published.
    pub fn release(
        &self,
        lock: LockPtr,
        thread: &Arc<ThreadState>,
    ) -> Result<(), DetectorError> {
        let lock_state = self
            .locks
            .get(lock)
            .ok_or(DetectorError::UnknownLockRelease { lock })?;

        let mut thread_vc = thread.vc().lock();
        let mut lock_vc = lock_state.vc.lock();
        lock_vc.copy_from(&thread_vc);
        drop(lock_vc);
        thread_vc.inc(thread.tid());
        Ok(())
    }
}

impl Default for LockRegistry {
    fn default() -> LockRegistry {
        LockRegistry::new()
    }
}
