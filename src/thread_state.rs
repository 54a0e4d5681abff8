//! Per-thread state: each live thread known to the detector has a
//! [`ThreadState`] holding its vector clock and sync-nesting counter. States
//! are looked up by the identifier the host uses for the thread (e.g. a
//! `pthread_t`), not by the detector's own internal clock-slot id.

use crate::error::DetectorError;
use crate::types::{AtomicU32, AtomicUsize, Arc, Mutex, Ordering, RwLock};
use crate::vc::{ThreadId, VectorClock};
use hashbrown::HashMap;

/// The identifier the host uses to name a thread. Opaque to the detector;
/// only used as a lookup key.
pub type HostTid = u64;

/// Per-thread metadata tracked for the lifetime of one thread.
pub struct ThreadState {
    /// The clock slot this thread owns in every vector clock it appears in.
    /// Assigned once by the registry and never reused within a run.
    tid: ThreadId,
    /// The host's own identifier for this thread, kept around only to name
    /// it in diagnostics and fatal errors.
    host_tid: HostTid,
    vc: Mutex<VectorClock>,
    /// Nesting depth of lock/unlock interception the thread is currently
    /// inside. Memory accesses are suppressed whenever this is nonzero.
    in_sync_op: AtomicUsize,
}

impl ThreadState {
    fn new(tid: ThreadId, host_tid: HostTid) -> ThreadState {
        let mut vc = VectorClock::new();
        vc.set(tid, 1);
        ThreadState {
            tid,
            host_tid,
            vc: Mutex::new(vc),
            in_sync_op: AtomicUsize::new(0),
        }
    }

    pub fn tid(&self) -> ThreadId {
        self.tid
    }

    pub fn vc(&self) -> &Mutex<VectorClock> {
        &self.vc
    }

    /// `(tid, vc[tid])`: the point in this thread's own history that the
    /// current access happens at.
    pub fn current_epoch(&self) -> crate::epoch::Epoch {
        let clock = self.vc.lock().get(self.tid);
        crate::epoch::Epoch::new(self.tid, clock)
    }

    /// `T.vc[tid]`, a convenience for the FastTrack checks, which constantly
    /// ask "does this thread's clock dominate some other thread's epoch".
    pub fn clock_of(&self, other_tid: ThreadId) -> crate::vc::Clock {
        self.vc.lock().get(other_tid)
    }

    pub fn enter_sync_op(&self) {
        self.in_sync_op.fetch_add(1, Ordering::AcqRel);
    }

    /// Called from both `on_lock_exit` and `on_unlock_exit` (see the design
    /// notes on treating sync-nesting as a counter rather than a boolean).
    ///
    /// An exit with no matching enter is a fatal invariant violation (§7),
    /// surfaced as a typed error rather than a bare assert so the caller can
    /// log it with full context before aborting. Checks-then-decrements via
    /// a compare-exchange loop rather than an unconditional `fetch_sub`, so
    /// an imbalance is reported without first wrapping the counter around to
    /// `usize::MAX`.
    pub fn exit_sync_op(&self) -> Result<(), DetectorError> {
        loop {
            let prev = self.in_sync_op.load(Ordering::Acquire);
            if prev == 0 {
                return Err(DetectorError::UnbalancedSyncOp {
                    host_tid: self.host_tid,
                });
            }
            if self
                .in_sync_op
                .compare_exchange(prev, prev - 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Ok(());
            }
        }
    }

    pub fn in_sync_op(&self) -> bool {
        self.in_sync_op.load(Ordering::Acquire) > 0
    }
}

/// Tracks every live thread by the host's identifier for it, and hands out
/// detector-internal clock slots that are never recycled within a run: if a
/// slot were reused, a new thread starting at clock `1` could be read as
/// "happening before" stale high-clock entries left behind by the thread
/// that previously owned the slot.
pub struct ThreadRegistry {
    next_tid: AtomicU32,
    by_host_id: RwLock<HashMap<HostTid, Arc<ThreadState>>>,
}

impl ThreadRegistry {
    pub fn new() -> ThreadRegistry {
        ThreadRegistry {
            next_tid: AtomicU32::new(1),
            by_host_id: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, host_tid: HostTid) -> Option<Arc<ThreadState>> {
        self.by_host_id.read().get(&host_tid).cloned()
    }

    /// Allocate a new `ThreadState`, join it with `parent`'s clock if given,
    /// and publish it under `host_tid`.
    pub fn on_thread_start(
        &self,
        host_tid: HostTid,
        parent: Option<&Arc<ThreadState>>,
    ) -> Arc<ThreadState> {
        let tid = self.next_tid.fetch_add(1, Ordering::AcqRel);
        let state = Arc::new(ThreadState::new(tid, host_tid));

        if let Some(parent) = parent {
            // Single critical section on the parent's clock: the child
            // inherits everything the parent knew before creating it, then
            // the parent advances so later parent work isn't conflated with
            // the child's past.
            let mut parent_vc = parent.vc.lock();
            state.vc.lock().join(&parent_vc);
            parent_vc.inc(parent.tid);
        }

        self.by_host_id.write().insert(host_tid, Arc::clone(&state));
        state
    }

    pub fn on_thread_exit(&self, host_tid: HostTid) {
        self.by_host_id.write().remove(&host_tid);
    }
}

impl Default for ThreadRegistry {
    fn default() -> ThreadRegistry {
        ThreadRegistry::new()
    }
}
