//! The `Detector` facade: the host callback API from §6, wiring together
//! the thread registry, lock registry, memory access table and report
//! sink.
//!
//! The lock pointer is only ever delivered on the `_enter` half of a
//! lock/unlock pair (see the callback table), so the happens-before work
//! that needs it — join on acquire, publish on release — is done there;
//! the matching `_exit` call only closes the sync-op nesting the `_enter`
//! call opened.

use crate::access_table::{Addr, MemoryAccessTable};
use crate::config::DetectorConfig;
use crate::error::DetectorError;
use crate::lock_state::{LockPtr, LockRegistry};
use crate::sink::ReportSink;
use crate::thread_state::{HostTid, ThreadRegistry, ThreadState};
use crate::types::{AtomicBool, Arc, Ordering};
use std::io;

pub struct Detector {
    config: DetectorConfig,
    threads: ThreadRegistry,
    locks: LockRegistry,
    memory: MemoryAccessTable,
    sink: ReportSink,
    shutting_down: AtomicBool,
}

impl Detector {
    pub fn new(config: DetectorConfig) -> io::Result<Detector> {
        log::info!(
            "detector starting up (lock_capacity_hint={}, memory_capacity_hint={})",
            config.lock_capacity_hint,
            config.memory_capacity_hint
        );
        let sink = ReportSink::open(&config.sink_destination)?;
        Ok(Detector {
            locks: LockRegistry::with_capacity_hint(config.lock_capacity_hint),
            memory: MemoryAccessTable::with_capacity_hint(config.memory_capacity_hint),
            threads: ThreadRegistry::new(),
            sink,
            shutting_down: AtomicBool::new(false),
            config,
        })
    }

    /// Stop accepting new events and close the log. Lock and memory records
    /// live until process exit by design, so they are not individually
    /// freed here; dropping `Detector` at the end of the process reclaims
    /// them the ordinary way.
    pub fn shutdown(&self) {
        log::info!(
            "detector shutting down ({} locks seen, {} addresses seen)",
            self.locks.len(),
            self.memory.len()
        );
        self.shutting_down.store(true, Ordering::Release);
        self.sink.close();
    }

    fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    fn thread_or_panic(&self, host_tid: HostTid) -> Arc<ThreadState> {
        match self.threads.get(host_tid) {
            Some(t) => t,
            None => {
                let err = DetectorError::UnknownThread { host_tid };
                log::error!("{err}");
                panic!("{}", err);
            }
        }
    }

    fn exit_sync_op_or_panic(&self, thread: &ThreadState) {
        if let Err(err) = thread.exit_sync_op() {
            log::error!("{err}");
            panic!("{}", err);
        }
    }

    pub fn on_thread_start(&self, host_tid: HostTid, parent_host_tid: Option<HostTid>) {
        if self.is_shutting_down() {
            log::debug!("on_thread_start({host_tid:#x}) dropped during teardown");
            return;
        }
        let parent = parent_host_tid.and_then(|p| self.threads.get(p));
        self.threads.on_thread_start(host_tid, parent.as_ref());
        log::trace!("thread {host_tid:#x} started (parent={parent_host_tid:?})");
    }

    pub fn on_thread_exit(&self, host_tid: HostTid) {
        if self.is_shutting_down() {
            log::debug!("on_thread_exit({host_tid:#x}) dropped during teardown");
            return;
        }
        self.threads.on_thread_exit(host_tid);
        log::trace!("thread {host_tid:#x} exited");
    }

    pub fn on_lock_enter(&self, lock_ptr: LockPtr, host_tid: HostTid) {
        if self.is_shutting_down() {
            return;
        }
        let thread = self.thread_or_panic(host_tid);
        self.locks.acquire(lock_ptr, &thread);
    }

    pub fn on_lock_exit(&self, host_tid: HostTid) {
        if self.is_shutting_down() {
            return;
        }
        let thread = self.thread_or_panic(host_tid);
        self.exit_sync_op_or_panic(&thread);
    }

    pub fn on_unlock_enter(&self, lock_ptr: LockPtr, host_tid: HostTid) {
        if self.is_shutting_down() {
            return;
        }
        let thread = self.thread_or_panic(host_tid);
        thread.enter_sync_op();
        if let Err(DetectorError::UnknownLockRelease { lock }) =
            self.locks.release(lock_ptr, &thread)
        {
            if self.config.tolerate_unknown_lock_release {
                log::warn!(
                    "release of never-acquired lock {lock:#x} by thread {host_tid:#x}, ignoring"
                );
            } else {
                let err = DetectorError::UnknownLockRelease { lock };
                log::error!("{err}");
                panic!("{}", err);
            }
        }
    }

    pub fn on_unlock_exit(&self, host_tid: HostTid) {
        if self.is_shutting_down() {
            return;
        }
        let thread = self.thread_or_panic(host_tid);
        self.exit_sync_op_or_panic(&thread);
    }

    pub fn on_load(&self, addr: Addr, host_tid: HostTid, source_addr: usize) {
        if self.is_shutting_down() {
            return;
        }
        let thread = self.thread_or_panic(host_tid);
        if let Some(kind) = self.memory.on_read(addr, &thread) {
            self.sink.report(kind, source_addr);
        }
    }

    pub fn on_store(&self, addr: Addr, host_tid: HostTid, source_addr: usize) {
        if self.is_shutting_down() {
            return;
        }
        let thread = self.thread_or_panic(host_tid);
        if let Some(kind) = self.memory.on_write(addr, &thread) {
            self.sink.report(kind, source_addr);
        }
    }
}
