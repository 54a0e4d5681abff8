//! Typed failures. A detected race is *not* an error (see [`crate::race::RaceKind`]);
//! everything here is one of the fatal conditions this crate's design treats
//! as an invariant violation the detector cannot safely continue past.

use crate::lock_state::LockPtr;
use crate::thread_state::HostTid;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DetectorError {
    #[error("release of lock {lock:#x} that was never acquired")]
    UnknownLockRelease { lock: LockPtr },

    #[error("event for unknown thread {host_tid:#x}: missing on_thread_start")]
    UnknownThread { host_tid: HostTid },

    #[error("sync-op exit for thread {host_tid:#x} with no matching enter")]
    UnbalancedSyncOp { host_tid: HostTid },
}
