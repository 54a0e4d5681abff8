//! Epochs: a single thread's contribution to a vector clock, used wherever
//! the access table only needs to remember "who touched this last", not a
//! full clock.
//!
//! The source this detector is modeled on packs an epoch into a 32-bit word
//! (16 bits of thread id, 16 bits of clock) for cache density. We keep the
//! two fields apart instead: a packed representation only pays for itself
//! once profiling shows the access table is memory-bound, and packing here
//! would silently wrap instead of widen once either half crossed 16 bits,
//! which the design explicitly disallows.

use crate::vc::{Clock, ThreadId, VectorClock};

/// A `(thread id, logical clock)` pair identifying one point in a single
/// thread's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Epoch {
    pub tid: ThreadId,
    pub clock: Clock,
}

impl Epoch {
    pub fn new(tid: ThreadId, clock: Clock) -> Epoch {
        Epoch { tid, clock }
    }

    /// `epoch ⊑ vc` iff `vc[tid] >= clock`: every later event of `tid` as
    /// recorded by `vc` happened at or after this epoch.
    pub fn happens_before_or_eq(&self, vc: &VectorClock) -> bool {
        vc.get(self.tid) >= self.clock
    }
}

/// `M.write_epoch`: either no write has been observed yet, or the epoch of
/// the most recent one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteEpoch {
    #[default]
    Never,
    At(Epoch),
}

impl WriteEpoch {
    pub fn epoch(&self) -> Option<Epoch> {
        match self {
            WriteEpoch::Never => None,
            WriteEpoch::At(e) => Some(*e),
        }
    }
}

/// `M.read_epoch`: no read, a single reader's last epoch, or `SHARED`
/// (multiple concurrent readers; consult `M.shared_reads` instead).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadEpoch {
    #[default]
    Never,
    Single(Epoch),
    Shared,
}
