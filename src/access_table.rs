//! Memory access table: one [`AccessRecord`] per monitored address, created
//! on first access and kept for the life of the process.

use crate::concurrent_map::ShardedMap;
use crate::epoch::{ReadEpoch, WriteEpoch};
use crate::race::{self, RaceKind};
use crate::thread_state::ThreadState;
use crate::types::Mutex;
use crate::vc::VectorClock;

/// The address the host's instrumentation computed for a load/store.
pub type Addr = usize;

/// Per-location access metadata. The whole record is guarded by a single
/// mutex (invariant: "the record mutex is held strictly around every
/// mutation of M after initial publication").
#[derive(Default)]
pub struct AccessRecord {
    pub(crate) write_epoch: WriteEpoch,
    pub(crate) read_epoch: ReadEpoch,
    pub(crate) shared_reads: VectorClock,
}

pub struct MemoryAccessTable {
    records: ShardedMap<Addr, Mutex<AccessRecord>>,
}

impl MemoryAccessTable {
    pub fn new() -> MemoryAccessTable {
        MemoryAccessTable {
            records: ShardedMap::new(),
        }
    }

    pub fn with_capacity_hint(capacity_hint: usize) -> MemoryAccessTable {
        MemoryAccessTable {
            records: ShardedMap::with_capacity(16, capacity_hint),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn on_write(&self, addr: Addr, thread: &ThreadState) -> Option<RaceKind> {
        if thread.in_sync_op() {
            return None;
        }
        let epoch = thread.current_epoch();
        let record = self
            .records
            .get_or_insert_with(addr, || Mutex::new(AccessRecord::default()));
        let mut record = record.lock();
        race::classify_write(&mut record, epoch, thread)
    }

    pub fn on_read(&self, addr: Addr, thread: &ThreadState) -> Option<RaceKind> {
        if thread.in_sync_op() {
            return None;
        }
        let epoch = thread.current_epoch();
        let record = self
            .records
            .get_or_insert_with(addr, || Mutex::new(AccessRecord::default()));
        let mut record = record.lock();
        race::classify_read(&mut record, epoch, thread)
    }
}

impl Default for MemoryAccessTable {
    fn default() -> MemoryAccessTable {
        MemoryAccessTable::new()
    }
}
