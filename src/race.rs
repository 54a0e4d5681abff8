//! The FastTrack decision procedure: classifies a single read or write
//! against the access record for its address and the acting thread's vector
//! clock, producing at most one race verdict.

use crate::access_table::AccessRecord;
use crate::epoch::{Epoch, ReadEpoch, WriteEpoch};
use crate::thread_state::ThreadState;
use std::fmt;

/// A detected race, named after the two kinds of access involved in the
/// order they raced (first access, then the one that observed it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceKind {
    WriteWrite,
    ReadWrite,
    WriteRead,
    SharedWrite,
}

impl RaceKind {
    fn as_str(&self) -> &'static str {
        match self {
            RaceKind::WriteWrite => "Write-Write",
            RaceKind::ReadWrite => "Read-Write",
            RaceKind::WriteRead => "Write-Read",
            RaceKind::SharedWrite => "Shared-Write",
        }
    }
}

impl fmt::Display for RaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `on_write`: classify a store at `epoch` against `record`, which must
/// already be locked by the caller.
///
/// Write-write is checked, and reported, before read-write: a write
/// conflict dominates when both hold for the same access.
pub(crate) fn classify_write(
    record: &mut AccessRecord,
    epoch: Epoch,
    thread: &ThreadState,
) -> Option<RaceKind> {
    // Same-epoch shortcut: this exact access already published this write.
    if record.write_epoch.epoch() == Some(epoch) {
        return None;
    }

    // An absent write epoch trivially happens-before everything (there is
    // no prior writer to conflict with); an absent read epoch is the same.
    // Checking both unconditionally, rather than short-circuiting out the
    // moment one side has never been touched, is what lets a write that is
    // the very first write to a previously-read-only location still be
    // caught racing against those reads (and symmetrically in
    // `classify_read`).
    if let Some(w) = record.write_epoch.epoch() {
        if thread.clock_of(w.tid) < w.clock {
            return Some(RaceKind::WriteWrite);
        }
    }

    let verdict = match record.read_epoch {
        ReadEpoch::Never => None,
        ReadEpoch::Single(r) => {
            if thread.clock_of(r.tid) < r.clock {
                Some(RaceKind::ReadWrite)
            } else {
                None
            }
        }
        ReadEpoch::Shared => {
            if !record.shared_reads.leq(&thread.vc().lock()) {
                Some(RaceKind::SharedWrite)
            } else {
                None
            }
        }
    };

    record.write_epoch = WriteEpoch::At(epoch);
    verdict
}

/// `on_read`: classify a load at `epoch` against `record`, which must
/// already be locked by the caller.
pub(crate) fn classify_read(
    record: &mut AccessRecord,
    epoch: Epoch,
    thread: &ThreadState,
) -> Option<RaceKind> {
    // Same-epoch shortcuts: this exact access already accounted for.
    match record.read_epoch {
        ReadEpoch::Single(r) if r == epoch => return None,
        ReadEpoch::Shared if record.shared_reads.get(epoch.tid) == epoch.clock => return None,
        _ => {}
    }

    if let Some(w) = record.write_epoch.epoch() {
        if thread.clock_of(w.tid) < w.clock {
            return Some(RaceKind::WriteRead);
        }
    }

    match record.read_epoch {
        ReadEpoch::Never => {
            record.read_epoch = ReadEpoch::Single(epoch);
        }
        ReadEpoch::Single(r) => {
            if thread.clock_of(r.tid) >= r.clock {
                record.read_epoch = ReadEpoch::Single(epoch);
            } else {
                // Concurrent reader: promote to a full shared vector,
                // seeding it from the prior single-reader entry before
                // overwriting read_epoch, never the other way around.
                record.shared_reads.set(r.tid, r.clock);
                record.shared_reads.set(epoch.tid, epoch.clock);
                record.read_epoch = ReadEpoch::Shared;
            }
        }
        ReadEpoch::Shared => {
            record.shared_reads.set(epoch.tid, epoch.clock);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread_state::ThreadRegistry;

    fn record() -> AccessRecord {
        AccessRecord::default()
    }

    #[test]
    fn first_write_is_race_free_and_recorded() {
        let threads = ThreadRegistry::new();
        let t = threads.on_thread_start(1, None);
        let mut rec = record();
        let verdict = classify_write(&mut rec, t.current_epoch(), &t);
        assert_eq!(verdict, None);
        assert_eq!(rec.write_epoch.epoch(), Some(t.current_epoch()));
    }

    #[test]
    fn same_thread_repeated_write_never_races() {
        let threads = ThreadRegistry::new();
        let t = threads.on_thread_start(1, None);
        let mut rec = record();
        classify_write(&mut rec, t.current_epoch(), &t);
        let verdict = classify_write(&mut rec, t.current_epoch(), &t);
        assert_eq!(verdict, None);
    }

    #[test]
    fn concurrent_unsynchronized_writes_race() {
        let threads = ThreadRegistry::new();
        let a = threads.on_thread_start(1, None);
        let b = threads.on_thread_start(2, None);
        let mut rec = record();

        classify_write(&mut rec, a.current_epoch(), &a);
        let verdict = classify_write(&mut rec, b.current_epoch(), &b);
        assert_eq!(verdict, Some(RaceKind::WriteWrite));
    }

    #[test]
    fn write_before_spawn_happens_before_childs_write() {
        let threads = ThreadRegistry::new();
        let a = threads.on_thread_start(1, None);
        let mut rec = record();
        // a's write happens strictly before it spawns b.
        classify_write(&mut rec, a.current_epoch(), &a);
        let b = threads.on_thread_start(2, Some(&a));

        // b inherited everything a knew about itself at spawn time, which
        // dominates the epoch a wrote at.
        let verdict = classify_write(&mut rec, b.current_epoch(), &b);
        assert_eq!(verdict, None);
    }

    #[test]
    fn concurrent_read_then_write_races() {
        let threads = ThreadRegistry::new();
        let a = threads.on_thread_start(1, None);
        let b = threads.on_thread_start(2, None);
        let mut rec = record();

        classify_read(&mut rec, a.current_epoch(), &a);
        let verdict = classify_write(&mut rec, b.current_epoch(), &b);
        assert_eq!(verdict, Some(RaceKind::ReadWrite));
    }

    #[test]
    fn concurrent_write_then_read_races() {
        let threads = ThreadRegistry::new();
        let a = threads.on_thread_start(1, None);
        let b = threads.on_thread_start(2, None);
        let mut rec = record();

        classify_write(&mut rec, a.current_epoch(), &a);
        let verdict = classify_read(&mut rec, b.current_epoch(), &b);
        assert_eq!(verdict, Some(RaceKind::WriteRead));
    }

    #[test]
    fn any_number_of_readers_without_a_writer_never_races() {
        let threads = ThreadRegistry::new();
        let mut rec = record();
        let readers: Vec<_> = (1..=5u64).map(|h| threads.on_thread_start(h, None)).collect();

        for r in &readers {
            assert_eq!(classify_read(&mut rec, r.current_epoch(), r), None);
        }
        assert_eq!(rec.read_epoch, ReadEpoch::Shared);
    }

    #[test]
    fn shared_reader_same_epoch_fast_path_is_race_free() {
        let threads = ThreadRegistry::new();
        let a = threads.on_thread_start(1, None);
        let b = threads.on_thread_start(2, None);
        let mut rec = record();
        classify_read(&mut rec, a.current_epoch(), &a);
        classify_read(&mut rec, b.current_epoch(), &b);
        assert_eq!(rec.read_epoch, ReadEpoch::Shared);

        // Re-reading at the same epoch must not need to touch anything new.
        assert_eq!(classify_read(&mut rec, a.current_epoch(), &a), None);
    }

    #[test]
    fn write_after_shared_reads_checks_whole_shared_vector() {
        let threads = ThreadRegistry::new();
        let a = threads.on_thread_start(1, None);
        let b = threads.on_thread_start(2, None);
        let c = threads.on_thread_start(3, None);
        let mut rec = record();

        classify_read(&mut rec, a.current_epoch(), &a);
        classify_read(&mut rec, b.current_epoch(), &b);
        assert_eq!(rec.read_epoch, ReadEpoch::Shared);

        // c never synchronized with a or b, so a write from c races.
        let verdict = classify_write(&mut rec, c.current_epoch(), &c);
        assert_eq!(verdict, Some(RaceKind::SharedWrite));
    }

    #[test]
    fn write_write_dominates_read_write_when_both_hold() {
        let threads = ThreadRegistry::new();
        let a = threads.on_thread_start(1, None);
        let b = threads.on_thread_start(2, None);
        let mut rec = record();

        classify_read(&mut rec, a.current_epoch(), &a);
        classify_write(&mut rec, a.current_epoch(), &a);
        // b is concurrent with both a's earlier read and its write.
        let verdict = classify_write(&mut rec, b.current_epoch(), &b);
        assert_eq!(verdict, Some(RaceKind::WriteWrite));
    }
}
