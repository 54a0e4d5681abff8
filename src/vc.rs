//! Vector clocks: the core timestamp representation the happens-before engine
//! is built from. A [`VectorClock`] approximates a thread's knowledge of every
//! other thread's progress. Missing entries read as `0`.

use hashbrown::HashMap;

/// Identifies a thread. Assigned by the detector itself at
/// [`crate::thread_state::ThreadRegistry::on_thread_start`] and never reused
/// within a run, so a stale entry in some other thread's clock can never be
/// confused with a later, unrelated thread.
pub type ThreadId = u32;

/// A thread-local logical clock. Monotonically non-decreasing for a given
/// thread.
pub type Clock = u32;

/// Map from thread id to logical clock.
///
/// All mutation goes through `&mut self`; callers needing concurrent access
/// wrap a `VectorClock` in [`crate::types::Mutex`] rather than this type
/// locking itself, so a caller can hold the lock across a read-modify-write
/// sequence (e.g. join-then-increment) without double locking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VectorClock {
    entries: HashMap<ThreadId, Clock>,
}

impl VectorClock {
    pub fn new() -> VectorClock {
        VectorClock {
            entries: HashMap::new(),
        }
    }

    /// `vc[tid]`, or `0` if `tid` has never advanced this clock.
    pub fn get(&self, tid: ThreadId) -> Clock {
        self.entries.get(&tid).copied().unwrap_or(0)
    }

    pub fn set(&mut self, tid: ThreadId, clock: Clock) {
        self.entries.insert(tid, clock);
    }

    /// `vc[tid] += 1`. `tid` must already have an entry: callers only ever
    /// increment their own thread's slot, which is seeded to `1` when the
    /// thread starts (see invariant (b) in the data model).
    pub fn inc(&mut self, tid: ThreadId) {
        let clock = self
            .entries
            .get_mut(&tid)
            .expect("inc on a vector clock with no entry for the owning thread");
        let before = *clock;
        *clock += 1;
        more_asserts::assert_gt!(*clock, before);
    }

    /// `self` becomes value-equal to `src`. Mutates `self`'s existing map in
    /// place rather than replacing it wholesale, so any borrow that outlives
    /// this call still observes a live, consistent map rather than one that
    /// was freed and swapped out from under it.
    pub fn copy_from(&mut self, src: &VectorClock) {
        self.entries.clear();
        self.entries.extend(src.entries.iter().map(|(&t, &c)| (t, c)));
    }

    /// `self[tid] = max(self[tid], src[tid])` for every `tid`.
    pub fn join(&mut self, src: &VectorClock) {
        for (&tid, &clock) in src.entries.iter() {
            let entry = self.entries.entry(tid).or_insert(0);
            if clock > *entry {
                *entry = clock;
            }
        }
    }

    /// `true` iff `self[tid] <= other[tid]` for every `tid` either clock
    /// knows about.
    pub fn leq(&self, other: &VectorClock) -> bool {
        self.entries
            .iter()
            .all(|(&tid, &clock)| clock <= other.get(tid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entry_reads_as_zero() {
        let vc = VectorClock::new();
        assert_eq!(vc.get(1), 0);
    }

    #[test]
    fn inc_advances_only_named_thread() {
        let mut vc = VectorClock::new();
        vc.set(1, 1);
        vc.inc(1);
        assert_eq!(vc.get(1), 2);
        assert_eq!(vc.get(2), 0);
    }

    #[test]
    #[should_panic(expected = "inc on a vector clock")]
    fn inc_on_absent_thread_panics() {
        let mut vc = VectorClock::new();
        vc.inc(1);
    }

    #[test]
    fn join_is_pointwise_max() {
        let mut a = VectorClock::new();
        a.set(1, 3);
        a.set(2, 1);
        let mut b = VectorClock::new();
        b.set(1, 1);
        b.set(2, 5);
        b.set(3, 2);

        a.join(&b);
        assert_eq!(a.get(1), 3);
        assert_eq!(a.get(2), 5);
        assert_eq!(a.get(3), 2);
    }

    #[test]
    fn join_is_commutative() {
        let mut a = VectorClock::new();
        a.set(1, 3);
        a.set(2, 1);
        let mut b = VectorClock::new();
        b.set(1, 1);
        b.set(2, 5);

        let mut ab = a.clone();
        ab.join(&b);
        let mut ba = b.clone();
        ba.join(&a);
        assert_eq!(ab, ba);
    }

    #[test]
    fn join_is_idempotent() {
        let mut a = VectorClock::new();
        a.set(1, 3);
        a.set(2, 1);
        let b = a.clone();

        a.join(&b);
        assert_eq!(a, b);
    }

    #[test]
    fn leq_after_join_holds_both_ways() {
        let mut a = VectorClock::new();
        a.set(1, 3);
        let mut b = VectorClock::new();
        b.set(1, 1);
        b.set(2, 5);

        let mut joined = a.clone();
        joined.join(&b);

        assert!(a.leq(&joined));
        assert!(b.leq(&joined));
    }

    #[test]
    fn copy_from_replaces_contents_in_place() {
        let mut dst = VectorClock::new();
        dst.set(9, 9);
        let mut src = VectorClock::new();
        src.set(1, 1);
        src.set(2, 2);

        dst.copy_from(&src);
        assert_eq!(dst, src);
        assert_eq!(dst.get(9), 0);
    }

    #[test]
    fn leq_reflexive() {
        let mut a = VectorClock::new();
        a.set(1, 4);
        assert!(a.leq(&a.clone()));
    }
}
