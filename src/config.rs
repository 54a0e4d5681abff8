//! Knobs that tune allocation and I/O behavior without touching the
//! happens-before semantics in [`crate::race`].

use std::path::PathBuf;

/// Where race reports go. Stderr is the default so a freshly-built detector
/// is useful without any configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkDestination {
    Stderr,
    File(PathBuf),
}

impl Default for SinkDestination {
    fn default() -> SinkDestination {
        SinkDestination::Stderr
    }
}

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Hint for the number of distinct locks the lock registry will see.
    pub lock_capacity_hint: usize,
    /// Hint for the number of distinct monitored addresses the memory
    /// access table will see.
    pub memory_capacity_hint: usize,
    pub sink_destination: SinkDestination,
    /// When set, `on_unlock_enter` for a lock the registry never saw
    /// acquired is logged at warn level and ignored rather than treated as
    /// a fatal invariant violation. Symptom of a host that misses
    /// `on_lock_enter` under sampled instrumentation; never the default.
    pub tolerate_unknown_lock_release: bool,
}

impl Default for DetectorConfig {
    fn default() -> DetectorConfig {
        DetectorConfig {
            lock_capacity_hint: 0,
            memory_capacity_hint: 0,
            sink_destination: SinkDestination::default(),
            tolerate_unknown_lock_release: false,
        }
    }
}
