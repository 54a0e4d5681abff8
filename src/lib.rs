//! A FastTrack-style dynamic data-race detector, driven by a host's binary
//! instrumentation through the callback API on [`Detector`].
//!
//! The detector tracks a vector clock per thread and per lock, and an
//! access-history epoch per monitored memory location; a race is reported
//! the moment a load or store is found not to happen-after the most recent
//! conflicting access. See [`RaceKind`] for the four kinds of race this can
//! report, and [`DetectorConfig`] for the knobs available without touching
//! detection semantics.
//!
//! ```no_run
//! use data_race_detector::{Detector, DetectorConfig};
//!
//! let detector = Detector::new(DetectorConfig::default()).expect("open sink");
//! detector.on_thread_start(1, None);
//! detector.on_store(0x1000, 1, 0xdeadbeef);
//! detector.on_thread_exit(1);
//! detector.shutdown();
//! ```

mod access_table;
mod concurrent_map;
mod config;
mod dispatcher;
mod epoch;
mod error;
mod lock_state;
mod race;
mod sink;
mod thread_state;
mod types;
mod vc;

pub use access_table::Addr;
pub use config::{DetectorConfig, SinkDestination};
pub use dispatcher::Detector;
pub use error::DetectorError;
pub use lock_state::LockPtr;
pub use race::RaceKind;
pub use thread_state::HostTid;
