//! The fixed-format race report stream. Kept strictly separate from the
//! free-form diagnostics in [`crate::dispatcher`] that go through `log`:
//! this output is a contract consumed by tooling and tests, and must never
//! be interleaved with arbitrary log lines.

use crate::config::SinkDestination;
use crate::race::RaceKind;
use crate::types::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Stderr, Write};

enum Writer {
    Stderr(Stderr),
    File(File),
}

impl Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Writer::Stderr(w) => w.write(buf),
            Writer::File(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Writer::Stderr(w) => w.flush(),
            Writer::File(w) => w.flush(),
        }
    }
}

/// One line per race, serialized behind a single mutex: race frequency is
/// assumed low relative to memory-access frequency, so this is not a
/// contended path.
pub struct ReportSink {
    writer: Mutex<Writer>,
}

impl ReportSink {
    pub fn open(destination: &SinkDestination) -> io::Result<ReportSink> {
        let writer = match destination {
            SinkDestination::Stderr => Writer::Stderr(io::stderr()),
            SinkDestination::File(path) => Writer::File(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?,
            ),
        };
        Ok(ReportSink {
            writer: Mutex::new(writer),
        })
    }

    pub fn report(&self, kind: RaceKind, source_addr: usize) {
        let mut w = self.writer.lock();
        // A formatting/write failure here has nowhere useful to propagate
        // to (we're deep inside instrumented application code); best
        // effort only.
        let _ = writeln!(w, "{kind} race detected @ {source_addr:#x}");
    }

    pub fn close(&self) {
        let _ = self.writer.lock().flush();
    }
}
