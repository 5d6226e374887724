//! Cheap drain barrier.
//!
//! Readers `enter`/`exit` around sections that touch shared telemetry state; a
//! coordinator `traverse`s the gate to wait until every section open at that
//! moment has closed before it reconfigures the state. The reader side is a
//! single atomic add, so the gate stays cheap on hot paths.
//!
//! Entries may nest and may be opened on one thread and closed on another.
//!
//! **Warning:** a thread holding an entry must never traverse the same gate.
//! Its own entry keeps the count above zero and it will spin forever. This is
//! not detected.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::backoff::SpinBackoff;

#[derive(Debug, Default)]
pub struct Gate {
    count: AtomicI64,
}

impl Gate {
    pub const fn new() -> Self {
        Self {
            count: AtomicI64::new(0),
        }
    }

    /// Open an entry.
    pub fn enter(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    /// Close an entry opened by `enter`.
    pub fn exit(&self) {
        let prev = self.count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0, "gate exit without matching enter");
    }

    /// Number of entries currently open.
    pub fn open_entries(&self) -> i64 {
        self.count.load(Ordering::Acquire)
    }

    /// Block until no entries are open.
    ///
    /// Entries opened after this starts checking may or may not be waited on.
    pub fn traverse(&self) {
        let mut backoff = SpinBackoff::new();
        while self.count.load(Ordering::Acquire) > 0 {
            backoff.snooze();
        }
    }

    /// RAII entry: enters now, exits on drop (including unwinding).
    pub fn entry(&self) -> ScopedEntry<'_> {
        self.enter();
        ScopedEntry { gate: self }
    }

    /// RAII traversal: traverses the gate when the guard drops.
    pub fn traverse_on_drop(&self) -> ScopedTraverse<'_> {
        ScopedTraverse { gate: self }
    }
}

#[must_use = "dropping the entry immediately exits the gate"]
#[derive(Debug)]
pub struct ScopedEntry<'a> {
    gate: &'a Gate,
}

impl Drop for ScopedEntry<'_> {
    fn drop(&mut self) {
        self.gate.exit();
    }
}

#[must_use = "dropping the guard immediately traverses the gate"]
#[derive(Debug)]
pub struct ScopedTraverse<'a> {
    gate: &'a Gate,
}

impl Drop for ScopedTraverse<'_> {
    fn drop(&mut self) {
        self.gate.traverse();
    }
}
