//! Lightweight allocated/peak tracking hooks.
//!
//! Keep this optional and cheap. Counters are atomics so operators can share
//! the tracker through an `Arc` without locking.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct MemoryTracker {
    allocated_bytes: AtomicU64,
    peak_bytes: AtomicU64,
}

impl MemoryTracker {
    pub fn new() -> Self {
        Self {
            allocated_bytes: AtomicU64::new(0),
            peak_bytes: AtomicU64::new(0),
        }
    }

    /// Forget everything recorded so far (new accounting baseline).
    pub fn reset(&self) {
        self.allocated_bytes.store(0, Ordering::Relaxed);
        self.peak_bytes.store(0, Ordering::Relaxed);
    }

    /// Record an allocation; updates peak if higher.
    pub fn increment(&self, bytes: u64) {
        let used = self.allocated_bytes.fetch_add(bytes, Ordering::AcqRel) + bytes;
        let mut cur = self.peak_bytes.load(Ordering::Relaxed);
        while used > cur {
            match self.peak_bytes.compare_exchange(
                cur,
                used,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => cur = observed,
            }
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(
            used_bytes = used,
            peak = self.peak_bytes.load(Ordering::Relaxed),
            "mem usage"
        );
    }

    /// Record a release. Saturates at zero if releases outrun allocations
    /// (e.g. memory allocated before the last reset).
    pub fn decrement(&self, bytes: u64) {
        let _ = self
            .allocated_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Relaxed, |cur| {
                Some(cur.saturating_sub(bytes))
            });
    }

    pub fn allocated_size(&self) -> u64 {
        self.allocated_bytes.load(Ordering::Relaxed)
    }

    pub fn peak(&self) -> u64 {
        self.peak_bytes.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_increment_decrement_peak() {
        let t = MemoryTracker::new();
        t.increment(100);
        t.increment(50);
        t.decrement(120);
        assert_eq!(t.allocated_size(), 30);
        assert_eq!(t.peak(), 150);
    }

    #[test]
    fn test_reset_and_saturating_release() {
        let t = MemoryTracker::new();
        t.increment(64);
        t.reset();
        assert_eq!(t.allocated_size(), 0);
        assert_eq!(t.peak(), 0);
        t.decrement(64);
        assert_eq!(t.allocated_size(), 0);
    }

    #[test]
    fn test_concurrent_increments() {
        let t = Arc::new(MemoryTracker::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let t = Arc::clone(&t);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        t.increment(1);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("Thread panicked");
        }
        assert_eq!(t.allocated_size(), 8000);
        assert_eq!(t.peak(), 8000);
    }
}
