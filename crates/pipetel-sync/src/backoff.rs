//! Spin-then-yield backoff for busy-wait loops.

use std::hint::spin_loop;
use std::thread;

/// Doubles a pause count from 1 up to `SPIN_CEILING` (1, 2, 4, 8, 16 pause
/// hints), then hands the CPU back to the scheduler on every further round.
#[derive(Debug, Clone)]
pub struct SpinBackoff {
    pauses: u32,
}

impl SpinBackoff {
    pub const SPIN_CEILING: u32 = 16;

    pub fn new() -> Self {
        Self { pauses: 1 }
    }

    /// Perform one round of backoff.
    pub fn snooze(&mut self) {
        if self.pauses <= Self::SPIN_CEILING {
            for _ in 0..self.pauses {
                spin_loop();
            }
            self.pauses *= 2;
        } else {
            thread::yield_now();
        }
    }

    /// True once spinning is exhausted and each round yields.
    #[cfg(test)]
    fn is_yielding(&self) -> bool {
        self.pauses > Self::SPIN_CEILING
    }

    /// Block until `ready` returns true.
    pub fn wait_until(mut ready: impl FnMut() -> bool) {
        let mut backoff = Self::new();
        while !ready() {
            backoff.snooze();
        }
    }
}

impl Default for SpinBackoff {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spins_five_rounds_then_yields() {
        let mut backoff = SpinBackoff::new();
        for _ in 0..5 {
            assert!(!backoff.is_yielding());
            backoff.snooze();
        }
        assert!(backoff.is_yielding());

        // stays in the yield phase
        backoff.snooze();
        assert!(backoff.is_yielding());
    }

    #[test]
    fn test_wait_until_counts_rounds() {
        let mut calls = 0;
        SpinBackoff::wait_until(|| {
            calls += 1;
            calls == 8
        });
        assert_eq!(calls, 8);
    }
}
