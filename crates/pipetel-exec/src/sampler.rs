//! Software resource sampler.
//!
//! Measures wall-clock time only; hardware counters stay zero. Used when no
//! PMU-backed sampler is wired into the worker.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use pipetel_core::resource::{ResourceMetrics, ResourceTracker};

#[derive(Debug, Default)]
pub struct ElapsedTimeTracker {
    started: Option<Instant>,
    metrics: ResourceMetrics,
}

impl ElapsedTimeTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResourceTracker for ElapsedTimeTracker {
    fn start(&mut self) {
        self.metrics = ResourceMetrics {
            start_us: now_micros(),
            ..Default::default()
        };
        self.started = Some(Instant::now());
    }

    fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.metrics.elapsed_us = started.elapsed().as_micros() as u64;
        }
    }

    fn is_running(&self) -> bool {
        self.started.is_some()
    }

    fn metrics(&self) -> &ResourceMetrics {
        &self.metrics
    }

    fn set_memory(&mut self, bytes: u64) {
        self.metrics.memory_bytes = bytes;
    }
}

fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64
}
