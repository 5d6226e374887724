//! In-memory metrics store.
//!
//! Holds per-component enablement flags and a sampling counter, and keeps
//! whole-execution resource data until someone drains it. Persisting the data
//! is left to the caller.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;

use pipetel_core::config::{ExecutionMode, MetricsComponent, TelemetryConfig};
use pipetel_core::resource::{MetricsStore, ResourceMetrics};

const NUM_COMPONENTS: usize = MetricsComponent::ALL.len();

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionDataRecord {
    pub name: String,
    pub mode: ExecutionMode,
    pub metrics: ResourceMetrics,
}

#[derive(Debug)]
pub struct InMemoryMetricsStore {
    enabled: [AtomicBool; NUM_COMPONENTS],
    requests: [AtomicU64; NUM_COMPONENTS],
    sample_interval: u64,
    execution_data: Mutex<Vec<ExecutionDataRecord>>,
}

impl InMemoryMetricsStore {
    /// Every component disabled, no sampling.
    pub fn new() -> Self {
        Self {
            enabled: Default::default(),
            requests: Default::default(),
            sample_interval: 1,
            execution_data: Mutex::new(Vec::new()),
        }
    }

    pub fn from_config(cfg: &TelemetryConfig) -> Self {
        let mut store = Self::new();
        store.sample_interval = u64::from(cfg.sample_interval.max(1));
        for c in &cfg.components {
            store.enable(*c);
        }
        store
    }

    pub fn enable(&self, component: MetricsComponent) {
        self.enabled[component.index()].store(true, Ordering::Release);
    }

    pub fn disable(&self, component: MetricsComponent) {
        self.enabled[component.index()].store(false, Ordering::Release);
    }

    pub fn take_execution_data(&self) -> Vec<ExecutionDataRecord> {
        std::mem::take(&mut *self.execution_data.lock())
    }
}

impl Default for InMemoryMetricsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsStore for InMemoryMetricsStore {
    fn component_enabled(&self, component: MetricsComponent) -> bool {
        self.enabled[component.index()].load(Ordering::Acquire)
    }

    fn component_to_record(&self, component: MetricsComponent) -> bool {
        if !self.component_enabled(component) {
            return false;
        }
        let n = self.requests[component.index()].fetch_add(1, Ordering::Relaxed);
        n % self.sample_interval == 0
    }

    fn record_execution_data(&self, name: &str, mode: ExecutionMode, metrics: &ResourceMetrics) {
        self.execution_data.lock().push(ExecutionDataRecord {
            name: name.to_string(),
            mode,
            metrics: *metrics,
        });
    }
}
