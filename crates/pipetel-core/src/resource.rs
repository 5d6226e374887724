//! Contracts for resource sampling and the metrics store.
//!
//! The concrete hardware-counter sampler and metrics store live outside this
//! crate (`pipetel-exec` ships software stand-ins). We keep only traits here so
//! any crate can depend on the API without pulling in an implementation.

use serde::{Deserialize, Serialize};

use crate::config::{ExecutionMode, MetricsComponent};

/// Hardware performance counters; zero when the sampler has no PMU access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareCounters {
    pub cpu_cycles: u64,
    pub instructions: u64,
    pub cache_references: u64,
    pub cache_misses: u64,
    pub ref_cpu_cycles: u64,
}

/// Snapshot produced by a `ResourceTracker` after `stop`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMetrics {
    /// Sampling start, microseconds since the Unix epoch.
    pub start_us: u64,
    pub elapsed_us: u64,
    pub cpu_id: u32,
    pub counters: HardwareCounters,
    pub disk_bytes_read: u64,
    pub disk_bytes_written: u64,
    /// Memory footprint attributed to the sampled window.
    pub memory_bytes: u64,
}

/// Per-thread resource sampler.
///
/// Invariants:
/// - `start` while running restarts the window.
/// - `metrics` reflects the last completed window.
pub trait ResourceTracker: Send {
    fn start(&mut self);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
    fn metrics(&self) -> &ResourceMetrics;
    fn set_memory(&mut self, bytes: u64);
}

/// Telemetry enablement + sink for whole-execution resource data.
///
/// Checked before paying any accumulation cost. Shared across workers, so
/// implementations must be internally synchronized.
pub trait MetricsStore: Send + Sync {
    /// Whether the component is switched on at all.
    fn component_enabled(&self, component: MetricsComponent) -> bool;

    /// Whether *this* request should be recorded (enabled + sampling decision).
    fn component_to_record(&self, component: MetricsComponent) -> bool {
        self.component_enabled(component)
    }

    fn record_execution_data(&self, name: &str, mode: ExecutionMode, metrics: &ResourceMetrics);
}
