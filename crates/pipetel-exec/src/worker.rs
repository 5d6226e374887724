//! Per-worker telemetry capabilities.

use std::fmt;
use std::sync::Arc;

use pipetel_core::config::MetricsComponent;
use pipetel_core::resource::{MetricsStore, ResourceTracker};
use pipetel_mem::MemoryTracker;

use crate::sampler::ElapsedTimeTracker;

/// What a worker thread is constructed with: an optional shared metrics store,
/// its own resource samplers, and its own memory tracker.
///
/// Whole-execution and per-pipeline windows nest, so each gets its own
/// sampler.
pub struct WorkerTelemetry {
    store: Option<Arc<dyn MetricsStore>>,
    resource_tracker: Box<dyn ResourceTracker>,
    pipeline_resource_tracker: Box<dyn ResourceTracker>,
    memory: Arc<MemoryTracker>,
}

impl WorkerTelemetry {
    pub fn new(
        store: Option<Arc<dyn MetricsStore>>,
        resource_tracker: Box<dyn ResourceTracker>,
        pipeline_resource_tracker: Box<dyn ResourceTracker>,
    ) -> Self {
        Self {
            store,
            resource_tracker,
            pipeline_resource_tracker,
            memory: Arc::new(MemoryTracker::new()),
        }
    }

    /// Software samplers backed by `store`.
    pub fn with_store(store: Arc<dyn MetricsStore>) -> Self {
        Self::new(
            Some(store),
            Box::new(ElapsedTimeTracker::new()),
            Box::new(ElapsedTimeTracker::new()),
        )
    }

    /// No metrics store: every telemetry call is a no-op.
    pub fn disabled() -> Self {
        Self::new(
            None,
            Box::new(ElapsedTimeTracker::new()),
            Box::new(ElapsedTimeTracker::new()),
        )
    }

    pub fn store(&self) -> Option<&Arc<dyn MetricsStore>> {
        self.store.as_ref()
    }

    pub fn memory(&self) -> &Arc<MemoryTracker> {
        &self.memory
    }

    /// Sampler for the whole-execution window.
    pub fn resource_tracker(&self) -> &dyn ResourceTracker {
        self.resource_tracker.as_ref()
    }

    /// Sampler for the pipeline in flight.
    pub fn pipeline_resource_tracker(&self) -> &dyn ResourceTracker {
        self.pipeline_resource_tracker.as_ref()
    }

    pub(crate) fn resource_tracker_mut(&mut self) -> &mut dyn ResourceTracker {
        self.resource_tracker.as_mut()
    }

    pub(crate) fn pipeline_resource_tracker_mut(&mut self) -> &mut dyn ResourceTracker {
        self.pipeline_resource_tracker.as_mut()
    }

    pub(crate) fn component_enabled(&self, component: MetricsComponent) -> bool {
        self.store
            .as_ref()
            .is_some_and(|s| s.component_enabled(component))
    }

    pub(crate) fn component_to_record(&self, component: MetricsComponent) -> bool {
        self.store
            .as_ref()
            .is_some_and(|s| s.component_to_record(component))
    }
}

impl fmt::Debug for WorkerTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerTelemetry")
            .field("has_store", &self.store.is_some())
            .field("sampling", &self.resource_tracker.is_running())
            .field("pipeline_sampling", &self.pipeline_resource_tracker.is_running())
            .field("memory", &self.memory)
            .finish()
    }
}
