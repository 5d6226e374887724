//! Per-worker execution context: pipeline feature tracking and resource sampling.
//!
//! Flow per pipeline:
//! - `start_pipeline_tracker` copies the planner's features, resets memory
//!   accounting, starts sampling if the store records pipelines, and fires the
//!   `pipeline__start` marker.
//! - Operators refine rows/cardinality/loops through `record_feature`.
//! - `end_pipeline_tracker` stops sampling, resolves the memory footprint,
//!   and hands a `TelemetryRecord` to the `pipeline__done` consumer.
//!
//! When the store is absent or the component is disabled, feature calls return
//! before touching any state.

use std::sync::Arc;

use pipetel_core::config::{ExecutionMode, MetricsComponent, TelemetryConfig};
use pipetel_core::feature::{FeatureAttribute, PipelineFeatureProvider};
use pipetel_core::id::{FeatureId, PipelineId, QueryId};
use pipetel_core::record::TelemetryRecord;
use pipetel_mem::MemoryTracker;
use pipetel_probe::{names, NullProbe, Probe, TracepointRegistry};

use crate::pipeline::PipelineFeatureTracker;
use crate::worker::WorkerTelemetry;

/// The two pipeline tracepoints.
#[derive(Clone)]
pub struct PipelineProbes {
    /// Fire-and-forget marker, no payload.
    pub started: Arc<dyn Probe>,
    /// Acknowledged handoff of the encoded `TelemetryRecord`.
    pub done: Arc<dyn Probe>,
}

impl PipelineProbes {
    pub fn new(started: Arc<dyn Probe>, done: Arc<dyn Probe>) -> Self {
        Self { started, done }
    }

    pub fn from_registry(registry: &TracepointRegistry) -> Self {
        Self {
            started: registry.register(names::PIPELINE_START),
            done: registry.register(names::PIPELINE_DONE),
        }
    }

    pub fn disabled() -> Self {
        Self {
            started: Arc::new(NullProbe::new(names::PIPELINE_START)),
            done: Arc::new(NullProbe::new(names::PIPELINE_DONE)),
        }
    }
}

impl std::fmt::Debug for PipelineProbes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineProbes")
            .field("started", &self.started.name())
            .field("done", &self.done.name())
            .finish()
    }
}

pub struct ExecutionContext {
    execution_mode: ExecutionMode,
    worker: WorkerTelemetry,
    provider: Arc<dyn PipelineFeatureProvider>,
    probes: PipelineProbes,
    tracker: PipelineFeatureTracker,
    memory_use_override: Option<u64>,
}

impl ExecutionContext {
    pub fn new(
        execution_mode: ExecutionMode,
        worker: WorkerTelemetry,
        provider: Arc<dyn PipelineFeatureProvider>,
        probes: PipelineProbes,
    ) -> Self {
        Self {
            execution_mode,
            worker,
            provider,
            probes,
            tracker: PipelineFeatureTracker::new(),
            memory_use_override: None,
        }
    }

    /// Takes the execution mode and memory override from `cfg`.
    pub fn from_config(
        cfg: &TelemetryConfig,
        worker: WorkerTelemetry,
        provider: Arc<dyn PipelineFeatureProvider>,
        probes: PipelineProbes,
    ) -> Self {
        let mut ctx = Self::new(cfg.execution_mode, worker, provider, probes);
        ctx.memory_use_override = cfg.memory_use_override;
        ctx
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        self.execution_mode
    }

    pub fn worker(&self) -> &WorkerTelemetry {
        &self.worker
    }

    /// Operators report allocations here.
    pub fn memory_tracker(&self) -> &Arc<MemoryTracker> {
        self.worker.memory()
    }

    pub fn pipeline_tracker(&self) -> &PipelineFeatureTracker {
        &self.tracker
    }

    /// Report `bytes` as every pipeline's footprint instead of the measured size.
    pub fn set_memory_use_override(&mut self, bytes: u64) {
        self.memory_use_override = Some(bytes);
    }

    pub fn clear_memory_use_override(&mut self) {
        self.memory_use_override = None;
    }

    /// Begin whole-execution resource sampling.
    pub fn start_resource_tracker(&mut self, component: MetricsComponent) {
        assert_eq!(
            component,
            MetricsComponent::Execution,
            "start_resource_tracker() invoked with incorrect MetricsComponent"
        );
        if self.worker.component_to_record(component) {
            self.worker.resource_tracker_mut().start();
            self.worker.memory().reset();
        }
    }

    /// Finish whole-execution sampling and hand the metrics to the store.
    pub fn end_resource_tracker(&mut self, name: &str) {
        let Some(store) = self.worker.store().cloned() else {
            return;
        };
        if !self.worker.resource_tracker().is_running() {
            return;
        }
        let memory_bytes = self.worker.memory().allocated_size();
        let tracker = self.worker.resource_tracker_mut();
        tracker.stop();
        tracker.set_memory(memory_bytes);
        store.record_execution_data(name, self.execution_mode, tracker.metrics());

        #[cfg(feature = "tracing")]
        tracing::debug!(name, memory_bytes, "execution resources recorded");
    }

    pub fn start_pipeline_tracker(&mut self, pipeline: PipelineId) {
        self.worker.memory().reset();

        let provider = Arc::clone(&self.provider);
        let features = provider
            .pipeline_features(pipeline)
            .unwrap_or_else(|| panic!("no operating units recorded for {pipeline}"));

        let sampling = self
            .worker
            .component_to_record(MetricsComponent::ExecutionPipeline);
        self.tracker.activate(pipeline, features, sampling);
        if sampling {
            self.worker.pipeline_resource_tracker_mut().start();
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(%pipeline, features = features.len(), sampling, "pipeline started");

        self.probes.started.emit(None);
    }

    /// Refine one attribute of one feature of the current pipeline.
    pub fn record_feature(
        &mut self,
        pipeline: PipelineId,
        feature: FeatureId,
        attribute: FeatureAttribute,
        value: u64,
    ) {
        if !self
            .worker
            .component_enabled(MetricsComponent::ExecutionPipeline)
        {
            return;
        }
        self.tracker
            .feature_mut(pipeline, feature)
            .set(attribute, value);
    }

    /// Read back rows or cardinality. `None` when nothing is being recorded.
    pub fn get_feature(
        &self,
        pipeline: PipelineId,
        feature: FeatureId,
        attribute: FeatureAttribute,
    ) -> Option<u64> {
        if !self.tracker.is_active()
            || !self
                .worker
                .component_enabled(MetricsComponent::ExecutionPipeline)
        {
            return None;
        }
        Some(self.tracker.feature(pipeline, feature).get(attribute))
    }

    /// Close the current pipeline. Returns the record handed to the
    /// `pipeline__done` consumer, or `None` if nobody is attached.
    ///
    /// Blocks until an attached consumer has finished reading the record.
    pub fn end_pipeline_tracker(
        &mut self,
        query: QueryId,
        pipeline: PipelineId,
    ) -> Option<TelemetryRecord> {
        let sampling = self.tracker.expect_current(pipeline);
        let memory_bytes = self
            .memory_use_override
            .unwrap_or_else(|| self.worker.memory().allocated_size());

        if sampling {
            let tracker = self.worker.pipeline_resource_tracker_mut();
            assert!(
                tracker.is_running(),
                "resource sampling stopped before {pipeline} ended"
            );
            tracker.stop();
            tracker.set_memory(memory_bytes);
        }

        let record = if self.probes.done.is_enabled() {
            let record = TelemetryRecord::from_features(
                query,
                pipeline,
                self.execution_mode,
                memory_bytes,
                self.tracker.features(),
            );
            self.probes.done.emit_and_await_ack(&record.encode());
            Some(record)
        } else {
            None
        };

        #[cfg(feature = "tracing")]
        tracing::trace!(
            %query,
            %pipeline,
            memory_bytes,
            emitted = record.is_some(),
            "pipeline ended"
        );

        self.tracker.deactivate();
        record
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("execution_mode", &self.execution_mode)
            .field("worker", &self.worker)
            .field("probes", &self.probes)
            .field("tracker", &self.tracker)
            .field("memory_use_override", &self.memory_use_override)
            .finish()
    }
}
