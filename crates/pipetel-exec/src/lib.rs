#![forbid(unsafe_code)]
//! pipetel-exec: execution context, pipeline feature tracking, metrics store.
//!
//! One `ExecutionContext` per worker thread. The per-thread telemetry
//! capabilities (metrics store, resource sampler, memory tracker) are handed in
//! explicitly as a `WorkerTelemetry` rather than looked up from thread-local
//! state.

pub mod context;
pub mod log_flush;
pub mod pipeline;
pub mod sampler;
pub mod store;
pub mod worker;

pub use context::{ExecutionContext, PipelineProbes};
pub use log_flush::{LogFlushProbes, LogFlushTelemetry};
pub use pipeline::PipelineFeatureTracker;
pub use sampler::ElapsedTimeTracker;
pub use store::{ExecutionDataRecord, InMemoryMetricsStore};
pub use worker::WorkerTelemetry;
