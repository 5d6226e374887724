#![forbid(unsafe_code)]
//! pipetel: per-operator pipeline telemetry for query engines.
//!
//! Facade over the workspace crates:
//! - `pipetel_core`: ids, config, feature vectors, wire records, collaborator contracts
//! - `pipetel_sync`: the drain `Gate`
//! - `pipetel_mem`: memory accounting
//! - `pipetel_probe`: attachable tracepoints
//! - `pipetel_exec`: the per-worker `ExecutionContext`

pub use pipetel_core;
pub use pipetel_exec;
pub use pipetel_mem;
pub use pipetel_probe;
pub use pipetel_sync;

pub use pipetel_core::prelude::*;
pub use pipetel_exec::{ExecutionContext, PipelineProbes, WorkerTelemetry};
pub use pipetel_probe::{Probe, Tracepoint, TracepointRegistry};
pub use pipetel_sync::Gate;
