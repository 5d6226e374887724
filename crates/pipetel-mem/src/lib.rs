#![forbid(unsafe_code)]
//! pipetel-mem: per-pipeline memory accounting.
//!
//! Operators report allocations and releases to a `MemoryTracker`; the
//! execution context resets it when a pipeline starts and reads the allocated
//! size when the pipeline ends.

pub mod tracking;

pub use tracking::MemoryTracker;
