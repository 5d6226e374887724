#![forbid(unsafe_code)]
//! pipetel-core: shared types for the pipeline telemetry core.
//!
//! Responsibilities:
//! - Strongly-typed ids for queries, pipelines, and operator features.
//! - The bounded per-pipeline feature vector and the fixed-layout wire record
//!   handed to tracepoint consumers.
//! - Contracts for the collaborators this core consumes but does not implement
//!   (resource sampling, metrics store, feature-set provider).
//!
//! **No threads, channels, or logging** here. Downstream crates drive these types.

pub mod config;
pub mod error;
pub mod feature;
pub mod id;
pub mod prelude;
pub mod record;
pub mod resource;

pub use error::{Error, Result};
