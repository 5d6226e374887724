#![forbid(unsafe_code)]
//! pipetel-probe: attachable tracepoints.
//!
//! A tracepoint is inert until a consumer attaches; while inert, both emission
//! disciplines cost one relaxed load and a branch. Backends sit behind the
//! `Probe` trait so the feature tracker never knows whether it is talking to a
//! channel, an in-memory capture, or nothing at all.

pub mod capture;
pub mod probe;
pub mod registry;
pub mod tracepoint;

pub use capture::{CaptureProbe, CapturedEvent};
pub use probe::{wait_for_consumer, NullProbe, Probe};
pub use registry::TracepointRegistry;
pub use tracepoint::{Attachment, DeliveryStats, TraceEvent, Tracepoint};

/// Well-known tracepoint names.
pub mod names {
    pub const PIPELINE_START: &str = "pipeline__start";
    pub const PIPELINE_DONE: &str = "pipeline__done";
    pub const DISK_LOG_CONSUMER_START: &str = "disk_log_consumer__start";
    pub const DISK_LOG_CONSUMER_STOP: &str = "disk_log_consumer__stop";
    pub const DISK_LOG_CONSUMER_FEATURES: &str = "disk_log_consumer__features";
}
