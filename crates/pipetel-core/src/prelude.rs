//! Convenient re-exports for downstream crates.

pub use crate::config::{ExecutionMode, MetricsComponent, TelemetryConfig};
pub use crate::error::{Error, Result};
pub use crate::feature::{
    ExecutionOperatingUnitType, FeatureAttribute, OperatingUnitFeature, PipelineFeatureProvider,
    PipelineFeatureSet, PipelineOperatingUnits, MAX_FEATURES,
};
pub use crate::id::{FeatureId, PipelineId, QueryId};
pub use crate::record::{LogFlushRecord, TelemetryRecord};
pub use crate::resource::{HardwareCounters, MetricsStore, ResourceMetrics, ResourceTracker};
