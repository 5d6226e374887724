//! Telemetry configuration that downstream crates can serialize/deserialize.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Subsystems whose telemetry can be switched on and off independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsComponent {
    /// Whole-query execution resource tracking.
    Execution,
    /// Per-pipeline feature vectors and resource sampling.
    ExecutionPipeline,
    /// Write-ahead log flush/persist operating unit.
    Logging,
}

impl MetricsComponent {
    pub const ALL: [MetricsComponent; 3] = [
        MetricsComponent::Execution,
        MetricsComponent::ExecutionPipeline,
        MetricsComponent::Logging,
    ];

    /// Dense index, used for per-component flag tables.
    pub const fn index(self) -> usize {
        match self {
            MetricsComponent::Execution => 0,
            MetricsComponent::ExecutionPipeline => 1,
            MetricsComponent::Logging => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            MetricsComponent::Execution => "execution",
            MetricsComponent::ExecutionPipeline => "execution_pipeline",
            MetricsComponent::Logging => "logging",
        }
    }
}

impl fmt::Display for MetricsComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricsComponent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "execution" => Ok(MetricsComponent::Execution),
            "execution_pipeline" | "pipeline" => Ok(MetricsComponent::ExecutionPipeline),
            "logging" => Ok(MetricsComponent::Logging),
            other => Err(Error::Parse(format!("unknown metrics component '{other}'"))),
        }
    }
}

/// Execution strategy tag carried into every telemetry record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ExecutionMode {
    #[default]
    Interpret = 0,
    Adaptive = 1,
    Compiled = 2,
}

impl ExecutionMode {
    pub const fn tag(self) -> u8 {
        self as u8
    }
}

impl FromStr for ExecutionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interpret" => Ok(ExecutionMode::Interpret),
            "adaptive" => Ok(ExecutionMode::Adaptive),
            "compiled" => Ok(ExecutionMode::Compiled),
            other => Err(Error::Parse(format!("unknown execution mode '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Components whose telemetry is recorded. Anything absent is a silent no-op.
    pub components: Vec<MetricsComponent>,

    /// Record one out of every `sample_interval` requests per component.
    /// `1` records everything.
    pub sample_interval: u32,

    /// Bound of each tracepoint's consumer queue. Fire-and-forget events are
    /// dropped once it is full; acknowledged events wait for room.
    pub probe_queue_capacity: usize,

    /// Execution strategy tag stamped into records.
    pub execution_mode: ExecutionMode,

    /// Fixed memory footprint reported instead of the measured one (replay/testing).
    pub memory_use_override: Option<u64>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            components: vec![MetricsComponent::Execution, MetricsComponent::ExecutionPipeline],
            sample_interval: 1,
            probe_queue_capacity: 1024,
            execution_mode: ExecutionMode::Interpret,
            memory_use_override: None,
        }
    }
}

impl TelemetryConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `PIPETEL_COMPONENTS`: comma list of `execution`, `execution_pipeline`, `logging`
    /// - `PIPETEL_SAMPLE_INTERVAL`: record one out of N requests
    /// - `PIPETEL_PROBE_QUEUE_CAPACITY`: consumer queue bound per tracepoint
    /// - `PIPETEL_EXECUTION_MODE`: `interpret`, `adaptive`, or `compiled`
    /// - `PIPETEL_MEMORY_OVERRIDE`: fixed memory footprint in bytes
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("PIPETEL_COMPONENTS") {
            if let Ok(v) = parse_components(&s) {
                cfg.components = v;
            }
        }

        if let Ok(s) = std::env::var("PIPETEL_SAMPLE_INTERVAL") {
            if let Ok(v) = s.parse::<u32>() {
                cfg.sample_interval = v;
            }
        }

        if let Ok(s) = std::env::var("PIPETEL_PROBE_QUEUE_CAPACITY") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.probe_queue_capacity = v;
            }
        }

        if let Ok(s) = std::env::var("PIPETEL_EXECUTION_MODE") {
            if let Ok(v) = s.parse::<ExecutionMode>() {
                cfg.execution_mode = v;
            }
        }

        if let Ok(s) = std::env::var("PIPETEL_MEMORY_OVERRIDE") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.memory_use_override = Some(v);
            }
        }

        cfg
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_interval == 0 {
            return Err(Error::Config("sample_interval must be at least 1".into()));
        }
        if self.probe_queue_capacity == 0 {
            return Err(Error::Config("probe_queue_capacity must be at least 1".into()));
        }
        Ok(())
    }

    pub fn is_enabled(&self, component: MetricsComponent) -> bool {
        self.components.contains(&component)
    }
}

fn parse_components(s: &str) -> Result<Vec<MetricsComponent>> {
    let mut out = Vec::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let c = part.parse::<MetricsComponent>()?;
        if !out.contains(&c) {
            out.push(c);
        }
    }
    Ok(out)
}
