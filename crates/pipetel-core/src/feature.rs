//! Operating-unit feature vectors.
//!
//! A pipeline's operators are enumerated ahead of execution into
//! `OperatingUnitFeature` entries (one per physical operator instance). During
//! execution a working copy is refined in place and finally marshalled into the
//! fixed-width `TelemetryRecord`, which is why the set is capped at
//! `MAX_FEATURES`.

use std::collections::HashMap;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::id::{FeatureId, PipelineId};

/// Width of the per-feature arrays in the wire record.
pub const MAX_FEATURES: usize = 8;

/// Operator-type tag. The discriminant is the byte written to the wire record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ExecutionOperatingUnitType {
    #[default]
    Invalid = 0,
    AggregateBuild = 1,
    AggregateIterate = 2,
    HashjoinBuild = 3,
    HashjoinProbe = 4,
    IdxScan = 5,
    SortBuild = 6,
    SortIterate = 7,
    SeqScan = 8,
    Insert = 9,
    Update = 10,
    Delete = 11,
    Projection = 12,
    Output = 13,
    Limit = 14,
    IndexInsert = 15,
    IndexDelete = 16,
    SortTopkBuild = 17,
    CreateIndex = 18,
}

impl ExecutionOperatingUnitType {
    pub const fn tag(self) -> u8 {
        self as u8
    }
}

/// Attributes that execution may refine in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureAttribute {
    NumRows,
    Cardinality,
    NumLoops,
}

/// Resource-relevant characteristics of one operator instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingUnitFeature {
    /// Unique within the owning pipeline.
    pub feature_id: FeatureId,
    pub unit_type: ExecutionOperatingUnitType,
    /// Estimated output rows.
    pub num_rows: u64,
    /// Key width in bytes.
    pub key_size: u64,
    pub num_keys: u64,
    /// Estimated cardinality.
    pub cardinality: u64,
    pub mem_factor: f64,
    pub num_loops: u64,
    pub num_concurrent: u64,
}

impl OperatingUnitFeature {
    pub fn new(feature_id: FeatureId, unit_type: ExecutionOperatingUnitType) -> Self {
        Self {
            feature_id,
            unit_type,
            num_rows: 0,
            key_size: 0,
            num_keys: 0,
            cardinality: 0,
            mem_factor: 1.0,
            num_loops: 0,
            num_concurrent: 0,
        }
    }

    pub fn with_rows(mut self, num_rows: u64) -> Self {
        self.num_rows = num_rows;
        self
    }

    pub fn with_keys(mut self, num_keys: u64, key_size: u64) -> Self {
        self.num_keys = num_keys;
        self.key_size = key_size;
        self
    }

    pub fn with_cardinality(mut self, cardinality: u64) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn with_mem_factor(mut self, mem_factor: f64) -> Self {
        self.mem_factor = mem_factor;
        self
    }

    pub fn with_concurrency(mut self, num_concurrent: u64) -> Self {
        self.num_concurrent = num_concurrent;
        self
    }

    pub fn set(&mut self, attribute: FeatureAttribute, value: u64) {
        match attribute {
            FeatureAttribute::NumRows => self.num_rows = value,
            FeatureAttribute::Cardinality => self.cardinality = value,
            FeatureAttribute::NumLoops => self.num_loops = value,
        }
    }

    /// Readable attributes are rows and cardinality only; asking for anything
    /// else is a bug in the caller.
    pub fn get(&self, attribute: FeatureAttribute) -> u64 {
        match attribute {
            FeatureAttribute::NumRows => self.num_rows,
            FeatureAttribute::Cardinality => self.cardinality,
            FeatureAttribute::NumLoops => {
                panic!("feature attribute {attribute:?} is write-only")
            }
        }
    }
}

/// Ordered, bounded working set of features for the pipeline in flight.
///
/// Storage is inline with room for exactly `MAX_FEATURES` entries. Exceeding
/// it is a contract violation and panics: the record width is an external
/// ABI, not a tunable.
#[derive(Debug, Clone)]
pub struct PipelineFeatureSet {
    slots: [OperatingUnitFeature; MAX_FEATURES],
    len: usize,
}

const VACANT: OperatingUnitFeature = OperatingUnitFeature {
    feature_id: FeatureId::new(0),
    unit_type: ExecutionOperatingUnitType::Invalid,
    num_rows: 0,
    key_size: 0,
    num_keys: 0,
    cardinality: 0,
    mem_factor: 0.0,
    num_loops: 0,
    num_concurrent: 0,
};

impl PipelineFeatureSet {
    pub const fn new() -> Self {
        Self {
            slots: [VACANT; MAX_FEATURES],
            len: 0,
        }
    }

    /// Private copy of a provider snapshot.
    pub fn from_slice(features: &[OperatingUnitFeature]) -> Self {
        assert!(
            features.len() <= MAX_FEATURES,
            "too many operators in this pipeline: {} > {MAX_FEATURES}",
            features.len()
        );
        let mut set = Self::new();
        set.slots[..features.len()].clone_from_slice(features);
        set.len = features.len();
        set
    }

    pub fn find(&self, feature_id: FeatureId) -> Option<&OperatingUnitFeature> {
        self.iter().find(|f| f.feature_id == feature_id)
    }

    pub fn find_mut(&mut self, feature_id: FeatureId) -> Option<&mut OperatingUnitFeature> {
        self.slots[..self.len]
            .iter_mut()
            .find(|f| f.feature_id == feature_id)
    }

    pub fn clear(&mut self) {
        self.slots[..self.len].fill(VACANT);
        self.len = 0;
    }
}

impl Default for PipelineFeatureSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for PipelineFeatureSet {
    fn eq(&self, other: &Self) -> bool {
        **self == **other
    }
}

impl Deref for PipelineFeatureSet {
    type Target = [OperatingUnitFeature];
    fn deref(&self) -> &Self::Target {
        &self.slots[..self.len]
    }
}

/// Canonical per-pipeline feature lists produced by the planning pass.
///
/// Implementations must return a stable snapshot; the tracker copies it before
/// mutating anything.
pub trait PipelineFeatureProvider: Send + Sync {
    fn pipeline_features(&self, pipeline: PipelineId) -> Option<&[OperatingUnitFeature]>;
}

/// Map-backed provider filled in by the operating-unit recorder.
#[derive(Debug, Clone, Default)]
pub struct PipelineOperatingUnits {
    units: HashMap<PipelineId, Vec<OperatingUnitFeature>>,
}

impl PipelineOperatingUnits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the operators of one pipeline. Replaces any earlier entry.
    pub fn record_operating_units(
        &mut self,
        pipeline: PipelineId,
        features: Vec<OperatingUnitFeature>,
    ) {
        self.units.insert(pipeline, features);
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl PipelineFeatureProvider for PipelineOperatingUnits {
    fn pipeline_features(&self, pipeline: PipelineId) -> Option<&[OperatingUnitFeature]> {
        self.units.get(&pipeline).map(Vec::as_slice)
    }
}
