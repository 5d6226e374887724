//! Pipeline feature tracker state machine: `Idle -> Active -> Idle`.
//!
//! Holds the working copy of the current pipeline's features. Every lookup
//! checks the caller's pipeline id against the active one; a mismatch, a
//! missing feature, or a start while already active means the execution code
//! and the operating-unit recorder disagree, which is a bug, so these panic.

use pipetel_core::feature::{OperatingUnitFeature, PipelineFeatureSet};
use pipetel_core::id::{FeatureId, PipelineId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackerState {
    Idle,
    Active {
        pipeline: PipelineId,
        /// Whether resource sampling was started for this pipeline.
        sampling: bool,
    },
}

#[derive(Debug)]
pub struct PipelineFeatureTracker {
    state: TrackerState,
    features: PipelineFeatureSet,
}

impl PipelineFeatureTracker {
    pub fn new() -> Self {
        Self {
            state: TrackerState::Idle,
            features: PipelineFeatureSet::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, TrackerState::Active { .. })
    }

    pub fn current_pipeline(&self) -> Option<PipelineId> {
        match self.state {
            TrackerState::Active { pipeline, .. } => Some(pipeline),
            TrackerState::Idle => None,
        }
    }

    pub fn features(&self) -> &PipelineFeatureSet {
        &self.features
    }

    /// Enter `Active` with a private copy of `features`.
    pub(crate) fn activate(
        &mut self,
        pipeline: PipelineId,
        features: &[OperatingUnitFeature],
        sampling: bool,
    ) {
        if let TrackerState::Active { pipeline: current, .. } = self.state {
            panic!("cannot start {pipeline}: {current} is still being tracked");
        }
        self.features = PipelineFeatureSet::from_slice(features);
        self.state = TrackerState::Active { pipeline, sampling };
    }

    /// Assert that `pipeline` is the active one; returns whether sampling runs.
    pub(crate) fn expect_current(&self, pipeline: PipelineId) -> bool {
        match self.state {
            TrackerState::Active {
                pipeline: current,
                sampling,
            } => {
                assert_eq!(
                    pipeline, current,
                    "{pipeline} is not the current pipeline"
                );
                sampling
            }
            TrackerState::Idle => panic!("{pipeline} is not being tracked"),
        }
    }

    pub(crate) fn feature(&self, pipeline: PipelineId, feature: FeatureId) -> &OperatingUnitFeature {
        self.expect_current(pipeline);
        self.features
            .find(feature)
            .unwrap_or_else(|| panic!("{feature} is not part of {pipeline}"))
    }

    pub(crate) fn feature_mut(
        &mut self,
        pipeline: PipelineId,
        feature: FeatureId,
    ) -> &mut OperatingUnitFeature {
        self.expect_current(pipeline);
        self.features
            .find_mut(feature)
            .unwrap_or_else(|| panic!("{feature} is not part of {pipeline}"))
    }

    /// Drop the working set and return to `Idle`.
    pub(crate) fn deactivate(&mut self) {
        self.features.clear();
        self.state = TrackerState::Idle;
    }
}

impl Default for PipelineFeatureTracker {
    fn default() -> Self {
        Self::new()
    }
}
