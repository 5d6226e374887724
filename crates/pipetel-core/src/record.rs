//! Fixed-layout records handed to tracepoint consumers.
//!
//! Field order and widths are an ABI shared with the out-of-process consumer;
//! do not reorder independently of it. `encode` produces the exact bytes of the
//! `#[repr(C)]` layout (native endian, zeroed padding) without `unsafe`.

use crate::config::ExecutionMode;
use crate::feature::{OperatingUnitFeature, MAX_FEATURES};
use crate::id::{PipelineId, QueryId};

/// Snapshot of one finished pipeline.
///
/// Only the first `num_features` slots of each array are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C)]
pub struct TelemetryRecord {
    pub query_id: u32,
    pub pipeline_id: u32,
    pub execution_mode: u8,
    pub num_features: u8,
    pub memory_bytes: u64,
    pub features: [u8; MAX_FEATURES],
    pub est_output_rows: [u32; MAX_FEATURES],
    pub key_sizes: [u16; MAX_FEATURES],
    pub num_keys: [u8; MAX_FEATURES],
    pub est_cardinalities: [u8; MAX_FEATURES],
    pub mem_factor: [u8; MAX_FEATURES],
}

impl TelemetryRecord {
    pub const WIRE_SIZE: usize = 104;

    const OFF_QUERY_ID: usize = 0;
    const OFF_PIPELINE_ID: usize = 4;
    const OFF_EXECUTION_MODE: usize = 8;
    const OFF_NUM_FEATURES: usize = 9;
    const OFF_MEMORY_BYTES: usize = 16;
    const OFF_FEATURES: usize = 24;
    const OFF_EST_OUTPUT_ROWS: usize = 32;
    const OFF_KEY_SIZES: usize = 64;
    const OFF_NUM_KEYS: usize = 80;
    const OFF_EST_CARDINALITIES: usize = 88;
    const OFF_MEM_FACTOR: usize = 96;

    /// Marshal a pipeline's features. Values wider than their wire field
    /// saturate at the field maximum.
    ///
    /// Panics if `features` holds more than `MAX_FEATURES` entries.
    pub fn from_features(
        query_id: QueryId,
        pipeline_id: PipelineId,
        mode: ExecutionMode,
        memory_bytes: u64,
        features: &[OperatingUnitFeature],
    ) -> Self {
        assert!(
            features.len() <= MAX_FEATURES,
            "too many operators in this pipeline: {} > {MAX_FEATURES}",
            features.len()
        );

        let mut rec = TelemetryRecord {
            query_id: query_id.get(),
            pipeline_id: pipeline_id.get(),
            execution_mode: mode.tag(),
            num_features: features.len() as u8,
            memory_bytes,
            ..Default::default()
        };

        for (i, f) in features.iter().enumerate() {
            rec.features[i] = f.unit_type.tag();
            rec.est_output_rows[i] = u32::try_from(f.num_rows).unwrap_or(u32::MAX);
            rec.key_sizes[i] = u16::try_from(f.key_size).unwrap_or(u16::MAX);
            rec.num_keys[i] = u8::try_from(f.num_keys).unwrap_or(u8::MAX);
            rec.est_cardinalities[i] = u8::try_from(f.cardinality).unwrap_or(u8::MAX);
            // float -> int `as` saturates and maps NaN to 0
            rec.mem_factor[i] = f.mem_factor as u8;
        }
        rec
    }

    pub fn len(&self) -> usize {
        self.num_features as usize
    }

    pub fn is_empty(&self) -> bool {
        self.num_features == 0
    }

    pub fn encode(&self) -> [u8; Self::WIRE_SIZE] {
        let mut out = [0u8; Self::WIRE_SIZE];
        put(&mut out, Self::OFF_QUERY_ID, &self.query_id.to_ne_bytes());
        put(&mut out, Self::OFF_PIPELINE_ID, &self.pipeline_id.to_ne_bytes());
        out[Self::OFF_EXECUTION_MODE] = self.execution_mode;
        out[Self::OFF_NUM_FEATURES] = self.num_features;
        put(&mut out, Self::OFF_MEMORY_BYTES, &self.memory_bytes.to_ne_bytes());

        let n = self.len();
        put(&mut out, Self::OFF_FEATURES, &self.features[..n]);
        for (i, v) in self.est_output_rows[..n].iter().enumerate() {
            put(&mut out, Self::OFF_EST_OUTPUT_ROWS + i * 4, &v.to_ne_bytes());
        }
        for (i, v) in self.key_sizes[..n].iter().enumerate() {
            put(&mut out, Self::OFF_KEY_SIZES + i * 2, &v.to_ne_bytes());
        }
        put(&mut out, Self::OFF_NUM_KEYS, &self.num_keys[..n]);
        put(&mut out, Self::OFF_EST_CARDINALITIES, &self.est_cardinalities[..n]);
        put(&mut out, Self::OFF_MEM_FACTOR, &self.mem_factor[..n]);
        out
    }
}

/// One write-ahead-log persist window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C)]
pub struct LogFlushRecord {
    pub num_bytes: u64,
    pub num_buffers: u64,
    /// Configured persist interval (microseconds).
    pub interval: u64,
}

impl LogFlushRecord {
    pub const WIRE_SIZE: usize = 24;

    pub fn encode(&self) -> [u8; Self::WIRE_SIZE] {
        let mut out = [0u8; Self::WIRE_SIZE];
        put(&mut out, 0, &self.num_bytes.to_ne_bytes());
        put(&mut out, 8, &self.num_buffers.to_ne_bytes());
        put(&mut out, 16, &self.interval.to_ne_bytes());
        out
    }
}

fn put(out: &mut [u8], offset: usize, bytes: &[u8]) {
    out[offset..offset + bytes.len()].copy_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::ExecutionOperatingUnitType as T;
    use crate::id::FeatureId;
    use std::mem::{align_of, offset_of, size_of};

    #[test]
    fn test_layout_matches_wire_offsets() {
        assert_eq!(size_of::<TelemetryRecord>(), TelemetryRecord::WIRE_SIZE);
        assert_eq!(align_of::<TelemetryRecord>(), 8);
        assert_eq!(offset_of!(TelemetryRecord, query_id), TelemetryRecord::OFF_QUERY_ID);
        assert_eq!(offset_of!(TelemetryRecord, pipeline_id), TelemetryRecord::OFF_PIPELINE_ID);
        assert_eq!(
            offset_of!(TelemetryRecord, execution_mode),
            TelemetryRecord::OFF_EXECUTION_MODE
        );
        assert_eq!(offset_of!(TelemetryRecord, num_features), TelemetryRecord::OFF_NUM_FEATURES);
        assert_eq!(offset_of!(TelemetryRecord, memory_bytes), TelemetryRecord::OFF_MEMORY_BYTES);
        assert_eq!(offset_of!(TelemetryRecord, features), TelemetryRecord::OFF_FEATURES);
        assert_eq!(
            offset_of!(TelemetryRecord, est_output_rows),
            TelemetryRecord::OFF_EST_OUTPUT_ROWS
        );
        assert_eq!(offset_of!(TelemetryRecord, key_sizes), TelemetryRecord::OFF_KEY_SIZES);
        assert_eq!(offset_of!(TelemetryRecord, num_keys), TelemetryRecord::OFF_NUM_KEYS);
        assert_eq!(
            offset_of!(TelemetryRecord, est_cardinalities),
            TelemetryRecord::OFF_EST_CARDINALITIES
        );
        assert_eq!(offset_of!(TelemetryRecord, mem_factor), TelemetryRecord::OFF_MEM_FACTOR);

        assert_eq!(size_of::<LogFlushRecord>(), LogFlushRecord::WIRE_SIZE);
    }

    #[test]
    fn test_from_features_saturates_wide_values() {
        let f = OperatingUnitFeature::new(FeatureId::new(1), T::HashjoinBuild)
            .with_rows(u64::MAX)
            .with_keys(300, 70_000)
            .with_cardinality(1_000)
            .with_mem_factor(2.9);
        let rec = TelemetryRecord::from_features(
            QueryId::new(1),
            PipelineId::new(2),
            ExecutionMode::Compiled,
            0,
            &[f],
        );
        assert_eq!(rec.features[0], T::HashjoinBuild.tag());
        assert_eq!(rec.est_output_rows[0], u32::MAX);
        assert_eq!(rec.key_sizes[0], u16::MAX);
        assert_eq!(rec.num_keys[0], u8::MAX);
        assert_eq!(rec.est_cardinalities[0], u8::MAX);
        assert_eq!(rec.mem_factor[0], 2);
        assert_eq!(rec.execution_mode, 2);
    }

    #[test]
    fn test_encode_places_fields_and_zeroes_unused_slots() {
        let f = OperatingUnitFeature::new(FeatureId::new(1), T::SeqScan)
            .with_rows(0x0102_0304)
            .with_keys(3, 0x0a0b);
        let mut rec = TelemetryRecord::from_features(
            QueryId::new(7),
            PipelineId::new(9),
            ExecutionMode::Interpret,
            0xdead_beef,
            &[f],
        );
        // garbage in an unused slot must not leak to the wire
        rec.est_output_rows[5] = 77;

        let bytes = rec.encode();
        assert_eq!(&bytes[0..4], &7u32.to_ne_bytes());
        assert_eq!(&bytes[4..8], &9u32.to_ne_bytes());
        assert_eq!(bytes[9], 1);
        assert_eq!(&bytes[10..16], &[0u8; 6]);
        assert_eq!(&bytes[16..24], &0xdead_beefu64.to_ne_bytes());
        assert_eq!(bytes[24], T::SeqScan.tag());
        assert_eq!(&bytes[32..36], &0x0102_0304u32.to_ne_bytes());
        assert_eq!(&bytes[52..56], &[0u8; 4]);
        assert_eq!(&bytes[64..66], &0x0a0bu16.to_ne_bytes());
        assert_eq!(bytes[80], 3);
    }

    #[test]
    fn test_encode_last_slot_offsets() {
        let features: Vec<_> = (0..MAX_FEATURES as u64)
            .map(|i| {
                OperatingUnitFeature::new(FeatureId::new(i as u32), T::SortBuild)
                    .with_rows(1000 + i)
                    .with_keys(10 + i, 500 + i)
                    .with_cardinality(40 + i)
                    .with_mem_factor(i as f64)
            })
            .collect();
        let rec = TelemetryRecord::from_features(
            QueryId::new(1),
            PipelineId::new(1),
            ExecutionMode::Adaptive,
            0,
            &features,
        );
        let bytes = rec.encode();
        assert_eq!(bytes[9], 8);
        assert_eq!(bytes[31], T::SortBuild.tag());
        assert_eq!(&bytes[60..64], &1007u32.to_ne_bytes());
        assert_eq!(&bytes[78..80], &507u16.to_ne_bytes());
        assert_eq!(bytes[87], 17);
        assert_eq!(bytes[95], 47);
        assert_eq!(bytes[103], 7);
    }

    #[test]
    #[should_panic(expected = "too many operators")]
    fn test_from_features_rejects_overflow() {
        let many: Vec<_> = (0..9)
            .map(|i| OperatingUnitFeature::new(FeatureId::new(i), T::Output))
            .collect();
        TelemetryRecord::from_features(
            QueryId::new(1),
            PipelineId::new(1),
            ExecutionMode::Interpret,
            0,
            &many,
        );
    }

    #[test]
    fn test_log_flush_encode() {
        let rec = LogFlushRecord {
            num_bytes: 4096,
            num_buffers: 3,
            interval: 10,
        };
        let bytes = rec.encode();
        assert_eq!(&bytes[8..16], &3u64.to_ne_bytes());
        assert_eq!(&bytes[16..24], &10u64.to_ne_bytes());
    }
}
