//! Log-flush operating unit telemetry.
//!
//! The write-ahead-log consumer loop calls `begin_iteration` at the top of each
//! pass and `record_persist` after each persist. A measurement window opens
//! with a start marker, and closes on the first persist that flushed buffers.
//! Closing a window emits a stop marker and an acknowledged `LogFlushRecord`.
//! Enablement is evaluated once per window, not per iteration. While no
//! consumer is attached, each idle iteration checks for one, so a consumer may
//! attach at any time.

use std::sync::Arc;
use std::time::Duration;

use pipetel_core::config::MetricsComponent;
use pipetel_core::record::LogFlushRecord;
use pipetel_core::resource::MetricsStore;
use pipetel_probe::{names, NullProbe, Probe, TracepointRegistry};

#[derive(Clone)]
pub struct LogFlushProbes {
    pub start: Arc<dyn Probe>,
    pub stop: Arc<dyn Probe>,
    pub features: Arc<dyn Probe>,
}

impl LogFlushProbes {
    pub fn from_registry(registry: &TracepointRegistry) -> Self {
        Self {
            start: registry.register(names::DISK_LOG_CONSUMER_START),
            stop: registry.register(names::DISK_LOG_CONSUMER_STOP),
            features: registry.register(names::DISK_LOG_CONSUMER_FEATURES),
        }
    }

    pub fn disabled() -> Self {
        Self {
            start: Arc::new(NullProbe::new(names::DISK_LOG_CONSUMER_START)),
            stop: Arc::new(NullProbe::new(names::DISK_LOG_CONSUMER_STOP)),
            features: Arc::new(NullProbe::new(names::DISK_LOG_CONSUMER_FEATURES)),
        }
    }
}

pub struct LogFlushTelemetry {
    store: Option<Arc<dyn MetricsStore>>,
    probes: LogFlushProbes,
    persist_interval_us: u64,
    enabled: bool,
    /// Features probe state at the last evaluation.
    consumer_attached: bool,
    running: bool,
}

impl LogFlushTelemetry {
    pub fn new(
        store: Option<Arc<dyn MetricsStore>>,
        probes: LogFlushProbes,
        persist_interval: Duration,
    ) -> Self {
        let mut t = Self {
            store,
            probes,
            persist_interval_us: persist_interval.as_micros() as u64,
            enabled: false,
            consumer_attached: false,
            running: false,
        };
        t.enabled = t.evaluate();
        t
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn begin_iteration(&mut self) {
        if !self.running && !self.consumer_attached && self.probes.features.is_enabled() {
            self.enabled = self.evaluate();
        }
        if self.enabled && !self.running {
            self.probes.start.emit(None);
            self.running = true;
        }
    }

    /// Close the window if this persist flushed anything.
    ///
    /// Blocks until an attached consumer has read the record.
    pub fn record_persist(&mut self, num_bytes: u64, num_buffers: u64) -> Option<LogFlushRecord> {
        if !self.running || num_buffers == 0 {
            return None;
        }
        self.probes.stop.emit(None);
        let record = LogFlushRecord {
            num_bytes,
            num_buffers,
            interval: self.persist_interval_us,
        };
        self.probes.features.emit_and_await_ack(&record.encode());

        #[cfg(feature = "tracing")]
        tracing::trace!(num_bytes, num_buffers, "log flush window closed");

        self.enabled = self.evaluate();
        self.running = false;
        Some(record)
    }

    fn evaluate(&mut self) -> bool {
        self.consumer_attached = self.probes.features.is_enabled();
        self.consumer_attached
            && self
                .store
                .as_ref()
                .is_some_and(|s| s.component_to_record(MetricsComponent::Logging))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipetel_probe::CaptureProbe;

    use crate::store::InMemoryMetricsStore;

    struct Fixture {
        start: Arc<CaptureProbe>,
        stop: Arc<CaptureProbe>,
        features: Arc<CaptureProbe>,
        store: Arc<InMemoryMetricsStore>,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(InMemoryMetricsStore::new());
            store.enable(MetricsComponent::Logging);
            Self {
                start: Arc::new(CaptureProbe::new(names::DISK_LOG_CONSUMER_START)),
                stop: Arc::new(CaptureProbe::new(names::DISK_LOG_CONSUMER_STOP)),
                features: Arc::new(CaptureProbe::new(names::DISK_LOG_CONSUMER_FEATURES)),
                store,
            }
        }

        fn telemetry(&self) -> LogFlushTelemetry {
            LogFlushTelemetry::new(
                Some(self.store.clone() as Arc<dyn MetricsStore>),
                LogFlushProbes {
                    start: self.start.clone(),
                    stop: self.stop.clone(),
                    features: self.features.clone(),
                },
                Duration::from_micros(10),
            )
        }
    }

    #[test]
    fn test_window_opens_once_and_closes_on_flush() {
        let fx = Fixture::new();
        let mut t = fx.telemetry();

        t.begin_iteration();
        t.begin_iteration();
        assert_eq!(fx.start.len(), 1);

        // nothing flushed: window stays open
        assert!(t.record_persist(0, 0).is_none());
        assert!(t.is_running());

        let rec = t.record_persist(4096, 2).unwrap();
        assert_eq!(rec.interval, 10);
        assert!(!t.is_running());
        assert_eq!(fx.stop.len(), 1);
        let events = fx.features.take();
        assert_eq!(events.len(), 1);
        assert!(events[0].acknowledged);
        assert_eq!(events[0].payload.as_deref(), Some(&rec.encode()[..]));
    }

    #[test]
    fn test_disabled_component_never_opens() {
        let fx = Fixture::new();
        fx.store.disable(MetricsComponent::Logging);
        let mut t = fx.telemetry();
        t.begin_iteration();
        assert!(!t.is_running());
        assert!(t.record_persist(1, 1).is_none());
        assert!(fx.start.is_empty());
    }

    #[test]
    fn test_reevaluates_after_window() {
        let fx = Fixture::new();
        let mut t = fx.telemetry();
        t.begin_iteration();
        fx.features.set_enabled(false);
        // the open window still completes
        assert!(t.record_persist(8, 1).is_some());
        t.begin_iteration();
        assert!(!t.is_running());
        assert_eq!(fx.start.len(), 1);
    }

    #[test]
    fn test_consumer_attached_after_construction() {
        let fx = Fixture::new();
        fx.features.set_enabled(false);
        let mut t = fx.telemetry();
        t.begin_iteration();
        assert!(!t.is_running());

        fx.features.set_enabled(true);
        t.begin_iteration();
        assert!(t.is_running());
        assert_eq!(fx.start.len(), 1);
        assert!(t.record_persist(16, 1).is_some());
    }

    #[test]
    fn test_no_store_is_inert() {
        let mut t = LogFlushTelemetry::new(None, LogFlushProbes::disabled(), Duration::ZERO);
        t.begin_iteration();
        assert!(t.record_persist(1, 1).is_none());
    }
}
