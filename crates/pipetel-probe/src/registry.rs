//! Named tracepoints shared between producers and consumers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use pipetel_core::config::TelemetryConfig;
use pipetel_core::error::{Error, Result};

use crate::tracepoint::{Attachment, Tracepoint};

#[derive(Debug)]
pub struct TracepointRegistry {
    queue_capacity: usize,
    points: RwLock<HashMap<&'static str, Arc<Tracepoint>>>,
}

impl TracepointRegistry {
    pub fn with_capacity(queue_capacity: usize) -> Self {
        Self {
            queue_capacity,
            points: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(cfg: &TelemetryConfig) -> Self {
        Self::with_capacity(cfg.probe_queue_capacity)
    }

    /// Get or create the tracepoint called `name`.
    pub fn register(&self, name: &'static str) -> Arc<Tracepoint> {
        if let Some(tp) = self.points.read().get(name) {
            return Arc::clone(tp);
        }
        let mut points = self.points.write();
        Arc::clone(
            points
                .entry(name)
                .or_insert_with(|| Arc::new(Tracepoint::new(name, self.queue_capacity))),
        )
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<Tracepoint>> {
        self.points
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownProbe(name.to_string()))
    }

    /// Attach a consumer to an already-registered tracepoint.
    pub fn attach(&self, name: &str) -> Result<Attachment> {
        self.lookup(name)?.attach()
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.points.read().keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for TracepointRegistry {
    fn default() -> Self {
        Self::from_config(&TelemetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names;
    use crate::probe::Probe;

    #[test]
    fn test_register_is_idempotent() {
        let reg = TracepointRegistry::with_capacity(8);
        let a = reg.register(names::PIPELINE_DONE);
        let b = reg.register(names::PIPELINE_DONE);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(reg.names(), vec![names::PIPELINE_DONE]);
    }

    #[test]
    fn test_attach_by_name() {
        let reg = TracepointRegistry::default();
        let tp = reg.register(names::PIPELINE_START);
        let att = reg.attach(names::PIPELINE_START).unwrap();
        assert!(tp.is_enabled());
        assert_eq!(att.probe(), names::PIPELINE_START);
        assert!(matches!(reg.attach("nope"), Err(Error::UnknownProbe(_))));
    }
}
