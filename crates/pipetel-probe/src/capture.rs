//! In-memory probe for tests and offline replay.
//!
//! Records every emission instead of handing it to an external consumer.
//! Acknowledged emissions complete immediately.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::probe::Probe;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEvent {
    pub payload: Option<Vec<u8>>,
    /// Emitted through the acknowledged discipline.
    pub acknowledged: bool,
}

#[derive(Debug)]
pub struct CaptureProbe {
    name: &'static str,
    enabled: AtomicBool,
    events: Mutex<Vec<CapturedEvent>>,
}

impl CaptureProbe {
    /// A capture probe that starts enabled.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            enabled: AtomicBool::new(true),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drain everything captured so far.
    pub fn take(&self) -> Vec<CapturedEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    fn push(&self, payload: Option<Vec<u8>>, acknowledged: bool) {
        self.events.lock().push(CapturedEvent {
            payload,
            acknowledged,
        });
    }
}

impl Probe for CaptureProbe {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn emit(&self, payload: Option<&[u8]>) {
        if self.is_enabled() {
            self.push(payload.map(<[u8]>::to_vec), false);
        }
    }

    fn emit_and_await_ack(&self, payload: &[u8]) {
        if self.is_enabled() {
            self.push(Some(payload.to_vec()), true);
        }
    }
}
