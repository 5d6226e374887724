//! The probe capability.

use pipetel_sync::SpinBackoff;

/// A named instrumentation point.
///
/// Invariants:
/// - When `is_enabled` is false, `emit`/`emit_and_await_ack` return
///   immediately without touching the payload.
/// - `emit` never blocks.
/// - `emit_and_await_ack` returns once the consumer has finished with the
///   payload, or immediately when nobody is attached. There is no timeout.
pub trait Probe: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_enabled(&self) -> bool;

    /// Fire-and-forget.
    fn emit(&self, payload: Option<&[u8]>);

    /// Semaphore-synchronized handoff.
    fn emit_and_await_ack(&self, payload: &[u8]);
}

/// A probe nothing can attach to.
#[derive(Debug, Clone, Copy)]
pub struct NullProbe {
    name: &'static str,
}

impl NullProbe {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl Probe for NullProbe {
    fn name(&self) -> &'static str {
        self.name
    }
    fn is_enabled(&self) -> bool {
        false
    }
    fn emit(&self, _payload: Option<&[u8]>) {}
    fn emit_and_await_ack(&self, _payload: &[u8]) {}
}

/// Spin (then yield) until some consumer enables `probe`.
///
/// Used by measurement harnesses that must not start before the consumer is
/// listening. Never returns for a `NullProbe`.
pub fn wait_for_consumer(probe: &dyn Probe) {
    SpinBackoff::wait_until(|| probe.is_enabled());
}
