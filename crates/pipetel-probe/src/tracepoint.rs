//! Channel-backed tracepoint.
//!
//! The attached-consumer count plays the role of a USDT semaphore: producers
//! test it before doing anything else. Attaching installs a bounded channel;
//! detaching disables the point, disconnects the channel, and traverses the
//! delivery gate so that no producer is still enqueueing when `detach` returns.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, never, Receiver, Sender, TrySendError};
use parking_lot::RwLock;

use pipetel_core::error::{Error, Result};
use pipetel_sync::Gate;

use crate::probe::Probe;

/// One event as seen by the consumer.
///
/// Dropping the event (or calling `finish`) tells an acknowledged producer that
/// the payload has been read.
#[derive(Debug)]
pub struct TraceEvent {
    probe: &'static str,
    payload: Option<Box<[u8]>>,
    ack: Option<Sender<()>>,
}

impl TraceEvent {
    pub fn probe(&self) -> &'static str {
        self.probe
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// Whether a producer is blocked on this event.
    pub fn awaits_ack(&self) -> bool {
        self.ack.is_some()
    }

    pub fn finish(self) {
        drop(self);
    }
}

impl Drop for TraceEvent {
    fn drop(&mut self) {
        if let Some(ack) = self.ack.take() {
            // producer may already be gone; nothing to do then
            let _ = ack.send(());
        }
    }
}

/// Counters for one attachment, final once `detach` has drained producers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub delivered: u64,
    /// Fire-and-forget events lost to a full queue.
    pub dropped: u64,
}

#[derive(Debug)]
pub struct Tracepoint {
    name: &'static str,
    capacity: usize,
    semaphore: AtomicU32,
    consumer: RwLock<Option<Sender<TraceEvent>>>,
    delivery: Gate,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl Tracepoint {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity: capacity.max(1),
            semaphore: AtomicU32::new(0),
            consumer: RwLock::new(None),
            delivery: Gate::new(),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Attach the (single) consumer.
    pub fn attach(self: &Arc<Self>) -> Result<Attachment> {
        let mut slot = self.consumer.write();
        if slot.is_some() {
            return Err(Error::ProbeBusy(self.name));
        }
        let (tx, rx) = bounded(self.capacity);
        *slot = Some(tx);
        self.delivered.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
        // publish only once the slot is populated
        self.semaphore.fetch_add(1, Ordering::Release);
        drop(slot);

        #[cfg(feature = "tracing")]
        tracing::debug!(probe = self.name, capacity = self.capacity, "consumer attached");

        Ok(Attachment {
            tracepoint: Arc::clone(self),
            rx,
        })
    }

    pub fn is_attached(&self) -> bool {
        self.semaphore.load(Ordering::Acquire) > 0
    }

    pub fn stats(&self) -> DeliveryStats {
        DeliveryStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    fn detach(&self, rx: Receiver<TraceEvent>) {
        self.semaphore.fetch_sub(1, Ordering::Release);
        drop(self.consumer.write().take());
        // Disconnects the channel: queued events drop (releasing their
        // producers) and blocked senders fail.
        drop(rx);
        self.delivery.traverse();

        #[cfg(feature = "tracing")]
        {
            let stats = self.stats();
            tracing::debug!(
                probe = self.name,
                delivered = stats.delivered,
                dropped = stats.dropped,
                "consumer detached"
            );
        }
    }

    fn current_consumer(&self) -> Option<Sender<TraceEvent>> {
        self.consumer.read().clone()
    }
}

impl Probe for Tracepoint {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_enabled(&self) -> bool {
        self.semaphore.load(Ordering::Relaxed) > 0
    }

    fn emit(&self, payload: Option<&[u8]>) {
        if !self.is_enabled() {
            return;
        }
        let _entry = self.delivery.entry();
        let Some(tx) = self.current_consumer() else {
            return;
        };
        let event = TraceEvent {
            probe: self.name,
            payload: payload.map(Box::from),
            ack: None,
        };
        match tx.try_send(event) {
            Ok(()) => {
                self.delivered.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "tracing")]
                tracing::trace!(probe = self.name, "consumer queue full, event dropped");
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    fn emit_and_await_ack(&self, payload: &[u8]) {
        if !self.is_enabled() {
            return;
        }
        let (ack_tx, ack_rx) = bounded(1);
        {
            let _entry = self.delivery.entry();
            let Some(tx) = self.current_consumer() else {
                return;
            };
            let event = TraceEvent {
                probe: self.name,
                payload: Some(Box::from(payload)),
                ack: Some(ack_tx),
            };
            if tx.send(event).is_err() {
                return;
            }
            self.delivered.fetch_add(1, Ordering::Relaxed);
        }
        // Wait outside the gate: a consumer holding an unread event may detach
        // without deadlocking against us. Err means the event was dropped.
        let _ = ack_rx.recv();
    }
}

/// Consumer side of an attached tracepoint. Detaches on drop.
#[derive(Debug)]
pub struct Attachment {
    tracepoint: Arc<Tracepoint>,
    rx: Receiver<TraceEvent>,
}

impl Attachment {
    pub fn probe(&self) -> &'static str {
        self.tracepoint.name
    }

    /// Block until the next event.
    pub fn recv(&self) -> Option<TraceEvent> {
        self.rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<TraceEvent> {
        self.rx.recv_timeout(timeout).ok()
    }

    pub fn try_recv(&self) -> Option<TraceEvent> {
        self.rx.try_recv().ok()
    }

    /// Detach and return the final counters for this attachment.
    pub fn detach(self) -> DeliveryStats {
        let tracepoint = Arc::clone(&self.tracepoint);
        drop(self);
        tracepoint.stats()
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        let rx = std::mem::replace(&mut self.rx, never());
        self.tracepoint.detach(rx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_inert_until_attached() {
        let tp = Arc::new(Tracepoint::new("t", 4));
        assert!(!tp.is_enabled());
        tp.emit(Some(b"x"));
        tp.emit_and_await_ack(b"x");
        assert_eq!(tp.stats(), DeliveryStats::default());

        let att = tp.attach().unwrap();
        assert!(tp.is_enabled());
        drop(att);
        assert!(!tp.is_enabled());
    }

    #[test]
    fn test_single_consumer() {
        let tp = Arc::new(Tracepoint::new("t", 4));
        let _att = tp.attach().unwrap();
        assert!(matches!(tp.attach(), Err(Error::ProbeBusy("t"))));
    }

    #[test]
    fn test_fire_and_forget_drops_when_full() {
        let tp = Arc::new(Tracepoint::new("t", 2));
        let att = tp.attach().unwrap();
        for _ in 0..5 {
            tp.emit(None);
        }
        let first = att.try_recv().unwrap();
        assert!(first.payload().is_none());
        assert!(!first.awaits_ack());
        let stats = att.detach();
        assert_eq!(stats.delivered, 2);
        assert_eq!(stats.dropped, 3);
    }

    #[test]
    fn test_ack_handoff_blocks_until_finished() {
        let tp = Arc::new(Tracepoint::new("t", 4));
        let att = tp.attach().unwrap();

        let producer = {
            let tp = Arc::clone(&tp);
            thread::spawn(move || tp.emit_and_await_ack(&[1, 2, 3]))
        };

        let event = att.recv().unwrap();
        assert!(event.awaits_ack());
        assert_eq!(event.payload(), Some(&[1u8, 2, 3][..]));
        thread::sleep(Duration::from_millis(20));
        assert!(!producer.is_finished());

        event.finish();
        producer.join().expect("Thread panicked");
    }

    #[test]
    fn test_detach_releases_waiting_producer() {
        let tp = Arc::new(Tracepoint::new("t", 4));
        let att = tp.attach().unwrap();

        let producer = {
            let tp = Arc::clone(&tp);
            thread::spawn(move || tp.emit_and_await_ack(b"unread"))
        };
        // let the event land in the queue, then leave without reading it
        while tp.stats().delivered == 0 {
            thread::yield_now();
        }
        att.detach();
        producer.join().expect("Thread panicked");
    }

    #[test]
    fn test_reattach_resets_stats() {
        let tp = Arc::new(Tracepoint::new("t", 4));
        let att = tp.attach().unwrap();
        tp.emit(None);
        assert_eq!(att.detach().delivered, 1);

        let att = tp.attach().unwrap();
        assert_eq!(tp.stats().delivered, 0);
        tp.emit(Some(b"again"));
        assert_eq!(att.recv().unwrap().payload(), Some(&b"again"[..]));
    }
}
