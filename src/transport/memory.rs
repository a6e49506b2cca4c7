//! In-process subject bus
//!
//! Delivers payloads to subscribers in the same process through bounded
//! channels. Handy for collecting logs inside one binary and for tests.

use super::{Transport, TransportError};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Default per-subscriber queue capacity
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 1024;

/// A payload delivered to a subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub payload: Vec<u8>,
}

/// In-process transport keyed by exact subject
///
/// Publishing to a subject nobody subscribed to succeeds and the payload is
/// discarded. A subscriber whose queue is full makes the publish fail with
/// [`TransportError::SlowConsumer`]; other subscribers still receive it.
///
/// # Example
///
/// ```
/// use log_forwarder::transport::{MemoryTransport, Transport};
///
/// let transport = MemoryTransport::new();
/// let rx = transport.subscribe("logs.app");
///
/// transport.publish("logs.app", b"hello").unwrap();
/// assert_eq!(rx.recv().unwrap().payload, b"hello");
/// ```
pub struct MemoryTransport {
    subscribers: RwLock<HashMap<String, Vec<Sender<Message>>>>,
    capacity: usize,
    closed: AtomicBool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SUBSCRIBER_CAPACITY)
    }

    /// Create a transport whose subscriber queues hold `capacity` messages
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            closed: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self, subject: impl Into<String>) -> Receiver<Message> {
        let (sender, receiver) = bounded(self.capacity);
        self.subscribers
            .write()
            .entry(subject.into())
            .or_default()
            .push(sender);
        receiver
    }

    /// Close the transport and disconnect all subscribers
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.subscribers.write().clear();
    }

    pub fn subscriber_count(&self, subject: &str) -> usize {
        self.subscribers.read().get(subject).map_or(0, Vec::len)
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryTransport {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn publish(&self, subject: &str, payload: &[u8]) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let mut slow_consumer = false;
        let mut disconnected = Vec::new();
        {
            let subscribers = self.subscribers.read();
            let Some(senders) = subscribers.get(subject) else {
                return Ok(());
            };

            for sender in senders {
                let message = Message {
                    subject: subject.to_string(),
                    payload: payload.to_vec(),
                };
                match sender.try_send(message) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => slow_consumer = true,
                    Err(TrySendError::Disconnected(_)) => disconnected.push(sender.clone()),
                }
            }
        }

        // Drop subscribers whose receiver has gone away
        if !disconnected.is_empty() {
            if let Some(senders) = self.subscribers.write().get_mut(subject) {
                senders.retain(|sender| !disconnected.iter().any(|dead| dead.same_channel(sender)));
            }
        }

        if slow_consumer {
            Err(TransportError::slow_consumer(subject))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let transport = MemoryTransport::new();
        let rx1 = transport.subscribe("logs.app");
        let rx2 = transport.subscribe("logs.app");
        let other = transport.subscribe("logs.other");

        transport.publish("logs.app", b"payload").unwrap();

        assert_eq!(rx1.try_recv().unwrap().payload, b"payload");
        assert_eq!(rx2.try_recv().unwrap().subject, "logs.app");
        assert!(other.try_recv().is_err());
    }

    #[test]
    fn test_publish_without_subscribers_succeeds() {
        let transport = MemoryTransport::new();
        assert!(transport.publish("nobody.listens", b"x").is_ok());
    }

    #[test]
    fn test_full_subscriber_is_slow_consumer() {
        let transport = MemoryTransport::with_capacity(1);
        let rx = transport.subscribe("logs.app");

        transport.publish("logs.app", b"first").unwrap();
        let err = transport.publish("logs.app", b"second").unwrap_err();

        assert!(matches!(err, TransportError::SlowConsumer { ref subject } if subject == "logs.app"));
        assert_eq!(rx.try_recv().unwrap().payload, b"first");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let transport = MemoryTransport::new();
        let kept = transport.subscribe("logs.app");
        drop(transport.subscribe("logs.app"));
        assert_eq!(transport.subscriber_count("logs.app"), 2);

        transport.publish("logs.app", b"x").unwrap();

        assert_eq!(transport.subscriber_count("logs.app"), 1);
        assert_eq!(kept.try_recv().unwrap().payload, b"x");
    }

    #[test]
    fn test_close() {
        let transport = MemoryTransport::new();
        let rx = transport.subscribe("logs.app");
        assert!(!transport.is_closed());

        transport.close();

        assert!(transport.is_closed());
        assert!(matches!(
            transport.publish("logs.app", b"x"),
            Err(TransportError::Closed)
        ));
        assert!(rx.recv().is_err());
    }
}
