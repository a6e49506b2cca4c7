//! Publish/subscribe transports
//!
//! The forwarder only needs two things from a transport: whether it is
//! still usable, and a way to publish a payload to a subject. Connecting,
//! reconnecting and delivery guarantees are the transport's business.

pub mod memory;
#[cfg(feature = "tcp")]
pub mod tcp;

pub use memory::{MemoryTransport, Message};
#[cfg(feature = "tcp")]
pub use tcp::TcpTransport;

/// Errors reported by a transport
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection has been closed
    #[error("connection closed")]
    Closed,

    /// The connection has not been established yet
    #[error("not connected")]
    NotConnected,

    /// A subscriber could not keep up and the payload was dropped
    #[error("slow consumer on subject '{subject}', payload dropped")]
    SlowConsumer { subject: String },

    /// IO failure while writing to the wire
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    pub fn slow_consumer(subject: impl Into<String>) -> Self {
        TransportError::SlowConsumer {
            subject: subject.into(),
        }
    }

    pub fn other<S: Into<String>>(msg: S) -> Self {
        TransportError::Other(msg.into())
    }
}

/// Shared publish/subscribe connection
///
/// Implementations are shared between threads and are never closed by the
/// forwarder.
pub trait Transport: Send + Sync {
    /// Whether the connection has been closed for good
    fn is_closed(&self) -> bool;

    /// Publish `payload` on `subject`
    ///
    /// Success means the transport accepted the payload, not that anyone
    /// received it.
    fn publish(&self, subject: &str, payload: &[u8]) -> Result<(), TransportError>;
}
