//! Error types for the log forwarder

use crate::transport::TransportError;

pub type Result<T> = std::result::Result<T, ForwarderError>;

#[derive(Debug, thiserror::Error)]
pub enum ForwarderError {
    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    Configuration { component: String, message: String },

    /// Transport reported closed before the entry was touched
    #[error("Attempted to log on a closed connection (subject '{subject}')")]
    TransportUnavailable { subject: String },

    /// Entry could not be converted into a payload
    #[error("Serialization error ({format}): {message}")]
    Serialization { format: String, message: String },

    /// Transport rejected or failed the publish
    #[error("Publish to '{subject}' failed: {source}")]
    Publish {
        subject: String,
        #[source]
        source: TransportError,
    },

    /// JSON error while reading configuration
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error from the logger's output sink
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ForwarderError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        ForwarderError::Configuration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a transport unavailable error
    pub fn transport_unavailable(subject: impl Into<String>) -> Self {
        ForwarderError::TransportUnavailable {
            subject: subject.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(format: impl Into<String>, message: impl Into<String>) -> Self {
        ForwarderError::Serialization {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Create a publish error wrapping the transport failure
    pub fn publish(subject: impl Into<String>, source: TransportError) -> Self {
        ForwarderError::Publish {
            subject: subject.into(),
            source,
        }
    }
}
