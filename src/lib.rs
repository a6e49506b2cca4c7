//! # Log Forwarder
//!
//! A logging hook that republishes structured log entries onto a
//! publish/subscribe subject for centralized collection.
//!
//! ## Features
//!
//! - **Enrichment**: static fields and per-entry dynamic fields
//! - **Level Filtering**: forwards every severity unless told otherwise
//! - **Pluggable Transports**: in-process bus and TCP publisher included
//! - **Best Effort**: failures are reported to the logger, never retried

pub mod core;
pub mod forwarder;
pub mod transport;

pub mod prelude {
    pub use crate::core::{
        FieldValue, Fields, Formatter, ForwarderError, ForwarderMetrics, Hook, JsonFormatter,
        LogEntry, LogLevel, LogfmtFormatter, Logger, LoggerBuilder, Result, TimestampFormat,
    };
    pub use crate::forwarder::{install, FieldGenerator, ForwarderConfig, LogForwarder};
    pub use crate::transport::{MemoryTransport, Message, Transport, TransportError};
}

pub use crate::core::{
    FieldValue, Fields, Formatter, ForwarderError, ForwarderMetrics, Hook, JsonFormatter, LogEntry,
    LogLevel, LogfmtFormatter, Logger, LoggerBuilder, Result, TimestampFormat,
};
pub use forwarder::{install, FieldGenerator, ForwarderConfig, LogForwarder};
pub use transport::{Transport, TransportError};
