//! Core logging types and traits

pub mod error;
pub mod formatter;
pub mod hook;
pub mod log_context;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod timestamp;

pub use error::{ForwarderError, Result};
pub use formatter::{Formatter, JsonFormatter, LogfmtFormatter};
pub use hook::Hook;
pub use log_context::{FieldValue, Fields};
pub use log_entry::LogEntry;
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerBuilder};
pub use metrics::ForwarderMetrics;
pub use timestamp::TimestampFormat;
