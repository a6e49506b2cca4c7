//! Log forwarding hook and its bootstrap

pub mod config;
pub mod log_forwarder;

pub use config::{install, ForwarderConfig};
pub use log_forwarder::{FieldGenerator, LogForwarder};
