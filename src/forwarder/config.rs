//! Forwarder configuration and bootstrap

use super::log_forwarder::LogForwarder;
use crate::core::{ForwarderError, Logger, Result};
use crate::transport::Transport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Settings for installing a forwarder
///
/// # Example
///
/// ```
/// use log_forwarder::ForwarderConfig;
///
/// let config = ForwarderConfig::from_json(
///     r#"{"subject": "logs.app", "dimensions": {"env": "prod"}}"#,
/// ).unwrap();
/// assert_eq!(config.subject, "logs.app");
/// assert_eq!(config.dimensions["env"], "prod");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwarderConfig {
    /// Subject entries are published on
    pub subject: String,

    /// Static fields added to every forwarded entry
    #[serde(default)]
    pub dimensions: BTreeMap<String, String>,
}

impl ForwarderConfig {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            dimensions: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_dimension(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.insert(key.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.subject.is_empty() {
            return Err(ForwarderError::config(
                "ForwarderConfig",
                "Must provide a subject for the log forwarder",
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

/// Build a forwarder from `config` and register it on `logger`
///
/// The returned handle shares the registered forwarder, so fields added
/// through it apply to entries fired afterwards.
///
/// # Errors
///
/// Returns a configuration error if the subject is empty; nothing is
/// registered in that case.
pub fn install(
    config: &ForwarderConfig,
    transport: Arc<dyn Transport>,
    logger: &mut Logger,
) -> Result<Arc<LogForwarder>> {
    config.validate()?;

    let forwarder = LogForwarder::new(transport, config.subject.clone())?;
    for (key, value) in &config.dimensions {
        forwarder.add_static_field(key.clone(), value.clone());
    }

    let forwarder = Arc::new(forwarder);
    logger.add_hook(forwarder.clone());
    Ok(forwarder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;

    #[test]
    fn test_dimensions_default_to_empty() {
        let config = ForwarderConfig::from_json(r#"{"subject": "logs.app"}"#).unwrap();
        assert!(config.dimensions.is_empty());
    }

    #[test]
    fn test_empty_subject_is_invalid() {
        let err = ForwarderConfig::from_json(r#"{"subject": ""}"#).unwrap_err();
        assert!(matches!(err, ForwarderError::Configuration { .. }));

        let err = ForwarderConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, ForwarderError::Json(_)));
    }

    #[test]
    fn test_install_registers_and_seeds() {
        let mut logger = Logger::new();
        let config = ForwarderConfig::new("logs.app")
            .with_dimension("env", "prod")
            .with_dimension("region", "eu-west-1");

        let forwarder = install(&config, Arc::new(MemoryTransport::new()), &mut logger).unwrap();

        assert_eq!(logger.hook_count(), 1);
        assert_eq!(forwarder.static_fields().len(), 2);
        assert_eq!(forwarder.subject(), "logs.app");
    }

    #[test]
    fn test_install_rejects_empty_subject() {
        let mut logger = Logger::new();
        let result = install(
            &ForwarderConfig::default(),
            Arc::new(MemoryTransport::new()),
            &mut logger,
        );

        assert!(result.is_err());
        assert_eq!(logger.hook_count(), 0);
    }
}
