//! Hook that enriches entries and publishes them to a subject

use crate::core::{
    ForwarderError, ForwarderMetrics, Formatter, Hook, JsonFormatter, LogEntry, LogLevel, Result,
};
use crate::transport::Transport;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Produces a field value at fire time
pub type FieldGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Static and dynamic fields share one key space: a key lives in at most
/// one of the two maps.
#[derive(Default)]
struct Enrichment {
    static_fields: BTreeMap<String, String>,
    dynamic_fields: BTreeMap<String, FieldGenerator>,
}

/// Forwards log entries to a publish/subscribe subject
///
/// Every fired entry is enriched in place with the configured static
/// fields, then with the output of each dynamic field generator, then
/// serialized and published on the subject. Enrichment is written into the
/// caller's entry and stays there whatever happens afterwards, so hooks
/// fired later in the chain see it.
///
/// Nothing is retried or buffered: an entry that fails to publish is lost
/// and the error is handed back to the logger.
///
/// # Example
///
/// ```
/// use log_forwarder::transport::MemoryTransport;
/// use log_forwarder::{Hook, LogEntry, LogForwarder, LogLevel};
/// use std::sync::Arc;
///
/// let transport = Arc::new(MemoryTransport::new());
/// let rx = transport.subscribe("logs.app");
///
/// let forwarder = LogForwarder::new(transport, "logs.app").unwrap();
/// forwarder.add_static_field("env", "prod");
///
/// let mut entry = LogEntry::new(LogLevel::Info, "started");
/// forwarder.fire(&mut entry).unwrap();
///
/// let published: serde_json::Value = serde_json::from_slice(&rx.recv().unwrap().payload).unwrap();
/// assert_eq!(published["env"], "prod");
/// ```
pub struct LogForwarder {
    transport: Arc<dyn Transport>,
    subject: String,
    fields: RwLock<Enrichment>,
    formatter: Box<dyn Formatter>,
    metrics: ForwarderMetrics,

    /// Levels reported to the logger; every level by default
    pub log_levels: Vec<LogLevel>,
}

impl LogForwarder {
    /// Create a forwarder publishing on `subject`
    ///
    /// The transport is not checked here; a closed transport only shows up
    /// on the first fire.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `subject` is empty.
    pub fn new(transport: Arc<dyn Transport>, subject: impl Into<String>) -> Result<Self> {
        let subject = subject.into();
        if subject.is_empty() {
            return Err(ForwarderError::config(
                "LogForwarder",
                "Must provide a subject for the log forwarder",
            ));
        }

        Ok(Self {
            transport,
            subject,
            fields: RwLock::new(Enrichment::default()),
            formatter: Box::new(JsonFormatter::new()),
            metrics: ForwarderMetrics::new(),
            log_levels: LogLevel::ALL.to_vec(),
        })
    }

    /// Replace the serializer (JSON by default)
    #[must_use]
    pub fn with_formatter<F: Formatter + 'static>(mut self, formatter: F) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn formatter_name(&self) -> &str {
        self.formatter.name()
    }

    /// Add a fixed value to every forwarded entry
    ///
    /// Replaces any static or dynamic field registered under `key`.
    pub fn add_static_field(&self, key: impl Into<String>, value: impl Into<String>) -> &Self {
        let key = key.into();
        let mut fields = self.fields.write();
        fields.dynamic_fields.remove(&key);
        fields.static_fields.insert(key, value.into());
        drop(fields);
        self
    }

    /// Add a field whose value is computed on every fire
    ///
    /// Replaces any static or dynamic field registered under `key`.
    /// Generators run on the logging thread, once per fired entry, in no
    /// particular order relative to each other.
    pub fn add_dynamic_field<F>(&self, key: impl Into<String>, generator: F) -> &Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        let key = key.into();
        let mut fields = self.fields.write();
        fields.static_fields.remove(&key);
        fields.dynamic_fields.insert(key, Arc::new(generator));
        drop(fields);
        self
    }

    /// Snapshot of the static fields
    pub fn static_fields(&self) -> BTreeMap<String, String> {
        self.fields.read().static_fields.clone()
    }

    pub fn dynamic_field_keys(&self) -> Vec<String> {
        self.fields.read().dynamic_fields.keys().cloned().collect()
    }

    pub fn metrics(&self) -> &ForwarderMetrics {
        &self.metrics
    }

    /// Merge static then dynamic fields into the entry
    fn enrich(&self, entry: &mut LogEntry) {
        let generators: Vec<(String, FieldGenerator)> = {
            let fields = self.fields.read();
            for (key, value) in &fields.static_fields {
                entry.set_field(key.clone(), value.as_str());
            }
            fields
                .dynamic_fields
                .iter()
                .map(|(key, generator)| (key.clone(), Arc::clone(generator)))
                .collect()
        };

        // Generators run without the lock held so they may log or add fields
        for (key, generator) in generators {
            entry.set_field(key, generator());
        }
    }
}

impl Hook for LogForwarder {
    fn fire(&self, entry: &mut LogEntry) -> Result<()> {
        // Best effort: the transport may still close before publish
        if self.transport.is_closed() {
            self.metrics.record_transport_unavailable();
            return Err(ForwarderError::transport_unavailable(&self.subject));
        }

        self.enrich(entry);

        let payload = match self.formatter.format(entry) {
            Ok(payload) => payload,
            Err(e) => {
                self.metrics.record_serialization_failure();
                return Err(match e {
                    ForwarderError::Serialization { .. } => e,
                    other => ForwarderError::serialization(self.formatter.name(), other.to_string()),
                });
            }
        };

        match self.transport.publish(&self.subject, &payload) {
            Ok(()) => {
                self.metrics.record_forwarded();
                Ok(())
            }
            Err(e) => {
                self.metrics.record_publish_failure();
                Err(ForwarderError::publish(&self.subject, e))
            }
        }
    }

    fn levels(&self) -> Vec<LogLevel> {
        self.log_levels.clone()
    }
}

impl fmt::Debug for LogForwarder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self.fields.read();
        f.debug_struct("LogForwarder")
            .field("subject", &self.subject)
            .field("formatter", &self.formatter.name())
            .field("static_fields", &fields.static_fields)
            .field("dynamic_fields", &fields.dynamic_fields.keys().collect::<Vec<_>>())
            .field("log_levels", &self.log_levels)
            .finish()
    }
}
