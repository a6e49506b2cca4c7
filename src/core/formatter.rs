//! Entry formatters
//!
//! A formatter turns an entry into the bytes a transport publishes:
//! - `JsonFormatter`: one JSON object per entry (default)
//! - `LogfmtFormatter`: space separated key=value pairs

use super::error::{ForwarderError, Result};
use super::log_context::FieldValue;
use super::log_entry::LogEntry;
use super::timestamp::TimestampFormat;
use std::collections::BTreeSet;

/// Converts a log entry into a byte payload
///
/// Implementations must be deterministic for a given entry.
pub trait Formatter: Send + Sync {
    fn format(&self, entry: &LogEntry) -> Result<Vec<u8>>;
    fn name(&self) -> &str;
}

const TIME_KEY: &str = "time";
const LEVEL_KEY: &str = "level";
const MESSAGE_KEY: &str = "msg";

/// Envelope keys a field must not overwrite; clashing fields are written
/// under `fields.<key>` instead.
fn envelope_safe_key(key: &str) -> String {
    match key {
        TIME_KEY | LEVEL_KEY | MESSAGE_KEY => format!("fields.{}", key),
        _ => key.to_string(),
    }
}

/// JSON formatter
///
/// Example: `{"env":"prod","level":"info","msg":"Request processed","time":"2025-01-08T10:30:45Z"}`
///
/// A field named `time`, `level` or `msg` is written as `fields.<key>`. If the
/// entry also carries a field literally named `fields.<key>`, the renamed
/// field replaces it in the output.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    timestamp_format: TimestampFormat,
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, entry: &LogEntry) -> Result<Vec<u8>> {
        let mut json_obj = serde_json::Map::new();

        for (key, value) in &entry.data {
            let json_value = value.to_json_value().ok_or_else(|| {
                ForwarderError::serialization(
                    self.name(),
                    format!("field '{}' holds a value JSON cannot represent: {}", key, value),
                )
            })?;
            json_obj.insert(envelope_safe_key(key), json_value);
        }

        json_obj.insert(
            TIME_KEY.to_string(),
            self.timestamp_format.to_json_value(&entry.timestamp),
        );
        json_obj.insert(
            LEVEL_KEY.to_string(),
            serde_json::Value::String(entry.level.to_str().to_string()),
        );
        json_obj.insert(
            MESSAGE_KEY.to_string(),
            serde_json::Value::String(entry.message.clone()),
        );

        let value = serde_json::Value::Object(json_obj);
        let mut bytes = if self.pretty {
            serde_json::to_vec_pretty(&value)
        } else {
            serde_json::to_vec(&value)
        }
        .map_err(|e| ForwarderError::serialization(self.name(), e.to_string()))?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    fn name(&self) -> &str {
        "json"
    }
}

/// Logfmt formatter
///
/// Example: `time=2025-01-08T10:30:45Z level=info msg="Request processed" env=prod`
#[derive(Debug, Clone, Default)]
pub struct LogfmtFormatter {
    timestamp_format: TimestampFormat,
}

impl LogfmtFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Keys are written bare, so only characters that need no escaping are
    /// accepted
    fn check_key(&self, key: &str) -> Result<()> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.');
        if valid {
            Ok(())
        } else {
            Err(ForwarderError::serialization(
                self.name(),
                format!("field key {:?} cannot be written as a logfmt key", key),
            ))
        }
    }

    /// Quote a value if it contains spaces, quotes, `=` or control characters
    fn escape_value(value: &str) -> String {
        if value.is_empty() || value.chars().any(|c| matches!(c, ' ' | '"' | '=') || c.is_control()) {
            Self::quote_value(value)
        } else {
            value.to_string()
        }
    }

    fn quote_value(value: &str) -> String {
        let mut quoted = String::with_capacity(value.len() + 2);
        quoted.push('"');
        for c in value.chars() {
            match c {
                '\\' => quoted.push_str("\\\\"),
                '"' => quoted.push_str("\\\""),
                '\n' => quoted.push_str("\\n"),
                '\r' => quoted.push_str("\\r"),
                '\t' => quoted.push_str("\\t"),
                c if c.is_control() => quoted.push_str(&format!("\\u{{{:04x}}}", c as u32)),
                c => quoted.push(c),
            }
        }
        quoted.push('"');
        quoted
    }
}

impl Formatter for LogfmtFormatter {
    fn format(&self, entry: &LogEntry) -> Result<Vec<u8>> {
        let mut parts = Vec::with_capacity(entry.data.len() + 3);

        parts.push(format!(
            "{}={}",
            TIME_KEY,
            Self::escape_value(&self.timestamp_format.format(&entry.timestamp))
        ));
        parts.push(format!("{}={}", LEVEL_KEY, entry.level.to_str()));
        parts.push(format!("{}={}", MESSAGE_KEY, Self::quote_value(&entry.message)));

        let mut written = BTreeSet::new();
        for (key, value) in &entry.data {
            self.check_key(key)?;
            let key = envelope_safe_key(key);
            if !written.insert(key.clone()) {
                return Err(ForwarderError::serialization(
                    self.name(),
                    format!("more than one field would be written as '{}'", key),
                ));
            }

            let formatted_value = match value {
                FieldValue::String(s) => Self::escape_value(s),
                other => Self::escape_value(&other.to_string()),
            };
            parts.push(format!("{}={}", key, formatted_value));
        }

        let mut line = parts.join(" ");
        line.push('\n');
        Ok(line.into_bytes())
    }

    fn name(&self) -> &str {
        "logfmt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;

    fn parse(bytes: &[u8]) -> serde_json::Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn test_json_format() {
        let entry = LogEntry::new(LogLevel::Error, "Error occurred")
            .with_field("request_id", "abc-123")
            .with_field("latency_ms", 42);

        let bytes = JsonFormatter::new().format(&entry).unwrap();
        assert_eq!(bytes.last(), Some(&b'\n'));

        let parsed = parse(&bytes);
        assert_eq!(parsed["level"], "error");
        assert_eq!(parsed["msg"], "Error occurred");
        assert_eq!(parsed["request_id"], "abc-123");
        assert_eq!(parsed["latency_ms"], 42);
        assert!(parsed["time"].is_string());
    }

    #[test]
    fn test_json_field_clash_is_prefixed() {
        let entry = LogEntry::new(LogLevel::Info, "real message")
            .with_field("msg", "spoofed")
            .with_field("level", "panic");

        let parsed = parse(&JsonFormatter::new().format(&entry).unwrap());
        assert_eq!(parsed["msg"], "real message");
        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["fields.msg"], "spoofed");
        assert_eq!(parsed["fields.level"], "panic");
    }

    #[test]
    fn test_json_rejects_non_finite_float() {
        let entry = LogEntry::new(LogLevel::Info, "load").with_field("ratio", f64::NAN);

        let err = JsonFormatter::new().format(&entry).unwrap_err();
        assert!(matches!(err, ForwarderError::Serialization { .. }));
        assert!(err.to_string().contains("ratio"));
    }

    #[test]
    fn test_json_is_deterministic() {
        let entry = LogEntry::new(LogLevel::Warn, "same")
            .with_field("b", 2)
            .with_field("a", 1);
        let formatter = JsonFormatter::new();

        assert_eq!(formatter.format(&entry).unwrap(), formatter.format(&entry).unwrap());
    }

    #[test]
    fn test_json_numeric_timestamp() {
        let entry = LogEntry::new(LogLevel::Info, "numeric");
        let formatter = JsonFormatter::new().with_timestamp_format(TimestampFormat::UnixMillis);

        let parsed = parse(&formatter.format(&entry).unwrap());
        assert_eq!(parsed["time"], entry.timestamp.timestamp_millis());
    }

    #[test]
    fn test_logfmt_format() {
        let entry = LogEntry::new(LogLevel::Warn, "Warning message")
            .with_field("user", "alice")
            .with_field("count", 5);

        let line = String::from_utf8(LogfmtFormatter::new().format(&entry).unwrap()).unwrap();
        assert!(line.contains("level=warning"));
        assert!(line.contains("msg=\"Warning message\""));
        assert!(line.contains("user=alice"));
        assert!(line.contains("count=5"));
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn test_logfmt_escape_special_chars() {
        let entry = LogEntry::new(LogLevel::Debug, "Query executed")
            .with_field("query", "SELECT * FROM users WHERE id=1");

        let line = String::from_utf8(LogfmtFormatter::new().format(&entry).unwrap()).unwrap();
        assert!(line.contains("query=\"SELECT * FROM users WHERE id=1\""));
    }

    #[test]
    fn test_json_renamed_field_replaces_literal_prefixed_key() {
        let entry = LogEntry::new(LogLevel::Info, "real")
            .with_field("fields.msg", "literal")
            .with_field("msg", "renamed");

        let parsed = parse(&JsonFormatter::new().format(&entry).unwrap());
        assert_eq!(parsed["msg"], "real");
        assert_eq!(parsed["fields.msg"], "renamed");
    }

    #[test]
    fn test_logfmt_rejects_empty_key() {
        let entry = LogEntry::new(LogLevel::Info, "m").with_field("", "empty-key");

        let err = LogfmtFormatter::new().format(&entry).unwrap_err();
        assert!(matches!(err, ForwarderError::Serialization { ref format, .. } if format == "logfmt"));
    }

    #[test]
    fn test_logfmt_rejects_keys_that_need_escaping() {
        let entry = LogEntry::new(LogLevel::Info, "m")
            .with_field("a b", "1")
            .with_field("ab", "2");

        let err = LogfmtFormatter::new().format(&entry).unwrap_err();
        assert!(matches!(err, ForwarderError::Serialization { .. }));
        assert!(err.to_string().contains("a b"));

        // Without the offending key the other one is written as is
        let entry = LogEntry::new(LogLevel::Info, "m").with_field("ab", "2");
        let line = String::from_utf8(LogfmtFormatter::new().format(&entry).unwrap()).unwrap();
        assert!(line.contains(" ab=2"));
    }

    #[test]
    fn test_logfmt_rejects_duplicate_output_keys() {
        let entry = LogEntry::new(LogLevel::Info, "m")
            .with_field("fields.msg", "literal")
            .with_field("msg", "renamed");

        let err = LogfmtFormatter::new().format(&entry).unwrap_err();
        assert!(err.to_string().contains("fields.msg"));
    }

    #[test]
    fn test_logfmt_quotes_control_characters() {
        let entry = LogEntry::new(LogLevel::Info, "line\rbreak")
            .with_field("cr", "x\ry")
            .with_field("bell", "a\u{7}b");

        let line = String::from_utf8(LogfmtFormatter::new().format(&entry).unwrap()).unwrap();
        assert!(line.contains("cr=\"x\\ry\""));
        assert!(line.contains("bell=\"a\\u{0007}b\""));
        assert!(line.contains("msg=\"line\\rbreak\""));
        assert!(!line.contains('\r'));
        assert_eq!(line.matches('\n').count(), 1);
    }
}
