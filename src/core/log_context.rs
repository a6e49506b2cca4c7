//! Structured field values carried by log entries

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field mapping of a log entry, ordered by key
pub type Fields = BTreeMap<String, FieldValue>;

/// Value type for structured logging fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

impl FieldValue {
    /// Convert to `serde_json::Value`
    ///
    /// Returns `None` for floats JSON cannot represent (NaN, infinities).
    #[must_use]
    pub fn to_json_value(&self) -> Option<serde_json::Value> {
        match self {
            FieldValue::String(s) => Some(serde_json::Value::String(s.clone())),
            FieldValue::Int(i) => Some(serde_json::Value::Number((*i).into())),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f).map(serde_json::Value::Number),
            FieldValue::Bool(b) => Some(serde_json::Value::Bool(*b)),
            FieldValue::Null => Some(serde_json::Value::Null),
        }
    }

    /// Borrow the inner string, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::from("prod").to_string(), "prod");
        assert_eq!(FieldValue::from(42).to_string(), "42");
        assert_eq!(FieldValue::from(true).to_string(), "true");
        assert_eq!(FieldValue::Null.to_string(), "null");
    }

    #[test]
    fn test_non_finite_float_has_no_json_value() {
        assert!(FieldValue::Float(f64::NAN).to_json_value().is_none());
        assert!(FieldValue::Float(f64::INFINITY).to_json_value().is_none());
        assert_eq!(
            FieldValue::Float(1.5).to_json_value(),
            Some(serde_json::json!(1.5))
        );
    }

    #[test]
    fn test_as_str() {
        assert_eq!(FieldValue::from("v").as_str(), Some("v"));
        assert_eq!(FieldValue::from(1).as_str(), None);
    }
}
