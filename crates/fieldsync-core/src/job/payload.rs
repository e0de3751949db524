//! Job input/output payload: string keys to primitive values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ConfigurationError;

/// Keys recognized by the reference jobs.
pub mod keys {
    pub const SUCCESS_COUNT: &str = "success_count";
    pub const FAILURE_COUNT: &str = "failure_count";
    pub const SYNC_TIMESTAMP: &str = "sync_timestamp";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const ACCURACY: &str = "accuracy";
    pub const TIMESTAMP: &str = "timestamp";
    pub const FILE_PATH: &str = "file_path";
    pub const UPLOADED_FILE: &str = "uploaded_file";
    pub const UPLOAD_TIMESTAMP: &str = "upload_timestamp";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PayloadValue {
    Int(i64),
    Float(f64),
    Text(String),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(BTreeMap<String, PayloadValue>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: PayloadValue) {
        self.0.insert(key.to_string(), value);
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: PayloadValue) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PayloadValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Numeric value as f64 (ints widen).
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            PayloadValue::Float(f) => Some(*f),
            PayloadValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            PayloadValue::Int(i) | PayloadValue::Timestamp(i) => Some(*i),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key)? {
            PayloadValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Required numeric input; missing or wrong type is a configuration error.
    pub fn require_f64(&self, key: &str) -> Result<f64, ConfigurationError> {
        match self.0.get(key) {
            None => Err(ConfigurationError::MissingInput(key.to_string())),
            Some(_) => self.get_f64(key).ok_or_else(|| ConfigurationError::InvalidInput {
                key: key.to_string(),
                reason: "expected a number".to_string(),
            }),
        }
    }

    /// Required non-empty text input.
    pub fn require_str(&self, key: &str) -> Result<&str, ConfigurationError> {
        match self.0.get(key) {
            None => Err(ConfigurationError::MissingInput(key.to_string())),
            Some(PayloadValue::Text(s)) if !s.trim().is_empty() => Ok(s),
            Some(_) => Err(ConfigurationError::InvalidInput {
                key: key.to_string(),
                reason: "expected non-empty text".to_string(),
            }),
        }
    }
}

/// Current time in Unix milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters() {
        let p = Payload::new()
            .with(keys::LATITUDE, PayloadValue::Float(48.1))
            .with(keys::SUCCESS_COUNT, PayloadValue::Int(2))
            .with(keys::UPLOADED_FILE, PayloadValue::Text("a.jpg".into()))
            .with(keys::TIMESTAMP, PayloadValue::Timestamp(1_700_000_000_000));
        assert_eq!(p.get_f64(keys::LATITUDE), Some(48.1));
        assert_eq!(p.get_f64(keys::SUCCESS_COUNT), Some(2.0));
        assert_eq!(p.get_i64(keys::TIMESTAMP), Some(1_700_000_000_000));
        assert_eq!(p.get_str(keys::UPLOADED_FILE), Some("a.jpg"));
        assert_eq!(p.get_str(keys::LATITUDE), None);
        assert_eq!(p.len(), 4);
    }

    #[test]
    fn required_inputs() {
        let p = Payload::new()
            .with(keys::LATITUDE, PayloadValue::Text("north".into()))
            .with(keys::FILE_PATH, PayloadValue::Text("  ".into()));
        assert_eq!(
            p.require_f64(keys::LONGITUDE),
            Err(ConfigurationError::MissingInput("longitude".into()))
        );
        assert!(matches!(
            p.require_f64(keys::LATITUDE),
            Err(ConfigurationError::InvalidInput { .. })
        ));
        assert!(matches!(
            p.require_str(keys::FILE_PATH),
            Err(ConfigurationError::InvalidInput { .. })
        ));
    }

    #[test]
    fn serializes_as_tagged_map() {
        let p = Payload::new().with(keys::FAILURE_COUNT, PayloadValue::Int(1));
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"{"failure_count":{"type":"int","value":1}}"#);
    }
}
