//! Live parameter sample records, as pushed by the hosting application's
//! subscription transport. The engine never polls; these types are the
//! inbound half of the contract boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the ground system acquired (or failed to acquire) a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcquisitionStatus {
    Acquired,
    NotReceived,
    Invalid,
    Expired,
}

/// Limit-monitoring verdict attached to an acquired value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitoringResult {
    Disabled,
    InLimits,
    Watch,
    Warning,
    Distress,
    Critical,
    Severe,
}

/// A raw or engineering parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Float(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the value; text payloads that parse as numbers count.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// One inbound update for a named telemetry parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSample {
    pub ops_name: String,
    pub raw_value: Value,
    pub eng_value: Value,
    pub acquisition_status: AcquisitionStatus,
    /// Absent when the parameter is not limit-monitored.
    pub monitoring_result: Option<MonitoringResult>,
    pub generation_time: DateTime<Utc>,
}

impl ParameterSample {
    /// The value a binding sees, honouring its raw-vs-engineering setting.
    pub fn value(&self, using_raw: bool) -> &Value {
        if using_raw {
            &self.raw_value
        } else {
            &self.eng_value
        }
    }
}

/// One retained point of a trend series: generation time plus the value,
/// where `None` marks an expired-parameter gap that must render as a visible
/// discontinuity rather than an interpolated line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time: DateTime<Utc>,
    pub value: Option<f64>,
}

impl Sample {
    pub fn new(time: DateTime<Utc>, value: Option<f64>) -> Self {
        Self { time, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(raw: f64, eng: f64) -> ParameterSample {
        ParameterSample {
            ops_name: "TEMP".into(),
            raw_value: Value::Float(raw),
            eng_value: Value::Float(eng),
            acquisition_status: AcquisitionStatus::Acquired,
            monitoring_result: Some(MonitoringResult::InLimits),
            generation_time: Utc::now(),
        }
    }

    #[test]
    fn test_raw_vs_eng_selection() {
        let s = sample(1024.0, 21.5);
        assert_eq!(s.value(true).as_f64(), Some(1024.0));
        assert_eq!(s.value(false).as_f64(), Some(21.5));
    }

    #[test]
    fn test_text_value_numeric_view() {
        assert_eq!(Value::Text("  3.5 ".into()).as_f64(), Some(3.5));
        assert_eq!(Value::Text("ON".into()).as_f64(), None);
    }

    #[test]
    fn test_status_serde_names() {
        let json = serde_json::to_string(&AcquisitionStatus::NotReceived).unwrap();
        assert_eq!(json, "\"NOT_RECEIVED\"");
        let mr: MonitoringResult = serde_json::from_str("\"IN_LIMITS\"").unwrap();
        assert_eq!(mr, MonitoringResult::InLimits);
    }
}
