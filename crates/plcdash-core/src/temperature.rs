//! Temperature monitoring records.
//!
//! Samples, statistics and analysis results as served by the remote
//! service's `/temperature/*` endpoints. The client only reads these.

use serde::{Deserialize, Serialize};

/// Timestamp format used by the temperature collector (local time).
pub const SAMPLE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One reading in the temperature time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureSample {
    /// Local timestamp, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Flagged by the server as an abnormal variation.
    #[serde(default)]
    pub anomaly: bool,
    /// °C per second relative to the previous sample.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_of_change: Option<f64>,
}

impl TemperatureSample {
    /// Parse the sample timestamp.
    pub fn parsed_timestamp(&self) -> Option<chrono::NaiveDateTime> {
        chrono::NaiveDateTime::parse_from_str(&self.timestamp, SAMPLE_TIMESTAMP_FORMAT)
            .or_else(|_| chrono::NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f"))
            .ok()
    }
}

/// History response: `{data: [...], count}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemperatureHistory {
    pub data: Vec<TemperatureSample>,
    #[serde(default)]
    pub count: usize,
}

/// Aggregate statistics over a trailing window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub stdev: f64,
    pub anomalies: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_hours: Option<u32>,
}

/// Result of `POST /temperature/analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureAnalysis {
    pub analysis: String,
    #[serde(default)]
    pub ai_powered: bool,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_points: Option<usize>,
}

/// Result of `GET /temperature/report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReport {
    pub report: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub ai_powered: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_from_collector_json() {
        let json = r#"{"timestamp":"2024-05-02 14:03:10","temperature":71.25,"anomaly":true,"rate_of_change":0.5}"#;
        let sample: TemperatureSample = serde_json::from_str(json).unwrap();
        assert!(sample.anomaly);
        assert_eq!(sample.rate_of_change, Some(0.5));

        let ts = sample.parsed_timestamp().unwrap();
        assert_eq!(ts.format("%H:%M:%S").to_string(), "14:03:10");
    }

    #[test]
    fn test_sample_without_optional_fields() {
        let json = r#"{"timestamp":"2024-05-02T14:03:10.250","temperature":20.0}"#;
        let sample: TemperatureSample = serde_json::from_str(json).unwrap();
        assert!(!sample.anomaly);
        assert!(sample.parsed_timestamp().is_some());
    }

    #[test]
    fn test_analysis_defaults() {
        let json = r#"{"analysis":"ok","timestamp":"2024-05-02T14:03:10"}"#;
        let analysis: TemperatureAnalysis = serde_json::from_str(json).unwrap();
        assert!(!analysis.ai_powered);
        assert_eq!(analysis.provider, None);
    }
}
