//! Display-state projection.
//!
//! Renderers (terminal, web, ...) consume these types instead of raw cache
//! entries. Everything here is a pure function of last-known state.

use crate::cache::CacheEntry;
use crate::temperature::{TemperatureSample, TemperatureStats};
use serde::Serialize;

/// Marker shown when no trustworthy value exists.
pub const UNKNOWN_MARKER: &str = "--";

/// How a single variable should be shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "text", rename_all = "lowercase")]
pub enum DisplayState {
    /// Confirmed value, already formatted.
    Fresh(String),
    /// A read is outstanding and there is no fresh value to show.
    Loading,
    /// Never read, or the last read failed.
    Unknown(Option<String>),
}

impl DisplayState {
    /// Text to put in the value cell.
    pub fn text(&self) -> &str {
        match self {
            DisplayState::Fresh(text) => text,
            DisplayState::Loading => "...",
            DisplayState::Unknown(_) => UNKNOWN_MARKER,
        }
    }
}

/// One row of the variable table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableView {
    pub name: String,
    pub label: String,
    pub state: DisplayState,
}

/// Project a cache entry into its display state.
///
/// A stale entry never yields `Fresh`, even though the cache keeps the
/// last-good value around.
pub fn display_state(entry: &CacheEntry) -> DisplayState {
    let value = entry.value();
    match value.fresh_value() {
        Some(v) => DisplayState::Fresh(v.to_string()),
        None if entry.is_loading() => DisplayState::Loading,
        None => DisplayState::Unknown(value.error.clone()),
    }
}

pub fn variable_view(entry: &CacheEntry) -> VariableView {
    let descriptor = entry.value().descriptor();
    VariableView {
        name: descriptor.name().to_string(),
        label: descriptor.key().to_string(),
        state: display_state(entry),
    }
}

/// A point on the temperature chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// `HH:MM:SS` axis label.
    pub label: String,
    pub y: f64,
    pub anomaly: bool,
}

/// Project the history series into chart points, oldest first.
pub fn chart_points(samples: &[TemperatureSample]) -> Vec<ChartPoint> {
    samples
        .iter()
        .map(|s| ChartPoint {
            label: s
                .parsed_timestamp()
                .map(|ts| ts.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| s.timestamp.clone()),
            y: s.temperature,
            anomaly: s.anomaly,
        })
        .collect()
}

/// Current-reading panel text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentReadingView {
    pub temperature: String,
    pub status: String,
    pub anomaly: bool,
    pub last_update: String,
}

pub fn current_reading_view(current: Option<&TemperatureSample>, error: Option<&str>) -> CurrentReadingView {
    match current {
        Some(sample) => CurrentReadingView {
            temperature: format!("{:.1}", sample.temperature),
            status: if sample.anomaly {
                "Abnormal variation detected".to_string()
            } else {
                "Normal operation".to_string()
            },
            anomaly: sample.anomaly,
            last_update: sample
                .parsed_timestamp()
                .map(|ts| ts.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| sample.timestamp.clone()),
        },
        None => CurrentReadingView {
            temperature: UNKNOWN_MARKER.to_string(),
            status: error.unwrap_or("No reading available").to_string(),
            anomaly: false,
            last_update: UNKNOWN_MARKER.to_string(),
        },
    }
}

/// Statistics panel text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsView {
    pub min: String,
    pub max: String,
    pub avg: String,
    pub stdev: String,
    pub anomalies: String,
    pub count: String,
}

pub fn stats_view(stats: &TemperatureStats) -> StatsView {
    StatsView {
        min: format!("{:.1}°C", stats.min),
        max: format!("{:.1}°C", stats.max),
        avg: format!("{:.1}°C", stats.avg),
        stdev: format!("{:.1}°C", stats.stdev),
        anomalies: stats.anomalies.to_string(),
        count: stats.count.to_string(),
    }
}

/// Chart range button pressed by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSelected {
    /// Number of history points to show.
    pub limit: usize,
}
