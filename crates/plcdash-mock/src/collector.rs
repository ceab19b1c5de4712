//! Temperature sample collection.
//!
//! The collector keeps a bounded in-memory series. Each new sample gets a
//! rate of change relative to the previous one, and is flagged as an
//! anomaly when that rate exceeds [`ANOMALY_RATE`].

use std::collections::VecDeque;
use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use plcdash_core::{TemperatureSample, TemperatureStats, SAMPLE_TIMESTAMP_FORMAT};

/// °C per second above which a variation counts as abnormal (2 °C in 5 s).
pub const ANOMALY_RATE: f64 = 0.4;

/// Samples kept before the oldest are dropped (one day at 5 s).
pub const DEFAULT_CAPACITY: usize = 17_280;

#[derive(Debug, Clone)]
struct Recorded {
    at: NaiveDateTime,
    sample: TemperatureSample,
}

#[derive(Debug, Clone)]
pub struct TemperatureCollector {
    samples: VecDeque<Recorded>,
    interval: Duration,
    capacity: usize,
}

impl TemperatureCollector {
    pub fn new(interval: Duration) -> Self {
        Self::with_capacity(interval, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(interval: Duration, capacity: usize) -> Self {
        Self {
            samples: VecDeque::new(),
            interval,
            capacity: capacity.max(1),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Record a reading taken at `at` (local time).
    pub fn record(&mut self, temperature: f64, at: NaiveDateTime) -> TemperatureSample {
        let previous = self.samples.back().map(|r| r.sample.temperature);
        let secs = self.interval.as_secs_f64();
        let rate = match previous {
            Some(prev) if secs > 0.0 => (temperature - prev) / secs,
            _ => 0.0,
        };
        let anomaly = previous.is_some() && rate.abs() > ANOMALY_RATE;

        let sample = TemperatureSample {
            timestamp: at.format(SAMPLE_TIMESTAMP_FORMAT).to_string(),
            temperature,
            anomaly,
            rate_of_change: Some(rate),
        };

        if anomaly {
            warn!("Anomaly: {:.2}°C ({:+.2}°C/s)", temperature, rate);
        } else {
            debug!("Recorded {:.2}°C", temperature);
        }

        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(Recorded {
            at,
            sample: sample.clone(),
        });
        sample
    }

    /// The newest `limit` samples, oldest first.
    pub fn latest(&self, limit: usize) -> Vec<TemperatureSample> {
        let skip = self.samples.len().saturating_sub(limit);
        self.samples
            .iter()
            .skip(skip)
            .map(|r| r.sample.clone())
            .collect()
    }

    pub fn current(&self) -> Option<TemperatureSample> {
        self.samples.back().map(|r| r.sample.clone())
    }

    /// Statistics over the samples of the last `hours` before `now`.
    ///
    /// Returns `None` when the window is empty. The standard deviation is
    /// the sample deviation, 0 with fewer than two samples.
    pub fn statistics(&self, hours: u32, now: NaiveDateTime) -> Option<TemperatureStats> {
        // a window reaching past the calendar covers every sample
        let since = now.checked_sub_signed(chrono::Duration::hours(i64::from(hours)));
        let window: Vec<&TemperatureSample> = self
            .samples
            .iter()
            .filter(|r| since.map_or(true, |since| r.at >= since))
            .map(|r| &r.sample)
            .collect();

        if window.is_empty() {
            return None;
        }

        let count = window.len();
        let temps = window.iter().map(|s| s.temperature);
        let min = temps.clone().fold(f64::INFINITY, f64::min);
        let max = temps.clone().fold(f64::NEG_INFINITY, f64::max);
        let avg = temps.clone().sum::<f64>() / count as f64;
        let stdev = if count > 1 {
            let var = temps.map(|t| (t - avg).powi(2)).sum::<f64>() / (count - 1) as f64;
            var.sqrt()
        } else {
            0.0
        };

        Some(TemperatureStats {
            count,
            min,
            max,
            avg,
            stdev,
            anomalies: window.iter().filter(|s| s.anomaly).count(),
            period_hours: Some(hours),
        })
    }
}
