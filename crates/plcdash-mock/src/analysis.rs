//! Rule-based temperature analysis and the text report.

use std::fmt;

use chrono::NaiveDateTime;

use plcdash_core::{TemperatureAnalysis, TemperatureSample, TemperatureStats};

/// Samples averaged at each end of the series to estimate the trend.
pub const TREND_WINDOW: usize = 10;

/// Difference in °C between the two ends that counts as a trend.
pub const TREND_THRESHOLD: f64 = 1.0;

/// Standard deviation above which variability is called out.
pub const HIGH_STDEV: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trend {
    Rising(f64),
    Falling(f64),
    Stable,
    Insufficient,
}

impl Trend {
    /// Compare the mean of the last [`TREND_WINDOW`] samples against the
    /// mean of the first ones.
    pub fn of(temps: &[f64]) -> Self {
        if temps.len() < TREND_WINDOW {
            return Trend::Insufficient;
        }
        let mean = |s: &[f64]| s.iter().sum::<f64>() / s.len() as f64;
        let diff = mean(&temps[temps.len() - TREND_WINDOW..]) - mean(&temps[..TREND_WINDOW]);

        if diff > TREND_THRESHOLD {
            Trend::Rising(diff)
        } else if diff < -TREND_THRESHOLD {
            Trend::Falling(diff)
        } else {
            Trend::Stable
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Rising(d) => write!(f, "Rising (+{:.1}°C)", d),
            Trend::Falling(d) => write!(f, "Falling ({:.1}°C)", d),
            Trend::Stable => f.write_str("Stable"),
            Trend::Insufficient => f.write_str("Not enough data"),
        }
    }
}

/// Analyze `readings` without any external model.
pub fn fallback_analysis(
    readings: &[TemperatureSample],
    stats: Option<&TemperatureStats>,
    now: NaiveDateTime,
) -> TemperatureAnalysis {
    let timestamp = now.format("%Y-%m-%dT%H:%M:%S").to_string();

    if readings.is_empty() {
        return TemperatureAnalysis {
            analysis: "Not enough data for analysis".to_string(),
            ai_powered: false,
            timestamp,
            provider: None,
            data_points: Some(0),
        };
    }

    let temps: Vec<f64> = readings.iter().map(|r| r.temperature).collect();
    let min = temps.iter().copied().fold(f64::INFINITY, f64::min);
    let max = temps.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg = temps.iter().sum::<f64>() / temps.len() as f64;
    let anomalies = readings.iter().filter(|r| r.anomaly).count();
    let trend = Trend::of(&temps);

    let behaviour = if anomalies as f64 > temps.len() as f64 * 0.1 {
        "Warning: frequent variations"
    } else {
        "Normal behaviour"
    };
    let recommendation = if anomalies > 5 {
        "Investigate the cause of the sudden variations"
    } else {
        "System operating within expected parameters"
    };

    let mut analysis = format!(
        "**Automatic analysis** (rule-based)\n\
         \n\
         **Temperature range**\n\
         \x20  Min: {:.1}°C | Max: {:.1}°C | Avg: {:.1}°C\n\
         \n\
         **Recent trend**\n\
         \x20  {}\n\
         \n\
         **Anomalies**\n\
         \x20  {} sudden variations detected\n\
         \x20  {}\n\
         \n\
         **Recommendation**\n\
         \x20  {}",
        min, max, avg, trend, anomalies, behaviour, recommendation
    );

    if let Some(stdev) = stats.map(|s| s.stdev).filter(|s| *s > HIGH_STDEV) {
        analysis.push_str(&format!("\n   High variability (σ={:.1}°C)", stdev));
    }

    TemperatureAnalysis {
        analysis,
        ai_powered: false,
        timestamp,
        provider: None,
        data_points: Some(readings.len()),
    }
}

/// Render the full text report.
pub fn generate_report(
    stats: &TemperatureStats,
    analysis: &TemperatureAnalysis,
    now: NaiveDateTime,
) -> String {
    let rule = "-".repeat(62);
    format!(
        "TEMPERATURE ANALYSIS REPORT\n\
         \n\
         Generated:        {}\n\
         Period analyzed:  {}h\n\
         Data points:      {}\n\
         {rule}\n\
         STATISTICS\n\
         {rule}\n\
         Minimum:          {:.2}°C\n\
         Maximum:          {:.2}°C\n\
         Average:          {:.2}°C\n\
         Std deviation:    {:.2}°C\n\
         Anomalies:        {}\n\
         {rule}\n\
         ANALYSIS ({})\n\
         {rule}\n\
         {}\n\
         {rule}\n",
        now.format("%d/%m/%Y %H:%M:%S"),
        stats.period_hours.unwrap_or(24),
        stats.count,
        stats.min,
        stats.max,
        stats.avg,
        stats.stdev,
        stats.anomalies,
        if analysis.ai_powered { "AI" } else { "automatic" },
        analysis.analysis,
        rule = rule,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 2)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap()
    }

    fn samples(temps: &[f64]) -> Vec<TemperatureSample> {
        temps
            .iter()
            .map(|t| TemperatureSample {
                timestamp: "2024-05-02 14:00:00".to_string(),
                temperature: *t,
                anomaly: false,
                rate_of_change: None,
            })
            .collect()
    }

    #[test]
    fn test_trend() {
        let rising: Vec<f64> = (0..20).map(|i| 20.0 + i as f64 * 0.2).collect();
        assert!(matches!(Trend::of(&rising), Trend::Rising(d) if (d - 2.0).abs() < 1e-9));

        let flat = vec![50.0; 20];
        assert_eq!(Trend::of(&flat), Trend::Stable);

        let falling: Vec<f64> = (0..20).map(|i| 80.0 - i as f64).collect();
        assert!(matches!(Trend::of(&falling), Trend::Falling(_)));

        assert_eq!(Trend::of(&[1.0, 2.0]), Trend::Insufficient);
    }

    #[test]
    fn test_fallback_analysis() {
        let readings = samples(&[20.0, 21.0, 22.0]);
        let analysis = fallback_analysis(&readings, None, now());

        assert!(!analysis.ai_powered);
        assert_eq!(analysis.data_points, Some(3));
        assert_eq!(analysis.timestamp, "2024-05-02T14:00:00");
        assert!(analysis.analysis.contains("Min: 20.0°C | Max: 22.0°C | Avg: 21.0°C"));
        assert!(analysis.analysis.contains("Not enough data"));
        assert!(analysis.analysis.contains("within expected parameters"));
    }

    #[test]
    fn test_high_variability_noted() {
        let readings = samples(&[10.0, 30.0]);
        let stats = TemperatureStats {
            count: 2,
            min: 10.0,
            max: 30.0,
            avg: 20.0,
            stdev: 14.1,
            anomalies: 0,
            period_hours: Some(24),
        };
        let analysis = fallback_analysis(&readings, Some(&stats), now());
        assert!(analysis.analysis.contains("High variability (σ=14.1°C)"));
    }

    #[test]
    fn test_empty_readings() {
        let analysis = fallback_analysis(&[], None, now());
        assert_eq!(analysis.analysis, "Not enough data for analysis");
    }

    #[test]
    fn test_report_sections() {
        let stats = TemperatureStats {
            count: 3,
            min: 20.0,
            max: 22.0,
            avg: 21.0,
            stdev: 1.0,
            anomalies: 0,
            period_hours: Some(6),
        };
        let analysis = fallback_analysis(&samples(&[20.0, 21.0, 22.0]), Some(&stats), now());
        let report = generate_report(&stats, &analysis, now());

        assert!(report.starts_with("TEMPERATURE ANALYSIS REPORT"));
        assert!(report.contains("Period analyzed:  6h"));
        assert!(report.contains("Average:          21.00°C"));
        assert!(report.contains("ANALYSIS (automatic)"));
        assert!(report.contains(&analysis.analysis));
    }
}
