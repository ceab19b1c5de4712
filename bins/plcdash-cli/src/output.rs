//! Terminal rendering of views and notices.

use std::fmt::Write as _;

use plcdash_client::{MonitorView, Notice, NoticeLevel};
use plcdash_core::render::{DisplayState, VariableView};
use plcdash_core::OperationResult;

/// Chart rows drawn by the monitor view.
const CHART_ROWS: usize = 20;
const BAR_WIDTH: usize = 40;

pub fn notice_line(notice: &Notice) -> String {
    let tag = match notice.level {
        NoticeLevel::Success => "ok",
        NoticeLevel::Error => "error",
        NoticeLevel::Info => "info",
    };
    format!("[{}] {}", tag, notice.message)
}

pub fn variable_table(views: &[VariableView]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<14} {:<12} {}", "VARIABLE", "ADDRESS", "VALUE");
    for view in views {
        let _ = write!(out, "{:<14} {:<12} {}", view.name, view.label, view.state.text());
        if let DisplayState::Unknown(Some(error)) = &view.state {
            let _ = write!(out, "  ({})", error);
        }
        out.push('\n');
    }
    out
}

/// Reading panel, statistics and a horizontal bar chart of the tail of
/// the history.
pub fn monitor_panel(view: &MonitorView) -> String {
    let mut out = String::new();
    let current = &view.current;
    let _ = writeln!(
        out,
        "Temperature: {} °C   {}   (updated {})",
        current.temperature, current.status, current.last_update
    );

    match &view.stats {
        Some(stats) => {
            let _ = writeln!(
                out,
                "min {}  max {}  avg {}  stdev {}  anomalies {}  samples {}",
                stats.min, stats.max, stats.avg, stats.stdev, stats.anomalies, stats.count
            );
        }
        None => {
            let _ = writeln!(out, "No statistics for the period");
        }
    }

    let points = &view.chart[view.chart.len().saturating_sub(CHART_ROWS)..];
    let (lo, hi) = points.iter().fold((f64::MAX, f64::MIN), |(lo, hi), p| {
        (lo.min(p.y), hi.max(p.y))
    });
    let span = (hi - lo).max(f64::EPSILON);
    for point in points {
        let width = 1 + ((point.y - lo) / span * (BAR_WIDTH - 1) as f64).round() as usize;
        let _ = writeln!(
            out,
            "{} {:>7.2} {}{}",
            point.label,
            point.y,
            "#".repeat(width),
            if point.anomaly { " !" } else { "" }
        );
    }

    if let Some(analysis) = &view.analysis {
        let _ = writeln!(out, "\n{}", analysis);
    }
    out
}

/// One-line summary of a uniform result.
pub fn outcome<T: std::fmt::Display>(result: &OperationResult<T>) -> String {
    match (&result.value, &result.error) {
        (Some(value), _) if result.success => value.to_string(),
        (_, Some(error)) => format!("failed: {}", error),
        _ => "failed".to_string(),
    }
}
