//! Temperature monitoring routes.
//!
//! ### `GET /api/temperature/current`
//! ### `GET /api/temperature/history?limit=N` (default 100, at most 1000)
//! ### `GET /api/temperature/stats?hours=N` (default 24)
//! ### `POST /api/temperature/analyze` `{limit, hours}`
//! ### `GET /api/temperature/report?hours=N`

use axum::{
    extract::{Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDateTime};
use serde::Deserialize;
use tracing::info;

use plcdash_core::{
    TemperatureAnalysis, TemperatureHistory, TemperatureReport, TemperatureSample, TemperatureStats,
};
use plcdash_protocol::AnalyzeRequest;

use crate::analysis::{fallback_analysis, generate_report};
use crate::error::{MockError, MockResult};
use crate::AppState;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;
pub const MAX_HISTORY_LIMIT: usize = 1000;
pub const DEFAULT_HOURS: u32 = 24;
/// Samples fed into a report's analysis.
pub const REPORT_SAMPLES: usize = 500;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct HoursQuery {
    pub hours: Option<u32>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/current", get(current))
        .route("/history", get(history))
        .route("/stats", get(stats))
        .route("/analyze", post(analyze))
        .route("/report", get(report))
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// GET /api/temperature/current
async fn current(State(state): State<AppState>) -> MockResult<Json<TemperatureSample>> {
    state
        .collector
        .read()
        .await
        .current()
        .map(Json)
        .ok_or_else(|| MockError::NotFound("No reading available".to_string()))
}

/// GET /api/temperature/history
async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<TemperatureHistory> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(MAX_HISTORY_LIMIT);
    let data = state.collector.read().await.latest(limit);
    Json(TemperatureHistory {
        count: data.len(),
        data,
    })
}

/// GET /api/temperature/stats
async fn stats(
    State(state): State<AppState>,
    Query(query): Query<HoursQuery>,
) -> MockResult<Json<TemperatureStats>> {
    let hours = query.hours.unwrap_or(DEFAULT_HOURS);
    state
        .collector
        .read()
        .await
        .statistics(hours, now())
        .map(Json)
        .ok_or_else(|| MockError::NotFound("No data for the period".to_string()))
}

/// POST /api/temperature/analyze
async fn analyze(
    State(state): State<AppState>,
    body: Option<Json<AnalyzeRequest>>,
) -> MockResult<Json<TemperatureAnalysis>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let now = now();

    let (readings, stats) = {
        let collector = state.collector.read().await;
        (
            collector.latest(req.limit.min(MAX_HISTORY_LIMIT)),
            collector.statistics(req.hours, now),
        )
    };
    if readings.is_empty() {
        return Err(MockError::NotFound("No data for analysis".to_string()));
    }

    info!("Analyzing {} readings", readings.len());
    Ok(Json(fallback_analysis(&readings, stats.as_ref(), now)))
}

/// GET /api/temperature/report
async fn report(
    State(state): State<AppState>,
    Query(query): Query<HoursQuery>,
) -> MockResult<Json<TemperatureReport>> {
    let hours = query.hours.unwrap_or(DEFAULT_HOURS);
    let now = now();

    let (readings, stats) = {
        let collector = state.collector.read().await;
        (collector.latest(REPORT_SAMPLES), collector.statistics(hours, now))
    };
    let stats = stats.ok_or_else(|| MockError::NotFound("No data for the period".to_string()))?;

    let analysis = fallback_analysis(&readings, Some(&stats), now);
    Ok(Json(TemperatureReport {
        report: generate_report(&stats, &analysis, now),
        timestamp: Some(analysis.timestamp.clone()),
        ai_powered: analysis.ai_powered,
    }))
}
