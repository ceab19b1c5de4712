//! Temperature monitoring view state.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use plcdash_core::render::{
    chart_points, current_reading_view, stats_view, ChartPoint, CurrentReadingView, RangeSelected,
    StatsView,
};
use plcdash_core::{
    OperationResult, SyncError, TemperatureAnalysis, TemperatureReport, TemperatureSample,
    TemperatureStats,
};

use crate::notify::Notifier;
use crate::temperature::{TemperatureClient, MAX_HISTORY_LIMIT};

#[derive(Debug, Default)]
struct MonitorState {
    current: Option<TemperatureSample>,
    current_error: Option<String>,
    history: Vec<TemperatureSample>,
    stats: Option<TemperatureStats>,
    analysis: Option<TemperatureAnalysis>,
    history_limit: usize,
    /// Bumped on every range change; history fetched for an older range
    /// is dropped.
    range_generation: u64,
    stats_hours: u32,
}

/// Everything the monitoring view draws.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorView {
    pub current: CurrentReadingView,
    pub chart: Vec<ChartPoint>,
    pub stats: Option<StatsView>,
    pub history_limit: usize,
    pub analysis: Option<String>,
}

/// Shared handle to the monitoring view.
#[derive(Clone)]
pub struct TemperatureMonitor {
    client: TemperatureClient,
    notifier: Notifier,
    state: Arc<RwLock<MonitorState>>,
}

impl TemperatureMonitor {
    pub fn new(
        client: TemperatureClient,
        notifier: Notifier,
        history_limit: usize,
        stats_hours: u32,
    ) -> Self {
        Self {
            client,
            notifier,
            state: Arc::new(RwLock::new(MonitorState {
                history_limit: history_limit.clamp(1, MAX_HISTORY_LIMIT),
                stats_hours,
                ..MonitorState::default()
            })),
        }
    }

    pub fn client(&self) -> &TemperatureClient {
        &self.client
    }

    /// Fetch the current reading and the chart history.
    ///
    /// A failed fetch clears what it would have replaced, so neither the
    /// reading nor the chart outlives its source.
    pub async fn refresh_live(&self) -> OperationResult<()> {
        let (limit, generation) = {
            let state = self.state.read().await;
            (state.history_limit, state.range_generation)
        };
        let (current, history) = tokio::join!(self.client.current(), self.client.history(limit));

        let mut failure = None;
        {
            let mut state = self.state.write().await;
            match current {
                Ok(sample) => {
                    state.current = Some(sample);
                    state.current_error = None;
                }
                Err(e) => {
                    state.current = None;
                    state.current_error = Some(e.to_string());
                    failure = Some(e);
                }
            }
            if state.range_generation != generation {
                debug!("Dropping history fetched for limit {}", limit);
            } else {
                match history {
                    Ok(samples) => state.history = samples,
                    Err(e) => {
                        warn!("Temperature history: {}", e);
                        state.history.clear();
                        failure.get_or_insert(e);
                    }
                }
            }
        }

        match failure {
            None => OperationResult::ok(()),
            Some(e) => self.fail("Temperature", e),
        }
    }

    /// Fetch statistics over the configured window.
    pub async fn refresh_stats(&self) -> OperationResult<()> {
        let hours = self.state.read().await.stats_hours;
        match self.client.stats(hours).await {
            Ok(stats) => {
                self.state.write().await.stats = Some(stats);
                OperationResult::ok(())
            }
            Err(e) => {
                self.state.write().await.stats = None;
                self.fail("Statistics", e)
            }
        }
    }

    /// Ask the service to analyze the recent series.
    pub async fn analyze(&self) -> OperationResult<TemperatureAnalysis> {
        let (limit, hours) = {
            let state = self.state.read().await;
            (state.history_limit, state.stats_hours)
        };
        self.notifier.info("Analyzing temperature data...");

        match self.client.analyze(limit, hours).await {
            Ok(analysis) => {
                info!(
                    "Analysis received (ai_powered={})",
                    analysis.ai_powered
                );
                self.state.write().await.analysis = Some(analysis.clone());
                self.notifier.success("Analysis complete");
                OperationResult::ok(analysis)
            }
            Err(e) => self.fail("Analysis", e),
        }
    }

    pub async fn report(&self) -> OperationResult<TemperatureReport> {
        let hours = self.state.read().await.stats_hours;
        match self.client.report(hours).await {
            Ok(report) => {
                self.notifier.success("Report generated");
                OperationResult::ok(report)
            }
            Err(e) => self.fail("Report", e),
        }
    }

    /// Change the chart window and refetch it.
    pub async fn select_range(&self, event: RangeSelected) -> OperationResult<()> {
        {
            let mut state = self.state.write().await;
            state.history_limit = event.limit.clamp(1, MAX_HISTORY_LIMIT);
            state.range_generation += 1;
        }
        self.refresh_live().await
    }

    pub async fn view(&self) -> MonitorView {
        let state = self.state.read().await;
        MonitorView {
            current: current_reading_view(state.current.as_ref(), state.current_error.as_deref()),
            chart: chart_points(&state.history),
            stats: state.stats.as_ref().map(stats_view),
            history_limit: state.history_limit,
            analysis: state.analysis.as_ref().map(|a| a.analysis.clone()),
        }
    }

    fn fail<T>(&self, context: &str, error: SyncError) -> OperationResult<T> {
        warn!("{}: {}", context, error);
        self.notifier.error(format!("{}: {}", context, error));
        OperationResult::failed(error.to_string())
    }
}
