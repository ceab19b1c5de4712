//! Client for the `/temperature/*` endpoints.

use std::sync::Arc;

use tracing::debug;

use plcdash_core::{
    SyncError, TemperatureAnalysis, TemperatureHistory, TemperatureReport, TemperatureSample,
    TemperatureStats,
};
use plcdash_protocol::{codec, endpoint, HttpRequest};
use serde::de::DeserializeOwned;

use crate::transport::Transport;

/// Largest history window the service will return.
pub const MAX_HISTORY_LIMIT: usize = 1000;

#[derive(Clone)]
pub struct TemperatureClient {
    transport: Arc<dyn Transport>,
}

impl TemperatureClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, SyncError> {
        let reply = self.transport.send(&request).await?;
        let decoded = codec::decode(reply)?;
        debug!("{} ok", request);
        Ok(decoded)
    }

    /// Most recent sample.
    pub async fn current(&self) -> Result<TemperatureSample, SyncError> {
        self.fetch(endpoint::temperature_current()).await
    }

    /// The newest `limit` samples, oldest first. `limit` is clamped to
    /// 1..=1000.
    pub async fn history(&self, limit: usize) -> Result<Vec<TemperatureSample>, SyncError> {
        let limit = limit.clamp(1, MAX_HISTORY_LIMIT);
        let history: TemperatureHistory = self.fetch(endpoint::temperature_history(limit)).await?;
        Ok(history.data)
    }

    pub async fn stats(&self, hours: u32) -> Result<TemperatureStats, SyncError> {
        self.fetch(endpoint::temperature_stats(hours)).await
    }

    pub async fn analyze(&self, limit: usize, hours: u32) -> Result<TemperatureAnalysis, SyncError> {
        self.fetch(endpoint::temperature_analyze(limit, hours)).await
    }

    pub async fn report(&self, hours: u32) -> Result<TemperatureReport, SyncError> {
        self.fetch(endpoint::temperature_report(hours)).await
    }
}
