//! Views bound to their refresh schedules.
//!
//! A panel polls only while it is visible. Hiding it stops the pollers;
//! tearing it down also stops applying responses that are still in flight.

use async_trait::async_trait;
use tracing::debug;

use plcdash_core::config::{ApiStyle, DashboardSettings};

use crate::monitor::TemperatureMonitor;
use crate::poller::Poller;
use crate::session::Session;

#[async_trait]
pub trait Panel: Send {
    fn start_polling(&mut self);

    fn stop_polling(&mut self);

    fn is_polling(&self) -> bool;

    fn set_visible(&mut self, visible: bool) {
        if visible {
            self.start_polling();
        } else {
            self.stop_polling();
        }
    }

    async fn teardown(&mut self);
}

/// Variable control view.
pub struct ControlPanel {
    session: Session,
    poller: Poller,
}

impl ControlPanel {
    pub fn new(session: Session, settings: &DashboardSettings) -> Self {
        Self {
            session,
            poller: Poller::new("variables", settings.variable_poll()),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

#[async_trait]
impl Panel for ControlPanel {
    /// Refresh every variable each period. The REST convention has a bulk
    /// endpoint, so it is used instead of one read per variable.
    fn start_polling(&mut self) {
        let session = self.session.clone();
        self.poller.start(move || {
            let session = session.clone();
            async move {
                let summary = match session.client().style() {
                    ApiStyle::Rpc => session.refresh_all().await,
                    ApiStyle::Rest => session.refresh_snapshot().await,
                };
                debug!("variables: {} ok, {} failed", summary.ok, summary.failed);
            }
        });
    }

    fn stop_polling(&mut self) {
        self.poller.stop();
    }

    fn is_polling(&self) -> bool {
        self.poller.is_running()
    }

    async fn teardown(&mut self) {
        self.poller.stop();
        self.session.teardown().await;
    }
}

/// Temperature monitoring view: live reading plus statistics.
pub struct MonitoringPanel {
    monitor: TemperatureMonitor,
    live: Poller,
    stats: Poller,
}

impl MonitoringPanel {
    pub fn new(monitor: TemperatureMonitor, settings: &DashboardSettings) -> Self {
        Self {
            monitor,
            live: Poller::new("temperature", settings.temperature_poll()),
            stats: Poller::new("statistics", settings.stats_poll()),
        }
    }

    pub fn monitor(&self) -> &TemperatureMonitor {
        &self.monitor
    }
}

#[async_trait]
impl Panel for MonitoringPanel {
    fn start_polling(&mut self) {
        let monitor = self.monitor.clone();
        self.live.start(move || {
            let monitor = monitor.clone();
            async move {
                monitor.refresh_live().await;
            }
        });

        let monitor = self.monitor.clone();
        self.stats.start(move || {
            let monitor = monitor.clone();
            async move {
                monitor.refresh_stats().await;
            }
        });
    }

    fn stop_polling(&mut self) {
        self.live.stop();
        self.stats.stop();
    }

    fn is_polling(&self) -> bool {
        self.live.is_running() || self.stats.is_running()
    }

    async fn teardown(&mut self) {
        self.stop_polling();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Notifier;
    use crate::sync::VariableSyncClient;
    use crate::temperature::TemperatureClient;
    use crate::testing::FakeTransport;
    use plcdash_core::VariableCatalog;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_control_panel_polls_while_visible() {
        let fake = FakeTransport::always(json!({"value": 1}));
        let settings = DashboardSettings::default();
        let session = Session::new(
            VariableSyncClient::new(fake.clone(), ApiStyle::Rpc),
            settings.write_verify_delay(),
        );
        session
            .set_catalog(&VariableCatalog {
                int: vec![plcdash_core::VariableDescriptor::new(
                    "PC_Estado",
                    plcdash_core::VariableKind::Int,
                    40001,
                )],
                ..VariableCatalog::default()
            })
            .await;
        let mut panel = ControlPanel::new(session, &settings);

        panel.set_visible(true);
        panel.set_visible(true);
        assert!(panel.is_polling());

        // ticks at 0s, 5s, 10s
        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(fake.call_count(), 3);

        panel.set_visible(false);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fake.call_count(), 3);
        assert!(!panel.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_control_panel_uses_snapshot_for_rest() {
        let fake = FakeTransport::always(json!({"success": true, "data": {}}));
        let settings = DashboardSettings::default();
        let session = Session::new(
            VariableSyncClient::new(fake.clone(), ApiStyle::Rest),
            settings.write_verify_delay(),
        );
        session.set_catalog(&VariableCatalog::reference()).await;
        let mut panel = ControlPanel::new(session, &settings);

        panel.start_polling();
        tokio::time::sleep(Duration::from_millis(10)).await;
        panel.teardown().await;

        assert_eq!(fake.call_count(), 1);
        assert_eq!(fake.requests()[0].path, "/read_all");
        assert!(panel.session().is_closed().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitoring_panel_periods() {
        let fake = FakeTransport::new(|_, req| {
            let reply = if req.path.starts_with("/temperature/stats") {
                json!({"count": 0, "min": 0.0, "max": 0.0, "avg": 0.0, "stdev": 0.0, "anomalies": 0})
            } else if req.path.starts_with("/temperature/history") {
                json!({"data": [], "count": 0})
            } else {
                json!({"timestamp": "2024-05-02 14:03:10", "temperature": 70.0})
            };
            (Duration::ZERO, Ok(reply))
        });
        let settings = DashboardSettings::default();
        let monitor = TemperatureMonitor::new(
            TemperatureClient::new(fake.clone()),
            Notifier::default(),
            settings.history_limit(),
            settings.stats_hours(),
        );
        let mut panel = MonitoringPanel::new(monitor, &settings);

        panel.set_visible(true);
        tokio::time::sleep(Duration::from_millis(60_500)).await;
        panel.teardown().await;

        let stats_calls = fake
            .requests()
            .iter()
            .filter(|r| r.path.starts_with("/temperature/stats"))
            .count();
        let current_calls = fake
            .requests()
            .iter()
            .filter(|r| r.path == "/temperature/current")
            .count();
        // stats at 0s and 60s; live every 5s from 0s to 60s
        assert_eq!(stats_calls, 2);
        assert_eq!(current_calls, 13);
    }
}
