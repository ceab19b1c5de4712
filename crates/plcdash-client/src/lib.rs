//! # plcdash-client
//!
//! Async client side of plcdash.
//!
//! This crate provides:
//! - [`Transport`]: the HTTP seam (reqwest in production, fakes in tests)
//! - [`VariableSyncClient`]: typed reads/writes with uniform results
//! - [`Session`]: the variable cache, write-then-verify and notifications
//! - [`Poller`]: a single recurring schedule with start/stop
//! - [`TemperatureMonitor`]: the temperature monitoring view state
//! - [`ControlPanel`] / [`MonitoringPanel`]: pollers bound to view visibility
//! - [`Watchdog`]: the heartbeat counter written back to the PLC

pub mod monitor;
pub mod notify;
pub mod panel;
pub mod poller;
pub mod session;
pub mod sync;
pub mod temperature;
pub mod transport;
pub mod watchdog;

#[cfg(test)]
pub(crate) mod testing;

pub use monitor::{MonitorView, TemperatureMonitor};
pub use notify::{Notice, NoticeLevel, Notifier};
pub use panel::{ControlPanel, MonitoringPanel, Panel};
pub use poller::Poller;
pub use session::{RefreshSummary, Session};
pub use sync::VariableSyncClient;
pub use temperature::TemperatureClient;
pub use transport::{HttpTransport, Transport};
pub use watchdog::Watchdog;

pub use plcdash_core::{OperationResult, SyncError};
