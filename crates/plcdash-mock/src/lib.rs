//! # plcdash-mock
//!
//! In-memory stand-in for the remote variable service.
//!
//! This crate provides:
//! - Both URL conventions for variable reads and writes
//! - `/variables`, `/read_all`, `/config` and `/status`
//! - The `/temperature/*` endpoints backed by a sample collector
//! - An optional simulation that drifts the temperature register
//!
//! ## Usage
//!
//! ```rust,ignore
//! use plcdash_mock::{create_router, MockService};
//!
//! let state = MockService::new(MockConfig::default()).into_state();
//! let app = create_router(state);
//!
//! let listener = TcpListener::bind("127.0.0.1:5000").await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod analysis;
pub mod collector;
pub mod error;
pub mod registers;
pub mod routes;
pub mod server;
pub mod simulation;

// Re-exports
pub use error::{MockError, MockResult};
pub use routes::create_router;
pub use server::{serve, spawn};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use plcdash_core::{DeviceTarget, VariableCatalog};

use crate::collector::TemperatureCollector;
use crate::registers::RegisterBank;

/// Mock service settings.
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub catalog: VariableCatalog,
    pub device: DeviceTarget,
    /// Collector sampling period; also the divisor of the rate of change.
    pub sample_interval: Duration,
    /// Protocol address of the REAL register the collector samples.
    pub temperature_address: u32,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            catalog: VariableCatalog::reference(),
            device: DeviceTarget {
                ip: "192.168.0.200".to_string(),
                port: 502,
            },
            sample_interval: Duration::from_secs(5),
            temperature_address: 40002,
        }
    }
}

/// Shared mock state.
pub struct MockService {
    pub registers: RwLock<RegisterBank>,
    pub collector: RwLock<TemperatureCollector>,
    pub catalog: RwLock<VariableCatalog>,
    pub device: RwLock<DeviceTarget>,
    /// When false every device access fails as if the PLC were unreachable.
    pub connected: RwLock<bool>,
    pub temperature_address: u32,
}

impl MockService {
    pub fn new(config: MockConfig) -> Self {
        Self {
            registers: RwLock::new(RegisterBank::default()),
            collector: RwLock::new(TemperatureCollector::new(config.sample_interval)),
            catalog: RwLock::new(config.catalog),
            device: RwLock::new(config.device),
            connected: RwLock::new(true),
            temperature_address: config.temperature_address,
        }
    }

    pub fn into_state(self) -> AppState {
        Arc::new(self)
    }

    /// Fail with [`MockError::Disconnected`] while the link is down.
    pub async fn ensure_connected(&self) -> MockResult<()> {
        if *self.connected.read().await {
            Ok(())
        } else {
            Err(MockError::Disconnected)
        }
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new(MockConfig::default())
    }
}

/// Type alias for shared state in Axum handlers.
pub type AppState = Arc<MockService>;
