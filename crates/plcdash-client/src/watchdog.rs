//! Heartbeat counter kept alive for the PLC.
//!
//! Every period the watchdog reads an INT register, increments it and
//! writes it back. The PLC program treats a counter that stops moving as
//! a lost supervisor. Failed beats are logged and the next tick tries
//! again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use plcdash_core::{SyncError, Value, VariableKind};

use crate::poller::Poller;
use crate::sync::VariableSyncClient;

/// Holding register of the heartbeat counter.
pub const WATCHDOG_ADDRESS: u32 = 40004;
pub const WATCHDOG_PERIOD: Duration = Duration::from_millis(500);
/// The counter restarts at 0 once it would pass this value.
pub const WATCHDOG_WRAP: i16 = 30_000;

/// Value written after reading `current`.
pub fn next_heartbeat(current: i16) -> i16 {
    if current >= WATCHDOG_WRAP {
        0
    } else {
        current + 1
    }
}

#[derive(Debug, Default)]
struct Counters {
    beats: AtomicU64,
    failures: AtomicU64,
}

/// Periodic heartbeat writer.
pub struct Watchdog {
    client: VariableSyncClient,
    address: u32,
    poller: Poller,
    counters: Arc<Counters>,
}

impl Watchdog {
    pub fn new(client: VariableSyncClient, address: u32, period: Duration) -> Self {
        Self {
            client,
            address,
            poller: Poller::new("watchdog", period),
            counters: Arc::default(),
        }
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    /// One read-increment-write cycle. Returns the value written.
    pub async fn beat(&self) -> Result<i16, SyncError> {
        heartbeat(&self.client, self.address).await
    }

    pub fn start(&mut self) {
        let client = self.client.clone();
        let address = self.address;
        let counters = self.counters.clone();
        self.poller.start(move || {
            let client = client.clone();
            let counters = counters.clone();
            async move {
                match heartbeat(&client, address).await {
                    Ok(value) => {
                        counters.beats.fetch_add(1, Ordering::Relaxed);
                        debug!("heartbeat {}", value);
                    }
                    Err(e) => {
                        counters.failures.fetch_add(1, Ordering::Relaxed);
                        warn!("Watchdog @{}: {}", address, e);
                    }
                }
            }
        });
    }

    pub fn stop(&mut self) {
        self.poller.stop();
    }

    pub fn is_running(&self) -> bool {
        self.poller.is_running()
    }

    /// Successful beats since creation.
    pub fn beats(&self) -> u64 {
        self.counters.beats.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.counters.failures.load(Ordering::Relaxed)
    }
}

async fn heartbeat(client: &VariableSyncClient, address: u32) -> Result<i16, SyncError> {
    let current = match client.try_read(VariableKind::Int, address).await? {
        Value::Int(i) => i,
        other => {
            return Err(SyncError::Service(format!(
                "expected an INT heartbeat, got {}",
                other
            )))
        }
    };
    let next = next_heartbeat(current);
    client
        .try_write_value(VariableKind::Int, address, Value::Int(next))
        .await?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTransport;
    use plcdash_core::config::ApiStyle;
    use serde_json::json;
    use std::sync::Mutex;

    /// Transport holding one INT register, failing calls listed in `down`.
    fn register(start: i64, down: &'static [usize]) -> (Arc<FakeTransport>, Arc<Mutex<i64>>) {
        let value = Arc::new(Mutex::new(start));
        let stored = value.clone();
        let fake = FakeTransport::new(move |n, req| {
            if down.contains(&n) {
                return (Duration::ZERO, Ok(json!({"error": "Failed to connect to the PLC"})));
            }
            let mut stored = stored.lock().unwrap();
            if req.path.ends_with("/write") {
                let body = req.body.as_ref().unwrap();
                assert_eq!(body["address"], json!(3));
                *stored = body["value"].as_i64().unwrap();
                (Duration::ZERO, Ok(json!({"success": true})))
            } else {
                (Duration::ZERO, Ok(json!({"success": true, "value": *stored})))
            }
        });
        (fake, value)
    }

    fn watchdog(fake: &Arc<FakeTransport>) -> Watchdog {
        Watchdog::new(
            VariableSyncClient::new(fake.clone(), ApiStyle::Rpc),
            WATCHDOG_ADDRESS,
            WATCHDOG_PERIOD,
        )
    }

    #[test]
    fn test_next_heartbeat_wraps() {
        assert_eq!(next_heartbeat(0), 1);
        assert_eq!(next_heartbeat(29_999), 30_000);
        assert_eq!(next_heartbeat(30_000), 0);
        assert_eq!(next_heartbeat(i16::MAX), 0);
        assert_eq!(next_heartbeat(-5), -4);
    }

    #[tokio::test]
    async fn test_beat_reads_then_writes() {
        let (fake, value) = register(41, &[]);
        let dog = watchdog(&fake);

        assert_eq!(dog.beat().await.unwrap(), 42);
        assert_eq!(*value.lock().unwrap(), 42);

        let paths: Vec<_> = fake.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["/int/read", "/int/write"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_every_period_and_wraps() {
        let (fake, value) = register(29_998, &[]);
        let mut dog = watchdog(&fake);
        dog.start();

        // beats at 0, 0.5, 1.0 and 1.5 s
        tokio::time::sleep(Duration::from_millis(1_700)).await;
        dog.stop();

        assert_eq!(dog.beats(), 4);
        // 29_999, 30_000, 0, 1
        assert_eq!(*value.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keeps_going_after_failures() {
        // the first read and the second beat's write fail
        let (fake, value) = register(7, &[0, 2]);
        let mut dog = watchdog(&fake);
        dog.start();

        tokio::time::sleep(Duration::from_millis(1_200)).await;
        assert!(dog.is_running());
        dog.stop();

        assert_eq!(dog.failures(), 2);
        assert_eq!(dog.beats(), 1);
        assert_eq!(*value.lock().unwrap(), 8);
    }

    #[tokio::test]
    async fn test_invalid_address_fails_without_request() {
        let (fake, _) = register(0, &[]);
        let dog = Watchdog::new(
            VariableSyncClient::new(fake.clone(), ApiStyle::Rpc),
            40_000,
            WATCHDOG_PERIOD,
        );

        assert!(matches!(dog.beat().await, Err(SyncError::InvalidInput(_))));
        assert_eq!(fake.call_count(), 0);
    }
}
