//! Dashboard session.
//!
//! The session ties the sync client to the variable cache. Every read goes
//! through a cache ticket so responses are sequenced per variable, and
//! every failure is reported as a [`Notice`](crate::Notice). Writes are
//! followed by a single debounced verify read.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};

use plcdash_core::address::to_address;
use plcdash_core::config::DashboardSettings;
use plcdash_core::render::{variable_view, VariableView};
use plcdash_core::{
    CacheEntry, Completion, ConnectionStatus, DeviceTarget, OperationResult, SyncError, Value,
    VariableCache, VariableCatalog, VariableDescriptor, VariableKey, VariableKind,
};
use plcdash_protocol::{codec, SnapshotData};

use crate::notify::{Notice, Notifier};
use crate::sync::VariableSyncClient;
use crate::transport::HttpTransport;

/// Outcome counts of a full refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub ok: usize,
    pub failed: usize,
}

struct SessionInner {
    client: VariableSyncClient,
    cache: RwLock<VariableCache>,
    notifier: Notifier,
    verify_delay: Duration,
    /// Latest write generation per variable; a verify read only runs if
    /// no newer write arrived during its delay.
    verify_gen: Mutex<HashMap<VariableKey, u64>>,
}

/// Shared handle to one dashboard session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    pub fn new(client: VariableSyncClient, verify_delay: Duration) -> Self {
        Self::with_notifier(client, verify_delay, Notifier::default())
    }

    pub fn with_notifier(
        client: VariableSyncClient,
        verify_delay: Duration,
        notifier: Notifier,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                client,
                cache: RwLock::new(VariableCache::new()),
                notifier,
                verify_delay,
                verify_gen: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Build an HTTP-backed session from settings.
    pub fn from_settings(settings: &DashboardSettings) -> Result<Self, SyncError> {
        let transport = HttpTransport::new(settings.service_url(), settings.request_timeout())?;
        let client = VariableSyncClient::new(Arc::new(transport), settings.api_style());
        Ok(Self::new(client, settings.write_verify_delay()))
    }

    pub fn client(&self) -> &VariableSyncClient {
        &self.inner.client
    }

    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notifier.subscribe()
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Replace the catalog locally without asking the service.
    pub async fn set_catalog(&self, catalog: &VariableCatalog) {
        self.inner.cache.write().await.load_catalog(catalog);
    }

    /// Fetch the catalog from the service and load it.
    pub async fn load_catalog(&self) -> OperationResult<VariableCatalog> {
        match self.inner.client.list_variables().await {
            Ok(catalog) => {
                info!("Loaded {} variables from service", catalog.len());
                self.set_catalog(&catalog).await;
                OperationResult::ok(catalog)
            }
            Err(e) => self.report_failure("Loading variables", e),
        }
    }

    pub async fn descriptors(&self) -> Vec<VariableDescriptor> {
        self.inner.cache.read().await.descriptors()
    }

    /// Look up a variable by name.
    pub async fn find(&self, name: &str) -> Option<VariableDescriptor> {
        self.inner
            .cache
            .read()
            .await
            .descriptors()
            .into_iter()
            .find(|d| d.name() == name)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Read one variable and apply the response to the cache.
    pub async fn refresh(&self, descriptor: &VariableDescriptor) -> OperationResult<Value> {
        let Some(ticket) = self.inner.cache.write().await.begin(descriptor) else {
            return OperationResult::failed("session closed");
        };

        let result = self
            .inner
            .client
            .try_read(descriptor.kind(), descriptor.address())
            .await;

        let outcome = result.clone().map_err(|e| e.to_string());
        let completion = self
            .inner
            .cache
            .write()
            .await
            .complete(ticket, outcome, Utc::now());
        if completion == Completion::Discarded {
            debug!(
                "Discarded response #{} for {} ({})",
                ticket.seq(),
                descriptor.name(),
                ticket.key()
            );
        }

        match result {
            Ok(value) => OperationResult::ok(value),
            Err(e) => self.report_failure(descriptor.name(), e),
        }
    }

    /// Read every known variable concurrently.
    pub async fn refresh_all(&self) -> RefreshSummary {
        let descriptors = self.descriptors().await;
        let results = join_all(descriptors.iter().map(|d| self.refresh(d))).await;

        let ok = results.iter().filter(|r| r.success).count();
        let summary = RefreshSummary {
            ok,
            failed: results.len() - ok,
        };
        debug!("Refreshed {} variables, {} failed", summary.ok, summary.failed);
        summary
    }

    /// Refresh every known variable from one `GET /read_all` snapshot.
    ///
    /// Entries are matched by kind and address. A variable missing from the
    /// snapshot is marked stale.
    pub async fn refresh_snapshot(&self) -> RefreshSummary {
        let tickets: Vec<_> = {
            let mut cache = self.inner.cache.write().await;
            cache
                .descriptors()
                .into_iter()
                .filter_map(|d| cache.begin(&d).map(|t| (d, t)))
                .collect()
        };

        let snapshot = self.inner.client.read_all().await;
        let outcomes = match &snapshot {
            Ok(data) => {
                let values = snapshot_values(data);
                tickets
                    .into_iter()
                    .map(|(d, t)| {
                        let outcome = values
                            .get(&d.key())
                            .cloned()
                            .unwrap_or_else(|| Err(format!("{} missing from snapshot", d.name())));
                        (t, outcome)
                    })
                    .collect::<Vec<_>>()
            }
            Err(e) => {
                let message = e.to_string();
                tickets
                    .into_iter()
                    .map(|(_, t)| (t, Err(message.clone())))
                    .collect()
            }
        };

        let mut summary = RefreshSummary::default();
        {
            let now = Utc::now();
            let mut cache = self.inner.cache.write().await;
            for (ticket, outcome) in outcomes {
                if outcome.is_ok() {
                    summary.ok += 1;
                } else {
                    summary.failed += 1;
                }
                cache.complete(ticket, outcome, now);
            }
        }

        if let Err(e) = snapshot {
            let _: OperationResult<()> = self.report_failure("Snapshot", e);
        }
        summary
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Validate and write `raw`, then schedule the verify read.
    pub async fn write(&self, descriptor: &VariableDescriptor, raw: &str) -> OperationResult<()> {
        match self
            .inner
            .client
            .try_write(descriptor.kind(), descriptor.address(), raw)
            .await
        {
            Ok(value) => {
                self.inner
                    .notifier
                    .success(format!("{} set to {}", descriptor.name(), value));
                self.schedule_verify(descriptor.clone()).await;
                OperationResult::ok(())
            }
            Err(e) => self.report_failure(descriptor.name(), e),
        }
    }

    /// Flip a BOOL variable. An unknown state counts as OFF.
    pub async fn toggle(&self, descriptor: &VariableDescriptor) -> OperationResult<()> {
        if descriptor.kind() != VariableKind::Bool {
            return self.report_failure(
                descriptor.name(),
                SyncError::InvalidInput(format!("{} is not a BOOL variable", descriptor.name())),
            );
        }

        let current = self
            .inner
            .cache
            .read()
            .await
            .get(&descriptor.key())
            .and_then(|v| v.fresh_value())
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        self.write(descriptor, if current { "0" } else { "1" }).await
    }

    async fn schedule_verify(&self, descriptor: VariableDescriptor) {
        let key = descriptor.key();
        let generation = {
            let mut gens = self.inner.verify_gen.lock().await;
            let g = gens.entry(key).or_insert(0);
            *g += 1;
            *g
        };

        let session = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(session.inner.verify_delay).await;

            let latest = session.inner.verify_gen.lock().await.get(&key).copied();
            if latest != Some(generation) {
                debug!("Verify read for {} superseded", descriptor.name());
                return;
            }
            if session.is_closed().await {
                return;
            }
            session.refresh(&descriptor).await;
        });
    }

    // ========================================================================
    // Device
    // ========================================================================

    /// Retarget the service and reload the catalog.
    pub async fn configure_device(&self, target: &DeviceTarget) -> OperationResult<DeviceTarget> {
        match self.inner.client.configure_device(target).await {
            Ok(applied) => {
                self.inner
                    .notifier
                    .success(format!("Device set to {}:{}", applied.ip, applied.port));
                let _ = self.load_catalog().await;
                OperationResult::ok(applied)
            }
            Err(e) => self.report_failure("Device configuration", e),
        }
    }

    pub async fn status(&self) -> OperationResult<ConnectionStatus> {
        match self.inner.client.status().await {
            Ok(status) => OperationResult::ok(status),
            Err(e) => self.report_failure("Status", e),
        }
    }

    // ========================================================================
    // View
    // ========================================================================

    pub async fn entry(&self, key: &VariableKey) -> Option<CacheEntry> {
        self.inner.cache.read().await.entry(key).cloned()
    }

    /// Display projection of every cached variable.
    pub async fn views(&self) -> Vec<VariableView> {
        self.inner
            .cache
            .read()
            .await
            .entries()
            .map(variable_view)
            .collect()
    }

    /// Stop applying responses. Reads still in flight are dropped on
    /// arrival.
    pub async fn teardown(&self) {
        self.inner.cache.write().await.close();
        info!("Session closed");
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.cache.read().await.is_closed()
    }

    fn report_failure<T>(&self, context: &str, error: SyncError) -> OperationResult<T> {
        warn!("{}: {}", context, error);
        self.inner
            .notifier
            .error(format!("{}: {}", context, error));
        OperationResult::failed(error.to_string())
    }
}

/// Decode a snapshot into per-variable outcomes keyed by protocol address.
fn snapshot_values(data: &SnapshotData) -> BTreeMap<VariableKey, Result<Value, String>> {
    data.iter()
        .map(|(kind, name, entry)| {
            let key = VariableKey::new(kind, to_address(kind, entry.address));
            let outcome = match (&entry.error, &entry.value) {
                (Some(error), _) => Err(error.clone()),
                (None, Some(raw)) => codec::decode_value(kind, raw).map_err(|e| e.to_string()),
                (None, None) => Err(format!("{} has no value", name)),
            };
            (key, outcome)
        })
        .collect()
}
