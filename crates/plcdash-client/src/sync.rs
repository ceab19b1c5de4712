//! Variable sync client.
//!
//! One client covers both URL conventions of the service. Every public
//! operation returns an [`OperationResult`]; the `try_*` variants return
//! the underlying [`SyncError`] for callers that want to keep going with
//! `?`.

use std::sync::Arc;

use tracing::{debug, info, warn};

use plcdash_core::address::validate_address;
use plcdash_core::config::ApiStyle;
use plcdash_core::input::parse_input;
use plcdash_core::{
    ConnectionStatus, DeviceTarget, OperationResult, SyncError, Value, VariableCatalog,
    VariableKind,
};
use plcdash_protocol::{
    codec, endpoint, ConfigReply, ReadAllReply, SnapshotData, VariablesListing,
};

use crate::transport::Transport;

/// Reads and writes variables on the remote service.
#[derive(Clone)]
pub struct VariableSyncClient {
    transport: Arc<dyn Transport>,
    style: ApiStyle,
}

impl VariableSyncClient {
    pub fn new(transport: Arc<dyn Transport>, style: ApiStyle) -> Self {
        Self { transport, style }
    }

    pub fn style(&self) -> ApiStyle {
        self.style
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    /// Read the variable of `kind` at protocol-facing `address`.
    pub async fn read(&self, kind: VariableKind, address: u32) -> OperationResult<Value> {
        self.try_read(kind, address).await.into()
    }

    /// Validate `raw` and write it to the variable at `address`.
    ///
    /// Invalid input fails before any request is sent. This does not
    /// schedule the verify read; [`crate::Session::write`] does.
    pub async fn write(&self, kind: VariableKind, address: u32, raw: &str) -> OperationResult<()> {
        self.try_write(kind, address, raw).await.map(|_| ()).into()
    }

    pub async fn try_read(&self, kind: VariableKind, address: u32) -> Result<Value, SyncError> {
        let index = validate_address(kind, address)?;
        let request = endpoint::read(self.style, kind, index);
        let reply = self.transport.send(&request).await?;
        let value = codec::decode_read(kind, &reply).map_err(|e| {
            warn!("{} {} @{}: {}", request, kind, address, e);
            SyncError::from(e)
        })?;
        debug!("read {} @{} = {}", kind, address, value);
        Ok(value)
    }

    pub async fn try_write(
        &self,
        kind: VariableKind,
        address: u32,
        raw: &str,
    ) -> Result<Value, SyncError> {
        let value = parse_input(kind, raw)?;
        self.try_write_value(kind, address, value).await?;
        Ok(value)
    }

    /// Write an already-typed value.
    pub async fn try_write_value(
        &self,
        kind: VariableKind,
        address: u32,
        value: Value,
    ) -> Result<(), SyncError> {
        if value.kind() != kind {
            return Err(SyncError::InvalidInput(format!(
                "{} value cannot be written to a {} variable",
                value.kind(),
                kind
            )));
        }
        let index = validate_address(kind, address)?;
        let request = endpoint::write(self.style, kind, index, &value);
        let reply = self.transport.send(&request).await?;
        codec::decode_ack(&reply)?;
        info!("wrote {} @{} = {}", kind, address, value);
        Ok(())
    }

    /// Fetch the service's variable catalog (`GET /variables`).
    pub async fn list_variables(&self) -> Result<VariableCatalog, SyncError> {
        let reply = self.transport.send(&endpoint::variables()).await?;
        let listing: VariablesListing = codec::decode(reply)?;
        Ok(listing.into_catalog())
    }

    /// Fetch a bulk snapshot of every variable (`GET /read_all`).
    pub async fn read_all(&self) -> Result<SnapshotData, SyncError> {
        let reply = self.transport.send(&endpoint::read_all()).await?;
        let snapshot: ReadAllReply = codec::decode(reply)?;
        Ok(snapshot.data)
    }

    /// Point the service at a different device (`POST /config`).
    pub async fn configure_device(&self, target: &DeviceTarget) -> Result<DeviceTarget, SyncError> {
        let reply = self.transport.send(&endpoint::configure(target)).await?;
        let ack: ConfigReply = codec::decode(reply)?;
        info!("service now targets {}:{}", ack.ip, ack.port);
        Ok(DeviceTarget {
            ip: ack.ip,
            port: ack.port,
        })
    }

    /// Connection state between the service and its device.
    ///
    /// The status body carries its own `error` field describing the device
    /// link, so it is decoded as-is rather than through the error check.
    pub async fn status(&self) -> Result<ConnectionStatus, SyncError> {
        let reply = self.transport.send(&endpoint::status()).await?;
        serde_json::from_value(reply).map_err(|e| SyncError::Service(e.to_string()))
    }
}
