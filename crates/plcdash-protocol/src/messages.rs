//! Message types for the remote variable service.
//!
//! Request bodies are sent by the client; reply types describe the success
//! payloads. Every reply may additionally carry `error` or `success: false`,
//! which the codec checks before these types are decoded.

use plcdash_core::address;
use plcdash_core::{VariableCatalog, VariableDescriptor, VariableKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Variable Requests
// ============================================================================

/// Body of `POST /{kind}/read`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadRequest {
    /// Zero-based index.
    pub address: u16,
}

/// Body of `POST /{kind}/write`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteRequest {
    /// Zero-based index.
    pub address: u16,
    pub value: serde_json::Value,
}

/// Body of `POST /write/{kind}/{index}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteValue {
    pub value: serde_json::Value,
}

/// Success payload of a read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<u32>,
    pub value: serde_json::Value,
}

/// Success payload of a write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error payload, used with a 4xx/5xx status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub error: String,
}

impl ErrorReply {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// ============================================================================
// Catalog & Snapshot
// ============================================================================

/// A variable as listed by `GET /variables`, with a zero-based address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireVariable {
    pub name: String,
    pub address: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `GET /variables` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariablesListing {
    #[serde(default)]
    pub bool: Vec<WireVariable>,
    #[serde(default)]
    pub int: Vec<WireVariable>,
    #[serde(default)]
    pub real: Vec<WireVariable>,
}

impl VariablesListing {
    /// Translate into a catalog with protocol-facing addresses.
    pub fn into_catalog(self) -> VariableCatalog {
        let mut catalog = VariableCatalog::default();
        for (kind, vars) in [
            (VariableKind::Bool, self.bool),
            (VariableKind::Int, self.int),
            (VariableKind::Real, self.real),
        ] {
            for var in vars {
                let mut descriptor =
                    VariableDescriptor::new(var.name, kind, address::to_address(kind, var.address));
                if let Some(description) = var.description {
                    descriptor = descriptor.with_description(description);
                }
                catalog.push(descriptor);
            }
        }
        catalog
    }

    /// Build the wire listing from a catalog.
    pub fn from_catalog(catalog: &VariableCatalog) -> Self {
        let wire = |d: &VariableDescriptor| WireVariable {
            name: d.name().to_string(),
            address: address::to_index(d.kind(), d.address()).max(0) as u32,
            description: d.description().map(String::from),
        };
        Self {
            bool: catalog.bool.iter().map(wire).collect(),
            int: catalog.int.iter().map(wire).collect(),
            real: catalog.real.iter().map(wire).collect(),
        }
    }
}

/// One variable inside a `GET /read_all` snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Zero-based index.
    pub address: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `GET /read_all` payload: kind → variable name → entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotData {
    #[serde(default)]
    pub bool: BTreeMap<String, SnapshotEntry>,
    #[serde(default)]
    pub int: BTreeMap<String, SnapshotEntry>,
    #[serde(default)]
    pub real: BTreeMap<String, SnapshotEntry>,
}

impl SnapshotData {
    /// Iterate `(kind, name, entry)` over all kinds.
    pub fn iter(&self) -> impl Iterator<Item = (VariableKind, &str, &SnapshotEntry)> {
        tagged(VariableKind::Bool, &self.bool)
            .chain(tagged(VariableKind::Int, &self.int))
            .chain(tagged(VariableKind::Real, &self.real))
    }

    pub fn insert(&mut self, kind: VariableKind, name: impl Into<String>, entry: SnapshotEntry) {
        let map = match kind {
            VariableKind::Bool => &mut self.bool,
            VariableKind::Int => &mut self.int,
            VariableKind::Real => &mut self.real,
        };
        map.insert(name.into(), entry);
    }
}

fn tagged(
    kind: VariableKind,
    map: &BTreeMap<String, SnapshotEntry>,
) -> impl Iterator<Item = (VariableKind, &str, &SnapshotEntry)> {
    map.iter()
        .map(move |(name, entry)| (kind, name.as_str(), entry))
}

/// Envelope of `GET /read_all`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadAllReply {
    #[serde(default)]
    pub success: bool,
    pub data: SnapshotData,
}

// ============================================================================
// Device Configuration
// ============================================================================

/// Body of `POST /config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigRequest {
    pub ip: String,
    pub port: u16,
}

/// Reply of `POST /config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigReply {
    pub success: bool,
    pub ip: String,
    pub port: u16,
}

// ============================================================================
// Temperature
// ============================================================================

/// Body of `POST /temperature/analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default = "default_analyze_limit")]
    pub limit: usize,
    #[serde(default = "default_hours")]
    pub hours: u32,
}

impl Default for AnalyzeRequest {
    fn default() -> Self {
        Self {
            limit: default_analyze_limit(),
            hours: default_hours(),
        }
    }
}

fn default_analyze_limit() -> usize {
    200
}

fn default_hours() -> u32 {
    24
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_to_catalog() {
        let json = r#"{
            "bool": [{"name": "PC_Start", "address": 0, "description": "Start (Coil 1)"}],
            "int": [{"name": "PC_Estado", "address": 0}],
            "real": [{"name": "PC_Temp", "address": 1}]
        }"#;
        let listing: VariablesListing = serde_json::from_str(json).unwrap();
        let catalog = listing.into_catalog();

        assert_eq!(catalog.find("PC_Start").unwrap().address(), 1);
        assert_eq!(catalog.find("PC_Estado").unwrap().address(), 40001);
        assert_eq!(catalog.find("PC_Temp").unwrap().address(), 40002);
        assert_eq!(
            catalog.find("PC_Start").unwrap().description(),
            Some("Start (Coil 1)")
        );
    }

    #[test]
    fn test_listing_from_reference_catalog() {
        let listing = VariablesListing::from_catalog(&VariableCatalog::reference());
        assert_eq!(listing.bool.len(), 3);
        assert_eq!(listing.bool[2].address, 2);
        assert_eq!(listing.real[0].address, 1);
        assert_eq!(listing.into_catalog(), VariableCatalog::reference());
    }

    #[test]
    fn test_snapshot_iter() {
        let json = r#"{
            "success": true,
            "data": {
                "bool": {"PC_Start": {"address": 0, "value": true}},
                "int": {"PC_Estado": {"address": 0, "error": "timeout"}},
                "real": {}
            }
        }"#;
        let reply: ReadAllReply = serde_json::from_str(json).unwrap();
        let items: Vec<_> = reply.data.iter().collect();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].0, VariableKind::Bool);
        assert_eq!(items[0].1, "PC_Start");
        assert_eq!(items[1].2.error.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_analyze_defaults() {
        let req: AnalyzeRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req, AnalyzeRequest::default());
        assert_eq!(req.limit, 200);
    }
}
