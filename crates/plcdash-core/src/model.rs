//! plcdash data model types.
//!
//! These types represent the variables a dashboard reads and writes:
//! - Variable kinds and descriptors (name + protocol-facing address)
//! - Typed values decoded from the remote service
//! - Per-variable cached state with staleness tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The type of a PLC variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    /// Single-bit coil.
    Bool,
    /// Signed 16-bit holding register.
    Int,
    /// IEEE-754 float spread over two holding registers.
    Real,
}

impl VariableKind {
    /// All kinds, in catalog order.
    pub const ALL: [VariableKind; 3] = [VariableKind::Bool, VariableKind::Int, VariableKind::Real];

    /// Lowercase name used in URLs and JSON keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKind::Bool => "bool",
            VariableKind::Int => "int",
            VariableKind::Real => "real",
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VariableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bool" | "coil" => Ok(VariableKind::Bool),
            "int" => Ok(VariableKind::Int),
            "real" | "float" => Ok(VariableKind::Real),
            other => Err(format!("unknown variable kind: {}", other)),
        }
    }
}

/// Identifies a variable by kind and protocol-facing address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariableKey {
    pub kind: VariableKind,
    pub address: u32,
}

impl VariableKey {
    pub fn new(kind: VariableKind, address: u32) -> Self {
        Self { kind, address }
    }
}

impl fmt::Display for VariableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @{}", self.kind.as_str().to_uppercase(), self.address)
    }
}

/// A configured variable.
///
/// Addresses are protocol-facing: coils are numbered from 1 and holding
/// registers from 40001. Descriptors are immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDescriptor {
    name: String,
    kind: VariableKind,
    address: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl VariableDescriptor {
    /// Create a descriptor without a description.
    pub fn new(name: impl Into<String>, kind: VariableKind, address: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            address,
            description: None,
        }
    }

    /// Attach a human-readable description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn key(&self) -> VariableKey {
        VariableKey::new(self.kind, self.address)
    }
}

/// A decoded variable value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i16),
    Real(f64),
}

impl Value {
    /// The kind this value belongs to.
    pub fn kind(&self) -> VariableKind {
        match self {
            Value::Bool(_) => VariableKind::Bool,
            Value::Int(_) => VariableKind::Int,
            Value::Real(_) => VariableKind::Real,
        }
    }

    /// JSON representation sent to the remote service.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Real(r) => serde_json::Value::from(*r),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(true) => f.write_str("ON"),
            Value::Bool(false) => f.write_str("OFF"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{:.2}", r),
        }
    }
}

/// Last known state of a variable, as held by the client cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableValue {
    descriptor: VariableDescriptor,
    /// Last successfully read or written value.
    pub value: Option<Value>,
    /// When `value` was last confirmed.
    pub last_updated: Option<DateTime<Utc>>,
    /// Set when the most recent applied response was a failure.
    pub stale: bool,
    /// Error message of the last failure, if stale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VariableValue {
    /// A variable that has never been read.
    pub fn new(descriptor: VariableDescriptor) -> Self {
        Self {
            descriptor,
            value: None,
            last_updated: None,
            stale: false,
            error: None,
        }
    }

    pub fn descriptor(&self) -> &VariableDescriptor {
        &self.descriptor
    }

    /// Record a successful response.
    pub fn mark_fresh(&mut self, value: Value, at: DateTime<Utc>) {
        self.value = Some(value);
        self.last_updated = Some(at);
        self.stale = false;
        self.error = None;
    }

    /// Record a failed response.
    pub fn mark_stale(&mut self, error: impl Into<String>) {
        self.stale = true;
        self.error = Some(error.into());
    }

    /// The value, but only when it can be shown as current.
    pub fn fresh_value(&self) -> Option<Value> {
        if self.stale {
            None
        } else {
            self.value
        }
    }
}

/// Descriptor lists grouped by kind, as served by `GET /variables`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableCatalog {
    #[serde(default)]
    pub bool: Vec<VariableDescriptor>,
    #[serde(default)]
    pub int: Vec<VariableDescriptor>,
    #[serde(default)]
    pub real: Vec<VariableDescriptor>,
}

impl VariableCatalog {
    /// The catalog of the reference machine: start/stop/fault coils,
    /// machine state and process temperature.
    pub fn reference() -> Self {
        Self {
            bool: vec![
                VariableDescriptor::new("PC_Start", VariableKind::Bool, 1)
                    .with_description("Start command (Coil 1)"),
                VariableDescriptor::new("PC_Stop", VariableKind::Bool, 2)
                    .with_description("Stop command (Coil 2)"),
                VariableDescriptor::new("PC_Falha", VariableKind::Bool, 3)
                    .with_description("Fault indication (Coil 3)"),
            ],
            int: vec![VariableDescriptor::new("PC_Estado", VariableKind::Int, 40001)
                .with_description("Machine state (HR 40001)")],
            real: vec![VariableDescriptor::new("PC_Temp", VariableKind::Real, 40002)
                .with_description("Temperature °C (HR 40002-40003)")],
        }
    }

    /// Insert a descriptor under its kind.
    pub fn push(&mut self, descriptor: VariableDescriptor) {
        match descriptor.kind() {
            VariableKind::Bool => self.bool.push(descriptor),
            VariableKind::Int => self.int.push(descriptor),
            VariableKind::Real => self.real.push(descriptor),
        }
    }

    /// Iterate over all descriptors, bools first.
    pub fn iter(&self) -> impl Iterator<Item = &VariableDescriptor> {
        self.bool.iter().chain(self.int.iter()).chain(self.real.iter())
    }

    pub fn len(&self) -> usize {
        self.bool.len() + self.int.len() + self.real.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find a descriptor by name.
    pub fn find(&self, name: &str) -> Option<&VariableDescriptor> {
        self.iter().find(|d| d.name() == name)
    }
}

/// Network target the remote service talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTarget {
    pub ip: String,
    pub port: u16,
}

/// Connection state reported by `GET /status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    #[serde(default)]
    pub last_check: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}
