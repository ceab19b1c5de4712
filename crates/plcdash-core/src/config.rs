//! Configuration storage abstraction.
//!
//! This module provides a trait for configuration storage so that the
//! dashboard logic does not care where settings live:
//! - CLI: JSON files under `~/.plcdash/`
//! - Tests: in-memory maps
//!
//! All methods are synchronous; configuration is read once at startup and
//! written only on explicit operator action.

use crate::model::VariableCatalog;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Failure of a [`ConfigStorage`] backend.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no stored value for '{0}'")]
    NotFound(String),
    #[error("cannot read settings: {0}")]
    ReadError(String),
    #[error("cannot write settings: {0}")]
    WriteError(String),
    #[error("stored settings are invalid: {0}")]
    InvalidData(String),
}

/// Abstract configuration storage.
pub trait ConfigStorage: Send + Sync {
    // ========================================================================
    // Dashboard Settings
    // ========================================================================

    /// Load dashboard settings.
    fn load_settings(&self) -> Result<DashboardSettings, ConfigError>;

    /// Save dashboard settings.
    fn save_settings(&self, settings: &DashboardSettings) -> Result<(), ConfigError>;

    // ========================================================================
    // Variable Catalog
    // ========================================================================

    /// Load the locally configured variable catalog.
    fn load_catalog(&self) -> Result<VariableCatalog, ConfigError>;

    /// Save the variable catalog.
    fn save_catalog(&self, catalog: &VariableCatalog) -> Result<(), ConfigError>;

    // ========================================================================
    // Generic Key-Value (for extensibility)
    // ========================================================================

    /// Load a value by key.
    fn load_value<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError>;

    /// Save a value by key.
    fn save_value<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError>;

    /// Check if a key exists.
    fn has_key(&self, key: &str) -> bool;

    /// Delete a key.
    fn delete_key(&self, key: &str) -> Result<(), ConfigError>;
}

// ============================================================================
// Configuration Types
// ============================================================================

/// Which URL convention the remote service speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStyle {
    /// `POST /{kind}/read {address}` and `POST /{kind}/write {address, value}`.
    #[default]
    Rpc,
    /// `GET /read/{kind}/{index}` and `POST /write/{kind}/{index} {value}`.
    Rest,
}

impl std::str::FromStr for ApiStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rpc" => Ok(ApiStyle::Rpc),
            "rest" => Ok(ApiStyle::Rest),
            other => Err(format!("unknown API style: {}", other)),
        }
    }
}

/// Dashboard settings. Unset fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSettings {
    /// Base URL of the remote variable service, including the `/api` prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_style: Option<ApiStyle>,

    /// Variable refresh period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_poll_ms: Option<u64>,

    /// Current temperature + chart refresh period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_poll_ms: Option<u64>,

    /// Temperature statistics refresh period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats_poll_ms: Option<u64>,

    /// Delay before the verify read that follows a write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_verify_delay_ms: Option<u64>,

    /// Per-request timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,

    /// Number of chart points to fetch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_limit: Option<usize>,

    /// Trailing window for statistics and reports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats_hours: Option<u32>,
}

impl DashboardSettings {
    pub const DEFAULT_SERVICE_URL: &'static str = "http://localhost:5000/api";

    pub fn service_url(&self) -> &str {
        self.service_url
            .as_deref()
            .unwrap_or(Self::DEFAULT_SERVICE_URL)
    }

    pub fn api_style(&self) -> ApiStyle {
        self.api_style.unwrap_or_default()
    }

    pub fn variable_poll(&self) -> Duration {
        Duration::from_millis(self.variable_poll_ms.unwrap_or(5_000))
    }

    pub fn temperature_poll(&self) -> Duration {
        Duration::from_millis(self.temperature_poll_ms.unwrap_or(5_000))
    }

    pub fn stats_poll(&self) -> Duration {
        Duration::from_millis(self.stats_poll_ms.unwrap_or(60_000))
    }

    pub fn write_verify_delay(&self) -> Duration {
        Duration::from_millis(self.write_verify_delay_ms.unwrap_or(500))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.unwrap_or(5_000))
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit.unwrap_or(200)
    }

    pub fn stats_hours(&self) -> u32 {
        self.stats_hours.unwrap_or(24)
    }

    /// Overlay `other` on top of `self`; set fields in `other` win.
    pub fn merge(self, other: DashboardSettings) -> DashboardSettings {
        DashboardSettings {
            service_url: other.service_url.or(self.service_url),
            api_style: other.api_style.or(self.api_style),
            variable_poll_ms: other.variable_poll_ms.or(self.variable_poll_ms),
            temperature_poll_ms: other.temperature_poll_ms.or(self.temperature_poll_ms),
            stats_poll_ms: other.stats_poll_ms.or(self.stats_poll_ms),
            write_verify_delay_ms: other.write_verify_delay_ms.or(self.write_verify_delay_ms),
            request_timeout_ms: other.request_timeout_ms.or(self.request_timeout_ms),
            history_limit: other.history_limit.or(self.history_limit),
            stats_hours: other.stats_hours.or(self.stats_hours),
        }
    }
}

// ============================================================================
// Handler Logic
// ============================================================================

/// Configuration loading shared by every front end.
pub struct ConfigHandlers;

impl ConfigHandlers {
    /// Load settings, treating a missing file as all-defaults.
    pub fn get_settings<S: ConfigStorage>(storage: &S) -> Result<DashboardSettings, ConfigError> {
        match storage.load_settings() {
            Err(ConfigError::NotFound(_)) => Ok(DashboardSettings::default()),
            other => other,
        }
    }

    pub fn put_settings<S: ConfigStorage>(
        storage: &S,
        settings: DashboardSettings,
    ) -> Result<(), ConfigError> {
        storage.save_settings(&settings)
    }

    /// Load the catalog, falling back to the reference machine's variables.
    pub fn get_catalog<S: ConfigStorage>(storage: &S) -> Result<VariableCatalog, ConfigError> {
        match storage.load_catalog() {
            Err(ConfigError::NotFound(_)) => Ok(VariableCatalog::reference()),
            other => other,
        }
    }

    pub fn put_catalog<S: ConfigStorage>(
        storage: &S,
        catalog: VariableCatalog,
    ) -> Result<(), ConfigError> {
        storage.save_catalog(&catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{VariableDescriptor, VariableKind};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// In-memory storage for testing.
    struct MemoryConfigStorage {
        data: RwLock<HashMap<String, String>>,
    }

    impl MemoryConfigStorage {
        fn new() -> Self {
            Self {
                data: RwLock::new(HashMap::new()),
            }
        }
    }

    impl ConfigStorage for MemoryConfigStorage {
        fn load_settings(&self) -> Result<DashboardSettings, ConfigError> {
            self.load_value("settings")
        }

        fn save_settings(&self, settings: &DashboardSettings) -> Result<(), ConfigError> {
            self.save_value("settings", settings)
        }

        fn load_catalog(&self) -> Result<VariableCatalog, ConfigError> {
            self.load_value("variables")
        }

        fn save_catalog(&self, catalog: &VariableCatalog) -> Result<(), ConfigError> {
            self.save_value("variables", catalog)
        }

        fn load_value<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
            let data = self.data.read().unwrap();
            let json = data
                .get(key)
                .ok_or_else(|| ConfigError::NotFound(key.to_string()))?;
            serde_json::from_str(json).map_err(|e| ConfigError::InvalidData(e.to_string()))
        }

        fn save_value<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
            let json =
                serde_json::to_string(value).map_err(|e| ConfigError::WriteError(e.to_string()))?;
            self.data.write().unwrap().insert(key.to_string(), json);
            Ok(())
        }

        fn has_key(&self, key: &str) -> bool {
            self.data.read().unwrap().contains_key(key)
        }

        fn delete_key(&self, key: &str) -> Result<(), ConfigError> {
            self.data.write().unwrap().remove(key);
            Ok(())
        }
    }

    #[test]
    fn test_defaults_when_missing() {
        let storage = MemoryConfigStorage::new();
        let settings = ConfigHandlers::get_settings(&storage).unwrap();

        assert_eq!(settings.service_url(), "http://localhost:5000/api");
        assert_eq!(settings.api_style(), ApiStyle::Rpc);
        assert_eq!(settings.variable_poll(), Duration::from_secs(5));
        assert_eq!(settings.stats_poll(), Duration::from_secs(60));
        assert_eq!(settings.write_verify_delay(), Duration::from_millis(500));
        assert_eq!(settings.history_limit(), 200);
    }

    #[test]
    fn test_settings_round_trip() {
        let storage = MemoryConfigStorage::new();

        let settings = DashboardSettings {
            service_url: Some("http://192.168.0.10:5000/api".to_string()),
            api_style: Some(ApiStyle::Rest),
            ..Default::default()
        };

        ConfigHandlers::put_settings(&storage, settings).unwrap();
        let loaded = ConfigHandlers::get_settings(&storage).unwrap();

        assert_eq!(loaded.service_url(), "http://192.168.0.10:5000/api");
        assert_eq!(loaded.api_style(), ApiStyle::Rest);
        assert!(storage.has_key("settings"));
    }

    #[test]
    fn test_settings_camel_case() {
        let json = r#"{"serviceUrl":"http://plc/api","apiStyle":"rest","variablePollMs":1000}"#;
        let settings: DashboardSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.api_style(), ApiStyle::Rest);
        assert_eq!(settings.variable_poll(), Duration::from_secs(1));
    }

    #[test]
    fn test_merge_prefers_override() {
        let file = DashboardSettings {
            service_url: Some("http://file/api".to_string()),
            history_limit: Some(50),
            ..Default::default()
        };
        let cli = DashboardSettings {
            service_url: Some("http://cli/api".to_string()),
            ..Default::default()
        };
        let merged = file.merge(cli);
        assert_eq!(merged.service_url(), "http://cli/api");
        assert_eq!(merged.history_limit(), 50);
    }

    #[test]
    fn test_catalog_fallback_and_override() {
        let storage = MemoryConfigStorage::new();
        assert_eq!(
            ConfigHandlers::get_catalog(&storage).unwrap(),
            VariableCatalog::reference()
        );

        let mut catalog = VariableCatalog::default();
        catalog.push(VariableDescriptor::new("Pump", VariableKind::Bool, 10));
        ConfigHandlers::put_catalog(&storage, catalog.clone()).unwrap();
        assert_eq!(ConfigHandlers::get_catalog(&storage).unwrap(), catalog);

        storage.delete_key("variables").unwrap();
        assert!(!storage.has_key("variables"));
    }
}
