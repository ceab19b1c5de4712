//! File-backed configuration storage.
//!
//! Every key is one pretty-printed JSON file under the data directory
//! (`~/.plcdash/` by default): `settings.json`, `catalog.json`, and
//! `<key>.json` for generic values.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use plcdash_core::config::{ConfigError, ConfigStorage, DashboardSettings};
use plcdash_core::VariableCatalog;

const SETTINGS_KEY: &str = "settings";
const CATALOG_KEY: &str = "catalog";

#[derive(Debug, Clone)]
pub struct FileConfigStorage {
    dir: PathBuf,
}

impl FileConfigStorage {
    /// Storage rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage in `~/.plcdash/`.
    pub fn in_home() -> Result<Self, ConfigError> {
        let home = dirs::home_dir()
            .ok_or_else(|| ConfigError::ReadError("Could not determine home directory".into()))?;
        Ok(Self::new(home.join(".plcdash")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf, ConfigError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ConfigError::InvalidData(format!("invalid key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl ConfigStorage for FileConfigStorage {
    fn load_settings(&self) -> Result<DashboardSettings, ConfigError> {
        self.load_value(SETTINGS_KEY)
    }

    fn save_settings(&self, settings: &DashboardSettings) -> Result<(), ConfigError> {
        self.save_value(SETTINGS_KEY, settings)
    }

    fn load_catalog(&self) -> Result<VariableCatalog, ConfigError> {
        self.load_value(CATALOG_KEY)
    }

    fn save_catalog(&self, catalog: &VariableCatalog) -> Result<(), ConfigError> {
        self.save_value(CATALOG_KEY, catalog)
    }

    fn load_value<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        let path = self.path(key)?;
        let text = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound(key.to_string()),
            _ => ConfigError::ReadError(format!("{}: {}", path.display(), e)),
        })?;
        serde_json::from_str(&text)
            .map_err(|e| ConfigError::InvalidData(format!("{}: {}", path.display(), e)))
    }

    fn save_value<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        let path = self.path(key)?;
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        fs::create_dir_all(&self.dir)
            .map_err(|e| ConfigError::WriteError(format!("{}: {}", self.dir.display(), e)))?;
        fs::write(&path, json)
            .map_err(|e| ConfigError::WriteError(format!("{}: {}", path.display(), e)))?;
        debug!("Saved {}", path.display());
        Ok(())
    }

    fn has_key(&self, key: &str) -> bool {
        self.path(key).map(|p| p.is_file()).unwrap_or(false)
    }

    fn delete_key(&self, key: &str) -> Result<(), ConfigError> {
        let path = self.path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ConfigError::WriteError(format!("{}: {}", path.display(), e))),
        }
    }
}
