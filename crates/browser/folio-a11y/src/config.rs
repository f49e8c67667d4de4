//! Accessibility Configuration

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::announcer::AnnouncerConfig;
use crate::preferences::FileStorage;
use crate::trap::TrapOptions;
use crate::A11yError;

/// Accessibility configuration options
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct A11yConfig {
    /// Live-region announcer
    pub announcer: AnnouncerConfig,

    /// Defaults for newly activated focus traps
    pub trap: TrapOptions,

    pub preferences: PreferencesConfig,
}

/// Preferences persistence options
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PreferencesConfig {
    /// Name the preferences blob is stored under
    pub storage_key: String,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            storage_key: "folio-accessibility-preferences".to_string(),
        }
    }
}

impl PreferencesConfig {
    /// File storage for the preferences blob inside `dir`
    pub fn file_storage(&self, dir: &Path) -> FileStorage {
        FileStorage::in_dir(dir, &self.storage_key)
    }
}

impl A11yConfig {
    /// Parse a JSON document; missing keys take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, A11yError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, A11yError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
