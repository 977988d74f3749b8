//! TOML-based configuration system for Girder.

use crate::error::{GirderError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level Girder configuration, deserialized from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GirderConfig {
    pub girder: GirderSection,
    #[serde(default)]
    pub source: SourceConfig,
}

/// Core Girder instance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GirderSection {
    pub instance_name: String,
    pub data_dir: String,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Database backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: Some("/var/lib/girder/girder.db".into()),
        }
    }
}

/// Data source configuration: which source feeds the store and how often.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Active source identifier: `mock`, `erpnext`, or `civitbuild`.
    /// Unrecognized values fall back to `mock` at dispatch time.
    #[serde(default = "default_active_source")]
    pub active: String,
    /// Minutes between scheduled sync runs.
    #[serde(default = "default_sync_interval")]
    pub sync_interval_minutes: u64,
    #[serde(default)]
    pub erpnext: ErpNextConfig,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            active: default_active_source(),
            sync_interval_minutes: default_sync_interval(),
            erpnext: ErpNextConfig::default(),
        }
    }
}

fn default_active_source() -> String {
    "mock".into()
}

fn default_sync_interval() -> u64 {
    60
}

/// ERPNext connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErpNextConfig {
    #[serde(default = "default_erpnext_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    /// Rows fetched per page from the resource API.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

impl Default for ErpNextConfig {
    fn default() -> Self {
        Self {
            base_url: default_erpnext_url(),
            api_key: String::new(),
            api_secret: String::new(),
            page_size: default_page_size(),
        }
    }
}

fn default_erpnext_url() -> String {
    "https://demo.erpnext.com".into()
}

fn default_page_size() -> u64 {
    500
}

impl GirderConfig {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| GirderError::Config(format!("failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Validate the configuration, returning an error for invalid combinations.
    pub fn validate(&self) -> Result<()> {
        if self.girder.instance_name.is_empty() {
            return Err(GirderError::Config(
                "girder.instance_name must not be empty".into(),
            ));
        }

        if self.girder.data_dir.is_empty() {
            return Err(GirderError::Config(
                "girder.data_dir must not be empty".into(),
            ));
        }

        if self.girder.database.path.is_none() {
            return Err(GirderError::Config("girder.database.path is required".into()));
        }

        if self.source.sync_interval_minutes == 0 {
            return Err(GirderError::Config(
                "source.sync_interval_minutes must be at least 1".into(),
            ));
        }

        if self.source.active == "erpnext" && self.source.erpnext.base_url.is_empty() {
            return Err(GirderError::Config(
                "source.erpnext.base_url is required when the active source is erpnext".into(),
            ));
        }

        Ok(())
    }
}
