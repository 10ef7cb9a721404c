//! CLI configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use turbo_cart::{Messages, DEFAULT_STORAGE_KEY};

/// File names searched for, in order, from the working directory upwards.
pub const CONFIG_NAMES: [&str; 3] = ["cart.toml", ".cart.toml", "cart.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartConfig {
    /// Catalog API.
    #[serde(default)]
    pub api: ApiConfig,

    /// Where the cart is persisted.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Notice texts.
    #[serde(default)]
    pub messages: Messages,
}

impl CartConfig {
    /// Load config from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if is_json(path) {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
        }
    }

    /// Save config to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Catalog API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL serving `/products/{id}` and `/stock/{id}`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bearer token sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            bearer_token: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3333".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Cart persistence settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding the key-value store.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,

    /// Key the cart is stored under.
    #[serde(default = "default_storage_key")]
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            key: default_storage_key(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(".turbo-cart/storage.json")
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

/// Generate the default config file content.
pub fn generate_default_config() -> Result<String> {
    let header = "# Storefront cart configuration\n\n";
    Ok(format!("{}{}", header, toml::to_string_pretty(&CartConfig::default())?))
}
