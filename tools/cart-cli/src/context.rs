//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use turbo_cache::Cache;
use turbo_cart::{CartStore, HttpCatalog};
use turbo_data::FetchClient;

use crate::config::{CartConfig, CONFIG_NAMES};
use crate::output::{ConsoleNotifier, Output};

/// Cart store as driven from the terminal.
pub type CliStore = CartStore<HttpCatalog, ConsoleNotifier>;

/// Flags that take precedence over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub storage: Option<PathBuf>,
}

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CartConfig,
    /// File the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&Path>, overrides: Overrides, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (mut config, config_path) = match config_path {
            Some(path) => (CartConfig::load(path)?, Some(path.to_path_buf())),
            None => match find_config(&cwd) {
                Some(path) => (CartConfig::load(&path)?, Some(path)),
                None => (CartConfig::default(), None),
            },
        };

        if let Some(url) = overrides.api_url {
            config.api.base_url = url;
        }
        if let Some(path) = overrides.storage {
            config.storage.path = path;
        }

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Storage file after resolving against the working directory.
    pub fn storage_path(&self) -> PathBuf {
        self.resolve_path(&self.config.storage.path)
    }

    /// Open the cart store described by the configuration.
    pub fn open_store(&self) -> Result<CliStore> {
        let api = &self.config.api;
        let mut client = FetchClient::new()
            .with_base_url(api.base_url.as_str())
            .with_timeout(api.timeout());
        if let Some(token) = &api.bearer_token {
            client = client.with_bearer_token(token);
        }

        let path = self.storage_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let cache = Cache::open_file(&path)
            .with_context(|| format!("Failed to open storage: {}", path.display()))?;

        tracing::debug!(
            base_url = %api.base_url,
            storage = %path.display(),
            key = %self.config.storage.key,
            "opening cart store"
        );

        Ok(CartStore::builder(HttpCatalog::new(client), cache)
            .notifier(ConsoleNotifier::new(self.output.is_json()))
            .storage_key(self.config.storage.key.as_str())
            .messages(self.config.messages.clone())
            .open())
    }
}

/// Find the nearest config file walking up from `start`.
fn find_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        for name in CONFIG_NAMES {
            let path = current.join(name);
            if path.is_file() {
                return Some(path);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}
