//! CLI configuration management.
//!
//! Persists the API URL and the access credential to `~/.jobboard/config.json`.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use jobboard_core::CredentialStore;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Persistent CLI configuration.
#[derive(Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// API base URL chosen with `--api-url` at login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// Stored access credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl std::fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliConfig")
            .field("api_url", &self.api_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl CliConfig {
    /// Path to the config directory: `~/.jobboard/`.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".jobboard"))
    }

    /// Path to the config file: `~/.jobboard/config.json`.
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.json"))
    }

    /// Load config from `path`. Returns default if the file doesn't exist or is invalid.
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn clear_auth(&mut self) {
        self.access_token = None;
    }
}

/// Credential store backed by the CLI config file.
///
/// Every change is written to disk immediately so the next invocation sees it.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    config: RwLock<CliConfig>,
}

impl FileCredentialStore {
    /// Open the store at `path`, reading whatever is there.
    pub fn open(path: PathBuf) -> Self {
        let config = CliConfig::load_from(&path);
        Self {
            path,
            config: RwLock::new(config),
        }
    }

    /// Open the store at `~/.jobboard/config.json`.
    pub fn open_default() -> anyhow::Result<Self> {
        let path = CliConfig::config_path()
            .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
        Ok(Self::open(path))
    }

    pub fn snapshot(&self) -> CliConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Modify and persist the config.
    pub fn update(&self, change: impl FnOnce(&mut CliConfig)) -> anyhow::Result<()> {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        change(&mut config);
        config.save_to(&self.path)
    }

    fn persist(&self, change: impl FnOnce(&mut CliConfig)) {
        if let Err(e) = self.update(change) {
            warn!(path = %self.path.display(), error = %e, "Failed to save CLI config");
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<String> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .access_token
            .clone()
    }

    fn store(&self, raw: &str) {
        self.persist(|c| c.access_token = Some(raw.to_string()));
    }

    fn clear(&self) {
        self.persist(CliConfig::clear_auth);
    }
}
