//! Configuration resolution for `JobBoard`.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global settings file (see [`global_config_path`])
//! 3. Explicit config file (e.g. `--config <path>`)
//! 4. Environment variables
//! 5. CLI arguments (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete `JobBoard` client configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the job-board API lives and how long a single request may take.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST API (e.g. `http://127.0.0.1:8000`).
    pub base_url: String,
    /// Base URL that server-relative resume paths are joined onto.
    /// Falls back to `base_url` when unset.
    pub asset_base_url: Option<String>,
    /// Per-request timeout applied by the HTTP transport.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            asset_base_url: None,
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// Base URL used for resume and avatar links.
    pub fn asset_base(&self) -> &str {
        self.asset_base_url.as_deref().unwrap_or(&self.base_url)
    }
}

/// Cached resource freshness.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds a fetched resource is served without refetching.
    /// Zero means every read refetches.
    pub stale_after_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: 30,
        }
    }
}

/// Job listing pagination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of jobs requested per page.
    pub page_size: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { page_size: 5 }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Reject values the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(Error::Config("api.base_url is empty".into()));
        }
        if self.search.page_size == 0 {
            return Err(Error::Config("search.page_size must be at least 1".into()));
        }
        Ok(())
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(explicit_file: Option<&Path>) -> Result<Config> {
    let global = global_config_path().filter(|p| p.exists());
    let files: Vec<&Path> = global.as_deref().into_iter().chain(explicit_file).collect();
    let mut config = layer_files(&files)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    config.validate()?;
    Ok(config)
}

/// Global settings file: `<config dir>/jobboard/settings.json`
/// (`$XDG_CONFIG_HOME` on Linux, Application Support on macOS, `%APPDATA%` on Windows).
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("jobboard").join("settings.json"))
}

/// Defaults with each file laid over the previous layers in order.
///
/// Only keys a file actually sets override what is below it.
fn layer_files(files: &[&Path]) -> Result<Config> {
    let mut merged = serde_json::to_value(Config::default())?;
    for path in files {
        merge_json(&mut merged, load_config_file(path)?);
    }
    Ok(serde_json::from_value(merged)?)
}

fn load_config_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    if !value.is_object() {
        return Err(Error::Config(format!(
            "{} must contain a JSON object",
            path.display()
        )));
    }
    Ok(value)
}

fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("JOBBOARD_API_URL") {
        config.api.base_url = val;
    }
    if let Some(val) = var("JOBBOARD_ASSET_URL") {
        config.api.asset_base_url = Some(val);
    }
    if let Some(n) = var("JOBBOARD_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        config.api.timeout_secs = n;
    }
    if let Some(n) = var("JOBBOARD_CACHE_TTL_SECS").and_then(|v| v.parse().ok()) {
        config.cache.stale_after_secs = n;
    }
    if let Some(n) = var("JOBBOARD_PAGE_SIZE").and_then(|v| v.parse().ok()) {
        config.search.page_size = n;
    }
    if let Some(val) = var("JOBBOARD_LOG_LEVEL") {
        config.logging.level = val;
    }
}
