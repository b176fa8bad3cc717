//! Resolver settings
//!
//! Settings are user-wide and optional. They live in `~/.sharepm/config.toml`
//! (`%LOCALAPPDATA%\sharepm\config.toml` on Windows), or wherever
//! `SHAREPM_CONFIG_PATH` points. A missing file means defaults.
//!
//! ```toml
//! registry_url = "https://registry.sharepm.dev"
//! cache_dir = "/var/cache/sharepm"
//! request_timeout_secs = 30
//! user_agent = "sharepm/0.1.0"
//! ```
//!
//! # Cache root
//!
//! The archive cache root is picked in this order:
//!
//! 1. `SHAREPM_CACHE_DIR` environment variable
//! 2. `cache_dir` setting
//! 3. `<system temp>/sharepm`

use crate::constants::{
    CACHE_DIR_ENV, CONFIG_PATH_ENV, DEFAULT_REGISTRY_URL, DEFAULT_REQUEST_TIMEOUT, USER_AGENT,
};
use crate::core::SharepmError;
use crate::core::file_error::{FileOperation, FileResultExt};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

/// User-wide settings for registry access and caching
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// Base URL of the package registry
    pub registry_url: String,

    /// Archive cache root; see the module docs for precedence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Per-request timeout applied by the HTTP clients
    pub request_timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            cache_dir: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl ResolverSettings {
    /// Load settings from `SHAREPM_CONFIG_PATH` or the default location.
    ///
    /// Returns defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load() -> Result<Self> {
        let path = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => PathBuf::from(path),
            None => Self::default_path()?,
        };

        if path.exists() {
            Self::load_from(&path).await
        } else {
            debug!("No settings file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load settings from a specific file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        toml::from_str(&content).map_err(|e| {
            SharepmError::ConfigParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Write settings as pretty TOML, creating parent directories.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_file_context(
                FileOperation::CreateDir,
                parent,
                "creating settings directory",
                "config::ResolverSettings::save_to",
            )?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;

        fs::write(path, content).await.with_file_context(
            FileOperation::Write,
            path,
            "writing settings",
            "config::ResolverSettings::save_to",
        )?;

        Ok(())
    }

    /// Platform default settings path.
    ///
    /// # Errors
    ///
    /// Returns an error if the home (or local data) directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("sharepm")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".sharepm")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Request timeout as a [`Duration`]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Archive cache root, honoring `SHAREPM_CACHE_DIR`
    #[must_use]
    pub fn cache_root(&self) -> PathBuf {
        select_cache_root(std::env::var_os(CACHE_DIR_ENV).map(PathBuf::from), self.cache_dir.as_deref())
    }
}

fn select_cache_root(env_override: Option<PathBuf>, configured: Option<&Path>) -> PathBuf {
    env_override
        .filter(|p| !p.as_os_str().is_empty())
        .or_else(|| configured.map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::temp_dir().join("sharepm"))
}
