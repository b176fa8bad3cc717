//! In-memory registry and local archive transport

use super::fixtures::ArchiveFixture;
use crate::archive::ArchiveTransport;
use crate::core::SharepmError;
use crate::models::Config;
use crate::registry::{RegistryClient, RegistryError};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Registry backed by a map of published descriptors
#[derive(Debug, Default)]
pub struct StaticRegistry {
    packages: Mutex<HashMap<String, Config>>,
    calls: AtomicUsize,
    offline: AtomicBool,
}

impl StaticRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`StaticRegistry::publish`]
    #[must_use]
    pub fn with_package(self, config: Config) -> Self {
        self.publish(config);
        self
    }

    /// Publish (or replace) the descriptor of `config.info.id`
    pub fn publish(&self, config: Config) {
        let id = config.package_id().unwrap_or_default().to_string();
        self.packages.lock().unwrap().insert(id, config);
    }

    /// While offline every lookup fails with [`RegistryError::Network`]
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of lookups served so far, including failed ones
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RegistryClient for StaticRegistry {
    async fn fetch_latest(&self, id: &str) -> Result<Config, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.offline.load(Ordering::SeqCst) {
            return Err(RegistryError::Network("registry is offline".to_string()));
        }

        self.packages
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }
}

/// Archive transport serving fixture archives from a local directory
#[derive(Debug)]
pub struct LocalArchiveTransport {
    dir: PathBuf,
    served: Mutex<HashMap<String, PathBuf>>,
    requested: Mutex<Vec<String>>,
}

impl LocalArchiveTransport {
    /// Transport storing its archives under `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            served: Mutex::new(HashMap::new()),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Serve `fixture` for downloads of `url`, replacing any earlier archive
    pub fn serve(&self, url: &str, fixture: ArchiveFixture) -> Result<()> {
        let mut served = self.served.lock().unwrap();
        let path = self.dir.join(format!("archive-{}.zip", served.len()));
        fixture.write_to(&path)?;
        served.insert(url.to_string(), path);
        Ok(())
    }

    /// Number of download calls, including failed ones
    pub fn download_count(&self) -> usize {
        self.requested.lock().unwrap().len()
    }

    /// Urls requested so far, in order
    pub fn requested_urls(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl ArchiveTransport for LocalArchiveTransport {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        self.requested.lock().unwrap().push(url.to_string());

        let source = self.served.lock().unwrap().get(url).cloned().ok_or_else(|| {
            SharepmError::NetworkError {
                operation: format!("download {url}"),
                reason: "HTTP 404".to_string(),
            }
        })?;

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(&source, dest)
            .with_context(|| format!("Failed to copy fixture archive to {}", dest.display()))?;
        Ok(())
    }
}
