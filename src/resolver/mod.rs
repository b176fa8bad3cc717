//! Dependency resolution
//!
//! [`DependencyResolver`] takes one declared [`Dependency`] of a consumer
//! project through the whole pipeline:
//!
//! 1. **Lookup** - the registry's latest descriptor for the id, memoized per
//!    exact dependency value ([`MemoKey`]) for the resolver's lifetime
//! 2. **URL** - [`archive_url`] picks the archive and ref to download
//! 3. **Fetch** - [`ArchiveCache::ensure`] reuses or replaces `<cache>/<id>`
//! 4. **Validate** - the downloaded descriptor must report the registry's
//!    version, and that version must satisfy the declared range
//! 5. **Materialize** - [`installer::materialize`] replaces
//!    `<consumer dependencies dir>/<package id>` with the package's shared files
//! 6. **Notify** - listeners registered with
//!    [`DependencyResolver::on_dependency_resolved`] run in order
//!
//! # Concurrency
//!
//! Work on one id is serialized by a per-id async mutex, and inside the
//! archive cache by a cross-process file lock. Different ids resolve in
//! parallel; [`DependencyResolver::resolve_all`] drives a consumer's whole
//! dependency list that way.
//!
//! # Cache purging
//!
//! A failed validation purges the cached extraction when the extraction itself
//! is inconsistent (no usable descriptor, or a version other than the
//! registry's). A package that is consistent but outside the requested range
//! stays cached.

pub mod events;
pub mod url;

pub use events::{ResolvedListener, ResolvedListeners};
pub use url::{archive_ref, archive_url};

use crate::archive::{ArchiveCache, ArchiveTransport, CacheStatus, HttpArchiveTransport};
use crate::config::ResolverSettings;
use crate::core::SharepmError;
use crate::descriptor::read_descriptor;
use crate::installer;
use crate::models::{Config, Dependency, MemoKey, validate_id};
use crate::registry::{HttpRegistryClient, RegistryClient};
use anyhow::{Context, Result};
use dashmap::DashMap;
use semver::Version;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Resolves declared dependencies into a consumer project
pub struct DependencyResolver<R, T> {
    registry: R,
    cache: ArchiveCache<T>,
    memo: DashMap<MemoKey, Config>,
    id_locks: DashMap<String, Arc<Mutex<()>>>,
    listeners: ResolvedListeners,
}

impl DependencyResolver<HttpRegistryClient, HttpArchiveTransport> {
    /// Resolver talking HTTP to the configured registry, caching under
    /// [`ResolverSettings::cache_root`]
    pub fn from_settings(settings: &ResolverSettings) -> Result<Self> {
        let registry = HttpRegistryClient::new(settings)?;
        let transport = HttpArchiveTransport::new(settings)?;
        Ok(Self::new(registry, ArchiveCache::new(settings.cache_root(), transport)))
    }
}

impl<R: RegistryClient, T: ArchiveTransport> DependencyResolver<R, T> {
    /// Resolver over `registry` and `cache`, with an empty memo
    pub fn new(registry: R, cache: ArchiveCache<T>) -> Self {
        Self {
            registry,
            cache,
            memo: DashMap::new(),
            id_locks: DashMap::new(),
            listeners: ResolvedListeners::default(),
        }
    }

    /// The archive cache
    pub fn cache(&self) -> &ArchiveCache<T> {
        &self.cache
    }

    /// Number of memoized registry lookups
    #[must_use]
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Register a callback run after every successful resolution with
    /// `(consumer, resolved dependency)`
    pub fn on_dependency_resolved<F>(&mut self, listener: F)
    where
        F: Fn(&Config, &Config) + Send + Sync + 'static,
    {
        self.listeners.subscribe(Box::new(listener));
    }

    /// Registry descriptor for `dependency`, memoized.
    ///
    /// An unreachable registry is not an error here: it is logged and yields
    /// `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Registry answers other than success (unknown package, undecodable
    /// response) propagate.
    pub async fn get_config(&self, dependency: &Dependency) -> Result<Option<Config>> {
        let key = dependency.memo_key();
        if let Some(config) = self.memo.get(&key).map(|entry| entry.value().clone()) {
            debug!("Registry lookup for {} served from memo", dependency.id);
            return Ok(Some(config));
        }

        match self.registry.fetch_latest(&dependency.id).await {
            Ok(config) => {
                self.memo.insert(key, config.clone());
                Ok(Some(config))
            }
            Err(e) if e.is_network() => {
                warn!("Registry lookup for {} failed: {}", dependency.id, e);
                Ok(None)
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("Registry lookup failed for '{}'", dependency.id))),
        }
    }

    /// Resolve `dependency` into `consumer`'s dependencies directory.
    ///
    /// # Errors
    ///
    /// Every failure names the dependency. The typed cause is reachable with
    /// `downcast_ref::<SharepmError>()`.
    pub async fn resolve(&self, consumer: &Config, dependency: &Dependency) -> Result<()> {
        let id_lock = self.id_lock(&dependency.id);
        let result = {
            let _guard = id_lock.lock().await;
            self.resolve_locked(consumer, dependency).await
        };
        drop(id_lock);
        self.release_id_lock(&dependency.id);
        result
    }

    async fn resolve_locked(&self, consumer: &Config, dependency: &Dependency) -> Result<()> {
        let config = self.get_config(dependency).await?.ok_or_else(|| {
            SharepmError::RegistryUnavailable {
                id: dependency.id.clone(),
            }
        })?;
        let info = config.info.as_ref().ok_or_else(|| SharepmError::MissingPackageInfo {
            id: dependency.id.clone(),
        })?;
        validate_id(&info.id)?;

        let url = archive_url(&config, dependency)?;
        // Held until the files are copied out, or the extraction purged
        let entry = self.cache.ensure(&dependency.id, &info.version, &url).await?;
        let root = entry.normalized_root()?;

        let descriptor_root = root.clone();
        let extracted = tokio::task::spawn_blocking(move || read_descriptor(&descriptor_root))
            .await
            .context("Descriptor read task panicked")?;

        if let Err(e) = validate(dependency, &info.version, extracted) {
            if purges_cache(&e) {
                if let Err(purge_error) = entry.purge() {
                    warn!("Failed to purge cache for {}: {:#}", dependency.id, purge_error);
                }
            }
            return Err(e.into());
        }

        let dest = consumer.dependencies_path().join(&info.id);
        let shared_dir = config.shared_dir.clone();
        let lists = vec![dependency.additional_files(), info.additional_files()];
        let target = dest.clone();
        let files = tokio::task::spawn_blocking(move || {
            installer::materialize(&root, &shared_dir, &target, &lists)
        })
        .await
        .context("Materialization task panicked")?
        .with_context(|| format!("Failed to install '{}' into {}", dependency.id, dest.display()))?;
        let status = entry.status();
        drop(entry);

        info!(
            "Resolved {} {} ({} files, {})",
            dependency.id,
            info.version,
            files.len(),
            match status {
                CacheStatus::Reused => "cached",
                CacheStatus::Fetched => "downloaded",
            }
        );

        self.listeners.notify(consumer, &config);
        Ok(())
    }

    /// Delete `dependency`'s materialized directory from `consumer`.
    ///
    /// # Errors
    ///
    /// A directory that does not exist is an error
    /// ([`FileOperationError`](crate::core::FileOperationError), kind `NotFound`).
    /// An id that is not a single path component is rejected with
    /// [`SharepmError::InvalidPackageId`] before anything is deleted.
    pub async fn remove(&self, consumer: &Config, dependency: &Dependency) -> Result<()> {
        validate_id(&dependency.id)?;
        let dest: PathBuf = consumer.dependencies_path().join(&dependency.id);

        let id_lock = self.id_lock(&dependency.id);
        let result = {
            let _guard = id_lock.lock().await;
            tokio::task::spawn_blocking(move || installer::remove_materialized(&dest))
                .await
                .context("Removal task panicked")
        };
        drop(id_lock);
        self.release_id_lock(&dependency.id);
        result??;

        info!("Removed {}", dependency.id);
        Ok(())
    }

    /// Resolve every declared dependency of `consumer` concurrently.
    ///
    /// Each entry succeeds or fails on its own; results keep declaration order.
    pub async fn resolve_all(&self, consumer: &Config) -> Vec<(String, Result<()>)> {
        let tasks = consumer.dependencies.iter().map(|dependency| async move {
            (dependency.id.clone(), self.resolve(consumer, dependency).await)
        });
        futures::future::join_all(tasks).await
    }

    fn id_lock(&self, id: &str) -> Arc<Mutex<()>> {
        self.id_locks.entry(id.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Drop `id`'s mutex once no task holds or waits on it
    fn release_id_lock(&self, id: &str) {
        self.id_locks.remove_if(id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Check the downloaded descriptor against the registry and the declared range
fn validate(
    dependency: &Dependency,
    expected: &Version,
    extracted: Result<Option<Config>>,
) -> Result<Config, SharepmError> {
    let invalid = |reason: String| SharepmError::InvalidDescriptor {
        id: dependency.id.clone(),
        reason,
    };

    let config = match extracted {
        Ok(Some(config)) => config,
        Ok(None) => return Err(invalid("descriptor not found".to_string())),
        Err(e) => return Err(invalid(format!("{e:#}"))),
    };
    let Some(info) = config.info.as_ref() else {
        return Err(invalid("descriptor has no package info".to_string()));
    };

    if &info.version != expected {
        return Err(SharepmError::VersionMismatch {
            id: dependency.id.clone(),
            expected: expected.to_string(),
            found: info.version.to_string(),
        });
    }

    if !dependency.version_range.matches(&info.version) {
        return Err(SharepmError::VersionNotSatisfied {
            id: dependency.id.clone(),
            required: dependency.version_range.to_string(),
            found: info.version.to_string(),
        });
    }

    Ok(config)
}

/// Whether a validation failure means the cached extraction cannot be trusted
fn purges_cache(error: &SharepmError) -> bool {
    matches!(error, SharepmError::InvalidDescriptor { .. } | SharepmError::VersionMismatch { .. })
}
