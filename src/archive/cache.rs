//! Per-dependency archive cache.
//!
//! Each dependency id owns `<cache_root>/<id>/`, holding one unpacked archive.
//! An entry is reused only while the descriptor at its normalized root reports
//! the version the registry currently promises. Anything else (no descriptor,
//! no package info, a descriptor that does not parse, a malformed layout or a
//! different version) makes the entry stale, and a stale entry is deleted and
//! fetched again.
//!
//! [`ArchiveCache::ensure`] hands back a [`CacheEntry`] that keeps the entry's
//! [`CacheLock`] until it is dropped, so everything that reads from or purges
//! the extraction happens under the same lock that produced it.

use super::layout::ArchiveRoot;
use super::lock::CacheLock;
use super::ArchiveTransport;
use crate::descriptor::read_descriptor;
use crate::models::validate_id;
use crate::utils::fs::{ensure_dir, remove_dir_all, remove_file};
use anyhow::{Context, Result};
use semver::Version;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// How [`ArchiveCache::ensure`] satisfied a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// The existing extraction matched and no network call was made
    Reused,
    /// The archive was downloaded and extracted
    Fetched,
}

/// A ready extraction, locked for as long as this value lives
#[derive(Debug)]
pub struct CacheEntry {
    id: String,
    dir: PathBuf,
    status: CacheStatus,
    _lock: CacheLock,
}

impl CacheEntry {
    /// How the entry was obtained
    #[must_use]
    pub fn status(&self) -> CacheStatus {
        self.status
    }

    /// Extraction directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Normalized package root inside the extraction
    ///
    /// # Errors
    ///
    /// [`SharepmError::MalformedArchiveLayout`](crate::core::SharepmError::MalformedArchiveLayout)
    /// when the extraction does not wrap its payload in a single directory.
    pub fn normalized_root(&self) -> Result<PathBuf> {
        Ok(ArchiveRoot::locate(&self.dir)?.into_root(&self.id)?)
    }

    /// Delete the extraction, then release the lock
    pub fn purge(self) -> Result<()> {
        info!("Purging cached extraction of {}", self.id);
        remove_dir_all(&self.dir)
    }
}

/// Archive cache rooted at one directory
#[derive(Debug)]
pub struct ArchiveCache<T> {
    root: PathBuf,
    transport: T,
}

impl<T: ArchiveTransport> ArchiveCache<T> {
    /// Cache under `root` using `transport` for downloads
    pub fn new(root: impl Into<PathBuf>, transport: T) -> Self {
        Self {
            root: root.into(),
            transport,
        }
    }

    /// Cache root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extraction directory for `id`
    #[must_use]
    pub fn dependency_dir(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    /// Download location for `id`'s archive
    #[must_use]
    pub fn archive_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.zip"))
    }

    /// Make sure `<root>/<id>` holds an extraction of version `expected`.
    ///
    /// Reuses a matching extraction without touching the network. Otherwise
    /// downloads `url`, replaces the directory with the fresh extraction and
    /// deletes the downloaded archive. The returned entry holds the id's lock.
    ///
    /// # Errors
    ///
    /// Download and extraction failures are fatal and carry
    /// [`SharepmError::NetworkError`](crate::core::SharepmError::NetworkError) or
    /// [`SharepmError::ArchiveExtraction`](crate::core::SharepmError::ArchiveExtraction).
    pub async fn ensure(&self, id: &str, expected: &Version, url: &str) -> Result<CacheEntry> {
        validate_id(id)?;
        let lock = CacheLock::acquire(&self.root, id).await?;
        let dir = self.dependency_dir(id);
        let entry = |status| CacheEntry {
            id: id.to_string(),
            dir: dir.clone(),
            status,
            _lock: lock,
        };

        if dir.exists() {
            match cached_version(&dir) {
                Some(version) if &version == expected => {
                    debug!("Reusing cached {} {} at {}", id, version, dir.display());
                    return Ok(entry(CacheStatus::Reused));
                }
                Some(version) => {
                    debug!("Cached {} is {}, registry has {}; refetching", id, version, expected);
                }
                None => {
                    debug!("Cached {} at {} is unusable; refetching", id, dir.display());
                }
            }
            remove_dir_all(&dir)?;
        }

        self.fetch(id, url).await?;
        Ok(entry(CacheStatus::Fetched))
    }

    async fn fetch(&self, id: &str, url: &str) -> Result<()> {
        ensure_dir(&self.root)?;
        let archive = self.archive_path(id);
        let dir = self.dependency_dir(id);

        info!("Fetching {} from {}", id, url);
        self.transport
            .download(url, &archive)
            .await
            .with_context(|| format!("Failed to download archive for '{id}'"))?;

        remove_dir_all(&dir)?;
        let extracted = self.transport.extract(&archive, &dir).await;
        remove_file(&archive)?;

        if let Err(e) = extracted {
            remove_dir_all(&dir)?;
            return Err(e.context(format!("Failed to extract archive for '{id}'")));
        }

        Ok(())
    }
}

/// Version reported by the extraction in `dir`, if it is usable at all
fn cached_version(dir: &Path) -> Option<Version> {
    let root = match ArchiveRoot::locate(dir) {
        Ok(ArchiveRoot::Normalized(root)) => root,
        Ok(ArchiveRoot::Malformed {
            reason,
            ..
        }) => {
            debug!("Malformed cache entry {}: {}", dir.display(), reason);
            return None;
        }
        Err(e) => {
            debug!("Unreadable cache entry {}: {:#}", dir.display(), e);
            return None;
        }
    };

    match read_descriptor(&root) {
        Ok(Some(config)) => config.info.map(|info| info.version),
        Ok(None) => None,
        Err(e) => {
            debug!("Cached descriptor in {} does not parse: {:#}", root.display(), e);
            None
        }
    }
}
