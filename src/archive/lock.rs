//! Cross-process lock on one dependency's cache directory.
//!
//! The lock file lives at `{cache_root}/.locks/{id}.lock` and is released when
//! the [`CacheLock`] is dropped. Inside one process the resolver's per-id async
//! mutex already serializes work; this lock keeps two processes sharing a cache
//! root from rewriting the same extraction at once.

use crate::constants::LOCKS_DIR_NAME;
use crate::core::file_error::{FileOperation, FileResultExt};
use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::warn;

/// A held exclusive lock on a cache entry
#[derive(Debug)]
pub struct CacheLock {
    file: File,
    path: PathBuf,
}

impl CacheLock {
    /// Acquire the exclusive lock for `id`, waiting for other holders.
    ///
    /// Locking blocks, so it runs on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the locks directory or lock file cannot be created,
    /// or the file system does not support locking.
    pub async fn acquire(cache_root: &Path, id: &str) -> Result<Self> {
        let locks_dir = cache_root.join(LOCKS_DIR_NAME);
        tokio::fs::create_dir_all(&locks_dir).await.with_file_context(
            FileOperation::CreateDir,
            &locks_dir,
            "creating cache locks directory",
            "archive::lock::CacheLock::acquire",
        )?;

        let lock_path = locks_dir.join(format!("{id}.lock"));
        let open_path = lock_path.clone();
        let id = id.to_string();

        let file = tokio::task::spawn_blocking(move || -> Result<File> {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&open_path)
                .with_context(|| format!("Failed to open lock file: {}", open_path.display()))?;

            file.lock_exclusive()
                .with_context(|| format!("Failed to acquire cache lock for: {id}"))?;

            Ok(file)
        })
        .await
        .context("Failed to spawn blocking task for lock acquisition")??;

        Ok(Self {
            file,
            path: lock_path,
        })
    }

    /// Path of the lock file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        #[allow(unstable_name_collisions)]
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to unlock {}: {}", self.path.display(), e);
        }
    }
}
