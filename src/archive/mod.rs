//! Archive transport and the on-disk archive cache
//!
//! # Components
//!
//! - [`ArchiveTransport`] - downloads an archive and unpacks it
//! - [`HttpArchiveTransport`] - reqwest downloads, zip extraction
//! - [`ArchiveCache`] - one extraction per dependency id under the cache root
//! - [`ArchiveRoot`] - locates the single wrapper directory of an extraction
//! - [`CacheLock`] - cross-process lock on one id's cache entry
//!
//! # Cache layout
//!
//! ```text
//! <cache_root>/
//! ├── .locks/
//! │   └── codegen.lock
//! ├── codegen/
//! │   └── codegen-master/      <- normalized root
//! │       ├── sharepm.toml
//! │       └── shared/
//! └── codegen.zip              <- only while a download is in flight
//! ```

pub mod cache;
pub mod layout;
pub mod lock;

pub use cache::{ArchiveCache, CacheEntry, CacheStatus};
pub use layout::ArchiveRoot;
pub use lock::CacheLock;

use crate::config::ResolverSettings;
use crate::core::SharepmError;
use crate::core::file_error::{FileOperation, FileResultExt};
use anyhow::{Context, Result};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Fetches and unpacks package archives
pub trait ArchiveTransport: Send + Sync {
    /// Download `url` to the file `dest`
    fn download(&self, url: &str, dest: &Path) -> impl Future<Output = Result<()>> + Send;

    /// Unpack the zip at `archive` into `dest`, overwriting existing files
    fn extract(&self, archive: &Path, dest: &Path) -> impl Future<Output = Result<()>> + Send {
        let archive = archive.to_path_buf();
        let dest = dest.to_path_buf();
        async move {
            tokio::task::spawn_blocking(move || extract_zip(&archive, &dest))
                .await
                .context("Archive extraction task panicked")?
        }
    }
}

impl<T: ArchiveTransport> ArchiveTransport for Arc<T> {
    fn download(&self, url: &str, dest: &Path) -> impl Future<Output = Result<()>> + Send {
        (**self).download(url, dest)
    }

    fn extract(&self, archive: &Path, dest: &Path) -> impl Future<Output = Result<()>> + Send {
        (**self).extract(archive, dest)
    }
}

/// Archive transport over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpArchiveTransport {
    client: reqwest::Client,
}

impl HttpArchiveTransport {
    /// Build a transport with the timeout and user agent from `settings`
    pub fn new(settings: &ResolverSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .user_agent(settings.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
        })
    }

}

impl ArchiveTransport for HttpArchiveTransport {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        info!("Downloading {}", url);

        let network_error = |reason: String| SharepmError::NetworkError {
            operation: format!("download {url}"),
            reason,
        };

        let response =
            self.client.get(url).send().await.map_err(|e| network_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(network_error(format!("HTTP {}", status.as_u16())).into());
        }

        let bytes = response.bytes().await.map_err(|e| network_error(e.to_string()))?;
        debug!("Downloaded {} bytes from {}", bytes.len(), url);

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.with_file_context(
                FileOperation::CreateDir,
                parent,
                "creating archive download directory",
                "archive::HttpArchiveTransport::download",
            )?;
        }

        tokio::fs::write(dest, &bytes).await.with_file_context(
            FileOperation::Write,
            dest,
            "writing downloaded archive",
            "archive::HttpArchiveTransport::download",
        )?;

        Ok(())
    }
}

/// Unpack a zip archive into `dest`.
///
/// Entries whose names would escape `dest` are rejected by the zip reader.
pub fn extract_zip(archive: &Path, dest: &Path) -> Result<()> {
    let extraction_error = |reason: String| SharepmError::ArchiveExtraction {
        archive: archive.display().to_string(),
        reason,
    };

    let file = std::fs::File::open(archive).with_file_context(
        FileOperation::Read,
        archive,
        "opening downloaded archive",
        "archive::extract_zip",
    )?;

    let mut zip = zip::ZipArchive::new(std::io::BufReader::new(file))
        .map_err(|e| extraction_error(e.to_string()))?;

    std::fs::create_dir_all(dest).with_file_context(
        FileOperation::CreateDir,
        dest,
        "creating extraction directory",
        "archive::extract_zip",
    )?;

    zip.extract(dest).map_err(|e| extraction_error(e.to_string()))?;
    debug!("Extracted {} entries into {}", zip.len(), dest.display());

    Ok(())
}
