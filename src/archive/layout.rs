//! Archive-root normalization.
//!
//! Source-hosting archives unpack into one wrapper directory
//! (`codegen-master/`). The package root is that wrapper, never the
//! extraction directory itself. Any other shape is reported, not guessed at.

use crate::core::SharepmError;
use crate::core::file_error::{FileOperation, FileResultExt};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Outcome of inspecting an extraction directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveRoot {
    /// The single wrapper directory
    Normalized(PathBuf),
    /// The extraction does not hold exactly one directory entry
    Malformed {
        /// Extraction directory that was inspected
        dir: PathBuf,
        /// What was found instead
        reason: String,
    },
}

impl ArchiveRoot {
    /// Inspect `dir` for exactly one entry that is a directory.
    ///
    /// # Errors
    ///
    /// Only when `dir` itself cannot be listed.
    pub fn locate(dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir).with_file_context(
            FileOperation::ReadDir,
            dir,
            "locating archive root",
            "archive::layout::ArchiveRoot::locate",
        )?;

        let mut names = Vec::new();
        for entry in entries {
            names.push(entry?.path());
        }

        Ok(match names.as_slice() {
            [single] if single.is_dir() => Self::Normalized(single.clone()),
            [single] => Self::Malformed {
                dir: dir.to_path_buf(),
                reason: format!(
                    "only entry '{}' is not a directory",
                    single.file_name().unwrap_or_default().to_string_lossy()
                ),
            },
            [] => Self::Malformed {
                dir: dir.to_path_buf(),
                reason: "extraction is empty".to_string(),
            },
            many => Self::Malformed {
                dir: dir.to_path_buf(),
                reason: format!("expected one wrapper directory, found {} entries", many.len()),
            },
        })
    }

    /// Whether a usable root was found
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        matches!(self, Self::Normalized(_))
    }

    /// The normalized root, or [`SharepmError::MalformedArchiveLayout`] for `id`
    pub fn into_root(self, id: &str) -> Result<PathBuf, SharepmError> {
        match self {
            Self::Normalized(root) => Ok(root),
            Self::Malformed {
                dir,
                reason,
            } => Err(SharepmError::MalformedArchiveLayout {
                id: id.to_string(),
                path: dir.display().to_string(),
                reason,
            }),
        }
    }
}
