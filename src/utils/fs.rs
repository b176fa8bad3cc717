//! File system helpers used by the archive cache, the installer and the descriptor writer.
//!
//! All failures carry a [`FileOperationError`](crate::core::FileOperationError)
//! so the caller sees which operation failed on which path.

use crate::core::file_error::{FileOperation, FileResultExt};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Ensures a directory exists, creating it and all parent directories if necessary.
///
/// # Errors
///
/// Returns an error if the path exists but is not a directory, or creation fails.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).with_file_context(
            FileOperation::CreateDir,
            path,
            "creating directory",
            "utils::fs::ensure_dir",
        )?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Recursively copies a directory and all its contents to a new location.
///
/// # Behavior
///
/// - Creates the destination directory if it doesn't exist
/// - Recursively copies all subdirectories
/// - Copies only regular files (skips symlinks and special files)
/// - Overwrites existing files in the destination
///
/// A missing `src` is an error.
pub fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    let entries = fs::read_dir(src).with_file_context(
        FileOperation::ReadDir,
        src,
        "copying directory",
        "utils::fs::copy_dir",
    )?;

    ensure_dir(dst)?;

    for entry in entries {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if file_type.is_dir() {
            copy_dir(&src_path, &dst_path)?;
        } else if file_type.is_file() {
            fs::copy(&src_path, &dst_path).with_file_context(
                FileOperation::Copy,
                &src_path,
                format!("copying to {}", dst_path.display()),
                "utils::fs::copy_dir",
            )?;
        }
        // Skip symlinks and other file types
    }

    Ok(())
}

/// Copies one file, creating the destination's parent directories and overwriting
/// any file already there.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(src, dst).with_file_context(
        FileOperation::Copy,
        src,
        format!("copying to {}", dst.display()),
        "utils::fs::copy_file",
    )?;
    Ok(())
}

/// Recursively removes a directory, treating a missing directory as success.
pub fn remove_dir_all(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path).with_file_context(
            FileOperation::Remove,
            path,
            "removing directory",
            "utils::fs::remove_dir_all",
        )?;
    }
    Ok(())
}

/// Removes a file, treating a missing file as success.
pub fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => {
            other.with_file_context(
                FileOperation::Remove,
                path,
                "removing file",
                "utils::fs::remove_file",
            )?;
            Ok(())
        }
    }
}

/// Writes `content` to `path` through a temporary sibling and a rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let temp_path = path.with_extension("tmp");

    {
        let mut file = fs::File::create(&temp_path).with_file_context(
            FileOperation::Write,
            &temp_path,
            "creating temp file",
            "utils::fs::atomic_write",
        )?;

        file.write_all(content)
            .with_context(|| format!("Failed to write to temp file: {}", temp_path.display()))?;

        file.sync_all().with_context(|| "Failed to sync file to disk")?;
    }

    fs::rename(&temp_path, path).with_file_context(
        FileOperation::Rename,
        &temp_path,
        format!("moving into place at {}", path.display()),
        "utils::fs::atomic_write",
    )?;

    Ok(())
}

/// Lists every regular file below `dir`, relative to `dir`, sorted.
pub fn collect_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if entry.file_type().is_file() {
            if let Ok(relative) = entry.path().strip_prefix(dir) {
                files.push(relative.to_path_buf());
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Whether `path` stays inside whatever directory it is joined onto.
///
/// Absolute paths, drive prefixes and any `..` component are rejected.
#[must_use]
pub fn is_contained_relative(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
