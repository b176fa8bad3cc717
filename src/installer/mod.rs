//! Materialization of a resolved package into a consumer project
//!
//! A package exposes its shared directory plus an allow-list of extra paths.
//! Materializing is a full replace: the destination is deleted, the shared
//! directory is copied into it, then each additional-file list is applied in
//! order.
//!
//! ```text
//! <package root>/                    <project>/extern/<id>/
//! ├── shared/                        ├── codegen.h        <- from shared/
//! │   └── codegen.h          ==>     ├── LICENSE          <- additional file
//! ├── LICENSE                        └── cmake/...        <- additional dir
//! ├── cmake/
//! └── src/                           (src/ is not shared)
//! ```
//!
//! Additional entries are paths relative to the package root and are copied
//! to the same relative path under the destination. An entry that is neither a
//! file nor a directory is skipped. Entries that would leave the package root
//! are skipped with a warning. Lists are applied as given; an entry named twice
//! is copied twice and the later copy wins.

use crate::core::file_error::{FileOperation, FileResultExt};
use crate::utils::fs::{collect_files, copy_dir, copy_file, is_contained_relative, remove_dir_all};
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Replace `dest` with the package's shared interface.
///
/// `lists` are additional-file lists in application order (the dependency's
/// own list first, then the package's).
///
/// Returns every file now present under `dest`, relative to it and sorted.
///
/// # Errors
///
/// A missing shared directory, or any copy failure, is a filesystem error.
pub fn materialize(
    root: &Path,
    shared_dir: &Path,
    dest: &Path,
    lists: &[Vec<String>],
) -> Result<Vec<PathBuf>> {
    if !is_contained_relative(shared_dir) {
        bail!(
            "Shared directory '{}' must be a relative path inside {}",
            shared_dir.display(),
            root.display()
        );
    }

    remove_dir_all(dest)?;

    let shared = root.join(shared_dir);
    copy_dir(&shared, dest)
        .with_context(|| format!("Failed to copy shared directory {}", shared.display()))?;

    for entry in lists.iter().flatten() {
        copy_additional(root, dest, entry)?;
    }

    let files = collect_files(dest)?;
    debug!("Materialized {} files into {}", files.len(), dest.display());
    Ok(files)
}

fn copy_additional(root: &Path, dest: &Path, entry: &str) -> Result<()> {
    let relative = Path::new(entry);
    if !is_contained_relative(relative) {
        warn!("Skipping additional file '{}': outside the package root", entry);
        return Ok(());
    }

    let source = root.join(relative);
    let target = dest.join(relative);

    if source.is_file() {
        copy_file(&source, &target)
    } else if source.is_dir() {
        copy_dir(&source, &target)
    } else {
        debug!("Skipping additional file '{}': not present in {}", entry, root.display());
        Ok(())
    }
}

/// Delete a materialized dependency directory.
///
/// There is no existence check: a missing directory is a
/// [`FileOperationError`](crate::core::FileOperationError) with kind `NotFound`.
pub fn remove_materialized(dest: &Path) -> Result<()> {
    std::fs::remove_dir_all(dest).with_file_context(
        FileOperation::Remove,
        dest,
        "removing materialized dependency",
        "installer::remove_materialized",
    )?;
    Ok(())
}
