//! Archive URL derivation.
//!
//! Packages hosted on the canonical hosting site declare their repository
//! URL; the archive for a ref lives at `<repo>/archive/<ref>.zip`. Any other
//! URL already points at the archive and is used as is.

use crate::constants::{DEFAULT_BRANCH, HOSTING_URL};
use crate::core::SharepmError;
use crate::models::{Config, Dependency};

/// Download URL for `config`'s archive as requested by `dependency`.
///
/// # Errors
///
/// [`SharepmError::MissingPackageUrl`] when the descriptor has no url.
pub fn archive_url(config: &Config, dependency: &Dependency) -> Result<String, SharepmError> {
    let url = config.info.as_ref().and_then(|info| info.url.as_deref()).ok_or_else(|| {
        SharepmError::MissingPackageUrl {
            id: dependency.id.clone(),
        }
    })?;

    if !is_hosted(url) {
        return Ok(url.to_string());
    }

    let repo = url.trim_end_matches('/');
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    Ok(format!("{}/archive/{}.zip", repo, archive_ref(config, dependency)))
}

/// Ref to download: the dependency's branch override, then the package's, then the default
#[must_use]
pub fn archive_ref<'a>(config: &'a Config, dependency: &'a Dependency) -> &'a str {
    dependency
        .branch_name()
        .or_else(|| config.info.as_ref().and_then(|info| info.branch_name()))
        .unwrap_or(DEFAULT_BRANCH)
}

fn is_hosted(url: &str) -> bool {
    url.strip_prefix(HOSTING_URL).is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
