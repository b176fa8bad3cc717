//! Global constants used throughout the sharepm codebase.
//!
//! File names, well-known additional-data keys, defaults and environment
//! variable names live here so they are discoverable from one place.

use std::time::Duration;

/// Primary package descriptor file name.
pub const PACKAGE_FILE_NAME: &str = "sharepm.toml";

/// Optional local override descriptor, read next to [`PACKAGE_FILE_NAME`].
///
/// Fields present in this file take precedence over the primary descriptor.
pub const LOCAL_FILE_NAME: &str = "sharepm.local.toml";

/// Additional-data key selecting the archive ref (branch) to download.
pub const BRANCH_NAME_KEY: &str = "branchName";

/// Additional-data key listing extra paths to copy next to the shared directory.
pub const ADDITIONAL_FILES_KEY: &str = "additionalFiles";

/// Host prefix that marks a package URL as a source-hosting link.
///
/// Links with this prefix are rewritten to an archive download URL.
pub const HOSTING_URL: &str = "https://github.com";

/// Ref used when neither the dependency nor the package names a branch.
pub const DEFAULT_BRANCH: &str = "master";

/// Default shared directory of a package descriptor.
pub const DEFAULT_SHARED_DIR: &str = "shared";

/// Default directory, relative to the project, where dependencies are materialized.
pub const DEFAULT_DEPENDENCIES_DIR: &str = "extern";

/// Name of the per-dependency lock directory inside the cache root.
pub const LOCKS_DIR_NAME: &str = ".locks";

/// Environment variable overriding the archive cache root.
pub const CACHE_DIR_ENV: &str = "SHAREPM_CACHE_DIR";

/// Environment variable overriding the settings file location.
pub const CONFIG_PATH_ENV: &str = "SHAREPM_CONFIG_PATH";

/// Default registry endpoint.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.sharepm.dev";

/// Timeout applied to every registry and archive request (30 seconds).
///
/// The resolver itself has no cancellation contract; hung connections are cut
/// at the HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent with registry and archive requests.
pub const USER_AGENT: &str = concat!("sharepm/", env!("CARGO_PKG_VERSION"));
