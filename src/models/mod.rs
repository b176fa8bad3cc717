//! Data model shared by the resolver, the descriptor reader and the package handler
//!
//! - [`Dependency`] - what a project asks for: id, version range and overrides
//! - [`PackageInfo`] - the identity section of a package descriptor
//! - [`Config`] - a whole package descriptor (a consumer's own, or a fetched one)
//! - [`MemoKey`] - the exact-value key the resolver memoizes registry lookups under
//!
//! Field names serialize in snake_case. The camelCase spellings used by older
//! descriptors and by registry responses are accepted on input.

use crate::constants::{
    ADDITIONAL_FILES_KEY, BRANCH_NAME_KEY, DEFAULT_DEPENDENCIES_DIR, DEFAULT_SHARED_DIR,
};
use crate::core::SharepmError;
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::path::{Component, Path, PathBuf};

/// Open mapping from string keys to untyped values.
///
/// Ordered so that two equal mappings always serialize identically.
pub type AdditionalData = BTreeMap<String, serde_json::Value>;

/// A project's declaration of a required package
///
/// Equality and hashing consider only the identifying fields (`id` and
/// `version_range`). Override metadata does not make two declarations
/// different dependencies, but it does give them different [`MemoKey`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    /// Package id, unique within a project
    pub id: String,

    /// Acceptable versions
    #[serde(alias = "versionRange")]
    pub version_range: VersionReq,

    /// Per-dependency overrides (`branchName`, `additionalFiles`, ...)
    #[serde(default, alias = "additionalData", skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_data: AdditionalData,
}

impl Dependency {
    /// Create a dependency without overrides
    pub fn new(id: impl Into<String>, version_range: VersionReq) -> Self {
        Self {
            id: id.into(),
            version_range,
            additional_data: AdditionalData::new(),
        }
    }

    /// Builder-style helper to attach one override value
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.additional_data.insert(key.into(), value);
        self
    }

    /// Branch override requested by this dependency
    #[must_use]
    pub fn branch_name(&self) -> Option<&str> {
        branch_name(&self.additional_data)
    }

    /// Extra paths this dependency wants copied
    #[must_use]
    pub fn additional_files(&self) -> Vec<String> {
        additional_files(&self.additional_data)
    }

    /// Exact-value key for memoization
    #[must_use]
    pub fn memo_key(&self) -> MemoKey {
        MemoKey {
            id: self.id.clone(),
            version_range: self.version_range.clone(),
            overrides: serde_json::to_string(&self.additional_data).unwrap_or_default(),
        }
    }
}

impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.version_range == other.version_range
    }
}

impl Eq for Dependency {}

impl Hash for Dependency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.version_range.hash(state);
    }
}

/// Memoization key: a dependency's id, range and canonical override metadata
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoKey {
    /// Dependency id
    pub id: String,
    /// Declared range
    pub version_range: VersionReq,
    /// Canonical JSON of the override mapping
    pub overrides: String,
}

/// Identity section of a package descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Human readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Package id
    pub id: String,

    /// Published version
    pub version: Version,

    /// Where the package source lives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Package-level overrides (`branchName`, `additionalFiles`, ...)
    #[serde(default, alias = "additionalData", skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_data: AdditionalData,
}

impl PackageInfo {
    /// Create package info with just an id and version
    pub fn new(id: impl Into<String>, version: Version) -> Self {
        Self {
            name: None,
            id: id.into(),
            version,
            url: None,
            additional_data: AdditionalData::new(),
        }
    }

    /// Branch override declared by the package itself
    #[must_use]
    pub fn branch_name(&self) -> Option<&str> {
        branch_name(&self.additional_data)
    }

    /// Extra paths the package wants copied to its consumers
    #[must_use]
    pub fn additional_files(&self) -> Vec<String> {
        additional_files(&self.additional_data)
    }
}

/// A package descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory, relative to the package root, that consumers receive
    #[serde(default = "default_shared_dir", alias = "sharedDir")]
    pub shared_dir: PathBuf,

    /// Directory, relative to the project, that dependencies are materialized into
    #[serde(default = "default_dependencies_dir", alias = "dependenciesDir")]
    pub dependencies_dir: PathBuf,

    /// Package identity; absent for a project that has not been set up as a package
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<PackageInfo>,

    /// Declared dependencies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,

    /// Descriptor-level extra data
    #[serde(default, alias = "additionalData", skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_data: AdditionalData,

    /// Directory this descriptor was loaded from
    #[serde(skip)]
    pub root_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shared_dir: default_shared_dir(),
            dependencies_dir: default_dependencies_dir(),
            info: None,
            dependencies: Vec::new(),
            additional_data: AdditionalData::new(),
            root_dir: None,
        }
    }
}

impl Config {
    /// Descriptor for a published package
    #[must_use]
    pub fn for_package(info: PackageInfo) -> Self {
        Self {
            info: Some(info),
            ..Self::default()
        }
    }

    /// Where dependencies are materialized, anchored at [`Config::root_dir`] when relative
    #[must_use]
    pub fn dependencies_path(&self) -> PathBuf {
        match &self.root_dir {
            Some(root) if self.dependencies_dir.is_relative() => root.join(&self.dependencies_dir),
            _ => self.dependencies_dir.clone(),
        }
    }

    /// Id of this package, if it has identity info
    #[must_use]
    pub fn package_id(&self) -> Option<&str> {
        self.info.as_ref().map(|info| info.id.as_str())
    }
}

/// Check that `id` can name a directory: non-empty, one plain path component.
///
/// Package ids become directory names in the archive cache and in consumer
/// projects.
pub fn validate_id(id: &str) -> Result<(), SharepmError> {
    let mut components = Path::new(id).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(SharepmError::InvalidPackageId {
            id: id.to_string(),
        }),
    }
}

fn default_shared_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SHARED_DIR)
}

fn default_dependencies_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DEPENDENCIES_DIR)
}

fn branch_name(data: &AdditionalData) -> Option<&str> {
    data.get(BRANCH_NAME_KEY).and_then(serde_json::Value::as_str)
}

fn additional_files(data: &AdditionalData) -> Vec<String> {
    data.get(ADDITIONAL_FILES_KEY)
        .and_then(serde_json::Value::as_array)
        .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}
