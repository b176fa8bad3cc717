//! Local package descriptor reading and writing
//!
//! A package directory carries a primary descriptor ([`PACKAGE_FILE_NAME`]) and
//! may carry a local override ([`LOCAL_FILE_NAME`]) that is never published.
//! Reading merges the override on top of the primary: tables merge key by key,
//! any other value in the override replaces the primary's.
//!
//! ```text
//! sharepm.toml                sharepm.local.toml
//! shared_dir = "shared"       [info.additional_data]
//! [info]                      branchName = "dev"
//! id = "codegen"
//! version = "0.3.1"
//! ```
//!
//! A directory without a primary descriptor reads as `Ok(None)`. Only
//! unreadable or malformed files are errors.
//!
//! [`ConfigProvider`] is the read/commit seam used by the
//! [`PackageHandler`](crate::package::PackageHandler). Its implementation on
//! [`LocalConfigProvider`] works on the primary file alone, so committing a
//! change never bakes local overrides into the published descriptor.

use crate::constants::{LOCAL_FILE_NAME, PACKAGE_FILE_NAME};
use crate::core::SharepmError;
use crate::core::file_error::{FileOperation, FileResultExt};
use crate::models::Config;
use crate::utils::fs::atomic_write;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Load, and optionally persist, the descriptor of a project
pub trait ConfigProvider {
    /// Current descriptor; when `create` is set a missing descriptor yields a default one
    fn get_config(&mut self, create: bool) -> Result<Option<Config>>;

    /// Persist `config` as the project's descriptor
    fn commit(&mut self, config: &Config) -> Result<()>;
}

/// Reads the two-file descriptor scheme from one directory
#[derive(Debug, Clone)]
pub struct LocalConfigProvider {
    dir: PathBuf,
    package_file: String,
    local_file: String,
}

impl LocalConfigProvider {
    /// Provider using the default file names
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_file_names(dir, PACKAGE_FILE_NAME, LOCAL_FILE_NAME)
    }

    /// Provider with custom primary and override file names
    pub fn with_file_names(
        dir: impl Into<PathBuf>,
        package_file: impl Into<String>,
        local_file: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            package_file: package_file.into(),
            local_file: local_file.into(),
        }
    }

    /// Directory this provider reads from
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the primary descriptor
    #[must_use]
    pub fn package_path(&self) -> PathBuf {
        self.dir.join(&self.package_file)
    }

    /// Path of the local override
    #[must_use]
    pub fn local_path(&self) -> PathBuf {
        self.dir.join(&self.local_file)
    }

    /// Primary descriptor merged with the local override, if any
    pub fn read(&self) -> Result<Option<Config>> {
        let Some(mut table) = read_table(&self.package_path())? else {
            return Ok(None);
        };

        if let Some(overlay) = read_table(&self.local_path())? {
            debug!("Applying local descriptor override {}", self.local_path().display());
            merge_tables(&mut table, overlay);
        }

        self.into_config(table, &self.package_path()).map(Some)
    }

    /// Primary descriptor only
    pub fn read_primary(&self) -> Result<Option<Config>> {
        match read_table(&self.package_path())? {
            Some(table) => self.into_config(table, &self.package_path()).map(Some),
            None => Ok(None),
        }
    }

    /// Write `config` as the primary descriptor
    pub fn write(&self, config: &Config) -> Result<()> {
        let path = self.package_path();
        let content = toml::to_string_pretty(config)
            .map_err(SharepmError::from)
            .with_context(|| format!("Failed to serialize descriptor for {}", path.display()))?;
        atomic_write(&path, content.as_bytes())
    }

    fn into_config(&self, table: toml::Table, path: &Path) -> Result<Config> {
        let mut config: Config = toml::Value::Table(table).try_into().map_err(
            |e: toml::de::Error| SharepmError::ConfigParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            },
        )?;
        config.root_dir = Some(self.dir.clone());
        Ok(config)
    }
}

impl ConfigProvider for LocalConfigProvider {
    fn get_config(&mut self, create: bool) -> Result<Option<Config>> {
        match self.read_primary()? {
            Some(config) => Ok(Some(config)),
            None if create => Ok(Some(Config {
                root_dir: Some(self.dir.clone()),
                ..Config::default()
            })),
            None => Ok(None),
        }
    }

    fn commit(&mut self, config: &Config) -> Result<()> {
        self.write(config)
    }
}

/// Read the merged descriptor found in `dir`
pub fn read_descriptor(dir: &Path) -> Result<Option<Config>> {
    LocalConfigProvider::new(dir).read()
}

fn read_table(path: &Path) -> Result<Option<toml::Table>> {
    if !path.is_file() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).with_file_context(
        FileOperation::Read,
        path,
        "reading package descriptor",
        "descriptor::read_table",
    )?;

    let table = toml::from_str::<toml::Table>(&content).map_err(|e| SharepmError::ConfigParseError {
        file: path.display().to_string(),
        reason: e.to_string(),
    })?;

    Ok(Some(table))
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
