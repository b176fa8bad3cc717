//! Builders for package archives used in tests

use crate::models::Config;
use anyhow::{Context, Result};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

/// Builds a zip archive shaped like a source-hosting download.
///
/// By default every entry sits under one wrapper directory, the way
/// `https://github.com/<owner>/<repo>/archive/<ref>.zip` is laid out.
#[derive(Clone, Debug)]
pub struct ArchiveFixture {
    wrapper: Option<String>,
    files: Vec<(String, Vec<u8>)>,
}

impl ArchiveFixture {
    /// Archive whose entries live under `wrapper/`
    pub fn new(wrapper: impl Into<String>) -> Self {
        Self {
            wrapper: Some(wrapper.into()),
            files: Vec::new(),
        }
    }

    /// Archive with entries at the top level, without a wrapper directory
    pub fn unwrapped() -> Self {
        Self {
            wrapper: None,
            files: Vec::new(),
        }
    }

    /// Package archive with `config` as its descriptor
    pub fn package(wrapper: impl Into<String>, config: &Config) -> Result<Self> {
        let descriptor =
            toml::to_string_pretty(config).context("Failed to serialize fixture descriptor")?;
        Ok(Self::new(wrapper).file(crate::constants::PACKAGE_FILE_NAME, descriptor))
    }

    /// Add a file at `path` relative to the package root
    #[must_use]
    pub fn file(mut self, path: &str, contents: impl AsRef<[u8]>) -> Self {
        self.files.push((path.to_string(), contents.as_ref().to_vec()));
        self
    }

    /// Archive bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        if let Some(wrapper) = &self.wrapper {
            zip.add_directory(format!("{wrapper}/"), options)?;
        }
        for (path, contents) in &self.files {
            zip.start_file(self.entry_name(path), options)?;
            zip.write_all(contents)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    /// Write the archive to `path`, returning it
    pub fn write_to(&self, path: &Path) -> Result<PathBuf> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_bytes()?)
            .with_context(|| format!("Failed to write fixture archive {}", path.display()))?;
        Ok(path.to_path_buf())
    }

    fn entry_name(&self, path: &str) -> String {
        match &self.wrapper {
            Some(wrapper) => format!("{wrapper}/{path}"),
            None => path.to_string(),
        }
    }
}
