//! Common test utilities for sharepm integration tests
//!
//! [`TestWorld`] wires a resolver to an in-memory registry and a local archive
//! transport, with the cache and the consumer project in one temp directory.

// Not every helper is used by every test module
#![allow(dead_code)]

use anyhow::Result;
use semver::{Version, VersionReq};
use serde_json::json;
use sharepm::archive::ArchiveCache;
use sharepm::constants::{ADDITIONAL_FILES_KEY, BRANCH_NAME_KEY};
use sharepm::models::{Config, Dependency, PackageInfo};
use sharepm::resolver::DependencyResolver;
use sharepm::test_utils::{ArchiveFixture, LocalArchiveTransport, StaticRegistry, init_test_logging};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub type TestResolver = DependencyResolver<Arc<StaticRegistry>, Arc<LocalArchiveTransport>>;

/// Registry, transport, cache and consumer project for one test
pub struct TestWorld {
    pub temp: TempDir,
    pub registry: Arc<StaticRegistry>,
    pub transport: Arc<LocalArchiveTransport>,
    pub resolver: TestResolver,
}

impl TestWorld {
    pub fn new() -> Result<Self> {
        init_test_logging(None);

        let temp = TempDir::new()?;
        let registry = Arc::new(StaticRegistry::new());
        let transport = Arc::new(LocalArchiveTransport::new(temp.path().join("served")));
        let resolver = DependencyResolver::new(
            registry.clone(),
            ArchiveCache::new(temp.path().join("cache"), transport.clone()),
        );

        Ok(Self {
            temp,
            registry,
            transport,
            resolver,
        })
    }

    /// A second resolver with an empty memo over the same registry and cache
    pub fn fresh_resolver(&self) -> TestResolver {
        DependencyResolver::new(
            self.registry.clone(),
            ArchiveCache::new(self.cache_root(), self.transport.clone()),
        )
    }

    pub fn cache_root(&self) -> PathBuf {
        self.temp.path().join("cache")
    }

    /// Consumer project descriptor rooted in the temp directory
    pub fn project(&self) -> Config {
        Config {
            root_dir: Some(self.temp.path().join("project")),
            ..Config::default()
        }
    }

    /// Where `id` is materialized in the consumer project
    pub fn installed(&self, id: &str) -> PathBuf {
        self.temp.path().join("project/extern").join(id)
    }

    /// Publish `info` in the registry
    pub fn publish(&self, info: &PackageInfo) {
        self.registry.publish(Config::for_package(info.clone()));
    }

    /// Serve a standard archive of `info` at `url`
    pub fn serve(&self, url: &str, info: &PackageInfo) -> Result<()> {
        self.transport.serve(url, package_archive(info)?)
    }

    /// Publish `info` and serve its archive on the default branch
    pub fn publish_and_serve(&self, info: &PackageInfo) -> Result<()> {
        self.publish(info);
        self.serve(&archive_url(&info.id, "master"), info)
    }
}

pub fn repo_url(id: &str) -> String {
    format!("https://github.com/example/{id}")
}

pub fn archive_url(id: &str, branch: &str) -> String {
    format!("{}/archive/{branch}.zip", repo_url(id))
}

/// Package info hosted at [`repo_url`]
pub fn package(id: &str, version: &str) -> PackageInfo {
    let mut info = PackageInfo::new(id, Version::parse(version).expect("valid version"));
    info.url = Some(repo_url(id));
    info
}

/// Package info declaring a default branch
pub fn package_on_branch(id: &str, version: &str, branch: &str) -> PackageInfo {
    let mut info = package(id, version);
    info.additional_data.insert(BRANCH_NAME_KEY.to_string(), json!(branch));
    info
}

/// Package info listing additional files
pub fn package_with_files(id: &str, version: &str, files: &[&str]) -> PackageInfo {
    let mut info = package(id, version);
    info.additional_data.insert(ADDITIONAL_FILES_KEY.to_string(), json!(files));
    info
}

pub fn dependency(id: &str, range: &str) -> Dependency {
    Dependency::new(id, VersionReq::parse(range).expect("valid range"))
}

/// Wrapped archive with `info`'s descriptor, `shared/<id>.h` and a few loose files
pub fn package_archive(info: &PackageInfo) -> Result<ArchiveFixture> {
    Ok(ArchiveFixture::package(format!("{}-master", info.id), &Config::for_package(info.clone()))?
        .file(&format!("shared/{}.h", info.id), "#pragma once\n")
        .file("a.txt", "a")
        .file("sub/b.txt", "b")
        .file("c.txt", "c")
        .file("src/private.cpp", "int main() {}\n"))
}
