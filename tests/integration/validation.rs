//! Failures between registry lookup and materialization

use anyhow::Result;
use sharepm::core::SharepmError;
use sharepm::models::Config;
use sharepm::test_utils::ArchiveFixture;

use crate::common::{TestWorld, archive_url, dependency, package, package_archive};

fn typed(err: &anyhow::Error) -> &SharepmError {
    err.downcast_ref::<SharepmError>().expect("typed sharepm error")
}

#[tokio::test]
async fn test_version_outside_range_always_fails() -> Result<()> {
    let world = TestWorld::new()?;
    world.publish_and_serve(&package("codegen", "2.0.0"))?;
    let project = world.project();
    let dep = dependency("codegen", "^1");

    for _ in 0..2 {
        let err = world.resolver.resolve(&project, &dep).await.unwrap_err();
        assert!(matches!(
            typed(&err),
            SharepmError::VersionNotSatisfied { id, found, .. } if id == "codegen" && found == "2.0.0"
        ));
    }

    assert!(!world.installed("codegen").exists());
    // The extraction is consistent with the registry, so it stays cached
    assert!(world.cache_root().join("codegen").exists());
    assert_eq!(world.transport.download_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_registry_mismatch_purges_cache() -> Result<()> {
    let world = TestWorld::new()?;
    world.publish(&package("codegen", "1.1.0"));
    world.serve(&archive_url("codegen", "master"), &package("codegen", "1.0.0"))?;

    let err = world.resolver.resolve(&world.project(), &dependency("codegen", "^1")).await.unwrap_err();

    assert!(matches!(
        typed(&err),
        SharepmError::VersionMismatch { expected, found, .. } if expected == "1.1.0" && found == "1.0.0"
    ));
    assert!(!world.cache_root().join("codegen").exists());
    assert!(!world.installed("codegen").exists());
    Ok(())
}

#[tokio::test]
async fn test_archive_without_descriptor_is_invalid() -> Result<()> {
    let world = TestWorld::new()?;
    world.publish(&package("codegen", "1.0.0"));
    world.transport.serve(
        &archive_url("codegen", "master"),
        ArchiveFixture::new("codegen-master").file("shared/codegen.h", "#pragma once\n"),
    )?;

    let err = world.resolver.resolve(&world.project(), &dependency("codegen", "^1")).await.unwrap_err();

    assert!(matches!(typed(&err), SharepmError::InvalidDescriptor { .. }));
    assert!(!world.cache_root().join("codegen").exists());
    Ok(())
}

#[tokio::test]
async fn test_offline_registry_is_unavailable() -> Result<()> {
    let world = TestWorld::new()?;
    world.publish_and_serve(&package("codegen", "1.0.0"))?;
    world.registry.set_offline(true);

    let err = world.resolver.resolve(&world.project(), &dependency("codegen", "^1")).await.unwrap_err();

    assert!(matches!(typed(&err), SharepmError::RegistryUnavailable { id } if id == "codegen"));
    assert_eq!(world.transport.download_count(), 0);
    assert_eq!(world.resolver.memo_len(), 0);

    // Nothing was memoized, so the next attempt goes back to the registry
    world.registry.set_offline(false);
    world.resolver.resolve(&world.project(), &dependency("codegen", "^1")).await?;
    Ok(())
}

#[tokio::test]
async fn test_unwrapped_archive_is_malformed() -> Result<()> {
    let world = TestWorld::new()?;
    let info = package("codegen", "1.0.0");
    world.publish(&info);
    let descriptor = toml::to_string_pretty(&Config::for_package(info.clone()))?;
    world.transport.serve(
        &archive_url("codegen", "master"),
        ArchiveFixture::unwrapped()
            .file("sharepm.toml", descriptor)
            .file("shared/codegen.h", "#pragma once\n"),
    )?;

    let err = world.resolver.resolve(&world.project(), &dependency("codegen", "^1")).await.unwrap_err();

    assert!(matches!(typed(&err), SharepmError::MalformedArchiveLayout { id, .. } if id == "codegen"));
    Ok(())
}

#[tokio::test]
async fn test_package_without_url() -> Result<()> {
    let world = TestWorld::new()?;
    let mut info = package("codegen", "1.0.0");
    info.url = None;
    world.publish(&info);

    let err = world.resolver.resolve(&world.project(), &dependency("codegen", "^1")).await.unwrap_err();

    assert!(matches!(typed(&err), SharepmError::MissingPackageUrl { .. }));
    Ok(())
}

#[tokio::test]
async fn test_failed_download_is_fatal() -> Result<()> {
    let world = TestWorld::new()?;
    world.publish(&package("codegen", "1.0.0"));
    // Served on a branch nobody asks for
    world.transport.serve(&archive_url("codegen", "dev"), package_archive(&package("codegen", "1.0.0"))?)?;

    let err = world.resolver.resolve(&world.project(), &dependency("codegen", "^1")).await.unwrap_err();

    assert!(matches!(typed(&err), SharepmError::NetworkError { .. }));
    assert!(!world.cache_root().join("codegen").exists());
    Ok(())
}

#[tokio::test]
async fn test_unknown_package_propagates_registry_error() -> Result<()> {
    let world = TestWorld::new()?;

    let err = world.resolver.resolve(&world.project(), &dependency("missing", "*")).await.unwrap_err();

    assert!(format!("{err:#}").contains("not found"));
    assert!(err.downcast_ref::<sharepm::registry::RegistryError>().is_some());
    Ok(())
}
