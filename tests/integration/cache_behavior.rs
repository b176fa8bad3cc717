//! Archive cache reuse and staleness

use anyhow::Result;

use crate::common::{TestWorld, archive_url, dependency, package};

#[tokio::test]
async fn test_second_resolution_downloads_nothing() -> Result<()> {
    let world = TestWorld::new()?;
    world.publish_and_serve(&package("codegen", "1.0.0"))?;
    let project = world.project();
    let dep = dependency("codegen", "^1");

    world.resolver.resolve(&project, &dep).await?;
    world.resolver.resolve(&project, &dep).await?;
    assert_eq!(world.transport.download_count(), 1);
    assert_eq!(world.registry.call_count(), 1);

    // A new resolver asks the registry again but still reuses the extraction
    world.fresh_resolver().resolve(&project, &dep).await?;
    assert_eq!(world.registry.call_count(), 2);
    assert_eq!(world.transport.download_count(), 1);

    assert!(world.installed("codegen").join("codegen.h").is_file());
    Ok(())
}

#[tokio::test]
async fn test_stale_cache_is_refetched_exactly_once() -> Result<()> {
    let world = TestWorld::new()?;
    world.publish_and_serve(&package("codegen", "1.0.0"))?;
    let project = world.project();
    let dep = dependency("codegen", "^1");

    world.resolver.resolve(&project, &dep).await?;
    assert_eq!(world.transport.download_count(), 1);

    world.publish_and_serve(&package("codegen", "1.1.0"))?;
    let resolver = world.fresh_resolver();
    resolver.resolve(&project, &dep).await?;
    resolver.resolve(&project, &dep).await?;
    world.fresh_resolver().resolve(&project, &dep).await?;

    assert_eq!(world.transport.download_count(), 2);
    let cached = world.cache_root().join("codegen/codegen-master/sharepm.toml");
    assert!(std::fs::read_to_string(cached)?.contains("1.1.0"));
    Ok(())
}

#[tokio::test]
async fn test_corrupt_cache_entry_is_replaced() -> Result<()> {
    let world = TestWorld::new()?;
    world.publish_and_serve(&package("codegen", "1.0.0"))?;

    let entry = world.cache_root().join("codegen");
    std::fs::create_dir_all(entry.join("left-over-a"))?;
    std::fs::create_dir_all(entry.join("left-over-b"))?;

    world.resolver.resolve(&world.project(), &dependency("codegen", "^1")).await?;

    assert_eq!(world.transport.download_count(), 1);
    assert!(!entry.join("left-over-a").exists());
    assert!(entry.join("codegen-master").is_dir());
    Ok(())
}

#[tokio::test]
async fn test_download_archive_is_removed_after_extraction() -> Result<()> {
    let world = TestWorld::new()?;
    world.publish_and_serve(&package("codegen", "1.0.0"))?;

    world.resolver.resolve(&world.project(), &dependency("codegen", "*")).await?;

    assert!(!world.cache_root().join("codegen.zip").exists());
    assert_eq!(world.transport.requested_urls(), vec![archive_url("codegen", "master")]);
    Ok(())
}
