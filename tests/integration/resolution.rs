//! Ref selection, memoization, notification, removal and batch resolution

use anyhow::Result;
use serde_json::json;
use sharepm::constants::BRANCH_NAME_KEY;
use sharepm::core::{FileOperationError, SharepmError};
use std::sync::{Arc, Mutex};

use crate::common::{TestWorld, archive_url, dependency, package, package_on_branch};

#[tokio::test]
async fn test_dependency_branch_overrides_package_branch() -> Result<()> {
    let world = TestWorld::new()?;
    let info = package_on_branch("codegen", "1.0.0", "main");
    world.publish(&info);
    world.serve(&archive_url("codegen", "dev"), &info)?;

    let dep = dependency("codegen", "^1").with_data(BRANCH_NAME_KEY, json!("dev"));
    world.resolver.resolve(&world.project(), &dep).await?;

    assert_eq!(world.transport.requested_urls(), vec![archive_url("codegen", "dev")]);
    Ok(())
}

#[tokio::test]
async fn test_package_branch_then_default() -> Result<()> {
    let world = TestWorld::new()?;
    let branched = package_on_branch("codegen", "1.0.0", "main");
    world.publish(&branched);
    world.serve(&archive_url("codegen", "main"), &branched)?;
    world.publish_and_serve(&package("hook", "0.4.0"))?;

    let project = world.project();
    world.resolver.resolve(&project, &dependency("codegen", "^1")).await?;
    world.resolver.resolve(&project, &dependency("hook", "^0.4")).await?;

    assert_eq!(
        world.transport.requested_urls(),
        vec![archive_url("codegen", "main"), archive_url("hook", "master")]
    );
    Ok(())
}

#[tokio::test]
async fn test_override_variants_get_distinct_memo_entries() -> Result<()> {
    let world = TestWorld::new()?;
    let info = package("codegen", "1.0.0");
    world.publish_and_serve(&info)?;
    world.serve(&archive_url("codegen", "dev"), &info)?;

    let plain = dependency("codegen", "^1");
    let branched = dependency("codegen", "^1").with_data(BRANCH_NAME_KEY, json!("dev"));
    assert_eq!(plain, branched);

    let project = world.project();
    world.resolver.resolve(&project, &plain).await?;
    world.resolver.resolve(&project, &branched).await?;
    world.resolver.resolve(&project, &branched).await?;

    assert_eq!(world.resolver.memo_len(), 2);
    assert_eq!(world.registry.call_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_listeners_receive_consumer_and_dependency() -> Result<()> {
    let mut world = TestWorld::new()?;
    world.publish_and_serve(&package("codegen", "1.0.0"))?;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let first = seen.clone();
    world.resolver.on_dependency_resolved(move |consumer, resolved| {
        first.lock().unwrap().push(format!(
            "first:{}:{}",
            consumer.root_dir.is_some(),
            resolved.package_id().unwrap_or_default()
        ));
    });
    let second = seen.clone();
    world.resolver.on_dependency_resolved(move |_, _| second.lock().unwrap().push("second".to_string()));

    world.resolver.resolve(&world.project(), &dependency("codegen", "^1")).await?;

    assert_eq!(*seen.lock().unwrap(), vec!["first:true:codegen".to_string(), "second".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_listeners_not_called_on_failure() -> Result<()> {
    let mut world = TestWorld::new()?;
    world.publish_and_serve(&package("codegen", "2.0.0"))?;
    let calls = Arc::new(Mutex::new(0));
    let counter = calls.clone();
    world.resolver.on_dependency_resolved(move |_, _| *counter.lock().unwrap() += 1);

    assert!(world.resolver.resolve(&world.project(), &dependency("codegen", "^1")).await.is_err());
    assert_eq!(*calls.lock().unwrap(), 0);
    Ok(())
}

#[tokio::test]
async fn test_remove() -> Result<()> {
    let world = TestWorld::new()?;
    world.publish_and_serve(&package("codegen", "1.0.0"))?;
    let project = world.project();
    let dep = dependency("codegen", "^1");

    let err = world.resolver.remove(&project, &dep).await.unwrap_err();
    let file_error = err.downcast_ref::<FileOperationError>().expect("file operation error");
    assert_eq!(file_error.kind(), std::io::ErrorKind::NotFound);

    world.resolver.resolve(&project, &dep).await?;
    assert!(world.installed("codegen").exists());

    world.resolver.remove(&project, &dep).await?;
    assert!(!world.installed("codegen").exists());
    Ok(())
}

#[tokio::test]
async fn test_remove_rejects_ids_outside_dependencies_dir() -> Result<()> {
    let world = TestWorld::new()?;
    world.publish_and_serve(&package("codegen", "1.0.0"))?;
    let project = world.project();
    world.resolver.resolve(&project, &dependency("codegen", "^1")).await?;

    for id in ["", "..", "codegen/..", "/tmp"] {
        let err = world.resolver.remove(&project, &dependency(id, "*")).await.unwrap_err();
        assert!(
            matches!(err.downcast_ref::<SharepmError>(), Some(SharepmError::InvalidPackageId { .. })),
            "id {id:?} was not rejected: {err:#}"
        );
    }

    assert!(world.installed("codegen").join("codegen.h").is_file());
    assert!(world.temp.path().join("project").is_dir());
    Ok(())
}

#[tokio::test]
async fn test_resolve_all_isolates_failures() -> Result<()> {
    let world = TestWorld::new()?;
    world.publish_and_serve(&package("codegen", "1.0.0"))?;
    world.publish_and_serve(&package("hook", "0.4.2"))?;
    world.publish_and_serve(&package("paper", "3.0.0"))?;

    let mut project = world.project();
    project.dependencies = vec![
        dependency("codegen", "^1"),
        dependency("paper", "^2"),
        dependency("hook", "^0.4"),
    ];

    let results = world.resolver.resolve_all(&project).await;

    let ids: Vec<&str> = results.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["codegen", "paper", "hook"]);
    assert!(results[0].1.is_ok());
    assert!(matches!(
        results[1].1.as_ref().unwrap_err().downcast_ref::<SharepmError>(),
        Some(SharepmError::VersionNotSatisfied { .. })
    ));
    assert!(results[2].1.is_ok());

    assert!(world.installed("codegen").join("codegen.h").is_file());
    assert!(world.installed("hook").join("hook.h").is_file());
    assert!(!world.installed("paper").exists());
    Ok(())
}

#[tokio::test]
async fn test_concurrent_resolution_of_one_id_downloads_once() -> Result<()> {
    let world = TestWorld::new()?;
    world.publish_and_serve(&package("codegen", "1.0.0"))?;

    let mut project = world.project();
    project.dependencies = vec![dependency("codegen", "^1"); 4];

    let results = world.resolver.resolve_all(&project).await;

    assert!(results.iter().all(|(_, result)| result.is_ok()));
    assert_eq!(world.transport.download_count(), 1);
    Ok(())
}
