//! Identity changes against descriptors on disk

use anyhow::Result;
use semver::Version;
use sharepm::constants::{LOCAL_FILE_NAME, PACKAGE_FILE_NAME};
use sharepm::descriptor::{LocalConfigProvider, read_descriptor};
use sharepm::package::{ChangeKind, ChangeOutcome, PackageHandler};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use crate::common::package;

#[test]
fn test_create_then_change_everything() -> Result<()> {
    let temp = TempDir::new()?;
    let mut handler = PackageHandler::new(LocalConfigProvider::new(temp.path()));
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = changes.clone();
    handler.on_changed(move |kind, info| sink.lock().unwrap().push(format!("{kind:?} {}", info.version)));

    assert_eq!(handler.create_package(package("codegen", "0.1.0"))?, ChangeOutcome::Committed);
    handler.change_version(Version::new(0, 2, 0))?;
    handler.change_id("codegen-rs")?;
    handler.change_url(reqwest::Url::parse("https://github.com/example/codegen-rs")?)?;

    let stored = read_descriptor(temp.path())?.expect("descriptor written");
    let info = stored.info.expect("package info");
    assert_eq!(info.id, "codegen-rs");
    assert_eq!(info.version, Version::new(0, 2, 0));
    assert_eq!(info.url.as_deref(), Some("https://github.com/example/codegen-rs"));
    assert_eq!(
        *changes.lock().unwrap(),
        vec!["Created 0.1.0", "Version 0.2.0", "Id 0.2.0", "Url 0.2.0"]
    );
    Ok(())
}

#[test]
fn test_vetoed_change_leaves_file_untouched() -> Result<()> {
    let temp = TempDir::new()?;
    let mut handler = PackageHandler::new(LocalConfigProvider::new(temp.path()));
    handler.create_package(package("codegen", "0.1.0"))?;
    let before = std::fs::read_to_string(temp.path().join(PACKAGE_FILE_NAME))?;

    handler.on_configuring(|kind, _, info| {
        anyhow::ensure!(
            kind != ChangeKind::Version || info.version.pre.is_empty(),
            "pre-releases are not published"
        );
        Ok(())
    });
    let outcome = handler.change_version(Version::parse("0.2.0-beta.1")?)?;

    assert!(matches!(outcome, ChangeOutcome::Discarded { ref reason } if reason.contains("pre-releases")));
    assert_eq!(std::fs::read_to_string(temp.path().join(PACKAGE_FILE_NAME))?, before);
    Ok(())
}

#[test]
fn test_local_overrides_are_not_committed() -> Result<()> {
    let temp = TempDir::new()?;
    let mut handler = PackageHandler::new(LocalConfigProvider::new(temp.path()));
    handler.create_package(package("codegen", "0.1.0"))?;
    std::fs::write(
        temp.path().join(LOCAL_FILE_NAME),
        "[info.additional_data]\nbranchName = \"local-dev\"\n",
    )?;

    handler.change_version(Version::new(0, 1, 1))?;

    let primary = std::fs::read_to_string(temp.path().join(PACKAGE_FILE_NAME))?;
    assert!(!primary.contains("local-dev"));

    let merged = read_descriptor(temp.path())?.expect("descriptor");
    let info = merged.info.expect("package info");
    assert_eq!(info.branch_name(), Some("local-dev"));
    assert_eq!(info.version, Version::new(0, 1, 1));
    Ok(())
}
