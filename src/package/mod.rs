//! Package identity changes
//!
//! [`PackageHandler`] edits the identity section of a project's own
//! descriptor: create it, or change its id, version or url. Every change
//! follows the same steps:
//!
//! 1. load the descriptor from the [`ConfigProvider`]
//! 2. apply the change to a copy
//! 3. run the *configuring* listeners on the copy; any of them may veto
//! 4. on a veto return [`ChangeOutcome::Discarded`] without persisting anything
//! 5. otherwise commit the copy and run the *changed* listeners
//!
//! Both kinds of listener receive a [`ChangeKind`] naming the field that
//! changed. Configuring listeners are where dependent files (build scripts
//! carrying the package id and version) get rewritten; a failure there leaves
//! the descriptor as it was.

use crate::core::SharepmError;
use crate::descriptor::ConfigProvider;
use crate::models::{Config, PackageInfo, validate_id};
use anyhow::Result;
use semver::Version;
use tracing::{info, warn};

/// Veto-capable hook run before a change is committed: `(kind, candidate, new info)`
pub type ConfiguringListener =
    Box<dyn Fn(ChangeKind, &Config, &PackageInfo) -> Result<()> + Send + Sync>;

/// Hook run after a change was committed
pub type ChangedListener = Box<dyn Fn(ChangeKind, &PackageInfo) + Send + Sync>;

/// Which part of the package identity a change touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// The whole package info was set by [`PackageHandler::create_package`]
    Created,
    /// Package id
    Id,
    /// Package version
    Version,
    /// Package url
    Url,
}

/// Result of a change request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// The change was persisted and listeners notified
    Committed,
    /// A configuring listener rejected the change; nothing was persisted
    Discarded {
        /// The listener's error, rendered
        reason: String,
    },
}

impl ChangeOutcome {
    /// Whether the change was persisted
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed)
    }
}

/// Applies identity changes to the descriptor behind a [`ConfigProvider`]
pub struct PackageHandler<P> {
    provider: P,
    configuring: Vec<ConfiguringListener>,
    changed: Vec<ChangedListener>,
}

impl<P: ConfigProvider> PackageHandler<P> {
    /// Handler over `provider` with no listeners
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            configuring: Vec::new(),
            changed: Vec::new(),
        }
    }

    /// The underlying provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Register a hook that can veto a change before it is committed
    pub fn on_configuring<F>(&mut self, listener: F)
    where
        F: Fn(ChangeKind, &Config, &PackageInfo) -> Result<()> + Send + Sync + 'static,
    {
        self.configuring.push(Box::new(listener));
    }

    /// Register a hook run after a change is committed
    pub fn on_changed<F>(&mut self, listener: F)
    where
        F: Fn(ChangeKind, &PackageInfo) + Send + Sync + 'static,
    {
        self.changed.push(Box::new(listener));
    }

    /// Set the package info, creating the descriptor if there is none
    pub fn create_package(&mut self, info: PackageInfo) -> Result<ChangeOutcome> {
        validate_id(&info.id)?;
        let config = self.provider.get_config(true)?.ok_or_else(|| self.not_found())?;

        let mut candidate = config;
        candidate.info = Some(info);
        self.apply(ChangeKind::Created, candidate)
    }

    /// Change the package id
    pub fn change_id(&mut self, id: &str) -> Result<ChangeOutcome> {
        validate_id(id)?;
        self.change(ChangeKind::Id, |info| info.id = id.to_string())
    }

    /// Change the package version
    pub fn change_version(&mut self, version: Version) -> Result<ChangeOutcome> {
        self.change(ChangeKind::Version, |info| info.version = version)
    }

    /// Change the package url
    pub fn change_url(&mut self, url: reqwest::Url) -> Result<ChangeOutcome> {
        self.change(ChangeKind::Url, |info| info.url = Some(url.to_string()))
    }

    fn change(&mut self, kind: ChangeKind, edit: impl FnOnce(&mut PackageInfo)) -> Result<ChangeOutcome> {
        let mut candidate = self.provider.get_config(false)?.ok_or_else(|| self.not_found())?;
        let project = describe(&candidate);
        let info = candidate.info.as_mut().ok_or(SharepmError::MissingPackageInfo {
            id: project,
        })?;
        edit(info);
        self.apply(kind, candidate)
    }

    fn apply(&mut self, kind: ChangeKind, candidate: Config) -> Result<ChangeOutcome> {
        let Some(info) = candidate.info.as_ref() else {
            return Err(SharepmError::MissingPackageInfo {
                id: describe(&candidate),
            }
            .into());
        };

        for listener in &self.configuring {
            if let Err(e) = listener(kind, &candidate, info) {
                warn!("Discarding {:?} change to {}: {:#}", kind, info.id, e);
                return Ok(ChangeOutcome::Discarded {
                    reason: format!("{e:#}"),
                });
            }
        }

        self.provider.commit(&candidate)?;
        info!("Updated package {} {} ({:?})", info.id, info.version, kind);

        for listener in &self.changed {
            listener(kind, info);
        }
        Ok(ChangeOutcome::Committed)
    }

    fn not_found(&self) -> SharepmError {
        SharepmError::ConfigNotFound {
            path: "project descriptor".to_string(),
        }
    }
}

/// Name for a descriptor that has no package id yet
fn describe(config: &Config) -> String {
    config
        .root_dir
        .as_ref()
        .map_or_else(|| "project".to_string(), |dir| dir.display().to_string())
}
