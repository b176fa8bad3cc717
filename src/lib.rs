//! sharepm - dependency resolution for shared-source packages
//!
//! A package publishes a shared directory (headers, scripts, assets) plus an
//! allow-list of extra files. Projects declare the packages they depend on by
//! id and version range; sharepm finds the latest published descriptor in a
//! registry, fetches the package's source archive, checks that the archive is
//! the version the registry promised, and copies the shared interface into the
//! project.
//!
//! # Architecture Overview
//!
//! ```text
//! Dependency ──> registry ──> archive url ──> archive cache ──> validation
//!                (memoized)                   (<cache>/<id>)        │
//!                                                                   v
//!                         listeners <── <project>/extern/<id> <── installer
//! ```
//!
//! # Core Modules
//!
//! - [`resolver`] - the resolution pipeline, batch resolution and removal
//! - [`registry`] - registry lookups ([`registry::RegistryClient`])
//! - [`archive`] - downloads, extraction and the on-disk archive cache
//! - [`installer`] - materializing a package into a project
//! - [`descriptor`] - reading and writing `sharepm.toml` (+ `sharepm.local.toml`)
//! - [`package`] - changing a project's own package identity
//!
//! ## Supporting Modules
//!
//! - [`models`] - dependency and descriptor data model
//! - [`config`] - user-wide resolver settings
//! - [`core`] - error types and user-facing error rendering
//! - [`constants`] - file names, keys and defaults
//! - [`utils`] - filesystem helpers
//!
//! # Descriptor Format (sharepm.toml)
//!
//! ```toml
//! shared_dir = "shared"
//! dependencies_dir = "extern"
//!
//! [info]
//! name = "Codegen"
//! id = "codegen"
//! version = "0.3.1"
//! url = "https://github.com/example/codegen"
//!
//! [info.additional_data]
//! branchName = "main"
//! additionalFiles = ["LICENSE", "cmake"]
//!
//! [[dependencies]]
//! id = "beatsaber-hook"
//! version_range = "^1.2"
//! additional_data = { branchName = "dev" }
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use sharepm::config::ResolverSettings;
//! use sharepm::descriptor::read_descriptor;
//! use sharepm::resolver::DependencyResolver;
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let settings = ResolverSettings::load().await?;
//! let mut resolver = DependencyResolver::from_settings(&settings)?;
//! resolver.on_dependency_resolved(|_, dependency| {
//!     println!("resolved {:?}", dependency.package_id());
//! });
//!
//! let project = read_descriptor(Path::new("."))?.expect("sharepm.toml");
//! for (id, result) in resolver.resolve_all(&project).await {
//!     if let Err(e) = result {
//!         eprintln!("{id}: {e:#}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod config;
pub mod constants;
pub mod core;
pub mod descriptor;
pub mod installer;
pub mod models;
pub mod package;
pub mod registry;
pub mod resolver;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
