//! Error handling for sharepm
//!
//! This module provides the strongly-typed error enum used across the resolution
//! pipeline and the user-facing rendering of those errors.
//!
//! # Architecture
//!
//! - [`SharepmError`] - Enumerated error types for every failure mode of a resolution
//! - [`ErrorContext`] - Wrapper that adds user-friendly messages and suggestions
//!
//! Public operations return [`anyhow::Result`] and attach context with
//! [`anyhow::Context`]. The typed error stays reachable through
//! [`anyhow::Error::downcast_ref`], which is how callers (and tests) tell a
//! version mismatch from a network failure.
//!
//! # Error Categories
//!
//! - **Lookup**: [`SharepmError::RegistryUnavailable`], [`SharepmError::MissingPackageInfo`]
//! - **Transport**: [`SharepmError::NetworkError`], [`SharepmError::ArchiveExtraction`]
//! - **Validation**: [`SharepmError::InvalidDescriptor`], [`SharepmError::VersionMismatch`],
//!   [`SharepmError::VersionNotSatisfied`], [`SharepmError::MalformedArchiveLayout`]
//! - **Configuration**: [`SharepmError::ConfigNotFound`], [`SharepmError::ConfigParseError`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use sharepm::core::{SharepmError, user_friendly_error};
//!
//! let error = SharepmError::RegistryUnavailable {
//!     id: "beatsaber-hook".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for sharepm operations
///
/// Every variant that concerns a single dependency carries its id so a caller
/// resolving a list can report which entry failed.
#[derive(Error, Debug)]
pub enum SharepmError {
    /// The registry could not be reached for an uncached dependency
    ///
    /// The lookup itself only yields an absent result; the resolver escalates
    /// that absence into this error.
    #[error("Could not resolve dependency '{id}': registry lookup failed")]
    RegistryUnavailable {
        /// Id of the dependency being looked up
        id: String,
    },

    /// A resolved descriptor has no package-info section
    #[error("Package descriptor for '{id}' has no package info")]
    MissingPackageInfo {
        /// Id of the dependency whose descriptor is incomplete
        id: String,
    },

    /// A resolved descriptor does not say where to download the package from
    #[error("Package '{id}' does not declare a download url")]
    MissingPackageUrl {
        /// Id of the package without a url
        id: String,
    },

    /// Network error
    #[error("Network error: {operation}")]
    NetworkError {
        /// The network operation that failed
        operation: String,
        /// Reason for the network failure
        reason: String,
    },

    /// Archive could not be unpacked
    #[error("Failed to extract archive {archive}: {reason}")]
    ArchiveExtraction {
        /// Path of the archive file
        archive: String,
        /// Reason reported by the zip reader
        reason: String,
    },

    /// The extracted archive does not wrap its payload in exactly one directory
    #[error("Unexpected archive layout for '{id}' in {path}: {reason}")]
    MalformedArchiveLayout {
        /// Id of the dependency whose archive was extracted
        id: String,
        /// Extraction directory that was inspected
        path: String,
        /// What was found instead of a single wrapper directory
        reason: String,
    },

    /// The downloaded package carries no usable descriptor
    #[error("Could not resolve dependency '{id}': downloaded package has no valid descriptor ({reason})")]
    InvalidDescriptor {
        /// Id of the dependency being validated
        id: String,
        /// Why the descriptor was rejected
        reason: String,
    },

    /// The downloaded package reports a different version than the registry promised
    #[error(
        "Could not resolve dependency '{id}': downloaded version {found} does not match registry version {expected}"
    )]
    VersionMismatch {
        /// Id of the dependency being validated
        id: String,
        /// Version reported by the registry
        expected: String,
        /// Version reported by the downloaded descriptor
        found: String,
    },

    /// The downloaded version is outside the requested range
    #[error("Could not resolve dependency '{id}': version {found} does not satisfy {required}")]
    VersionNotSatisfied {
        /// Id of the dependency being validated
        id: String,
        /// The declared version range
        required: String,
        /// The version that was actually found
        found: String,
    },

    /// No package descriptor where one was required
    #[error("Package descriptor not found in {path}")]
    ConfigNotFound {
        /// Directory that was searched
        path: String,
    },

    /// Descriptor or settings file could not be parsed
    #[error("Invalid syntax in {file}")]
    ConfigParseError {
        /// Path to the file that failed to parse
        file: String,
        /// Specific reason for the parsing failure
        reason: String,
    },

    /// An empty or otherwise unusable package id
    #[error("Invalid package id: '{id}'")]
    InvalidPackageId {
        /// The rejected id
        id: String,
    },

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl Clone for SharepmError {
    fn clone(&self) -> Self {
        match self {
            Self::RegistryUnavailable {
                id,
            } => Self::RegistryUnavailable {
                id: id.clone(),
            },
            Self::MissingPackageInfo {
                id,
            } => Self::MissingPackageInfo {
                id: id.clone(),
            },
            Self::MissingPackageUrl {
                id,
            } => Self::MissingPackageUrl {
                id: id.clone(),
            },
            Self::NetworkError {
                operation,
                reason,
            } => Self::NetworkError {
                operation: operation.clone(),
                reason: reason.clone(),
            },
            Self::ArchiveExtraction {
                archive,
                reason,
            } => Self::ArchiveExtraction {
                archive: archive.clone(),
                reason: reason.clone(),
            },
            Self::MalformedArchiveLayout {
                id,
                path,
                reason,
            } => Self::MalformedArchiveLayout {
                id: id.clone(),
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::InvalidDescriptor {
                id,
                reason,
            } => Self::InvalidDescriptor {
                id: id.clone(),
                reason: reason.clone(),
            },
            Self::VersionMismatch {
                id,
                expected,
                found,
            } => Self::VersionMismatch {
                id: id.clone(),
                expected: expected.clone(),
                found: found.clone(),
            },
            Self::VersionNotSatisfied {
                id,
                required,
                found,
            } => Self::VersionNotSatisfied {
                id: id.clone(),
                required: required.clone(),
                found: found.clone(),
            },
            Self::ConfigNotFound {
                path,
            } => Self::ConfigNotFound {
                path: path.clone(),
            },
            Self::ConfigParseError {
                file,
                reason,
            } => Self::ConfigParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::InvalidPackageId {
                id,
            } => Self::InvalidPackageId {
                id: id.clone(),
            },
            // toml::ser::Error is not Clone
            Self::TomlSerError(e) => Self::Other {
                message: format!("TOML serialization error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// Suggestions are actionable; details explain what the failure means.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying sharepm error
    pub error: SharepmError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context from a [`SharepmError`]
    #[must_use]
    pub const fn new(error: SharepmError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`SharepmError`] anywhere in the chain, [`std::io::Error`] and
/// [`toml::de::Error`]; everything else is rendered with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(sharepm_error) = error.downcast_ref::<SharepmError>() {
        return create_error_context(sharepm_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(SharepmError::Other {
                    message: format!("Permission denied: {io_error}"),
                })
                .with_suggestion("Check ownership of the cache and dependency directories")
                .with_details("sharepm could not read or write a file it needs");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(SharepmError::Other {
                    message: format!("Not found: {io_error}"),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct")
                .with_details(
                    "This error occurs when a required file or directory cannot be found",
                );
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(SharepmError::ConfigParseError {
            file: crate::constants::PACKAGE_FILE_NAME.to_string(),
            reason: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax of the package descriptor")
        .with_details("TOML parsing errors are usually caused by missing quotes or mismatched brackets");
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();

    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(SharepmError::Other {
        message,
    })
}

fn create_error_context(error: SharepmError) -> ErrorContext {
    match &error {
        SharepmError::RegistryUnavailable { id } => ErrorContext::new(error.clone())
            .with_suggestion("Check your internet connection and the registry_url setting")
            .with_details(format!(
                "No cached descriptor exists for '{id}' and the registry could not be reached"
            )),

        SharepmError::NetworkError { operation, .. } => ErrorContext::new(error.clone())
            .with_suggestion("Check your internet connection and that the package url is reachable")
            .with_details(format!("The {operation} request failed before any file was written")),

        SharepmError::MalformedArchiveLayout { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Publish the package as an archive whose contents sit in a single top-level directory")
            .with_details("sharepm expects the archive payload to be wrapped in exactly one directory"),

        SharepmError::InvalidDescriptor { .. } | SharepmError::VersionMismatch { .. } => {
            ErrorContext::new(error.clone())
                .with_suggestion("Make sure the published archive contains a sharepm.toml whose version matches the registry entry")
                .with_details("The downloaded package does not match the descriptor obtained from the registry")
        }

        SharepmError::VersionNotSatisfied { id, required, .. } => ErrorContext::new(error.clone())
            .with_suggestion(format!("Relax the version range '{required}' declared for '{id}'"))
            .with_details("The registry only offers the latest version of a package"),

        SharepmError::ConfigParseError { file, .. } => ErrorContext::new(error.clone())
            .with_suggestion(format!(
                "Check the syntax in {file}. Common issues: missing quotes, unmatched brackets, invalid versions"
            )),

        _ => ErrorContext::new(error),
    }
}
