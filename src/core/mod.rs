//! Core types and error handling for sharepm
//!
//! - [`error`] - [`SharepmError`], [`ErrorContext`] and [`user_friendly_error`]
//! - [`file_error`] - filesystem failures with operation context

pub mod error;
pub mod file_error;

pub use error::{ErrorContext, SharepmError, user_friendly_error};
pub use file_error::{FileOperation, FileOperationError, FileResultExt};
