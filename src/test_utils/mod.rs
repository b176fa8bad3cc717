//! Test utilities for sharepm
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration suite.
//!
//! - [`ArchiveFixture`] - builds zip archives shaped like hosted downloads
//! - [`StaticRegistry`] - in-memory registry with a call counter and an offline switch
//! - [`LocalArchiveTransport`] - serves fixture archives by url and counts downloads
//!
//! # Example
//!
//! ```rust,no_run
//! use sharepm::test_utils::{ArchiveFixture, LocalArchiveTransport};
//!
//! # fn example() -> anyhow::Result<()> {
//! let transport = LocalArchiveTransport::new("/tmp/served");
//! transport.serve(
//!     "https://github.com/example/codegen/archive/master.zip",
//!     ArchiveFixture::new("codegen-master").file("shared/codegen.h", "#pragma once\n"),
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod doubles;
pub mod fixtures;

pub use doubles::{LocalArchiveTransport, StaticRegistry};
pub use fixtures::ArchiveFixture;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `None` the `RUST_LOG` environment
/// variable decides; without it logging stays off.
///
/// ```bash
/// RUST_LOG=sharepm=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
