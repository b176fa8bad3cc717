//! Filesystem utilities shared by the cache, installer and descriptor modules.

pub mod fs;

pub use fs::{copy_dir, ensure_dir, remove_dir_all};
