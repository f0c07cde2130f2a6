//! On-disk layout helpers for an Iceberg table root.
//!
//! This module centralizes the *relative* path conventions this crate reads:
//!
//! ```text
//! table_root/
//!   metadata/
//!     version-hint.text        # optional pointer, e.g. "3\n"
//!     v1.metadata.json
//!     v2.metadata.json
//!     v3.metadata.json
//!   data/                      # referenced by the metadata; never read here
//! ```
//!
//! The functions here return relative [`std::path::PathBuf`] values. Callers
//! join them with a [`crate::storage::TableLocation`] before doing IO.

use std::path::PathBuf;

/// Name of the subdirectory holding metadata files and the version hint.
pub const METADATA_DIR_NAME: &str = "metadata";

/// Name of the file that stores the current metadata version pointer.
pub const VERSION_HINT_FILE_NAME: &str = "version-hint.text";

/// Leading marker of a versioned metadata file name.
pub const METADATA_FILE_PREFIX: &str = "v";

/// Trailing suffix of a versioned metadata file name.
pub const METADATA_FILE_SUFFIX: &str = ".metadata.json";

/// Relative path: `metadata/`
pub fn metadata_rel_dir() -> PathBuf {
    PathBuf::from(METADATA_DIR_NAME)
}

/// Relative path: `metadata/version-hint.text`
pub fn version_hint_rel_path() -> PathBuf {
    metadata_rel_dir().join(VERSION_HINT_FILE_NAME)
}

/// File name: `v<version>.metadata.json`
pub fn metadata_file_name(version: u64) -> String {
    format!("{METADATA_FILE_PREFIX}{version}{METADATA_FILE_SUFFIX}")
}

/// Relative path: `metadata/v<version>.metadata.json`
pub fn metadata_rel_path(version: u64) -> PathBuf {
    metadata_rel_dir().join(metadata_file_name(version))
}
