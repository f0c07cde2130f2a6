//! Error type for metadata version resolution.
//!
//! Variants fall into two operator-facing categories:
//!
//! - *not found*: the table has not been created (or the mount is empty).
//! - *malformed*: metadata exists but cannot be interpreted, which points at
//!   a corrupted or partially written table.
//!
//! Every variant also reports which [`ResolutionTier`] produced it.

use std::num::ParseIntError;

use snafu::{Backtrace, prelude::*};

use crate::{
    locator::{ResolutionTier, version::HintParseError},
    storage::StorageError,
};

/// Errors returned by [`crate::locator::resolve`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum LocatorError {
    /// The table root could not be turned into an absolute path.
    #[snafu(display("Invalid table root: {source}"))]
    TableRoot {
        /// Underlying storage error.
        #[snafu(backtrace)]
        source: StorageError,
    },

    /// No `metadata/` directory exists under the table root.
    #[snafu(display(
        "Directory scan failed: metadata directory {path} does not exist \
         (table not yet created?)"
    ))]
    MetadataDirMissing {
        /// Absolute path of the missing metadata directory.
        path: String,
        /// Underlying not-found error.
        #[snafu(backtrace)]
        source: StorageError,
    },

    /// The directory scan found no `v<N>.metadata.json` files.
    #[snafu(display(
        "Directory scan failed: no v<N>.metadata.json files in {dir} \
         and no version-hint.text to point at one"
    ))]
    NoMetadataFiles {
        /// Absolute path of the scanned metadata directory.
        dir: String,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },

    /// `version-hint.text` exists but does not hold a non-negative integer.
    #[snafu(display("Version hint is malformed: {path} contains {contents:?}: {source}"))]
    MalformedVersionHint {
        /// Absolute path of the hint file.
        path: String,
        /// Trimmed contents of the hint file, lossily decoded.
        contents: String,
        /// Decoding or integer parse failure.
        source: HintParseError,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },

    /// A file named like `v*.metadata.json` has a non-numeric version segment.
    #[snafu(display(
        "Directory scan failed: metadata file name {file_name:?} in {dir} \
         has an unparseable version: {source}"
    ))]
    MalformedMetadataFileName {
        /// Absolute path of the scanned metadata directory.
        dir: String,
        /// The offending file name.
        file_name: String,
        /// Integer parse failure.
        source: ParseIntError,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },

    /// Two metadata files parse to the same version number.
    #[snafu(display(
        "Directory scan failed: {first:?} and {second:?} in {dir} \
         both claim metadata version {version}"
    ))]
    DuplicateMetadataVersion {
        /// Absolute path of the scanned metadata directory.
        dir: String,
        /// The contested version number.
        version: u64,
        /// First file name seen with this version.
        first: String,
        /// Second file name seen with this version.
        second: String,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },

    /// Any other filesystem failure while working on a tier.
    #[snafu(display("{tier} resolution failed: {source}"))]
    Storage {
        /// Tier that was executing when the failure happened.
        tier: ResolutionTier,
        /// Underlying storage error.
        #[snafu(backtrace)]
        source: StorageError,
    },
}

impl LocatorError {
    /// The tier that produced this error, if resolution got that far.
    pub fn tier(&self) -> Option<ResolutionTier> {
        match self {
            LocatorError::TableRoot { .. } => None,
            LocatorError::MalformedVersionHint { .. } => Some(ResolutionTier::VersionHint),
            LocatorError::MetadataDirMissing { .. }
            | LocatorError::NoMetadataFiles { .. }
            | LocatorError::MalformedMetadataFileName { .. }
            | LocatorError::DuplicateMetadataVersion { .. } => Some(ResolutionTier::DirectoryScan),
            LocatorError::Storage { tier, .. } => Some(*tier),
        }
    }

    /// True when no authoritative metadata is reachable at all.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LocatorError::MetadataDirMissing { .. } | LocatorError::NoMetadataFiles { .. }
        )
    }

    /// True when a pointer or file name is present but cannot be interpreted.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            LocatorError::MalformedVersionHint { .. }
                | LocatorError::MalformedMetadataFileName { .. }
                | LocatorError::DuplicateMetadataVersion { .. }
        )
    }
}
