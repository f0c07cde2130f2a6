//! Metadata version resolution.
//!
//! Given a table root, [`resolve`] picks the one `metadata/v<N>.metadata.json`
//! file that describes the table's current state. Resolution has two tiers,
//! chosen exactly once by [`ResolutionStrategy::select`]:
//!
//! 1. [`ResolutionStrategy::HintPointer`]: `metadata/version-hint.text` exists.
//!    Its trimmed contents name the version and the path is built from it
//!    without any further IO. A malformed hint is an error; it never falls
//!    through to the scan tier.
//! 2. [`ResolutionStrategy::ScanFallback`]: the hint is absent. The metadata
//!    directory is listed and the highest `v<N>.metadata.json` wins.
//!
//! Nothing is cached. Every call observes the filesystem afresh, because the
//! writer may commit between calls. No lock is taken either: if a writer is
//! active during resolution the result may point at a file that is not fully
//! written yet, and callers should retry on [`LocatorError::is_not_found`] or
//! [`LocatorError::is_malformed`].

mod error;
pub mod version;

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

use snafu::prelude::*;

use crate::{
    layout,
    storage::{self, StorageError, TableLocation},
};

pub use error::LocatorError;
use error::{
    DuplicateMetadataVersionSnafu, MalformedMetadataFileNameSnafu, MalformedVersionHintSnafu,
    NoMetadataFilesSnafu, StorageSnafu, TableRootSnafu,
};
use version::{parse_metadata_version, parse_version_hint};

/// Which tier of resolution produced (or failed to produce) a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionTier {
    /// `metadata/version-hint.text` was present and authoritative.
    VersionHint,
    /// The metadata directory was scanned for the highest version.
    DirectoryScan,
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionTier::VersionHint => f.write_str("version-hint"),
            ResolutionTier::DirectoryScan => f.write_str("directory-scan"),
        }
    }
}

/// The authoritative metadata file for a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMetadata {
    /// Absolute path of the metadata file.
    ///
    /// When produced by the version-hint tier this path has not been checked
    /// for existence. No existence guarantee is made for any later time.
    pub path: PathBuf,
    /// Version number `N` of `v<N>.metadata.json`.
    pub version: u64,
    /// Tier that produced this result.
    pub tier: ResolutionTier,
}

/// How a table root will be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    /// Follow `metadata/version-hint.text`.
    HintPointer,
    /// Scan `metadata/` for the highest `v<N>.metadata.json`.
    ScanFallback,
}

impl ResolutionStrategy {
    /// Choose the strategy for `location` based solely on whether the
    /// version hint exists.
    ///
    /// A hint that exists but cannot be stat'ed (for example permission
    /// denied) is an error, not an absent hint.
    pub fn select(location: &TableLocation) -> Result<Self, LocatorError> {
        let present = storage::exists(location, &layout::version_hint_rel_path()).context(
            StorageSnafu {
                tier: ResolutionTier::VersionHint,
            },
        )?;

        Ok(if present {
            ResolutionStrategy::HintPointer
        } else {
            ResolutionStrategy::ScanFallback
        })
    }

    /// The tier this strategy runs.
    pub fn tier(self) -> ResolutionTier {
        match self {
            ResolutionStrategy::HintPointer => ResolutionTier::VersionHint,
            ResolutionStrategy::ScanFallback => ResolutionTier::DirectoryScan,
        }
    }

    /// Run this strategy against `location`.
    ///
    /// `location` should already be absolute so that the returned path is.
    pub fn execute(self, location: &TableLocation) -> Result<ResolvedMetadata, LocatorError> {
        match self {
            ResolutionStrategy::HintPointer => resolve_from_hint(location),
            ResolutionStrategy::ScanFallback => resolve_from_scan(location),
        }
    }
}

fn resolve_from_hint(location: &TableLocation) -> Result<ResolvedMetadata, LocatorError> {
    let hint_rel = layout::version_hint_rel_path();

    // The hint existed at selection time; a read failure now is surfaced
    // as-is rather than treated as an absent hint.
    let contents = storage::read_to_bytes(location, &hint_rel).context(StorageSnafu {
        tier: ResolutionTier::VersionHint,
    })?;

    let version = parse_version_hint(&contents).context(MalformedVersionHintSnafu {
        path: location.join(&hint_rel).display().to_string(),
        contents: String::from_utf8_lossy(&contents).trim().to_string(),
    })?;

    Ok(ResolvedMetadata {
        path: location.join(&layout::metadata_rel_path(version)),
        version,
        tier: ResolutionTier::VersionHint,
    })
}

fn resolve_from_scan(location: &TableLocation) -> Result<ResolvedMetadata, LocatorError> {
    let dir_rel = layout::metadata_rel_dir();
    let dir = location.join(&dir_rel).display().to_string();

    let entries = match storage::list_dir(location, &dir_rel) {
        Ok(entries) => entries,
        Err(source @ StorageError::NotFound { .. }) => {
            return Err(LocatorError::MetadataDirMissing { path: dir, source });
        }
        Err(source) => {
            return Err(LocatorError::Storage {
                tier: ResolutionTier::DirectoryScan,
                source,
            });
        }
    };

    let mut by_version: HashMap<u64, String> = HashMap::new();
    for entry in entries.into_iter().filter(|entry| !entry.is_dir) {
        let file_name = entry.name.to_string_lossy().into_owned();
        let Some(parsed) = parse_metadata_version(&file_name) else {
            continue;
        };

        let version = parsed.context(MalformedMetadataFileNameSnafu {
            dir: dir.as_str(),
            file_name: file_name.as_str(),
        })?;

        if let Some(first) = by_version.get(&version) {
            return DuplicateMetadataVersionSnafu {
                dir: dir.as_str(),
                version,
                first: first.as_str(),
                second: file_name.as_str(),
            }
            .fail();
        }
        by_version.insert(version, file_name);
    }

    tracing::debug!(dir = %dir, candidates = by_version.len(), "scanned metadata directory");

    let (version, file_name) = by_version
        .into_iter()
        .max_by_key(|(version, _)| *version)
        .context(NoMetadataFilesSnafu { dir: dir.as_str() })?;

    Ok(ResolvedMetadata {
        path: location.join(&dir_rel).join(file_name),
        version,
        tier: ResolutionTier::DirectoryScan,
    })
}

/// Resolve the authoritative metadata file for the table at `location`.
///
/// See the module docs for the two-tier algorithm. The returned path is
/// absolute even when `location` is relative.
pub fn resolve(location: &TableLocation) -> Result<ResolvedMetadata, LocatorError> {
    let location = location.to_absolute().context(TableRootSnafu)?;
    let strategy = ResolutionStrategy::select(&location)?;
    tracing::debug!(table = %location, ?strategy, "selected metadata resolution strategy");

    let resolved = strategy.execute(&location)?;
    tracing::info!(
        table = %location,
        tier = %resolved.tier,
        version = resolved.version,
        path = %resolved.path.display(),
        "resolved current metadata file"
    );
    Ok(resolved)
}

/// Resolve the metadata file for a local table root and return only its path.
pub fn resolve_metadata_path(table_root: impl AsRef<Path>) -> Result<PathBuf, LocatorError> {
    resolve(&TableLocation::local(table_root.as_ref())).map(|resolved| resolved.path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

    fn create_table_root() -> TestResult<(TempDir, TableLocation)> {
        let tmp = TempDir::new()?;
        std::fs::create_dir_all(tmp.path().join(layout::METADATA_DIR_NAME))?;
        let location = TableLocation::local(tmp.path());
        Ok((tmp, location))
    }

    fn touch_metadata(tmp: &TempDir, file_name: &str) -> TestResult {
        let path = tmp.path().join(layout::METADATA_DIR_NAME).join(file_name);
        std::fs::write(path, b"{}")?;
        Ok(())
    }

    fn write_hint(tmp: &TempDir, contents: impl AsRef<[u8]>) -> TestResult {
        let path = tmp.path().join(layout::version_hint_rel_path());
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn expected_path(tmp: &TempDir, file_name: &str) -> PathBuf {
        tmp.path().join(layout::METADATA_DIR_NAME).join(file_name)
    }

    // ==================== Strategy selection ====================

    #[test]
    fn strategy_follows_hint_existence() -> TestResult {
        let (tmp, location) = create_table_root()?;
        assert_eq!(
            ResolutionStrategy::select(&location)?,
            ResolutionStrategy::ScanFallback
        );

        write_hint(&tmp, "1")?;
        assert_eq!(
            ResolutionStrategy::select(&location)?,
            ResolutionStrategy::HintPointer
        );
        Ok(())
    }

    // ==================== Version-hint tier ====================

    #[test]
    fn hint_is_used_without_inspecting_other_files() -> TestResult {
        let (tmp, location) = create_table_root()?;
        touch_metadata(&tmp, "v1.metadata.json")?;
        touch_metadata(&tmp, "v9.metadata.json")?;
        write_hint(&tmp, "  4 \n")?;

        let resolved = resolve(&location)?;

        assert_eq!(resolved.path, expected_path(&tmp, "v4.metadata.json"));
        assert_eq!(resolved.version, 4);
        assert_eq!(resolved.tier, ResolutionTier::VersionHint);
        Ok(())
    }

    #[test]
    fn hint_target_is_not_checked_for_existence() -> TestResult {
        let (tmp, location) = create_table_root()?;
        write_hint(&tmp, "12")?;

        let resolved = resolve(&location)?;

        assert_eq!(resolved.path, expected_path(&tmp, "v12.metadata.json"));
        assert!(!resolved.path.exists());
        Ok(())
    }

    #[test]
    fn malformed_hint_does_not_fall_back_to_scan() -> TestResult {
        let (tmp, location) = create_table_root()?;
        touch_metadata(&tmp, "v3.metadata.json")?;
        write_hint(&tmp, "abc")?;

        let err = resolve(&location).expect_err("malformed hint must fail");

        assert!(
            matches!(&err, LocatorError::MalformedVersionHint { contents, .. } if contents == "abc"),
            "unexpected error: {err:?}"
        );
        assert!(err.is_malformed());
        assert!(!err.is_not_found());
        assert_eq!(err.tier(), Some(ResolutionTier::VersionHint));
        Ok(())
    }

    #[test]
    fn empty_hint_is_malformed() -> TestResult {
        let (tmp, location) = create_table_root()?;
        touch_metadata(&tmp, "v1.metadata.json")?;
        write_hint(&tmp, "\n")?;

        let err = resolve(&location).expect_err("empty hint must fail");
        assert!(matches!(err, LocatorError::MalformedVersionHint { .. }));
        Ok(())
    }

    #[test]
    fn non_utf8_hint_is_malformed() -> TestResult {
        let (tmp, location) = create_table_root()?;
        touch_metadata(&tmp, "v1.metadata.json")?;
        write_hint(&tmp, [0xFF, 0xFE, b'3'])?;

        let err = resolve(&location).expect_err("non-UTF-8 hint must fail");

        assert!(
            matches!(
                &err,
                LocatorError::MalformedVersionHint {
                    source: version::HintParseError::NotUtf8 { .. },
                    ..
                }
            ),
            "unexpected error: {err:?}"
        );
        assert!(err.is_malformed());
        assert!(!err.is_not_found());
        assert_eq!(err.tier(), Some(ResolutionTier::VersionHint));
        Ok(())
    }

    #[test]
    fn negative_hint_is_malformed() -> TestResult {
        let (tmp, location) = create_table_root()?;
        write_hint(&tmp, "-2")?;

        let err = resolve(&location).expect_err("negative hint must fail");
        assert!(err.is_malformed());
        Ok(())
    }

    #[test]
    fn unreadable_hint_is_a_storage_error_not_a_fallback() -> TestResult {
        let (tmp, location) = create_table_root()?;
        touch_metadata(&tmp, "v2.metadata.json")?;
        // A directory where the hint file should be: it exists, but reading fails.
        std::fs::create_dir(tmp.path().join(layout::version_hint_rel_path()))?;

        let err = resolve(&location).expect_err("unreadable hint must fail");

        assert!(
            matches!(
                err,
                LocatorError::Storage {
                    tier: ResolutionTier::VersionHint,
                    ..
                }
            ),
            "unexpected error: {err:?}"
        );
        Ok(())
    }

    // ==================== Directory-scan tier ====================

    #[test]
    fn scan_selects_maximum_version_independent_of_order() -> TestResult {
        let (tmp, location) = create_table_root()?;
        touch_metadata(&tmp, "v1.metadata.json")?;
        touch_metadata(&tmp, "v3.metadata.json")?;
        touch_metadata(&tmp, "v2.metadata.json")?;

        let resolved = resolve(&location)?;

        assert_eq!(resolved.path, expected_path(&tmp, "v3.metadata.json"));
        assert_eq!(resolved.version, 3);
        assert_eq!(resolved.tier, ResolutionTier::DirectoryScan);
        Ok(())
    }

    #[test]
    fn scan_compares_numerically_not_lexically() -> TestResult {
        let (tmp, location) = create_table_root()?;
        touch_metadata(&tmp, "v9.metadata.json")?;
        touch_metadata(&tmp, "v10.metadata.json")?;
        touch_metadata(&tmp, "v2.metadata.json")?;

        let resolved = resolve(&location)?;

        assert_eq!(resolved.path, expected_path(&tmp, "v10.metadata.json"));
        assert_eq!(resolved.version, 10);
        Ok(())
    }

    #[test]
    fn scan_ignores_unrelated_files() -> TestResult {
        let (tmp, location) = create_table_root()?;
        touch_metadata(&tmp, "v5.metadata.json")?;
        touch_metadata(&tmp, "00007-1b2c3d4e.metadata.json")?;
        touch_metadata(&tmp, "snap-123-1-abc.avro")?;
        touch_metadata(&tmp, "v8.metadata.json.tmp")?;

        let resolved = resolve(&location)?;

        assert_eq!(resolved.version, 5);
        Ok(())
    }

    #[test]
    fn scan_with_no_candidates_is_not_found() -> TestResult {
        let (tmp, location) = create_table_root()?;
        touch_metadata(&tmp, "snap-1.avro")?;

        let err = resolve(&location).expect_err("no candidates must fail");

        assert!(
            matches!(err, LocatorError::NoMetadataFiles { .. }),
            "unexpected error: {err:?}"
        );
        assert!(err.is_not_found());
        assert_eq!(err.tier(), Some(ResolutionTier::DirectoryScan));
        Ok(())
    }

    #[test]
    fn missing_metadata_dir_is_not_found() -> TestResult {
        let tmp = TempDir::new()?;
        let location = TableLocation::local(tmp.path().join("never-created"));

        let err = resolve(&location).expect_err("missing metadata dir must fail");

        assert!(
            matches!(err, LocatorError::MetadataDirMissing { .. }),
            "unexpected error: {err:?}"
        );
        assert!(err.is_not_found());
        Ok(())
    }

    #[test]
    fn scan_skips_directories_shaped_like_metadata_files() -> TestResult {
        let (tmp, location) = create_table_root()?;
        touch_metadata(&tmp, "v2.metadata.json")?;
        std::fs::create_dir(tmp.path().join(layout::METADATA_DIR_NAME).join("v9.metadata.json"))?;

        let resolved = resolve(&location)?;

        assert_eq!(resolved.path, expected_path(&tmp, "v2.metadata.json"));
        assert_eq!(resolved.version, 2);
        Ok(())
    }

    #[test]
    fn scan_rejects_unparseable_candidate() -> TestResult {
        let (tmp, location) = create_table_root()?;
        touch_metadata(&tmp, "v1.metadata.json")?;
        touch_metadata(&tmp, "vlatest.metadata.json")?;

        let err = resolve(&location).expect_err("unparseable candidate must fail");

        assert!(
            matches!(&err, LocatorError::MalformedMetadataFileName { file_name, .. } if file_name == "vlatest.metadata.json"),
            "unexpected error: {err:?}"
        );
        assert!(err.is_malformed());
        Ok(())
    }

    #[test]
    fn scan_rejects_duplicate_versions() -> TestResult {
        let (tmp, location) = create_table_root()?;
        touch_metadata(&tmp, "v2.metadata.json")?;
        touch_metadata(&tmp, "v02.metadata.json")?;

        let err = resolve(&location).expect_err("duplicate versions must fail");

        assert!(
            matches!(err, LocatorError::DuplicateMetadataVersion { version: 2, .. }),
            "unexpected error: {err:?}"
        );
        assert!(err.is_malformed());
        Ok(())
    }

    #[test]
    fn metadata_path_that_is_a_file_is_a_storage_error() -> TestResult {
        let tmp = TempDir::new()?;
        std::fs::write(tmp.path().join(layout::METADATA_DIR_NAME), b"not a dir")?;
        let location = TableLocation::local(tmp.path());

        let err = resolve(&location).expect_err("metadata must be a directory");

        assert!(!err.is_not_found());
        assert!(!err.is_malformed());
        Ok(())
    }

    // ==================== Whole-call properties ====================

    #[test]
    fn resolve_is_idempotent() -> TestResult {
        let (tmp, location) = create_table_root()?;
        touch_metadata(&tmp, "v1.metadata.json")?;
        touch_metadata(&tmp, "v2.metadata.json")?;

        let first = resolve(&location)?;
        let second = resolve(&location)?;
        assert_eq!(first, second);

        write_hint(&tmp, "1")?;
        let first = resolve(&location)?;
        let second = resolve(&location)?;
        assert_eq!(first, second);
        assert_eq!(first.version, 1);
        Ok(())
    }

    #[test]
    fn resolve_observes_new_commits_between_calls() -> TestResult {
        let (tmp, location) = create_table_root()?;
        touch_metadata(&tmp, "v1.metadata.json")?;
        assert_eq!(resolve(&location)?.version, 1);

        touch_metadata(&tmp, "v2.metadata.json")?;
        assert_eq!(resolve(&location)?.version, 2);
        Ok(())
    }

    #[test]
    fn resolve_metadata_path_returns_absolute_path() -> TestResult {
        let (tmp, _location) = create_table_root()?;
        touch_metadata(&tmp, "v7.metadata.json")?;

        let path = resolve_metadata_path(tmp.path())?;

        assert!(path.is_absolute());
        assert_eq!(path, expected_path(&tmp, "v7.metadata.json"));
        Ok(())
    }
}
