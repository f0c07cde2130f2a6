//! Read-only access to table locations on the local filesystem.
//!
//! All IO in this crate goes through these helpers so that path handling and
//! error classification ("not found" vs. any other failure) live in one
//! place. Nothing here writes: the table is owned by an external writer and
//! this crate only observes it.
//!
//! The helpers are blocking. Resolution performs at most one stat, one small
//! file read, or one directory listing, so there is nothing to gain from an
//! async runtime at this layer.

mod error;

use std::{
    ffi::OsString,
    fmt, fs, io,
    path::{Path, PathBuf},
};

use snafu::{IntoError, prelude::*};

pub use error::{BackendError, StorageError};
pub(crate) use error::{EmptyLocationSnafu, NotFoundSnafu, OtherIoSnafu, RemoteUnsupportedSnafu};

/// General result type used by storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Location of a table root.
///
/// Only local (or mounted) paths are supported. Object-store URLs are
/// rejected by [`TableLocation::parse`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableLocation {
    /// A table rooted at the given local filesystem path.
    Local(PathBuf),
}

impl TableLocation {
    /// Creates a new `TableLocation` for a local filesystem path.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        TableLocation::Local(root.into())
    }

    /// Parse a user-facing location string.
    ///
    /// Accepts plain paths and `file://` URLs. Any other `scheme://` prefix
    /// fails with [`StorageError::RemoteUnsupported`].
    pub fn parse(spec: &str) -> StorageResult<Self> {
        let trimmed = spec.trim();
        ensure!(!trimmed.is_empty(), EmptyLocationSnafu);

        if let Some(path) = trimmed.strip_prefix("file://") {
            return Ok(Self::local(path));
        }

        if let Some((scheme, _)) = trimmed.split_once("://") {
            return RemoteUnsupportedSnafu {
                scheme: scheme.to_string(),
                spec: trimmed.to_string(),
            }
            .fail();
        }

        Ok(Self::local(trimmed))
    }

    /// The root directory of this location.
    pub fn root(&self) -> &Path {
        match self {
            TableLocation::Local(root) => root,
        }
    }

    /// Join a relative path onto the root.
    pub fn join(&self, rel: &Path) -> PathBuf {
        match self {
            TableLocation::Local(root) => root.join(rel),
        }
    }

    /// Return an equivalent location with an absolute root.
    ///
    /// This is purely lexical: the root is not required to exist and symlinks
    /// are not resolved.
    pub fn to_absolute(&self) -> StorageResult<Self> {
        match self {
            TableLocation::Local(root) => {
                let abs = std::path::absolute(root)
                    .map_err(BackendError::Local)
                    .context(OtherIoSnafu {
                        path: root.display().to_string(),
                    })?;
                Ok(TableLocation::Local(abs))
            }
        }
    }
}

impl fmt::Display for TableLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableLocation::Local(root) => write!(f, "{}", root.display()),
        }
    }
}

/// A single entry returned by [`list_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    /// File name of the entry (not a full path).
    pub name: OsString,
    /// Whether the entry is a directory, following symlinks.
    pub is_dir: bool,
}

fn classify(e: io::Error, abs: &Path) -> StorageError {
    let path = abs.display().to_string();
    if e.kind() == io::ErrorKind::NotFound {
        NotFoundSnafu { path }.into_error(BackendError::Local(e))
    } else {
        OtherIoSnafu { path }.into_error(BackendError::Local(e))
    }
}

/// Check whether `rel_path` exists within `location`.
///
/// A missing path (or a missing parent) yields `Ok(false)`. Any other stat
/// failure, such as permission denied, is returned as an error so that
/// callers never mistake an unreadable file for an absent one.
pub fn exists(location: &TableLocation, rel_path: &Path) -> StorageResult<bool> {
    let abs = location.join(rel_path);
    match fs::metadata(&abs) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(classify(e, &abs)),
    }
}

/// Read the raw bytes of the file at `rel_path` within `location`.
///
/// Contents are not decoded; callers decide what invalid text means. A
/// missing file yields [`StorageError::NotFound`]; every other failure
/// yields [`StorageError::OtherIo`].
pub fn read_to_bytes(location: &TableLocation, rel_path: &Path) -> StorageResult<Vec<u8>> {
    let abs = location.join(rel_path);
    fs::read(&abs).map_err(|e| classify(e, &abs))
}

/// List the entries of the directory at `rel_path` within `location`.
///
/// Entries are returned in the order the filesystem yields them, which is
/// not guaranteed to be stable. Callers that need determinism must sort or
/// reduce the result themselves.
pub fn list_dir(location: &TableLocation, rel_path: &Path) -> StorageResult<Vec<DirEntryInfo>> {
    let abs = location.join(rel_path);
    let read_dir = fs::read_dir(&abs).map_err(|e| classify(e, &abs))?;

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| classify(e, &abs))?;
        let file_type = entry.file_type().map_err(|e| classify(e, &entry.path()))?;

        let is_dir = if file_type.is_symlink() {
            // Dangling links are reported as non-directories.
            fs::metadata(entry.path())
                .map(|m| m.is_dir())
                .unwrap_or(false)
        } else {
            file_type.is_dir()
        };

        entries.push(DirEntryInfo {
            name: entry.file_name(),
            is_dir,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_accepts_plain_and_file_urls() -> TestResult {
        assert_eq!(
            TableLocation::parse("/tmp/table")?,
            TableLocation::local("/tmp/table")
        );
        assert_eq!(
            TableLocation::parse("file:///tmp/table")?,
            TableLocation::local("/tmp/table")
        );
        assert_eq!(
            TableLocation::parse("  relative/table \n")?,
            TableLocation::local("relative/table")
        );
        Ok(())
    }

    #[test]
    fn parse_rejects_remote_schemes() {
        let err = TableLocation::parse("s3://bucket/warehouse/orders")
            .expect_err("remote locations are rejected");
        assert!(
            matches!(&err, StorageError::RemoteUnsupported { scheme, .. } if scheme == "s3"),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn parse_rejects_empty() {
        let err = TableLocation::parse("   ").expect_err("empty location");
        assert!(matches!(err, StorageError::EmptyLocation { .. }));
    }

    #[test]
    fn to_absolute_keeps_absolute_roots() -> TestResult {
        let tmp = TempDir::new()?;
        let location = TableLocation::local(tmp.path());
        assert_eq!(location.to_absolute()?, location);

        let relative = TableLocation::local("some/table");
        assert!(relative.to_absolute()?.root().is_absolute());
        Ok(())
    }

    #[test]
    fn read_to_bytes_classifies_missing_files() -> TestResult {
        let tmp = TempDir::new()?;
        let location = TableLocation::local(tmp.path());

        let err = read_to_bytes(&location, Path::new("missing.txt"))
            .expect_err("missing file");
        assert!(err.is_not_found());

        std::fs::write(tmp.path().join("present.txt"), [0xFF, b'h'])?;
        assert_eq!(read_to_bytes(&location, Path::new("present.txt"))?, vec![0xFF, b'h']);
        Ok(())
    }

    #[test]
    fn exists_reports_presence_without_reading() -> TestResult {
        let tmp = TempDir::new()?;
        let location = TableLocation::local(tmp.path());

        assert!(!exists(&location, Path::new("nope/deeper"))?);
        std::fs::write(tmp.path().join("here"), "")?;
        assert!(exists(&location, Path::new("here"))?);
        Ok(())
    }

    #[test]
    fn list_dir_reports_directories() -> TestResult {
        let tmp = TempDir::new()?;
        let location = TableLocation::local(tmp.path());
        std::fs::create_dir(tmp.path().join("child"))?;
        std::fs::write(tmp.path().join("file.txt"), "x")?;

        let mut entries = list_dir(&location, Path::new(""))?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(
            entries,
            vec![
                DirEntryInfo {
                    name: OsString::from("child"),
                    is_dir: true
                },
                DirEntryInfo {
                    name: OsString::from("file.txt"),
                    is_dir: false
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn list_dir_missing_is_not_found() {
        let location = TableLocation::local("/definitely/not/a/real/table/root");
        let err = list_dir(&location, Path::new("metadata")).expect_err("missing dir");
        assert!(err.is_not_found());
    }
}
