//! Locating one table directory under a base directory that holds many.
//!
//! Writers such as WarpStream Tableflow place every table under a shared
//! base directory, with directory names that combine a logical table name
//! and a generated suffix (for example
//! `playground_kafka__ecommerce-orders-dbc3ed1c-...`). Discovery lists the
//! direct children of the base directory and returns the single directory
//! the [`TableSelector`] matches.
//!
//! Directory listing order is filesystem-dependent, so "first match" is not
//! a well-defined answer. More than one match is an error
//! ([`DiscoveryError::AmbiguousTable`]) that names every candidate.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use snafu::{Backtrace, prelude::*};

use crate::storage::{self, StorageError, TableLocation};

/// How a table directory name is matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSelector {
    /// The directory name must equal this string.
    Exact(String),
    /// The directory name must contain this string.
    Contains(String),
}

impl TableSelector {
    /// Returns true when `dir_name` is selected.
    pub fn matches(&self, dir_name: &str) -> bool {
        match self {
            TableSelector::Exact(name) => dir_name == name,
            TableSelector::Contains(fragment) => dir_name.contains(fragment.as_str()),
        }
    }
}

impl fmt::Display for TableSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableSelector::Exact(name) => write!(f, "name == {name:?}"),
            TableSelector::Contains(fragment) => write!(f, "name contains {fragment:?}"),
        }
    }
}

/// Errors returned by [`discover_table`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DiscoveryError {
    /// The base directory does not exist.
    #[snafu(display("Base directory {path} does not exist"))]
    BaseDirMissing {
        /// The missing base directory.
        path: String,
        /// Underlying not-found error.
        #[snafu(backtrace)]
        source: StorageError,
    },

    /// No child directory matched the selector.
    #[snafu(display("No table directory under {base} matches {selector}"))]
    TableNotFound {
        /// The base directory that was listed.
        base: String,
        /// Rendered selector.
        selector: String,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },

    /// More than one child directory matched the selector.
    #[snafu(display(
        "{} table directories under {base} match {selector}: {}; \
         use an exact table name to disambiguate",
        candidates.len(),
        candidates.join(", ")
    ))]
    AmbiguousTable {
        /// The base directory that was listed.
        base: String,
        /// Rendered selector.
        selector: String,
        /// Every matching directory name, sorted.
        candidates: Vec<String>,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },

    /// Any other filesystem failure while listing the base directory.
    #[snafu(display("Failed to list base directory: {source}"))]
    Storage {
        /// Underlying storage error.
        #[snafu(backtrace)]
        source: StorageError,
    },
}

/// Find the single table directory under `base_dir` selected by `selector`.
///
/// Only direct children that are directories (following symlinks) are
/// considered. The returned path is `base_dir` joined with the matching
/// directory name.
pub fn discover_table(base_dir: &Path, selector: &TableSelector) -> Result<PathBuf, DiscoveryError> {
    let base = base_dir.display().to_string();
    let location = TableLocation::local(base_dir);

    let entries = match storage::list_dir(&location, Path::new("")) {
        Ok(entries) => entries,
        Err(source) if source.is_not_found() => {
            return Err(source).context(BaseDirMissingSnafu { path: base });
        }
        Err(source) => return Err(source).context(StorageSnafu),
    };

    let mut candidates: Vec<String> = entries
        .into_iter()
        .filter(|entry| entry.is_dir)
        .filter_map(|entry| match entry.name.into_string() {
            Ok(name) => Some(name),
            Err(name) => {
                tracing::warn!(base = %base, ?name, "skipping non-UTF-8 directory name");
                None
            }
        })
        .filter(|name| selector.matches(name))
        .collect();
    candidates.sort();

    tracing::debug!(
        base = %base,
        %selector,
        matches = candidates.len(),
        "listed table directories"
    );

    match candidates.len() {
        0 => TableNotFoundSnafu {
            base,
            selector: selector.to_string(),
        }
        .fail(),
        1 => Ok(base_dir.join(candidates.remove(0))),
        _ => AmbiguousTableSnafu {
            base,
            selector: selector.to_string(),
            candidates,
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn make_dirs(tmp: &TempDir, names: &[&str]) -> TestResult {
        for name in names {
            std::fs::create_dir_all(tmp.path().join(name))?;
        }
        Ok(())
    }

    #[test]
    fn substring_selects_single_match() -> TestResult {
        let tmp = TempDir::new()?;
        make_dirs(
            &tmp,
            &[
                "playground_kafka__ecommerce-orders-dbc3ed1c",
                "playground_kafka__clickstream-11aa22bb",
            ],
        )?;

        let found = discover_table(
            tmp.path(),
            &TableSelector::Contains("ecommerce-orders".to_string()),
        )?;

        assert_eq!(
            found,
            tmp.path().join("playground_kafka__ecommerce-orders-dbc3ed1c")
        );
        Ok(())
    }

    #[test]
    fn ambiguous_substring_is_an_error_listing_all_candidates() -> TestResult {
        let tmp = TempDir::new()?;
        make_dirs(&tmp, &["b__ecommerce-orders-2", "a__ecommerce-orders-1"])?;

        let err = discover_table(
            tmp.path(),
            &TableSelector::Contains("ecommerce-orders".to_string()),
        )
        .expect_err("two matches must be ambiguous");

        match err {
            DiscoveryError::AmbiguousTable { candidates, .. } => {
                assert_eq!(
                    candidates,
                    vec![
                        "a__ecommerce-orders-1".to_string(),
                        "b__ecommerce-orders-2".to_string()
                    ]
                );
            }
            other => panic!("expected AmbiguousTable, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn exact_selector_disambiguates() -> TestResult {
        let tmp = TempDir::new()?;
        make_dirs(&tmp, &["orders", "orders-archive"])?;

        let found = discover_table(tmp.path(), &TableSelector::Exact("orders".to_string()))?;

        assert_eq!(found, tmp.path().join("orders"));
        Ok(())
    }

    #[test]
    fn files_are_not_tables() -> TestResult {
        let tmp = TempDir::new()?;
        std::fs::write(tmp.path().join("ecommerce-orders.txt"), b"not a table")?;

        let err = discover_table(
            tmp.path(),
            &TableSelector::Contains("ecommerce-orders".to_string()),
        )
        .expect_err("files are ignored");

        assert!(matches!(err, DiscoveryError::TableNotFound { .. }));
        Ok(())
    }

    #[test]
    fn missing_base_dir_is_reported() -> TestResult {
        let tmp = TempDir::new()?;

        let err = discover_table(
            &tmp.path().join("absent"),
            &TableSelector::Exact("orders".to_string()),
        )
        .expect_err("missing base dir");

        assert!(matches!(err, DiscoveryError::BaseDirMissing { .. }));
        Ok(())
    }

    #[test]
    fn selector_display_names_the_policy() {
        assert_eq!(
            TableSelector::Exact("orders".to_string()).to_string(),
            r#"name == "orders""#
        );
        assert_eq!(
            TableSelector::Contains("orders".to_string()).to_string(),
            r#"name contains "orders""#
        );
    }
}
