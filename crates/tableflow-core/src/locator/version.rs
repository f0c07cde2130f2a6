//! Parsing of version numbers from the hint file and metadata file names.

use std::{num::ParseIntError, str::Utf8Error};

use snafu::prelude::*;

use crate::layout::{METADATA_FILE_PREFIX, METADATA_FILE_SUFFIX};

/// Why the contents of `version-hint.text` are not a version number.
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum HintParseError {
    /// The file holds bytes that are not UTF-8 text.
    #[snafu(display("contents are not UTF-8: {source}"))]
    NotUtf8 {
        /// UTF-8 decoding failure.
        source: Utf8Error,
    },

    /// The trimmed text is not a non-negative integer.
    #[snafu(display("expected a non-negative integer: {source}"))]
    NotAnInteger {
        /// Integer parse failure.
        source: ParseIntError,
    },
}

/// Parse the raw contents of `version-hint.text`.
///
/// Surrounding whitespace (including the trailing newline writers emit) is
/// ignored. Non-UTF-8 bytes, empty, negative, or non-numeric contents are
/// errors.
pub fn parse_version_hint(contents: &[u8]) -> Result<u64, HintParseError> {
    let text = std::str::from_utf8(contents).context(NotUtf8Snafu)?;
    text.trim().parse::<u64>().context(NotAnIntegerSnafu)
}

/// Parse the version out of a `v<N>.metadata.json` file name.
///
/// - `None`: the name does not have the metadata file shape and is not a
///   candidate at all (for example `version-hint.text` or a UUID-named file).
/// - `Some(Err(_))`: the name has the shape but the segment between the
///   leading `v` and the first `.` is not a number. Callers must reject
///   this rather than skip it.
/// - `Some(Ok(n))`: the version number.
pub fn parse_metadata_version(file_name: &str) -> Option<Result<u64, ParseIntError>> {
    if !file_name.ends_with(METADATA_FILE_SUFFIX) {
        return None;
    }
    let rest = file_name.strip_prefix(METADATA_FILE_PREFIX)?;

    let segment = match rest.split_once('.') {
        Some((segment, _)) => segment,
        None => rest,
    };

    Some(segment.parse::<u64>())
}
