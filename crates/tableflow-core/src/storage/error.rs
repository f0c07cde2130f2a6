use std::{error::Error, fmt, io};

use snafu::{Backtrace, prelude::*};

/// Errors produced by the storage backend implementation.
///
/// Only the local filesystem is supported; backend-specific I/O errors are
/// wrapped here so higher layers can map them into [`StorageError`] variants
/// with path context.
#[derive(Debug)]
pub enum BackendError {
    /// A local filesystem I/O error.
    Local(io::Error),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Local(e) => write!(f, "local I/O error: {e}"),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BackendError::Local(e) => Some(e),
        }
    }
}

/// Errors that can occur while reading a table location.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    /// The specified path was not found.
    #[snafu(display("Path not found: {path}"))]
    NotFound {
        /// The path that was not found.
        path: String,
        /// Underlying backend error that caused the failure.
        source: BackendError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// An I/O error other than "not found" occurred on the local filesystem.
    #[snafu(display("Local I/O error at {path}: {source}"))]
    OtherIo {
        /// The path where the I/O error occurred.
        path: String,
        /// Underlying backend I/O error with platform-specific details.
        source: BackendError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The location names a remote scheme; only local and mounted paths are read.
    #[snafu(display(
        "Unsupported table location '{spec}': scheme '{scheme}' is remote; \
         only local or mounted paths are supported"
    ))]
    RemoteUnsupported {
        /// The URL scheme that was rejected (for example `s3`).
        scheme: String,
        /// The full location string supplied by the caller.
        spec: String,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The location string was empty after trimming.
    #[snafu(display("Table location is empty"))]
    EmptyLocation {
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },
}

impl StorageError {
    /// Returns true when the error means the path does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}
