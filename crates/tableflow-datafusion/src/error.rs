//! Error types for loading snapshots and running queries.
//!
//! Collaborator errors (`iceberg::Error`, `DataFusionError`, `ArrowError`)
//! are kept as sources so callers see the full chain unchanged.

use arrow::error::ArrowError;
use datafusion::error::DataFusionError;
use snafu::{Backtrace, prelude::*};

/// Errors from [`crate::load_snapshot`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum LoadError {
    /// The metadata path cannot be handed to the table reader.
    #[snafu(display("Metadata path is not valid UTF-8: {path}"))]
    NonUtf8Path {
        /// Lossy rendering of the path.
        path: String,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },

    /// Local file IO for the table reader could not be set up.
    #[snafu(display("Failed to set up local file IO: {source}"))]
    FileIo {
        /// Underlying table reader error.
        source: iceberg::Error,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },

    /// The metadata file could not be read or parsed.
    #[snafu(display("Failed to open table metadata at {path}: {source}"))]
    OpenTable {
        /// Metadata file path.
        path: String,
        /// Underlying table reader error.
        source: iceberg::Error,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },

    /// The table schema has no Arrow equivalent.
    #[snafu(display("Failed to convert table schema to Arrow: {source}"))]
    ArrowSchema {
        /// Underlying table reader error.
        source: iceberg::Error,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },

    /// Planning or reading the snapshot's data files failed.
    #[snafu(display("Failed to scan snapshot of {path}: {source}"))]
    Scan {
        /// Metadata file path.
        path: String,
        /// Underlying table reader error.
        source: iceberg::Error,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },
}

/// Errors from [`crate::AnalyticsSession`] and [`crate::QueryBattery`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum QueryError {
    /// The dataset could not be registered as a table.
    #[snafu(display("Failed to register table {table}: {source}"))]
    Register {
        /// SQL table name.
        table: String,
        /// Underlying DataFusion error.
        source: DataFusionError,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },

    /// The SQL text could not be parsed or planned.
    #[snafu(display("Failed to plan query: {source}\n  sql: {sql}"))]
    Plan {
        /// The SQL text.
        sql: String,
        /// Underlying DataFusion error.
        source: DataFusionError,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },

    /// Executing a planned query failed.
    #[snafu(display("Failed to execute query: {source}\n  sql: {sql}"))]
    Execute {
        /// The SQL text.
        sql: String,
        /// Underlying DataFusion error.
        source: DataFusionError,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },

    /// A battery query failed; wraps the underlying error with its title.
    #[snafu(display("Query '{title}' failed: {source}"))]
    Battery {
        /// Title of the failing battery query.
        title: String,
        /// Underlying query error.
        #[snafu(source(from(QueryError, Box::new)))]
        source: Box<QueryError>,
    },

    /// Arrow error while rendering results.
    #[snafu(display("Failed to render query result: {source}"))]
    Render {
        /// Underlying Arrow error.
        source: ArrowError,
        /// Backtrace for debugging.
        backtrace: Backtrace,
    },
}
