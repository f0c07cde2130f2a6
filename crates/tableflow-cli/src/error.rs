use arrow::error::ArrowError;
use snafu::Snafu;
use tableflow_core::{DiscoveryError, LocatorError, StorageError};
use tableflow_datafusion::{LoadError, QueryError};

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("Invalid --table '{spec}': {source}"))]
    InvalidLocation { spec: String, source: StorageError },

    #[snafu(display("Could not find a table under the base directory: {source}"))]
    Discover { source: DiscoveryError },

    #[snafu(display("Could not resolve current metadata for {table}: {source}"))]
    Resolve {
        table: String,
        #[snafu(source(from(LocatorError, Box::new)))]
        source: Box<LocatorError>,
    },

    #[snafu(display(
        "Could not load snapshot from {path}. \
         Ensure the metadata file exists and its data files are on a local path: {source}"
    ))]
    Load {
        path: String,
        #[snafu(source(from(LoadError, Box::new)))]
        source: Box<LoadError>,
    },

    #[snafu(display("{source}"))]
    Query {
        #[snafu(source(from(QueryError, Box::new)))]
        source: Box<QueryError>,
    },

    #[snafu(display("Failed to format query output: {source}"))]
    Arrow { source: ArrowError },

    #[snafu(display("Failed to write output: {source}"))]
    Output { source: std::io::Error },
}
