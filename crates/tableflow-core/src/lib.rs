//! Metadata resolution core for Iceberg tables on local or mounted filesystems.
//!
//! This crate answers one question: given a table root, which
//! `metadata/v<N>.metadata.json` file describes the table's current state?
//!
//! - On-disk naming conventions for the `metadata/` directory (`layout` module).
//! - Read-only local filesystem access with typed errors (`storage` module).
//! - Two-tier metadata version resolution: the `version-hint.text` pointer
//!   first, a directory scan for the highest `v<N>.metadata.json` when the
//!   pointer is absent (`locator` module).
//! - Locating a single table directory under a base directory that holds
//!   many tables (`discovery` module).
//!
//! Everything here is synchronous and never writes to the table. Loading the
//! resolved snapshot and querying it lives in `tableflow-datafusion`.
#![deny(missing_docs)]
pub mod discovery;
pub mod layout;
pub mod locator;
pub mod storage;

pub use discovery::{DiscoveryError, TableSelector, discover_table};
pub use locator::{
    LocatorError, ResolutionStrategy, ResolutionTier, ResolvedMetadata, resolve,
    resolve_metadata_path,
};
pub use storage::{StorageError, TableLocation};
