//! Analytics over a resolved Iceberg snapshot.
//!
//! This crate keeps every Iceberg, Arrow, and DataFusion type out of
//! `tableflow-core`. It takes the metadata file path produced by the core
//! locator and:
//!
//! 1. opens the table at that metadata version and materializes every live
//!    data file of the current snapshot as Arrow record batches
//!    ([`load_snapshot`]),
//! 2. registers the batches as an in-memory table in a DataFusion session
//!    ([`AnalyticsSession`]),
//! 3. runs a fixed battery of read-only aggregate queries ([`QueryBattery`]),
//! 4. renders results for humans ([`pretty`]).
#![deny(missing_docs)]

mod battery;
mod error;
#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;
pub mod pretty;
mod session;
mod snapshot;

pub use battery::{BatteryQuery, BatteryReport, QueryBattery};
pub use error::{LoadError, QueryError};
pub use session::{AnalyticsSession, DEFAULT_TABLE_NAME, TabularResult, quote_identifier};
pub use snapshot::{TabularDataset, load_snapshot};
