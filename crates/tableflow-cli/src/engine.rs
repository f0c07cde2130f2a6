use std::path::Path;

use snafu::ResultExt;
use tableflow_datafusion::{
    AnalyticsSession, BatteryReport, QueryBattery, TabularResult, load_snapshot,
};

use crate::error::{CliError, LoadSnafu, QuerySnafu};

/// A query session over one loaded snapshot.
#[async_trait::async_trait]
pub trait QuerySession: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn run_query(&self, sql: &str) -> Result<TabularResult, Self::Error>;

    /// Run the fixed analytics battery against the snapshot.
    async fn run_battery(&self) -> Result<Vec<BatteryReport>, Self::Error>;

    /// Table identifier registered in the session.
    fn table_name(&self) -> Option<&str> {
        None
    }
}

/// Loads a resolved metadata file into a queryable session.
#[async_trait::async_trait]
pub trait Engine: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn open_snapshot(
        &self,
        metadata_path: &Path,
    ) -> Result<Box<dyn QuerySession<Error = Self::Error>>, Self::Error>;
}

/// Iceberg reader + DataFusion in-memory engine.
pub struct DataFusionEngine;

pub struct DataFusionSession {
    session: AnalyticsSession,
}

#[async_trait::async_trait]
impl QuerySession for DataFusionSession {
    type Error = CliError;

    async fn run_query(&self, sql: &str) -> Result<TabularResult, Self::Error> {
        self.session.query(sql).await.context(QuerySnafu)
    }

    async fn run_battery(&self) -> Result<Vec<BatteryReport>, Self::Error> {
        QueryBattery::ecommerce_orders(self.session.table_name())
            .run(&self.session)
            .await
            .context(QuerySnafu)
    }

    fn table_name(&self) -> Option<&str> {
        Some(self.session.table_name())
    }
}

#[async_trait::async_trait]
impl Engine for DataFusionEngine {
    type Error = CliError;

    async fn open_snapshot(
        &self,
        metadata_path: &Path,
    ) -> Result<Box<dyn QuerySession<Error = Self::Error>>, Self::Error> {
        let dataset = load_snapshot(metadata_path).await.context(LoadSnafu {
            path: metadata_path.display().to_string(),
        })?;
        let session = AnalyticsSession::new(&dataset).context(QuerySnafu)?;

        Ok(Box::new(DataFusionSession { session }))
    }
}
