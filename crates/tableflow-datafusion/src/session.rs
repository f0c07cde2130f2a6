//! DataFusion session over an in-memory snapshot.

use std::sync::Arc;

use arrow::{array::RecordBatch, datatypes::SchemaRef};
use datafusion::{
    datasource::MemTable,
    prelude::{SessionConfig, SessionContext},
};
use snafu::prelude::*;

use crate::{
    error::{ExecuteSnafu, PlanSnafu, QueryError, RegisterSnafu},
    snapshot::TabularDataset,
};

/// SQL name under which a loaded snapshot is registered.
pub const DEFAULT_TABLE_NAME: &str = "orders";

/// Quote a SQL identifier, escaping embedded double quotes.
pub fn quote_identifier(name: &str) -> String {
    let escaped = name.replace('"', "\"\"");
    format!("\"{escaped}\"")
}

/// Rows and schema returned by one query.
#[derive(Debug, Clone)]
pub struct TabularResult {
    /// Output schema, available even when no rows were produced.
    pub schema: SchemaRef,
    /// Output batches in result order.
    pub batches: Vec<RecordBatch>,
}

impl TabularResult {
    /// Total number of rows across all batches.
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    /// Output column names in order.
    pub fn column_names(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect()
    }
}

/// A DataFusion session with one snapshot registered as an in-memory table.
///
/// The session holds its own references to the dataset's batches; the
/// snapshot it sees never changes, so repeated queries are deterministic.
pub struct AnalyticsSession {
    ctx: SessionContext,
    table_name: String,
}

impl AnalyticsSession {
    /// Register `dataset` as [`DEFAULT_TABLE_NAME`].
    pub fn new(dataset: &TabularDataset) -> Result<Self, QueryError> {
        Self::with_table_name(dataset, DEFAULT_TABLE_NAME)
    }

    /// Register `dataset` under a caller-chosen table name.
    pub fn with_table_name(dataset: &TabularDataset, table_name: &str) -> Result<Self, QueryError> {
        let provider = MemTable::try_new(dataset.schema(), vec![dataset.batches().to_vec()])
            .context(RegisterSnafu { table: table_name })?;

        let ctx = SessionContext::new_with_config(SessionConfig::new());
        ctx.register_table(table_name, Arc::new(provider))
            .context(RegisterSnafu { table: table_name })?;

        tracing::debug!(
            table = table_name,
            rows = dataset.num_rows(),
            "registered snapshot as in-memory table"
        );

        Ok(Self {
            ctx,
            table_name: table_name.to_string(),
        })
    }

    /// Name under which the snapshot is registered.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Plan and execute `sql`, collecting every output batch.
    pub async fn query(&self, sql: &str) -> Result<TabularResult, QueryError> {
        let df = self.ctx.sql(sql).await.context(PlanSnafu { sql })?;
        let schema: SchemaRef = Arc::clone(df.schema().inner());
        let batches = df.collect().await.context(ExecuteSnafu { sql })?;

        Ok(TabularResult { schema, batches })
    }
}
