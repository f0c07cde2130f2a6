//! Materializing one Iceberg snapshot as Arrow record batches.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use arrow::{array::RecordBatch, datatypes::SchemaRef};
use futures::TryStreamExt;
use iceberg::{
    NamespaceIdent, TableIdent, arrow::schema_to_arrow_schema, io::FileIOBuilder,
    table::StaticTable,
};
use snafu::prelude::*;

use crate::{
    error::{
        ArrowSchemaSnafu, FileIoSnafu, LoadError, NonUtf8PathSnafu, OpenTableSnafu, ScanSnafu,
    },
    session::DEFAULT_TABLE_NAME,
};

/// Namespace used for the identifier of statically opened tables. It has no
/// meaning outside this process.
const STATIC_NAMESPACE: &str = "tableflow";

/// All live rows of one snapshot, held in memory.
#[derive(Debug, Clone)]
pub struct TabularDataset {
    metadata_path: PathBuf,
    snapshot_id: Option<i64>,
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl TabularDataset {
    /// Build a dataset from batches that share `schema`.
    ///
    /// `metadata_path` only labels the dataset; nothing is read from it.
    pub fn from_batches(
        metadata_path: impl Into<PathBuf>,
        schema: SchemaRef,
        batches: Vec<RecordBatch>,
    ) -> Self {
        Self {
            metadata_path: metadata_path.into(),
            snapshot_id: None,
            schema,
            batches,
        }
    }

    /// Metadata file this dataset was loaded from.
    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    /// Snapshot id of the loaded snapshot; `None` for a table with no commits
    /// or a dataset built by hand.
    pub fn snapshot_id(&self) -> Option<i64> {
        self.snapshot_id
    }

    /// Arrow schema of the rows.
    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    /// Materialized record batches.
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Total number of rows across all batches.
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }
}

/// Open the table at `metadata_path` and read every live data file of its
/// current snapshot into memory.
///
/// The path must point at a `v<N>.metadata.json` file on the local
/// filesystem. Data files referenced by the metadata are read through the
/// same local file IO.
pub async fn load_snapshot(metadata_path: &Path) -> Result<TabularDataset, LoadError> {
    let path = metadata_path.display().to_string();
    let location = metadata_path.to_str().context(NonUtf8PathSnafu {
        path: path.as_str(),
    })?;

    let file_io = FileIOBuilder::new_fs_io().build().context(FileIoSnafu)?;
    let ident = TableIdent::new(
        NamespaceIdent::new(STATIC_NAMESPACE.to_string()),
        DEFAULT_TABLE_NAME.to_string(),
    );

    let table = StaticTable::from_metadata_file(location, ident, file_io)
        .await
        .context(OpenTableSnafu {
            path: path.as_str(),
        })?
        .into_table();

    let metadata = table.metadata();
    let snapshot_id = metadata.current_snapshot().map(|s| s.snapshot_id());
    let table_schema = Arc::new(
        schema_to_arrow_schema(metadata.current_schema()).context(ArrowSchemaSnafu)?,
    );

    tracing::debug!(
        path = %path,
        format_version = ?metadata.format_version(),
        snapshot_id = ?snapshot_id,
        "opened table metadata"
    );

    let scan = table
        .scan()
        .select_all()
        .build()
        .context(ScanSnafu {
            path: path.as_str(),
        })?;
    let batches: Vec<RecordBatch> = scan
        .to_arrow()
        .await
        .context(ScanSnafu {
            path: path.as_str(),
        })?
        .try_collect()
        .await
        .context(ScanSnafu {
            path: path.as_str(),
        })?;

    // Batches carry reader field metadata; register with their schema so the
    // in-memory table accepts them.
    let schema = batches
        .first()
        .map(RecordBatch::schema)
        .unwrap_or(table_schema);

    let dataset = TabularDataset {
        metadata_path: metadata_path.to_path_buf(),
        snapshot_id,
        schema,
        batches,
    };

    tracing::info!(
        path = %path,
        rows = dataset.num_rows(),
        batches = dataset.batches.len(),
        "loaded snapshot into memory"
    );

    Ok(dataset)
}
