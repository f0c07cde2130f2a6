//! Small Iceberg tables written to a local directory, for tests.
//!
//! Tables are laid out the way file-system catalogs lay them out: every
//! commit writes `metadata/v<N>.metadata.json` and rewrites
//! `metadata/version-hint.text`; data files go under `data/`. The first
//! metadata file (`v1`) describes the empty table.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use arrow::array::{ArrayRef, Float64Array, RecordBatch, StringArray, TimestampMicrosecondArray};
use async_trait::async_trait;
use iceberg::{
    Catalog, Error, ErrorKind, Namespace, NamespaceIdent, Result, TableCommit, TableCreation,
    TableIdent,
    arrow::schema_to_arrow_schema,
    io::{FileIO, FileIOBuilder},
    spec::{
        DataFile, DataFileFormat, NestedField, PrimitiveType, Schema, TableMetadata,
        TableMetadataBuilder, Type,
    },
    table::Table,
    transaction::Transaction,
    writer::{
        IcebergWriter, IcebergWriterBuilder,
        base_writer::data_file_writer::DataFileWriterBuilder,
        file_writer::{
            ParquetWriterBuilder,
            location_generator::{DefaultFileNameGenerator, DefaultLocationGenerator},
        },
    },
};
use parquet::file::properties::WriterProperties;

/// One row of the e-commerce orders table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderRow {
    /// Order identifier.
    pub order_id: &'static str,
    /// Customer identifier.
    pub customer_id: &'static str,
    /// Order time, microseconds since the epoch.
    pub timestamp_micros: i64,
    /// Order total.
    pub total_amount: f64,
    /// Fulfilment status.
    pub status: &'static str,
    /// Payment method.
    pub payment_method: &'static str,
}

/// Five orders across three customers, two statuses and two payment methods.
pub const SAMPLE_ORDERS: [OrderRow; 5] = [
    OrderRow {
        order_id: "o-1",
        customer_id: "c-1",
        timestamp_micros: 1_700_000_000_000_000,
        total_amount: 100.0,
        status: "shipped",
        payment_method: "card",
    },
    OrderRow {
        order_id: "o-2",
        customer_id: "c-2",
        timestamp_micros: 1_700_000_060_000_000,
        total_amount: 50.5,
        status: "pending",
        payment_method: "paypal",
    },
    OrderRow {
        order_id: "o-3",
        customer_id: "c-1",
        timestamp_micros: 1_700_000_120_000_000,
        total_amount: 25.25,
        status: "shipped",
        payment_method: "card",
    },
    OrderRow {
        order_id: "o-4",
        customer_id: "c-3",
        timestamp_micros: 1_700_000_180_000_000,
        total_amount: 10.0,
        status: "shipped",
        payment_method: "card",
    },
    OrderRow {
        order_id: "o-5",
        customer_id: "c-2",
        timestamp_micros: 1_700_000_240_000_000,
        total_amount: 74.75,
        status: "pending",
        payment_method: "card",
    },
];

/// Column names of the orders table, in schema order.
pub const ORDER_COLUMNS: [&str; 6] = [
    "order_id",
    "customer_id",
    "timestamp",
    "total_amount",
    "status",
    "payment_method",
];

/// Files written by [`write_orders_table`].
#[derive(Debug, Clone)]
pub struct FixtureTable {
    /// Table root; holds `metadata/` and `data/`.
    pub root: PathBuf,
    /// Metadata file of every version, `v1` (empty table) first.
    pub metadata_files: Vec<PathBuf>,
    /// Snapshot id produced by each data commit, in commit order.
    pub snapshot_ids: Vec<i64>,
}

impl FixtureTable {
    /// Metadata file of the latest version.
    pub fn current_metadata(&self) -> &Path {
        self.metadata_files
            .last()
            .map(PathBuf::as_path)
            .unwrap_or(self.root.as_path())
    }
}

/// Iceberg schema of the orders table.
pub fn orders_schema() -> Result<Schema> {
    let string = || Type::Primitive(PrimitiveType::String);
    Schema::builder()
        .with_schema_id(0)
        .with_fields(vec![
            NestedField::required(1, ORDER_COLUMNS[0], string()).into(),
            NestedField::required(2, ORDER_COLUMNS[1], string()).into(),
            NestedField::required(3, ORDER_COLUMNS[2], Type::Primitive(PrimitiveType::Timestamp))
                .into(),
            NestedField::required(4, ORDER_COLUMNS[3], Type::Primitive(PrimitiveType::Double))
                .into(),
            NestedField::required(5, ORDER_COLUMNS[4], string()).into(),
            NestedField::required(6, ORDER_COLUMNS[5], string()).into(),
        ])
        .build()
}

/// Create an orders table at `root` and append one data file per entry of
/// `commits`, each as its own snapshot.
///
/// `root` must be an absolute UTF-8 path. It is created if missing.
pub async fn write_orders_table(root: &Path, commits: &[&[OrderRow]]) -> Result<FixtureTable> {
    let location = utf8_path(root)?;
    let file_io = FileIOBuilder::new_fs_io().build()?;

    let creation = TableCreation::builder()
        .name("orders".to_string())
        .location(location)
        .schema(orders_schema()?)
        .build();
    let metadata = TableMetadataBuilder::from_table_creation(creation)?
        .build()?
        .metadata;

    let first = write_metadata(root, 1, &metadata)?;
    let ident = TableIdent::new(
        NamespaceIdent::new("fixtures".to_string()),
        "orders".to_string(),
    );
    let mut table = table_at(ident, metadata.clone(), &first, file_io.clone())?;

    let catalog = HintedFsCatalog {
        root: root.to_path_buf(),
        file_io,
        state: Mutex::new(CatalogState {
            version: 1,
            metadata,
        }),
    };

    let mut fixture = FixtureTable {
        root: root.to_path_buf(),
        metadata_files: vec![first],
        snapshot_ids: Vec::with_capacity(commits.len()),
    };

    for (idx, rows) in commits.iter().enumerate() {
        let data_files = write_data_file(&table, &format!("commit-{}", idx + 1), rows).await?;

        let mut append = Transaction::new(&table).fast_append(None, vec![])?;
        append.add_data_files(data_files)?;
        let tx = append.apply().await?;
        let committed = tx.commit(&catalog).await?;

        if let Some(location) = committed.metadata_location() {
            fixture.metadata_files.push(PathBuf::from(location));
        }
        if let Some(snapshot) = committed.metadata().current_snapshot() {
            fixture.snapshot_ids.push(snapshot.snapshot_id());
        }
        table = committed;
    }

    Ok(fixture)
}

fn orders_batch(table: &Table, rows: &[OrderRow]) -> Result<RecordBatch> {
    let schema = Arc::new(schema_to_arrow_schema(table.metadata().current_schema())?);
    let strings = |f: fn(&OrderRow) -> &'static str| -> ArrayRef {
        Arc::new(StringArray::from_iter_values(rows.iter().map(f)))
    };

    let batch = RecordBatch::try_new(
        schema,
        vec![
            strings(|r| r.order_id),
            strings(|r| r.customer_id),
            Arc::new(TimestampMicrosecondArray::from_iter_values(
                rows.iter().map(|r| r.timestamp_micros),
            )),
            Arc::new(Float64Array::from_iter_values(
                rows.iter().map(|r| r.total_amount),
            )),
            strings(|r| r.status),
            strings(|r| r.payment_method),
        ],
    )?;
    Ok(batch)
}

async fn write_data_file(table: &Table, prefix: &str, rows: &[OrderRow]) -> Result<Vec<DataFile>> {
    let batch = orders_batch(table, rows)?;

    let parquet_writer = ParquetWriterBuilder::new(
        WriterProperties::default(),
        table.metadata().current_schema().clone(),
        table.file_io().clone(),
        DefaultLocationGenerator::new(table.metadata().clone())?,
        DefaultFileNameGenerator::new(prefix.to_string(), None, DataFileFormat::Parquet),
    );
    let mut writer = DataFileWriterBuilder::new(parquet_writer, None, 0)
        .build()
        .await?;
    writer.write(batch).await?;
    writer.close().await
}

fn utf8_path(path: &Path) -> Result<String> {
    path.to_str().map(str::to_string).ok_or_else(|| {
        Error::new(
            ErrorKind::DataInvalid,
            format!("fixture path {} is not UTF-8", path.display()),
        )
    })
}

fn write_metadata(root: &Path, version: u64, metadata: &TableMetadata) -> Result<PathBuf> {
    let dir = root.join("metadata");
    std::fs::create_dir_all(&dir)?;

    let path = dir.join(format!("v{version}.metadata.json"));
    std::fs::write(&path, serde_json::to_vec(metadata)?)?;
    std::fs::write(dir.join("version-hint.text"), version.to_string())?;
    Ok(path)
}

fn table_at(
    ident: TableIdent,
    metadata: TableMetadata,
    metadata_file: &Path,
    file_io: FileIO,
) -> Result<Table> {
    Table::builder()
        .identifier(ident)
        .metadata(metadata)
        .metadata_location(utf8_path(metadata_file)?)
        .file_io(file_io)
        .build()
}

#[derive(Debug)]
struct CatalogState {
    version: u64,
    metadata: TableMetadata,
}

/// Single-table catalog that commits by writing the next `v<N>` file and
/// pointing the version hint at it. Requirements are not checked.
#[derive(Debug)]
struct HintedFsCatalog {
    root: PathBuf,
    file_io: FileIO,
    state: Mutex<CatalogState>,
}

fn unsupported<T>(op: &str) -> Result<T> {
    Err(Error::new(
        ErrorKind::FeatureUnsupported,
        format!("{op} is not supported by the fixture catalog"),
    ))
}

#[async_trait]
impl Catalog for HintedFsCatalog {
    async fn list_namespaces(&self, _parent: Option<&NamespaceIdent>) -> Result<Vec<NamespaceIdent>> {
        unsupported("list_namespaces")
    }

    async fn create_namespace(
        &self,
        _namespace: &NamespaceIdent,
        _properties: HashMap<String, String>,
    ) -> Result<Namespace> {
        unsupported("create_namespace")
    }

    async fn get_namespace(&self, _namespace: &NamespaceIdent) -> Result<Namespace> {
        unsupported("get_namespace")
    }

    async fn namespace_exists(&self, _namespace: &NamespaceIdent) -> Result<bool> {
        unsupported("namespace_exists")
    }

    async fn update_namespace(
        &self,
        _namespace: &NamespaceIdent,
        _properties: HashMap<String, String>,
    ) -> Result<()> {
        unsupported("update_namespace")
    }

    async fn drop_namespace(&self, _namespace: &NamespaceIdent) -> Result<()> {
        unsupported("drop_namespace")
    }

    async fn list_tables(&self, _namespace: &NamespaceIdent) -> Result<Vec<TableIdent>> {
        unsupported("list_tables")
    }

    async fn create_table(
        &self,
        _namespace: &NamespaceIdent,
        _creation: TableCreation,
    ) -> Result<Table> {
        unsupported("create_table")
    }

    async fn load_table(&self, _table: &TableIdent) -> Result<Table> {
        unsupported("load_table")
    }

    async fn drop_table(&self, _table: &TableIdent) -> Result<()> {
        unsupported("drop_table")
    }

    async fn table_exists(&self, _table: &TableIdent) -> Result<bool> {
        unsupported("table_exists")
    }

    async fn rename_table(&self, _src: &TableIdent, _dest: &TableIdent) -> Result<()> {
        unsupported("rename_table")
    }

    async fn update_table(&self, mut commit: TableCommit) -> Result<Table> {
        let (metadata, metadata_file) = {
            let mut state = self.state.lock().map_err(|_| {
                Error::new(ErrorKind::Unexpected, "fixture catalog state is poisoned")
            })?;

            let current_file = self
                .root
                .join("metadata")
                .join(format!("v{}.metadata.json", state.version));
            let mut builder = state
                .metadata
                .clone()
                .into_builder(Some(utf8_path(&current_file)?));
            for update in commit.take_updates() {
                builder = update.apply(builder)?;
            }
            let metadata = builder.build()?.metadata;

            let version = state.version + 1;
            let metadata_file = write_metadata(&self.root, version, &metadata)?;
            state.version = version;
            state.metadata = metadata.clone();
            (metadata, metadata_file)
        };

        table_at(
            commit.identifier().clone(),
            metadata,
            &metadata_file,
            self.file_io.clone(),
        )
    }
}
