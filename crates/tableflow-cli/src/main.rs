//! `tfq`: locate the current snapshot of an Iceberg table on a local or
//! mounted filesystem and run analytics against it.

mod engine;
mod error;
mod logging;
mod query;

use std::{
    io::Write,
    path::{Path, PathBuf},
    time::Instant,
};

use clap::{Parser, Subcommand};
use snafu::ResultExt;
use tableflow_core::{ResolvedMetadata, TableLocation, TableSelector, discover_table, resolve};

use crate::{
    engine::{DataFusionEngine, Engine},
    error::{
        CliError, CliResult, DiscoverSnafu, InvalidLocationSnafu, OutputSnafu, ResolveSnafu,
    },
    query::{QueryOpts, write_battery, write_query_result},
};

const DEFAULT_BASE_DIR: &str = "/tableflow/warpstream/_tableflow";
const DEFAULT_TABLE_FRAGMENT: &str = "ecommerce-orders";

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the current metadata file of a table root
    Resolve {
        /// Table root (directory containing `metadata/`), or a file:// URL
        #[arg(long)]
        table: String,
    },

    /// Find the single table directory under a base directory
    Discover {
        #[arg(long, env = "TFQ_BASE_DIR", default_value = DEFAULT_BASE_DIR)]
        base: PathBuf,

        /// Substring of the table directory name
        #[arg(long)]
        name: String,

        /// Require the directory name to equal --name
        #[arg(long, default_value_t = false)]
        exact: bool,
    },

    /// Resolve, load, and run the e-commerce analytics battery
    Analyze {
        /// Table root; when omitted the table is discovered under --base
        #[arg(long)]
        table: Option<String>,

        #[arg(long, env = "TFQ_BASE_DIR", default_value = DEFAULT_BASE_DIR)]
        base: PathBuf,

        #[arg(long, default_value = DEFAULT_TABLE_FRAGMENT)]
        name: String,

        #[arg(long, default_value_t = false)]
        exact: bool,
    },

    /// Execute ad hoc SQL against the current snapshot (registered as `orders`)
    Query {
        #[arg(long)]
        table: String,

        #[arg(long)]
        sql: String,

        #[arg(long, default_value_t = 10)]
        max_rows: usize,

        #[arg(long, default_value_t = false)]
        timing: bool,
    },
}

#[derive(Debug, Parser)]
#[command(name = "tfq", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

fn selector(name: String, exact: bool) -> TableSelector {
    if exact {
        TableSelector::Exact(name)
    } else {
        TableSelector::Contains(name)
    }
}

fn resolve_table(spec: &str) -> CliResult<ResolvedMetadata> {
    let location = TableLocation::parse(spec).context(InvalidLocationSnafu {
        spec: spec.to_string(),
    })?;
    resolve(&location).context(ResolveSnafu {
        table: location.to_string(),
    })
}

fn discover(base: &Path, name: String, exact: bool) -> CliResult<PathBuf> {
    discover_table(base, &selector(name, exact)).context(DiscoverSnafu)
}

fn cmd_resolve(table: &str) -> CliResult<()> {
    let resolved = resolve_table(table)?;

    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", resolved.path.display()).context(OutputSnafu)?;
    writeln!(out, "tier: {}", resolved.tier).context(OutputSnafu)?;
    writeln!(out, "version: {}", resolved.version).context(OutputSnafu)?;
    Ok(())
}

fn cmd_discover(base: &Path, name: String, exact: bool) -> CliResult<()> {
    let table = discover(base, name, exact)?;
    println!("{}", table.display());
    Ok(())
}

async fn cmd_analyze_with_engine(
    engine: &dyn Engine<Error = CliError>,
    resolved: &ResolvedMetadata,
) -> CliResult<()> {
    let session = engine.open_snapshot(&resolved.path).await?;
    if let Some(name) = session.table_name() {
        tracing::debug!(table = name, "registered snapshot");
    }

    let reports = session.run_battery().await?;

    let mut out = std::io::stdout().lock();
    write_battery(&resolved.path.display().to_string(), &reports, &mut out)
}

async fn cmd_analyze(
    table: Option<String>,
    base: &Path,
    name: String,
    exact: bool,
) -> CliResult<()> {
    let table = match table {
        Some(table) => table,
        None => {
            let found = discover(base, name, exact)?;
            eprintln!("Found table: {}", found.display());
            found.display().to_string()
        }
    };

    let resolved = resolve_table(&table)?;
    eprintln!(
        "Using metadata: {} ({}, version {})",
        resolved.path.display(),
        resolved.tier,
        resolved.version
    );

    cmd_analyze_with_engine(&DataFusionEngine, &resolved).await
}

async fn cmd_query(table: &str, sql: &str, opts: QueryOpts) -> CliResult<()> {
    let resolved = resolve_table(table)?;
    let session = DataFusionEngine.open_snapshot(&resolved.path).await?;

    let start = Instant::now();
    let res = session.run_query(sql).await?;
    let elapsed = start.elapsed();

    let mut out = std::io::stdout().lock();
    write_query_result(&res, &opts, Some(elapsed), &mut out)
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::Resolve { table } => cmd_resolve(&table),

        Command::Discover { base, name, exact } => cmd_discover(&base, name, exact),

        Command::Analyze {
            table,
            base,
            name,
            exact,
        } => cmd_analyze(table, &base, name, exact).await,

        Command::Query {
            table,
            sql,
            max_rows,
            timing,
        } => cmd_query(&table, &sql, QueryOpts { max_rows, timing }).await,
    }
}

#[tokio::main]
async fn main() {
    logging::init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
