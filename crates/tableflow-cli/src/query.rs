use std::{io::Write, time::Duration};

use arrow::{
    error::ArrowError,
    util::display::{ArrayFormatter, FormatOptions},
};
use snafu::ResultExt;
use tableflow_datafusion::{
    BatteryReport, TabularResult,
    pretty::{DEFAULT_FLOAT_MAX_DECIMALS, compact_float_batch, render_report},
};
use tabled::{builder::Builder, settings::Style};

use crate::error::{ArrowSnafu, CliResult, OutputSnafu};

const RULE_WIDTH: usize = 80;

#[derive(Debug, Clone)]
pub struct QueryOpts {
    pub max_rows: usize,
    pub timing: bool,
}

/// Column names plus up to `max_rows` formatted rows of a result.
#[derive(Debug, Clone)]
pub struct Preview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
}

pub fn build_preview(res: &TabularResult, max_rows: usize) -> CliResult<Preview> {
    let mut rows = Vec::new();
    let mut rows_left = max_rows;
    let options = FormatOptions::default();

    for batch in &res.batches {
        if rows_left == 0 {
            break;
        }
        let batch = compact_float_batch(batch, DEFAULT_FLOAT_MAX_DECIMALS).context(ArrowSnafu)?;
        let formatters = batch
            .columns()
            .iter()
            .map(|col| ArrayFormatter::try_new(col.as_ref(), &options))
            .collect::<Result<Vec<_>, ArrowError>>()
            .context(ArrowSnafu)?;

        let take = rows_left.min(batch.num_rows());
        for row_idx in 0..take {
            let mut row = Vec::with_capacity(formatters.len());
            for formatter in &formatters {
                row.push(formatter.value(row_idx).try_to_string().context(ArrowSnafu)?);
            }
            rows.push(row);
        }
        rows_left -= take;
    }

    Ok(Preview {
        columns: res.column_names(),
        rows,
        total_rows: res.num_rows(),
    })
}

fn render_table(columns: &[String], rows: &[Vec<String>]) -> String {
    if columns.is_empty() {
        return String::new();
    }

    let mut builder = Builder::default();
    builder.push_record(columns);
    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

pub fn write_query_result<W: Write>(
    res: &TabularResult,
    opts: &QueryOpts,
    elapsed: Option<Duration>,
    out: &mut W,
) -> CliResult<()> {
    let preview = build_preview(res, opts.max_rows)?;

    if !preview.rows.is_empty() || opts.max_rows == 0 {
        writeln!(out, "{}", render_table(&preview.columns, &preview.rows)).context(OutputSnafu)?;
    }

    if preview.total_rows == 0 {
        writeln!(out, "(no rows)").context(OutputSnafu)?;
    } else if opts.max_rows == 0 {
        writeln!(out, "(preview suppressed; use --max-rows > 0)").context(OutputSnafu)?;
    }

    writeln!(out, "total_rows: {}", preview.total_rows).context(OutputSnafu)?;
    if let Some(d) = elapsed.filter(|_| opts.timing) {
        writeln!(out, "elapsed_ms: {}", d.as_millis()).context(OutputSnafu)?;
    }
    Ok(())
}

pub fn write_battery<W: Write>(
    metadata_path: &str,
    reports: &[BatteryReport],
    out: &mut W,
) -> CliResult<()> {
    let rule = "=".repeat(RULE_WIDTH);

    writeln!(out, "{rule}").context(OutputSnafu)?;
    writeln!(out, "ICEBERG TABLE ANALYTICS").context(OutputSnafu)?;
    writeln!(out, "metadata: {metadata_path}").context(OutputSnafu)?;
    writeln!(out, "{rule}\n").context(OutputSnafu)?;

    for report in reports {
        let rendered = render_report(report).context(ArrowSnafu)?;
        writeln!(out, "{rendered}\n").context(OutputSnafu)?;
    }

    writeln!(out, "{rule}").context(OutputSnafu)?;
    writeln!(out, "Query completed successfully!").context(OutputSnafu)?;
    writeln!(out, "{rule}").context(OutputSnafu)?;
    Ok(())
}
