//! Human-facing rendering of query results.
//!
//! Aggregates such as `AVG(total_amount)` produce `f64` values whose full
//! binary representation shows up as `115.38499999999999` in Arrow's pretty
//! printer. Floating point columns are rewritten as compact decimal strings
//! (at most [`DEFAULT_FLOAT_MAX_DECIMALS`] places, trailing zeros trimmed)
//! before the table is drawn.

use std::sync::Arc;

use arrow::{
    array::{Array, ArrayRef, AsArray, RecordBatch, StringArray},
    datatypes::{DataType, Field, Float32Type, Float64Type, Schema},
    error::ArrowError,
    util::pretty::pretty_format_batches,
};

use crate::{battery::BatteryReport, session::TabularResult};

/// Default maximum number of decimal places used for `f32`/`f64` values.
pub const DEFAULT_FLOAT_MAX_DECIMALS: usize = 6;

/// Format `value` with at most `max_decimals` places, trimming trailing zeros.
pub fn format_compact_float(value: f64, max_decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let prec = max_decimals.min(15);
    let mut s = format!("{value:.prec$}");
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }

    if s == "-0" {
        s = "0".to_string();
    }

    s
}

fn compact_column(array: &ArrayRef, max_decimals: usize) -> Option<ArrayRef> {
    let strings: StringArray = match array.data_type() {
        DataType::Float64 => array
            .as_primitive::<Float64Type>()
            .iter()
            .map(|v| v.map(|v| format_compact_float(v, max_decimals)))
            .collect(),
        DataType::Float32 => array
            .as_primitive::<Float32Type>()
            .iter()
            .map(|v| v.map(|v| format_compact_float(f64::from(v), max_decimals)))
            .collect(),
        _ => return None,
    };
    Some(Arc::new(strings))
}

/// Rewrite floating point columns of `batch` as compact strings.
///
/// Other columns are passed through untouched.
pub fn compact_float_batch(
    batch: &RecordBatch,
    max_decimals: usize,
) -> Result<RecordBatch, ArrowError> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut columns = Vec::with_capacity(batch.num_columns());

    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        match compact_column(column, max_decimals) {
            Some(strings) => {
                fields.push(Arc::new(Field::new(
                    field.name(),
                    DataType::Utf8,
                    field.is_nullable(),
                )));
                columns.push(strings);
            }
            None => {
                fields.push(Arc::clone(field));
                columns.push(Arc::clone(column));
            }
        }
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
}

/// Render a result as an ASCII table, header included even with no rows.
pub fn render_result(result: &TabularResult) -> Result<String, ArrowError> {
    render_result_with_max_decimals(result, DEFAULT_FLOAT_MAX_DECIMALS)
}

/// Same as [`render_result`], with a caller-chosen decimal limit.
pub fn render_result_with_max_decimals(
    result: &TabularResult,
    max_decimals: usize,
) -> Result<String, ArrowError> {
    let batches = if result.batches.is_empty() {
        vec![RecordBatch::new_empty(Arc::clone(&result.schema))]
    } else {
        result.batches.clone()
    };

    let compact = batches
        .iter()
        .map(|b| compact_float_batch(b, max_decimals))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(pretty_format_batches(&compact)?.to_string())
}

/// Render a battery report: title, table, and row count.
pub fn render_report(report: &BatteryReport) -> Result<String, ArrowError> {
    let table = render_result(&report.result)?;
    let rows = report.result.num_rows();
    let noun = if rows == 1 { "row" } else { "rows" };
    Ok(format!("{}:\n{table}\n({rows} {noun})", report.title))
}
