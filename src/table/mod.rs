// src/table/mod.rs

pub mod dates;

use anyhow::{Context, Result};
use arrow::array::{
    Array, ArrayRef, Float64Array, Float64Builder, StringArray, StringBuilder,
    TimestampMillisecondArray, TimestampMillisecondBuilder,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::warn;

use crate::meta::{FieldType, ResourceMetadata};

/// Format assumed for datetime descriptors that carry no format string.
const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD";

/// Typed, row-indexed table derived from raw records plus field descriptors.
/// Columns are `Float64`, `Timestamp(Millisecond)` or `Utf8`; rows keep the
/// `_id` ordering the source provided.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    row_ids: Vec<i64>,
    batch: RecordBatch,
}

impl NormalizedTable {
    pub fn num_rows(&self) -> usize {
        self.row_ids.len()
    }

    /// Row identifiers in source order (unique, monotonic, not necessarily
    /// contiguous).
    pub fn row_ids(&self) -> &[i64] {
        &self.row_ids
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn column(&self, name: &str) -> Option<&ArrayRef> {
        self.batch.column_by_name(name)
    }

    /// Render one cell for console previews: `NaN`/`NaT` for nulls, dates as
    /// `YYYY-MM-DD`, floats with trailing noise trimmed.
    pub fn display_value(&self, column: usize, row: usize) -> String {
        let array = self.batch.column(column);
        if array.is_null(row) {
            return match array.data_type() {
                DataType::Timestamp(_, _) => "NaT".to_string(),
                _ => "NaN".to_string(),
            };
        }
        match array.data_type() {
            DataType::Float64 => array
                .as_any()
                .downcast_ref::<Float64Array>()
                .map(|a| format_float(a.value(row)))
                .unwrap_or_default(),
            DataType::Timestamp(TimeUnit::Millisecond, _) => array
                .as_any()
                .downcast_ref::<TimestampMillisecondArray>()
                .map(|a| dates::format_millis(a.value(row)))
                .unwrap_or_default(),
            _ => array
                .as_any()
                .downcast_ref::<StringArray>()
                .map(|a| a.value(row).to_string())
                .unwrap_or_default(),
        }
    }
}

fn format_float(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

/// Build a [`NormalizedTable`] from raw records and the resource's field
/// descriptors. Per column: declared null sentinels become nulls first, then
/// datetime columns are quarter-substituted and parsed, and every other
/// column is coerced to `Float64` when all of its values allow it, falling
/// back to verbatim text otherwise.
pub fn normalize(
    records: &[Map<String, Value>],
    metadata: &ResourceMetadata,
) -> Result<NormalizedTable> {
    let mut row_ids = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        let id = record
            .get("_id")
            .and_then(row_id)
            .with_context(|| format!("record {idx} has no usable _id"))?;
        row_ids.push(id);
    }

    // Column order is first-encounter order across the records.
    let mut order: Vec<&str> = Vec::new();
    for record in records {
        for key in record.keys() {
            if key != "_id" && !order.iter().any(|k| k == key) {
                order.push(key);
            }
        }
    }

    let mut fields = Vec::with_capacity(order.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(order.len());
    for name in order {
        let sentinels = metadata.null_sentinels(name);
        let cells: Vec<Option<String>> = records
            .iter()
            .map(|record| {
                cell_text(record.get(name))
                    .filter(|value| !sentinels.iter().any(|s| s == value))
            })
            .collect();

        let descriptor = metadata.field(name);
        let is_datetime = descriptor
            .map(|d| d.ty == FieldType::Datetime)
            .unwrap_or(false);

        let (data_type, array) = if is_datetime {
            let format = dates::strftime_format(
                descriptor
                    .and_then(|d| d.format.as_deref())
                    .unwrap_or(DEFAULT_DATE_FORMAT),
            );
            (
                DataType::Timestamp(TimeUnit::Millisecond, None),
                datetime_column(name, &cells, &format),
            )
        } else {
            match numeric_column(&cells) {
                Ok(array) => (DataType::Float64, array),
                Err(reason) => {
                    warn!(column = name, %reason, "column does not appear to be numeric; keeping text");
                    (DataType::Utf8, text_column(&cells))
                }
            }
        };
        fields.push(Field::new(name, data_type, true));
        columns.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = if columns.is_empty() {
        RecordBatch::try_new_with_options(
            schema,
            columns,
            &RecordBatchOptions::new().with_row_count(Some(row_ids.len())),
        )
        .context("assembling empty record batch")?
    } else {
        RecordBatch::try_new(schema, columns).context("assembling record batch")?
    };
    Ok(NormalizedTable { row_ids, batch })
}

fn row_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn cell_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Quarter-substitute and parse every cell. Unparseable cells become nulls
/// rather than failing the whole table.
fn datetime_column(name: &str, cells: &[Option<String>], format: &str) -> ArrayRef {
    let mut builder = TimestampMillisecondBuilder::with_capacity(cells.len());
    for (row, cell) in cells.iter().enumerate() {
        let parsed = cell.as_deref().and_then(|raw| {
            let substituted = dates::substitute_quarters(raw);
            dates::parse_date(&substituted, format)
        });
        if parsed.is_none() {
            if let Some(raw) = cell.as_deref() {
                warn!(column = name, row, value = raw, "unparseable date; treating as missing");
            }
        }
        builder.append_option(parsed.map(dates::date_to_millis));
    }
    Arc::new(builder.finish())
}

/// Coerce every non-null cell to f64, or report the first offender so the
/// caller can keep the column as text.
fn numeric_column(cells: &[Option<String>]) -> Result<ArrayRef, String> {
    let mut builder = Float64Builder::with_capacity(cells.len());
    for cell in cells {
        match cell.as_deref() {
            None => builder.append_null(),
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(v) => builder.append_value(v),
                Err(e) => return Err(format!("value {raw:?}: {e}")),
            },
        }
    }
    Ok(Arc::new(builder.finish()))
}

fn text_column(cells: &[Option<String>]) -> ArrayRef {
    let mut builder = StringBuilder::new();
    for cell in cells {
        builder.append_option(cell.as_deref());
    }
    Arc::new(builder.finish())
}
