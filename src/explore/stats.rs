// src/explore/stats.rs
//
// Describe-style summaries over a normalized table. Numeric and datetime
// columns get count/mean/percentiles (datetimes numerically, on their epoch
// millis); everything else gets a categorical count/unique/top/freq summary.

use arrow::array::{Array, Float64Array, StringArray, TimestampMillisecondArray};
use arrow::datatypes::{DataType, TimeUnit};
use std::collections::HashMap;

use crate::table::NormalizedTable;

#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalSummary {
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSummary {
    Numeric(NumericSummary),
    /// Numeric summary over epoch milliseconds; render the stats as dates.
    Datetime(NumericSummary),
    Categorical(CategoricalSummary),
}

/// Summarize every column of `table`, in schema order.
pub fn summarize(table: &NormalizedTable) -> Vec<(String, ColumnSummary)> {
    let batch = table.batch();
    let mut out = Vec::with_capacity(batch.num_columns());
    for (idx, field) in batch.schema_ref().fields().iter().enumerate() {
        let array = batch.column(idx);
        let summary = match field.data_type() {
            DataType::Float64 => {
                let values: Vec<f64> = array
                    .as_any()
                    .downcast_ref::<Float64Array>()
                    .map(|a| a.iter().flatten().collect())
                    .unwrap_or_default();
                ColumnSummary::Numeric(numeric_summary(&values))
            }
            DataType::Timestamp(TimeUnit::Millisecond, _) => {
                let values: Vec<f64> = array
                    .as_any()
                    .downcast_ref::<TimestampMillisecondArray>()
                    .map(|a| a.iter().flatten().map(|ms| ms as f64).collect())
                    .unwrap_or_default();
                ColumnSummary::Datetime(numeric_summary(&values))
            }
            _ => {
                let values: Vec<&str> = array
                    .as_any()
                    .downcast_ref::<StringArray>()
                    .map(|a| a.iter().flatten().collect())
                    .unwrap_or_default();
                ColumnSummary::Categorical(categorical_summary(&values))
            }
        };
        out.push((field.name().clone(), summary));
    }
    out
}

/// Count, mean, sample std and linearly interpolated percentiles. An empty
/// slice yields count 0 with NaN stats.
pub fn numeric_summary(values: &[f64]) -> NumericSummary {
    let count = values.len();
    if count == 0 {
        return NumericSummary {
            count,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q25: f64::NAN,
            median: f64::NAN,
            q75: f64::NAN,
            max: f64::NAN,
        };
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mean = values.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count as f64 - 1.0);
        var.sqrt()
    } else {
        f64::NAN
    };
    NumericSummary {
        count,
        mean,
        std,
        min: sorted[0],
        q25: percentile(&sorted, 0.25),
        median: percentile(&sorted, 0.5),
        q75: percentile(&sorted, 0.75),
        max: sorted[count - 1],
    }
}

fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Non-null count, distinct count, and the most frequent value (first
/// encountered wins ties).
pub fn categorical_summary(values: &[&str]) -> CategoricalSummary {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (idx, value) in values.iter().enumerate() {
        let entry = counts.entry(*value).or_insert((0, idx));
        entry.0 += 1;
    }
    let top = counts
        .iter()
        .max_by(|a, b| a.1 .0.cmp(&b.1 .0).then(b.1 .1.cmp(&a.1 .1)))
        .map(|(value, (freq, _))| (value.to_string(), *freq));
    CategoricalSummary {
        count: values.len(),
        unique: counts.len(),
        freq: top.as_ref().map(|(_, f)| *f).unwrap_or(0),
        top: top.map(|(v, _)| v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::ResourceMetadata;
    use crate::table::normalize;
    use serde_json::json;

    #[test]
    fn numeric_summary_of_known_values() {
        let s = numeric_summary(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, 2.5);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.q25, 1.75);
        assert_eq!(s.median, 2.5);
        assert_eq!(s.q75, 3.25);
        assert_eq!(s.max, 4.0);
        assert!((s.std - 1.2909944487358056).abs() < 1e-12);
    }

    #[test]
    fn empty_and_singleton_inputs() {
        let empty = numeric_summary(&[]);
        assert_eq!(empty.count, 0);
        assert!(empty.mean.is_nan());

        let one = numeric_summary(&[42.0]);
        assert_eq!(one.count, 1);
        assert_eq!(one.median, 42.0);
        assert!(one.std.is_nan());
    }

    #[test]
    fn categorical_top_and_freq() {
        let s = categorical_summary(&["a", "b", "a", "c", "a", "b"]);
        assert_eq!(s.count, 6);
        assert_eq!(s.unique, 3);
        assert_eq!(s.top.as_deref(), Some("a"));
        assert_eq!(s.freq, 3);
    }

    #[test]
    fn tie_goes_to_first_encountered() {
        let s = categorical_summary(&["x", "y", "y", "x"]);
        assert_eq!(s.top.as_deref(), Some("x"));
        assert_eq!(s.freq, 2);
    }

    #[test]
    fn summarize_covers_all_column_kinds() {
        let meta: ResourceMetadata = serde_json::from_value(json!({
            "name": "r",
            "fields": [{"name": "month", "type": "datetime", "format": "YYYY-MM"}]
        }))
        .unwrap();
        let records: Vec<serde_json::Map<String, serde_json::Value>> =
            serde_json::from_value(json!([
                {"_id": 1, "month": "2020-01", "value": "10", "label": "a"},
                {"_id": 2, "month": "2020-02", "value": "20", "label": "a"}
            ]))
            .unwrap();
        let table = normalize(&records, &meta).unwrap();

        let summaries = summarize(&table);
        assert_eq!(summaries.len(), 3);
        assert!(matches!(summaries[0].1, ColumnSummary::Datetime(_)));
        match &summaries[1].1 {
            ColumnSummary::Numeric(n) => assert_eq!(n.mean, 15.0),
            other => panic!("expected numeric summary, got {other:?}"),
        }
        match &summaries[2].1 {
            ColumnSummary::Categorical(c) => {
                assert_eq!(c.unique, 1);
                assert_eq!(c.freq, 2);
            }
            other => panic!("expected categorical summary, got {other:?}"),
        }
    }
}
