// src/explore/plot.rs
//
// SVG chart rendering: one histogram per numeric column and one time-series
// chart per dataset against its first datetime column. Returns Ok(false)
// when there is nothing to draw so the caller can log a skip instead of an
// error.

use anyhow::{Context, Result};
use arrow::array::{Float64Array, TimestampMillisecondArray};
use arrow::datatypes::DataType;
use chrono::{DateTime, Duration, NaiveDate};
use plotters::prelude::*;
use std::path::Path;

use crate::table::NormalizedTable;

const HIST_BINS: usize = 10;
const CHART_SIZE: (u32, u32) = (800, 600);

/// Lowercase, ascii-alphanumeric file stem for chart output names.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// Render a 10-bin histogram of one numeric column to `path`.
pub fn histogram(table: &NormalizedTable, column: &str, path: &Path) -> Result<bool> {
    let Some(array) = table.column(column) else {
        return Ok(false);
    };
    let Some(values) = array.as_any().downcast_ref::<Float64Array>() else {
        return Ok(false);
    };
    let data: Vec<f64> = values.iter().flatten().filter(|v| v.is_finite()).collect();
    if data.is_empty() {
        return Ok(false);
    }

    let min = data.iter().copied().fold(f64::INFINITY, f64::min);
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if max > min { max - min } else { 1.0 };
    let mut counts = vec![0u32; HIST_BINS];
    for v in &data {
        let mut bin = (((v - min) / span) * HIST_BINS as f64) as usize;
        if bin >= HIST_BINS {
            bin = HIST_BINS - 1;
        }
        counts[bin] += 1;
    }
    let y_max = counts.iter().copied().max().unwrap_or(0).max(1);

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(column, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(min..(min + span), 0u32..(y_max + 1))?;
    chart.configure_mesh().y_desc("count").draw()?;
    chart.draw_series(counts.iter().enumerate().map(|(i, &c)| {
        let x0 = min + span * i as f64 / HIST_BINS as f64;
        let x1 = min + span * (i + 1) as f64 / HIST_BINS as f64;
        Rectangle::new([(x0, 0), (x1, c)], BLUE.mix(0.5).filled())
    }))?;
    root.present()
        .with_context(|| format!("writing histogram to {}", path.display()))?;
    Ok(true)
}

/// Render every numeric column as a line series against `date_column`.
pub fn timeseries(
    table: &NormalizedTable,
    date_column: &str,
    title: &str,
    path: &Path,
) -> Result<bool> {
    let Some(array) = table.column(date_column) else {
        return Ok(false);
    };
    let Some(timestamps) = array.as_any().downcast_ref::<TimestampMillisecondArray>() else {
        return Ok(false);
    };
    let dates: Vec<Option<NaiveDate>> = timestamps
        .iter()
        .map(|opt| opt.and_then(millis_to_date))
        .collect();

    let batch = table.batch();
    let mut series: Vec<(String, Vec<(NaiveDate, f64)>)> = Vec::new();
    for (idx, field) in batch.schema_ref().fields().iter().enumerate() {
        if !matches!(field.data_type(), DataType::Float64) {
            continue;
        }
        let Some(column) = batch.column(idx).as_any().downcast_ref::<Float64Array>() else {
            continue;
        };
        let mut points: Vec<(NaiveDate, f64)> = dates
            .iter()
            .zip(column.iter())
            .filter_map(|(date, value)| Some(((*date)?, value?)))
            .filter(|(_, v)| v.is_finite())
            .collect();
        points.sort_by_key(|(date, _)| *date);
        if !points.is_empty() {
            series.push((field.name().clone(), points));
        }
    }
    if series.is_empty() {
        return Ok(false);
    }

    let all_dates = || series.iter().flat_map(|(_, pts)| pts.iter().map(|(d, _)| *d));
    let all_values = || series.iter().flat_map(|(_, pts)| pts.iter().map(|(_, v)| *v));
    let x_min = all_dates().min().unwrap_or_default();
    let x_max = all_dates().max().unwrap_or_default();
    let (x_min, x_max) = if x_min == x_max {
        (x_min - Duration::days(1), x_max + Duration::days(1))
    } else {
        (x_min, x_max)
    };
    let y_min = all_values().fold(f64::INFINITY, f64::min);
    let y_max = all_values().fold(f64::NEG_INFINITY, f64::max);
    let pad = (y_max - y_min).abs().max(1.0) * 0.05;

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, (y_min - pad)..(y_max + pad))?;
    chart
        .configure_mesh()
        .x_label_formatter(&|d: &NaiveDate| d.format("%Y-%m").to_string())
        .draw()?;

    for (i, (name, points)) in series.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color))?
            .label(name.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()
        .with_context(|| format!("writing time-series chart to {}", path.display()))?;
    Ok(true)
}

fn millis_to_date(ms: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(ms).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::ResourceMetadata;
    use crate::table::normalize;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample_table() -> NormalizedTable {
        let meta: ResourceMetadata = serde_json::from_value(json!({
            "name": "r",
            "fields": [{"name": "month", "type": "datetime", "format": "YYYY-MM"}]
        }))
        .unwrap();
        let records: Vec<serde_json::Map<String, serde_json::Value>> =
            serde_json::from_value(json!([
                {"_id": 1, "month": "2020-03", "value": "3.0"},
                {"_id": 2, "month": "2020-02", "value": "2.0"},
                {"_id": 3, "month": "2020-01", "value": "1.0"}
            ]))
            .unwrap();
        normalize(&records, &meta).unwrap()
    }

    #[test]
    fn slugs_are_filename_safe() {
        assert_eq!(slugify("Median Resale Prices (2020)"), "median_resale_prices_2020");
        assert_eq!(slugify("___"), "");
    }

    #[test]
    fn histogram_written_for_numeric_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hist.svg");
        let wrote = histogram(&sample_table(), "value", &path).unwrap();
        assert!(wrote);
        assert!(path.metadata().unwrap().len() > 0);
    }

    #[test]
    fn histogram_skips_non_numeric_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hist.svg");
        assert!(!histogram(&sample_table(), "month", &path).unwrap());
        assert!(!histogram(&sample_table(), "missing", &path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn timeseries_written_against_datetime_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ts.svg");
        let wrote = timeseries(&sample_table(), "month", "sample", &path).unwrap();
        assert!(wrote);
        assert!(path.metadata().unwrap().len() > 0);
    }

    #[test]
    fn timeseries_skips_without_dates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ts.svg");
        // "value" is numeric, not a datetime axis
        assert!(!timeseries(&sample_table(), "value", "sample", &path).unwrap());
    }
}
