// src/explore/mod.rs

pub mod plot;
pub mod stats;

use anyhow::Result;
use arrow::datatypes::DataType;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::dataset::Dataset;
use crate::table::{dates, NormalizedTable};
use stats::ColumnSummary;

const PREVIEW_ROWS: usize = 5;

/// Console-and-chart walkthrough over a list of already-loaded datasets,
/// processed one at a time in list order. Datasets without a table are
/// skipped with a warning rather than aborting the run.
pub struct Explorer<'a> {
    datasets: &'a [Dataset],
    chart_dir: PathBuf,
}

impl<'a> Explorer<'a> {
    pub fn new(datasets: &'a [Dataset], chart_dir: impl Into<PathBuf>) -> Self {
        Explorer {
            datasets,
            chart_dir: chart_dir.into(),
        }
    }

    pub fn run(&self) -> Result<()> {
        fs::create_dir_all(&self.chart_dir)?;
        for dataset in self.datasets {
            let name = dataset.display_name();
            println!();
            info!(dataset = %name, "analyzing");
            let Some(table) = dataset.table() else {
                warn!(dataset = %name, "no table available; skipping");
                continue;
            };

            println!("{}", "-".repeat(50));
            println!("Describe");
            println!("{}", "-".repeat(10));
            print_describe(table);
            println!();
            println!("Head");
            println!("{}", "-".repeat(10));
            print_head(table, PREVIEW_ROWS);

            self.render_charts(dataset, table);
        }
        Ok(())
    }

    fn render_charts(&self, dataset: &Dataset, table: &NormalizedTable) {
        let name = dataset.display_name();
        let slug = plot::slugify(name);

        for field in table.batch().schema_ref().fields() {
            if !matches!(field.data_type(), DataType::Float64) {
                continue;
            }
            let path = self
                .chart_dir
                .join(format!("{slug}_{}_hist.svg", plot::slugify(field.name())));
            match plot::histogram(table, field.name(), &path) {
                Ok(true) => info!(dataset = %name, chart = %path.display(), "wrote histogram"),
                Ok(false) => debug!(dataset = %name, column = %field.name(), "histogram skipped"),
                Err(e) => {
                    error!(dataset = %name, column = %field.name(), error = %e, "histogram failed")
                }
            }
        }

        match dataset.datetime_fields().first() {
            Some(field) => {
                let path = self.chart_dir.join(format!("{slug}_timeseries.svg"));
                match plot::timeseries(table, &field.name, name, &path) {
                    Ok(true) => {
                        info!(dataset = %name, chart = %path.display(), "wrote time-series chart")
                    }
                    Ok(false) => debug!(dataset = %name, "time-series chart skipped"),
                    Err(e) => error!(dataset = %name, error = %e, "time-series chart failed"),
                }
            }
            None => warn!(dataset = %name, "no datetime column; skipping time-series chart"),
        }
    }
}

fn print_describe(table: &NormalizedTable) {
    let summaries = stats::summarize(table);

    let numeric: Vec<_> = summaries
        .iter()
        .filter(|(_, s)| matches!(s, ColumnSummary::Numeric(_) | ColumnSummary::Datetime(_)))
        .collect();
    if !numeric.is_empty() {
        println!(
            "{:<20} {:>7} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
            "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        );
        for (name, summary) in &numeric {
            match summary {
                ColumnSummary::Numeric(s) => println!(
                    "{:<20} {:>7} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
                    truncate(name, 20),
                    s.count,
                    fmt_num(s.mean),
                    fmt_num(s.std),
                    fmt_num(s.min),
                    fmt_num(s.q25),
                    fmt_num(s.median),
                    fmt_num(s.q75),
                    fmt_num(s.max)
                ),
                ColumnSummary::Datetime(s) => println!(
                    "{:<20} {:>7} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
                    truncate(name, 20),
                    s.count,
                    fmt_date(s.mean),
                    "-",
                    fmt_date(s.min),
                    fmt_date(s.q25),
                    fmt_date(s.median),
                    fmt_date(s.q75),
                    fmt_date(s.max)
                ),
                ColumnSummary::Categorical(_) => {}
            }
        }
    }

    let categorical: Vec<_> = summaries
        .iter()
        .filter_map(|(name, s)| match s {
            ColumnSummary::Categorical(c) => Some((name, c)),
            _ => None,
        })
        .collect();
    if !categorical.is_empty() {
        if !numeric.is_empty() {
            println!();
        }
        println!(
            "{:<20} {:>7} {:>8} {:>16} {:>6}",
            "column", "count", "unique", "top", "freq"
        );
        for (name, c) in categorical {
            println!(
                "{:<20} {:>7} {:>8} {:>16} {:>6}",
                truncate(name, 20),
                c.count,
                c.unique,
                truncate(c.top.as_deref().unwrap_or("-"), 16),
                c.freq
            );
        }
    }
}

fn print_head(table: &NormalizedTable, rows: usize) {
    let batch = table.batch();
    let mut header = format!("{:>12}", "_id");
    for field in batch.schema_ref().fields() {
        header.push_str(&format!(" {:>14}", truncate(field.name(), 14)));
    }
    println!("{header}");
    for row in 0..table.num_rows().min(rows) {
        let mut line = format!("{:>12}", table.row_ids()[row]);
        for column in 0..batch.num_columns() {
            line.push_str(&format!(" {:>14}", truncate(&table.display_value(column, row), 14)));
        }
        println!("{line}");
    }
}

fn fmt_num(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{v:.2}")
    }
}

fn fmt_date(ms: f64) -> String {
    if ms.is_nan() {
        "NaT".to_string()
    } else {
        dates::format_millis(ms as i64)
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width - 1).collect();
        out.push('…');
        out
    }
}
