//! Reshaping aggregate rows for tables and charts.

use crate::models::{AggregateRow, LongFormRow, SummaryLine, SummaryTable, ALL_LABEL};
use crate::survey::aggregator::mean;
use crate::survey::schema::Schema;

/// Series names used when a single partition is charted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesLabels {
    pub school: String,
    pub benchmark: String,
}

impl Default for SeriesLabels {
    fn default() -> Self {
        Self {
            school: "본교 평균".to_string(),
            benchmark: "대구 평균".to_string(),
        }
    }
}

/// Fan each row out into one point per requested competency column.
///
/// Output order is row-major, then `columns` order. Columns that are not
/// competency groups of `schema` read as 0.
pub fn to_long_form(rows: &[AggregateRow], schema: &Schema, columns: &[String]) -> Vec<LongFormRow> {
    let names = schema.group_names();
    rows.iter()
        .flat_map(|row| {
            columns.iter().map(|column| LongFormRow {
                series: row.label.clone(),
                axis: column.clone(),
                value: names
                    .iter()
                    .position(|name| name == column)
                    .and_then(|i| row.scores.get(i))
                    .copied()
                    .unwrap_or(0.0),
            })
        })
        .collect()
}

/// Long-form series for the radar chart.
///
/// The overall row is left out. Each partition contributes its scores and,
/// when present, its benchmark; a lone partition is labelled with the
/// school/benchmark labels instead of its own name.
pub fn radar_series(rows: &[AggregateRow], schema: &Schema, labels: &SeriesLabels) -> Vec<LongFormRow> {
    let partitions: Vec<&AggregateRow> = rows.iter().filter(|r| !r.is_overall).collect();
    let single = partitions.len() == 1;
    let axes = schema.group_names();

    let mut series = Vec::with_capacity(partitions.len() * axes.len() * 2);
    for row in partitions {
        let name = if single {
            labels.school.clone()
        } else {
            row.label.clone()
        };
        series.extend(points(&name, &row.scores, &axes));

        if let Some(ref benchmark) = row.benchmark {
            let name = if single {
                labels.benchmark.clone()
            } else {
                format!("{} {}", row.label, labels.benchmark)
            };
            series.extend(points(&name, benchmark, &axes));
        }
    }

    series
}

fn points<'a>(series: &'a str, values: &'a [f64], axes: &'a [String]) -> impl Iterator<Item = LongFormRow> + 'a {
    axes.iter().zip(values).map(move |(axis, value)| LongFormRow {
        series: series.to_string(),
        axis: axis.clone(),
        value: *value,
    })
}

/// Display table for one aggregate row.
///
/// Averages are shown to one decimal and the rescaled columns are derived
/// from the rounded average. The closing `전체` line is the mean of the
/// lines above it.
pub fn summary_table(row: &AggregateRow, schema: &Schema, title: &str) -> SummaryTable {
    let lines: Vec<SummaryLine> = schema
        .groups
        .iter()
        .enumerate()
        .map(|(i, group)| {
            let average = round1(row.scores.get(i).copied().unwrap_or(0.0));
            SummaryLine {
                competency: group.name.clone(),
                average,
                ten_point: round1(average * 2.0),
                twenty_point: round1(average * 4.0),
                benchmark: row
                    .benchmark
                    .as_ref()
                    .map(|b| b.get(i).copied().unwrap_or(0.0)),
            }
        })
        .collect();

    let column = |f: fn(&SummaryLine) -> f64| round1(mean(lines.iter().map(f)));
    let total = SummaryLine {
        competency: ALL_LABEL.to_string(),
        average: column(|l| l.average),
        ten_point: column(|l| l.ten_point),
        twenty_point: column(|l| l.twenty_point),
        benchmark: row
            .benchmark
            .as_ref()
            .map(|_| column(|l| l.benchmark.unwrap_or(0.0))),
    };

    SummaryTable {
        title: title.to_string(),
        lines,
        total,
    }
}

/// Round to one decimal place, ties to even.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}
