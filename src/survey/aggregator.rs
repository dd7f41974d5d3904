//! Grouped competency averages.
//!
//! Responses are filtered by grade and gender, split into partitions by the
//! requested identity fields, and reduced to one mean-of-means per
//! competency group. A synthetic overall row closes the table.

use crate::models::{AggregateRow, NormalizedRow, Selection, ALL_LABEL};
use crate::survey::cohort::{benchmark_for, classify};
use crate::survey::schema::{IdentityField, Schema};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Compute the aggregate table for `selection`.
///
/// Partition keys come from the unfiltered rows so that the set of rows
/// (and chart legends) does not change when a filter empties a partition;
/// such partitions are reported as zero rows instead of being dropped.
/// The last row is always the overall row: the column-wise mean of the
/// partition rows, not a recomputation over raw responses.
pub fn aggregate(
    rows: &[NormalizedRow],
    selection: &Selection,
    schema: &Schema,
    with_benchmark: bool,
) -> Vec<AggregateRow> {
    let filtered: Vec<&NormalizedRow> = rows
        .iter()
        .filter(|row| {
            selection
                .grade
                .matches(identity_value(row, schema, IdentityField::Grade))
                && selection
                    .gender
                    .matches(identity_value(row, schema, IdentityField::Gender))
        })
        .collect();

    debug!(
        "{} of {} responses match grade={} gender={}",
        filtered.len(),
        rows.len(),
        selection.grade,
        selection.gender
    );

    let mut aggregates: Vec<AggregateRow> = partitions(rows, &filtered, selection, schema)
        .into_iter()
        .map(|(key, members)| summarize(key, &members, schema, with_benchmark))
        .collect();

    if let Some(overall) = overall_row(&aggregates, filtered.len()) {
        aggregates.push(overall);
    }

    aggregates
}

/// Trimmed text of an identity column, or "" when the schema has no such column.
pub fn identity_value<'a>(row: &'a NormalizedRow, schema: &Schema, field: IdentityField) -> &'a str {
    schema
        .identity_index(field)
        .and_then(|i| row.identity.get(i))
        .map(|value| value.trim())
        .unwrap_or("")
}

/// Sorted distinct values of one identity column.
pub fn distinct_values(rows: &[NormalizedRow], schema: &Schema, field: IdentityField) -> Vec<String> {
    rows.iter()
        .map(|row| identity_value(row, schema, field).to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Score of one competency group for one response.
pub fn group_score(row: &NormalizedRow, schema: &Schema, group: usize) -> f64 {
    mean(row.scores[schema.item_span(group)].iter().copied())
}

type Partition<'a> = (Vec<String>, Vec<&'a NormalizedRow>);

fn partitions<'a>(
    all: &[NormalizedRow],
    filtered: &[&'a NormalizedRow],
    selection: &Selection,
    schema: &Schema,
) -> Vec<Partition<'a>> {
    if selection.group_by.is_empty() {
        return vec![(Vec::new(), filtered.to_vec())];
    }

    let key_of = |row: &NormalizedRow| -> Vec<String> {
        selection
            .group_by
            .iter()
            .map(|field| identity_value(row, schema, *field).to_string())
            .collect()
    };

    let keys: BTreeSet<Vec<String>> = all.iter().map(|row| key_of(row)).collect();

    let mut result = Vec::with_capacity(keys.len() + 1);
    if selection.include_all {
        result.push((Vec::new(), filtered.to_vec()));
    }

    for key in keys {
        let members = filtered
            .iter()
            .copied()
            .filter(|row| key_of(row) == key)
            .collect();
        result.push((key, members));
    }

    result
}

fn summarize(
    key: Vec<String>,
    members: &[&NormalizedRow],
    schema: &Schema,
    with_benchmark: bool,
) -> AggregateRow {
    let label = if key.is_empty() {
        ALL_LABEL.to_string()
    } else {
        key.join(" / ")
    };

    if members.is_empty() {
        warn!("No responses for {}; reporting zeros", label);
    }

    let scores = (0..schema.groups.len())
        .map(|group| mean(members.iter().map(|row| group_score(row, schema, group))))
        .collect();

    let (benchmark, tier) = if with_benchmark {
        let grades: BTreeSet<&str> = members
            .iter()
            .map(|row| identity_value(row, schema, IdentityField::Grade))
            .collect();
        let tier = classify(grades);
        debug!("Partition {} classified as {:?}", label, tier);
        (Some(benchmark_for(tier, &schema.group_names())), Some(tier))
    } else {
        (None, None)
    };

    AggregateRow {
        label,
        key,
        respondents: members.len(),
        scores,
        benchmark,
        tier,
        is_overall: false,
    }
}

fn overall_row(rows: &[AggregateRow], respondents: usize) -> Option<AggregateRow> {
    let first = rows.first()?;

    let scores = column_means(rows.iter().map(|r| r.scores.as_slice()), first.scores.len());
    let benchmark = first.benchmark.as_ref().map(|b| {
        column_means(
            rows.iter().filter_map(|r| r.benchmark.as_deref()),
            b.len(),
        )
    });

    Some(AggregateRow {
        label: ALL_LABEL.to_string(),
        key: Vec::new(),
        respondents,
        scores,
        benchmark,
        tier: None,
        is_overall: true,
    })
}

fn column_means<'a, I>(rows: I, width: usize) -> Vec<f64>
where
    I: Iterator<Item = &'a [f64]> + Clone,
{
    (0..width)
        .map(|col| mean(rows.clone().map(|r| r.get(col).copied().unwrap_or(0.0))))
        .collect()
}

/// Arithmetic mean; 0 for no values.
pub(crate) fn mean<I>(values: I) -> f64
where
    I: Iterator<Item = f64>,
{
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
