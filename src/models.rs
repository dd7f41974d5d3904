//! Data models for the competency analyzer.
//!
//! This module contains the structures passed between the source
//! collaborators, the survey pipeline, and the report writers.

use crate::survey::cohort::CohortTier;
use crate::survey::schema::IdentityField;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label of the "everything" partition and of the synthetic overall row.
pub const ALL_LABEL: &str = "전체";

/// Rectangular-ish text table as read from a sheet: header plus data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Split sheet values into header and data rows.
    ///
    /// Returns `None` when there is no header row at all.
    pub fn from_values(mut values: Vec<Vec<String>>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let header = values.remove(0);
        Some(Self {
            header,
            rows: values,
        })
    }

    /// Header followed by data rows, the layout written back to a sheet.
    pub fn to_values(&self) -> Vec<Vec<String>> {
        std::iter::once(self.header.clone())
            .chain(self.rows.iter().cloned())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One survey response after Likert coding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    /// Identity cells, aligned with `Schema::identity`.
    pub identity: Vec<String>,
    /// Item scores in `0..=5`, aligned with the schema's item columns.
    pub scores: Vec<f64>,
}

/// A filter on one identity column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    #[default]
    All,
    Only(String),
}

impl Filter {
    /// Parse a UI selection; the `전체` sentinel (or nothing) means no filter.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some(ALL_LABEL) => Filter::All,
            Some(v) if v.eq_ignore_ascii_case("all") => Filter::All,
            Some(v) => Filter::Only(v.to_string()),
        }
    }

    /// Compares against the trimmed cell, since `parse` trims the filter.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(expected) => expected == value.trim(),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => write!(f, "{}", ALL_LABEL),
            Filter::Only(value) => write!(f, "{}", value),
        }
    }
}

/// What the user asked to look at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub grade: Filter,
    pub gender: Filter,
    /// Identity fields to partition by; empty means a single `전체` partition.
    pub group_by: Vec<IdentityField>,
    /// Also emit an `전체` partition in front of the grouped ones.
    pub include_all: bool,
}

/// Averages for one partition (or the synthetic overall row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    /// Display label, e.g. `중1`, `중1 / 여`, or `전체`.
    pub label: String,
    /// Partition values in `group_by` order; empty for `전체` rows.
    pub key: Vec<String>,
    /// Number of responses in the partition.
    pub respondents: usize,
    /// Mean-of-means per competency group, in schema order.
    pub scores: Vec<f64>,
    /// Reference score per competency group, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<Vec<f64>>,
    /// Cohort tier the benchmark was chosen from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<CohortTier>,
    /// True for the appended column-wise mean row.
    pub is_overall: bool,
}

impl AggregateRow {
    /// Scores rescaled to a 10-point scale.
    pub fn ten_point(&self) -> Vec<f64> {
        self.scores.iter().map(|s| s * 2.0).collect()
    }

    /// Scores rescaled to a 20-point scale.
    pub fn twenty_point(&self) -> Vec<f64> {
        self.scores.iter().map(|s| s * 4.0).collect()
    }

    pub fn is_empty_partition(&self) -> bool {
        !self.is_overall && self.respondents == 0
    }
}

/// One (series, axis, value) point of a long-form table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongFormRow {
    pub series: String,
    pub axis: String,
    pub value: f64,
}

/// A line of the per-partition display table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryLine {
    pub competency: String,
    pub average: f64,
    pub ten_point: f64,
    pub twenty_point: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<f64>,
}

/// Display table for one aggregate row: one line per competency plus total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub title: String,
    pub lines: Vec<SummaryLine>,
    pub total: SummaryLine,
}

/// Where the responses came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceInfo {
    Sheets {
        spreadsheet_id: String,
        sheet: String,
    },
    Csv {
        path: String,
    },
}

impl fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceInfo::Sheets {
                spreadsheet_id,
                sheet,
            } => write!(f, "Google Sheets {} ({})", spreadsheet_id, sheet),
            SourceInfo::Csv { path } => write!(f, "CSV {}", path),
        }
    }
}

/// Metadata about the analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub school: Option<String>,
    pub source: SourceInfo,
    pub generated_at: DateTime<Utc>,
    pub selection: Selection,
    /// Responses remaining after the grade/gender filters.
    pub respondents: usize,
    /// Responses read from the source.
    pub total_rows: usize,
    /// Sheet title the raw responses were copied to, if saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_to: Option<String>,
}

/// The complete analysis report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub competencies: Vec<String>,
    pub rows: Vec<AggregateRow>,
    pub tables: Vec<SummaryTable>,
    /// Every aggregate row over every competency, overall row included.
    pub long_form: Vec<LongFormRow>,
    pub radar: Vec<LongFormRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_raw_table_split() {
        let table = RawTable::from_values(vec![cells(&["a", "b"]), cells(&["1", "2"])]).unwrap();
        assert_eq!(table.header, cells(&["a", "b"]));
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.to_values().len(), 2);

        assert!(RawTable::from_values(vec![]).is_none());
        assert!(RawTable::from_values(vec![cells(&["a"])]).unwrap().is_empty());
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!(Filter::parse(None), Filter::All);
        assert_eq!(Filter::parse(Some("전체")), Filter::All);
        assert_eq!(Filter::parse(Some("ALL")), Filter::All);
        assert_eq!(Filter::parse(Some(" 중1 ")), Filter::Only("중1".to_string()));
    }

    #[test]
    fn test_filter_matches() {
        assert!(Filter::All.matches("초4"));
        assert!(Filter::Only("초4".to_string()).matches("초4"));
        assert!(!Filter::Only("초4".to_string()).matches("초5"));
        assert!(Filter::parse(Some(" 중1")).matches("중1 "));
        assert!(!Filter::parse(Some("중1")).matches("중 1"));
    }

    #[test]
    fn test_rescaled_scores() {
        let row = AggregateRow {
            label: ALL_LABEL.to_string(),
            key: vec![],
            respondents: 3,
            scores: vec![4.0, 2.5],
            benchmark: None,
            tier: None,
            is_overall: false,
        };
        assert_eq!(row.ten_point(), vec![8.0, 5.0]);
        assert_eq!(row.twenty_point(), vec![16.0, 10.0]);
        assert!(!row.is_empty_partition());
    }
}
