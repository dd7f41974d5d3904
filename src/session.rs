//! Per-run session state.
//!
//! The raw responses and the current selection travel together; every
//! analysis re-runs the stateless pipeline over them.

use crate::error::SurveyResult;
use crate::models::{AggregateRow, NormalizedRow, RawTable, Selection, ALL_LABEL};
use crate::survey::{aggregate, distinct_values, normalize, IdentityField, Schema, ShortRows};

/// Responses loaded for one school plus what the user is looking at.
#[derive(Debug, Clone)]
pub struct Session {
    pub raw: RawTable,
    pub selection: Selection,
}

/// Output of one analysis pass.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub rows: Vec<NormalizedRow>,
    pub aggregates: Vec<AggregateRow>,
}

impl Analysis {
    /// Responses left after the grade/gender filters.
    pub fn respondents(&self) -> usize {
        self.aggregates
            .iter()
            .find(|r| r.is_overall)
            .map(|r| r.respondents)
            .unwrap_or(0)
    }
}

impl Session {
    pub fn new(raw: RawTable, selection: Selection) -> Self {
        Self { raw, selection }
    }

    /// Normalize and aggregate the session's responses.
    pub fn analyze(&self, schema: &Schema, short_rows: ShortRows, with_benchmark: bool) -> SurveyResult<Analysis> {
        let rows = normalize(&self.raw, schema, short_rows)?;
        let aggregates = aggregate(&rows, &self.selection, schema, with_benchmark);
        Ok(Analysis { rows, aggregates })
    }

    /// Grade choices offered to the user: `전체` then the sorted grades.
    pub fn grade_choices(&self, schema: &Schema, short_rows: ShortRows) -> SurveyResult<Vec<String>> {
        let rows = normalize(&self.raw, schema, short_rows)?;
        Ok(std::iter::once(ALL_LABEL.to_string())
            .chain(distinct_values(&rows, schema, IdentityField::Grade))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Filter;
    use crate::survey::schema::{default_identity_columns, CompetencyGroup};

    fn schema() -> Schema {
        Schema {
            identity: default_identity_columns(),
            groups: vec![CompetencyGroup::numbered("공감소통역량", 2)],
        }
    }

    fn raw() -> RawTable {
        let row = |grade: &str, a: &str, b: &str| -> Vec<String> {
            ["t", "남", grade, "1", "1", a, b]
                .iter()
                .map(|s| s.to_string())
                .collect()
        };
        RawTable {
            header: schema().column_names(),
            rows: vec![
                row("중2", "매우 그렇다.", "그렇다."),
                row("중1", "보통이다.", "전혀 그렇지 않다."),
            ],
        }
    }

    #[test]
    fn test_analyze_runs_pipeline() {
        let session = Session::new(raw(), Selection::default());
        let analysis = session.analyze(&schema(), ShortRows::Reject, true).unwrap();

        assert_eq!(analysis.rows.len(), 2);
        assert_eq!(analysis.respondents(), 2);
        assert!((analysis.aggregates[0].scores[0] - 3.25).abs() < 1e-9);
    }

    #[test]
    fn test_analyze_is_repeatable() {
        let selection = Selection {
            grade: Filter::Only("중1".to_string()),
            ..Selection::default()
        };
        let session = Session::new(raw(), selection);
        let first = session.analyze(&schema(), ShortRows::Reject, true).unwrap();
        let second = session.analyze(&schema(), ShortRows::Reject, true).unwrap();
        assert_eq!(first.aggregates, second.aggregates);
        assert_eq!(first.respondents(), 1);
    }

    #[test]
    fn test_grade_choices() {
        let session = Session::new(raw(), Selection::default());
        let choices = session.grade_choices(&schema(), ShortRows::Reject).unwrap();
        assert_eq!(choices, vec!["전체", "중1", "중2"]);
    }

    #[test]
    fn test_schema_mismatch_propagates() {
        let mut table = raw();
        table.rows[0].pop();
        let session = Session::new(table, Selection::default());
        assert!(session.analyze(&schema(), ShortRows::Reject, false).is_err());
    }
}
