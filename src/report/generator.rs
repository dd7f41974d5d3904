//! Markdown and JSON report generation.
//!
//! This module assembles a [`Report`] from the aggregate rows and renders
//! it for people (Markdown) or other tools (JSON).

use crate::models::{AggregateRow, Report, ReportMetadata, SummaryLine, SummaryTable, ALL_LABEL};
use crate::survey::{radar_series, summary_table, to_long_form, Schema, SeriesLabels};
use anyhow::Result;

/// Build the report for one analysis pass.
///
/// Every non-overall row gets its own display table; the radar series
/// come from the same rows.
pub fn build_report(
    metadata: ReportMetadata,
    aggregates: Vec<AggregateRow>,
    schema: &Schema,
    labels: &SeriesLabels,
) -> Report {
    let grade = metadata.selection.grade.to_string();
    let tables = aggregates
        .iter()
        .filter(|row| !row.is_overall)
        .map(|row| summary_table(row, schema, &table_title(row, &grade)))
        .collect();
    let competencies = schema.group_names();
    let long_form = to_long_form(&aggregates, schema, &competencies);
    let radar = radar_series(&aggregates, schema, labels);

    Report {
        metadata,
        competencies,
        rows: aggregates,
        tables,
        long_form,
        radar,
    }
}

fn table_title(row: &AggregateRow, grade: &str) -> String {
    if row.key.is_empty() {
        format!("<{} 학년 학생 미래역량 평균 점수>", grade)
    } else {
        format!("<{} 학생 미래역량 평균 점수>", row.label)
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    // Title
    match report.metadata.school {
        Some(ref school) => output.push_str(&format!("# {} 학생 미래역량 분석 보고서\n\n", school)),
        None => output.push_str("# 학생 미래역량 분석 보고서\n\n"),
    }

    output.push_str(&generate_metadata_section(&report.metadata));

    for table in &report.tables {
        output.push_str(&generate_summary_table(table));
    }

    if report.rows.iter().filter(|r| !r.is_overall).count() > 1 {
        output.push_str(&generate_partition_section(report));
    }

    output.push_str(&generate_profile_section(report));

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    if let Some(ref school) = metadata.school {
        section.push_str(&format!("- **School:** {}\n", school));
    }
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Grade:** {}\n", metadata.selection.grade));
    section.push_str(&format!("- **Gender:** {}\n", metadata.selection.gender));
    if !metadata.selection.group_by.is_empty() {
        let fields: Vec<String> = metadata
            .selection
            .group_by
            .iter()
            .map(|f| f.to_string())
            .collect();
        section.push_str(&format!("- **Grouped By:** {}\n", fields.join(", ")));
    }
    section.push_str(&format!(
        "- **Respondents:** {} of {}\n",
        metadata.respondents, metadata.total_rows
    ));
    if let Some(ref sheet) = metadata.saved_to {
        section.push_str(&format!("- **Saved To Sheet:** {}\n", sheet));
    }
    section.push('\n');

    section
}

/// Generate one display table.
fn generate_summary_table(table: &SummaryTable) -> String {
    let mut section = String::new();
    let with_benchmark = table.total.benchmark.is_some();

    section.push_str(&format!("### {}\n\n", table.title));
    if with_benchmark {
        section.push_str("| 역량 | 본교 평균 | 10점 환산 | 20점 환산 | 대구 평균 |\n");
        section.push_str("|:---|:---:|:---:|:---:|:---:|\n");
    } else {
        section.push_str("| 역량 | 본교 평균 | 10점 환산 | 20점 환산 |\n");
        section.push_str("|:---|:---:|:---:|:---:|\n");
    }

    for line in &table.lines {
        section.push_str(&summary_line(line, false));
    }
    section.push_str(&summary_line(&table.total, true));
    section.push('\n');

    section
}

fn summary_line(line: &SummaryLine, bold: bool) -> String {
    let name = if bold {
        format!("**{}**", line.competency)
    } else {
        line.competency.clone()
    };
    let mut row = format!(
        "| {} | {:.1} | {:.1} | {:.1} |",
        name, line.average, line.ten_point, line.twenty_point
    );
    if let Some(benchmark) = line.benchmark {
        row.push_str(&format!(" {:.2} |", benchmark));
    }
    row.push('\n');
    row
}

/// Generate the per-partition overview, closed by the overall row.
fn generate_partition_section(report: &Report) -> String {
    let mut section = String::new();

    section.push_str("## Partitions\n\n");
    section.push_str("| 구분 | 응답 수 |");
    for name in &report.competencies {
        section.push_str(&format!(" {} |", name));
    }
    section.push_str(" 기준 |\n");
    section.push_str("|:---|:---:|");
    for _ in &report.competencies {
        section.push_str(":---:|");
    }
    section.push_str(":---:|\n");

    for row in &report.rows {
        let label = if row.is_overall {
            format!("**{}**", ALL_LABEL)
        } else {
            row.label.clone()
        };
        section.push_str(&format!("| {} | {} |", label, row.respondents));
        for score in &row.scores {
            section.push_str(&format!(" {:.2} |", score));
        }
        match row.tier {
            Some(tier) => section.push_str(&format!(" {} |\n", tier)),
            None => section.push_str(" - |\n"),
        }
    }

    let empty: Vec<&str> = report
        .rows
        .iter()
        .filter(|r| r.is_empty_partition())
        .map(|r| r.label.as_str())
        .collect();
    if !empty.is_empty() {
        section.push_str(&format!(
            "\n> ⚠️ No responses matched: {}. These rows are reported as zeros, \
             and the {} row averages them in, which pulls its scores down.\n",
            empty.join(", "),
            ALL_LABEL
        ));
    }
    section.push('\n');

    section
}

/// Generate the radar profile section as a series × competency table.
fn generate_profile_section(report: &Report) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "## <{} 학년 학생 미래역량 프로파일>\n\n",
        report.metadata.selection.grade
    ));

    if report.radar.is_empty() {
        section.push_str("No profile data.\n\n");
        return section;
    }

    section.push_str("| 계열 |");
    for name in &report.competencies {
        section.push_str(&format!(" {} |", name));
    }
    section.push_str("\n|:---|");
    for _ in &report.competencies {
        section.push_str(":---:|");
    }
    section.push('\n');

    let mut series: Vec<&str> = Vec::new();
    for point in &report.radar {
        if !series.contains(&point.series.as_str()) {
            series.push(&point.series);
        }
    }

    for name in series {
        section.push_str(&format!("| {} |", name));
        for competency in &report.competencies {
            let value = report
                .radar
                .iter()
                .find(|p| p.series == name && p.axis == *competency)
                .map(|p| p.value)
                .unwrap_or(0.0);
            section.push_str(&format!(" {:.2} |", value));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by competency-analyzer v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Filter, Selection, SourceInfo};
    use crate::survey::cohort::CohortTier;
    use crate::survey::IdentityField;
    use chrono::Utc;

    fn metadata(selection: Selection) -> ReportMetadata {
        ReportMetadata {
            school: Some("대구중".to_string()),
            source: SourceInfo::Sheets {
                spreadsheet_id: "abc123".to_string(),
                sheet: "설문지 응답 시트1".to_string(),
            },
            generated_at: Utc::now(),
            selection,
            respondents: 12,
            total_rows: 30,
            saved_to: Some("대구중".to_string()),
        }
    }

    fn row(label: &str, key: &[&str], respondents: usize, overall: bool) -> AggregateRow {
        AggregateRow {
            label: label.to_string(),
            key: key.iter().map(|k| k.to_string()).collect(),
            respondents,
            scores: vec![4.25, 3.5, 4.0, 4.75],
            benchmark: Some(vec![4.42, 4.17, 4.25, 4.34]),
            tier: Some(CohortTier::Middle1),
            is_overall: overall,
        }
    }

    fn single_report() -> Report {
        let selection = Selection {
            grade: Filter::Only("중1".to_string()),
            ..Selection::default()
        };
        build_report(
            metadata(selection),
            vec![row("전체", &[], 12, false), row("전체", &[], 12, true)],
            &Schema::daegu(),
            &SeriesLabels::default(),
        )
    }

    #[test]
    fn test_build_report() {
        let report = single_report();
        assert_eq!(report.tables.len(), 1);
        assert_eq!(report.tables[0].title, "<중1 학년 학생 미래역량 평균 점수>");
        assert_eq!(report.competencies.len(), 4);
        // school and benchmark series over four axes
        assert_eq!(report.radar.len(), 8);
        // partition and overall row over four axes
        assert_eq!(report.long_form.len(), 8);
        assert_eq!(report.long_form[0].axis, "공감소통역량");
    }

    #[test]
    fn test_generate_markdown_report() {
        let markdown = generate_markdown_report(&single_report());

        assert!(markdown.contains("# 대구중 학생 미래역량 분석 보고서"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("<중1 학년 학생 미래역량 평균 점수>"));
        assert!(markdown.contains("| 공감소통역량 | 4.2 | 8.4 | 16.8 | 4.42 |"));
        assert!(markdown.contains("| 본교 평균 |"));
        assert!(markdown.contains("| 대구 평균 |"));
        assert!(!markdown.contains("## Partitions"));
    }

    #[test]
    fn test_generate_metadata_section() {
        let section = generate_metadata_section(&metadata(Selection {
            group_by: vec![IdentityField::Grade, IdentityField::Gender],
            ..Selection::default()
        }));

        assert!(section.contains("abc123"));
        assert!(section.contains("- **Grade:** 전체"));
        assert!(section.contains("- **Grouped By:** grade, gender"));
        assert!(section.contains("12 of 30"));
        assert!(section.contains("Saved To Sheet:"));
    }

    #[test]
    fn test_partition_section_lists_empty_partitions() {
        let selection = Selection {
            group_by: vec![IdentityField::Grade],
            ..Selection::default()
        };
        let mut empty = row("중2", &["중2"], 0, false);
        empty.scores = vec![0.0; 4];
        let report = build_report(
            metadata(selection),
            vec![row("중1", &["중1"], 12, false), empty, row("전체", &[], 12, true)],
            &Schema::daegu(),
            &SeriesLabels::default(),
        );

        assert_eq!(report.tables.len(), 2);
        assert_eq!(report.tables[1].title, "<중2 학생 미래역량 평균 점수>");

        let markdown = generate_markdown_report(&report);
        assert!(markdown.contains("## Partitions"));
        assert!(markdown.contains("| **전체** | 12 |"));
        assert!(markdown.contains("No responses matched: 중2"));
        assert!(markdown.contains("the 전체 row averages them in, which pulls its scores down"));
        assert!(markdown.contains("| 중1 대구 평균 |"));
    }

    #[test]
    fn test_summary_table_without_benchmark() {
        let mut plain = row("전체", &[], 3, false);
        plain.benchmark = None;
        let table = summary_table(&plain, &Schema::daegu(), "t");
        let section = generate_summary_table(&table);
        assert!(section.contains("| 역량 | 본교 평균 | 10점 환산 | 20점 환산 |\n"));
        assert!(!section.contains("대구 평균"));
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&single_report()).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"tables\""));
        assert!(json.contains("\"radar\""));
        assert!(json.contains("\"long_form\""));
        assert!(json.contains("\"kind\": \"sheets\""));
    }
}
