//! Ingestion: positional column assignment and Likert coding.

use crate::error::{SurveyError, SurveyResult};
use crate::models::{NormalizedRow, RawTable};
use crate::survey::likert;
use crate::survey::schema::Schema;
use tracing::debug;

/// How to treat data rows narrower than the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShortRows {
    /// Reject the table.
    #[default]
    Reject,
    /// Right-pad with blank cells (the Sheets API drops trailing blanks).
    Pad,
}

/// Normalize every data row of `raw` against `schema`.
///
/// The header row is ignored: columns are assigned by position. Any row
/// whose cell count differs from the schema width fails the whole table,
/// so no response is ever read under the wrong column.
pub fn normalize(
    raw: &RawTable,
    schema: &Schema,
    short_rows: ShortRows,
) -> SurveyResult<Vec<NormalizedRow>> {
    let width = schema.width();
    let identity_width = schema.identity.len();

    debug!(
        "Normalizing {} rows against a {}-column schema",
        raw.rows.len(),
        width
    );

    raw.rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let padded = row.len() < width && short_rows == ShortRows::Pad;
            if row.len() != width && !padded {
                return Err(SurveyError::SchemaMismatch {
                    row: index + 1,
                    expected: width,
                    actual: row.len(),
                });
            }

            let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");

            Ok(NormalizedRow {
                identity: (0..identity_width).map(|i| cell(i).to_string()).collect(),
                scores: (identity_width..width).map(|i| likert::score(cell(i))).collect(),
            })
        })
        .collect()
}

/// Render normalized rows back into a table (identity text, numeric scores).
pub fn to_raw(rows: &[NormalizedRow], schema: &Schema) -> RawTable {
    RawTable {
        header: schema.column_names(),
        rows: rows
            .iter()
            .map(|row| {
                row.identity
                    .iter()
                    .cloned()
                    .chain(row.scores.iter().map(|s| s.to_string()))
                    .collect()
            })
            .collect(),
    }
}
