//! Spreadsheet URL and A1-range helpers.

use crate::error::{SurveyError, SurveyResult};
use regex::Regex;
use std::sync::OnceLock;

fn sheet_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/d/([A-Za-z0-9_-]+)").expect("valid sheet id pattern"))
}

/// Extract the spreadsheet id from a Google Sheets URL.
///
/// `https://docs.google.com/spreadsheets/d/<id>/edit#gid=0` yields `<id>`.
pub fn extract_spreadsheet_id(url: &str) -> SurveyResult<String> {
    sheet_id_pattern()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| SurveyError::InvalidUrl {
            url: url.to_string(),
        })
}

/// Column letter for a 1-based column number (1 = `A`, 27 = `AA`).
pub fn column_letter(column: usize) -> String {
    let mut n = column;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Quote a sheet title for use in A1 notation.
pub fn quote_sheet(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

/// `'<sheet>'!A1:<last column><rows>` covering `width` columns.
pub fn a1_range(sheet: &str, width: usize, rows: usize) -> String {
    format!(
        "{}!A1:{}{}",
        quote_sheet(sheet),
        column_letter(width.max(1)),
        rows.max(1)
    )
}

/// Top-left anchor of a sheet, used for overwriting writes.
pub fn a1_origin(sheet: &str) -> String {
    format!("{}!A1", quote_sheet(sheet))
}
