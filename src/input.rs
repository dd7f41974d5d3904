//! Local CSV exports.
//!
//! A sheet downloaded as CSV carries the same header + rows layout as the
//! API response, so it can stand in for the spreadsheet source.

use crate::error::SurveyResult;
use crate::models::RawTable;
use std::path::Path;
use tracing::debug;

/// Read a CSV file into a [`RawTable`]; the first record is the header.
///
/// Records may have differing lengths; width is checked by the normalizer.
pub fn read_csv(path: &Path) -> SurveyResult<Option<RawTable>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record?;
        values.push(record.iter().map(String::from).collect::<Vec<_>>());
    }

    debug!("Read {} CSV records from {}", values.len(), path.display());
    Ok(RawTable::from_values(values))
}

/// Write a [`RawTable`] (header first) as CSV.
pub fn write_csv(table: &RawTable, path: &Path) -> SurveyResult<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;

    for row in table.to_values() {
        writer.write_record(&row)?;
    }
    writer.flush().map_err(csv::Error::from)?;

    Ok(())
}
