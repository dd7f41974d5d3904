//! Error taxonomy for the survey pipeline and the spreadsheet collaborators.
//!
//! Every variant renders as a short sentence that can be shown to the user
//! as-is. Nothing here is retried; each error ends the current analysis.

use thiserror::Error;

/// Errors raised while loading, saving, or normalizing survey data.
#[derive(Error, Debug)]
pub enum SurveyError {
    /// The URL has no `/d/<id>` segment.
    #[error("not a valid Google Sheets URL: {url}")]
    InvalidUrl { url: String },

    /// The spreadsheet or the named sheet does not exist.
    #[error("spreadsheet or sheet not found: {target}")]
    SourceNotFound { target: String },

    /// The sheet exists but has no header or no data rows.
    #[error("no survey responses found in {target}")]
    SourceEmpty { target: String },

    /// The credential was rejected for this spreadsheet.
    #[error("access denied to {target}; share the sheet with the service account")]
    AccessDenied { target: String },

    /// The API rejected the requested A1 range.
    #[error("invalid range {range}: {detail}")]
    MalformedRange { range: String, detail: String },

    /// A data row does not have one cell per schema column.
    #[error("row {row} has {actual} cells but the survey schema expects {expected}")]
    SchemaMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// The spreadsheet service failed (quota, network, server error).
    #[error("spreadsheet service unavailable, please retry: {detail}")]
    UpstreamUnavailable { detail: String },

    /// The configured survey schema cannot be used.
    #[error("invalid survey schema: {detail}")]
    InvalidSchema { detail: String },

    /// A local CSV export could not be read or written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl SurveyError {
    /// Whether retrying the same action later might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SurveyError::UpstreamUnavailable { .. })
    }
}

/// Result alias used by the pipeline modules.
pub type SurveyResult<T> = std::result::Result<T, SurveyError>;
