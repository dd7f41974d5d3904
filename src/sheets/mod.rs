//! Spreadsheet collaborators.
//!
//! Reading survey responses from, and copying them into, Google Sheets.

pub mod client;
pub mod range;

pub use client::{ClientConfig, SheetsClient};
pub use range::extract_spreadsheet_id;
