//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::{Filter, Selection};
use crate::survey::IdentityField;
use clap::Parser;
use std::path::PathBuf;

/// Competency Analyzer - school survey to competency report
///
/// Reads a school's Google Form responses, codes the Likert answers,
/// averages them per competency group and compares the result with the
/// regional benchmark.
///
/// Examples:
///   competency-analyzer --url https://docs.google.com/spreadsheets/d/ID/edit --school 대구중
///   competency-analyzer --csv responses.csv --grade 중1 --chart radar.svg
///   competency-analyzer --csv responses.csv --group-by grade,gender --include-all
///   competency-analyzer --csv responses.csv --list-grades
///   competency-analyzer --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Google Sheets URL of the school's response spreadsheet
    #[arg(
        short,
        long,
        value_name = "URL",
        required_unless_present_any = ["init_config", "csv"],
        conflicts_with = "csv"
    )]
    pub url: Option<String>,

    /// Local CSV export to read instead of Google Sheets
    #[arg(long, value_name = "FILE")]
    pub csv: Option<PathBuf>,

    /// School name; the raw responses are copied to a sheet with this title
    #[arg(short, long, value_name = "NAME")]
    pub school: Option<String>,

    /// Title of the sheet holding the form responses
    #[arg(long, value_name = "TITLE")]
    pub sheet: Option<String>,

    /// OAuth bearer token for the Google Sheets API
    #[arg(long, env = "GOOGLE_SHEETS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Spreadsheet id that collects every school's responses
    #[arg(long, value_name = "ID", env = "COMPETENCY_DESTINATION_ID")]
    pub destination: Option<String>,

    /// Grade to analyze (전체 for all grades)
    #[arg(short, long, value_name = "GRADE")]
    pub grade: Option<String>,

    /// Gender to analyze (전체 for everyone)
    #[arg(long, value_name = "GENDER")]
    pub gender: Option<String>,

    /// Identity fields to break results down by (comma-separated)
    ///
    /// Example: --group-by grade,gender
    #[arg(long, value_name = "FIELDS", value_delimiter = ',')]
    pub group_by: Vec<IdentityField>,

    /// Also report an 전체 partition ahead of the grouped ones
    #[arg(long)]
    pub include_all: bool,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write the radar chart as SVG to this path
    #[arg(long, value_name = "FILE")]
    pub chart: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .competency.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Pad rows that are short of the expected width with blank cells
    #[arg(long)]
    pub pad_short_rows: bool,

    /// Leave out the regional benchmark
    #[arg(long)]
    pub no_benchmark: bool,

    /// Do not copy the responses to the destination spreadsheet
    #[arg(long)]
    pub no_save: bool,

    /// Print the grades present in the responses and exit
    #[arg(long)]
    pub list_grades: bool,

    /// Write the normalized responses as CSV to this path
    #[arg(long, value_name = "FILE")]
    pub export_csv: Option<PathBuf>,

    /// Generate a default .competency.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        match (&self.url, &self.csv) {
            (None, None) => return Err("Either --url or --csv is required".to_string()),
            (Some(_), Some(_)) => return Err("Cannot use both --url and --csv".to_string()),
            _ => {}
        }

        if let Some(ref url) = self.url {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err("Spreadsheet URL must start with 'https://' or 'http://'".to_string());
            }
        }

        if let Some(ref path) = self.csv {
            if !path.is_file() {
                return Err(format!("CSV file does not exist: {}", path.display()));
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref school) = self.school {
            if school.trim().is_empty() {
                return Err("School name must not be blank".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// The grade/gender/grouping the user asked for.
    pub fn selection(&self) -> Selection {
        let mut group_by = Vec::with_capacity(self.group_by.len());
        for field in &self.group_by {
            if !group_by.contains(field) {
                group_by.push(*field);
            }
        }

        Selection {
            grade: Filter::parse(self.grade.as_deref()),
            gender: Filter::parse(self.gender.as_deref()),
            group_by,
            include_all: self.include_all,
        }
    }

    /// Whether the responses should be copied to the destination sheet.
    pub fn wants_save(&self) -> bool {
        !self.no_save && self.school.is_some() && self.url.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            url: Some("https://docs.google.com/spreadsheets/d/abc123/edit".to_string()),
            csv: None,
            school: None,
            sheet: None,
            token: None,
            destination: None,
            grade: None,
            gender: None,
            group_by: vec![],
            include_all: false,
            output: None,
            chart: None,
            format: OutputFormat::Markdown,
            config: None,
            verbose: false,
            quiet: false,
            timeout: None,
            pad_short_rows: false,
            no_benchmark: false,
            no_save: false,
            list_grades: false,
            export_csv: None,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_requires_source() {
        let mut args = make_args();
        args.url = None;
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_both_sources() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut args = make_args();
        args.csv = Some(file.path().to_path_buf());
        assert!(args.validate().is_err());

        args.url = None;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_csv() {
        let mut args = make_args();
        args.url = None;
        args.csv = Some(PathBuf::from("/nonexistent/responses.csv"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.url = Some("docs.google.com/spreadsheets".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_selection() {
        let mut args = make_args();
        args.grade = Some("중2".to_string());
        args.gender = Some("전체".to_string());
        args.group_by = vec![IdentityField::Grade, IdentityField::Gender, IdentityField::Grade];
        args.include_all = true;

        let selection = args.selection();
        assert_eq!(selection.grade, Filter::Only("중2".to_string()));
        assert_eq!(selection.gender, Filter::All);
        assert_eq!(selection.group_by, vec![IdentityField::Grade, IdentityField::Gender]);
        assert!(selection.include_all);
    }

    #[test]
    fn test_wants_save() {
        let mut args = make_args();
        assert!(!args.wants_save());

        args.school = Some("대구중".to_string());
        assert!(args.wants_save());

        args.no_save = true;
        assert!(!args.wants_save());
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "competency-analyzer",
            "--url",
            "https://docs.google.com/spreadsheets/d/abc/edit",
            "--group-by",
            "grade,class",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(args.group_by, vec![IdentityField::Grade, IdentityField::Class]);
        assert_eq!(args.format, OutputFormat::Json);
    }
}
