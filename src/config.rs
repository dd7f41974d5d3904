//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.competency.toml` files.

use crate::survey::schema::{default_identity_columns, IdentityColumn, DAEGU_GROUPS, DAEGU_ITEMS_PER_GROUP};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE: &str = ".competency.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Google Sheets settings.
    #[serde(default)]
    pub sheets: SheetsConfig,

    /// Survey layout.
    #[serde(default)]
    pub survey: SurveyConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default report path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Radar chart SVG path; no chart when unset.
    #[serde(default)]
    pub chart: Option<String>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            chart: None,
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "competency_report.md".to_string()
}

/// Google Sheets API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    /// API root URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Sheet holding the form responses.
    #[serde(default = "default_source_sheet")]
    pub source_sheet: String,

    /// Rows scanned when locating the populated range.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Central spreadsheet that collects every school's responses.
    #[serde(default)]
    pub destination_id: Option<String>,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            source_sheet: default_source_sheet(),
            max_rows: default_max_rows(),
            timeout_seconds: default_timeout(),
            destination_id: None,
        }
    }
}

fn default_api_base() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_source_sheet() -> String {
    "설문지 응답 시트1".to_string()
}

fn default_max_rows() -> usize {
    1000
}

fn default_timeout() -> u64 {
    30
}

/// Survey column layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    /// Competency group names in sheet order.
    #[serde(default = "default_groups")]
    pub groups: Vec<String>,

    /// Likert items per competency group.
    #[serde(default = "default_items_per_group")]
    pub items_per_group: usize,

    /// Pad rows that are short of the schema width with blanks.
    /// The Sheets API omits trailing empty cells.
    #[serde(default)]
    pub pad_short_rows: bool,

    /// Identity columns in sheet order.
    #[serde(default = "default_identity_columns")]
    pub identity: Vec<IdentityColumn>,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            groups: default_groups(),
            items_per_group: default_items_per_group(),
            pad_short_rows: false,
            identity: default_identity_columns(),
        }
    }
}

fn default_groups() -> Vec<String> {
    DAEGU_GROUPS.iter().map(|g| g.to_string()).collect()
}

fn default_items_per_group() -> usize {
    DAEGU_ITEMS_PER_GROUP
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Series label for the school's own averages.
    #[serde(default = "default_school_label")]
    pub school_label: String,

    /// Series label for the regional benchmark.
    #[serde(default = "default_benchmark_label")]
    pub benchmark_label: String,

    /// Compare against the regional benchmark.
    #[serde(default = "default_true")]
    pub include_benchmark: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            school_label: default_school_label(),
            benchmark_label: default_benchmark_label(),
            include_benchmark: true,
        }
    }
}

fn default_school_label() -> String {
    "본교 평균".to_string()
}

fn default_benchmark_label() -> String {
    "대구 평균".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.competency.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(ref chart) = args.chart {
            self.general.chart = Some(chart.display().to_string());
        }

        if let Some(ref sheet) = args.sheet {
            self.sheets.source_sheet = sheet.clone();
        }
        if let Some(ref destination) = args.destination {
            self.sheets.destination_id = Some(destination.clone());
        }
        if let Some(timeout) = args.timeout {
            self.sheets.timeout_seconds = timeout;
        }

        if args.pad_short_rows {
            self.survey.pad_short_rows = true;
        }
        if args.no_benchmark {
            self.report.include_benchmark = false;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::schema::{IdentityField, Schema};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sheets.source_sheet, "설문지 응답 시트1");
        assert_eq!(config.sheets.max_rows, 1000);
        assert_eq!(config.survey.groups.len(), 4);
        assert!(config.report.include_benchmark);
        assert_eq!(
            Schema::from_config(&config.survey).unwrap(),
            Schema::daegu()
        );
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "custom_report.md"
verbose = true

[sheets]
destination_id = "master-id"
max_rows = 500

[survey]
groups = ["자기관리역량", "공동체역량"]
items_per_group = 3
pad_short_rows = true

[[survey.identity]]
field = "timestamp"
label = "타임스탬프"

[[survey.identity]]
field = "grade"
label = "학년"

[report]
include_benchmark = false
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "custom_report.md");
        assert!(config.general.verbose);
        assert_eq!(config.sheets.destination_id.as_deref(), Some("master-id"));
        assert_eq!(config.sheets.max_rows, 500);
        assert_eq!(config.sheets.source_sheet, "설문지 응답 시트1");
        assert!(config.survey.pad_short_rows);
        assert!(!config.report.include_benchmark);

        let schema = Schema::from_config(&config.survey).unwrap();
        assert_eq!(schema.width(), 2 + 6);
        assert_eq!(schema.identity_index(IdentityField::Grade), Some(1));
        assert_eq!(schema.identity_index(IdentityField::Gender), None);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[sheets]"));
        assert!(toml_str.contains("[survey]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.survey.groups, Config::default().survey.groups);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(dir.path().join(CONFIG_FILE), "[sheets]\nmax_rows = 42\n").unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.sheets.max_rows, 42);

        std::fs::write(dir.path().join(CONFIG_FILE), "[sheets\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }
}
