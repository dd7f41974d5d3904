//! Competency Analyzer - student future-competency survey reports
//!
//! A CLI tool that reads a school's Google Form responses, codes the
//! Likert answers, averages them per competency group and compares the
//! result with the regional benchmark.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad URL, access denied, schema mismatch, etc.)

mod cli;
mod config;
mod error;
mod input;
mod models;
mod report;
mod session;
mod sheets;
mod survey;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use error::SurveyError;
use indicatif::{ProgressBar, ProgressStyle};
use models::{RawTable, ReportMetadata, SourceInfo};
use session::Session;
use sheets::{extract_spreadsheet_id, ClientConfig, SheetsClient};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use survey::{IdentityField, Schema, SeriesLabels, ShortRows};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Where the effective configuration came from.
enum ConfigSource {
    Explicit(PathBuf),
    CurrentDir,
    Defaults,
    /// The default file exists but could not be used.
    Fallback(String),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let (config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };
    init_logging(level);

    info!("Competency Analyzer v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match source {
        ConfigSource::Explicit(ref path) => info!("Loaded config from: {}", path.display()),
        ConfigSource::CurrentDir => info!("Loaded default config from {}", CONFIG_FILE),
        ConfigSource::Defaults => debug!("No config file found, using defaults"),
        ConfigSource::Fallback(ref reason) => warn!("Failed to load config: {}", reason),
    }

    match run(args, config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            if is_retryable(&e) {
                eprintln!("   The spreadsheet service may be busy. Please try again shortly.");
            }
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .competency.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the survey layout, sheet names, and labels.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load configuration from file or use defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    let (mut config, source) = if let Some(ref config_path) = args.config {
        (Config::load(config_path)?, ConfigSource::Explicit(config_path.clone()))
    } else {
        match Config::load_default() {
            Ok(Some(config)) => (config, ConfigSource::CurrentDir),
            Ok(None) => (Config::default(), ConfigSource::Defaults),
            Err(e) => (Config::default(), ConfigSource::Fallback(format!("{:#}", e))),
        }
    };

    config.merge_with_args(args);
    Ok((config, source))
}

/// Run the complete analysis workflow.
async fn run(args: Args, config: Config) -> Result<()> {
    let start_time = Instant::now();

    let schema = Schema::from_config(&config.survey).context("Invalid [survey] configuration")?;
    let short_rows = if config.survey.pad_short_rows {
        ShortRows::Pad
    } else {
        ShortRows::Reject
    };
    debug!(
        "Schema: {} identity columns, {} groups, {} columns",
        schema.identity.len(),
        schema.groups.len(),
        schema.width()
    );

    // Step 1: Load the responses
    let (raw, source, saved_to) = match (&args.url, &args.csv) {
        (Some(url), _) => load_from_sheets(&args, &config, &schema, url).await?,
        (None, Some(path)) => {
            println!("📥 Reading responses: {}", path.display());
            let raw = input::read_csv(path)
                .with_context(|| format!("Failed to read {}", path.display()))?
                .filter(|table| !table.is_empty())
                .ok_or_else(|| SurveyError::SourceEmpty {
                    target: path.display().to_string(),
                })?;
            let source = SourceInfo::Csv {
                path: path.display().to_string(),
            };
            (raw, source, None)
        }
        (None, None) => anyhow::bail!("Either --url or --csv is required"),
    };
    info!("Loaded {} responses from {}", raw.rows.len(), source);

    let total_rows = raw.rows.len();
    let session = Session::new(raw, args.selection());

    // Handle --list-grades: print the choices and exit
    if args.list_grades {
        let choices = session.grade_choices(&schema, short_rows)?;
        println!(
            "\n🎓 {} values in the responses:",
            schema.identity_label(IdentityField::Grade)
        );
        for choice in choices {
            println!("   {}", choice);
        }
        return Ok(());
    }

    // Step 2: Normalize and aggregate
    println!("\n🔬 Analyzing responses...");
    let analysis = session.analyze(&schema, short_rows, config.report.include_benchmark)?;
    let respondents = analysis.respondents();

    if respondents == 0 {
        warn!(
            "No responses match grade={} gender={}",
            session.selection.grade, session.selection.gender
        );
    }

    if let Some(ref path) = args.export_csv {
        let table = survey::normalize::to_raw(&analysis.rows, &schema);
        input::write_csv(&table, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("   Normalized responses written to: {}", path.display());
    }

    // Step 3: Build the report
    println!("\n📝 Generating report...");

    let metadata = ReportMetadata {
        school: args.school.clone(),
        source,
        generated_at: Utc::now(),
        selection: session.selection.clone(),
        respondents,
        total_rows,
        saved_to,
    };
    let labels = SeriesLabels {
        school: config.report.school_label.clone(),
        benchmark: config.report.benchmark_label.clone(),
    };
    let report = report::build_report(metadata, analysis.aggregates, &schema, &labels);

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let output_path = report_path(&config.general.output, args.output.is_some(), args.format);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    if let Some(ref chart) = config.general.chart {
        let options = report::ChartOptions {
            title: format!("{} 학년 학생 미래역량 프로파일", session.selection.grade),
            ..report::ChartOptions::default()
        };
        let svg = report::render_radar_svg(&report.radar, &options)?;
        std::fs::write(chart, svg).with_context(|| format!("Failed to write chart to {}", chart))?;
        println!("   Radar chart saved to: {}", chart);
    }

    // Print summary
    println!("\n📊 Analysis Summary:");
    println!("   Respondents: {} of {}", respondents, total_rows);
    if let Some(overall) = report.rows.iter().find(|r| r.is_overall) {
        let ten = overall.ten_point();
        let twenty = overall.twenty_point();
        for (i, name) in report.competencies.iter().enumerate() {
            println!(
                "   - {}: {:.2} ({:.1}/10, {:.1}/20)",
                name, overall.scores[i], ten[i], twenty[i]
            );
        }
    }
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!(
        "\n✅ Analysis complete! Report saved to: {}",
        output_path.display()
    );

    Ok(())
}

/// Read the responses from Google Sheets and copy them to the destination.
async fn load_from_sheets(
    args: &Args,
    config: &Config,
    schema: &Schema,
    url: &str,
) -> Result<(RawTable, SourceInfo, Option<String>)> {
    let spreadsheet_id = extract_spreadsheet_id(url)?;
    let token = args
        .token
        .clone()
        .context("A Google Sheets token is required; pass --token or set GOOGLE_SHEETS_TOKEN")?;

    let client = SheetsClient::new(ClientConfig {
        api_base: config.sheets.api_base.clone(),
        token,
        timeout_seconds: config.sheets.timeout_seconds,
        max_rows: config.sheets.max_rows,
    })?;

    println!("📥 Reading responses: {}", spreadsheet_id);
    let spinner = spinner(args.quiet, "Fetching responses...");
    let loaded = client
        .load_table(&spreadsheet_id, &config.sheets.source_sheet, schema.width())
        .await;
    spinner.finish_and_clear();
    let raw = loaded?;

    let saved_to = if args.wants_save() {
        save_responses(args, config, &client, &raw).await?
    } else {
        None
    };

    let source = SourceInfo::Sheets {
        spreadsheet_id,
        sheet: config.sheets.source_sheet.clone(),
    };
    Ok((raw, source, saved_to))
}

/// Copy the raw responses into the school's sheet of the destination.
async fn save_responses(
    args: &Args,
    config: &Config,
    client: &SheetsClient,
    raw: &RawTable,
) -> Result<Option<String>> {
    let Some(ref school) = args.school else {
        return Ok(None);
    };
    let Some(ref destination) = config.sheets.destination_id else {
        warn!("No destination spreadsheet configured; responses were not saved");
        return Ok(None);
    };

    let spinner = spinner(args.quiet, "Saving responses...");
    let saved = client.save_table(destination, school, raw).await;
    spinner.finish_and_clear();
    let outcome = saved.with_context(|| format!("Failed to save responses to sheet '{}'", school))?;

    let verb = if outcome.created { "Created" } else { "Updated" };
    println!(
        "💾 {} sheet '{}' ({} rows, {})",
        verb, school, outcome.updated_rows, outcome.updated_range
    );
    Ok(Some(school.clone()))
}

/// A spinner on stderr, hidden in quiet mode.
fn spinner(quiet: bool, message: &str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Report path; a JSON report keeps the configured stem but not a `.md` extension.
fn report_path(configured: &str, explicit: bool, format: OutputFormat) -> PathBuf {
    let mut path = PathBuf::from(configured);
    let markdown_ext = path.extension().is_some_and(|ext| ext == "md");
    if format == OutputFormat::Json && !explicit && markdown_ext {
        path.set_extension("json");
    }
    path
}

fn is_retryable(error: &anyhow::Error) -> bool {
    error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<SurveyError>())
        .any(SurveyError::is_retryable)
}
