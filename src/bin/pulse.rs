//! Pulse CLI - Command-line interface for the Pulse rollup engine
//!
//! Commands:
//! - dashboard: Compute one dashboard window
//! - hourly: Compute the hourly activity view
//! - classify: Classify a single active-user count
//! - ingest: Load feed records into a store snapshot
//! - validate: Validate feed record schema
//! - doctor: Diagnose configuration and store health

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::NaiveDateTime;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pulse_rollup::classifier::IntensityClassifier;
use pulse_rollup::encoder::{DashboardEncoder, DashboardView, PAYLOAD_VERSION};
use pulse_rollup::schema::{parse_timestamp, FeedAdapter, FeedRecord, FEED_SCHEMA_VERSION};
use pulse_rollup::seed::seeded_store;
use pulse_rollup::{Dashboard, DashboardConfig, MetricsError, ObservationStore};
use pulse_rollup::{PRODUCER_NAME, PULSE_VERSION};

/// Pulse - Time-series rollup engine for the admin analytics dashboard
#[derive(Parser)]
#[command(name = "pulse")]
#[command(author = "Pulse Contributors")]
#[command(version = PULSE_VERSION)]
#[command(about = "Roll up usage observations into dashboard datasets", long_about = None)]
struct Cli {
    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute one dashboard window
    Dashboard {
        /// Window name: 7d, 30d, 3m or 6m
        #[arg(short, long)]
        window: String,

        #[command(flatten)]
        source: StoreSource,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Compute the hourly activity view
    Hourly {
        #[command(flatten)]
        source: StoreSource,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Classify a single active-user count
    Classify {
        /// Active-user count
        #[arg(allow_hyphen_values = true)]
        count: i64,

        /// Dashboard configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Load feed records into a store snapshot
    Ingest {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Existing store snapshot to append to, in record order
        #[arg(long)]
        base: Option<PathBuf>,
    },

    /// Validate feed record schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and store health
    Doctor {
        /// Check configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Check store snapshot file
        #[arg(long)]
        store: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Where a view reads its observations from
#[derive(clap::Args)]
struct StoreSource {
    /// Store snapshot JSON (use - for stdin)
    #[arg(long, conflicts_with = "seed")]
    store: Option<PathBuf>,

    /// Use the built-in showcase data anchored at --now
    #[arg(long)]
    seed: bool,

    /// Reference instant (YYYY-MM-DD, YYYY-MM-DDTHH:MM:SS); defaults to local time
    #[arg(long)]
    now: Option<String>,

    /// Dashboard configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), PulseCliError> {
    match cli.command {
        Commands::Dashboard {
            window,
            source,
            output_format,
        } => cmd_dashboard(&window, &source, output_format),
        Commands::Hourly {
            source,
            output_format,
        } => cmd_hourly(&source, output_format),
        Commands::Classify { count, config } => cmd_classify(count, config.as_deref()),
        Commands::Ingest {
            input,
            output,
            input_format,
            base,
        } => cmd_ingest(&input, &output, input_format, base.as_deref()),
        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),
        Commands::Doctor { config, store, json } => {
            cmd_doctor(config.as_deref(), store.as_deref(), json)
        }
    }
}

fn cmd_dashboard(
    window: &str,
    source: &StoreSource,
    output_format: OutputFormat,
) -> Result<(), PulseCliError> {
    let now = resolve_now(source.now.as_deref())?;
    let dashboard = open_dashboard(source, now)?;

    let data = dashboard.get_dashboard_data_named(window, now)?;
    info!(window, points = data.series.len(), "dashboard computed");

    print_view(DashboardView::Window(data), &output_format)
}

fn cmd_hourly(source: &StoreSource, output_format: OutputFormat) -> Result<(), PulseCliError> {
    let now = resolve_now(source.now.as_deref())?;
    let dashboard = open_dashboard(source, now)?;

    let activity = dashboard.get_hourly_activity(now)?;
    info!(points = activity.series.len(), "hourly activity computed");

    print_view(DashboardView::Hourly(activity), &output_format)
}

fn cmd_classify(count: i64, config: Option<&Path>) -> Result<(), PulseCliError> {
    let config = load_config(config)?;
    let band = IntensityClassifier::classify(count, &config.thresholds)?;

    let report = ClassifyReport {
        active_users: count,
        band: band.as_str().to_string(),
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

fn cmd_ingest(
    input: &PathBuf,
    output: &PathBuf,
    input_format: InputFormat,
    base: Option<&Path>,
) -> Result<(), PulseCliError> {
    let records = read_records(input, &input_format)?;
    if records.is_empty() {
        return Err(PulseCliError::NoRecords);
    }

    let store = match base {
        Some(base_path) => {
            let mut store = ObservationStore::from_json(&read_input(base_path)?)?;
            let applied = FeedAdapter::apply(&mut store, &records)?;
            debug!(applied, "appended records to base store");
            store
        }
        None => FeedAdapter::build_store(&records)?,
    };
    info!(
        records = records.len(),
        samples = store.total_samples(),
        "store built"
    );

    write_output(output, &store.to_json()?)
}

fn cmd_validate(
    input: &PathBuf,
    input_format: InputFormat,
    json: bool,
) -> Result<(), PulseCliError> {
    let records = read_records(input, &input_format)?;

    // Validate each record
    let results = FeedAdapter::validate_records(&records);

    let report = ValidationReport {
        total_records: records.len(),
        valid_records: records.len() - results.len(),
        invalid_records: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                record_id: r.record_id.clone(),
                error: r.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Record {} (index {}): {}",
                    err.record_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_records > 0 {
        Err(PulseCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_doctor(config: Option<&Path>, store: Option<&Path>, json: bool) -> Result<(), PulseCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "pulse_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Pulse version {}", PULSE_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Feed schema: {}, payload version {}", FEED_SCHEMA_VERSION, PAYLOAD_VERSION),
    });

    if let Some(config_path) = config {
        checks.push(check_file("config", config_path, |content| {
            let config = DashboardConfig::from_toml(content)?;
            Ok(format!(
                "Configuration valid (bands {}/{}/{}, {} stat fields)",
                config.thresholds.low,
                config.thresholds.normal,
                config.thresholds.high,
                config.stat_fields.len()
            ))
        }));
    }

    if let Some(store_path) = store {
        checks.push(check_file("store", store_path, |content| {
            let store = ObservationStore::from_json(content)?;
            Ok(format!(
                "Store valid ({} hourly, {} daily, {} history samples)",
                store.hourly.len(),
                store.daily.len(),
                store.history.len()
            ))
        }));
    }

    // Check whether stdin can feed ingest/validate
    let stdin_message = if atty::is(atty::Stream::Stdin) {
        "stdin is a TTY (interactive mode)"
    } else {
        "stdin is a pipe (ready for - inputs)"
    };
    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: stdin_message.to_string(),
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: PULSE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Pulse Doctor Report");
        println!("===================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");
        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(PulseCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_file<F>(name: &str, path: &Path, parse: F) -> DoctorCheck
where
    F: FnOnce(&str) -> Result<String, MetricsError>,
{
    if !path.exists() {
        return DoctorCheck {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: format!("{} does not exist", path.display()),
        };
    }

    let (status, message) = match fs::read_to_string(path) {
        Ok(content) => match parse(&content) {
            Ok(message) => (CheckStatus::Ok, message),
            Err(e) => (CheckStatus::Error, format!("Invalid {name}: {e}")),
        },
        Err(e) => (CheckStatus::Error, format!("Cannot read {name} file: {e}")),
    };

    DoctorCheck {
        name: name.to_string(),
        status,
        message,
    }
}

// Helpers

fn resolve_now(now: Option<&str>) -> Result<NaiveDateTime, PulseCliError> {
    match now {
        Some(value) => Ok(parse_timestamp(value)?),
        None => Ok(chrono::Local::now().naive_local()),
    }
}

fn open_dashboard(source: &StoreSource, now: NaiveDateTime) -> Result<Dashboard, PulseCliError> {
    let config = load_config(source.config.as_deref())?;

    let store = if source.seed {
        seeded_store(now)?
    } else if let Some(path) = &source.store {
        ObservationStore::from_json(&read_input(path)?)?
    } else {
        return Err(PulseCliError::NoStore);
    };
    debug!(samples = store.total_samples(), "store loaded");

    Ok(Dashboard::with_config(store, config)?)
}

fn load_config(path: Option<&Path>) -> Result<DashboardConfig, PulseCliError> {
    match path {
        Some(path) => Ok(DashboardConfig::from_toml(&fs::read_to_string(path)?)?),
        None => Ok(DashboardConfig::default()),
    }
}

fn read_records(input: &Path, input_format: &InputFormat) -> Result<Vec<FeedRecord>, PulseCliError> {
    let input_data = read_input(input)?;
    let records = match input_format {
        InputFormat::Ndjson => FeedAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => FeedAdapter::parse_array(&input_data)?,
    };
    Ok(records)
}

fn read_input(path: &Path) -> Result<String, PulseCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn write_output(path: &Path, data: &str) -> Result<(), PulseCliError> {
    if path.to_string_lossy() == "-" {
        println!("{}", data);
    } else {
        fs::write(path, data)?;
    }
    Ok(())
}

fn print_view(view: DashboardView, output_format: &OutputFormat) -> Result<(), PulseCliError> {
    let encoder = DashboardEncoder::new();
    let output = match output_format {
        OutputFormat::Json => serde_json::to_string(&encoder.encode(view))?,
        OutputFormat::JsonPretty => encoder.encode_to_json(view)?,
    };
    println!("{}", output);
    Ok(())
}

// Error types

#[derive(Debug)]
enum PulseCliError {
    Io(io::Error),
    Metrics(MetricsError),
    Json(serde_json::Error),
    Validation(pulse_rollup::schema::ValidationError),
    NoRecords,
    NoStore,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for PulseCliError {
    fn from(e: io::Error) -> Self {
        PulseCliError::Io(e)
    }
}

impl From<MetricsError> for PulseCliError {
    fn from(e: MetricsError) -> Self {
        PulseCliError::Metrics(e)
    }
}

impl From<serde_json::Error> for PulseCliError {
    fn from(e: serde_json::Error) -> Self {
        PulseCliError::Json(e)
    }
}

impl From<pulse_rollup::schema::ValidationError> for PulseCliError {
    fn from(e: pulse_rollup::schema::ValidationError) -> Self {
        PulseCliError::Validation(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PulseCliError> for CliError {
    fn from(e: PulseCliError) -> Self {
        match e {
            PulseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PulseCliError::Metrics(e) => metrics_error(e),
            PulseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PulseCliError::Validation(e) => CliError {
                code: "VALIDATION_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Timestamps take the form YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS".to_string()),
            },
            PulseCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            PulseCliError::NoStore => CliError {
                code: "NO_STORE".to_string(),
                message: "No observation source given".to_string(),
                hint: Some("Pass --store FILE or --seed".to_string()),
            },
            PulseCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            PulseCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

fn metrics_error(e: MetricsError) -> CliError {
    let (code, hint) = match &e {
        MetricsError::UnknownWindow(_) => ("UNKNOWN_WINDOW", "Use one of 7d, 30d, 3m, 6m"),
        MetricsError::EmptyRange { .. } => (
            "EMPTY_RANGE",
            "The window holds no samples for this field; check --now and the store contents",
        ),
        MetricsError::OutOfOrder { .. } => (
            "OUT_OF_ORDER",
            "Records appended to a base store must be newer than what it holds",
        ),
        MetricsError::ConfigError(_) => ("CONFIG_ERROR", "Run 'pulse doctor --config FILE' for details"),
        MetricsError::InvalidInput(_) => ("INVALID_INPUT", "Run 'pulse validate' for details"),
        MetricsError::DateParseError(_) => (
            "DATE_PARSE_ERROR",
            "Timestamps take the form YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS",
        ),
        MetricsError::ParseError(_) | MetricsError::JsonError(_) => {
            ("PARSE_ERROR", "Ensure input matches pulse.feed_record.v1 schema")
        }
    };

    CliError {
        code: code.to_string(),
        message: e.to_string(),
        hint: Some(hint.to_string()),
    }
}

// Report types

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyReport {
    active_users: i64,
    band: String,
}

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    record_id: Option<String>,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
