//! Grid CLI - Command-line interface for Eventgrid
//!
//! Commands:
//! - report: Build a dashboard report from a JSON request
//! - dates: Expand a date range
//! - describe: Describe raw app events (NDJSON)
//! - doctor: Diagnose configuration and environment

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use eventgrid::dates::{DateRange, EndDate};
use eventgrid::events::{DescriptionContext, Event};
use eventgrid::{GridConfig, GridError, GridProcessor, ReportKind, ReportRequest};
use eventgrid::{GRID_VERSION, PRODUCER_NAME};

/// Grid - Render per-user daily event logs into dashboard grids
#[derive(Parser)]
#[command(name = "grid")]
#[command(version = GRID_VERSION)]
#[command(about = "Render per-user daily event logs into dashboard grids", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a report from a JSON request
    Report {
        /// Report kind
        #[arg(long, value_enum)]
        kind: KindArg,

        /// Request file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json")]
        output_format: OutputFormat,

        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Reference timezone for resolving NOW (IANA format)
        #[arg(long)]
        timezone: Option<String>,

        /// Weeks per monthly window
        #[arg(long)]
        weeks: Option<usize>,
    },

    /// Expand a date range, one date per line
    Dates {
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// Last day (YYYY-MM-DD or NOW)
        #[arg(long)]
        end: String,

        /// Reference timezone for resolving NOW
        #[arg(long, default_value = "America/New_York")]
        timezone: String,
    },

    /// Describe raw app events, one JSON object per line
    Describe {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Description context file (story titles, family members)
        #[arg(long)]
        context: Option<PathBuf>,

        /// User id used to build edit links
        #[arg(long)]
        user_id: Option<String>,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Configuration file to check
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Attendance,
    Compare,
    Daily,
    Monthly,
}

impl From<KindArg> for ReportKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Attendance => ReportKind::Attendance,
            KindArg::Compare => ReportKind::Compare,
            KindArg::Daily => ReportKind::Daily,
            KindArg::Monthly => ReportKind::Monthly,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Report envelope as compact JSON
    Json,
    /// Pretty-printed report envelope
    JsonPretty,
    /// One user row per line
    Ndjson,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<(), GridCliError> {
    match cli.command {
        Commands::Report {
            kind,
            input,
            output,
            output_format,
            config,
            timezone,
            weeks,
        } => cmd_report(
            kind.into(),
            &input,
            &output,
            output_format,
            config.as_deref(),
            timezone,
            weeks,
        ),

        Commands::Dates {
            start,
            end,
            timezone,
        } => cmd_dates(&start, &end, &timezone),

        Commands::Describe {
            input,
            context,
            user_id,
        } => cmd_describe(&input, context.as_deref(), user_id.as_deref()),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn read_input(input: &Path) -> Result<String, GridCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_config(path: Option<&Path>) -> Result<GridConfig, GridCliError> {
    match path {
        Some(path) => Ok(GridConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(GridConfig::default()),
    }
}

fn cmd_report(
    kind: ReportKind,
    input: &Path,
    output: &Path,
    output_format: OutputFormat,
    config: Option<&Path>,
    timezone: Option<String>,
    weeks: Option<usize>,
) -> Result<(), GridCliError> {
    let mut config = load_config(config)?;
    if let Some(tz) = timezone {
        config.reference_timezone = tz;
    }
    if let Some(weeks) = weeks {
        config.num_weeks = weeks;
    }
    let processor = GridProcessor::with_config(config)?;

    let request: ReportRequest = serde_json::from_str(&read_input(input)?)?;
    let report = processor.build(kind, &request)?;

    let output_data = match output_format {
        OutputFormat::Json => serde_json::to_string(&report)? + "\n",
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&report)? + "\n",
        OutputFormat::Ndjson => {
            // ReportRows is untagged, so it serializes as a plain array of rows
            let rows = serde_json::to_value(&report.rows)?;
            let mut lines = String::new();
            for row in rows.as_array().into_iter().flatten() {
                lines.push_str(&serde_json::to_string(row)?);
                lines.push('\n');
            }
            lines
        }
    };

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_dates(start: &str, end: &str, timezone: &str) -> Result<(), GridCliError> {
    let clock = eventgrid::ReferenceClock::new(timezone)?;
    let start = eventgrid::dates::parse_date(start)?;
    let end = EndDate::parse(end)?.resolve(&clock, chrono::Utc::now());
    let range = DateRange::new(start, end)?;

    for date in range.date_strings() {
        println!("{}", date);
    }
    Ok(())
}

fn cmd_describe(
    input: &Path,
    context: Option<&Path>,
    user_id: Option<&str>,
) -> Result<(), GridCliError> {
    let ctx: DescriptionContext = match context {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => DescriptionContext::default(),
    };

    let reader: Box<dyn BufRead> = if input.to_string_lossy() == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        Box::new(BufReader::new(fs::File::open(input)?))
    };

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let event = Event::from_json(trimmed)?;
        let summary = DescribedEvent {
            event_name: event.kind.name().to_string(),
            description: event.description(&ctx)?,
            edit_uri: user_id.and_then(|u| event.edit_uri(u)),
            transcript: event.transcript(),
        };
        println!("{}", serde_json::to_string(&summary)?);
    }

    Ok(())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), GridCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "grid_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} version {}", PRODUCER_NAME, GRID_VERSION),
    });

    let config_check = match load_config(config) {
        Ok(cfg) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "timezone {}, {} week window, daily underflow {:?}, window underflow {:?}",
                cfg.reference_timezone, cfg.num_weeks, cfg.daily_underflow, cfg.window_underflow
            ),
        },
        Err(e) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Error,
            message: CliError::from(e).message,
        },
    };
    checks.push(config_check);

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Warning,
            message: "stdin is piped; use '-i -' to read requests from it".to_string(),
        }
    };
    checks.push(stdin_check);

    let failed = checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: GRID_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Grid Doctor");
        println!("===========");
        for check in &report.checks {
            let symbol = match check.status {
                CheckStatus::Ok => "✓",
                CheckStatus::Warning => "!",
                CheckStatus::Error => "✗",
            };
            println!("[{}] {}: {}", symbol, check.name, check.message);
        }
    }

    if failed {
        Err(GridCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum GridCliError {
    Io(io::Error),
    Grid(GridError),
    Json(serde_json::Error),
    DoctorFailed,
}

impl From<io::Error> for GridCliError {
    fn from(e: io::Error) -> Self {
        GridCliError::Io(e)
    }
}

impl From<GridError> for GridCliError {
    fn from(e: GridError) -> Self {
        GridCliError::Grid(e)
    }
}

impl From<serde_json::Error> for GridCliError {
    fn from(e: serde_json::Error) -> Self {
        GridCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<GridCliError> for CliError {
    fn from(e: GridCliError) -> Self {
        match e {
            GridCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            GridCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            GridCliError::Grid(e) => {
                let hint = match &e {
                    GridError::KeyLookup { .. } => {
                        Some("Logs and start dates must fall inside the requested users and dates")
                    }
                    GridError::IndexUnderflow { .. } => {
                        Some("Start the report earlier or set daily_underflow to skip or clamp")
                    }
                    GridError::WindowOutOfBounds { .. } | GridError::WindowTooWide { .. } => {
                        Some("Extend the end date or reduce --weeks")
                    }
                    GridError::InvalidRange { .. } => Some("start_date must not be after end_date"),
                    GridError::InvalidTimezone(_) => Some("Use an IANA name such as America/New_York"),
                    _ => None,
                };
                CliError {
                    code: "GRID_ERROR".to_string(),
                    message: e.to_string(),
                    hint: hint.map(str::to_string),
                }
            }
            GridCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DescribedEvent {
    event_name: String,
    description: Option<String>,
    edit_uri: Option<String>,
    transcript: Option<String>,
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
