use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use linky_core::{
    CaptureReport, Config, ConsumerRegistry, ReaderSource, RunSummary, compute_checksum,
    decode_capture_file, run_source,
};
use tracing::{Level, info};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("LINKY_BUILD_COMMIT"),
    " ",
    env!("LINKY_BUILD_DATE"),
    ")"
);

const DEFAULT_PORT: &str = "/dev/ttyUSB0";

#[derive(Parser, Debug)]
#[command(name = "linky")]
#[command(version = VERSION)]
#[command(
    about = "Decode Linky smart-meter tele-information (TIC) frames and fan them out to consumers.",
    long_about = None,
    after_help = "Examples:\n  linky run --config linky.toml\n  linky run --input capture.tic\n  linky decode capture.tic -o report.json\n  linky checksum PAPP 00750"
)]
struct Cli {
    /// Log verbosity: error, warn, info, debug or trace
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read the meter port (or a file, or `-` for stdin) and dispatch frames until EOF.
    Run {
        /// TOML configuration file [default: first of ~/.config/linky.toml,
        /// /etc/linky/linky.toml, /usr/local/etc/linky/linky.toml]
        #[arg(long, env = "LINKY_CONFIG")]
        config: Option<PathBuf>,

        /// Serial device, capture file or `-`
        #[arg(long, env = "LINKY_PORT", default_value = DEFAULT_PORT)]
        input: PathBuf,
    },
    /// Decode a recorded byte capture into a JSON report.
    #[command(
        after_help = "Examples:\n  linky decode capture.tic -o report.json\n  linky decode 'captures/*.tic' --stdout --pretty"
    )]
    Decode {
        /// Path (or glob matching exactly one file) of a raw TIC capture
        input: PathBuf,

        /// Output report path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON report to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
    /// Print the checksum character of a label/value pair.
    Checksum { label: String, value: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config, input } => cmd_run(config, input, cli.log_level),
        Commands::Decode {
            input,
            report,
            stdout,
            pretty,
            quiet,
        } => cmd_decode(input, report, stdout, pretty, quiet, cli.log_level),
        Commands::Checksum { label, value } => cmd_checksum(&label, &value),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn level_hint() -> Option<String> {
    Some("use one of error, warn, info, debug, trace".to_string())
}

fn init_logging(level: Level) {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn cmd_run(
    config_path: Option<PathBuf>,
    input: PathBuf,
    log_level: Option<String>,
) -> Result<(), CliError> {
    let config_path = config_path.or_else(|| Config::find_in(&Config::default_locations()));
    let mut config = match &config_path {
        Some(path) => Config::from_path(path).map_err(|err| {
            CliError::new(
                err.to_string(),
                Some(format!("check the TOML file {}", path.display())),
            )
        })?,
        None => Config::default(),
    };
    if let Some(level) = log_level {
        config.log_level = level;
    }
    let level = config
        .level()
        .map_err(|err| CliError::new(err.to_string(), level_hint()))?;
    init_logging(level);
    match &config_path {
        Some(path) => info!(config = %path.display(), "configuration loaded"),
        None => info!("no configuration file found, using defaults"),
    }

    let registry = ConsumerRegistry::with_builtins();
    let summary = if input == Path::new("-") {
        info!(input = "stdin", "reading");
        run_source(ReaderSource::new(io::stdin().lock()), &registry, &config)
            .context("reader pipeline failed")?
    } else {
        let file = File::open(&input).map_err(|err| {
            CliError::new(
                format!("cannot open input {}: {}", input.display(), err),
                Some("pass --input or set LINKY_PORT to the meter's serial device".to_string()),
            )
        })?;
        info!(input = %input.display(), "reading");
        run_source(ReaderSource::new(file), &registry, &config)
            .context("reader pipeline failed")?
    };
    log_summary(&summary);
    Ok(())
}

fn log_summary(summary: &RunSummary) {
    info!(
        connections = summary.connections,
        frames = summary.frames_detected,
        submitted = summary.frames_submitted,
        rejected = summary.frames_rejected,
        discarded_bytes = summary.discarded_bytes,
        "done"
    );
}

fn cmd_decode(
    input: PathBuf,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    quiet: bool,
    log_level: Option<String>,
) -> Result<(), CliError> {
    let level = match (quiet, log_level) {
        (true, _) => Level::ERROR,
        (false, Some(level)) => Level::from_str(&level).map_err(|_| {
            CliError::new(format!("invalid log level '{level}'"), level_hint())
        })?,
        (false, None) => Level::WARN,
    };
    init_logging(level);

    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;
    let report_path = if stdout {
        None
    } else {
        let path = report.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?;
        ensure_distinct_output(&resolved_input, &path)?;
        Some(path)
    };

    let rep = decode_capture_file(&resolved_input).context("TIC capture decoding failed")?;
    let json = serialize_report(&rep, pretty)?;

    let Some(report_path) = report_path else {
        println!("{}", json);
        return Ok(());
    };

    if let Some(parent) = report_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(&report_path, json)
        .with_context(|| format!("Failed to write report: {}", report_path.display()))?;

    if !quiet {
        eprintln!(
            "OK: {} frames ({} complete, {} partial, {} rejected) -> {}",
            rep.summary.frames_total,
            rep.summary.complete,
            rep.summary.partial,
            rep.summary.rejected,
            report_path.display()
        );
    }
    Ok(())
}

fn cmd_checksum(label: &str, value: &str) -> Result<(), CliError> {
    if label.is_empty() || label.contains(char::is_whitespace) {
        return Err(CliError::new(
            format!("invalid label '{label}'"),
            Some("labels are a single word, e.g. PAPP".to_string()),
        ));
    }
    if value.is_empty() || value.contains(char::is_whitespace) {
        return Err(CliError::new(
            format!("invalid value '{value}'"),
            Some("values are a single word, e.g. 00750".to_string()),
        ));
    }
    println!("{}", compute_checksum(label, value));
    Ok(())
}

fn serialize_report(rep: &CaptureReport, pretty: bool) -> Result<String, CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(rep)
    } else {
        serde_json::to_string(rep)
    };
    json.context("JSON serialization failed").map_err(Into::into)
}

fn ensure_distinct_output(input: &Path, report: &Path) -> Result<(), CliError> {
    let input_abs = fs::canonicalize(input)
        .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
    let parent = match report.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // A missing output directory cannot hold the input.
    let Ok(report_dir) = fs::canonicalize(parent) else {
        return Ok(());
    };
    let file_name = report
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid report path"))?;
    if report_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!("report path must differ from input: {}", report.display()),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("record a capture with e.g. `cat /dev/ttyUSB0 > capture.tic`".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use `linky run --input` for devices".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.len() > 1 {
        let listed = matches
            .iter()
            .take(3)
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let more = if matches.len() > 3 { ", ..." } else { "" };
        return Err(CliError::new(
            format!(
                "multiple files match pattern '{}' ({} matches); matches: {}{}",
                pattern,
                matches.len(),
                listed,
                more
            ),
            Some("pass a single capture file, or run once per file".to_string()),
        ));
    }

    matches.pop().ok_or_else(|| {
        CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        )
    })
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
