// crates/csvdata-cli/src/main.rs
// ============================================================================
// Module: csvdata CLI Entry Point
// Description: Command dispatcher for serving, ingesting, and querying.
// Purpose: Run the HTTP server or the services directly against local files.
// Dependencies: clap, csvdata-config, csvdata-core, csvdata-server, thiserror, tokio.
// ============================================================================

//! ## Overview
//! `csvdata serve` starts the HTTP server. `csvdata ingest` and
//! `csvdata query` run the same ingestion and query services against the
//! configured store without HTTP, which is useful for bulk loads and
//! inspection. Errors go to stderr with exit code 1.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use csvdata_config::CsvDataConfig;
use csvdata_core::FilterParams;
use csvdata_core::IngestService;
use csvdata_core::QueryService;
use csvdata_server::CsvDataServer;
use csvdata_server::build_store;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "csvdata", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server.
    Serve(ServeCommand),
    /// Ingest a local CSV file into the configured store.
    Ingest(IngestCommand),
    /// Render filtered rows from the configured store as HTML.
    Query(QueryCommand),
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to csvdata.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Configuration for the `ingest` command.
#[derive(Args, Debug)]
struct IngestCommand {
    /// Optional config file path (defaults to csvdata.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// CSV file to ingest.
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

/// Configuration for the `query` command.
#[derive(Args, Debug)]
struct QueryCommand {
    /// Optional config file path (defaults to csvdata.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Exact academic year filter.
    #[arg(long, value_name = "YEAR")]
    ac_year: Option<String>,
    /// Exact state name filter.
    #[arg(long, value_name = "STATE")]
    state_name: Option<String>,
    /// Maximum number of rows.
    #[arg(long, value_name = "N")]
    limit: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Errors raised while reading bounded input files.
#[derive(Debug, Error)]
enum ReadLimitError {
    /// I/O failure.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// File exceeds the byte limit.
    #[error("file size {size} exceeds limit {limit}")]
    TooLarge {
        /// Observed size in bytes.
        size: u64,
        /// Configured limit in bytes.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("csvdata {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Ingest(command) => command_ingest(&command),
        Commands::Query(command) => command_query(command),
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

/// Loads configuration for a command.
fn load_config(path: Option<&Path>) -> CliResult<CsvDataConfig> {
    CsvDataConfig::load(path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let bind = config.server.bind.clone();
    let server = CsvDataServer::from_config(config)
        .map_err(|err| CliError::new(format!("failed to start server: {err}")))?;
    write_stderr_line(&format!("csvdata listening on {bind}"))
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `ingest` command.
fn command_ingest(command: &IngestCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let content = read_bytes_with_limit(&command.file, config.server.max_body_bytes).map_err(
        |err| CliError::new(format!("failed to read {}: {err}", command.file.display())),
    )?;
    let file_name = command
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let store = build_store(&config).map_err(|err| CliError::new(err.to_string()))?;
    let service = IngestService::new(store, config.ingest.options());
    let report = service
        .ingest(&file_name, &content)
        .map_err(|err| CliError::new(format!("ingest failed: {err}")))?;
    let payload = serde_json::to_string(&report)
        .map_err(|err| CliError::new(format!("failed to encode report: {err}")))?;
    write_stdout_line(&payload).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `query` command.
fn command_query(command: QueryCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let store = build_store(&config).map_err(|err| CliError::new(err.to_string()))?;
    let params = FilterParams {
        ac_year: command.ac_year,
        state_name: command.state_name,
        limit: command.limit,
    };
    let document = QueryService::new(store)
        .query_filtered(&params)
        .map_err(|err| CliError::new(format!("query failed: {err}")))?;
    write_stdout_line(document.as_str())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: I/O Helpers
// ============================================================================

/// Reads a file, refusing anything larger than `max_bytes`.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Writes an error to stderr and returns the failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
