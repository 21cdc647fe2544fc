//! Warden CLI - risk classification, previews and guarded execution from a
//! terminal.
//!
//! Exit codes: `0` on success, `1` on error, `2` when `check` or
//! `check-path` classify above `safe`.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use warden_activity::ExportFormat;
use warden_config::Config;
use warden_safety::PathOperation;
use warden_telemetry::{LogConfig, LogFormat};

mod commands;
mod context;
mod theme;

use commands::{check, logs, preview, run};
use theme::Theme;

pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_FAILURE: u8 = 1;
pub(crate) const EXIT_RISKY: u8 = 2;

/// Warden - safety and undo for host operations
#[derive(Parser)]
#[command(name = "warden")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Load configuration from this file only (no layering)
    #[arg(short, long, global = true, env = "WARDEN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a shell command
    Check {
        /// The command line
        command: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify access to a file path
    CheckPath {
        /// The path
        path: String,

        /// Kind of access
        #[arg(long, value_enum, default_value = "read")]
        op: PathOp,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Preview replacing a file with the content of another
    PreviewWrite {
        /// File that would be written
        path: PathBuf,

        /// File holding the new content
        new_file: PathBuf,

        /// Print the preview as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a command, asking for approval when it is risky
    Run {
        /// The command line
        command: String,

        /// Working directory
        #[arg(long)]
        cwd: Option<String>,

        /// Approve without prompting
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the persisted activity log
    Logs {
        /// Export instead of printing a table
        #[arg(long, value_enum)]
        format: Option<LogsFormat>,

        /// Only the most recent N entries
        #[arg(long)]
        limit: Option<usize>,

        /// Case-insensitive search over message and data
        #[arg(long)]
        search: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PathOp {
    Read,
    Write,
    Delete,
}

impl From<PathOp> for PathOperation {
    fn from(op: PathOp) -> Self {
        match op {
            PathOp::Read => Self::Read,
            PathOp::Write => Self::Write,
            PathOp::Delete => Self::Delete,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LogsFormat {
    Json,
    Csv,
    Txt,
}

impl From<LogsFormat> for ExportFormat {
    fn from(format: LogsFormat) -> Self {
        match format {
            LogsFormat::Json => Self::Json,
            LogsFormat::Csv => Self::Csv,
            LogsFormat::Txt => Self::Txt,
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::load_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => {
            let workspace_root = std::env::current_dir().ok();
            Config::load(workspace_root.as_deref()).context("failed to load configuration")
        },
    }
}

fn log_config(config: &Config, verbose: bool) -> LogConfig {
    let logging = &config.logging;
    let level = if verbose { "debug" } else { logging.level.as_str() };
    LogConfig::from_parts(level, &logging.format, &logging.directives).unwrap_or_else(|e| {
        eprintln!("Invalid logging configuration: {e}");
        LogConfig::new(level).with_format(LogFormat::Compact)
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", Theme::error(&format!("{e:#}")));
            ExitCode::from(EXIT_FAILURE)
        },
    }
}

async fn dispatch(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli)?;
    if let Err(e) = warden_telemetry::setup_logging(&log_config(&config, cli.verbose)) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match cli.command {
        Commands::Check { command, json } => check::check_command(&command, json),
        Commands::CheckPath { path, op, json } => check::check_path(&path, op.into(), json),
        Commands::PreviewWrite {
            path,
            new_file,
            json,
        } => {
            preview::preview_write(context::preview_generator(&config), &path, &new_file, json)
                .await?;
            Ok(ExitCode::from(EXIT_SUCCESS))
        },
        Commands::Run { command, cwd, yes } => {
            let guard = context::build_guard(&config).await?;
            run::run_command(&guard, &command, cwd, yes).await
        },
        Commands::Logs {
            format,
            limit,
            search,
        } => {
            let logger = context::open_activity(&config).await?;
            logs::show_logs(&logger, format.map(Into::into), search.as_deref(), limit)?;
            Ok(ExitCode::from(EXIT_SUCCESS))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check_path() {
        let cli = Cli::try_parse_from(["warden", "check-path", "/etc/hosts", "--op", "write"]).unwrap();
        let Commands::CheckPath { path, op, json } = cli.command else {
            panic!("expected check-path");
        };
        assert_eq!(path, "/etc/hosts");
        assert_eq!(PathOperation::from(op), PathOperation::Write);
        assert!(!json);
    }

    #[test]
    fn test_parse_logs_format() {
        let cli = Cli::try_parse_from(["warden", "logs", "--format", "csv", "--limit", "5"]).unwrap();
        let Commands::Logs { format, limit, .. } = cli.command else {
            panic!("expected logs");
        };
        assert_eq!(format.map(ExportFormat::from), Some(ExportFormat::Csv));
        assert_eq!(limit, Some(5));
    }

    #[test]
    fn test_verbose_overrides_level() {
        let config = Config::default();
        assert_eq!(log_config(&config, true).level, "debug");
        assert_eq!(log_config(&config, false).level, "info");
    }
}
