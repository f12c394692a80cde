// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `devbat`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "devbat",
    version,
    about = "Run a test suite against an adb/fastboot attached device.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the test suite file (TOML).
    #[arg(short = 't', long, value_name = "PATH")]
    pub test_suite: PathBuf,

    /// Also report every case result through `lava-test-case`.
    #[arg(short = 'l', long)]
    pub lava: bool,

    /// Directory for the report file. Overrides `[report] dir`.
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,

    /// Report format (toml, json). Overrides `[report] format`.
    #[arg(long, value_name = "FMT")]
    pub report_format: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DEVBAT_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the suite, but don't touch any device.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
