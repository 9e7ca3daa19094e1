//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Log verbosity level for CLI output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Only show errors
    Error,
    /// Show warnings and errors
    Warn,
    /// Show informational messages, warnings, and errors (default)
    #[default]
    Info,
    /// Show debug messages and above
    Debug,
    /// Show all messages including trace-level details
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Bootstrap a pinned, checksum-verified tool release and self-update it.
#[derive(Debug, Parser)]
#[command(name = "toolstrap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log verbosity (RUST_LOG takes precedence when set)
    #[arg(long, global = true, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download, verify and install the tool
    Install(InstallArgs),

    /// Print where the tool is (or would be) installed
    Path(PathArgs),

    /// Print the bootstrap artifact that would be downloaded
    Artifact(ArtifactArgs),
}

/// Arguments for `toolstrap install`.
#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Version for the tool to update itself to (e.g., "v3.1.0").
    /// If not specified, the tool picks its own default.
    #[arg(value_name = "VERSION", env = "INPUT_VERSION")]
    pub version: Option<String>,

    /// Append the tool's bin directory to this file (CI path file)
    #[arg(long, value_name = "FILE", env = "GITHUB_PATH")]
    pub path_file: Option<PathBuf>,

    /// Write `install-path` and `version` outputs to this file
    #[arg(long, value_name = "FILE", env = "GITHUB_OUTPUT")]
    pub output_file: Option<PathBuf>,

    /// Wrap install logs in collapsible CI log groups
    #[arg(
        long,
        env = "GITHUB_ACTIONS",
        value_name = "BOOL",
        action = clap::ArgAction::Set,
        value_parser = parse_flag,
        default_value = "false"
    )]
    pub ci_groups: bool,

    /// Overall download timeout in seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Directory to create temporary workspaces in
    #[arg(long, value_name = "DIR")]
    pub temp_dir: Option<PathBuf>,
}

/// Arguments for `toolstrap path`.
#[derive(Debug, Args)]
pub struct PathArgs {
    /// Operating system to resolve for (darwin, linux, windows); defaults to this host
    #[arg(long)]
    pub os: Option<String>,
}

/// Arguments for `toolstrap artifact`.
#[derive(Debug, Args)]
pub struct ArtifactArgs {
    /// Operating system (darwin, linux, windows); defaults to this host
    #[arg(long)]
    pub os: Option<String>,

    /// CPU architecture (amd64, arm64); defaults to this host
    #[arg(long)]
    pub arch: Option<String>,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

/// Accept the loose boolean spellings CI systems put in environment variables.
fn parse_flag(s: &str) -> Result<bool, String> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("expected true or false, got {other:?}")),
    }
}
