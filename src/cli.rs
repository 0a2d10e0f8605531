use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only the final summary and failures
    Quiet,
    /// Echo every attempted location
    #[default]
    Normal,
    /// Also show failure reasons, malformed references and tag diagnostics
    Verbose,
}

impl VerbosityLevel {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            VerbosityLevel::Quiet
        } else if verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    /// Default `tracing` filter directive for this verbosity
    pub fn log_directive(self) -> &'static str {
        match self {
            VerbosityLevel::Quiet => "warn",
            VerbosityLevel::Normal => "info",
            VerbosityLevel::Verbose => "debug",
        }
    }
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Human,
    Summary,
    Json,
}

/// Check that every schema referenced from a root CSDL document is reachable
#[derive(Parser, Debug, Clone)]
#[command(name = "schema-refcheck")]
#[command(
    about = "Follow edmx:Reference links from a root schema and report the ones that cannot be resolved"
)]
#[command(version)]
pub struct Cli {
    /// Root location: a $metadata URL, or a local file with --file
    #[arg(help = "URL of the root schema (or file path with --file)")]
    pub url: String,

    /// Treat the root as a local file
    #[arg(long = "file")]
    pub file: bool,

    /// Do not verify TLS certificates
    #[arg(long = "nochkcert")]
    pub no_check_cert: bool,

    /// JSON file mapping locations to local files
    #[arg(long = "alias")]
    pub alias: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    /// Write every captured reference element to this file
    #[arg(long = "refoutput")]
    pub refoutput: Option<PathBuf>,

    /// Configuration file (TOML or JSON)
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Quiet mode (summary and failures only)
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Maximum concurrent fetches per round
    #[arg(long = "concurrency")]
    pub concurrency: Option<usize>,

    /// Number of retry attempts for failed downloads
    #[arg(long = "retry-attempts")]
    pub retry_attempts: Option<u32>,

    /// Report suspicious tags without failing the document
    #[arg(long = "advisory-tags")]
    pub advisory_tags: bool,

    /// Fetch from the network when an alias target file is missing
    #[arg(long = "alias-fallback")]
    pub alias_fallback: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        VerbosityLevel::from_flags(self.verbose, self.quiet)
    }
}
