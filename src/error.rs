use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors that abort a whole run
#[derive(Error, Debug)]
pub enum CheckerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No valid schema found at root {location}: {source}")]
    RootUnresolvable {
        location: String,
        #[source]
        source: LoadError,
    },

    #[error("Refusing to overwrite existing reference output file: {path}")]
    OutputPathExists { path: PathBuf },

    #[error("Failed to serialize reference output: {details}")]
    Serialize { details: String },

    #[error("Traversal cancelled after {rounds} completed rounds")]
    Cancelled { rounds: usize },

    #[error("Concurrent operation error: {details}")]
    Concurrency { details: String },
}

/// Per-location failures raised by the document loader.
///
/// These never abort a traversal; the engine records the location as missing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Alias target for {location} does not exist: {path}")]
    AliasTargetMissing { location: String, path: PathBuf },

    #[error("Failed to read local document {path}: {details}")]
    AliasRead { path: PathBuf, details: String },

    #[error("Fetch failed for {url}{}: {cause}", status_suffix(.status))]
    Fetch {
        url: String,
        status: Option<u16>,
        cause: String,
    },

    #[error("Request timeout: {url} after {timeout_seconds} seconds")]
    Timeout { url: String, timeout_seconds: u64 },

    #[error("Content type mismatch for {url}: expected XML, got {content_type}")]
    ContentTypeMismatch {
        url: String,
        status: u16,
        content_type: String,
    },

    #[error("Empty response body from {url}")]
    EmptyBody { url: String, status: u16 },

    #[error("Parse error in {source_name}: {details}")]
    Parse {
        source_name: String,
        details: String,
    },

    #[error("Cannot resolve relative reference {location} without a root host")]
    UnresolvableInFileMode { location: String },

    #[error("Suspicious tags in {location}: {}", .tags.join(", "))]
    SuspiciousTags { location: String, tags: Vec<String> },
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {})", code),
        None => String::new(),
    }
}

impl LoadError {
    /// HTTP status attached to this failure, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            LoadError::Fetch { status, .. } => *status,
            LoadError::EmptyBody { status, .. } | LoadError::ContentTypeMismatch { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// Configuration-specific error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),

    #[error("Alias file not found: {path}")]
    AliasFileNotFound { path: PathBuf },

    #[error("Invalid alias entry {key}: {reason}")]
    InvalidAlias { key: String, reason: String },

    #[error("Invalid glob pattern '{pattern}': {details}")]
    InvalidGlob { pattern: String, details: String },
}

/// Result type alias for fatal errors
pub type Result<T> = std::result::Result<T, CheckerError>;

/// Loader result type alias
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
