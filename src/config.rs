use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::cli::{Cli, OutputFormat, VerbosityLevel};
use crate::error::{ConfigError, ConfigResult as Result};
use crate::http_client::HttpClientConfig;
use crate::loader::LoaderConfig;
use crate::tags::TagCheckMode;
use crate::traversal::TraversalConfig;

const ENV_PREFIX: &str = "SCHEMA_REFCHECK_";
const MAX_CONCURRENCY: usize = 256;
const MAX_RETRY_DELAY_MS: u64 = 60_000;

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub traversal: TraversalSettings,
    pub output: OutputConfig,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// HTTP request timeout in seconds
    pub timeout_seconds: u64,
    /// Verify TLS certificates
    pub verify_certificates: bool,
    /// Number of retry attempts for failed downloads
    pub retry_attempts: u32,
    /// Retry delay in milliseconds
    pub retry_delay_ms: u64,
    /// Concurrent fetches per round; number of CPUs when unset
    pub max_concurrent_fetches: Option<usize>,
}

/// Traversal and loader behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TraversalSettings {
    pub tag_mode: TagCheckMode,
    pub alias_fallback: bool,
    /// Maximum number of parsed documents kept in memory
    pub cache_capacity: u64,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub verbose: bool,
    pub quiet: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            verify_certificates: true,
            retry_attempts: 0,
            retry_delay_ms: 1000,
            max_concurrent_fetches: None,
        }
    }
}

impl Default for TraversalSettings {
    fn default() -> Self {
        Self {
            tag_mode: TagCheckMode::Strict,
            alias_fallback: false,
            cache_capacity: 1000,
        }
    }
}

impl Config {
    pub fn verbosity(&self) -> VerbosityLevel {
        VerbosityLevel::from_flags(self.output.verbose, self.output.quiet)
    }

    pub fn concurrency(&self) -> usize {
        self.network
            .max_concurrent_fetches
            .unwrap_or_else(|| num_cpus::get().min(MAX_CONCURRENCY))
    }

    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            timeout_seconds: self.network.timeout_seconds,
            verify_certificates: self.network.verify_certificates,
            retry_attempts: self.network.retry_attempts,
            retry_delay_ms: self.network.retry_delay_ms,
            ..Default::default()
        }
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            tag_mode: self.traversal.tag_mode,
            alias_fallback: self.traversal.alias_fallback,
            cache_capacity: self.traversal.cache_capacity,
        }
    }

    pub fn traversal_config(&self) -> TraversalConfig {
        TraversalConfig {
            max_concurrent_fetches: self.concurrency(),
        }
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: defaults -> file -> environment -> CLI
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        Self::load_config_with(cli, &SystemEnvProvider).await
    }

    pub async fn load_config_with(cli: &Cli, env: &impl EnvProvider) -> Result<Config> {
        let mut config = match &cli.config {
            Some(config_path) => Self::load_from_file(config_path).await?,
            None => Self::find_config_file().await?.unwrap_or_default(),
        };

        config = Self::apply_environment_overrides_with(env, config)?;
        config = Self::merge_with_cli(config, cli);

        Self::validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find configuration file in standard locations
    pub async fn find_config_file() -> Result<Option<Config>> {
        let config_names = [
            "schema-refcheck.toml",
            "schema-refcheck.json",
            ".schema-refcheck.toml",
            ".schema-refcheck.json",
        ];

        let mut search_dirs = vec![PathBuf::from(".")];
        if let Some(config_dir) = dirs::config_dir() {
            search_dirs.push(config_dir.join("schema-refcheck"));
        }

        for dir in search_dirs {
            for name in &config_names {
                let path = dir.join(name);
                if path.exists() {
                    return Ok(Some(Self::load_from_file(&path).await?));
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        // Network settings
        if let Some(timeout) = parse_env(env, "TIMEOUT")? {
            config.network.timeout_seconds = timeout;
        }
        if let Some(retry_attempts) = parse_env(env, "RETRY_ATTEMPTS")? {
            config.network.retry_attempts = retry_attempts;
        }
        if let Some(concurrency) = parse_env(env, "CONCURRENCY")? {
            config.network.max_concurrent_fetches = Some(concurrency);
        }
        if let Some(no_check) = parse_env::<bool>(env, "NOCHKCERT")? {
            config.network.verify_certificates = !no_check;
        }

        // Traversal settings
        if let Some(mode) = env.get(&format!("{}TAG_MODE", ENV_PREFIX)) {
            config.traversal.tag_mode = match mode.to_lowercase().as_str() {
                "strict" => TagCheckMode::Strict,
                "advisory" => TagCheckMode::Advisory,
                _ => {
                    return Err(ConfigError::Environment(format!(
                        "Invalid {}TAG_MODE value: {}",
                        ENV_PREFIX, mode
                    )));
                }
            };
        }
        if let Some(fallback) = parse_env(env, "ALIAS_FALLBACK")? {
            config.traversal.alias_fallback = fallback;
        }

        // Output settings
        if let Some(format) = env.get(&format!("{}FORMAT", ENV_PREFIX)) {
            config.output.format = match format.to_lowercase().as_str() {
                "human" => OutputFormat::Human,
                "summary" => OutputFormat::Summary,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::Environment(format!(
                        "Invalid {}FORMAT value: {}",
                        ENV_PREFIX, format
                    )));
                }
            };
        }
        if let Some(verbose) = parse_env(env, "VERBOSE")? {
            config.output.verbose = verbose;
        }
        if let Some(quiet) = parse_env(env, "QUIET")? {
            config.output.quiet = quiet;
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence)
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        // Network settings
        if let Some(timeout) = cli.timeout {
            config.network.timeout_seconds = timeout;
        }
        if let Some(retry_attempts) = cli.retry_attempts {
            config.network.retry_attempts = retry_attempts;
        }
        if cli.concurrency.is_some() {
            config.network.max_concurrent_fetches = cli.concurrency;
        }
        if cli.no_check_cert {
            config.network.verify_certificates = false;
        }

        // Traversal settings
        if cli.advisory_tags {
            config.traversal.tag_mode = TagCheckMode::Advisory;
        }
        if cli.alias_fallback {
            config.traversal.alias_fallback = true;
        }

        // Output settings
        if let Some(format) = cli.format {
            config.output.format = format;
        }
        if cli.verbose {
            config.output.verbose = true;
            config.output.quiet = false;
        }
        if cli.quiet {
            config.output.quiet = true;
            config.output.verbose = false;
        }

        config
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if config.network.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if config.network.retry_attempts > 10 {
            return Err(ConfigError::Validation(
                "Retry attempts cannot exceed 10".to_string(),
            ));
        }

        if config.network.retry_delay_ms > MAX_RETRY_DELAY_MS {
            return Err(ConfigError::Validation(format!(
                "Retry delay cannot exceed {} ms",
                MAX_RETRY_DELAY_MS
            )));
        }

        if let Some(concurrency) = config.network.max_concurrent_fetches
            && !(1..=MAX_CONCURRENCY).contains(&concurrency)
        {
            return Err(ConfigError::Validation(format!(
                "Concurrency must be between 1 and {}",
                MAX_CONCURRENCY
            )));
        }

        if config.traversal.cache_capacity == 0 {
            return Err(ConfigError::Validation(
                "Cache capacity must be greater than 0".to_string(),
            ));
        }

        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_env<T: FromStr>(env: &impl EnvProvider, name: &str) -> Result<Option<T>> {
    let key = format!("{}{}", ENV_PREFIX, name);
    match env.get(&key) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Environment(format!("Invalid {} value: {}", key, value))),
        None => Ok(None),
    }
}
