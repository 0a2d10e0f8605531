//! Reporting and exit codes
//!
//! Renders a [`TraversalResult`] as human-readable text, a one-line summary or
//! a JSON document, echoes locations while they are processed, and writes the
//! reference dump file.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tokio::io::AsyncWriteExt;

use crate::cli::{OutputFormat, VerbosityLevel};
use crate::error::{CheckerError, Result};
use crate::location::{Location, RootContext};
use crate::references::{MalformedReference, ReferenceEntry};
use crate::traversal::{
    LocationOutcome, MissingReference, SuspiciousTags, TraversalProgress, TraversalResult,
};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_OUTPUT_EXISTS: i32 = 10;
pub const EXIT_INTERRUPTED: i32 = 130;

/// Exit code for a finished traversal
pub fn exit_code(result: &TraversalResult) -> i32 {
    if result.is_success() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}

/// Exit code for a run that ended in a fatal error
pub fn exit_code_for_error(error: &CheckerError) -> i32 {
    match error {
        CheckerError::OutputPathExists { .. } => EXIT_OUTPUT_EXISTS,
        CheckerError::Cancelled { .. } => EXIT_INTERRUPTED,
        _ => EXIT_FAILURE,
    }
}

/// Machine-readable report
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub root: &'a Location,
    pub success: bool,
    pub total_references: usize,
    pub rounds: usize,
    pub visited: &'a [Location],
    pub missing: &'a [MissingReference],
    pub malformed: &'a [MalformedReference],
    pub suspicious: &'a [SuspiciousTags],
}

/// Output formatter for traversal results
pub struct Reporter {
    format: OutputFormat,
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Reporter {
    pub fn new(format: OutputFormat, verbosity: VerbosityLevel) -> Self {
        Self {
            format,
            verbosity,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    pub fn with_colors(mut self, show_colors: bool) -> Self {
        self.show_colors = show_colors;
        self
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    /// Lines printed before the traversal starts
    pub fn format_header(&self, root: &RootContext) -> Option<String> {
        if self.format != OutputFormat::Human || self.verbosity == VerbosityLevel::Quiet {
            return None;
        }

        let mut output = String::new();
        if let Some(host) = &root.root_host {
            output.push_str(&format!("Root host: {}\n", host));
        }
        output.push_str(&format!("Root: {}", root.root_location));
        Some(output)
    }

    /// Echo line for one attempted location, if this format echoes progress
    pub fn format_progress(&self, progress: &TraversalProgress) -> Option<String> {
        if self.format != OutputFormat::Human || self.verbosity == VerbosityLevel::Quiet {
            return None;
        }
        let location = progress.location.as_ref()?;

        match progress.outcome.as_ref()? {
            LocationOutcome::Found { references } => {
                let mut line = format!("{}  {}", self.colorize("✓", "32"), location);
                if self.verbosity >= VerbosityLevel::Verbose {
                    line.push_str(&format!(" ({} new)", references));
                }
                Some(line)
            }
            LocationOutcome::Missing { reason } => {
                let mut line = format!("{}  {}", self.colorize("✗", "31"), location);
                if self.verbosity >= VerbosityLevel::Verbose {
                    line.push_str(&format!(" - {}", reason));
                }
                Some(line)
            }
        }
    }

    pub fn format_result(&self, root: &RootContext, result: &TraversalResult) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(self.format_human(result)),
            OutputFormat::Summary => Ok(self.format_summary(result)),
            OutputFormat::Json => self.format_json(root, result),
        }
    }

    fn format_human(&self, result: &TraversalResult) -> String {
        let mut output = String::new();

        if result.visited().is_empty() {
            output.push_str("No references found.\n");
        } else {
            let failures: Vec<String> = result.missing_locations().map(Location::to_string).collect();
            output.push_str(&format!(
                "Work complete, total failures: [{}]\n",
                failures.join(", ")
            ));
            output.push_str(&format!("Total references: {}\n", result.total_references()));
        }

        if !result.missing().is_empty() && self.verbosity > VerbosityLevel::Quiet {
            output.push_str(&format!("\n{}\n", self.colorize("Missing:", "31")));
            for missing in result.missing() {
                output.push_str(&format!("  {}  {}\n", missing.location, missing.reason));
            }
        }

        if self.verbosity >= VerbosityLevel::Verbose {
            if !result.malformed().is_empty() {
                output.push_str(&format!("\n{}\n", self.colorize("Malformed references:", "33")));
                for malformed in result.malformed() {
                    output.push_str(&format!(
                        "  reference #{} in {} has no Uri\n",
                        malformed.ordinal, malformed.source
                    ));
                }
            }
            if !result.suspicious().is_empty() {
                output.push_str(&format!("\n{}\n", self.colorize("Suspicious tags:", "33")));
                for suspicious in result.suspicious() {
                    output.push_str(&format!(
                        "  {}: {}\n",
                        suspicious.location,
                        suspicious.tags.join(", ")
                    ));
                }
            }
            output.push_str(&format!("\nRounds: {}\n", result.rounds()));
        }

        output
    }

    fn format_summary(&self, result: &TraversalResult) -> String {
        let status = if result.is_success() {
            self.colorize("OK", "32")
        } else {
            self.colorize("FAILED", "31")
        };
        format!(
            "{} references: {} missing: {} malformed: {}\n",
            status,
            result.total_references(),
            result.missing().len(),
            result.malformed().len()
        )
    }

    fn format_json(&self, root: &RootContext, result: &TraversalResult) -> Result<String> {
        let report = JsonReport {
            generated_at: Utc::now(),
            root: &root.root_location,
            success: result.is_success(),
            total_references: result.total_references(),
            rounds: result.rounds(),
            visited: result.visited(),
            missing: result.missing(),
            malformed: result.malformed(),
            suspicious: result.suspicious(),
        };
        serde_json::to_string_pretty(&report)
            .map(|mut json| {
                json.push('\n');
                json
            })
            .map_err(|e| CheckerError::Serialize {
                details: e.to_string(),
            })
    }
}

/// Fail early when the dump file already exists
pub fn ensure_output_available(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(CheckerError::OutputPathExists {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Pretty-printed copies of every captured reference element, one after another
pub fn render_reference_dump(captured: &[ReferenceEntry]) -> Result<String> {
    let mut output = String::new();
    for entry in captured {
        let xml = entry
            .element
            .to_pretty_xml()
            .map_err(|e| CheckerError::Serialize {
                details: e.to_string(),
            })?;
        output.push_str(&xml);
        output.push('\n');
    }
    Ok(output)
}

/// Write the reference dump, never replacing an existing file
pub async fn write_reference_dump(path: &Path, captured: &[ReferenceEntry]) -> Result<()> {
    let content = render_reference_dump(captured)?;

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => CheckerError::OutputPathExists {
                path: path.to_path_buf(),
            },
            _ => CheckerError::Io(e),
        })?;

    file.write_all(content.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}
