//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// expstats - statistics and charts for the experiment wiki
///
/// Reads the numbered experiment pages of the wiki, aggregates their
/// date, model, tag and rating fields, and regenerates the Stats page
/// together with three charts.
///
/// Examples:
///   expstats
///   expstats --wiki-dir ./wiki
///   expstats --wiki-dir ./wiki --format json --output stats.json
///   expstats --dry-run
///   expstats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory containing the experiment pages
    ///
    /// Defaults to the value in .expstats.toml, or the current directory.
    #[arg(short, long, value_name = "DIR", env = "EXPSTATS_WIKI_DIR")]
    pub wiki_dir: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Defaults to Stats.md inside the wiki directory.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Directory the charts are written to
    ///
    /// Defaults to images/ inside the wiki directory.
    #[arg(long, value_name = "DIR")]
    pub images_dir: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .expstats.toml in the current directory,
    /// then in the wiki directory.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Date printed as "last updated" (YYYY-MM-DD)
    ///
    /// Defaults to the date of the most recent experiment, so that reruns
    /// over unchanged pages produce identical output.
    #[arg(long, value_name = "DATE")]
    pub as_of: Option<NaiveDate>,

    /// Skip chart rendering
    #[arg(long)]
    pub no_charts: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: list the record files that would be parsed and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .expstats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref output) = self.output {
            if output.is_dir() {
                return Err(format!("Output path is a directory: {}", output.display()));
            }
        }

        if let Some(ref images_dir) = self.images_dir {
            if images_dir.is_file() {
                return Err(format!(
                    "Images path is a file: {}",
                    images_dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
