//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Tendance - exam question trends by topic
///
/// Rank exam topics by how often they were asked and export a module's
/// ranking as a 1080x1080 SVG ready for editing.
///
/// Examples:
///   tendance --input stats.json
///   tendance --input stats.json --exam-years 2022,2023 --format json
///   tendance --input stats.json --module Cardio
///   tendance --input stats.json --module Cardio --subgroups Anatomie,Physiologie -o cardio.svg
///   tendance --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// JSON payload with exam occurrence records
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Module to export
    ///
    /// Without a module, the ranking of all modules is printed instead.
    #[arg(short, long, value_name = "NAME")]
    pub module: Option<String>,

    /// Sub-groups to include in the export (comma-separated)
    ///
    /// Defaults to every sub-group of the module.
    #[arg(long, value_name = "NAMES", value_delimiter = ',', requires = "module")]
    pub subgroups: Option<Vec<String>>,

    /// Exam types to keep (comma-separated, empty = all)
    #[arg(long, value_name = "TYPES", value_delimiter = ',')]
    pub exam_types: Vec<String>,

    /// Exam years to keep (comma-separated, empty = all)
    #[arg(long, value_name = "YEARS", value_delimiter = ',')]
    pub exam_years: Vec<i32>,

    /// Output file path
    ///
    /// Defaults to tendance-<module>.<ext> for exports and stdout for the
    /// module ranking.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (svg, json, markdown)
    #[arg(long, default_value = "svg", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Maximum ranked rows per sub-group
    #[arg(long, value_name = "COUNT")]
    pub max_entries: Option<usize>,

    /// Rows per sub-group kept even when the canvas is full
    #[arg(long, value_name = "COUNT")]
    pub min_entries: Option<usize>,

    /// Character budget for topic labels
    #[arg(long, value_name = "CHARS")]
    pub label_max_chars: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .tendance.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .tendance.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// SVG document (default; Markdown table for the module ranking)
    #[default]
    Svg,
    /// JSON view model
    Json,
    /// Markdown tables
    Markdown,
}

impl OutputFormat {
    /// File extension for exports in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "md",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref input) = self.input {
            if !input.is_file() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        if let Some(ref module) = self.module {
            if module.trim().is_empty() {
                return Err("Module name must not be empty".to_string());
            }
        }

        if let Some(ref subgroups) = self.subgroups {
            if subgroups.iter().all(|s| s.trim().is_empty()) {
                return Err("At least one sub-group must be selected for export".to_string());
            }
        }

        if self.max_entries == Some(0) {
            return Err("Max entries must be at least 1".to_string());
        }
        if self.min_entries == Some(0) {
            return Err("Min entries must be at least 1".to_string());
        }
        if let (Some(min), Some(max)) = (self.min_entries, self.max_entries) {
            if min > max {
                return Err("Min entries cannot exceed max entries".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Sub-groups chosen for export, trimmed, without blanks.
    pub fn selected_subgroups(&self) -> Option<Vec<String>> {
        self.subgroups.as_ref().map(|names| {
            names
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
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
