//! Argument definitions for the `mml` command.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use mml_cli::commands::ApplyOptions;

#[derive(Parser)]
#[command(
    name = "mml",
    version,
    about = "Apply changes to MML model documents",
    long_about = "Load an MML document, apply parameter overrides and change files,\n\
                  and print the resulting document on stdout.\n\n\
                  Logging goes to stderr; set MML_LOG for fine-grained filtering."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply overrides and change files to a document.
    Apply(ApplyArgs),

    /// Print a document as loaded, after compatibility filtering.
    Show(DocumentArgs),
}

#[derive(Args)]
pub struct DocumentArgs {
    /// MML document to load.
    #[arg(value_name = "DOCUMENT")]
    pub document: PathBuf,

    /// Filter tables (JSON) replacing the built-in compatibility filters.
    #[arg(long = "filters", value_name = "TABLES")]
    pub filters: Option<PathBuf>,

    /// Load without compatibility filters.
    #[arg(long = "no-filters", conflicts_with = "filters")]
    pub no_filters: bool,

    /// Skip elements that fail to apply instead of aborting.
    #[arg(long = "skip-errors")]
    pub skip_errors: bool,
}

#[derive(Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub document: DocumentArgs,

    /// Set a parameter, by name relative to the top-level (repeatable).
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub overrides: Vec<String>,

    /// Apply an MML change file in the top-level (repeatable).
    #[arg(long = "change", value_name = "FILE")]
    pub changes: Vec<PathBuf>,
}

impl DocumentArgs {
    pub fn to_options(&self) -> ApplyOptions {
        ApplyOptions {
            document: self.document.clone(),
            filter_tables: self.filters.clone(),
            no_filters: self.no_filters,
            skip_errors: self.skip_errors,
            ..ApplyOptions::default()
        }
    }
}

impl ApplyArgs {
    pub fn to_options(&self) -> ApplyOptions {
        ApplyOptions {
            overrides: self.overrides.clone(),
            changes: self.changes.clone(),
            ..self.document.to_options()
        }
    }
}
