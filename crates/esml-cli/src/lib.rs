//! # esml-cli — ESML Command-Line Interface
//!
//! One command, three modes:
//!
//! - `esml <FILE>`: validate and print `OK`.
//! - `esml --summary [--format text|json] <FILE>`: validate, then print
//!   the run summary.
//! - `esml --jsonl <FILE>`: re-emit each decoded event as one compact JSON
//!   line. No registry is involved; only decoding can fail.
//!
//! ## Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | success |
//! | 1 | usage error (bad arguments, unreadable file or config) |
//! | 2 | validation error, printed as `ERROR: line L, col C, event N: reason` |
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers so tests can drive
//!   [`run`] with in-memory writers.
//! - Handlers delegate to `esml-validator`; no validation logic here.

pub mod config;
pub mod jsonl;
pub mod validate;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

/// Success.
pub const EXIT_OK: u8 = 0;
/// Bad arguments or unreadable input.
pub const EXIT_USAGE: u8 = 1;
/// The document failed validation.
pub const EXIT_INVALID: u8 = 2;

/// EventStoreML validator.
///
/// Validates a self-describing event log: concatenated JSON events whose
/// types are declared inside the log itself.
#[derive(Parser, Debug)]
#[command(name = "esml", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to a JSON file with validator options.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print a summary of event and type counts after validating.
    #[arg(long, conflicts_with = "jsonl")]
    pub summary: bool,

    /// Output format for --summary.
    #[arg(long, value_enum, default_value_t = SummaryFormat::Text)]
    pub format: SummaryFormat,

    /// Re-emit each event as one compact JSON line instead of validating.
    #[arg(long)]
    pub jsonl: bool,

    /// Reject envelope keys other than `type` and `data`.
    #[arg(long)]
    pub strict: bool,

    /// The ESML file to read.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Rendering of the `--summary` report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormat {
    /// Human-readable lines.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Execute the command described by `cli`.
///
/// Normal output goes to `out`, validation errors to `err`. Returns the
/// process exit code; `Err` means a usage-level failure (exit 1).
pub fn run<W: Write, E: Write>(cli: &Cli, out: &mut W, err: &mut E) -> Result<u8> {
    let text = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("cannot read {}", cli.file.display()))?;
    tracing::debug!(file = %cli.file.display(), bytes = text.len(), "read input");

    if cli.jsonl {
        return jsonl::run_jsonl(&text, out, err);
    }

    let options = config::resolve_options(cli)?;
    validate::run_validate(&text, options, cli.format, out, err)
}
