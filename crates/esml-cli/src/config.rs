//! # Validator Configuration
//!
//! Options come from an optional JSON file (`--config`) and are then
//! widened by command-line flags: a flag can switch an option on, never off.

use std::path::Path;

use anyhow::{Context, Result};
use esml_validator::ValidatorOptions;

use crate::Cli;

/// Load options from `path`.
pub fn load_options(path: &Path) -> Result<ValidatorOptions> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid config {}", path.display()))
}

/// Merge the config file (if any) with command-line flags.
pub fn resolve_options(cli: &Cli) -> Result<ValidatorOptions> {
    let mut options = match &cli.config {
        Some(path) => load_options(path)?,
        None => ValidatorOptions::default(),
    };
    options.collect_summary |= cli.summary;
    options.strict_envelope |= cli.strict;
    tracing::debug!(?options, "resolved validator options");
    Ok(options)
}
