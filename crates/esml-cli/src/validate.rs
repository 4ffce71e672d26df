//! # Validate Mode
//!
//! Runs the validator over the whole document and reports `OK`, optionally
//! followed by the summary, or the first error.

use std::io::Write;

use anyhow::Result;
use esml_validator::{EventValidator, ValidatorOptions};

use crate::{SummaryFormat, EXIT_INVALID, EXIT_OK};

/// Execute validate mode.
///
/// Returns exit code: 0 on success, 2 on validation failure.
pub fn run_validate<W: Write, E: Write>(
    text: &str,
    options: ValidatorOptions,
    format: SummaryFormat,
    out: &mut W,
    err: &mut E,
) -> Result<u8> {
    let mut validator = EventValidator::new(options);
    if let Err(e) = validator.validate_text(text) {
        tracing::debug!(kind = ?e.kind, "validation failed");
        writeln!(err, "ERROR: {e}")?;
        return Ok(EXIT_INVALID);
    }

    writeln!(out, "OK")?;
    if let Some(summary) = validator.summary() {
        writeln!(out)?;
        match format {
            SummaryFormat::Text => writeln!(out, "{summary}")?,
            SummaryFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?,
        }
    }
    Ok(EXIT_OK)
}
