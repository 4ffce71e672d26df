//! # JSON Lines Mode
//!
//! Re-emits every decoded event as one compact JSON line. Events are not
//! validated; only a decode failure stops the output.

use std::io::Write;

use anyhow::Result;
use esml_core::EventStream;

use crate::{EXIT_INVALID, EXIT_OK};

/// Execute JSON lines mode.
///
/// Lines already written stay written when a later value fails to decode.
/// Returns exit code: 0 on success, 2 on a decode failure.
pub fn run_jsonl<W: Write, E: Write>(text: &str, out: &mut W, err: &mut E) -> Result<u8> {
    for event in EventStream::new(text) {
        match event {
            Ok(event) => writeln!(out, "{}", serde_json::to_string(&event.value)?)?,
            Err(e) => {
                writeln!(err, "ERROR: {e}")?;
                return Ok(EXIT_INVALID);
            }
        }
    }
    Ok(EXIT_OK)
}
