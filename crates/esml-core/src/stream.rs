//! # Stream Reader
//!
//! Walks an ESML document: a bare sequence of JSON values with only
//! whitespace between them. No commas, no enclosing array.
//!
//! [`read_value`] decodes exactly one value at an offset and reports where
//! it ended, so a reader can restart anywhere. [`EventStream`] repeats that
//! until the input is exhausted, numbering each value and locating its
//! first character. This is also the interface projection tools consume:
//! values arrive in file order but are **not** schema-validated.

use serde_json::Value;

use crate::error::{ErrorKind, ValidationError};
use crate::position::{LineIndex, Position};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// One JSON value decoded from the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedValue {
    /// The decoded value.
    pub value: Value,
    /// Byte offset of the value's first character.
    pub start: usize,
    /// Byte offset immediately after the value.
    pub end: usize,
}

/// A decode failure at an absolute byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    /// Byte offset in the full text where decoding failed.
    pub offset: usize,
    /// Decoder message.
    pub reason: String,
}

/// Advance past JSON whitespace. A byte-order mark is skipped only at offset 0.
pub fn skip_whitespace(text: &str, offset: usize) -> usize {
    let mut i = offset;
    if i == 0 && text.starts_with(BYTE_ORDER_MARK) {
        i = BYTE_ORDER_MARK.len_utf8();
    }
    let bytes = text.as_bytes();
    while i < bytes.len() && matches!(bytes[i], b' ' | b'\t' | b'\n' | b'\r') {
        i += 1;
    }
    i
}

/// Decode exactly one JSON value starting at `offset`, skipping leading
/// whitespace. Returns `Ok(None)` when only whitespace remains.
///
/// # Errors
///
/// Returns a [`DecodeFailure`] located at the decoder's failure offset.
pub fn read_value(text: &str, offset: usize) -> Result<Option<DecodedValue>, DecodeFailure> {
    let start = skip_whitespace(text, offset);
    if start >= text.len() {
        return Ok(None);
    }
    let rest = text.get(start..).ok_or_else(|| DecodeFailure {
        offset: start,
        reason: "offset is not on a character boundary".to_string(),
    })?;

    let mut values = serde_json::Deserializer::from_str(rest).into_iter::<Value>();
    match values.next() {
        Some(Ok(value)) => Ok(Some(DecodedValue {
            value,
            start,
            end: start + values.byte_offset(),
        })),
        Some(Err(e)) => {
            let relative = LineIndex::new(rest).offset_of(e.line(), e.column());
            Err(DecodeFailure {
                offset: start + relative,
                reason: strip_decoder_position(&e.to_string()),
            })
        }
        None => Ok(None),
    }
}

/// `serde_json` appends " at line L column C" relative to the slice it was
/// given; the caller reports an absolute position instead.
fn strip_decoder_position(message: &str) -> String {
    match message.rfind(" at line ") {
        Some(idx) => message[..idx].to_string(),
        None => message.to_string(),
    }
}

/// One event read from the stream, before any envelope or schema checks.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    /// Zero-based sequence index.
    pub index: usize,
    /// Byte offset of the event's first character.
    pub offset: usize,
    /// Position of the event's first character.
    pub position: Position,
    /// The decoded value.
    pub value: Value,
}

impl RawEvent {
    /// The `type` field, if the event is an object with a string `type`.
    pub fn type_str(&self) -> Option<&str> {
        self.value.get("type").and_then(Value::as_str)
    }

    /// The `data` field, if the event is an object carrying one.
    pub fn data(&self) -> Option<&Value> {
        self.value.get("data")
    }
}

/// Lazy iterator over the events of an ESML document.
///
/// Yields `Err` at most once; the stream is fused after a decode failure.
#[derive(Debug, Clone)]
pub struct EventStream<'a> {
    text: &'a str,
    lines: LineIndex<'a>,
    offset: usize,
    next_index: usize,
    done: bool,
}

impl<'a> EventStream<'a> {
    /// Read `text` from the beginning.
    pub fn new(text: &'a str) -> Self {
        Self::starting_at(text, 0, 0)
    }

    /// Resume reading at byte `offset`, numbering the first event `first_index`.
    pub fn starting_at(text: &'a str, offset: usize, first_index: usize) -> Self {
        Self {
            text,
            lines: LineIndex::new(text),
            offset,
            next_index: first_index,
            done: false,
        }
    }

    /// Byte offset where the next read begins.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Iterator for EventStream<'_> {
    type Item = Result<RawEvent, ValidationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let index = self.next_index;
        match read_value(self.text, self.offset) {
            Ok(Some(decoded)) => {
                self.offset = decoded.end;
                self.next_index += 1;
                Some(Ok(RawEvent {
                    index,
                    offset: decoded.start,
                    position: self.lines.position(decoded.start),
                    value: decoded.value,
                }))
            }
            Ok(None) => {
                self.done = true;
                self.offset = self.text.len();
                None
            }
            Err(failure) => {
                self.done = true;
                let kind = ErrorKind::MalformedJson {
                    reason: failure.reason,
                };
                Some(Err(kind.at(self.lines.position(failure.offset), index)))
            }
        }
    }
}

impl std::iter::FusedIterator for EventStream<'_> {}

/// Read every event of `text`, stopping at the first decode failure.
pub fn read_all(text: &str) -> Result<Vec<RawEvent>, ValidationError> {
    EventStream::new(text).collect()
}
