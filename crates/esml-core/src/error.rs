//! # Error Types — Structured Validation Errors
//!
//! Defines the error taxonomy used throughout ESML validation. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - [`ErrorKind`] says *what* went wrong. Schema decoding and matching
//!   produce bare kinds because they have no notion of where the event sits
//!   in the source text.
//! - [`ValidationError`] says *where*: it pairs a kind with the event index
//!   and the event's source position. Only the stream reader and the event
//!   validator construct it.
//! - Every error is terminal for the run. Nothing is retried or recovered.

use thiserror::Error;

use crate::position::Position;

/// The reason a validation run stopped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A JSON value could not be decoded at the current offset.
    #[error("invalid JSON: {reason}")]
    MalformedJson {
        /// Decoder message, without the decoder's own position suffix.
        reason: String,
    },

    /// The event envelope is not an object with `type` and `data`.
    #[error("{reason}")]
    MalformedEvent {
        /// Which part of the envelope is wrong.
        reason: String,
    },

    /// A type tag is empty or has an empty name.
    #[error("invalid type tag: '{tag}'")]
    InvalidTag {
        /// The offending tag text.
        tag: String,
    },

    /// A declarator-capable tag has no schema in the registry.
    #[error("unknown declarer {tag}")]
    UnknownDeclarer {
        /// Display form of the declarer tag.
        tag: String,
    },

    /// A declaration payload lacks `name`/`schema` or has them mistyped.
    #[error("declared '{field}' must be {expected}")]
    MissingDeclarationField {
        /// The payload field at fault.
        field: &'static str,
        /// The JSON kind the field must have.
        expected: &'static str,
    },

    /// The bootstrap type was declared a second time.
    #[error("{tag} may be self-declared at most once")]
    DuplicateSelfDeclaration {
        /// Display form of the bootstrap tag.
        tag: String,
    },

    /// The bootstrap self-declaration does not match the builtin schema.
    #[error("self-declaration of {tag} does not match the builtin schema")]
    SelfDeclarationShapeMismatch {
        /// Display form of the bootstrap tag.
        tag: String,
    },

    /// An ordinary event uses a tag that was never registered.
    #[error("type {tag} used before declaration")]
    UndeclaredType {
        /// Display form of the undeclared tag.
        tag: String,
    },

    /// A `$ref` target is not in the registry.
    #[error("{context}: $ref target {target} not declared")]
    UnresolvedRef {
        /// Location in the payload being matched.
        context: String,
        /// The tag text after `#/$defs/`.
        target: String,
    },

    /// A required property is absent from an object.
    #[error("{context}: missing required property '{property}'")]
    MissingProperty {
        /// Location in the payload being matched.
        context: String,
        /// The missing property name.
        property: String,
    },

    /// An object carries a property its schema forbids.
    #[error("{context}: additional property '{property}' not allowed")]
    DisallowedProperty {
        /// Location in the payload being matched.
        context: String,
        /// The forbidden property name.
        property: String,
    },

    /// A value is not of the JSON kind its schema requires.
    #[error("{context}: expected {expected}")]
    TypeMismatch {
        /// Location in the payload being matched.
        context: String,
        /// The required kind (`object`, `array`, `string`, ...).
        expected: &'static str,
    },

    /// A schema names a `type` outside the supported subset.
    #[error("{context}: unsupported type '{type_name}'")]
    UnsupportedSchemaType {
        /// Keyword path inside the schema document.
        context: String,
        /// The unsupported type name.
        type_name: String,
    },

    /// A schema keyword has the wrong shape (e.g. `required` not an array).
    #[error("{context}: invalid schema: {reason}")]
    InvalidSchema {
        /// Keyword path inside the schema document.
        context: String,
        /// What is wrong with the keyword.
        reason: String,
    },
}

impl ErrorKind {
    /// Attach the event position, producing a terminal [`ValidationError`].
    pub fn at(self, position: Position, event_index: usize) -> ValidationError {
        ValidationError {
            kind: self,
            position,
            event_index,
        }
    }
}

/// A terminal validation failure located at one event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {}, col {}, event {event_index}: {kind}", .position.line, .position.column)]
pub struct ValidationError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Start of the offending event (or the decoder failure for malformed JSON).
    pub position: Position,
    /// Zero-based sequence index of the offending event.
    pub event_index: usize,
}

impl ValidationError {
    /// 1-based line of the error position.
    pub fn line(&self) -> usize {
        self.position.line
    }

    /// 1-based column of the error position.
    pub fn column(&self) -> usize {
        self.position.column
    }

    /// The human-readable reason, without position prefix.
    pub fn reason(&self) -> String {
        self.kind.to_string()
    }
}
