//! # esml-core — Foundational Types for ESML Event Logs
//!
//! This crate is the leaf of the ESML workspace. It defines the primitives
//! every other crate builds on: how a stream of concatenated JSON values is
//! read, how type tags are parsed, how byte offsets become human-readable
//! positions, and the single structured error type that every stage of
//! validation reports through.
//!
//! ## Key Design Principles
//!
//! 1. **One forward pass.** [`EventStream`] walks the source text one JSON
//!    value at a time. There are no delimiters between values: no commas and
//!    no enclosing array. Only JSON whitespace separates events.
//!
//! 2. **Positions point at events.** Every [`ValidationError`] carries the
//!    zero-based index of the offending event and the 1-based line/column of
//!    that event's first character.
//!
//! 3. **Tags are values, not strings.** [`TypeTag`] is the identity key of
//!    the schema registry. `None` and `Some("")` versions are distinct.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `esml-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod position;
pub mod stream;
pub mod tag;

// Re-export primary types for ergonomic imports.
pub use error::{ErrorKind, ValidationError};
pub use position::{LineIndex, Position};
pub use stream::{read_all, read_value, DecodeFailure, DecodedValue, EventStream, RawEvent};
pub use tag::TypeTag;
