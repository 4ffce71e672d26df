//! # esml-schema — Schema Subset, Registry & Matcher
//!
//! Provides the schema machinery an ESML stream declares and is checked
//! against.
//!
//! ## Schema Documents (`document`)
//!
//! Declared schemas are decoded once, at registration, into a
//! [`SchemaNode`] tree. Only a fixed subset of JSON Schema is understood:
//! `$ref` into the registry, `type` (`object`, `array`, `string`,
//! `integer`, `number`, `boolean`, or absent), `properties`, `required`,
//! `additionalProperties` and `items`. Other keywords are ignored. An
//! unknown `type` is rejected when the schema is declared, not when it is
//! first used.
//!
//! ## Registry (`registry`)
//!
//! [`SchemaRegistry`] maps [`TypeTag`](esml_core::TypeTag)s to their
//! current schema (last write wins) and is seeded with the builtin
//! `TypeDeclared` schema. [`DeclaratorSet`] tracks which tags declare new
//! types; it only ever grows.
//!
//! ## Matcher (`matcher`)
//!
//! [`Matcher`] checks a JSON value against a [`SchemaNode`], resolving
//! `#/$defs/<tag>` references against the registry at match time.
//!
//! ## Crate Policy
//!
//! - Depends only on `esml-core` internally.
//! - Errors are bare [`ErrorKind`](esml_core::ErrorKind)s; the caller
//!   attaches the event position.

pub mod document;
pub mod matcher;
pub mod registry;

pub use document::{AdditionalProperties, ObjectSchema, SchemaNode};
pub use matcher::Matcher;
pub use registry::{
    bootstrap_tag, builtin_declaration_schema, looks_like_declarer, DeclaratorSet,
    RegisteredSchema, SchemaRegistry, BOOTSTRAP_TYPE_NAME,
};
