//! # esml-validator — Event Log Validation
//!
//! Runs one forward pass over an ESML document. Each event is either a
//! **declaration** (its tag is declarator-capable, so its payload registers
//! a new schema) or an **ordinary** event (its payload is checked against
//! the schema currently registered for its tag). The first error ends the
//! run.
//!
//! ```
//! use esml_validator::{validate_with_summary, ValidatorOptions};
//!
//! let log = r#"
//! {"type": "TypeDeclared", "data": {"name": "Greeting", "schema": {
//!     "type": "object", "properties": {"text": {"type": "string"}}, "required": ["text"]}}}
//! {"type": "Greeting", "data": {"text": "hi"}}
//! "#;
//! let summary = validate_with_summary(log, ValidatorOptions::default()).unwrap();
//! assert_eq!(summary.total_events, 2);
//! ```
//!
//! ## Crate Policy
//!
//! - All run state (registry, declarator set, counters) lives in one
//!   [`EventValidator`]. There is no global state; independent runs may
//!   proceed on separate threads.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod options;
pub mod summary;
pub mod validator;

pub use options::ValidatorOptions;
pub use summary::Summary;
pub use validator::{validate, validate_with_summary, EventClass, EventValidator};
