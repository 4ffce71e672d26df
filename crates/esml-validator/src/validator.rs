//! # Event Validator
//!
//! The orchestrator. For each event, in stream order:
//!
//! 1. The envelope must be an object with a string `type` and a `data` key.
//! 2. `type` is parsed into a [`TypeTag`].
//! 3. If the tag is declarator-capable, the event is a declaration: `data`
//!    is matched against the declarer's schema, then `data.schema` is
//!    registered under the tag parsed from `data.name`, and that tag is
//!    promoted if its new schema has the declarer shape.
//! 4. Otherwise `data` is matched against the tag's registered schema.
//!
//! Errors are reported at the event's first character with its index,
//! however deep inside the payload the violation sits.

use esml_core::{ErrorKind, EventStream, RawEvent, TypeTag, ValidationError};
use esml_schema::{DeclaratorSet, Matcher, SchemaRegistry};
use serde_json::{Map, Value};

use crate::options::ValidatorOptions;
use crate::summary::Summary;

/// How an event was treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventClass {
    /// The event registered a schema for the contained tag.
    Declaration(TypeTag),
    /// The event's payload was checked against its tag's schema.
    Ordinary,
}

/// Owns the registry and declarator set for one validation run.
#[derive(Debug, Clone)]
pub struct EventValidator {
    registry: SchemaRegistry,
    declarators: DeclaratorSet,
    options: ValidatorOptions,
    summary: Option<Summary>,
}

impl Default for EventValidator {
    fn default() -> Self {
        Self::new(ValidatorOptions::default())
    }
}

impl EventValidator {
    /// A validator with the bootstrap registry and declarator set.
    pub fn new(options: ValidatorOptions) -> Self {
        Self::with_state(SchemaRegistry::new(), DeclaratorSet::new(), options)
    }

    /// A validator over caller-supplied state.
    pub fn with_state(
        registry: SchemaRegistry,
        declarators: DeclaratorSet,
        options: ValidatorOptions,
    ) -> Self {
        Self {
            registry,
            declarators,
            options,
            summary: options.collect_summary.then(Summary::default),
        }
    }

    /// The registry as mutated so far.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// The declarator set as grown so far.
    pub fn declarators(&self) -> &DeclaratorSet {
        &self.declarators
    }

    /// Counters so far, if summary collection is enabled.
    pub fn summary(&self) -> Option<Summary> {
        self.summary.as_ref().map(|summary| {
            let mut summary = summary.clone();
            summary.declarator_types = self.declarators.iter().cloned().collect();
            summary
        })
    }

    /// Validate every event of `text`.
    ///
    /// # Errors
    ///
    /// Returns the first decode, envelope, declaration or schema error.
    pub fn validate_text(&mut self, text: &str) -> Result<(), ValidationError> {
        for event in EventStream::new(text) {
            self.validate_event(&event?)?;
        }
        tracing::debug!(
            registered = self.registry.len(),
            declarators = self.declarators.len(),
            "validation pass complete"
        );
        Ok(())
    }

    /// Validate one event and apply its effect on the registry.
    ///
    /// # Errors
    ///
    /// Returns the error located at the event's start position and index.
    pub fn validate_event(&mut self, event: &RawEvent) -> Result<EventClass, ValidationError> {
        self.process(event)
            .map_err(|kind| kind.at(event.position, event.index))
    }

    fn process(&mut self, event: &RawEvent) -> Result<EventClass, ErrorKind> {
        let (type_str, data) = self.envelope(&event.value)?;
        let tag = TypeTag::parse(type_str)?;
        tracing::trace!(index = event.index, tag = %tag, "event");

        if self.declarators.contains(&tag) {
            let declared = self.declare(&tag, data)?;
            if let Some(summary) = self.summary.as_mut() {
                summary.record_declaration(&tag, &declared);
            }
            Ok(EventClass::Declaration(declared))
        } else {
            Matcher::new(&self.registry).check_tag(data, &tag)?;
            if let Some(summary) = self.summary.as_mut() {
                summary.record_ordinary(&tag);
            }
            Ok(EventClass::Ordinary)
        }
    }

    fn envelope<'v>(&self, value: &'v Value) -> Result<(&'v str, &'v Value), ErrorKind> {
        let object = value.as_object().ok_or_else(|| malformed("each event must be a JSON object"))?;
        let (Some(type_value), Some(data)) = (object.get("type"), object.get("data")) else {
            return Err(malformed("event must have 'type' and 'data'"));
        };
        let type_str = type_value
            .as_str()
            .ok_or_else(|| malformed("'type' must be a string"))?;
        if let Some(extra) = extra_envelope_key(object) {
            if self.options.strict_envelope {
                return Err(malformed(&format!("unexpected envelope key '{extra}'")));
            }
            tracing::warn!(key = %extra, "ignoring extra envelope key");
        }
        Ok((type_str, data))
    }

    fn declare(&mut self, declarer: &TypeTag, data: &Value) -> Result<TypeTag, ErrorKind> {
        let declarer_schema = self
            .registry
            .get(declarer)
            .ok_or_else(|| ErrorKind::UnknownDeclarer {
                tag: declarer.to_string(),
            })?;
        Matcher::new(&self.registry).check(data, declarer_schema.node(), &declarer.to_string())?;

        let name = data
            .get("name")
            .and_then(Value::as_str)
            .ok_or(ErrorKind::MissingDeclarationField {
                field: "name",
                expected: "a string",
            })?;
        let schema = data
            .get("schema")
            .filter(|schema| schema.is_object())
            .ok_or(ErrorKind::MissingDeclarationField {
                field: "schema",
                expected: "an object",
            })?;

        let tag = TypeTag::parse(name)?;
        self.registry.declare(tag.clone(), schema.clone())?;
        self.declarators.promote_if_declarer(&tag, schema);
        tracing::debug!(declarer = %declarer, tag = %tag, "declared type");
        Ok(tag)
    }
}

fn extra_envelope_key(object: &Map<String, Value>) -> Option<&str> {
    object
        .keys()
        .map(String::as_str)
        .find(|key| *key != "type" && *key != "data")
}

fn malformed(reason: &str) -> ErrorKind {
    ErrorKind::MalformedEvent {
        reason: reason.to_string(),
    }
}

/// Validate `text` with a fresh validator.
///
/// # Errors
///
/// Returns the first error in the stream.
pub fn validate(text: &str, options: ValidatorOptions) -> Result<(), ValidationError> {
    EventValidator::new(options).validate_text(text)
}

/// Validate `text` and return the run summary.
///
/// # Errors
///
/// Returns the first error in the stream.
pub fn validate_with_summary(
    text: &str,
    options: ValidatorOptions,
) -> Result<Summary, ValidationError> {
    let mut validator = EventValidator::new(options.with_summary());
    validator.validate_text(text)?;
    Ok(validator.summary().unwrap_or_default())
}
