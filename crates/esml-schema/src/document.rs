//! # Schema Documents
//!
//! Decodes a raw JSON schema into a [`SchemaNode`] tree so the matcher
//! dispatches on a tagged union instead of re-reading maps on every call.
//!
//! Decoding rules:
//!
//! - A schema is a JSON object. Property sub-schemas, `items` and a
//!   schema-valued `additionalProperties` must be objects too.
//! - `$ref` wins over every other keyword. It must be a string of the form
//!   `#/$defs/<tag>`; the tag is parsed now and resolved at match time.
//! - `type` must name a supported kind. Anything else (including a
//!   non-string `type`) is [`ErrorKind::UnsupportedSchemaType`].
//! - `properties: null` and `required: null` read as absent.
//! - Unknown keywords (`description`, `enum`, ...) are ignored.

use std::collections::BTreeMap;

use esml_core::{ErrorKind, TypeTag};
use serde_json::{Map, Value};

/// Prefix every supported `$ref` carries.
pub const REF_PREFIX: &str = "#/$defs/";

/// A decoded schema.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// No `type`: accepts any value.
    Any,
    /// `$ref` to another registered type.
    Ref(TypeTag),
    /// `type: object`.
    Object(ObjectSchema),
    /// `type: array`, with optional `items`.
    Array {
        /// Schema every element must match.
        items: Option<Box<SchemaNode>>,
    },
    /// `type: string`.
    String,
    /// `type: integer`. Booleans and fractional numbers do not match.
    Integer,
    /// `type: number`. Booleans do not match.
    Number,
    /// `type: boolean`.
    Boolean,
}

/// The object-specific keywords.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSchema {
    /// Declared properties and their schemas.
    pub properties: BTreeMap<String, SchemaNode>,
    /// Property names that must be present, in declaration order.
    pub required: Vec<String>,
    /// Treatment of keys not listed in `properties`.
    pub additional: AdditionalProperties,
}

/// `additionalProperties`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AdditionalProperties {
    /// `true` or absent.
    #[default]
    Allowed,
    /// `false`.
    Forbidden,
    /// A schema every extra value must match.
    Schema(Box<SchemaNode>),
}

impl SchemaNode {
    /// Decode `schema`. `context` labels the schema root in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidSchema`] for malformed keywords,
    /// [`ErrorKind::UnsupportedSchemaType`] for an unknown `type`, and
    /// [`ErrorKind::InvalidTag`] for a `$ref` with an empty tag name.
    pub fn decode(schema: &Value, context: &str) -> Result<Self, ErrorKind> {
        let map = schema.as_object().ok_or_else(|| invalid(context, "schema must be an object"))?;

        if let Some(reference) = map.get("$ref") {
            return decode_ref(reference, context);
        }

        let type_name = match map.get("type") {
            None => return Ok(SchemaNode::Any),
            Some(Value::String(name)) => name.as_str(),
            Some(other) => {
                return Err(ErrorKind::UnsupportedSchemaType {
                    context: context.to_string(),
                    type_name: other.to_string(),
                })
            }
        };

        match type_name {
            "object" => decode_object(map, context).map(SchemaNode::Object),
            "array" => {
                let items = match map.get("items") {
                    Some(items) => Some(Box::new(Self::decode(items, &format!("{context}.items"))?)),
                    None => None,
                };
                Ok(SchemaNode::Array { items })
            }
            "string" => Ok(SchemaNode::String),
            "integer" => Ok(SchemaNode::Integer),
            "number" => Ok(SchemaNode::Number),
            "boolean" => Ok(SchemaNode::Boolean),
            other => Err(ErrorKind::UnsupportedSchemaType {
                context: context.to_string(),
                type_name: other.to_string(),
            }),
        }
    }
}

fn decode_ref(reference: &Value, context: &str) -> Result<SchemaNode, ErrorKind> {
    let target = reference
        .as_str()
        .and_then(|r| r.strip_prefix(REF_PREFIX))
        .ok_or_else(|| invalid(context, &format!("unsupported $ref {reference}")))?;
    TypeTag::parse(target).map(SchemaNode::Ref)
}

fn decode_object(map: &Map<String, Value>, context: &str) -> Result<ObjectSchema, ErrorKind> {
    let mut properties = BTreeMap::new();
    match map.get("properties") {
        None | Some(Value::Null) => {}
        Some(Value::Object(props)) => {
            for (key, sub) in props {
                let node = SchemaNode::decode(sub, &format!("{context}.properties.{key}"))?;
                properties.insert(key.clone(), node);
            }
        }
        Some(_) => return Err(invalid(context, "'properties' must be an object")),
    }

    let required = match map.get("required") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(names)) => names
            .iter()
            .map(|name| {
                name.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid(context, "'required' entries must be strings"))
            })
            .collect::<Result<_, _>>()?,
        Some(_) => return Err(invalid(context, "'required' must be an array")),
    };

    let additional = match map.get("additionalProperties") {
        None | Some(Value::Bool(true)) => AdditionalProperties::Allowed,
        Some(Value::Bool(false)) => AdditionalProperties::Forbidden,
        Some(schema @ Value::Object(_)) => AdditionalProperties::Schema(Box::new(SchemaNode::decode(
            schema,
            &format!("{context}.additionalProperties"),
        )?)),
        Some(_) => {
            return Err(invalid(
                context,
                "'additionalProperties' must be a boolean or a schema",
            ))
        }
    };

    Ok(ObjectSchema {
        properties,
        required,
        additional,
    })
}

fn invalid(context: &str, reason: &str) -> ErrorKind {
    ErrorKind::InvalidSchema {
        context: context.to_string(),
        reason: reason.to_string(),
    }
}
