//! # Schema Matcher
//!
//! Checks a JSON value against a decoded [`SchemaNode`]. References are
//! resolved against the registry at match time, so a `$ref` always sees the
//! most recent declaration of its target.
//!
//! Every failure carries a context label: the root label (usually the
//! event's type tag) extended with `.<key>` for object members, `[<i>]` for
//! array elements and ` -> <tag>` for each followed reference.
//!
//! Recursion only happens when descending into a member or element, so it
//! is bounded by the nesting of the value. A chain of references is followed
//! in a loop; meeting a tag twice in one chain is a cycle (`A -> B -> A`).

use std::collections::HashSet;

use esml_core::{ErrorKind, TypeTag};
use serde_json::{Number, Value};

use crate::document::{AdditionalProperties, ObjectSchema, SchemaNode};
use crate::registry::SchemaRegistry;

/// Matches values against schemas, resolving `$ref` via a registry.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> Matcher<'r> {
    /// A matcher resolving references against `registry`.
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Check `value` against `schema`, labelling failures from `context`.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn check(&self, value: &Value, schema: &SchemaNode, context: &str) -> Result<(), ErrorKind> {
        self.check_at(value, schema, context)
    }

    /// Check `value` against the schema currently registered for `tag`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::UndeclaredType`] if `tag` is not registered, otherwise
    /// the first violation found.
    pub fn check_tag(&self, value: &Value, tag: &TypeTag) -> Result<(), ErrorKind> {
        let registered = self.registry.get(tag).ok_or_else(|| ErrorKind::UndeclaredType {
            tag: tag.to_string(),
        })?;
        self.check(value, registered.node(), &tag.to_string())
    }

    fn check_at(&self, value: &Value, schema: &SchemaNode, context: &str) -> Result<(), ErrorKind> {
        match schema {
            SchemaNode::Any => Ok(()),
            SchemaNode::Ref(_) => {
                let (resolved, context) = self.resolve(schema, context)?;
                self.check_at(value, resolved, &context)
            }
            SchemaNode::Object(object) => self.check_object(value, object, context),
            SchemaNode::Array { items } => {
                let elements = value.as_array().ok_or_else(|| mismatch(context, "array"))?;
                if let Some(items) = items {
                    for (i, element) in elements.iter().enumerate() {
                        self.check_at(element, items, &format!("{context}[{i}]"))?;
                    }
                }
                Ok(())
            }
            SchemaNode::String => expect(value.is_string(), context, "string"),
            // `Value::Bool` is never a `Value::Number`, so booleans fail both.
            SchemaNode::Integer => expect(
                value.as_number().is_some_and(is_integer_literal),
                context,
                "integer",
            ),
            SchemaNode::Number => expect(value.is_number(), context, "number"),
            SchemaNode::Boolean => expect(value.is_boolean(), context, "boolean"),
        }
    }

    /// Follow references from `schema` to the first schema that is not a
    /// reference, returning it with the extended context label.
    fn resolve<'a>(
        &self,
        mut schema: &'a SchemaNode,
        context: &str,
    ) -> Result<(&'a SchemaNode, String), ErrorKind>
    where
        'r: 'a,
    {
        let registry: &'r SchemaRegistry = self.registry;
        let mut label = context.to_string();
        let mut seen: HashSet<&'a TypeTag> = HashSet::new();
        while let SchemaNode::Ref(target) = schema {
            if !seen.insert(target) {
                return Err(ErrorKind::InvalidSchema {
                    context: label,
                    reason: format!("$ref cycle through {target}"),
                });
            }
            let registered = registry.get(target).ok_or_else(|| ErrorKind::UnresolvedRef {
                context: label.clone(),
                target: target.to_string(),
            })?;
            label.push_str(" -> ");
            label.push_str(&target.to_string());
            schema = registered.node();
        }
        Ok((schema, label))
    }

    fn check_object(
        &self,
        value: &Value,
        schema: &ObjectSchema,
        context: &str,
    ) -> Result<(), ErrorKind> {
        let members = value.as_object().ok_or_else(|| mismatch(context, "object"))?;

        if let Some(missing) = schema.required.iter().find(|name| !members.contains_key(*name)) {
            return Err(ErrorKind::MissingProperty {
                context: context.to_string(),
                property: missing.clone(),
            });
        }

        for (key, sub_schema) in &schema.properties {
            if let Some(member) = members.get(key) {
                self.check_at(member, sub_schema, &format!("{context}.{key}"))?;
            }
        }

        let extras = members
            .iter()
            .filter(|(key, _)| !schema.properties.contains_key(*key));
        match &schema.additional {
            AdditionalProperties::Allowed => Ok(()),
            AdditionalProperties::Forbidden => match extras.map(|(key, _)| key).next() {
                Some(key) => Err(ErrorKind::DisallowedProperty {
                    context: context.to_string(),
                    property: key.clone(),
                }),
                None => Ok(()),
            },
            AdditionalProperties::Schema(extra_schema) => {
                for (key, member) in extras {
                    self.check_at(member, extra_schema, &format!("{context}.{key}"))?;
                }
                Ok(())
            }
        }
    }
}

fn mismatch(context: &str, expected: &'static str) -> ErrorKind {
    ErrorKind::TypeMismatch {
        context: context.to_string(),
        expected,
    }
}

/// Integer-ness follows the literal text, so `-0` and integers beyond 64
/// bits qualify while `1.0` and `1e2` do not.
fn is_integer_literal(number: &Number) -> bool {
    !number
        .to_string()
        .contains(|c: char| matches!(c, '.' | 'e' | 'E'))
}

fn expect(ok: bool, context: &str, expected: &'static str) -> Result<(), ErrorKind> {
    if ok {
        Ok(())
    } else {
        Err(mismatch(context, expected))
    }
}
