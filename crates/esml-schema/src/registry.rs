//! # Schema Registry & Declarator Set
//!
//! The per-run state an ESML stream mutates as it declares types.
//!
//! ## Bootstrap
//!
//! A fresh [`SchemaRegistry`] holds exactly one schema: the builtin
//! `TypeDeclared` schema, which describes a declaration payload
//! (`name`, `schema`, optional `log`, nothing else). A fresh
//! [`DeclaratorSet`] holds exactly the `TypeDeclared` tag.
//!
//! ## Self-Declaration
//!
//! A stream may declare `TypeDeclared` itself at most once, and only with a
//! schema equal to the builtin one once `properties.log` is removed from
//! both. Every other tag may be redeclared freely; the latest schema wins.
//!
//! ## Declarator Promotion
//!
//! A tag whose registered schema [`looks_like_declarer`] joins the
//! declarator set and never leaves it, even if the tag is later redeclared
//! with a different shape.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use esml_core::{ErrorKind, TypeTag};
use serde_json::{json, Value};

use crate::document::{AdditionalProperties, ObjectSchema, SchemaNode};

/// Reserved name of the bootstrap declaration type.
pub const BOOTSTRAP_TYPE_NAME: &str = "TypeDeclared";

/// The bootstrap tag: `TypeDeclared` with no version.
pub fn bootstrap_tag() -> TypeTag {
    TypeTag::unversioned(BOOTSTRAP_TYPE_NAME)
}

/// The builtin schema of the bootstrap type.
pub fn builtin_declaration_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "log": {"type": "string"},
            "schema": {"type": "object"}
        },
        "required": ["name", "schema"],
        "additionalProperties": false
    })
}

/// The decoded form of [`builtin_declaration_schema`].
fn builtin_declaration_node() -> SchemaNode {
    SchemaNode::Object(ObjectSchema {
        properties: BTreeMap::from([
            ("name".to_string(), SchemaNode::String),
            ("log".to_string(), SchemaNode::String),
            ("schema".to_string(), SchemaNode::Object(ObjectSchema::default())),
        ]),
        required: vec!["name".to_string(), "schema".to_string()],
        additional: AdditionalProperties::Forbidden,
    })
}

/// True iff `schema` has the shape of a type-declaring event: an object
/// schema whose `properties` include `name` and `schema` and whose
/// `required` lists both.
pub fn looks_like_declarer(schema: &Value) -> bool {
    if schema.get("type").and_then(Value::as_str) != Some("object") {
        return false;
    }
    let has_properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|props| props.contains_key("name") && props.contains_key("schema"));
    let requires_both = schema
        .get("required")
        .and_then(Value::as_array)
        .is_some_and(|req| {
            req.iter().any(|r| r == "name") && req.iter().any(|r| r == "schema")
        });
    has_properties && requires_both
}

/// A schema as declared, together with its decoded form.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredSchema {
    raw: Value,
    node: SchemaNode,
}

impl RegisteredSchema {
    /// The schema document exactly as declared.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// The decoded schema tree.
    pub fn node(&self) -> &SchemaNode {
        &self.node
    }
}

/// Mapping from type tag to its currently active schema.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<TypeTag, RegisteredSchema>,
    self_declared: bool,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    /// A registry holding only the builtin bootstrap schema.
    pub fn new() -> Self {
        let mut schemas = HashMap::new();
        schemas.insert(
            bootstrap_tag(),
            RegisteredSchema {
                raw: builtin_declaration_schema(),
                node: builtin_declaration_node(),
            },
        );
        Self {
            schemas,
            self_declared: false,
        }
    }

    /// Look up the active schema for `tag`.
    pub fn get(&self, tag: &TypeTag) -> Option<&RegisteredSchema> {
        self.schemas.get(tag)
    }

    /// Whether `tag` has a schema.
    pub fn contains(&self, tag: &TypeTag) -> bool {
        self.schemas.contains_key(tag)
    }

    /// Number of registered tags.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Whether the stream has already declared the bootstrap type.
    pub fn is_self_declared(&self) -> bool {
        self.self_declared
    }

    /// Decode `raw` and store it under `tag`, replacing any previous schema.
    ///
    /// # Errors
    ///
    /// Returns the decoding error if `raw` is not a supported schema; the
    /// registry is left unchanged in that case.
    pub fn register(&mut self, tag: TypeTag, raw: Value) -> Result<&RegisteredSchema, ErrorKind> {
        let node = SchemaNode::decode(&raw, &tag.to_string())?;
        Ok(self.insert(tag, RegisteredSchema { raw, node }))
    }

    /// Register a schema arriving through a declaration event, enforcing the
    /// bootstrap self-declaration rule first.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::DuplicateSelfDeclaration`] on a second declaration of
    ///   the bootstrap tag.
    /// - [`ErrorKind::SelfDeclarationShapeMismatch`] if the bootstrap tag is
    ///   declared with a schema that differs from the builtin beyond `log`.
    /// - Any decoding error from [`register`](Self::register).
    pub fn declare(&mut self, tag: TypeTag, raw: Value) -> Result<&RegisteredSchema, ErrorKind> {
        let is_bootstrap = tag == bootstrap_tag();
        if is_bootstrap {
            if self.self_declared {
                return Err(ErrorKind::DuplicateSelfDeclaration {
                    tag: tag.to_string(),
                });
            }
            if without_log(&raw) != without_log(&builtin_declaration_schema()) {
                return Err(ErrorKind::SelfDeclarationShapeMismatch {
                    tag: tag.to_string(),
                });
            }
        }
        let node = SchemaNode::decode(&raw, &tag.to_string())?;
        if is_bootstrap {
            self.self_declared = true;
        }
        Ok(self.insert(tag, RegisteredSchema { raw, node }))
    }

    fn insert(&mut self, tag: TypeTag, schema: RegisteredSchema) -> &RegisteredSchema {
        match self.schemas.entry(tag) {
            Entry::Occupied(mut slot) => {
                tracing::debug!(tag = %slot.key(), "replaced schema");
                slot.insert(schema);
                slot.into_mut()
            }
            Entry::Vacant(slot) => {
                tracing::debug!(tag = %slot.key(), "registered schema");
                slot.insert(schema)
            }
        }
    }
}

/// `schema` with `properties.log` removed.
fn without_log(schema: &Value) -> Value {
    let mut stripped = schema.clone();
    if let Some(props) = stripped.get_mut("properties").and_then(Value::as_object_mut) {
        props.remove("log");
    }
    stripped
}

/// Tags whose events register new types. Grows monotonically.
#[derive(Debug, Clone)]
pub struct DeclaratorSet {
    tags: BTreeSet<TypeTag>,
}

impl Default for DeclaratorSet {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclaratorSet {
    /// A set holding only the bootstrap tag.
    pub fn new() -> Self {
        Self {
            tags: BTreeSet::from([bootstrap_tag()]),
        }
    }

    /// Whether events tagged `tag` are declarations.
    pub fn contains(&self, tag: &TypeTag) -> bool {
        self.tags.contains(tag)
    }

    /// Add `tag`. Returns true if it was not already present.
    pub fn insert(&mut self, tag: TypeTag) -> bool {
        self.tags.insert(tag)
    }

    /// Add `tag` if `schema` has the declarer shape. Returns true if the
    /// tag was newly promoted.
    pub fn promote_if_declarer(&mut self, tag: &TypeTag, schema: &Value) -> bool {
        if !looks_like_declarer(schema) {
            return false;
        }
        let added = self.tags.insert(tag.clone());
        if added {
            tracing::debug!(tag = %tag, "promoted to declarer");
        }
        added
    }

    /// Number of declarator-capable tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Always false for a set built with [`new`](Self::new).
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Declarator-capable tags in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeTag> {
        self.tags.iter()
    }
}
