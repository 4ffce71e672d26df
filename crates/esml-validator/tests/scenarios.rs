//! End-to-end validation of ESML documents.
//!
//! Each test feeds a complete document through [`validate`] or
//! [`validate_with_summary`] and checks the outcome, including the event
//! index and source position of the first error.

use esml_core::{ErrorKind, TypeTag};
use esml_validator::{validate, validate_with_summary, EventValidator, ValidatorOptions};
use proptest::prelude::*;
use serde_json::{json, Value};

fn tag(s: &str) -> TypeTag {
    TypeTag::parse(s).unwrap()
}

/// Render events as one pretty-printed object per block, blank-line separated.
fn log(events: &[Value]) -> String {
    events
        .iter()
        .map(|e| serde_json::to_string_pretty(e).unwrap())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn declare(name: &str, schema: Value) -> Value {
    json!({"type": "TypeDeclared", "data": {"name": name, "schema": schema}})
}

fn builtin_self_declaration() -> Value {
    declare(
        "TypeDeclared",
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "log": {"type": "string"},
                "schema": {"type": "object"}
            },
            "required": ["name", "schema"],
            "additionalProperties": false
        }),
    )
}

fn greeting_schema(field: &str) -> Value {
    json!({
        "type": "object",
        "properties": {field: {"type": "string"}},
        "required": [field]
    })
}

// ---------------------------------------------------------------------------
// Bootstrap and summary
// ---------------------------------------------------------------------------

#[test]
fn greeting_scenario_summary() {
    let text = log(&[
        builtin_self_declaration(),
        declare("Greeting", greeting_schema("text")),
        json!({"type": "Greeting", "data": {"text": "hi"}}),
    ]);
    let summary = validate_with_summary(&text, ValidatorOptions::default()).unwrap();

    assert_eq!(summary.total_events, 3);
    assert_eq!(summary.declaration_events, 2);
    assert_eq!(summary.ordinary_events, 1);
    assert_eq!(
        summary.declared_types.iter().cloned().collect::<Vec<_>>(),
        vec![tag("Greeting"), tag("TypeDeclared")]
    );
    assert_eq!(summary.event_counts[&tag("TypeDeclared")], 2);
    assert_eq!(summary.event_counts[&tag("Greeting")], 1);
    assert_eq!(
        summary.declarator_types.iter().cloned().collect::<Vec<_>>(),
        vec![tag("TypeDeclared")]
    );
}

#[test]
fn empty_document_is_valid() {
    validate("", ValidatorOptions::default()).unwrap();
    let summary = validate_with_summary("  \n", ValidatorOptions::default()).unwrap();
    assert_eq!(summary.total_events, 0);
}

#[test]
fn compact_concatenation_without_whitespace_is_valid() {
    let text = r#"{"type":"TypeDeclared","data":{"name":"Ping","schema":{}}}{"type":"Ping","data":null}"#;
    validate(text, ValidatorOptions::default()).unwrap();
}

// ---------------------------------------------------------------------------
// Undeclared types
// ---------------------------------------------------------------------------

#[test]
fn lone_event_is_undeclared_at_index_zero() {
    let err = validate(
        r#"{"type": "Greeting", "data": {"text": "hi"}}"#,
        ValidatorOptions::default(),
    )
    .unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::UndeclaredType {
            tag: "Greeting".to_string()
        }
    );
    assert_eq!(err.event_index, 0);
    assert_eq!((err.line(), err.column()), (1, 1));
    assert_eq!(
        err.to_string(),
        "line 1, col 1, event 0: type Greeting used before declaration"
    );
}

#[test]
fn undeclared_error_points_at_event_start() {
    let text = format!(
        "{}\n   {}",
        serde_json::to_string(&declare("A", json!({}))).unwrap(),
        r#"{"type": "B", "data": 1}"#
    );
    let err = validate(&text, ValidatorOptions::default()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UndeclaredType { .. }));
    assert_eq!(err.event_index, 1);
    assert_eq!((err.line(), err.column()), (2, 4));
}

#[test]
fn versions_must_match_exactly() {
    let text = log(&[
        declare("Order@v1", json!({})),
        json!({"type": "Order@v1", "data": {}}),
        json!({"type": "Order", "data": {}}),
    ]);
    let err = validate(&text, ValidatorOptions::default()).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::UndeclaredType {
            tag: "Order".to_string()
        }
    );
    assert_eq!(err.event_index, 2);
}

#[test]
fn multi_at_versions_round_trip_through_declaration() {
    let text = log(&[
        declare("Foo@a@b", json!({"type": "integer"})),
        json!({"type": "Foo@a@b", "data": 3}),
    ]);
    validate(&text, ValidatorOptions::default()).unwrap();
}

// ---------------------------------------------------------------------------
// Bootstrap self-declaration
// ---------------------------------------------------------------------------

#[test]
fn second_self_declaration_fails_even_if_identical() {
    let text = log(&[
        builtin_self_declaration(),
        declare("A", json!({})),
        builtin_self_declaration(),
    ]);
    let err = validate(&text, ValidatorOptions::default()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateSelfDeclaration { .. }));
    assert_eq!(err.event_index, 2);
}

#[test]
fn self_declaration_with_open_additional_properties_mismatches() {
    let mut decl = builtin_self_declaration();
    decl["data"]["schema"]["additionalProperties"] = json!(true);
    let err = validate(&log(&[decl]), ValidatorOptions::default()).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::SelfDeclarationShapeMismatch { .. }
    ));
    assert_eq!(err.event_index, 0);
}

#[test]
fn self_declaration_may_document_log_field() {
    let mut decl = builtin_self_declaration();
    decl["data"]["log"] = json!("bootstrap");
    decl["data"]["schema"]["properties"]["log"] =
        json!({"type": "string", "description": "free-form commit message"});
    let text = log(&[decl, declare("A", json!({}))]);
    validate(&text, ValidatorOptions::default()).unwrap();
}

// ---------------------------------------------------------------------------
// Declarators
// ---------------------------------------------------------------------------

#[test]
fn declarer_shaped_type_declares_instead_of_validating() {
    let foo_schema = json!({
        "type": "object",
        "properties": {"name": {"type": "string"}, "schema": {"type": "object"}},
        "required": ["name", "schema"]
    });
    let text = log(&[
        declare("Foo", foo_schema),
        json!({"type": "Foo", "data": {"name": "Bar", "schema": {"type": "string"}}}),
        json!({"type": "Bar", "data": "declared through Foo"}),
    ]);
    let summary = validate_with_summary(&text, ValidatorOptions::default()).unwrap();
    assert_eq!(summary.declaration_events, 2);
    assert_eq!(summary.ordinary_events, 1);
    assert!(summary.declarator_types.contains(&tag("Foo")));
    assert!(summary.declared_types.contains(&tag("Bar")));
}

#[test]
fn declarator_status_survives_non_declarer_redeclaration() {
    let declarer_shape = json!({
        "type": "object",
        "properties": {"name": {}, "schema": {}},
        "required": ["name", "schema"]
    });
    let text = log(&[
        declare("Foo", declarer_shape),
        // Foo redeclares itself through itself, with a shape lacking `name`/`schema`.
        json!({"type": "Foo", "data": {"name": "Foo", "schema": {"type": "object"}}}),
        // Still a declaration: the payload is checked against Foo's new schema
        // and registers Baz.
        json!({"type": "Foo", "data": {"name": "Baz", "schema": {}}}),
    ]);
    let mut validator = EventValidator::new(ValidatorOptions::default().with_summary());
    validator.validate_text(&text).unwrap();
    assert!(validator.declarators().contains(&tag("Foo")));
    assert!(validator.registry().contains(&tag("Baz")));
    let summary = validator.summary().unwrap();
    assert_eq!(summary.declaration_events, 3);
    assert_eq!(summary.ordinary_events, 0);
}

// ---------------------------------------------------------------------------
// Redeclaration and references
// ---------------------------------------------------------------------------

#[test]
fn redeclaration_is_last_write_wins() {
    let old_shape = json!({"type": "Greeting", "data": {"text": "hi"}});
    let new_shape = json!({"type": "Greeting", "data": {"message": "hi"}});

    let ok = log(&[
        declare("Greeting", greeting_schema("text")),
        declare("Greeting", greeting_schema("message")),
        new_shape,
    ]);
    validate(&ok, ValidatorOptions::default()).unwrap();

    let stale = log(&[
        declare("Greeting", greeting_schema("text")),
        declare("Greeting", greeting_schema("message")),
        old_shape,
    ]);
    let err = validate(&stale, ValidatorOptions::default()).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::MissingProperty {
            context: "Greeting".to_string(),
            property: "message".to_string()
        }
    );
    assert_eq!(err.event_index, 2);
}

#[test]
fn refs_resolve_to_latest_declaration() {
    let text = log(&[
        declare("Id", json!({"type": "integer"})),
        declare(
            "User",
            json!({"type": "object", "properties": {"id": {"$ref": "#/$defs/Id"}}}),
        ),
        json!({"type": "User", "data": {"id": 1}}),
        declare("Id", json!({"type": "string"})),
        json!({"type": "User", "data": {"id": 1}}),
    ]);
    let err = validate(&text, ValidatorOptions::default()).unwrap_err();
    assert_eq!(err.to_string().split(": ").last(), Some("expected string"));
    assert_eq!(err.event_index, 4);
}

#[test]
fn ref_to_undeclared_type_fails_when_used() {
    let text = log(&[
        declare(
            "User",
            json!({"type": "object", "properties": {"id": {"$ref": "#/$defs/Id"}}}),
        ),
        json!({"type": "User", "data": {}}),
        json!({"type": "User", "data": {"id": 1}}),
    ]);
    let err = validate(&text, ValidatorOptions::default()).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::UnresolvedRef {
            context: "User.id".to_string(),
            target: "Id".to_string()
        }
    );
    assert_eq!(err.event_index, 2);
}

#[test]
fn nested_violation_reports_event_start_not_payload_position() {
    let text = log(&[
        declare(
            "Batch",
            json!({
                "type": "object",
                "properties": {"items": {"type": "array", "items": {"type": "integer"}}}
            }),
        ),
        json!({"type": "Batch", "data": {"items": [1, 2, true]}}),
    ]);
    let err = validate(&text, ValidatorOptions::default()).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::TypeMismatch {
            context: "Batch.items[2]".to_string(),
            expected: "integer"
        }
    );
    // The second event starts right after the blank line separating them.
    let second_start = text.find("\n\n{").unwrap() + 2;
    let expected_line = text[..second_start].matches('\n').count() + 1;
    assert_eq!((err.line(), err.column()), (expected_line, 1));
}

#[test]
fn malformed_json_aborts_with_decoder_position() {
    let text = format!(
        "{}\n{{\"type\": \"A\", \"data\": }}",
        serde_json::to_string(&declare("A", json!({}))).unwrap()
    );
    let err = validate(&text, ValidatorOptions::default()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MalformedJson { .. }));
    assert_eq!(err.event_index, 1);
    assert_eq!(err.line(), 2);
    assert!(err.column() > 1);
}

#[test]
fn strict_envelope_from_options() {
    let text = r#"{"type": "TypeDeclared", "data": {"name": "A", "schema": {}}, "at": "2024-01-01"}"#;
    validate(text, ValidatorOptions::default()).unwrap();
    let err = validate(text, ValidatorOptions::default().strict()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MalformedEvent { .. }));
}

// ---------------------------------------------------------------------------
// Numbers and nesting
// ---------------------------------------------------------------------------

fn integer_log(literal: &str) -> String {
    let declaration = serde_json::to_string(&declare("N", json!({"type": "integer"}))).unwrap();
    format!("{declaration}\n{{\"type\": \"N\", \"data\": {literal}}}\n")
}

#[test]
fn integers_outside_64_bits_and_negative_zero_are_integers() {
    for literal in ["0", "-0", "18446744073709551616", "-9223372036854775809"] {
        validate(&integer_log(literal), ValidatorOptions::default())
            .unwrap_or_else(|e| panic!("{literal} rejected: {e}"));
    }
}

#[test]
fn fractional_and_exponent_literals_are_not_integers() {
    for literal in ["1.0", "1e2", "true"] {
        let err = validate(&integer_log(literal), ValidatorOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "line 2, col 1, event 1: N: expected integer");
    }
}

fn nested_arrays(depth: usize) -> String {
    format!("{}{}", "[".repeat(depth), "]".repeat(depth))
}

#[test]
fn nesting_up_to_one_hundred_levels_is_accepted() {
    let text = format!(
        "{}\n{{\"type\": \"Deep\", \"data\": {}}}",
        serde_json::to_string(&declare("Deep", json!({}))).unwrap(),
        nested_arrays(100)
    );
    validate(&text, ValidatorOptions::default()).unwrap();
}

#[test]
fn nesting_beyond_the_decoder_limit_is_malformed_json() {
    let text = format!(
        "{}\n{{\"type\": \"Deep\", \"data\": {}}}",
        serde_json::to_string(&declare("Deep", json!({}))).unwrap(),
        nested_arrays(200)
    );
    let err = validate(&text, ValidatorOptions::default()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MalformedJson { .. }));
    assert_eq!(err.event_index, 1);
    assert_eq!(err.line(), 2);
    assert!(err.reason().contains("recursion limit exceeded"));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// Prefixed so a generated schema never has the declarer shape.
fn field_name() -> impl Strategy<Value = String> {
    "f_[a-z]{1,5}"
}

fn primitive() -> impl Strategy<Value = (&'static str, Value)> {
    prop_oneof![
        any::<i32>().prop_map(|n| ("integer", json!(n))),
        any::<bool>().prop_map(|b| ("boolean", json!(b))),
        "[ -~]{0,8}".prop_map(|s| ("string", json!(s))),
        (-1.0e6f64..1.0e6).prop_map(|f| ("number", json!(f))),
    ]
}

proptest! {
    /// Any stream whose types are declared before use validates, and the
    /// summary accounts for every event.
    #[test]
    fn declared_before_use_always_validates(
        types in proptest::collection::btree_map(
            "[A-Z][a-z]{0,5}",
            proptest::collection::btree_map(field_name(), primitive(), 0..4),
            1..5,
        ),
        repeats in 1usize..4,
    ) {
        let mut events = Vec::new();
        for (name, fields) in &types {
            let properties: serde_json::Map<String, Value> = fields
                .iter()
                .map(|(field, (kind, _))| (field.clone(), json!({"type": kind})))
                .collect();
            let required: Vec<&String> = fields.keys().collect();
            events.push(declare(name, json!({
                "type": "object",
                "properties": properties,
                "required": required,
                "additionalProperties": false
            })));
        }
        for _ in 0..repeats {
            for (name, fields) in &types {
                let data: serde_json::Map<String, Value> = fields
                    .iter()
                    .map(|(field, (_, value))| (field.clone(), value.clone()))
                    .collect();
                events.push(json!({"type": name, "data": data}));
            }
        }

        let summary = validate_with_summary(&log(&events), ValidatorOptions::default()).unwrap();
        prop_assert_eq!(summary.total_events, events.len());
        prop_assert_eq!(summary.declaration_events, types.len());
        prop_assert_eq!(summary.ordinary_events, types.len() * repeats);
    }

    /// An undeclared tag fails at exactly its own index.
    #[test]
    fn undeclared_tag_fails_at_its_index(prefix in 0usize..6) {
        let mut events = vec![declare("Known", json!({}))];
        events.extend((0..prefix).map(|i| json!({"type": "Known", "data": i})));
        events.push(json!({"type": "Unknown", "data": {}}));

        let err = validate(&log(&events), ValidatorOptions::default()).unwrap_err();
        let is_undeclared = matches!(err.kind, ErrorKind::UndeclaredType { .. });
        prop_assert!(is_undeclared);
        prop_assert_eq!(err.event_index, prefix + 1);
    }
}
