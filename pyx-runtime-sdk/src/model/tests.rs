use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::error::PyxError;
use crate::model::message::{CallPayload, ClientMessage, Envelope, GetFunctionArgument, ResourceEvent, ServerRequest};
use crate::model::path::{parse_path_key, walk, PathSegment};
use crate::model::value::{PreloadPlan, RawValue, TaggedValue, VariantPolicy};

#[test]
fn test_element_descriptor_decoding() {
    let raw = RawValue::try_from(json!({
        "__type__": "Element",
        "tag": "div",
        "props": { "x": 1 },
        "children": ["hi"],
    }))
    .unwrap();

    let expected = RawValue::Tagged(TaggedValue::Element {
        tag: "div".to_string(),
        props: BTreeMap::from([("x".to_string(), RawValue::Number(1.into()))]),
        children: Box::new(RawValue::Array(vec![RawValue::String("hi".to_string())])),
    });

    assert_eq!(raw, expected);
}

#[test]
fn test_legacy_element_spelling_and_missing_props() {
    let raw = RawValue::try_from(json!({
        "__type__": "PyXElement",
        "tag": "h1",
        "props": null,
    }))
    .unwrap();

    match raw {
        RawValue::Tagged(TaggedValue::Element { tag, props, children }) => {
            assert_eq!(tag, "h1");
            assert!(props.is_empty());
            assert_eq!(*children, RawValue::Null);
        }
        other => panic!("expected an element, got {:?}", other),
    }
}

#[test]
fn test_function_descriptor_with_nested_plan() {
    let raw = RawValue::try_from(json!({
        "__type__": "Function",
        "id": "f1",
        "preload_args": { "[0]": { "\"a\"": null } },
    }))
    .unwrap();

    let RawValue::Tagged(TaggedValue::Function { id, preload_plan }) = raw else {
        panic!("expected a function descriptor");
    };

    assert_eq!(id, "f1");
    let plan = preload_plan.unwrap();
    let (key, step) = plan.iter().next().unwrap();
    assert_eq!(key, "[0]");
    assert_eq!(step.path, vec![PathSegment::Index(0)]);

    let nested = step.subplan.as_ref().unwrap();
    let (key, step) = nested.iter().next().unwrap();
    assert_eq!(key, "\"a\"");
    assert_eq!(step.path, vec![PathSegment::Key("a".to_string())]);
    assert!(step.subplan.is_none());
}

#[test]
fn test_function_without_plan() {
    let raw = RawValue::try_from(json!({ "__type__": "Function", "id": "f1", "preload_args": null })).unwrap();

    assert_eq!(
        raw,
        RawValue::Tagged(TaggedValue::Function { id: "f1".to_string(), preload_plan: None })
    );
}

#[test]
fn test_missing_id_is_malformed() {
    let result = RawValue::try_from(json!({ "__type__": "Renderable" }));

    assert!(matches!(result, Err(PyxError::MalformedVariant { .. })));
}

#[test]
fn test_unknown_discriminator_policies() {
    let value = json!({ "__type__": "Portal", "target": "body", "inner": [1] });

    let opaque = RawValue::decode(value.clone(), VariantPolicy::Opaque).unwrap();
    match &opaque {
        RawValue::Tagged(TaggedValue::Opaque { discriminator, fields }) => {
            assert_eq!(discriminator, "Portal");
            assert_eq!(fields.len(), 2);
        }
        other => panic!("expected an opaque variant, got {:?}", other),
    }
    assert_eq!(opaque.to_json(), value);

    let rejected = RawValue::decode(value, VariantPolicy::Reject);
    assert!(matches!(rejected, Err(PyxError::UnknownVariant(name)) if name == "Portal"));
}

#[test]
fn test_raw_value_serializes_back_to_wire_form() {
    let wire = json!({
        "list": [1, "two", null, true],
        "child": { "__type__": "Renderable", "id": "r2" },
        "onClick": { "__type__": "Function", "id": "f1", "preload_args": { "0": null } },
    });

    let raw: RawValue = serde_json::from_value(wire.clone()).unwrap();
    let serialized = serde_json::to_value(&raw).unwrap();

    assert_eq!(serialized, wire);
}

#[test]
fn test_plan_key_forms() {
    assert_eq!(parse_path_key("[0]").unwrap(), vec![PathSegment::Index(0)]);
    assert_eq!(parse_path_key("0").unwrap(), vec![PathSegment::Index(0)]);
    assert_eq!(
        parse_path_key("[1, \"target\", \"value\"]").unwrap(),
        vec![
            PathSegment::Index(1),
            PathSegment::Key("target".to_string()),
            PathSegment::Key("value".to_string()),
        ]
    );

    assert!(matches!(parse_path_key("[-1]"), Err(PyxError::MalformedPlan { .. })));
    assert!(matches!(parse_path_key("{"), Err(PyxError::MalformedPlan { .. })));
    assert!(matches!(parse_path_key("[true]"), Err(PyxError::MalformedPlan { .. })));
}

#[test]
fn test_plan_values_must_be_null_or_nested() {
    let result = PreloadPlan::from_json(json!({ "[0]": 5 }));

    assert!(matches!(result, Err(PyxError::MalformedPlan { key, .. }) if key == "[0]"));
}

#[test]
fn test_walk_arguments() {
    let args = json!([{ "target": { "value": "abc" } }, [10, 20], { "0": "zero" }]);

    let value = walk(&args, &[PathSegment::Index(0), PathSegment::Key("target".into()), PathSegment::Key("value".into())]).unwrap();
    assert_eq!(value, &json!("abc"));

    let value = walk(&args, &[PathSegment::Index(1), PathSegment::Index(1)]).unwrap();
    assert_eq!(value, &json!(20));

    // integer steps against objects use the decimal key
    let value = walk(&args, &[PathSegment::Index(2), PathSegment::Index(0)]).unwrap();
    assert_eq!(value, &json!("zero"));

    assert_eq!(walk(&args, &[]).unwrap(), &args);
}

#[test]
fn test_walk_invalid_paths() {
    let args = json!([{ "a": 1 }]);

    assert!(matches!(walk(&args, &[PathSegment::Index(3)]), Err(PyxError::InvalidPath { .. })));
    assert!(matches!(
        walk(&args, &[PathSegment::Index(0), PathSegment::Key("b".into())]),
        Err(PyxError::InvalidPath { .. })
    ));
    assert!(matches!(
        walk(&args, &[PathSegment::Index(0), PathSegment::Key("a".into()), PathSegment::Index(0)]),
        Err(PyxError::InvalidPath { .. })
    ));
}

#[test]
fn test_outbound_call_shape() {
    let message = ClientMessage::ResourceEvent {
        id: "f1".to_string(),
        data: ResourceEvent::Call(CallPayload {
            call_id: "c1".to_string(),
            arg_count: 2,
            preloaded_data: Map::new(),
        }),
    };

    let expected = json!({
        "event": "resource_event",
        "data": {
            "id": "f1",
            "data": {
                "event": "call",
                "data": { "call_id": "c1", "arg_count": 2, "preloaded_data": {} }
            }
        }
    });

    assert_eq!(serde_json::to_value(&message).unwrap(), expected);
}

#[test]
fn test_outbound_response_shape() {
    let message = ClientMessage::Response { id: json!(7), data: json!({ "a": 1 }) };

    assert_eq!(
        serde_json::to_value(&message).unwrap(),
        json!({ "event": "response", "data": { "id": 7, "data": { "a": 1 } } })
    );
}

#[test]
fn test_inbound_request_decoding() {
    let envelope: Envelope = serde_json::from_value(json!({
        "event": "request",
        "data": {
            "id": "q1",
            "data": {
                "event": "get_function_argument",
                "data": { "call_id": "c1", "path": [0, "a"] }
            }
        }
    }))
    .unwrap();

    assert_eq!(envelope.event, "request");

    let request: ServerRequest = serde_json::from_value(envelope.data).unwrap();
    assert_eq!(request.id, Value::from("q1"));
    assert_eq!(request.data.event, "get_function_argument");

    let fetch: GetFunctionArgument = serde_json::from_value(request.data.data).unwrap();
    assert_eq!(fetch.call_id, "c1");
    assert_eq!(fetch.path, vec![PathSegment::Index(0), PathSegment::Key("a".to_string())]);
}
