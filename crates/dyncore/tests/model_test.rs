// crates/dyncore/tests/model_test.rs

use dyncore::{
    DiagnosticSink, DynamicError, EngineError, EventBus, ExecutionEvent, InvocationId, Item,
    NodeDefinition, Position, RawInput, WorkflowDocument, WorkflowSkeleton, START_NODE,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Collect(Mutex<Vec<String>>);

impl DiagnosticSink for Collect {
    fn warn(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}

#[test]
fn test_builtin_skeleton_has_start() {
    let skeleton = WorkflowSkeleton::builtin().unwrap();
    let document = skeleton.document();

    assert_eq!(document.nodes.len(), 1);
    assert_eq!(document.nodes[0].name, START_NODE);
    assert_eq!(document.nodes[0].node_type(), Some("n8n-nodes-base.start"));
    assert!(document.extra.contains_key("settings"));

    let mut copy = skeleton.instantiate();
    copy.nodes.push(NodeDefinition::new("Extra"));
    assert_eq!(skeleton.document().nodes.len(), 1);
}

#[test]
fn test_skeleton_rejects_bad_templates() {
    assert!(matches!(
        WorkflowSkeleton::from_json_str("{"),
        Err(DynamicError::Skeleton(_))
    ));
    assert!(matches!(
        WorkflowSkeleton::from_value(json!({"nodes": [{"name": "Other"}]})),
        Err(DynamicError::Skeleton(_))
    ));
}

#[test]
fn test_document_round_trips_unknown_fields() {
    let value = json!({
        "name": "sub",
        "nodes": [{
            "name": "Start",
            "type": "n8n-nodes-base.start",
            "typeVersion": 1,
            "parameters": {},
            "position": [250, 300]
        }],
        "connections": {"Start": {"main": [[{"node": "X", "type": "main", "index": 0}]]}},
        "settings": {"executionOrder": "v1"}
    });

    let document: WorkflowDocument = serde_json::from_value(value.clone()).unwrap();

    assert_eq!(document.entry_target(), Some("X"));
    assert_eq!(document.nodes[0].position, Some(Position(250.0, 300.0)));
    assert_eq!(document.nodes[0].extra["typeVersion"], json!(1));

    let back = serde_json::to_value(&document).unwrap();
    assert_eq!(back["settings"], value["settings"]);
    assert_eq!(back["nodes"][0]["typeVersion"], json!(1));
}

#[test]
fn test_result_entries_become_items() {
    let entry = json!({"json": {"a": 1}, "pairedItem": {"item": 0}});
    let wrapped = Item::from_result_entry(entry).unwrap();
    assert_eq!(wrapped.json.get("a"), Some(&json!(1)));
    assert_eq!(wrapped.paired_item, Some(json!({"item": 0})));

    let bare = Item::from_result_entry(json!({"a": 2})).unwrap();
    assert_eq!(bare.json.get("a"), Some(&json!(2)));

    // A non-object `json` key is ordinary payload.
    let odd = Item::from_result_entry(json!({"json": "text"})).unwrap();
    assert_eq!(odd.json.get("json"), Some(&json!("text")));

    assert!(Item::from_result_entry(json!(3)).is_none());
    assert!(Item::from_result_entry(json!(null)).is_none());
}

#[test]
fn test_item_serializes_without_empty_fields() {
    let item = Item::from_json(json!({"k": "v"}));
    assert_eq!(serde_json::to_value(&item).unwrap(), json!({"json": {"k": "v"}}));

    let scalar = Item::from_json(json!(4));
    assert_eq!(scalar.json.get("value"), Some(&json!(4)));
}

#[test]
fn test_raw_input_accepts_text_or_json() {
    let text: RawInput = serde_json::from_value(json!("{\"name\": \"A\"}")).unwrap();
    assert_eq!(text, RawInput::Text("{\"name\": \"A\"}".to_string()));

    let value: RawInput = serde_json::from_value(json!({"name": "A"})).unwrap();
    assert_eq!(value, RawInput::Value(json!({"name": "A"})));

    assert_eq!(RawInput::from(json!("x")), RawInput::Text("x".to_string()));
}

#[test]
fn test_position_requires_two_numbers() {
    assert_eq!(Position::from_value(&json!([1, 2])), Some(Position(1.0, 2.0)));
    assert_eq!(Position::from_value(&json!([1])), None);
    assert_eq!(Position::from_value(&json!(["1", 2])), None);
    assert_eq!(Position::from_value(&json!(null)), None);
}

#[test]
fn test_error_classification() {
    assert!(DynamicError::InvalidInput("must be an object".into()).is_validation());
    assert!(DynamicError::MissingField("name".into()).is_validation());
    assert!(DynamicError::ItemCount { expected: 1, actual: 0 }.is_validation());
    assert!(!DynamicError::from(EngineError::Transport("refused".into())).is_validation());

    assert_eq!(
        DynamicError::InvalidInput("must be valid JSON".into()).to_string(),
        "Node JSON must be valid JSON"
    );
}

#[test]
fn test_emitter_forwards_and_broadcasts_diagnostics() {
    let bus = EventBus::new(16);
    let mut receiver = bus.subscribe();
    let sink = Arc::new(Collect::default());
    let invocation_id = InvocationId::new_v4();

    let emitter = bus.create_emitter(invocation_id, sink.clone());
    emitter.warn("something odd");

    assert_eq!(*sink.0.lock().unwrap(), vec!["something odd".to_string()]);
    match receiver.try_recv().unwrap() {
        ExecutionEvent::Diagnostic { invocation_id: id, message, .. } => {
            assert_eq!(id, invocation_id);
            assert_eq!(message, "something odd");
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_events_serialize_with_type_tag() {
    let event = ExecutionEvent::SubExecutionScheduled {
        invocation_id: InvocationId::new_v4(),
        item_index: Some(2),
        timestamp: chrono::Utc::now(),
    };

    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], json!("SubExecutionScheduled"));
    assert_eq!(value["item_index"], json!(2));
}
