// crates/dynruntime/tests/reducer_test.rs

mod common;

use common::RecordingSink;
use dyncore::ExecutionOutcome;
use dynruntime::{reduce, PortSelection};
use serde_json::{json, Value};

fn reduce_raw(raw: Option<Value>, selection: PortSelection) -> (Vec<Value>, usize) {
    let sink = RecordingSink::default();
    let items = reduce(ExecutionOutcome::classify(raw), selection, &sink);
    let payloads = items.into_iter().map(|i| Value::Object(i.json)).collect();
    (payloads, sink.count())
}

#[test]
fn test_first_port_of_bare_array() {
    let raw = json!([
        [{"json": {"a": 1}}, {"json": {"a": 2}}],
        [{"json": {"b": 1}}]
    ]);

    let (items, diagnostics) = reduce_raw(Some(raw), PortSelection::First);

    assert_eq!(items, vec![json!({"a": 1}), json!({"a": 2})]);
    assert_eq!(diagnostics, 0);
}

#[test]
fn test_flatten_all_ports_in_order() {
    let raw = json!([
        [{"json": {"a": 1}}],
        [],
        [{"json": {"b": 1}}, {"json": {"b": 2}}]
    ]);

    let (items, _) = reduce_raw(Some(raw), PortSelection::Flatten);

    assert_eq!(items, vec![json!({"a": 1}), json!({"b": 1}), json!({"b": 2})]);
}

#[test]
fn test_wrapped_data_is_unwrapped() {
    let raw = json!({"data": [[{"json": {"ok": true}}]], "finished": true});

    let (items, diagnostics) = reduce_raw(Some(raw), PortSelection::First);

    assert_eq!(items, vec![json!({"ok": true})]);
    assert_eq!(diagnostics, 0);
}

#[test]
fn test_null_ports_count_as_empty() {
    let raw = json!([[{"json": {"a": 1}}], null, [{"json": {"c": 3}}]]);

    let (first, diagnostics) = reduce_raw(Some(raw.clone()), PortSelection::First);
    assert_eq!(first, vec![json!({"a": 1})]);
    assert_eq!(diagnostics, 0);

    let (all, diagnostics) = reduce_raw(Some(raw), PortSelection::Flatten);
    assert_eq!(all, vec![json!({"a": 1}), json!({"c": 3})]);
    assert_eq!(diagnostics, 0);

    let wrapped = json!({"data": [null, [{"json": {"b": 2}}]]});
    let (first, _) = reduce_raw(Some(wrapped.clone()), PortSelection::First);
    assert!(first.is_empty());
    let (all, _) = reduce_raw(Some(wrapped), PortSelection::Flatten);
    assert_eq!(all, vec![json!({"b": 2})]);
}

#[test]
fn test_bare_objects_are_wrapped_and_scalars_skipped() {
    let sink = RecordingSink::default();
    let raw = json!([[
        {"plain": 1},
        5,
        "text",
        {"json": {"wrapped": 2}, "binary": {"f": {}}},
        null
    ]]);

    let items = reduce(ExecutionOutcome::classify(Some(raw)), PortSelection::First, &sink);

    assert_eq!(items.len(), 2);
    assert_eq!(Value::Object(items[0].json.clone()), json!({"plain": 1}));
    assert_eq!(Value::Object(items[1].json.clone()), json!({"wrapped": 2}));
    assert!(items[1].binary.is_some());
    assert_eq!(sink.count(), 1);
}

#[test]
fn test_malformed_outcomes_degrade_to_empty() {
    let cases = vec![
        None,
        Some(json!(null)),
        Some(json!({})),
        Some(json!({"data": null})),
        Some(json!({"data": "not-an-array"})),
        Some(json!({"data": [1, 2]})),
        Some(json!("done")),
        Some(json!(17)),
        Some(json!([{"json": {}}])),
    ];

    for raw in cases {
        let (items, diagnostics) = reduce_raw(raw.clone(), PortSelection::First);
        assert!(items.is_empty(), "{:?} should reduce to nothing", raw);
        assert_eq!(diagnostics, 1, "{:?} should log once", raw);
    }
}

#[test]
fn test_empty_port_list_is_quietly_empty() {
    let (items, diagnostics) = reduce_raw(Some(json!([])), PortSelection::First);
    assert!(items.is_empty());
    assert_eq!(diagnostics, 0);
}

#[test]
fn test_not_collected_is_silent() {
    let sink = RecordingSink::default();
    let items = reduce(ExecutionOutcome::NotCollected, PortSelection::Flatten, &sink);
    assert!(items.is_empty());
    assert_eq!(sink.count(), 0);
}

#[test]
fn test_classification() {
    assert_eq!(ExecutionOutcome::classify(None), ExecutionOutcome::Absent);
    assert_eq!(ExecutionOutcome::classify(Some(json!(null))), ExecutionOutcome::Absent);
    assert_eq!(
        ExecutionOutcome::classify(Some(json!({"data": 1}))),
        ExecutionOutcome::Wrapped(json!(1))
    );
    assert_eq!(
        ExecutionOutcome::classify(Some(json!({}))),
        ExecutionOutcome::Other(json!({}))
    );
    assert!(matches!(
        ExecutionOutcome::classify(Some(json!([[]]))),
        ExecutionOutcome::Ports(_)
    ));
    assert!(matches!(
        ExecutionOutcome::classify(Some(json!([[], null]))),
        ExecutionOutcome::Ports(_)
    ));
}
