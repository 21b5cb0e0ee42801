use dyncore::{is_port_list, DiagnosticSink, ExecutionOutcome, Item, ResultCollection};
use serde_json::Value;

/// Which output ports contribute to the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PortSelection {
    /// Port 0 only
    #[default]
    First,
    /// Every port, in port order
    Flatten,
}

/// Reduce an engine outcome to an ordered item list.
///
/// Never fails: anything that is not a list of output ports (bare or under
/// `data`) yields no items and one diagnostic.
pub fn reduce(
    outcome: ExecutionOutcome,
    selection: PortSelection,
    sink: &dyn DiagnosticSink,
) -> ResultCollection {
    match outcome {
        ExecutionOutcome::Ports(ports) => collect_ports(ports, selection, sink),
        ExecutionOutcome::Wrapped(Value::Array(ports)) if is_port_list(&ports) => {
            collect_ports(ports, selection, sink)
        }
        ExecutionOutcome::NotCollected => Vec::new(),
        unexpected => {
            sink.warn(&format!(
                "Sub-workflow returned {}; no items collected",
                unexpected.shape()
            ));
            Vec::new()
        }
    }
}

fn collect_ports(
    ports: Vec<Value>,
    selection: PortSelection,
    sink: &dyn DiagnosticSink,
) -> Vec<Item> {
    let entries: Vec<Value> = match selection {
        PortSelection::First => ports.into_iter().next().map(port_entries).unwrap_or_default(),
        PortSelection::Flatten => ports.into_iter().flat_map(port_entries).collect(),
    };

    let total = entries.len();
    let items: Vec<Item> = entries
        .into_iter()
        .filter_map(Item::from_result_entry)
        .collect();

    if items.len() < total {
        sink.warn(&format!(
            "Skipped {} result entr{} that were not objects",
            total - items.len(),
            if total - items.len() == 1 { "y" } else { "ies" }
        ));
    }

    items
}

/// Entries of one port; a `null` port contributed nothing.
fn port_entries(port: Value) -> Vec<Value> {
    match port {
        Value::Array(entries) => entries,
        _ => Vec::new(),
    }
}
