use crate::normalizer::NormalizedInput;
use dyncore::{
    AssemblyError, ConnectionGraph, ConnectionTarget, DiagnosticSink, NodeDefinition,
    PortConnections, WorkflowDocument, WorkflowSkeleton, MAIN_CONNECTION, START_NODE,
};
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Build the workflow document for one sub-execution.
///
/// The skeleton is copied, the definitions appended, their connections
/// rewritten to the injected names and `Start` wired to the first one.
pub fn assemble(
    skeleton: &WorkflowSkeleton,
    input: &NormalizedInput,
    sink: &dyn DiagnosticSink,
) -> Result<WorkflowDocument, AssemblyError> {
    let entry = input
        .first()
        .ok_or(AssemblyError::NoDefinitions)?
        .name
        .clone();

    let mut document = skeleton.instantiate();
    ensure_unique(&document, &input.definitions)?;

    document.nodes.extend(input.definitions.iter().cloned());

    for (source, ports) in rewrite_graph(&input.graph, &input.renames, sink) {
        document.connections.insert(source, ports);
    }

    wire_entry(&mut document, &entry);
    check_reachability(&document, &input.definitions, sink);

    Ok(document)
}

fn ensure_unique(
    document: &WorkflowDocument,
    definitions: &[NodeDefinition],
) -> Result<(), AssemblyError> {
    let mut names: HashSet<&str> = document.node_names().collect();
    let mut ids: HashSet<&str> = document
        .nodes
        .iter()
        .filter_map(|n| n.id.as_deref())
        .collect();

    for definition in definitions {
        if !names.insert(&definition.name) {
            return Err(AssemblyError::DuplicateIdentity(definition.name.clone()));
        }
        if let Some(id) = definition.id.as_deref() {
            if !ids.insert(id) {
                return Err(AssemblyError::DuplicateIdentity(id.to_string()));
            }
        }
    }

    Ok(())
}

fn rewrite_graph(
    graph: &ConnectionGraph,
    renames: &BTreeMap<String, String>,
    sink: &dyn DiagnosticSink,
) -> ConnectionGraph {
    let mut rewritten = ConnectionGraph::new();

    for (source, ports) in graph {
        let Some(injected_source) = renames.get(source) else {
            sink.warn(&format!(
                "Dropping connections from '{}': node is not part of the injected definitions",
                source
            ));
            continue;
        };

        let mut injected_ports = BTreeMap::new();
        for (kind, fan_outs) in ports {
            let fan_outs: PortConnections = fan_outs
                .iter()
                .map(|fan_out| {
                    fan_out
                        .iter()
                        .filter_map(|target| match renames.get(&target.node) {
                            Some(injected) => Some(ConnectionTarget {
                                node: injected.clone(),
                                ..target.clone()
                            }),
                            None => {
                                sink.warn(&format!(
                                    "Dropping connection '{}' -> '{}': target is not \
                                     part of the injected definitions",
                                    source, target.node
                                ));
                                None
                            }
                        })
                        .collect::<Vec<_>>()
                })
                .collect();
            injected_ports.insert(kind.clone(), fan_outs);
        }

        rewritten.insert(injected_source.clone(), injected_ports);
    }

    rewritten
}

/// Make `target` the sole destination of `Start`'s main output.
fn wire_entry(document: &mut WorkflowDocument, target: &str) {
    let main = document
        .connections
        .entry(START_NODE.to_string())
        .or_default()
        .entry(MAIN_CONNECTION.to_string())
        .or_default();

    let entry = main
        .first()
        .and_then(|fan_out| fan_out.first())
        .map(|existing| ConnectionTarget {
            node: target.to_string(),
            ..existing.clone()
        })
        .unwrap_or_else(|| ConnectionTarget::main(target));

    *main = vec![vec![entry]];
}

fn check_reachability(
    document: &WorkflowDocument,
    injected: &[NodeDefinition],
    sink: &dyn DiagnosticSink,
) {
    let mut graph = DiGraph::<&str, ()>::new();
    let index: HashMap<&str, NodeIndex> = document
        .node_names()
        .map(|name| (name, graph.add_node(name)))
        .collect();

    for (source, ports) in &document.connections {
        let Some(&from) = index.get(source.as_str()) else {
            continue;
        };
        for target in ports.values().flatten().flatten() {
            if let Some(&to) = index.get(target.node.as_str()) {
                graph.add_edge(from, to, ());
            }
        }
    }

    let Some(&start) = index.get(START_NODE) else {
        return;
    };

    for definition in injected {
        if let Some(&node) = index.get(definition.name.as_str()) {
            if !has_path_connecting(&graph, start, node, None) {
                sink.warn(&format!(
                    "Node '{}' is not reachable from '{}' and will not run",
                    definition.name, START_NODE
                ));
            }
        }
    }
}
