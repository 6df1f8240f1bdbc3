//! Graph-level structural validation rules (S001–S008).

use std::collections::{HashMap, HashSet};

use petgraph::algo::is_cyclic_directed;

use crate::config::EngineConfig;
use crate::error::ValidationError;
use crate::parse::{FlowGraph, OutputPorts, describe_port};

/// Run all structural validation rules. Returns all errors found.
pub fn validate_structural(graph: &FlowGraph, config: &EngineConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    s001_exactly_one_trigger(graph, &mut errors);
    s002_single_inbound_edge(graph, &mut errors);
    s003_trigger_no_incoming(graph, &mut errors);
    s004_one_edge_per_port(graph, &mut errors);
    s005_ports_declared(graph, &mut errors);
    if config.unique_labels {
        s006_unique_labels(graph, &mut errors);
    }
    s007_no_self_loops(graph, &mut errors);
    s008_no_cycles(graph, &mut errors);

    errors
}

fn s001_exactly_one_trigger(graph: &FlowGraph, errors: &mut Vec<ValidationError>) {
    if graph.is_empty() {
        return;
    }
    let trigger_count = graph.triggers().len();
    if trigger_count != 1 {
        errors.push(ValidationError::structural(
            "S001",
            format!(
                "Flow must have exactly 1 trigger node, found {}",
                trigger_count
            ),
        ));
    }
}

fn s002_single_inbound_edge(graph: &FlowGraph, errors: &mut Vec<ValidationError>) {
    for node in graph.nodes() {
        let count = graph.incoming_count(node.id());
        if count > 1 {
            errors.push(
                ValidationError::structural(
                    "S002",
                    format!(
                        "Node '{}' accepts a single inbound edge, found {}",
                        node.id(),
                        count
                    ),
                )
                .at_node(node.id()),
            );
        }
    }
}

fn s003_trigger_no_incoming(graph: &FlowGraph, errors: &mut Vec<ValidationError>) {
    for node in graph.triggers() {
        if graph.incoming_count(node.id()) > 0 {
            errors.push(
                ValidationError::structural(
                    "S003",
                    format!("Trigger node '{}' must not have incoming edges", node.id()),
                )
                .at_node(node.id()),
            );
        }
    }
}

fn s004_one_edge_per_port(graph: &FlowGraph, errors: &mut Vec<ValidationError>) {
    for node in graph.nodes() {
        if node.kind.output_ports() == OutputPorts::Unchecked {
            continue;
        }
        let mut per_port: HashMap<Option<&str>, usize> = HashMap::new();
        let mut order = Vec::new();
        for edge in graph.outgoing_edges(node.id()) {
            let count = per_port.entry(edge.source_handle).or_insert(0);
            if *count == 0 {
                order.push(edge.source_handle);
            }
            *count += 1;
        }
        for port in order {
            let count = per_port[&port];
            if count > 1 {
                errors.push(
                    ValidationError::structural(
                        "S004",
                        format!(
                            "{} of node '{}' has {} outgoing edges, at most 1 allowed",
                            describe_port(port),
                            node.id(),
                            count
                        ),
                    )
                    .at_node(node.id()),
                );
            }
        }
    }
}

fn s005_ports_declared(graph: &FlowGraph, errors: &mut Vec<ValidationError>) {
    for node in graph.nodes() {
        let ports = node.kind.output_ports();
        let expected = match &ports {
            OutputPorts::Named(names) => format!("expected one of: {}", names.join(", ")),
            OutputPorts::Single => "expected the default output".to_string(),
            OutputPorts::Unchecked => continue,
        };
        for edge in graph.outgoing_edges(node.id()) {
            if !ports.accepts(edge.source_handle) {
                errors.push(
                    ValidationError::structural(
                        "S005",
                        format!(
                            "{} node '{}' has an edge on {}, {}",
                            node.node_type(),
                            node.id(),
                            describe_port(edge.source_handle),
                            expected
                        ),
                    )
                    .at_node(node.id()),
                );
            }
        }
    }
}

fn s006_unique_labels(graph: &FlowGraph, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for node in graph.nodes() {
        let label = node.label().trim();
        if label.is_empty() {
            continue;
        }
        let key = label.to_lowercase();
        if !seen.insert(key.clone()) && reported.insert(key) {
            errors.push(
                ValidationError::structural(
                    "S006",
                    format!("Label '{}' is used by more than one node", label),
                )
                .at_node(node.id()),
            );
        }
    }
}

fn s007_no_self_loops(graph: &FlowGraph, errors: &mut Vec<ValidationError>) {
    for edge in graph.edges() {
        if edge.source == edge.target {
            errors.push(
                ValidationError::structural(
                    "S007",
                    format!("Self-loop detected on node '{}'", edge.source),
                )
                .at_node(edge.source),
            );
        }
    }
}

fn s008_no_cycles(graph: &FlowGraph, errors: &mut Vec<ValidationError>) {
    if is_cyclic_directed(graph.inner()) {
        errors.push(ValidationError::structural(
            "S008",
            "Flow graph contains a cycle",
        ));
    }
}
