#![allow(dead_code)]

use flowcheck::error::ValidationError;
use flowcheck::parse::*;

// =============================================================================
// Logging
// =============================================================================

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Node builders
// =============================================================================

pub fn trigger(id: &str, fields: &[(&str, FieldType, bool)]) -> FlowNode {
    FlowNode::new(
        id,
        format!("Trigger {}", id),
        NodeKind::Trigger(TriggerConfig {
            schema: fields
                .iter()
                .map(|(key, ty, required)| SchemaField::new(*key, *ty, *required))
                .collect(),
            description: None,
        }),
    )
}

pub fn action(id: &str) -> FlowNode {
    action_with_body(id, "")
}

pub fn action_with_body(id: &str, body: &str) -> FlowNode {
    FlowNode::new(
        id,
        format!("Action {}", id),
        NodeKind::Action(ActionConfig {
            service: "http".into(),
            body: Some(body.into()),
            ..Default::default()
        }),
    )
}

pub fn variable(id: &str, value: &str) -> FlowNode {
    FlowNode::new(
        id,
        format!("Variable {}", id),
        NodeKind::Variable(VariableConfig {
            name: id.into(),
            value: value.into(),
        }),
    )
}

pub fn condition(id: &str, left: &str) -> FlowNode {
    FlowNode::new(
        id,
        format!("Condition {}", id),
        NodeKind::Condition(ConditionConfig {
            rules: vec![ConditionRule {
                left: left.into(),
                operator: "eq".into(),
                right: "yes".into(),
            }],
            combinator: Combinator::And,
        }),
    )
}

pub fn switch(id: &str, cases: &[&str]) -> FlowNode {
    FlowNode::new(
        id,
        format!("Switch {}", id),
        NodeKind::Switch(SwitchConfig {
            expression: String::new(),
            cases: cases
                .iter()
                .map(|c| SwitchCase {
                    id: (*c).into(),
                    value: c.to_lowercase(),
                })
                .collect(),
        }),
    )
}

pub fn automation(id: &str, rules: Vec<CorrelationRule>) -> FlowNode {
    FlowNode::new(
        id,
        format!("Automation {}", id),
        NodeKind::Automation(AutomationConfig {
            description: None,
            correlation: rules,
        }),
    )
}

// =============================================================================
// Documents and graphs
// =============================================================================

pub fn edge(source: &str, target: &str) -> FlowEdge {
    FlowEdge::new(source, target)
}

pub fn edge_on(source: &str, target: &str, port: &str) -> FlowEdge {
    FlowEdge::new(source, target).on_port(port)
}

pub fn document(nodes: Vec<FlowNode>, edges: Vec<FlowEdge>) -> FlowDocument {
    FlowDocument {
        nodes,
        edges,
        viewport: None,
    }
}

/// Linear chain `ids[0] → ids[1] → ...`; the first id is the trigger.
pub fn chain(ids: &[&str]) -> FlowGraph {
    let nodes = ids
        .iter()
        .enumerate()
        .map(|(i, id)| if i == 0 { trigger(id, &[]) } else { action(id) })
        .collect();
    let edges = ids.windows(2).map(|w| edge(w[0], w[1])).collect();
    FlowGraph::build(&document(nodes, edges)).expect("chain should build")
}

pub fn load_fixture(json: &str) -> FlowDocument {
    parse(json).expect("fixture should parse")
}

pub fn codes(errors: &[ValidationError]) -> Vec<&'static str> {
    errors.iter().map(|e| e.code).collect()
}
