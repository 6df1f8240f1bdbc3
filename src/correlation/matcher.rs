//! Matching a signal against the correlation rules of waiting nodes.

use serde_json::Value;
use tracing::trace;

use super::{InstanceRecord, Signal};
use crate::analyze::{AliasResolution, resolve_alias};
use crate::config::EngineConfig;
use crate::parse::{CorrelationRule, FlowGraph, FlowNode, NodeKind};
use crate::reference::{Classified, classify, extract_references};
use crate::schema::{FieldLookup, resolve_field};

/// One rule of a waiting automation node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingRule<'g> {
    pub node: &'g FlowNode,
    pub rule: &'g CorrelationRule,
}

/// Rules of the `waiting` automation nodes, in waiting order then rule order.
/// Ids that are missing or not automation nodes contribute nothing.
pub fn pending_rules<'g>(graph: &'g FlowGraph, waiting: &[String]) -> Vec<PendingRule<'g>> {
    waiting
        .iter()
        .filter_map(|id| graph.node(id))
        .flat_map(|node| {
            let rules: &'g [CorrelationRule] = match &node.kind {
                NodeKind::Automation(c) => &c.correlation,
                _ => &[],
            };
            rules.iter().map(move |rule| PendingRule { node, rule })
        })
        .collect()
}

/// The first pending node whose rule matches `signal`, if any.
pub fn match_signal<'g>(
    signal: &Signal,
    pending: &[PendingRule<'g>],
    instance: &InstanceRecord,
    graph: &FlowGraph,
    config: &EngineConfig,
) -> Option<&'g FlowNode> {
    let wanted = canonical(&signal.value);
    pending
        .iter()
        .find(|p| {
            let event = config.effective_event_name(&p.rule.event_name);
            if event != signal.event || p.rule.key != signal.key {
                return false;
            }
            let resolved =
                resolve_value_expression(&p.rule.value_expression, instance, graph, config);
            trace!(
                node_id = p.node.id(),
                key = %p.rule.key,
                resolved = ?resolved,
                "comparing correlation value"
            );
            resolved.is_some_and(|value| value == wanted)
        })
        .map(|p| p.node)
}

/// Substitute every `steps.*` reference in `expression` with the instance's
/// recorded value. `None` when any reference cannot be resolved.
pub fn resolve_value_expression(
    expression: &str,
    instance: &InstanceRecord,
    graph: &FlowGraph,
    config: &EngineConfig,
) -> Option<String> {
    let mut out = String::with_capacity(expression.len());
    let mut cursor = 0;

    for raw in extract_references(expression) {
        out.push_str(&expression[cursor..raw.span.start]);
        cursor = raw.span.end;

        let reference = match classify(&raw.inner) {
            Classified::Ignored => {
                out.push_str(&expression[raw.span.clone()]);
                continue;
            }
            Classified::SyntaxError => return None,
            Classified::Reference(r) => r,
        };

        let AliasResolution::Node(node_id) = resolve_alias(graph, &reference.node_alias, config)
        else {
            return None;
        };
        let field = reference.field_name.as_deref();
        if resolve_field(graph, &reference.node_alias, field, config) == FieldLookup::Missing {
            return None;
        }

        let output = instance.output(node_id)?;
        let value = match field {
            Some(field) => output.get("body")?.get(field)?,
            None => output,
        };
        out.push_str(&canonical(value));
    }

    out.push_str(&expression[cursor..]);
    Some(out)
}

/// Comparison form of a value: strings unquoted, everything else as JSON.
pub fn canonical(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
