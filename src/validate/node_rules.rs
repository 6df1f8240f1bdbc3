//! Per-node configuration validation.
//! Match arms here must track `NodeKind` in `parse/types.rs`.

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::parse::FlowGraph;
use crate::parse::types::*;

/// Validate a single node's config. Returns all errors found.
pub fn validate_node_config(node: &FlowNode, graph: &FlowGraph) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let node_id = node.id();

    match &node.kind {
        NodeKind::Switch(c) => {
            let mut seen = HashSet::new();
            for (i, case) in c.cases.iter().enumerate() {
                let field = format!("config.cases[{}].id", i);
                if case.id.trim().is_empty() {
                    errors.push(
                        ValidationError::structural("N001", "Switch case id must not be empty")
                            .at_node(node_id)
                            .in_field(field),
                    );
                } else if case.id == PORT_DEFAULT {
                    errors.push(
                        ValidationError::structural(
                            "N001",
                            "Switch case id 'default' is reserved for the fallback port",
                        )
                        .at_node(node_id)
                        .in_field(field),
                    );
                } else if !seen.insert(case.id.as_str()) {
                    errors.push(
                        ValidationError::structural(
                            "N001",
                            format!("Switch case id '{}' is declared twice", case.id),
                        )
                        .at_node(node_id)
                        .in_field(field),
                    );
                }
            }
        }
        NodeKind::Condition(c) => {
            if c.rules.is_empty() {
                errors.push(
                    ValidationError::structural("N002", "Condition must have at least one rule")
                        .at_node(node_id),
                );
            }
        }
        NodeKind::Variable(c) => {
            if c.name.trim().is_empty() {
                errors.push(
                    ValidationError::structural("N003", "Variable name must not be empty")
                        .at_node(node_id)
                        .in_field("config.name"),
                );
            }
        }
        NodeKind::Goto(c) => {
            let target = c.target_id.trim();
            let problem = if target.is_empty() {
                Some("Goto target must not be empty".to_string())
            } else if target == node_id {
                Some("Goto cannot target itself".to_string())
            } else if !graph.contains(target) {
                Some(format!("Goto target '{}' does not exist", target))
            } else {
                None
            };
            if let Some(message) = problem {
                errors.push(
                    ValidationError::structural("N004", message)
                        .at_node(node_id)
                        .in_field("config.targetId"),
                );
            }
        }
        NodeKind::Automation(c) => {
            if c.correlation.is_empty() {
                errors.push(
                    ValidationError::structural(
                        "N005",
                        "Automation must have at least one correlation rule",
                    )
                    .at_node(node_id),
                );
            }
            for (i, rule) in c.correlation.iter().enumerate() {
                if rule.key.trim().is_empty() {
                    errors.push(
                        ValidationError::structural("N005", "Correlation key must not be empty")
                            .at_node(node_id)
                            .in_field(format!("config.correlation[{}].key", i)),
                    );
                }
            }
        }
        NodeKind::Trigger(_)
        | NodeKind::Action(_)
        | NodeKind::Loop(_)
        | NodeKind::HumanTask(_)
        | NodeKind::Unknown { .. } => {}
    }

    errors
}
