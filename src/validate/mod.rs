//! Validation phase: structural rules, node rules, and reference checks.
//!
//! Every entry point collects all problems it can find instead of stopping at
//! the first one; an empty result means the input is valid.

pub mod fields;
pub mod node_rules;
pub mod references;
pub mod structural;

use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{GraphError, ValidationError};
use crate::parse::{FlowDocument, FlowGraph, FlowNode};

pub use references::ReferenceScope;

/// Runs the validation rules under one `EngineConfig`.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: EngineConfig,
}

impl Validator {
    pub fn new(config: EngineConfig) -> Self {
        Validator { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Check the references in one piece of text as if it belonged to `node_id`.
    pub fn validate_text(
        &self,
        graph: &FlowGraph,
        node_id: &str,
        text: &str,
    ) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        ReferenceScope::new(graph, node_id).check_text(text, None, &self.config, &mut errors);
        errors
    }

    /// Node config rules plus reference checks over every text field.
    pub fn validate_node(&self, graph: &FlowGraph, node_id: &str) -> Vec<ValidationError> {
        let Some(node) = graph.node(node_id) else {
            let missing = GraphError::NodeNotFound {
                node_id: node_id.to_string(),
            };
            return vec![ValidationError::from(missing).at_node(node_id)];
        };

        let mut errors = node_rules::validate_node_config(node, graph);
        let scope = ReferenceScope::new(graph, node.id());
        for field in fields::text_fields(node) {
            scope.check_text(field.text, Some(field.path.as_str()), &self.config, &mut errors);
        }
        errors
    }

    /// Structural rules, then every node in document order.
    pub fn validate_graph(&self, graph: &FlowGraph) -> Vec<ValidationError> {
        let mut errors = structural::validate_structural(graph, &self.config);
        for node in graph.nodes() {
            errors.extend(self.validate_node(graph, node.id()));
        }
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            errors = errors.len(),
            "validated flow graph"
        );
        errors
    }

    /// Load the graph from a document and validate it. Load problems (S009,
    /// S010) come first, followed by everything found in what could be loaded.
    pub fn validate_document(&self, doc: &FlowDocument) -> Vec<ValidationError> {
        let (graph, mut errors) = FlowGraph::load(doc);
        errors.extend(self.validate_graph(&graph));
        errors
    }

    /// Validate `doc` as it would be after saving `candidate` into it. The
    /// candidate replaces the node with the same id, or is appended.
    pub fn validate_edit(&self, doc: &FlowDocument, candidate: &FlowNode) -> Vec<ValidationError> {
        let mut edited = doc.clone();
        match edited.nodes.iter_mut().find(|n| n.id == candidate.id) {
            Some(slot) => *slot = candidate.clone(),
            None => edited.nodes.push(candidate.clone()),
        }
        self.validate_document(&edited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::parse::types::*;

    fn order_doc() -> FlowDocument {
        FlowDocument {
            nodes: vec![
                FlowNode::new(
                    "t1",
                    "Order",
                    NodeKind::Trigger(TriggerConfig {
                        schema: vec![SchemaField::new("email", FieldType::String, true)],
                        description: None,
                    }),
                ),
                FlowNode::new(
                    "a1",
                    "Notify",
                    NodeKind::Action(ActionConfig {
                        service: "email".into(),
                        body: Some("Hi {{ steps.trigger.body.email }}".into()),
                        ..Default::default()
                    }),
                ),
            ],
            edges: vec![FlowEdge::new("t1", "a1")],
            viewport: None,
        }
    }

    #[test]
    fn valid_document_has_no_errors() {
        let errors = Validator::default().validate_document(&order_doc());
        assert!(errors.is_empty(), "unexpected: {:?}", errors);
    }

    #[test]
    fn errors_carry_node_and_field() {
        let mut doc = order_doc();
        if let NodeKind::Action(c) = &mut doc.nodes[1].kind {
            c.body = Some("{{ steps.trigger.body.phone }}".into());
        }
        let errors = Validator::default().validate_document(&doc);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Schema);
        assert_eq!(errors[0].node_id.as_deref(), Some("a1"));
        assert_eq!(errors[0].field.as_deref(), Some("config.body"));
    }

    #[test]
    fn schema_check_can_be_disabled() {
        let mut doc = order_doc();
        if let NodeKind::Action(c) = &mut doc.nodes[1].kind {
            c.body = Some("{{ steps.trigger.body.phone }}".into());
        }
        let validator = Validator::new(EngineConfig {
            check_schema: false,
            ..Default::default()
        });
        assert!(validator.validate_document(&doc).is_empty());
    }

    #[test]
    fn edit_replaces_node_in_place() {
        let doc = order_doc();
        let candidate = FlowNode::new(
            "a1",
            "Notify",
            NodeKind::Action(ActionConfig {
                service: "email".into(),
                body: Some("{{ steps.a1 }} {{ steps.ghost }}".into()),
                ..Default::default()
            }),
        );
        let errors = Validator::default().validate_edit(&doc, &candidate);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "R002");
    }

    #[test]
    fn unknown_node_is_reported() {
        let graph = FlowGraph::build(&order_doc()).unwrap();
        let errors = Validator::default().validate_node(&graph, "zz");
        assert_eq!(errors[0].code, "G001");
    }
}
