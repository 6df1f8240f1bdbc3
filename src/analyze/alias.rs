//! Mapping the reserved trigger alias onto the trigger's generated id.

use tracing::warn;

use crate::config::EngineConfig;
use crate::parse::{FlowGraph, FlowNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasResolution<'a> {
    /// The node id the alias stands for. The node may not exist.
    Node(&'a str),
    /// The trigger alias was used while the flow has several triggers.
    /// No trigger is picked.
    Ambiguous { triggers: usize },
}

/// Resolve `alias` as written after `steps.`.
///
/// With no trigger in the flow the reserved alias falls through as a literal id.
pub fn resolve_alias<'a>(
    graph: &'a FlowGraph,
    alias: &'a str,
    config: &EngineConfig,
) -> AliasResolution<'a> {
    if alias != config.trigger_alias {
        return AliasResolution::Node(alias);
    }

    let triggers = graph.triggers();
    match triggers.len() {
        0 => AliasResolution::Node(alias),
        1 => {
            let trigger: &'a FlowNode = triggers[0];
            AliasResolution::Node(trigger.id())
        }
        count => {
            warn!(
                triggers = count,
                alias, "trigger alias is ambiguous, leaving it unresolved"
            );
            AliasResolution::Ambiguous { triggers: count }
        }
    }
}

/// The trigger node `alias` refers to, by reserved alias or literal id.
pub fn trigger_for_alias<'a>(
    graph: &'a FlowGraph,
    alias: &'a str,
    config: &EngineConfig,
) -> Option<&'a FlowNode> {
    match resolve_alias(graph, alias, config) {
        AliasResolution::Node(id) => graph.node(id).filter(|n| n.is_trigger()),
        AliasResolution::Ambiguous { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::types::*;

    fn graph_with(nodes: Vec<FlowNode>) -> FlowGraph {
        FlowGraph::build(&FlowDocument {
            nodes,
            edges: vec![],
            viewport: None,
        })
        .unwrap()
    }

    fn trigger(id: &str) -> FlowNode {
        FlowNode::new(id, id, NodeKind::Trigger(TriggerConfig::default()))
    }

    #[test]
    fn alias_maps_to_generated_id() {
        let graph = graph_with(vec![trigger("node_17")]);
        let config = EngineConfig::default();
        assert_eq!(
            resolve_alias(&graph, "trigger", &config),
            AliasResolution::Node("node_17")
        );
        assert_eq!(
            resolve_alias(&graph, "other", &config),
            AliasResolution::Node("other")
        );
        assert_eq!(
            trigger_for_alias(&graph, "node_17", &config).map(|n| n.id()),
            Some("node_17")
        );
    }

    #[test]
    fn two_triggers_suppress_alias() {
        let graph = graph_with(vec![trigger("t1"), trigger("t2")]);
        let config = EngineConfig::default();
        assert_eq!(
            resolve_alias(&graph, "trigger", &config),
            AliasResolution::Ambiguous { triggers: 2 }
        );
        assert!(trigger_for_alias(&graph, "trigger", &config).is_none());
    }

    #[test]
    fn custom_alias() {
        let graph = graph_with(vec![trigger("t1")]);
        let config = EngineConfig {
            trigger_alias: "start".into(),
            ..EngineConfig::default()
        };
        assert_eq!(
            resolve_alias(&graph, "start", &config),
            AliasResolution::Node("t1")
        );
        assert_eq!(
            resolve_alias(&graph, "trigger", &config),
            AliasResolution::Node("trigger")
        );
    }
}
