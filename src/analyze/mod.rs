//! Reachability analysis: what a node is allowed to reference.

pub mod alias;
pub mod ancestors;

pub use alias::{AliasResolution, resolve_alias};
pub use ancestors::{ancestors, is_reachable};

use serde::Serialize;

use crate::config::EngineConfig;
use crate::parse::{FieldType, FlowGraph};
use crate::reference::is_identifier;

/// A reference expression a node may insert, for the editor's variable picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableReference {
    pub node_id: String,
    pub label: String,
    pub expression: String,
    /// Declared type, for trigger body fields.
    pub field_type: Option<FieldType>,
}

/// References usable from `node_id`: the trigger's declared fields first, then
/// every ancestor, then the node itself. Ids and field keys that cannot be
/// written as a `steps.` path are left out.
pub fn available_references(
    graph: &FlowGraph,
    node_id: &str,
    config: &EngineConfig,
) -> Vec<AvailableReference> {
    let Some(node) = graph.node(node_id) else {
        return vec![];
    };
    let upstream = ancestors(graph, node_id);
    let mut refs = Vec::new();

    // The alias only names the trigger when there is exactly one.
    let trigger = graph
        .find_trigger()
        .filter(|t| t.id() == node_id || upstream.contains(t.id()));
    if let Some(trigger) = trigger {
        refs.push(AvailableReference {
            node_id: trigger.id.clone(),
            label: trigger.label.clone(),
            expression: format!("{{{{ steps.{} }}}}", config.trigger_alias),
            field_type: None,
        });
        let fields = trigger.trigger_schema().unwrap_or_default();
        for field in fields.iter().filter(|f| is_identifier(&f.key)) {
            refs.push(AvailableReference {
                node_id: trigger.id.clone(),
                label: format!("{}.{}", trigger.label, field.key),
                expression: format!(
                    "{{{{ steps.{}.body.{} }}}}",
                    config.trigger_alias, field.key
                ),
                field_type: Some(field.field_type),
            });
        }
    }

    let upstream_nodes = upstream.iter().filter_map(|id| graph.node(id));
    for ancestor in upstream_nodes.chain(std::iter::once(node)) {
        if trigger.is_some_and(|t| t.id() == ancestor.id()) || !is_identifier(ancestor.id()) {
            continue;
        }
        refs.push(AvailableReference {
            node_id: ancestor.id.clone(),
            label: ancestor.label.clone(),
            expression: format!("{{{{ steps.{} }}}}", ancestor.id),
            field_type: None,
        });
    }

    refs
}
