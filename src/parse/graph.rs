//! petgraph-based directed graph wrapper for a flow.
//!
//! `FlowGraph::build` loads a saved document verbatim so that the structural
//! validator can report whatever is wrong with it. The `add_node` / `connect`
//! family are the guarded edits used while a user is drawing: they refuse a
//! change before touching the graph.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};

use super::types::{FlowDocument, FlowEdge, FlowNode, Viewport, describe_port};
use crate::error::{GraphError, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeLabel {
    pub id: Option<String>,
    pub source_handle: Option<String>,
}

/// Borrowed view of one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeView<'g> {
    pub id: Option<&'g str>,
    pub source: &'g str,
    pub target: &'g str,
    pub source_handle: Option<&'g str>,
}

#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    graph: StableDiGraph<FlowNode, EdgeLabel>,
    node_indices: HashMap<String, NodeIndex>,
    viewport: Option<Viewport>,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a document, failing on any S009/S010 problem.
    pub fn build(doc: &FlowDocument) -> Result<Self, Vec<ValidationError>> {
        let (flow, errors) = Self::load(doc);
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(flow)
    }

    /// Load a document as far as possible. The first node with a given id
    /// wins and edges naming unknown nodes are skipped; both are reported.
    pub fn load(doc: &FlowDocument) -> (Self, Vec<ValidationError>) {
        let mut flow = FlowGraph {
            viewport: doc.viewport.clone(),
            ..FlowGraph::default()
        };
        let mut errors = Vec::new();

        for node in &doc.nodes {
            if flow.node_indices.contains_key(node.id()) {
                errors.push(
                    ValidationError::structural(
                        "S009",
                        format!("Node id '{}' is used more than once", node.id()),
                    )
                    .at_node(node.id()),
                );
                continue;
            }
            let idx = flow.graph.add_node(node.clone());
            flow.node_indices.insert(node.id().to_string(), idx);
        }

        for edge in &doc.edges {
            let source_idx = flow.node_indices.get(&edge.source);
            let target_idx = flow.node_indices.get(&edge.target);

            match (source_idx, target_idx) {
                (Some(&s), Some(&t)) => {
                    flow.graph.add_edge(
                        s,
                        t,
                        EdgeLabel {
                            id: edge.id.clone(),
                            source_handle: edge.source_handle.clone(),
                        },
                    );
                }
                (None, _) => {
                    errors.push(ValidationError::structural(
                        "S010",
                        format!(
                            "Edge from '{}' to '{}' references unknown source node '{}'",
                            edge.source, edge.target, edge.source
                        ),
                    ));
                }
                (_, None) => {
                    errors.push(ValidationError::structural(
                        "S010",
                        format!(
                            "Edge from '{}' to '{}' references unknown target node '{}'",
                            edge.source, edge.target, edge.target
                        ),
                    ));
                }
            }
        }

        (flow, errors)
    }

    pub fn to_document(&self) -> FlowDocument {
        let nodes = self
            .graph
            .node_indices()
            .map(|idx| self.graph[idx].clone())
            .collect();
        let edges = self
            .graph
            .edge_references()
            .map(|e| FlowEdge {
                id: e.weight().id.clone(),
                source: self.graph[e.source()].id.clone(),
                target: self.graph[e.target()].id.clone(),
                source_handle: e.weight().source_handle.clone(),
            })
            .collect();
        FlowDocument {
            nodes,
            edges,
            viewport: self.viewport.clone(),
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn node(&self, node_id: &str) -> Option<&FlowNode> {
        let idx = self.node_indices.get(node_id)?;
        self.graph.node_weight(*idx)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.node_indices.contains_key(node_id)
    }

    /// Nodes in index order, which is document order for a built graph.
    pub fn nodes(&self) -> impl Iterator<Item = &FlowNode> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    /// Every node typed as a trigger. More than one means the flow is mid-edit
    /// and invalid.
    pub fn triggers(&self) -> Vec<&FlowNode> {
        self.nodes().filter(|n| n.is_trigger()).collect()
    }

    /// The trigger node, only when exactly one exists.
    pub fn find_trigger(&self) -> Option<&FlowNode> {
        let mut triggers = self.nodes().filter(|n| n.is_trigger());
        let first = triggers.next()?;
        match triggers.next() {
            Some(_) => None,
            None => Some(first),
        }
    }

    pub fn outgoing_edges(&self, node_id: &str) -> Vec<EdgeView<'_>> {
        self.edges_directed(node_id, Direction::Outgoing)
    }

    pub fn incoming_edges(&self, node_id: &str) -> Vec<EdgeView<'_>> {
        self.edges_directed(node_id, Direction::Incoming)
    }

    pub fn incoming_count(&self, node_id: &str) -> usize {
        self.incoming_edges(node_id).len()
    }

    pub fn outgoing_count(&self, node_id: &str) -> usize {
        self.outgoing_edges(node_id).len()
    }

    /// All edges, in insertion order.
    pub fn edges(&self) -> Vec<EdgeView<'_>> {
        self.graph
            .edge_references()
            .map(|e| self.edge_view(e.source(), e.target(), e.weight()))
            .collect()
    }

    fn edges_directed(&self, node_id: &str, direction: Direction) -> Vec<EdgeView<'_>> {
        let Some(&idx) = self.node_indices.get(node_id) else {
            return vec![];
        };
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| (e.id(), self.edge_view(e.source(), e.target(), e.weight())))
            .collect();
        edges.sort_by_key(|(id, _)| *id);
        edges.into_iter().map(|(_, view)| view).collect()
    }

    fn edge_view<'g>(
        &'g self,
        source: NodeIndex,
        target: NodeIndex,
        label: &'g EdgeLabel,
    ) -> EdgeView<'g> {
        EdgeView {
            id: label.id.as_deref(),
            source: &self.graph[source].id,
            target: &self.graph[target].id,
            source_handle: label.source_handle.as_deref(),
        }
    }

    pub(crate) fn inner(&self) -> &StableDiGraph<FlowNode, EdgeLabel> {
        &self.graph
    }

    pub(crate) fn index_of(&self, node_id: &str) -> Option<NodeIndex> {
        self.node_indices.get(node_id).copied()
    }

    // -------------------------------------------------------------------------
    // Guarded edits
    // -------------------------------------------------------------------------

    pub fn add_node(&mut self, node: FlowNode) -> Result<(), GraphError> {
        if self.contains(node.id()) {
            return Err(GraphError::DuplicateNode {
                node_id: node.id.clone(),
            });
        }
        if self.is_empty() && !node.is_trigger() {
            return Err(GraphError::FirstNodeNotTrigger {
                node_type: node.node_type().to_string(),
            });
        }
        if node.is_trigger() {
            if let Some(existing) = self.triggers().first() {
                return Err(GraphError::SecondTrigger {
                    existing: existing.id.clone(),
                });
            }
        }

        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.node_indices.insert(id, idx);
        Ok(())
    }

    /// Replace a node's label/config in place, keeping its edges.
    pub fn replace_node(&mut self, node: FlowNode) -> Result<(), GraphError> {
        let idx = self.index_of(node.id()).ok_or_else(|| GraphError::NodeNotFound {
            node_id: node.id.clone(),
        })?;
        let current = &self.graph[idx];
        if current.is_trigger() && !node.is_trigger() {
            return Err(GraphError::TriggerTypeChange {
                node_id: node.id.clone(),
            });
        }
        if !current.is_trigger() && node.is_trigger() {
            if let Some(existing) = self.triggers().first() {
                return Err(GraphError::SecondTrigger {
                    existing: existing.id.clone(),
                });
            }
        }
        self.graph[idx] = node;
        Ok(())
    }

    pub fn remove_node(&mut self, node_id: &str) -> Result<FlowNode, GraphError> {
        let idx = self
            .node_indices
            .remove(node_id)
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: node_id.to_string(),
            })?;
        self.graph
            .remove_node(idx)
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: node_id.to_string(),
            })
    }

    /// Attach an edge, enforcing the single-input rule and port limits.
    pub fn connect(&mut self, edge: FlowEdge) -> Result<(), GraphError> {
        let source_idx = self.index_of(&edge.source).ok_or_else(|| GraphError::NodeNotFound {
            node_id: edge.source.clone(),
        })?;
        let target_idx = self.index_of(&edge.target).ok_or_else(|| GraphError::NodeNotFound {
            node_id: edge.target.clone(),
        })?;

        if source_idx == target_idx {
            return Err(GraphError::SelfLoop {
                node_id: edge.source.clone(),
            });
        }

        if self.graph[target_idx].is_trigger() {
            return Err(GraphError::InboundToTrigger {
                node_id: edge.target.clone(),
            });
        }

        if let Some(existing) = self.incoming_edges(&edge.target).first() {
            return Err(GraphError::InputOccupied {
                node_id: edge.target.clone(),
                existing_source: existing.source.to_string(),
            });
        }

        let port = edge.source_handle.as_deref();
        if !self.graph[source_idx].kind.output_ports().accepts(port) {
            return Err(GraphError::UnknownPort {
                node_id: edge.source.clone(),
                port: describe_port(port),
            });
        }

        if self
            .outgoing_edges(&edge.source)
            .iter()
            .any(|e| e.source_handle == port)
        {
            return Err(GraphError::PortOccupied {
                node_id: edge.source.clone(),
                port: describe_port(port),
            });
        }

        self.graph.add_edge(
            source_idx,
            target_idx,
            EdgeLabel {
                id: edge.id,
                source_handle: edge.source_handle,
            },
        );
        Ok(())
    }

    /// Remove the edge leaving `source` on `port`.
    pub fn disconnect(&mut self, source: &str, port: Option<&str>) -> Result<(), GraphError> {
        let source_idx = self.index_of(source).ok_or_else(|| GraphError::NodeNotFound {
            node_id: source.to_string(),
        })?;
        let edge_idx = self
            .graph
            .edges_directed(source_idx, Direction::Outgoing)
            .find(|e| e.weight().source_handle.as_deref() == port)
            .map(|e| e.id())
            .ok_or_else(|| GraphError::EdgeNotFound {
                node_id: source.to_string(),
                port: describe_port(port),
            })?;
        self.graph.remove_edge(edge_idx);
        Ok(())
    }
}
