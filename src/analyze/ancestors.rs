//! Which nodes a node may read from.

use std::collections::BTreeSet;

use petgraph::visit::{Bfs, Reversed};

use crate::parse::FlowGraph;

/// Every node reachable by walking edges backward from `node_id`, excluding
/// `node_id` itself. Unknown ids have no ancestors.
///
/// Breadth-first with a visited set, so a cycle left behind mid-edit cannot
/// stall the walk.
pub fn ancestors(graph: &FlowGraph, node_id: &str) -> BTreeSet<String> {
    let Some(start) = graph.index_of(node_id) else {
        return BTreeSet::new();
    };

    let reversed = Reversed(graph.inner());
    let mut bfs = Bfs::new(reversed, start);
    let mut found = BTreeSet::new();
    while let Some(idx) = bfs.next(reversed) {
        if idx != start {
            found.insert(graph.inner()[idx].id.clone());
        }
    }
    found
}

/// `target_id` is the node itself or one of its ancestors.
pub fn is_reachable(graph: &FlowGraph, from: &str, target_id: &str) -> bool {
    target_id == from || ancestors(graph, from).contains(target_id)
}
