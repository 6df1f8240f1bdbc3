//! Parse phase: flow document JSON → typed nodes + graph.

pub mod graph;
pub mod types;

pub use graph::{EdgeView, FlowGraph};
pub use types::*;

use crate::error::ParseError;

/// Deserialize a flow document JSON string.
pub fn parse(json: &str) -> Result<FlowDocument, ParseError> {
    serde_json::from_str::<FlowDocument>(json).map_err(ParseError::Document)
}

/// Deserialize a single node, e.g. the candidate of a save.
pub fn parse_node(json: &str) -> Result<FlowNode, ParseError> {
    serde_json::from_str::<FlowNode>(json).map_err(ParseError::Node)
}
