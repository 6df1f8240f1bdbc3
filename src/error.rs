//! Error types shared by every validation phase.

use serde::Serialize;
use thiserror::Error;

/// The four classes of problem the engine reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Malformed `steps.*` expression.
    Syntax,
    /// Reference to a node that is neither an ancestor nor the node itself.
    Topology,
    /// Reference to (or payload key for) a field the trigger does not declare.
    Schema,
    /// Graph-level invariant violation.
    Structural,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Syntax => write!(f, "Syntax"),
            ErrorKind::Topology => write!(f, "Topology"),
            ErrorKind::Schema => write!(f, "Schema"),
            ErrorKind::Structural => write!(f, "Structural"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub message: String,
    /// Config path of the text field the error was found in, e.g. `config.url`.
    pub field: Option<String>,
    pub node_id: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}] {}", self.kind, self.code, self.message)?;
        if let Some(id) = &self.node_id {
            write!(f, " (node '{}'", id)?;
            if let Some(field) = &self.field {
                write!(f, ", field '{}'", field)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn syntax(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, code, message)
    }

    pub fn topology(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Topology, code, message)
    }

    pub fn schema(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Schema, code, message)
    }

    pub fn structural(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Structural, code, message)
    }

    fn new(kind: ErrorKind, code: &'static str, message: impl Into<String>) -> Self {
        ValidationError {
            kind,
            code,
            message: message.into(),
            field: None,
            node_id: None,
        }
    }

    pub fn at_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    pub fn in_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Failure to read a flow document or engine config.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse flow document: {0}")]
    Document(#[source] serde_json::Error),
    #[error("failed to parse node: {0}")]
    Node(#[source] serde_json::Error),
    #[error("failed to parse engine config: {0}")]
    Config(#[source] serde_json::Error),
}

/// A guarded graph edit that was rejected. The graph is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("node '{node_id}' does not exist")]
    NodeNotFound { node_id: String },
    #[error("node '{node_id}' already exists")]
    DuplicateNode { node_id: String },
    #[error("the first node of a flow must be a trigger, got '{node_type}'")]
    FirstNodeNotTrigger { node_type: String },
    #[error("flow already has a trigger ('{existing}')")]
    SecondTrigger { existing: String },
    #[error("trigger node '{node_id}' cannot change its type")]
    TriggerTypeChange { node_id: String },
    #[error("node '{node_id}' cannot connect to itself")]
    SelfLoop { node_id: String },
    #[error("trigger node '{node_id}' cannot have an inbound edge")]
    InboundToTrigger { node_id: String },
    #[error("node '{node_id}' already has an inbound edge from '{existing_source}'")]
    InputOccupied {
        node_id: String,
        existing_source: String,
    },
    #[error("{port} is not an output of node '{node_id}'")]
    UnknownPort { node_id: String, port: String },
    #[error("{port} of node '{node_id}' is already connected")]
    PortOccupied { node_id: String, port: String },
    #[error("no edge leaves node '{node_id}' on {port}")]
    EdgeNotFound { node_id: String, port: String },
    #[error("node '{node_id}' is not an automation node")]
    NotAutomation { node_id: String },
}

impl GraphError {
    pub fn code(&self) -> &'static str {
        match self {
            GraphError::NodeNotFound { .. } => "G001",
            GraphError::DuplicateNode { .. } => "G002",
            GraphError::FirstNodeNotTrigger { .. } => "G003",
            GraphError::SecondTrigger { .. } => "G004",
            GraphError::TriggerTypeChange { .. } => "G005",
            GraphError::SelfLoop { .. } => "G006",
            GraphError::InboundToTrigger { .. } => "G007",
            GraphError::InputOccupied { .. } => "G008",
            GraphError::UnknownPort { .. } => "G009",
            GraphError::PortOccupied { .. } => "G010",
            GraphError::EdgeNotFound { .. } => "G011",
            GraphError::NotAutomation { .. } => "G012",
        }
    }
}

impl From<GraphError> for ValidationError {
    fn from(e: GraphError) -> Self {
        ValidationError::structural(e.code(), e.to_string())
    }
}
